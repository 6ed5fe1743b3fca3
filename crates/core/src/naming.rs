//! Unique-name suggestion for new adapter instances.
//!
//! Suggests `<type><n>` names that do not clash with any instance that
//! exists at suggestion time.

/// Suggest a unique name for a new instance of `adapter_type`.
///
/// Convention: `{base}{n}`
///
/// - `base` = the adapter type name, lower-cased
/// - `n` = one more than the largest numeric suffix found among existing
///   names that start with `base`, or `1` when there is none
///
/// A suffix counts when it begins with decimal digits; the leading digits
/// are the number (`csv2x` counts as `2`). Suffixes without leading digits
/// (`csvFoo`) are ignored.
///
/// # Examples
///
/// ```
/// use polyadmin_core::naming::default_unique_name;
///
/// assert_eq!(default_unique_name("CSV", ["csv1", "csv2", "other"]), "csv3");
/// assert_eq!(default_unique_name("CSV", ["other"]), "csv1");
/// assert_eq!(default_unique_name("CSV", ["csvFoo"]), "csv1");
/// ```
pub fn default_unique_name<'a, I>(adapter_type: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base = adapter_type.to_lowercase();

    let max_suffix = existing
        .into_iter()
        .filter_map(|name| name.strip_prefix(base.as_str()))
        .filter_map(numeric_prefix)
        .max()
        .unwrap_or(0);

    format!("{base}{}", max_suffix.saturating_add(1))
}

/// Parse the leading run of ASCII digits of `suffix`.
///
/// Returns `None` when the suffix does not start with a digit or the
/// number does not fit in a `u64`.
fn numeric_prefix(suffix: &str) -> Option<u64> {
    let end = suffix
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(suffix.len());
    if end == 0 {
        return None;
    }
    suffix[..end].parse().ok()
}
