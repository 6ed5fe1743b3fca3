/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Adapter instance names as chosen by the operator (e.g. `csv1`).
pub type UniqueName = String;
