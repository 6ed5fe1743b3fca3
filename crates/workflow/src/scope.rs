//! Lifetime of one console view.
//!
//! Listeners and pollers started on behalf of a view run under a child
//! token of its [`ViewScope`]. Tearing the view down (dropping the scope or
//! calling [`ViewScope::close`]) cancels all of them in one step. Requests
//! already on the wire are not aborted; their results are discarded.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct ViewScope {
    token: CancellationToken,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A scope nested in `parent`, closed together with it.
    pub fn nested(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    /// Token for work that must end with this view.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Spawn `task`, dropping it at its next suspension point once the
    /// view closes.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = task => {}
            }
        })
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
