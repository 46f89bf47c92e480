use tokio::sync::watch;

/// Single-flight "refreshing" flag for pull-to-refresh.
#[derive(Debug)]
pub struct RefreshController {
    tx: watch::Sender<bool>,
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Raise the flag, or `None` when a refresh is already in flight.
    pub fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        let began = self.tx.send_if_modified(|refreshing| {
            if *refreshing {
                false
            } else {
                *refreshing = true;
                true
            }
        });
        began.then_some(RefreshGuard { tx: &self.tx })
    }

    pub fn is_refreshing(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Lowers the refreshing flag when dropped, including on cancellation.
#[derive(Debug)]
pub struct RefreshGuard<'a> {
    tx: &'a watch::Sender<bool>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_replace(false);
    }
}
