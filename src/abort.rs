use tokio::sync::watch;

/// Signals that the request driving an authentication transaction was aborted.
///
/// Work done on behalf of the request (such as fetching the discovery document) should stop
/// once this completes.
#[derive(Debug, Clone)]
pub struct RequestAborted(watch::Receiver<bool>);

/// Aborts every `RequestAborted` created alongside it.
#[derive(Debug)]
pub struct AbortHandle(watch::Sender<bool>);

impl RequestAborted {
    pub fn channel() -> (AbortHandle, RequestAborted) {
        let (sender, receiver) = watch::channel(false);
        (AbortHandle(sender), RequestAborted(receiver))
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self(receiver)
    }

    pub fn is_aborted(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once the request is aborted.
    /// Never completes if the handle was dropped without aborting.
    pub async fn aborted(&self) {
        let mut receiver = self.0.clone();
        if receiver.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for RequestAborted {
    fn default() -> Self {
        Self::never()
    }
}

impl AbortHandle {
    pub fn abort(&self) {
        self.0.send_replace(true);
    }
}
