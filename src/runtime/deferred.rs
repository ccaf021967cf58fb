use crate::error::StoreError;
use futures::channel::oneshot;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Handle to a result that becomes available on a later turn.
///
/// Returned by [`Store::set`](crate::Store::set) and
/// [`Store::update`](crate::Store::update). Polled synchronously with
/// [`Deferred::try_take`], it only yields once something has run the turn
/// ([`Store::tick`](crate::Store::tick) or
/// [`Store::settle`](crate::Store::settle)). Awaiting it runs that turn itself
/// if it hasn't happened yet. Dropping it has no effect on the write.
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T, StoreError>>,
    drive: Option<Box<dyn Fn()>>,
}

impl<T> Deferred<T> {
    /// Run `drive` when the result is awaited but has not arrived yet.
    pub(crate) fn driven_by(mut self, drive: impl Fn() + 'static) -> Self {
        self.drive = Some(Box::new(drive));
        self
    }

    /// Take the result if it has arrived.
    ///
    /// Returns `None` while the turn that resolves it has not run yet. A
    /// result can only be taken once.
    pub fn try_take(&mut self) -> Option<Result<T, StoreError>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(StoreError::Discarded)),
        }
    }

    fn poll_rx(&mut self, cx: &mut Context<'_>) -> Poll<Result<T, StoreError>> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(StoreError::Discarded)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, StoreError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Poll::Ready(result) = this.poll_rx(cx) {
            return Poll::Ready(result);
        }
        match this.drive.take() {
            Some(drive) => {
                drive();
                this.poll_rx(cx)
            }
            None => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("driven", &self.drive.is_some())
            .finish_non_exhaustive()
    }
}

/// Sending half of a [`Deferred`].
pub(crate) struct Resolver<T> {
    tx: oneshot::Sender<Result<T, StoreError>>,
}

impl<T> Resolver<T> {
    pub(crate) fn resolve(self, result: Result<T, StoreError>) {
        // The caller may have dropped its handle; that is fine.
        let _ = self.tx.send(result);
    }
}

pub(crate) fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Deferred { rx, drive: None })
}
