//! Channel factory abstraction.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::error::BoxError;

/// Produces new channel handles.
///
/// Called again on every creation retry, so it must be safe to invoke
/// repeatedly. Endpoint-unreachable failures are retried with backoff; any
/// other failure aborts creation.
pub trait ChannelFactory<C>: Send + Sync {
    fn create(&self) -> BoxFuture<'static, Result<C, BoxError>>;
}

impl<C, F, Fut> ChannelFactory<C> for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<C, BoxError>> + Send + 'static,
{
    fn create(&self) -> BoxFuture<'static, Result<C, BoxError>> {
        (self)().boxed()
    }
}
