//! Deadlines for store calls

use std::future::Future;
use std::time::Duration;

use relay_core::RepoResult;

use super::error::{ServiceError, ServiceResult};

/// Run a store call under `deadline`, classifying both failure and expiry
pub(crate) async fn within<T, F>(
    deadline: Duration,
    operation: &'static str,
    call: F,
) -> ServiceResult<T>
where
    F: Future<Output = RepoResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(ServiceError::from_store),
        Err(_) => Err(ServiceError::timeout(operation)),
    }
}
