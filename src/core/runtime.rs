//! Synchronous entrypoints over async work
//!
//! Startup calls such as `KormBuilder::migrate` run their future on a
//! current-thread runtime owned by the call. Nesting inside an existing
//! runtime would panic (or deadlock on a single worker), so it is refused.

use super::error::{DatabaseError, Result};
use std::future::Future;

/// Run `future` to completion on a runtime owned by this call
///
/// `operation` names the caller for the error returned when the current
/// thread is already driving a tokio runtime.
pub fn block_on<F: Future>(operation: &'static str, future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(DatabaseError::BlockingInAsyncContext(operation));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_runs_to_completion() {
        let value = block_on("test", async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            7
        })
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_block_on_refuses_nested_runtime() {
        let err = block_on("nested", async {}).unwrap_err();
        assert!(matches!(err, DatabaseError::BlockingInAsyncContext("nested")));
    }
}
