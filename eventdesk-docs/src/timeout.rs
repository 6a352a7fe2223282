/// Deadlines for document-service calls
///
/// Each create or delete, including the token exchange it may trigger, must
/// finish within the configured timeout. Calls are not retried.
///
/// - Default: 15 seconds
/// - Minimum: 1 second
/// - Maximum: 120 seconds
///
/// ```
/// use eventdesk_docs::timeout::{resolve_timeout, DEFAULT_TIMEOUT, MAX_TIMEOUT};
///
/// assert_eq!(resolve_timeout(None), DEFAULT_TIMEOUT);
/// assert_eq!(resolve_timeout(Some(3600)), MAX_TIMEOUT);
/// ```

use std::future::Future;
use std::time::Duration;

use crate::service::{DocumentError, DocumentResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

pub const MAX_TIMEOUT: Duration = Duration::from_secs(120);

/// Clamps a configured timeout (seconds) into the allowed range
pub fn resolve_timeout(seconds: Option<u64>) -> Duration {
    match seconds {
        Some(secs) => Duration::from_secs(secs).clamp(MIN_TIMEOUT, MAX_TIMEOUT),
        None => DEFAULT_TIMEOUT,
    }
}

/// Runs `operation`, failing with [`DocumentError::Timeout`] after `limit`
pub async fn with_deadline<T, F>(limit: Duration, operation: F) -> DocumentResult<T>
where
    F: Future<Output = DocumentResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout = ?limit, "Document service call timed out");
            Err(DocumentError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_timeout() {
        assert_eq!(resolve_timeout(None), DEFAULT_TIMEOUT);
        assert_eq!(resolve_timeout(Some(0)), MIN_TIMEOUT);
        assert_eq!(resolve_timeout(Some(30)), Duration::from_secs(30));
        assert_eq!(resolve_timeout(Some(10_000)), MAX_TIMEOUT);
    }

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, DocumentError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, DocumentError>(())
        };

        let result = with_deadline(Duration::from_secs(5), slow).await;
        assert!(matches!(result, Err(DocumentError::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
