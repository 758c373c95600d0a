use backoff::{backoff::Backoff, future::retry};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

use super::client::{FailureClass, UpstreamError};

/// 재시도 정책
///
/// `attempt`번째 실패 후 대기 시간은 `base_delay * 2^(attempt-1) + jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최초 시도를 포함한 총 시도 횟수
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// 지연 없이 재시도하는 정책 (테스트용)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// `attempt`번째 시도가 실패했을 때의 지터 제외 대기 시간
    pub fn base_delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// 시도 횟수로 제한되는 지수 백오프
#[derive(Debug)]
struct AttemptBackoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl AttemptBackoff {
    fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 1 }
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.policy.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

impl Backoff for AttemptBackoff {
    fn reset(&mut self) {
        self.attempt = 1;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.policy.max_attempts {
            return None;
        }
        let delay = self.policy.base_delay_after(self.attempt) + self.jitter();
        self.attempt += 1;
        Some(delay)
    }
}

/// 재시도 로직을 적용한 비동기 작업 실행
///
/// Retryable로 분류된 실패만 지수 백오프로 재시도하고, Terminal 실패나
/// 시도 횟수 소진 시 마지막 에러를 반환한다. 대기는 tokio 타이머로 하므로
/// 다른 요청 처리를 막지 않는다.
pub async fn with_retry<F, Fut, T>(policy: RetryPolicy, operation: F) -> Result<T, UpstreamError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0_u32;

    retry(AttemptBackoff::new(policy), || {
        attempt += 1;
        let current = attempt;
        let fut = operation();
        async move {
            match fut.await {
                Ok(result) => {
                    if current > 1 {
                        tracing::info!(attempt = current, "Upstream call succeeded after retry");
                    }
                    Ok(result)
                }
                Err(e) => match e.class() {
                    FailureClass::Retryable => {
                        tracing::warn!(attempt = current, error = %e, "Retryable upstream error");
                        Err(backoff::Error::transient(e))
                    }
                    FailureClass::Terminal => {
                        tracing::error!(attempt = current, error = %e, "Terminal upstream error, not retrying");
                        Err(backoff::Error::permanent(e))
                    }
                },
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_policy_should_allow_three_attempts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn base_delay_should_double_per_attempt() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.base_delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.base_delay_after(3), Duration::from_millis(2000));
    }

    #[test]
    fn backoff_should_stop_after_max_attempts() {
        let mut backoff = AttemptBackoff::new(RetryPolicy::default());

        let first = backoff.next_backoff().unwrap();
        let second = backoff.next_backoff().unwrap();

        assert!(first >= Duration::from_millis(500) && first <= Duration::from_millis(600));
        assert!(second >= Duration::from_millis(1000) && second <= Duration::from_millis(1100));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn backoff_reset_should_restart_sequence() {
        let mut backoff = AttemptBackoff::new(RetryPolicy::immediate(2));

        assert!(backoff.next_backoff().is_some());
        assert!(backoff.next_backoff().is_none());
        backoff.reset();
        assert!(backoff.next_backoff().is_some());
    }

    #[tokio::test]
    async fn with_retry_should_succeed_on_first_try() {
        let result = with_retry(RetryPolicy::immediate(3), || async {
            Ok::<_, UpstreamError>("success")
        })
        .await;

        tokio_test::assert_ok!(&result);
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn with_retry_should_recover_from_transient_error() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result = with_retry(RetryPolicy::immediate(3), || {
            let attempts = Arc::clone(&attempts);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(UpstreamError::RateLimited("slow down".to_string()))
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_should_stop_after_three_retryable_failures() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result = with_retry(RetryPolicy::immediate(3), || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(UpstreamError::Server("502 bad gateway".to_string()))
            }
        })
        .await;

        assert!(matches!(result, Err(UpstreamError::Server(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_should_not_retry_terminal_error() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result = with_retry(RetryPolicy::immediate(3), || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(UpstreamError::Auth("invalid api key".to_string()))
            }
        })
        .await;

        tokio_test::assert_err!(&result);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn with_retry_should_wait_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_jitter: Duration::ZERO,
        };
        let started = tokio::time::Instant::now();

        let _ = with_retry(policy, || async {
            Err::<(), _>(UpstreamError::Timeout(20))
        })
        .await;

        // 500ms + 1000ms
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
