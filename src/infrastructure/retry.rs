//! 有界重试
//!
//! 跨视图的请求 / 应答可能因为页面尚未就绪而暂时失败，
//! 按固定间隔重试有限次数，最后一次的错误原样返回。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::Config;
use crate::error::AppResult;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（至少 1 次）
    pub attempts: usize,
    /// 两次尝试之间的固定间隔
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.message_retries, config.message_backoff())
    }

    /// 执行操作，失败时按策略重试
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "{} 失败 (尝试 {}/{}): {}，{:?} 后重试",
                        label, attempt, self.attempts, e, self.backoff
                    );
                    sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = policy
            .run("GET_ROWS", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::other("receiving end does not exist"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(tokio_test::assert_ok!(result), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_bounded_attempts() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let result: AppResult<()> = policy
            .run("UPDATE_STATUS", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::other("tab gone"))
            })
            .await;

        let err = tokio_test::assert_err!(result);
        assert!(err.to_string().contains("tab gone"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
    }
}
