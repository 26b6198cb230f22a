//! 运行记录服务
//!
//! 把每一次状态变化追加写入日志文件，便于事后核对哪些行被处理过。

use std::fs::OpenOptions;
use std::io::Write;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::{Message, StateSnapshot};

/// 运行记录
pub struct RunJournal {
    path: String,
}

impl RunJournal {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// 追加一条状态记录
    pub fn append(&self, state: &StateSnapshot) -> AppResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = format_line(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), state);
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// 持续记录，直到广播关闭
    pub async fn follow(self, mut updates: broadcast::Receiver<Message>) {
        loop {
            match updates.recv().await {
                Ok(Message::StateUpdate { state }) => {
                    if let Err(e) = self.append(&state) {
                        warn!("写入运行记录失败: {}", e);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("运行记录落后，丢失 {} 条状态", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("状态广播已关闭，运行记录结束");
                    break;
                }
            }
        }
    }
}

fn format_line(timestamp: &str, state: &StateSnapshot) -> String {
    match &state.error {
        Some(error) => format!(
            "[{}] {} {}/{} | {}\n",
            timestamp, state.status, state.current_index, state.total, error
        ),
        None => format!(
            "[{}] {} {}/{}\n",
            timestamp, state.status, state.current_index, state.total
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;

    #[test]
    fn test_format_line() {
        let state = StateSnapshot {
            status: RunStatus::Running,
            current_index: 2,
            total: 5,
            error: Some("行3: 商品名面板不存在".to_string()),
        };
        assert_eq!(
            format_line("2026-01-01 10:00:00", &state),
            "[2026-01-01 10:00:00] running 2/5 | 行3: 商品名面板不存在\n"
        );
    }

    #[test]
    fn test_append_creates_file() {
        let path = std::env::temp_dir().join(format!("journal-{}.log", std::process::id()));
        let journal = RunJournal::with_path(path.to_string_lossy().to_string());

        journal.append(&StateSnapshot::default()).unwrap();
        journal.append(&StateSnapshot::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("idle 0/0"));
        let _ = std::fs::remove_file(path);
    }
}
