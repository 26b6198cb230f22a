//! 状态回写服务 - 业务能力层
//!
//! 把某一行的状态单元格改写为「出品済み」。
//! 流程：双击单元格 → 等待编辑面出现 → 清空并写入 → 回车确认。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, StatusWriteError};
use crate::views::{EditorSurface, SourceView};

/// 探测编辑面的间隔
const PROBE_INTERVAL: Duration = Duration::from_millis(100);
/// 写入后到回车前的等待
const INPUT_SETTLE: Duration = Duration::from_millis(200);
/// 回车后等待表格提交
const COMMIT_SETTLE: Duration = Duration::from_millis(300);

/// 状态回写服务
pub struct StatusWriter {
    editor_wait: Duration,
    input_settle: Duration,
    commit_settle: Duration,
}

impl StatusWriter {
    pub fn new(config: &Config) -> Self {
        let editor_wait = config.editor_wait();
        // 所有等待归零时（测试），写入和提交也不再等待
        let (input_settle, commit_settle) = if editor_wait.is_zero() {
            (Duration::ZERO, Duration::ZERO)
        } else {
            (INPUT_SETTLE, COMMIT_SETTLE)
        };
        Self {
            editor_wait,
            input_settle,
            commit_settle,
        }
    }

    /// 改写单元格
    pub async fn write(
        &self,
        source: &dyn SourceView,
        row: usize,
        column: usize,
        value: &str,
    ) -> AppResult<()> {
        debug!("回写单元格 (行 {}, 列 {}) = {}", row, column, value);

        if !source.activate_cell(row, column).await? {
            return Err(StatusWriteError::CellNotFound { row, column }.into());
        }

        let surface = self.await_editor(source, row).await?;
        debug!("编辑面: {:?}", surface);

        source.replace_editor_text(surface, value).await?;
        sleep(self.input_settle).await;

        source.commit_edit(surface).await?;
        sleep(self.commit_settle).await;

        info!("✓ 行 {} 已更新为「{}」", row + 1, value);
        Ok(())
    }

    /// 在有限时间内轮询编辑面
    async fn await_editor(&self, source: &dyn SourceView, row: usize) -> AppResult<EditorSurface> {
        let deadline = Instant::now() + self.editor_wait;
        loop {
            if let Some(surface) = source.probe_editor().await? {
                return Ok(surface);
            }
            if Instant::now() >= deadline {
                return Err(StatusWriteError::EditorNotFound { row }.into());
            }
            sleep(PROBE_INTERVAL.min(self.editor_wait)).await;
        }
    }
}
