//! 运行状态
//!
//! `RunState` 只由编排器持有和修改；外部只能看到 `StateSnapshot`。

use std::fmt;
use std::sync::Arc;

use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::models::work_item::WorkItem;
use crate::views::{SourceView, TargetView};

/// 控制端显示用的状态名
static STATUS_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "idle" => "待機中",
    "running" => "実行中",
    "paused" => "プレビュー待ち",
    "stopped" => "停止",
    "error" => "エラー",
};

/// 运行状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// 没有进行中的运行
    #[default]
    Idle,
    /// 正在打开表单或填写
    Running,
    /// 已进入预览，等待人工确认
    Paused,
    /// 被外部停止
    Stopped,
    /// 运行级失败
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Stopped => "stopped",
            RunStatus::Error => "error",
        }
    }

    /// 给操作员看的状态名
    pub fn label(self) -> &'static str {
        STATUS_LABELS.get(self.as_str()).copied().unwrap_or("")
    }

    /// 是否有运行在进行中
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对外广播的状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub status: RunStatus,
    pub current_index: usize,
    pub total: usize,
    pub error: Option<String>,
}

/// 编排器内部状态
#[derive(Default)]
pub struct RunState {
    pub status: RunStatus,
    items: Vec<WorkItem>,
    current_index: usize,
    pub last_error: Option<String>,
    /// 本次提取检测到的列偏移，回写状态时沿用
    pub column_offset: usize,
    pub source: Option<Arc<dyn SourceView>>,
    pub target: Option<Arc<dyn TargetView>>,
}

impl RunState {
    /// 开始新的运行：清空队列、错误和视图句柄
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 装入本次运行的队列
    pub fn load(&mut self, items: Vec<WorkItem>, column_offset: usize) {
        self.items = items;
        self.current_index = 0;
        self.column_offset = column_offset;
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// 当前项（已全部处理时为 None）
    pub fn current_item(&self) -> Option<&WorkItem> {
        self.items.get(self.current_index)
    }

    /// 前进一项，不会超过总数
    pub fn advance(&mut self) {
        if self.current_index < self.items.len() {
            self.current_index += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.items.len()
    }

    /// 当前目标视图 id
    pub fn target_id(&self) -> Option<String> {
        self.target.as_ref().map(|t| t.id())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            status: self.status,
            current_index: self.current_index,
            total: self.items.len(),
            error: self.last_error.clone(),
        }
    }
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunState")
            .field("status", &self.status)
            .field("current_index", &self.current_index)
            .field("total", &self.items.len())
            .field("last_error", &self.last_error)
            .field("column_offset", &self.column_offset)
            .field("target", &self.target_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<WorkItem> {
        (1..=n)
            .map(|i| WorkItem {
                row_index: i,
                product_name: format!("item {i}"),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_advance_never_exceeds_total() {
        let mut state = RunState::default();
        state.load(items(2), 0);
        state.advance();
        state.advance();
        state.advance();
        assert_eq!(state.current_index(), 2);
        assert!(state.is_exhausted());
        assert!(state.current_item().is_none());
    }

    #[test]
    fn test_reset_clears_run() {
        let mut state = RunState::default();
        state.load(items(3), 1);
        state.advance();
        state.status = RunStatus::Paused;
        state.last_error = Some("row 2: boom".to_string());

        state.reset();
        assert_eq!(state.snapshot(), StateSnapshot::default());
        assert_eq!(state.column_offset, 0);
    }

    #[test]
    fn test_every_status_has_a_label() {
        for status in [
            RunStatus::Idle,
            RunStatus::Running,
            RunStatus::Paused,
            RunStatus::Stopped,
            RunStatus::Error,
        ] {
            assert!(!status.label().is_empty(), "{status}");
        }
        assert_eq!(RunStatus::Paused.label(), "プレビュー待ち");
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut state = RunState::default();
        state.load(items(3), 0);
        state.status = RunStatus::Running;
        let value = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["currentIndex"], 0);
        assert_eq!(value["total"], 3);
        assert!(value["error"].is_null());
    }
}
