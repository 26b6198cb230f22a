//! 控制消息
//!
//! 所有消息的形状都是 `{ "type": "...", ...payload }`。

use serde::{Deserialize, Serialize};

use crate::models::run_state::StateSnapshot;
use crate::models::work_item::WorkItem;

/// 消息信封
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// 控制端 → 编排器
    Start,
    /// 控制端 → 编排器
    Stop,
    /// 控制端 → 编排器，应答为 `StateSnapshot`
    GetState,
    /// 编排器 → 观察者
    StateUpdate { state: StateSnapshot },
    /// 编排器 → 表格视图，应答为 `RowsResponse`
    GetRows,
    /// 编排器 → 表格视图，应答为 `StatusResponse`
    #[serde(rename_all = "camelCase")]
    UpdateStatus { row_index: usize },
    /// 编排器 → 表单视图
    FillForm { data: WorkItem },
    /// 表单视图 → 编排器
    FillComplete,
    /// 表单视图 → 编排器
    FillError { error: String },
}

/// GET_ROWS 的应答
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowsResponse {
    pub rows: Vec<WorkItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// UPDATE_STATUS 的应答
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::run_state::RunStatus;

    #[test]
    fn test_parse_control_envelopes() {
        let start: Message = serde_json::from_str(r#"{"type":"START"}"#).unwrap();
        assert_eq!(start, Message::Start);

        let state: Message = serde_json::from_str(r#"{"type":"GET_STATE"}"#).unwrap();
        assert_eq!(state, Message::GetState);

        let err: Message =
            serde_json::from_str(r#"{"type":"FILL_ERROR","error":"panel missing"}"#).unwrap();
        assert_eq!(
            err,
            Message::FillError {
                error: "panel missing".to_string()
            }
        );
    }

    #[test]
    fn test_state_update_envelope() {
        let msg = Message::StateUpdate {
            state: StateSnapshot {
                status: RunStatus::Paused,
                current_index: 1,
                total: 3,
                error: None,
            },
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "STATE_UPDATE");
        assert_eq!(value["state"]["status"], "paused");
        assert_eq!(value["state"]["currentIndex"], 1);
    }

    #[test]
    fn test_update_status_payload() {
        let value = serde_json::to_value(Message::UpdateStatus { row_index: 7 }).unwrap();
        assert_eq!(value, serde_json::json!({"type": "UPDATE_STATUS", "rowIndex": 7}));

        let response: StatusResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert!(response.error.is_none());
    }
}
