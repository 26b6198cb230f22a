//! 表格视图的请求 / 应答通道
//!
//! 把 GET_ROWS / UPDATE_STATUS 两种请求包装成有界重试的调用，
//! 结果总是以应答结构返回，失败写进 `error` 字段而不是向上传播。

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::RetryPolicy;
use crate::models::table::STATUS_LISTED;
use crate::models::{Message, RowsResponse, StatusResponse};
use crate::services::{extract_work_items, StatusWriter};
use crate::views::SourceView;

/// GET_ROWS 的结果：应答 + 本次检测到的列偏移
#[derive(Debug, Clone, Default)]
pub struct RowsReply {
    pub response: RowsResponse,
    pub column_offset: usize,
}

/// 表格视图通道
pub struct SourceChannel {
    policy: RetryPolicy,
    writer: StatusWriter,
    max_jobs: usize,
}

impl SourceChannel {
    pub fn new(config: &Config) -> Self {
        Self {
            policy: RetryPolicy::from_config(config),
            writer: StatusWriter::new(config),
            max_jobs: config.max_jobs,
        }
    }

    /// GET_ROWS：读取整张表并提取待处理行
    pub async fn request_rows(&self, source: &dyn SourceView) -> RowsReply {
        debug!("→ {} {}", source.id(), envelope(&Message::GetRows));

        let table = self
            .policy
            .run("GET_ROWS", move || async move { source.fetch_table().await })
            .await;

        match table {
            Ok(table) => {
                let extraction = extract_work_items(&table, self.max_jobs);
                info!(
                    "📋 提取到 {} 个待处理行（列偏移 {}）",
                    extraction.items.len(),
                    extraction.column_offset
                );
                RowsReply {
                    response: RowsResponse {
                        rows: extraction.items,
                        error: None,
                    },
                    column_offset: extraction.column_offset,
                }
            }
            Err(e) => {
                warn!("GET_ROWS 失败: {}", e);
                RowsReply {
                    response: RowsResponse {
                        rows: Vec::new(),
                        error: Some(e.to_string()),
                    },
                    column_offset: 0,
                }
            }
        }
    }

    /// UPDATE_STATUS：把行的状态单元格改写为「出品済み」
    pub async fn request_status_update(
        &self,
        source: &dyn SourceView,
        row_index: usize,
        column: usize,
    ) -> StatusResponse {
        debug!(
            "→ {} {}",
            source.id(),
            envelope(&Message::UpdateStatus { row_index })
        );

        let writer = &self.writer;
        let result = self
            .policy
            .run("UPDATE_STATUS", move || async move {
                writer.write(source, row_index, column, STATUS_LISTED).await
            })
            .await;

        match result {
            Ok(()) => StatusResponse {
                success: true,
                error: None,
            },
            Err(e) => StatusResponse {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// 日志用的消息信封
pub(crate) fn envelope(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{:?}", message))
}
