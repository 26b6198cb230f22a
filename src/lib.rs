//! # Listing Autofill
//!
//! 把电子表格里标记好的行逐件填写到出品表单的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `RetryPolicy` - 跨视图请求的有界重试
//!
//! ### ② 视图层（Views）
//! - `views/` - 只有这里认识网页 DOM
//! - `SheetsView` - 表格视图：读取整张表、改写状态单元格
//! - `ListingFormView` - 出品表单视图：按字段定位并写入
//! - `ChromeWorkspace` - 查找 / 打开视图，转发关闭和跳转事件
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单件商品
//! - `row_extractor` - 从表格提取待处理行
//! - `FormFiller` - 按固定顺序填写表单并进入预览
//! - `StatusWriter` - 把行状态改写为「出品済み」
//! - `StatusBroadcaster` / `RunJournal` - 发布与记录运行状态
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/job_sequencer` - 运行状态机，逐件处理队列
//! - `orchestrator/app` - 应用入口，控制端输入输出
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod views;

// 重新导出常用类型
pub use browser::connect_to_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, RetryPolicy};
pub use models::{Message, RunStatus, StateSnapshot, WorkItem};
pub use orchestrator::{App, OrchestratorHandle};
pub use views::{SourceView, TargetView, Workspace};
