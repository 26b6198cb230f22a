//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责逐件处理队列和运行状态管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `job_sequencer` - 作业编排器
//! - 唯一持有 `RunState`（队列、当前位置、状态、最近错误）
//! - 处理 START / STOP、填写结果、视图关闭 / 跳转事件
//! - 每次状态变化都通过 `StatusBroadcaster` 发布
//!
//! ### `handle` - 控制句柄
//! - 控制端发送命令、读取最新状态、订阅状态更新
//!
//! ### `source_channel` - 表格视图通道
//! - GET_ROWS / UPDATE_STATUS 的请求 / 应答，带有界重试
//!
//! ### `app` - 应用入口
//! - 连接浏览器、启动编排器、读写标准输入 / 输出
//!
//! ## 层次关系
//!
//! ```text
//! app (控制端 I/O)
//!     ↓
//! job_sequencer (处理 Vec<WorkItem>)
//!     ↓
//! services (能力层：row_extractor / form_filler / status_writer)
//!     ↓
//! views (视图适配器：sheets / listing_form)
//!     ↓
//! infrastructure (基础设施：JsExecutor / RetryPolicy)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一所有者**：只有编排器修改运行状态
//! 2. **顺序执行**：同一时刻只有一件商品在处理
//! 3. **向下依赖**：编排层 → services → views → infrastructure
//! 4. **失败可恢复**：单件失败只跳过该件，不终止运行

pub mod app;
pub mod handle;
pub mod job_sequencer;
pub mod source_channel;

// 重新导出主要类型
pub use app::App;
pub use handle::OrchestratorHandle;
pub use job_sequencer::{spawn, JobSequencer};
pub use source_channel::SourceChannel;
