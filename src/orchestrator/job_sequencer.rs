//! 作业编排器 - 编排层
//!
//! ## 职责
//!
//! 唯一持有 `RunState` 的任务。所有输入（控制命令、延迟到期、视图事件）
//! 都排进同一个收件箱，按顺序逐条处理，同一时刻只有一件商品在处理。
//! 填写在编排器任务内直接执行，其结果（FILL_COMPLETE / FILL_ERROR）就是
//! `FormFiller::fill` 的返回值。
//!
//! ## 状态流转
//!
//! ```text
//! idle ──START──▶ running ──填写成功──▶ paused ──关闭 / 离开表单──▶ running (下一件)
//!                   │                    │
//!                   └──填写失败：跳过────┘         队列耗尽 ──▶ idle
//! 任意活动状态 ──STOP──▶ stopped          前置条件失败 ──▶ error
//! ```
//!
//! ## 要点
//!
//! - 每次修改状态都以一次 `publish` 结束
//! - STOP 只在下一次进入循环时生效，正在进行的填写会先跑完
//! - 下一件的延迟调度带有代次号，新的 START / STOP 会让旧的调度失效
//! - 等待人工确认没有超时

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::table::col;
use crate::models::{Message, RunState, RunStatus, StateSnapshot, WorkItem};
use crate::orchestrator::handle::OrchestratorHandle;
use crate::orchestrator::source_channel::{envelope, SourceChannel};
use crate::services::{FormFiller, StatusBroadcaster};
use crate::utils::logging::truncate_text;
use crate::views::{ViewEvent, Workspace};

/// 收件箱里的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Start,
    Stop,
    /// 延迟调度到期
    ItemDue { generation: u64 },
    View(ViewEvent),
    Shutdown,
}

/// 作业编排器
pub struct JobSequencer {
    config: Config,
    workspace: Arc<dyn Workspace>,
    state: RunState,
    broadcaster: StatusBroadcaster,
    channel: SourceChannel,
    filler: FormFiller,
    inbox: mpsc::UnboundedReceiver<Event>,
    scheduler: mpsc::UnboundedSender<Event>,
    generation: u64,
}

/// 启动编排器任务，返回控制句柄
pub fn spawn(config: Config, workspace: Arc<dyn Workspace>) -> (OrchestratorHandle, JoinHandle<()>) {
    let broadcaster = StatusBroadcaster::new();
    let (tx, inbox) = mpsc::unbounded_channel();

    // 先订阅，保证编排器启动后的视图事件都不会丢
    forward_view_events(workspace.subscribe_events(), broadcaster.watch(), tx.clone());

    let sequencer = JobSequencer {
        channel: SourceChannel::new(&config),
        filler: FormFiller::new(&config),
        config,
        workspace,
        state: RunState::default(),
        broadcaster: broadcaster.clone(),
        inbox,
        scheduler: tx.clone(),
        generation: 0,
    };

    let task = tokio::spawn(sequencer.run());
    (OrchestratorHandle::new(tx, broadcaster), task)
}

/// 把工作区的视图事件转进收件箱
///
/// 导航事件只在 paused 时有意义，收到时就按当时的状态过滤，
/// 避免表单加载过程中的跳转被当成提交。
fn forward_view_events(
    mut events: broadcast::Receiver<ViewEvent>,
    status: watch::Receiver<StateSnapshot>,
    tx: mpsc::UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if matches!(event, ViewEvent::Navigated { .. })
                        && status.borrow().status != RunStatus::Paused
                    {
                        continue;
                    }
                    if tx.send(Event::View(event)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("视图事件落后，丢失 {} 条", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("视图事件转发结束");
    });
}

impl JobSequencer {
    async fn run(mut self) {
        info!("🎬 编排器已启动");
        while let Some(event) = self.inbox.recv().await {
            if event == Event::Shutdown {
                break;
            }
            self.handle(event).await;
        }
        info!("编排器已退出");
    }

    async fn handle(&mut self, event: Event) {
        match event {
            Event::Start => self.start().await,
            Event::Stop => self.stop(),
            Event::ItemDue { generation } => {
                if generation == self.generation {
                    self.process_next_item().await;
                } else {
                    debug!("忽略过期的调度 (代次 {} ≠ {})", generation, self.generation);
                }
            }
            Event::View(ViewEvent::Closed { view }) => {
                if self.state.status.is_active() && self.is_target(&view) {
                    self.on_item_complete("表单页已关闭").await;
                }
            }
            Event::View(ViewEvent::Navigated { view, url }) => {
                if self.state.status == RunStatus::Paused
                    && self.is_target(&view)
                    && !url.starts_with(&self.config.form_url_prefix)
                {
                    self.on_item_complete(&format!("已跳转到 {}", url)).await;
                }
            }
            Event::Shutdown => {}
        }
    }

    // ========== 控制命令 ==========

    async fn start(&mut self) {
        if self.state.status.is_active() {
            warn!("已有运行在进行中（{}），忽略 START", self.state.status);
            return;
        }

        info!("{}", "=".repeat(60));
        info!("🚀 开始新的运行");
        self.generation += 1;
        self.state.reset();
        self.state.status = RunStatus::Running;
        self.publish();

        match self.prepare_queue().await {
            Ok(()) => {
                self.publish();
                self.process_next_item().await;
            }
            Err(message) => self.fail_run(message),
        }
    }

    fn stop(&mut self) {
        if !self.state.status.is_active() {
            debug!("没有进行中的运行（{}），忽略 STOP", self.state.status);
            return;
        }
        info!("⏹️ 运行已停止（第 {}/{} 项）", self.state.current_index() + 1, self.state.total());
        self.generation += 1;
        self.state.status = RunStatus::Stopped;
        self.state.target = None;
        self.publish();
    }

    /// 定位表格视图并提取队列；失败时返回面向用户的错误信息
    async fn prepare_queue(&mut self) -> Result<(), String> {
        let mut sources = self
            .workspace
            .find_source_views()
            .await
            .map_err(|e| format!("查找表格视图失败: {}", e))?;

        if sources.is_empty() {
            return Err("未找到打开的表格视图".to_string());
        }
        if sources.len() > 1 {
            warn!("找到 {} 个表格视图，使用第一个", sources.len());
        }
        let source = sources.swap_remove(0);

        let reply = self.channel.request_rows(source.as_ref()).await;
        if let Some(error) = reply.response.error {
            return Err(format!("读取表格失败: {}", error));
        }
        if reply.response.rows.is_empty() {
            return Err("没有需要处理的行".to_string());
        }

        info!("✓ 队列共 {} 项", reply.response.rows.len());
        self.state.source = Some(source);
        self.state.load(reply.response.rows, reply.column_offset);
        Ok(())
    }

    fn fail_run(&mut self, message: String) {
        error!("❌ 运行失败: {}", message);
        self.state.status = RunStatus::Error;
        self.state.last_error = Some(message);
        self.publish();
    }

    // ========== 单件处理 ==========

    /// 循环入口：检查停止 → 检查队列 → 处理当前项
    async fn process_next_item(&mut self) {
        if !self.state.status.is_active() {
            debug!("运行不在进行中（{}），不再处理下一项", self.state.status);
            return;
        }

        let Some(item) = self.state.current_item().cloned() else {
            self.finish_run();
            return;
        };

        self.state.status = RunStatus::Running;
        self.publish();

        info!("{}", "─".repeat(60));
        info!(
            "▶️ 第 {}/{} 项（行 {}）: {}",
            self.state.current_index() + 1,
            self.state.total(),
            item.display_row(),
            truncate_text(&item.product_name, 40)
        );

        match self.begin_item(&item).await {
            Ok(()) => self.on_fill_complete(),
            Err(e) => self.on_fill_error(e.to_string()),
        }
    }

    /// 打开表单 → 等待加载 → 稳定等待 → 填写
    async fn begin_item(&mut self, item: &WorkItem) -> AppResult<()> {
        let target = self.workspace.open_target_view(&self.config.form_url).await?;
        self.state.target = Some(target.clone());

        target.wait_loaded().await?;
        sleep(self.config.settle_delay()).await;

        debug!(
            "→ {} {}",
            target.id(),
            envelope(&Message::FillForm { data: item.clone() })
        );
        self.filler.fill(target.as_ref(), item).await
    }

    fn on_fill_complete(&mut self) {
        info!("⏸️ 已进入预览，等待人工确认");
        self.state.status = RunStatus::Paused;
        self.publish();
    }

    /// 单件失败：记录错误并跳过，不终止运行
    fn on_fill_error(&mut self, error: String) {
        let row = self
            .state
            .current_item()
            .map(WorkItem::display_row)
            .unwrap_or_default();
        error!("❌ 行 {} 填写失败: {}", row, error);

        self.state.last_error = Some(format!("行{}: {}", row, error));
        self.state.target = None;
        self.advance_and_schedule();
    }

    /// 当前项完成：回写状态（尽力而为）→ 前进 → 调度下一项
    async fn on_item_complete(&mut self, reason: &str) {
        let Some(item) = self.state.current_item().cloned() else {
            return;
        };
        info!("✔️ 行 {} 完成（{}）", item.display_row(), reason);

        self.write_back(&item).await;

        self.state.last_error = None;
        self.state.target = None;
        self.advance_and_schedule();
    }

    async fn write_back(&self, item: &WorkItem) {
        let Some(source) = self.state.source.clone() else {
            warn!("没有表格视图，跳过状态回写");
            return;
        };
        let column = col::SAVE_STATUS + self.state.column_offset;
        let response = self
            .channel
            .request_status_update(source.as_ref(), item.row_index, column)
            .await;
        if !response.success {
            warn!(
                "⚠️ 行 {} 状态回写失败: {}",
                item.display_row(),
                response.error.unwrap_or_default()
            );
        }
    }

    fn advance_and_schedule(&mut self) {
        self.state.advance();
        if self.state.is_exhausted() {
            self.finish_run();
            return;
        }
        self.state.status = RunStatus::Running;
        self.publish();
        self.schedule_next();
    }

    fn finish_run(&mut self) {
        self.state.status = RunStatus::Idle;
        self.state.target = None;
        self.publish();
        info!("{}", "=".repeat(60));
        info!("✅ 全部完成: {}/{}", self.state.current_index(), self.state.total());
        info!("{}", "=".repeat(60));
    }

    fn schedule_next(&self) {
        let generation = self.generation;
        let delay = self.config.next_item_delay();
        let tx = self.scheduler.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(Event::ItemDue { generation });
        });
    }

    fn is_target(&self, view: &str) -> bool {
        self.state.target_id().as_deref() == Some(view)
    }

    fn publish(&self) {
        self.broadcaster.publish(self.state.snapshot());
    }
}
