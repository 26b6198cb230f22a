//! 编排器控制句柄
//!
//! 控制端只通过这里和编排器交互：
//! 命令排进编排器的收件箱，状态从广播器读取。

use tokio::sync::{broadcast, mpsc, watch};
use tracing::warn;

use crate::models::{Message, StateSnapshot};
use crate::orchestrator::job_sequencer::Event;
use crate::services::StatusBroadcaster;

/// 编排器控制句柄
#[derive(Clone)]
pub struct OrchestratorHandle {
    inbox: mpsc::UnboundedSender<Event>,
    broadcaster: StatusBroadcaster,
}

impl OrchestratorHandle {
    pub(crate) fn new(inbox: mpsc::UnboundedSender<Event>, broadcaster: StatusBroadcaster) -> Self {
        Self { inbox, broadcaster }
    }

    pub fn start(&self) {
        self.send(Event::Start);
    }

    pub fn stop(&self) {
        self.send(Event::Stop);
    }

    /// 让编排器任务退出
    pub fn shutdown(&self) {
        self.send(Event::Shutdown);
    }

    /// 最新状态
    pub fn get_state(&self) -> StateSnapshot {
        self.broadcaster.current()
    }

    /// 订阅每一次 STATE_UPDATE
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.broadcaster.subscribe()
    }

    /// 订阅最新状态
    pub fn watch(&self) -> watch::Receiver<StateSnapshot> {
        self.broadcaster.watch()
    }

    /// 按消息信封分发；GET_STATE 返回状态，其余返回 None
    pub fn dispatch(&self, message: Message) -> Option<StateSnapshot> {
        match message {
            Message::Start => self.start(),
            Message::Stop => self.stop(),
            Message::GetState => return Some(self.get_state()),
            other => warn!("控制端不能发送 {:?}，已忽略", other),
        }
        None
    }

    fn send(&self, event: Event) {
        if self.inbox.send(event).is_err() {
            warn!("编排器已退出，命令被丢弃");
        }
    }
}
