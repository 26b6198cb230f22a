//! 状态广播服务
//!
//! 编排器每次修改状态后调用一次 `publish`。
//! - `watch` 保存最新快照，GET_STATE 读到的永远是最新值
//! - `broadcast` 按顺序推送每一次 STATE_UPDATE，给需要完整历史的观察者

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::models::{Message, StateSnapshot};

const UPDATE_CAPACITY: usize = 256;

/// 状态广播器
#[derive(Clone)]
pub struct StatusBroadcaster {
    latest: Arc<watch::Sender<StateSnapshot>>,
    updates: broadcast::Sender<Message>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(StateSnapshot::default());
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            latest: Arc::new(latest),
            updates,
        }
    }

    /// 发布新状态（没有观察者时忽略）
    pub fn publish(&self, snapshot: StateSnapshot) {
        debug!(
            "STATE_UPDATE: {} {}/{} {:?}",
            snapshot.status, snapshot.current_index, snapshot.total, snapshot.error
        );
        self.latest.send_replace(snapshot.clone());
        let _ = self.updates.send(Message::StateUpdate { state: snapshot });
    }

    /// 最新快照
    pub fn current(&self) -> StateSnapshot {
        self.latest.borrow().clone()
    }

    /// 订阅最新快照
    pub fn watch(&self) -> watch::Receiver<StateSnapshot> {
        self.latest.subscribe()
    }

    /// 订阅每一次 STATE_UPDATE
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.updates.subscribe()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
