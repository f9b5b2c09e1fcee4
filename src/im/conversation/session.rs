//! 当前打开的对话
//!
//! 同一页面最多只有一个打开的对话。每次打开都会递增代号，
//! 关闭或被新对话取代后，旧代号上的异步结果一律丢弃。

use crate::im::listener::MessagingView;
use crate::im::types::UserType;
use parking_lot::Mutex;
use tracing::info;

/// 对话状态：Closed → Opening → Open → Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Closed,
    Opening,
    Open,
}

/// 打开的对话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub partner_id: i64,
    pub partner_type: UserType,
    pub partner_name: String,
    pub course_id: Option<i64>,
}

impl ActiveSession {
    pub fn is_with(&self, partner_id: i64, partner_type: UserType) -> bool {
        self.partner_id == partner_id && self.partner_type == partner_type
    }
}

#[derive(Debug)]
struct Slot {
    phase: ChatPhase,
    current: Option<ActiveSession>,
    generation: u64,
}

/// 对话状态机，只有对话控制器（及其关闭路径）会写入
#[derive(Debug)]
pub struct ChatSession {
    slot: Mutex<Slot>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                phase: ChatPhase::Closed,
                current: None,
                generation: 0,
            }),
        }
    }

    /// 开始打开新对话，取代之前的对话，返回新代号
    pub(crate) fn begin_opening(&self, session: ActiveSession) -> u64 {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.current = Some(session);
        slot.phase = ChatPhase::Opening;
        slot.generation
    }

    /// 打开流程结束（无论成功与否都进入 Open）
    pub(crate) fn mark_open(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation == generation && slot.current.is_some() {
            slot.phase = ChatPhase::Open;
            true
        } else {
            false
        }
    }

    /// 关闭当前对话，返回被关闭的对话
    pub(crate) fn close(&self) -> Option<ActiveSession> {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.phase = ChatPhase::Closed;
        slot.current.take()
    }

    pub fn phase(&self) -> ChatPhase {
        self.slot.lock().phase
    }

    /// 当前对话的快照
    pub fn current(&self) -> Option<ActiveSession> {
        self.slot.lock().current.clone()
    }

    /// 当前对话及其代号
    pub(crate) fn snapshot(&self) -> Option<(u64, ActiveSession)> {
        let slot = self.slot.lock();
        slot.current.clone().map(|s| (slot.generation, s))
    }

    /// 已打开（Open）的对话及其代号
    pub(crate) fn open_snapshot(&self) -> Option<(u64, ActiveSession)> {
        let slot = self.slot.lock();
        match (slot.phase, slot.current.as_ref()) {
            (ChatPhase::Open, Some(s)) => Some((slot.generation, s.clone())),
            _ => None,
        }
    }

    /// 代号是否仍然有效
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let slot = self.slot.lock();
        slot.generation == generation && slot.current.is_some()
    }

    pub fn is_with(&self, partner_id: i64, partner_type: UserType) -> bool {
        self.slot
            .lock()
            .current
            .as_ref()
            .is_some_and(|s| s.is_with(partner_id, partner_type))
    }

    /// 当前对话伙伴，用于列表高亮
    pub fn partner_key(&self) -> Option<(i64, UserType)> {
        self.slot
            .lock()
            .current
            .as_ref()
            .map(|s| (s.partner_id, s.partner_type))
    }
}

/// 关闭路径：清空对话并显示空闲占位。轮询看到没有打开的对话后不再刷新聊天记录
pub(crate) async fn close_session(session: &ChatSession, view: &dyn MessagingView) {
    if let Some(closed) = session.close() {
        info!(
            "[Chat] 关闭与 {}({}) 的对话",
            closed.partner_name, closed.partner_id
        );
    }
    view.render_idle().await;
}
