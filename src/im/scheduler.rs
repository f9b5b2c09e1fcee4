//! 定时刷新
//!
//! 每个页面只有一个定时器：每次触发都刷新未读数，有打开的对话时再静默刷新聊天记录。
//! 没有退避和抖动，固定周期。

use crate::im::conversation::ActiveConversation;
use crate::im::unread::UnreadCounter;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 默认刷新周期
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// 定时任务句柄，取消或丢弃时终止任务
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// 取消定时任务
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// 消息定时刷新器
pub struct MessageRefresher {
    period: Duration,
    unread: Arc<UnreadCounter>,
    active: Arc<ActiveConversation>,
    handle: Mutex<Option<RefreshHandle>>,
    ticks: Arc<AtomicU64>,
}

impl MessageRefresher {
    pub fn new(period: Duration, unread: Arc<UnreadCounter>, active: Arc<ActiveConversation>) -> Self {
        Self {
            period,
            unread,
            active,
            handle: Mutex::new(None),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 启动定时刷新；已有定时器时先取消，保证最多一个。必须在 tokio 运行时内调用
    pub fn start_message_refresh(&self) {
        let mut slot = self.handle.lock();
        if let Some(previous) = slot.take() {
            debug!("[Poll] 取消已有定时器");
            previous.cancel();
        }

        let period = self.period;
        let unread = self.unread.clone();
        let active = self.active.clone();
        let ticks = self.ticks.clone();
        let task = tokio::spawn(async move {
            // 与 setInterval 一致，第一次触发在一个周期之后
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("[Poll] ⏰ 第 {} 次定时刷新", n);
                unread.refresh().await;
                active.reload_silently().await;
            }
        });
        info!("[Poll] 🔄 启动消息定时刷新，周期 {:?}", period);
        *slot = Some(RefreshHandle { task });
    }

    /// 停止定时刷新
    pub fn stop_message_refresh(&self) {
        if let Some(handle) = self.handle.lock().take() {
            info!("[Poll] ⏹️ 停止消息定时刷新");
            handle.cancel();
        }
    }

    /// 是否有定时器在运行
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// 累计触发次数
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for MessageRefresher {
    fn drop(&mut self) {
        self.stop_message_refresh();
    }
}
