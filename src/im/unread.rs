//! 未读消息计数

use crate::im::identity::IdentitySource;
use crate::im::listener::MessagingView;
use crate::im::store::ConversationStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 页面级未读数，每次以服务端返回为准
pub struct UnreadCounter {
    store: Arc<dyn ConversationStore>,
    view: Arc<dyn MessagingView>,
    identity: IdentitySource,
    count: AtomicU64,
}

impl UnreadCounter {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn MessagingView>,
        identity: IdentitySource,
    ) -> Self {
        Self {
            store,
            view,
            identity,
            count: AtomicU64::new(0),
        }
    }

    /// 最近一次成功获取的未读数
    pub fn current(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// 刷新未读数并更新角标；失败只记录日志
    pub async fn refresh(&self) {
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[Unread] 跳过刷新: {}", e);
                return;
            }
        };

        match self.store.unread_count(&me).await {
            Ok(resp) => match resp.into_result() {
                Ok(data) => {
                    let count = data.unwrap_or(0);
                    let previous = self.count.swap(count, Ordering::Relaxed);
                    if previous != count {
                        debug!("[Unread] 📬 未读数变更: {} -> {}", previous, count);
                    }
                    self.view.render_unread_badge(count).await;
                }
                Err(e) => warn!("[Unread] 获取未读数失败: {}", e),
            },
            Err(e) => warn!("[Unread] 获取未读数请求失败: {:#}", e),
        }
    }
}
