//! 会话列表控制器

use crate::im::conversation::session::{close_session, ChatSession};
use crate::im::format::{build_conversation_items, local_now};
use crate::im::identity::IdentitySource;
use crate::im::listener::{MessagingView, NoticeLevel};
use crate::im::store::ConversationStore;
use crate::im::types::UserType;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 列表刷新的请求序号，开启后丢弃比已应用结果更旧的响应
#[derive(Debug, Default)]
pub struct RefreshFence {
    enabled: bool,
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RefreshFence {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// 为一次刷新分配序号
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 响应到达时判断是否应用；关闭时总是应用（后到者覆盖）
    pub fn accept(&self, seq: u64) -> bool {
        if !self.enabled {
            return true;
        }
        self.applied.fetch_max(seq, Ordering::SeqCst) < seq
    }
}

/// 会话列表控制器
pub struct ConversationList {
    store: Arc<dyn ConversationStore>,
    view: Arc<dyn MessagingView>,
    identity: IdentitySource,
    session: Arc<ChatSession>,
    fence: RefreshFence,
}

impl ConversationList {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn MessagingView>,
        identity: IdentitySource,
        session: Arc<ChatSession>,
        stale_response_guard: bool,
    ) -> Self {
        Self {
            store,
            view,
            identity,
            session,
            fence: RefreshFence::new(stale_response_guard),
        }
    }

    /// 重新获取并渲染会话列表；任何失败都只渲染空列表
    pub async fn refresh(&self) {
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[ConvList] {}，显示空列表", e);
                self.view.render_conversations_empty().await;
                return;
            }
        };

        let seq = self.fence.issue();
        debug!("[ConvList] 📡 刷新会话列表 seq={} user={}({})", seq, me.user_id, me.user_type);
        let result = self.store.list_conversations(&me).await;

        if !self.fence.accept(seq) {
            debug!("[ConvList] 丢弃过期的会话列表响应 seq={}", seq);
            return;
        }

        let conversations = match result {
            Ok(resp) => match resp.into_result() {
                Ok(data) => data.unwrap_or_default(),
                Err(e) => {
                    warn!("[ConvList] 获取会话列表失败: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                error!("[ConvList] 会话列表请求失败: {:#}", e);
                Vec::new()
            }
        };

        if conversations.is_empty() {
            self.view.render_conversations_empty().await;
            return;
        }

        let items =
            build_conversation_items(&conversations, self.session.partner_key(), local_now());
        debug!("[ConvList] ✅ 渲染 {} 个会话", items.len());
        self.view.render_conversations(&items).await;
    }

    /// 删除与某人的对话，需要用户确认
    pub async fn delete_conversation(&self, partner_id: i64, partner_type: UserType) {
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[ConvList] {}，忽略删除", e);
                self.view.render_conversations_empty().await;
                return;
            }
        };

        if !self
            .view
            .confirm("确定要删除这个对话吗？删除后聊天记录将无法恢复。")
            .await
        {
            debug!("[ConvList] 用户取消删除 partner={}({})", partner_id, partner_type);
            return;
        }

        info!("[ConvList] 🗑️ 删除对话 partner={}({})", partner_id, partner_type);
        // 必须等删除完成后再刷新列表
        match self
            .store
            .delete_conversation(&me, partner_id, partner_type)
            .await
        {
            Ok(resp) => match resp.into_result() {
                Ok(_) => {
                    if self.session.is_with(partner_id, partner_type) {
                        close_session(&self.session, self.view.as_ref()).await;
                    }
                    self.view.notify(NoticeLevel::Success, "对话已删除").await;
                    self.refresh().await;
                }
                Err(e) => {
                    warn!("[ConvList] 删除对话失败: {}", e);
                    self.view.notify(NoticeLevel::Error, &e.to_string()).await;
                }
            },
            Err(e) => {
                error!("[ConvList] 删除对话请求失败: {:#}", e);
                self.view
                    .notify(NoticeLevel::Error, "删除失败，请检查网络连接")
                    .await;
            }
        }
    }
}
