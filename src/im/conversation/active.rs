//! 当前对话控制器
//!
//! 负责打开对话（加载记录、标记已读、刷新未读数和列表）、发送消息和关闭对话。
//! 公开操作不返回错误，结果全部体现在界面上。

use crate::im::conversation::list::ConversationList;
use crate::im::conversation::session::{close_session, ActiveSession, ChatPhase, ChatSession};
use crate::im::entities::{MarkReadRequest, SendMessageRequest};
use crate::im::error::MessagingError;
use crate::im::format::{build_bubbles, local_now};
use crate::im::identity::IdentitySource;
use crate::im::listener::{MessagingView, NoticeLevel};
use crate::im::store::ConversationStore;
use crate::im::types::{Identity, UserType};
use crate::im::unread::UnreadCounter;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 当前对话控制器
pub struct ActiveConversation {
    store: Arc<dyn ConversationStore>,
    view: Arc<dyn MessagingView>,
    identity: IdentitySource,
    session: Arc<ChatSession>,
    unread: Arc<UnreadCounter>,
    conversations: Arc<ConversationList>,
}

impl ActiveConversation {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn MessagingView>,
        identity: IdentitySource,
        session: Arc<ChatSession>,
        unread: Arc<UnreadCounter>,
        conversations: Arc<ConversationList>,
    ) -> Self {
        Self {
            store,
            view,
            identity,
            session,
            unread,
            conversations,
        }
    }

    /// 当前对话状态（只读）
    pub fn session(&self) -> &Arc<ChatSession> {
        &self.session
    }

    pub fn phase(&self) -> ChatPhase {
        self.session.phase()
    }

    /// 打开与某人的对话，依次：加载记录 → 标记已读 → 刷新未读数 → 刷新列表
    pub async fn open(
        &self,
        partner_id: i64,
        partner_type: UserType,
        partner_name: &str,
        course_id: Option<i64>,
    ) {
        let session = ActiveSession {
            partner_id,
            partner_type,
            partner_name: partner_name.to_string(),
            course_id,
        };
        let generation = self.session.begin_opening(session.clone());
        info!(
            "[Chat] 💬 打开与 {}({}, {}) 的对话, courseId={:?}",
            partner_name, partner_id, partner_type, course_id
        );

        let header = format!("{} ({})", partner_name, partner_type.label());
        self.view.render_chat_header(&header).await;
        self.view.render_message_loading().await;

        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                self.fail_open(generation, e.into()).await;
                return;
            }
        };

        if let Err(e) = self.load_history(generation, &me, &session).await {
            self.fail_open(generation, e).await;
            return;
        }
        if !self.session.is_current(generation) {
            debug!("[Chat] 对话已被取代，停止打开流程 partner={}", partner_id);
            return;
        }

        if let Err(e) = self.mark_read(&me, &session).await {
            self.fail_open(generation, e).await;
            return;
        }

        // 列表渲染前必须已经看到新的已读状态
        self.unread.refresh().await;
        self.conversations.refresh().await;

        if self.session.mark_open(generation) {
            self.view.focus_input().await;
        }
    }

    /// 发送消息；内容为空或没有打开的对话时什么也不做
    pub async fn send(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            debug!("[Chat] 忽略空消息");
            return;
        }
        let Some((generation, session)) = self.session.open_snapshot() else {
            debug!("[Chat] 没有打开的对话，忽略发送");
            return;
        };
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                warn!("[Chat] {}，无法发送", e);
                return;
            }
        };

        let req = SendMessageRequest {
            sender_id: me.user_id,
            sender_type: me.user_type,
            receiver_id: session.partner_id,
            receiver_type: session.partner_type,
            course_id: session.course_id,
            content: content.to_string(),
        };

        match self.store.send_message(&req).await {
            Ok(resp) => match resp.into_result() {
                Ok(_) => {
                    info!("[Chat] ✅ 消息已发送给 {}", session.partner_name);
                    self.view.clear_input().await;
                    // 先刷新记录再刷新列表，列表的最后一条消息才能是刚发的这条
                    if let Err(e) = self.load_history(generation, &me, &session).await {
                        warn!("[Chat] 发送后刷新聊天记录失败: {:#}", e);
                    }
                    self.conversations.refresh().await;
                    self.view.notify(NoticeLevel::Success, "消息发送成功").await;
                }
                Err(e) => {
                    warn!("[Chat] 发送失败: {}", e);
                    self.view.notify(NoticeLevel::Error, &e.to_string()).await;
                }
            },
            Err(e) => {
                error!("[Chat] 发送请求失败: {:#}", e);
                self.view
                    .notify(NoticeLevel::Error, "发送失败，请检查网络连接")
                    .await;
            }
        }
    }

    /// 关闭当前对话
    pub async fn close(&self) {
        close_session(&self.session, self.view.as_ref()).await;
    }

    /// 静默刷新当前对话的记录（不显示加载中），失败只记录日志
    pub async fn reload_silently(&self) {
        let Some((generation, session)) = self.session.snapshot() else {
            return;
        };
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[Chat] {}，跳过静默刷新", e);
                return;
            }
        };
        if let Err(e) = self.load_history(generation, &me, &session).await {
            warn!("[Chat] 静默刷新聊天记录失败: {:#}", e);
        }
    }

    /// 拉取并渲染聊天记录；对话已关闭或被取代时丢弃结果
    async fn load_history(&self, generation: u64, me: &Identity, session: &ActiveSession) -> Result<()> {
        let resp = self
            .store
            .load_history(me, session.partner_id, session.partner_type, session.course_id)
            .await?;
        let messages = resp.into_result()?.unwrap_or_default();

        if !self.session.is_current(generation) {
            debug!(
                "[Chat] 丢弃过期的聊天记录 partner={} generation={}",
                session.partner_id, generation
            );
            return Ok(());
        }

        debug!(
            "[Chat] 渲染 {} 条消息 partner={}",
            messages.len(),
            session.partner_id
        );
        let bubbles = build_bubbles(&messages, me, local_now());
        self.view.render_messages(&bubbles).await;
        Ok(())
    }

    /// 把对方发给自己的消息全部标记为已读
    async fn mark_read(&self, me: &Identity, session: &ActiveSession) -> Result<()> {
        let req = MarkReadRequest {
            receiver_id: me.user_id,
            receiver_type: me.user_type,
            sender_id: session.partner_id,
            sender_type: session.partner_type,
        };
        self.store.mark_read(&req).await?.into_result()?;
        debug!("[Chat] 已读 partner={}({})", session.partner_id, session.partner_type);
        Ok(())
    }

    /// 打开失败：消息区显示错误，状态仍进入 Open 以便重新打开
    async fn fail_open(&self, generation: u64, err: anyhow::Error) {
        if !self.session.is_current(generation) {
            debug!("[Chat] 对话已被取代，忽略打开错误: {:#}", err);
            return;
        }
        error!(
            "[Chat] ❌ 打开对话失败 ({}): {:#}",
            MessagingError::classify(&err),
            err
        );
        let text = match err.downcast_ref::<MessagingError>() {
            Some(MessagingError::Application(msg)) => msg.clone(),
            Some(MessagingError::IdentityUnresolved) => "无法确定当前用户，请重新登录".to_string(),
            _ => "加载聊天记录失败，请稍后重试".to_string(),
        };
        self.view.render_message_error(&text).await;
        self.session.mark_open(generation);
    }
}
