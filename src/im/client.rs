//! 消息客户端
//!
//! 把身份解析、会话列表、当前对话、未读数、定时刷新和联系人目录组装到一个页面上。

use crate::im::api::HttpConversationStore;
use crate::im::conversation::{ActiveConversation, ChatSession, ConversationList};
use crate::im::directory::ContactDirectory;
use crate::im::format::is_submit_key;
use crate::im::identity::{IdentityMode, IdentitySource, PageContext};
use crate::im::listener::MessagingView;
use crate::im::scheduler::{MessageRefresher, DEFAULT_POLL_INTERVAL};
use crate::im::store::ConversationStore;
use crate::im::unread::UnreadCounter;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 后端 API 基础地址
    pub api_base_url: String,
    /// 认证 token，通过请求头 `token` 发送
    pub token: Option<String>,
    /// 定时刷新周期
    pub poll_interval: Duration,
    /// 单个请求超时
    pub request_timeout: Duration,
    /// 身份解析方式
    pub identity_mode: IdentityMode,
    /// 是否丢弃过期的会话列表响应（默认关闭：后到的响应覆盖先到的）
    pub stale_response_guard: bool,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(10),
            identity_mode: IdentityMode::Session,
            stale_response_guard: false,
        }
    }
}

/// 页面级消息客户端
pub struct MessagingClient {
    config: ClientConfig,
    identity: IdentitySource,
    view: Arc<dyn MessagingView>,
    unread: Arc<UnreadCounter>,
    conversations: Arc<ConversationList>,
    active: Arc<ActiveConversation>,
    directory: ContactDirectory,
    refresher: MessageRefresher,
}

impl MessagingClient {
    /// 使用 HTTP 存储创建客户端
    pub fn new(config: ClientConfig, page: PageContext, view: Arc<dyn MessagingView>) -> Result<Self> {
        let store = HttpConversationStore::connect(
            &config.api_base_url,
            config.token.as_deref(),
            config.request_timeout,
        )?;
        Ok(Self::with_store(config, page, Arc::new(store), view))
    }

    /// 使用自定义存储创建客户端
    pub fn with_store(
        config: ClientConfig,
        page: PageContext,
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn MessagingView>,
    ) -> Self {
        let identity = IdentitySource::new(page, config.identity_mode);
        let session = Arc::new(ChatSession::new());
        let unread = Arc::new(UnreadCounter::new(
            store.clone(),
            view.clone(),
            identity.clone(),
        ));
        let conversations = Arc::new(ConversationList::new(
            store.clone(),
            view.clone(),
            identity.clone(),
            session.clone(),
            config.stale_response_guard,
        ));
        let active = Arc::new(ActiveConversation::new(
            store.clone(),
            view.clone(),
            identity.clone(),
            session,
            unread.clone(),
            conversations.clone(),
        ));
        let directory = ContactDirectory::new(store, view.clone(), identity.clone(), active.clone());
        let refresher = MessageRefresher::new(config.poll_interval, unread.clone(), active.clone());

        Self {
            config,
            identity,
            view,
            unread,
            conversations,
            active,
            directory,
            refresher,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 页面上下文句柄，宿主修改后下一次操作生效
    pub fn identity(&self) -> &IdentitySource {
        &self.identity
    }

    pub fn unread(&self) -> &Arc<UnreadCounter> {
        &self.unread
    }

    pub fn conversations(&self) -> &Arc<ConversationList> {
        &self.conversations
    }

    pub fn active(&self) -> &Arc<ActiveConversation> {
        &self.active
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    pub fn refresher(&self) -> &MessageRefresher {
        &self.refresher
    }

    /// 页面加载：显示空闲占位，刷新列表和未读数，启动定时刷新
    pub async fn on_page_load(&self) {
        match self.identity.resolve() {
            Ok(me) => info!(
                "[Client] 🚀 消息模块启动 user={}({}) {}",
                me.user_id, me.user_type, me.display_name
            ),
            Err(e) => info!("[Client] 🚀 消息模块启动，身份未确定: {}", e),
        }
        self.view.render_idle().await;
        self.conversations.refresh().await;
        self.unread.refresh().await;
        self.refresher.start_message_refresh();
    }

    /// 页面卸载：停止定时刷新
    pub async fn on_page_unload(&self) {
        self.refresher.stop_message_refresh();
        info!("[Client] 👋 消息模块已停止");
    }

    /// 输入框按键：Enter（不按 Shift）时发送，返回是否已提交
    pub async fn handle_input_key(&self, key: &str, shift: bool, text: &str) -> bool {
        if !is_submit_key(key, shift) {
            return false;
        }
        self.active.send(text).await;
        true
    }
}
