//! 测试辅助：内存会话存储和记录界面效果的视图

use crate::im::client::{ClientConfig, MessagingClient};
use crate::im::entities::{
    Contact, Conversation, Course, MarkReadRequest, Message, SendMessageRequest,
};
use crate::im::error::MessagingError;
use crate::im::format::{ConversationItem, MessageBubble};
use crate::im::identity::{IdentityMode, IdentitySource, PageContext};
use crate::im::listener::{MessagingView, NoticeLevel};
use crate::im::store::ConversationStore;
use crate::im::types::{ApiResponse, Identity, UserType};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use tokio::sync::Notify;

static INIT_LOGGER: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        // 只打开当前 crate 的 debug，关闭底层 HTTP 客户端的噪音
        let filter_layer =
            EnvFilter::new("info,smartedu_messaging=debug,hyper_util::client=info,reqwest=info");

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// 演示模式下的教师页面（身份固定为 4/TEACHER）
pub(crate) fn demo_teacher_source() -> IdentitySource {
    IdentitySource::new(teacher_page(), IdentityMode::Demo)
}

fn teacher_page() -> PageContext {
    PageContext::new("智慧教育 - 教师端", "/teacher/index.html")
}

/// 组装好的教师页面客户端
pub(crate) fn teacher_client(store: Arc<MemoryStore>) -> (MessagingClient, Arc<RecordingView>) {
    init_test_logger();
    let view = Arc::new(RecordingView::new());
    let mut config = ClientConfig::new("http://localhost:8080");
    config.identity_mode = IdentityMode::Demo;
    let client = MessagingClient::with_store(config, teacher_page(), store, view.clone());
    (client, view)
}

/// 一次聊天记录请求的参数
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistoryRequest {
    pub me: Identity,
    pub partner_id: i64,
    pub partner_type: UserType,
    pub course_id: Option<i64>,
}

#[derive(Default)]
struct StoreState {
    messages: Vec<Message>,
    next_id: i64,
    calls: Vec<String>,
    history_requests: Vec<HistoryRequest>,
    mark_reads: Vec<MarkReadRequest>,
    sent: Vec<SendMessageRequest>,
    offline: bool,
    failures: HashMap<String, String>,
    courses: HashMap<(i64, UserType), Vec<Course>>,
    members: HashMap<i64, Vec<Contact>>,
}

/// 内存版会话存储，语义与后端一致：列表按最后消息时间倒序，记录按时间升序
pub(crate) struct MemoryStore {
    state: Mutex<StoreState>,
    history_gate: Mutex<Option<Arc<Notify>>>,
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid base time")
}

fn between(m: &Message, a: (i64, UserType), b: (i64, UserType)) -> bool {
    let sender = (m.sender_id, m.sender_type);
    let receiver = (m.receiver_id, m.receiver_type);
    (sender == a && receiver == b) || (sender == b && receiver == a)
}

impl StoreState {
    fn push(
        &mut self,
        sender: (i64, UserType),
        receiver: (i64, UserType),
        content: &str,
        course_id: Option<i64>,
    ) {
        self.next_id += 1;
        self.messages.push(Message {
            id: Some(self.next_id),
            sender_id: sender.0,
            sender_type: sender.1,
            sender_name: format!("user{}", sender.0),
            receiver_id: receiver.0,
            receiver_type: receiver.1,
            receiver_name: format!("user{}", receiver.0),
            course_id,
            content: content.to_string(),
            message_type: "text".to_string(),
            is_read: false,
            sent_at: base_time() + Duration::minutes(self.next_id),
            read_at: None,
        });
    }

    fn conversations(&self, me: (i64, UserType)) -> Vec<Conversation> {
        let mut latest: Vec<&Message> = Vec::new();
        for m in self.messages.iter().rev() {
            let partner = if (m.sender_id, m.sender_type) == me {
                (m.receiver_id, m.receiver_type)
            } else if (m.receiver_id, m.receiver_type) == me {
                (m.sender_id, m.sender_type)
            } else {
                continue;
            };
            if !latest.iter().any(|l| between(l, me, partner)) {
                latest.push(m);
            }
        }
        latest
            .into_iter()
            .map(|m| {
                let outgoing = (m.sender_id, m.sender_type) == me;
                let (partner_id, partner_type, partner_name) = if outgoing {
                    (m.receiver_id, m.receiver_type, m.receiver_name.clone())
                } else {
                    (m.sender_id, m.sender_type, m.sender_name.clone())
                };
                let unread_count = self
                    .messages
                    .iter()
                    .filter(|x| {
                        (x.sender_id, x.sender_type) == (partner_id, partner_type)
                            && (x.receiver_id, x.receiver_type) == me
                            && !x.is_read
                    })
                    .count() as u64;
                Conversation {
                    partner_id,
                    partner_type,
                    partner_name,
                    last_message: m.content.clone(),
                    last_message_time: Some(m.sent_at),
                    unread_count,
                    course_id: m.course_id,
                }
            })
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            history_gate: Mutex::new(None),
        }
    }

    pub fn seed_message(
        &self,
        sender_id: i64,
        sender_type: UserType,
        receiver_id: i64,
        receiver_type: UserType,
        content: &str,
    ) {
        self.seed_course_message(sender_id, sender_type, receiver_id, receiver_type, content, None);
    }

    pub fn seed_course_message(
        &self,
        sender_id: i64,
        sender_type: UserType,
        receiver_id: i64,
        receiver_type: UserType,
        content: &str,
        course_id: Option<i64>,
    ) {
        self.state.lock().push(
            (sender_id, sender_type),
            (receiver_id, receiver_type),
            content,
            course_id,
        );
    }

    pub fn seed_courses(&self, user_id: i64, user_type: UserType, courses: Vec<Course>) {
        self.state.lock().courses.insert((user_id, user_type), courses);
    }

    pub fn seed_members(&self, course_id: i64, members: Vec<Contact>) {
        self.state.lock().members.insert(course_id, members);
    }

    /// 之后所有请求都以网络失败结束
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// 指定操作返回 success=false 和给定消息
    pub fn fail_with(&self, op: &str, message: &str) {
        self.state
            .lock()
            .failures
            .insert(op.to_string(), message.to_string());
    }

    /// 之后的聊天记录请求会等待通知才返回
    pub fn gate_history(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.history_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn history_requests(&self) -> Vec<HistoryRequest> {
        self.state.lock().history_requests.clone()
    }

    pub fn mark_read_requests(&self) -> Vec<MarkReadRequest> {
        self.state.lock().mark_reads.clone()
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.state.lock().sent.clone()
    }

    /// 会话列表中伙伴的顺序（不计入调用记录）
    pub fn conversation_order(&self, user_id: i64, user_type: UserType) -> Vec<i64> {
        self.state
            .lock()
            .conversations((user_id, user_type))
            .iter()
            .map(|c| c.partner_id)
            .collect()
    }

    /// 记录调用；离线时返回网络错误，配置了失败时返回服务器消息
    fn begin(&self, op: &str) -> Result<Option<String>> {
        let mut state = self.state.lock();
        state.calls.push(op.to_string());
        if state.offline {
            return Err(MessagingError::Network("connection refused".to_string()).into());
        }
        Ok(state.failures.get(op).cloned())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list_conversations(&self, me: &Identity) -> Result<ApiResponse<Vec<Conversation>>> {
        if let Some(msg) = self.begin("list_conversations")? {
            return Ok(ApiResponse::fail(msg));
        }
        let list = self.state.lock().conversations((me.user_id, me.user_type));
        Ok(ApiResponse::ok(list))
    }

    async fn load_history(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
        course_id: Option<i64>,
    ) -> Result<ApiResponse<Vec<Message>>> {
        self.state.lock().history_requests.push(HistoryRequest {
            me: me.clone(),
            partner_id,
            partner_type,
            course_id,
        });
        let failure = self.begin("load_history")?;
        let gate = self.history_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(msg) = failure {
            return Ok(ApiResponse::fail(msg));
        }
        let state = self.state.lock();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| between(m, (me.user_id, me.user_type), (partner_id, partner_type)))
            .filter(|m| course_id.is_none() || m.course_id == course_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        Ok(ApiResponse::ok(messages))
    }

    async fn send_message(&self, req: &SendMessageRequest) -> Result<ApiResponse<Message>> {
        if let Some(msg) = self.begin("send_message")? {
            return Ok(ApiResponse::fail(msg));
        }
        let mut state = self.state.lock();
        state.sent.push(req.clone());
        state.push(
            (req.sender_id, req.sender_type),
            (req.receiver_id, req.receiver_type),
            &req.content,
            req.course_id,
        );
        let message = state.messages.last().cloned().expect("message just pushed");
        Ok(ApiResponse::ok(message))
    }

    async fn mark_read(&self, req: &MarkReadRequest) -> Result<ApiResponse<String>> {
        if let Some(msg) = self.begin("mark_read")? {
            return Ok(ApiResponse::fail(msg));
        }
        let mut state = self.state.lock();
        state.mark_reads.push(req.clone());
        for m in state.messages.iter_mut() {
            if (m.sender_id, m.sender_type) == (req.sender_id, req.sender_type)
                && (m.receiver_id, m.receiver_type) == (req.receiver_id, req.receiver_type)
            {
                m.is_read = true;
            }
        }
        Ok(ApiResponse::ok("对话已标记为已读".to_string()))
    }

    async fn unread_count(&self, me: &Identity) -> Result<ApiResponse<u64>> {
        if let Some(msg) = self.begin("unread_count")? {
            return Ok(ApiResponse::fail(msg));
        }
        let count = self
            .state
            .lock()
            .messages
            .iter()
            .filter(|m| me.is(m.receiver_id, m.receiver_type) && !m.is_read)
            .count() as u64;
        Ok(ApiResponse::ok(count))
    }

    async fn delete_conversation(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
    ) -> Result<ApiResponse<String>> {
        if let Some(msg) = self.begin("delete_conversation")? {
            return Ok(ApiResponse::fail(msg));
        }
        self.state
            .lock()
            .messages
            .retain(|m| !between(m, (me.user_id, me.user_type), (partner_id, partner_type)));
        Ok(ApiResponse::ok("对话已删除".to_string()))
    }

    async fn list_courses(&self, me: &Identity) -> Result<ApiResponse<Vec<Course>>> {
        if let Some(msg) = self.begin("list_courses")? {
            return Ok(ApiResponse::fail(msg));
        }
        let courses = self
            .state
            .lock()
            .courses
            .get(&(me.user_id, me.user_type))
            .cloned()
            .unwrap_or_default();
        Ok(ApiResponse::ok(courses))
    }

    async fn list_course_members(
        &self,
        course_id: i64,
        _me: &Identity,
    ) -> Result<ApiResponse<Vec<Contact>>> {
        if let Some(msg) = self.begin("list_course_members")? {
            return Ok(ApiResponse::fail(msg));
        }
        let members = self
            .state
            .lock()
            .members
            .get(&course_id)
            .cloned()
            .unwrap_or_default();
        Ok(ApiResponse::ok(members))
    }
}

/// 记录下来的界面效果
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ViewEvent {
    Conversations(Vec<ConversationItem>),
    ConversationsEmpty,
    Header(String),
    Loading,
    Messages(Vec<MessageBubble>),
    MessageError(String),
    Idle,
    Badge(u64),
    Notice(NoticeLevel, String),
    ClearInput,
    FocusInput,
    Courses(Vec<Course>),
    Contacts(i64, Vec<Contact>),
    ContactsEmpty(i64),
    NoCourseSelected,
    ShowConversations,
}

/// 记录所有界面效果的视图，带一个模拟输入框
pub(crate) struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
    input: Mutex<String>,
    confirm: AtomicBool,
}

impl RecordingView {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            input: Mutex::new(String::new()),
            confirm: AtomicBool::new(true),
        }
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn set_confirm(&self, answer: bool) {
        self.confirm.store(answer, Ordering::Relaxed);
    }

    pub fn set_input(&self, text: &str) {
        *self.input.lock() = text.to_string();
    }

    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    pub fn last_badge(&self) -> Option<u64> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Badge(n) => Some(*n),
            _ => None,
        })
    }

    pub fn last_conversations(&self) -> Option<Vec<ConversationItem>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Conversations(items) => Some(items.clone()),
            _ => None,
        })
    }

    pub fn last_messages(&self) -> Option<Vec<MessageBubble>> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ViewEvent::Messages(bubbles) => Some(bubbles.clone()),
            _ => None,
        })
    }

    fn record(&self, event: ViewEvent) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl MessagingView for RecordingView {
    async fn render_conversations(&self, items: &[ConversationItem]) {
        self.record(ViewEvent::Conversations(items.to_vec()));
    }
    async fn render_conversations_empty(&self) {
        self.record(ViewEvent::ConversationsEmpty);
    }
    async fn render_chat_header(&self, title: &str) {
        self.record(ViewEvent::Header(title.to_string()));
    }
    async fn render_message_loading(&self) {
        self.record(ViewEvent::Loading);
    }
    async fn render_messages(&self, bubbles: &[MessageBubble]) {
        self.record(ViewEvent::Messages(bubbles.to_vec()));
    }
    async fn render_message_error(&self, message: &str) {
        self.record(ViewEvent::MessageError(message.to_string()));
    }
    async fn render_idle(&self) {
        self.record(ViewEvent::Idle);
    }
    async fn render_unread_badge(&self, count: u64) {
        self.record(ViewEvent::Badge(count));
    }
    async fn notify(&self, level: NoticeLevel, message: &str) {
        self.record(ViewEvent::Notice(level, message.to_string()));
    }
    async fn confirm(&self, _prompt: &str) -> bool {
        self.confirm.load(Ordering::Relaxed)
    }
    async fn clear_input(&self) {
        self.input.lock().clear();
        self.record(ViewEvent::ClearInput);
    }
    async fn focus_input(&self) {
        self.record(ViewEvent::FocusInput);
    }
    async fn render_courses(&self, courses: &[Course]) {
        self.record(ViewEvent::Courses(courses.to_vec()));
    }
    async fn render_contacts(&self, course_id: i64, contacts: &[Contact]) {
        self.record(ViewEvent::Contacts(course_id, contacts.to_vec()));
    }
    async fn render_contacts_empty(&self, course_id: i64) {
        self.record(ViewEvent::ContactsEmpty(course_id));
    }
    async fn render_no_course_selected(&self) {
        self.record(ViewEvent::NoCourseSelected);
    }
    async fn show_conversation_section(&self) {
        self.record(ViewEvent::ShowConversations);
    }
}
