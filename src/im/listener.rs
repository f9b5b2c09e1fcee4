//! 界面回调接口
//!
//! 控制器产生的所有界面效果都通过这里输出，宿主负责真正的渲染

use crate::im::entities::{Contact, Course};
use crate::im::format::{ConversationItem, MessageBubble};
use async_trait::async_trait;

/// 临时提示的级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// 消息界面回调接口
#[async_trait]
pub trait MessagingView: Send + Sync {
    /// 渲染会话列表
    async fn render_conversations(&self, items: &[ConversationItem]);

    /// 会话列表为空（或获取失败）
    async fn render_conversations_empty(&self);

    /// 聊天窗口标题，形如 `姓名 (学生)`
    async fn render_chat_header(&self, title: &str);

    /// 消息区加载中
    async fn render_message_loading(&self);

    /// 消息区渲染聊天记录（可能为空）
    async fn render_messages(&self, bubbles: &[MessageBubble]);

    /// 消息区内联错误
    async fn render_message_error(&self, message: &str);

    /// 未打开任何对话时的占位（"请选择一个对话"）
    async fn render_idle(&self);

    /// 未读角标
    async fn render_unread_badge(&self, count: u64);

    /// 临时提示
    async fn notify(&self, level: NoticeLevel, message: &str);

    /// 交互确认，返回用户是否同意
    async fn confirm(&self, prompt: &str) -> bool;

    /// 清空输入框
    async fn clear_input(&self);

    /// 输入框获取焦点
    async fn focus_input(&self);

    /// 课程选择器
    async fn render_courses(&self, courses: &[Course]);

    /// 课程联系人
    async fn render_contacts(&self, course_id: i64, contacts: &[Contact]);

    /// 已选课程但没有可聊天的联系人
    async fn render_contacts_empty(&self, course_id: i64);

    /// 尚未选择课程
    async fn render_no_course_selected(&self);

    /// 切换到会话列表区域
    async fn show_conversation_section(&self);
}

/// 空实现（默认界面）
pub struct EmptyMessagingView;

#[async_trait]
impl MessagingView for EmptyMessagingView {
    async fn render_conversations(&self, _items: &[ConversationItem]) {}
    async fn render_conversations_empty(&self) {}
    async fn render_chat_header(&self, _title: &str) {}
    async fn render_message_loading(&self) {}
    async fn render_messages(&self, _bubbles: &[MessageBubble]) {}
    async fn render_message_error(&self, _message: &str) {}
    async fn render_idle(&self) {}
    async fn render_unread_badge(&self, _count: u64) {}
    async fn notify(&self, _level: NoticeLevel, _message: &str) {}
    // 没有界面可以确认，破坏性操作一律视为取消
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }
    async fn clear_input(&self) {}
    async fn focus_input(&self) {}
    async fn render_courses(&self, _courses: &[Course]) {}
    async fn render_contacts(&self, _course_id: i64, _contacts: &[Contact]) {}
    async fn render_contacts_empty(&self, _course_id: i64) {}
    async fn render_no_course_selected(&self) {}
    async fn show_conversation_section(&self) {}
}
