//! 展示用的格式化工具

use crate::im::entities::{Conversation, Message};
use crate::im::types::{Identity, UserType};
use chrono::{Duration, NaiveDateTime};

/// 会话预览最多显示的字符数
pub const PREVIEW_MAX_CHARS: usize = 30;

/// 气泡靠左（对方）还是靠右（自己）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSide {
    Left,
    Right,
}

/// 渲染一条消息所需的全部内容
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBubble {
    pub side: BubbleSide,
    pub sender_name: String,
    pub content: String,
    pub time_label: String,
}

/// 渲染会话列表一项所需的内容
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationItem {
    pub partner_id: i64,
    pub partner_type: UserType,
    pub partner_name: String,
    pub preview: String,
    pub time_label: String,
    /// 未读角标，0 时为 None
    pub badge: Option<String>,
    pub unread_count: u64,
    /// 是否为当前打开的对话
    pub active: bool,
}

/// 消息时间，按距今的小时数分档：24 小时内只显示时分，7 天内显示月日和时分，更早只显示日期
pub fn format_message_time(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed < Duration::hours(24) {
        at.format("%H:%M").to_string()
    } else if elapsed < Duration::days(7) {
        at.format("%-m月%-d日 %H:%M").to_string()
    } else {
        at.format("%Y年%-m月%-d日").to_string()
    }
}

/// 会话预览：折叠空白并截断
pub fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "[暂无消息]".to_string();
    }
    if collapsed.chars().count() > PREVIEW_MAX_CHARS {
        let head: String = collapsed.chars().take(PREVIEW_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        collapsed
    }
}

/// 未读角标文本
pub fn badge_text(count: u64) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}

/// 按发送方决定气泡方向
pub fn bubble_side(message: &Message, me: &Identity) -> BubbleSide {
    if me.is(message.sender_id, message.sender_type) {
        BubbleSide::Right
    } else {
        BubbleSide::Left
    }
}

/// 按服务端顺序生成气泡，不做重排
pub fn build_bubbles(messages: &[Message], me: &Identity, now: NaiveDateTime) -> Vec<MessageBubble> {
    messages
        .iter()
        .map(|m| MessageBubble {
            side: bubble_side(m, me),
            sender_name: m.sender_name.clone(),
            content: m.content.clone(),
            time_label: format_message_time(m.sent_at, now),
        })
        .collect()
}

/// 生成会话列表项，`active` 为当前打开对话的伙伴
pub fn build_conversation_items(
    conversations: &[Conversation],
    active: Option<(i64, UserType)>,
    now: NaiveDateTime,
) -> Vec<ConversationItem> {
    conversations
        .iter()
        .map(|c| ConversationItem {
            partner_id: c.partner_id,
            partner_type: c.partner_type,
            partner_name: c.partner_name.clone(),
            preview: preview(&c.last_message),
            time_label: c
                .last_message_time
                .map(|t| format_message_time(t, now))
                .unwrap_or_default(),
            badge: badge_text(c.unread_count),
            unread_count: c.unread_count,
            active: active == Some((c.partner_id, c.partner_type)),
        })
        .collect()
}

/// 输入框按键：Enter 提交，Shift+Enter 换行
pub fn is_submit_key(key: &str, shift: bool) -> bool {
    key == "Enter" && !shift
}

/// 当前本地时间
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
