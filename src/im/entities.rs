//! 消息接口实体定义
//!
//! 字段名与后端 JSON 保持一致（camelCase），缺失的可选字段使用默认值

use crate::im::types::UserType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 会话列表条目（每个对话伙伴一条）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// 对话伙伴的用户 ID
    pub partner_id: i64,
    pub partner_type: UserType,
    #[serde(default)]
    pub partner_name: String,
    /// 最后一条消息内容
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_time: Option<NaiveDateTime>,
    /// 对方发给自己且未读的消息数
    #[serde(default)]
    pub unread_count: u64,
    /// 最后一条消息关联的课程
    #[serde(default)]
    pub course_id: Option<i64>,
}

/// 单条私信
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    pub sender_id: i64,
    pub sender_type: UserType,
    #[serde(default)]
    pub sender_name: String,
    pub receiver_id: i64,
    pub receiver_type: UserType,
    #[serde(default)]
    pub receiver_name: String,
    #[serde(default)]
    pub course_id: Option<i64>,
    pub content: String,
    /// 消息类型：text / image / file
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub is_read: bool,
    pub sent_at: NaiveDateTime,
    #[serde(default)]
    pub read_at: Option<NaiveDateTime>,
}

fn default_message_type() -> String {
    "text".to_string()
}

/// 可发起私信的课程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    /// 学生视角下返回授课教师姓名
    #[serde(default)]
    pub teacher_name: Option<String>,
}

/// 课程内可聊天的联系人（不含自己）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// 用户 ID（不是学生/教师档案 ID）
    pub id: i64,
    pub user_type: UserType,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

impl Contact {
    /// 选择器里显示的副标题：学生显示班级学号，教师显示职称院系
    pub fn subtitle(&self) -> String {
        let parts: Vec<&str> = match self.user_type {
            UserType::Student => [self.class_name.as_deref(), self.student_id.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
            UserType::Teacher => [self.title.as_deref(), self.department.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
        };
        parts.join(" · ")
    }
}

/// 发送消息请求
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: i64,
    pub sender_type: UserType,
    pub receiver_id: i64,
    pub receiver_type: UserType,
    pub course_id: Option<i64>,
    pub content: String,
}

/// 标记已读请求：把 sender 发给 receiver 的消息全部置为已读
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub receiver_id: i64,
    pub receiver_type: UserType,
    pub sender_id: i64,
    pub sender_type: UserType,
}
