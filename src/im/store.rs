//! 远端会话存储接口
//!
//! `Err` 表示网络失败；`Ok` 时调用方必须先判断 `success` 再使用 `data`。

use crate::im::entities::{
    Contact, Conversation, Course, MarkReadRequest, Message, SendMessageRequest,
};
use crate::im::types::{ApiResponse, Identity, UserType};
use anyhow::Result;
use async_trait::async_trait;

/// 会话存储（远端服务）
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// 获取当前用户的会话列表，顺序由服务端决定
    async fn list_conversations(&self, me: &Identity) -> Result<ApiResponse<Vec<Conversation>>>;

    /// 获取两人之间的全部消息，按发送时间升序；`course_id` 存在时由服务端按课程过滤
    async fn load_history(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
        course_id: Option<i64>,
    ) -> Result<ApiResponse<Vec<Message>>>;

    /// 发送消息
    async fn send_message(&self, req: &SendMessageRequest) -> Result<ApiResponse<Message>>;

    /// 标记对话已读（幂等）
    async fn mark_read(&self, req: &MarkReadRequest) -> Result<ApiResponse<String>>;

    /// 获取未读消息总数
    async fn unread_count(&self, me: &Identity) -> Result<ApiResponse<u64>>;

    /// 删除与某人的整个对话（不可恢复）
    async fn delete_conversation(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
    ) -> Result<ApiResponse<String>>;

    /// 获取当前用户任教或选修的课程
    async fn list_courses(&self, me: &Identity) -> Result<ApiResponse<Vec<Course>>>;

    /// 获取课程内可以私信的用户（不含自己）
    async fn list_course_members(
        &self,
        course_id: i64,
        me: &Identity,
    ) -> Result<ApiResponse<Vec<Contact>>>;
}
