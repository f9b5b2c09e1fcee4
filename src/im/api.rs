//! 消息 HTTP API 客户端
//!
//! 负责所有私信相关的 HTTP 请求

use crate::im::entities::{
    Contact, Conversation, Course, MarkReadRequest, Message, SendMessageRequest,
};
use crate::im::error::MessagingError;
use crate::im::store::ConversationStore;
use crate::im::types::{handle_http_response, ApiResponse, Identity, UserType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 基于 HTTP 的会话存储
pub struct HttpConversationStore {
    client: reqwest::Client,
    api_base_url: String,
}

impl HttpConversationStore {
    /// 使用外部配置好的 HTTP 客户端
    pub fn new(client: reqwest::Client, api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_base_url,
        }
    }

    /// 构建客户端：设置超时，token 通过 default_headers 自动添加
    pub fn connect(api_base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                reqwest::header::HeaderName::from_static("token"),
                reqwest::header::HeaderValue::from_str(token).context("无效的 token")?,
            );
        }
        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self::new(client, api_base_url))
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/messages{}", self.api_base_url, path)
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation_name: &str,
    ) -> Result<ApiResponse<T>> {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[HTTP] 📡 {} operationID={}", operation_name, operation_id);
        let response = request
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| MessagingError::Network(format!("{}请求失败: {}", operation_name, e)))?;
        handle_http_response(response, operation_name).await
    }
}

/// 两人对话接口使用的查询参数
fn pair_query(
    me: &Identity,
    partner_id: i64,
    partner_type: UserType,
) -> Vec<(&'static str, String)> {
    vec![
        ("userId1", me.user_id.to_string()),
        ("userType1", me.user_type.as_str().to_string()),
        ("userId2", partner_id.to_string()),
        ("userType2", partner_type.as_str().to_string()),
    ]
}

fn self_query(me: &Identity) -> [(&'static str, String); 2] {
    [
        ("userId", me.user_id.to_string()),
        ("userType", me.user_type.as_str().to_string()),
    ]
}

#[async_trait]
impl ConversationStore for HttpConversationStore {
    async fn list_conversations(&self, me: &Identity) -> Result<ApiResponse<Vec<Conversation>>> {
        let req = self.client.get(self.url("/conversations")).query(&self_query(me));
        let resp = self.execute::<Vec<Conversation>>(req, "会话列表").await?;
        if let Some(list) = resp.data.as_ref() {
            info!("[ConvAPI] ✅ 会话列表响应，会话数: {}", list.len());
        }
        Ok(resp)
    }

    async fn load_history(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
        course_id: Option<i64>,
    ) -> Result<ApiResponse<Vec<Message>>> {
        let mut query = pair_query(me, partner_id, partner_type);
        if let Some(course_id) = course_id {
            query.push(("courseId", course_id.to_string()));
        }
        let req = self.client.get(self.url("/conversation")).query(&query);
        self.execute(req, "聊天记录").await
    }

    async fn send_message(&self, req: &SendMessageRequest) -> Result<ApiResponse<Message>> {
        info!(
            "[ConvAPI] 📤 发送消息 {}({}) -> {}({})",
            req.sender_id, req.sender_type, req.receiver_id, req.receiver_type
        );
        let builder = self.client.post(self.url("/send")).json(req);
        self.execute(builder, "发送消息").await
    }

    async fn mark_read(&self, req: &MarkReadRequest) -> Result<ApiResponse<String>> {
        let builder = self.client.post(self.url("/mark-read")).json(req);
        self.execute(builder, "标记已读").await
    }

    async fn unread_count(&self, me: &Identity) -> Result<ApiResponse<u64>> {
        let req = self.client.get(self.url("/unread-count")).query(&self_query(me));
        self.execute(req, "未读数").await
    }

    async fn delete_conversation(
        &self,
        me: &Identity,
        partner_id: i64,
        partner_type: UserType,
    ) -> Result<ApiResponse<String>> {
        let req = self
            .client
            .delete(self.url("/conversation"))
            .query(&pair_query(me, partner_id, partner_type));
        self.execute(req, "删除对话").await
    }

    async fn list_courses(&self, me: &Identity) -> Result<ApiResponse<Vec<Course>>> {
        let req = self.client.get(self.url("/user-courses")).query(&self_query(me));
        self.execute(req, "课程列表").await
    }

    async fn list_course_members(
        &self,
        course_id: i64,
        me: &Identity,
    ) -> Result<ApiResponse<Vec<Contact>>> {
        let req = self
            .client
            .get(self.url(&format!("/course/{}/users", course_id)))
            .query(&self_query(me));
        self.execute(req, "课程联系人").await
    }
}
