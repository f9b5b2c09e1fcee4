use crate::im::error::MessagingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "TEACHER", alias = "teacher")]
    Teacher,
    #[serde(rename = "STUDENT", alias = "student")]
    Student,
}

impl UserType {
    /// 接口使用的字符串取值
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Teacher => "TEACHER",
            UserType::Student => "STUDENT",
        }
    }
}

impl UserType {
    /// 界面上显示的角色名
    pub fn label(&self) -> &'static str {
        match self {
            UserType::Teacher => "教师",
            UserType::Student => "学生",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 当前操作者身份，每次操作时重新解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: i64,
    pub user_type: UserType,
    #[serde(default)]
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: i64, user_type: UserType, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_type,
            display_name: display_name.into(),
        }
    }

    /// 判断某个 (id, 角色) 是否就是自己
    pub fn is(&self, user_id: i64, user_type: UserType) -> bool {
        self.user_id == user_id && self.user_type == user_type
    }
}

/// 统一的 API 响应包装结构体（包含 success、message、data）
/// data 字段可能为 null 或缺失，因此使用 Option<T>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// 先检查 success，再取 data；失败时原样携带服务器消息
    pub fn into_result(self) -> Result<Option<T>, MessagingError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(MessagingError::Application(
                self.message.unwrap_or_else(|| "操作失败".to_string()),
            ))
        }
    }
}

/// 通用 HTTP 响应处理函数：检查状态码后反序列化为统一的响应结构体
///
/// 非 2xx 和无法解析的 body 都归为网络失败；success=false 原样返回给调用方判断
pub async fn handle_http_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<ApiResponse<T>> {
    let status = response.status();
    // 读取 body bytes（只能读取一次）
    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| MessagingError::Network(format!("读取{}响应失败: {}", operation_name, e)))?;
    decode_envelope(status, &body_bytes, operation_name)
}

/// 从状态码和原始 body 解析响应包装，便于脱离网络单独测试
pub fn decode_envelope<T: serde::de::DeserializeOwned>(
    status: reqwest::StatusCode,
    body: &[u8],
    operation_name: &str,
) -> anyhow::Result<ApiResponse<T>> {
    let body_str = String::from_utf8_lossy(body);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(MessagingError::Network(format!("HTTP 错误 {}: {}", status, body_str)).into());
    }

    let api_resp: ApiResponse<T> = serde_json::from_slice(body).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        MessagingError::Network(format!("反序列化响应失败: {}", e))
    })?;

    if !api_resp.success {
        debug!(
            "[HTTP] {}服务器返回失败: {}",
            operation_name,
            api_resp.message.as_deref().unwrap_or("")
        );
    }
    Ok(api_resp)
}
