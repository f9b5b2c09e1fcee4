//! 消息子系统错误分类
//!
//! 控制器的公开操作不会把错误返回给调用方，这里的分类只用于日志和界面提示。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    /// 无法确定当前用户身份，任何操作都无法继续
    #[error("无法确定当前用户身份")]
    IdentityUnresolved,

    /// 网络失败：请求被拒绝、超时、非 2xx 状态或响应无法解析
    #[error("网络请求失败: {0}")]
    Network(String),

    /// 服务器返回 success=false，原样携带服务器消息
    #[error("{0}")]
    Application(String),
}

impl MessagingError {
    /// 从 anyhow 错误中还原分类；无法识别的一律视为网络失败
    pub fn classify(err: &anyhow::Error) -> &'static str {
        match err.downcast_ref::<MessagingError>() {
            Some(MessagingError::IdentityUnresolved) => "identity",
            Some(MessagingError::Application(_)) => "application",
            _ => "network",
        }
    }
}
