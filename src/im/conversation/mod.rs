//! 会话模块
//!
//! 会话列表、当前对话及其状态机

pub mod active;
pub mod list;
pub mod session;

// 重新导出主要类型
pub use active::ActiveConversation;
pub use list::{ConversationList, RefreshFence};
pub use session::{ActiveSession, ChatPhase, ChatSession};
