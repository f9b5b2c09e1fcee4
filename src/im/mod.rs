pub mod api;
pub mod client;
pub mod conversation;
pub mod directory;
pub mod entities;
pub mod error;
pub mod format;
pub mod identity;
pub mod listener;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod unread;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出常用类型
pub use client::{ClientConfig, MessagingClient};
pub use error::MessagingError;
pub use identity::{CurrentUser, IdentityMode, IdentitySource, PageContext};
pub use listener::{EmptyMessagingView, MessagingView, NoticeLevel};
pub use store::ConversationStore;
pub use types::{ApiResponse, Identity, UserType};
