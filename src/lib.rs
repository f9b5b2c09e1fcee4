pub mod im;

pub use im::{
    ApiResponse, ClientConfig, ConversationStore, CurrentUser, EmptyMessagingView, Identity,
    IdentityMode, IdentitySource, MessagingClient, MessagingError, MessagingView, NoticeLevel,
    PageContext, UserType,
};
