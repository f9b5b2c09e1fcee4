//! 智慧教育消息 CLI（演示版）
//!
//! 非交互式 CLI，模拟一个教师/学生页面：加载会话列表和未读数，
//! 可选地打开一个对话并发送一条消息，然后保持定时刷新直到退出。

use anyhow::Result;
use clap::{Parser, ValueEnum};
use smartedu_messaging::im::entities::{Contact, Course};
use smartedu_messaging::im::format::{ConversationItem, MessageBubble};
use smartedu_messaging::{
    ClientConfig, Identity, IdentityMode, MessagingClient, MessagingView, NoticeLevel,
    PageContext, UserType,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Role {
    Teacher,
    Student,
}

impl From<Role> for UserType {
    fn from(role: Role) -> Self {
        match role {
            Role::Teacher => UserType::Teacher,
            Role::Student => UserType::Student,
        }
    }
}

/// 智慧教育消息 CLI
#[derive(Parser, Debug)]
#[command(name = "edu-msg-cli")]
#[command(about = "智慧教育消息 CLI - 用于测试和展示站内消息功能", long_about = None)]
struct Args {
    /// 后端地址
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// 认证 token
    #[arg(long)]
    token: Option<String>,

    /// 页面标题
    #[arg(long, default_value = "智慧教育 - 教师端")]
    page_title: String,

    /// 页面路径
    #[arg(long, default_value = "/teacher/index.html")]
    path: String,

    /// 使用页面推断的演示身份，而不是会话身份
    #[arg(long)]
    demo_identity: bool,

    /// 会话身份：用户 ID
    #[arg(long)]
    user_id: Option<i64>,

    /// 会话身份：用户类型
    #[arg(long, value_enum, default_value = "teacher")]
    user_type: Role,

    /// 会话身份：显示名
    #[arg(long, default_value = "")]
    user_name: String,

    /// 要打开的对话对象 ID
    #[arg(long)]
    partner_id: Option<i64>,

    /// 对话对象类型
    #[arg(long, value_enum, default_value = "student")]
    partner_type: Role,

    /// 对话对象显示名
    #[arg(long, default_value = "")]
    partner_name: String,

    /// 课程 ID（限定聊天记录和新消息的课程）
    #[arg(long)]
    course_id: Option<i64>,

    /// 打开对话后发送的消息
    #[arg(short, long)]
    message: Option<String>,

    /// 自动确认删除等操作
    #[arg(short, long)]
    yes: bool,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别
    #[arg(long, default_value = "info,smartedu_messaging=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG 优先
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
    Ok(())
}

/// 把所有界面效果打印成日志
struct ConsoleView {
    auto_confirm: bool,
}

#[async_trait::async_trait]
impl MessagingView for ConsoleView {
    async fn render_conversations(&self, items: &[ConversationItem]) {
        info!("[CLI/List] 📋 会话列表（共 {} 个）:", items.len());
        for item in items {
            info!(
                "[CLI/List]   {} {} | {} | {}{}",
                if item.active { "▶" } else { " " },
                item.partner_name,
                item.time_label,
                item.preview,
                item.badge
                    .as_deref()
                    .map(|b| format!(" ({})", b))
                    .unwrap_or_default()
            );
        }
    }

    async fn render_conversations_empty(&self) {
        info!("[CLI/List] 📭 暂无对话");
    }

    async fn render_chat_header(&self, title: &str) {
        info!("[CLI/Chat] 💬 {}", title);
    }

    async fn render_message_loading(&self) {
        info!("[CLI/Chat] ⏳ 加载中...");
    }

    async fn render_messages(&self, bubbles: &[MessageBubble]) {
        for bubble in bubbles {
            info!(
                "[CLI/Chat]   [{:?}] {} {}: {}",
                bubble.side, bubble.time_label, bubble.sender_name, bubble.content
            );
        }
    }

    async fn render_message_error(&self, message: &str) {
        error!("[CLI/Chat] ❌ {}", message);
    }

    async fn render_idle(&self) {
        info!("[CLI/Chat] 选择一个对话开始聊天");
    }

    async fn render_unread_badge(&self, count: u64) {
        info!("[CLI] 📬 未读数: {}", count);
    }

    async fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => error!("[CLI/Notice] {}", message),
            _ => info!("[CLI/Notice] {}", message),
        }
    }

    async fn confirm(&self, prompt: &str) -> bool {
        info!("[CLI] ❓ {} -> {}", prompt, self.auto_confirm);
        self.auto_confirm
    }

    async fn clear_input(&self) {}

    async fn focus_input(&self) {}

    async fn render_courses(&self, courses: &[Course]) {
        for course in courses {
            info!("[CLI/Course] 📚 {} {}", course.id, course.name);
        }
    }

    async fn render_contacts(&self, course_id: i64, contacts: &[Contact]) {
        for contact in contacts {
            info!(
                "[CLI/Course] {} 👤 {}({}) {}",
                course_id,
                contact.name,
                contact.id,
                contact.subtitle()
            );
        }
    }

    async fn render_contacts_empty(&self, course_id: i64) {
        info!("[CLI/Course] 课程 {} 暂无联系人", course_id);
    }

    async fn render_no_course_selected(&self) {
        info!("[CLI/Course] 请先选择课程");
    }

    async fn show_conversation_section(&self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    info!("[CLI] 🚀 智慧教育消息 CLI（演示模式）");
    info!("[CLI] 🌐 后端: {}", args.base_url);

    let mut config = ClientConfig::new(args.base_url.clone());
    config.token = args.token.clone();
    if args.demo_identity {
        config.identity_mode = IdentityMode::Demo;
    }

    let mut page = PageContext::new(args.page_title.clone(), args.path.clone());
    if let Some(user_id) = args.user_id {
        page.session = Some(Identity::new(user_id, args.user_type.into(), args.user_name.clone()));
    }

    let view = Arc::new(ConsoleView {
        auto_confirm: args.yes,
    });
    let client = MessagingClient::new(config, page, view)?;

    client.on_page_load().await;
    client.directory().list_courses().await;

    if let Some(partner_id) = args.partner_id {
        let name = if args.partner_name.is_empty() {
            partner_id.to_string()
        } else {
            args.partner_name.clone()
        };
        client
            .active()
            .open(partner_id, args.partner_type.into(), &name, args.course_id)
            .await;
        if let Some(message) = &args.message {
            client.active().send(message).await;
        }
    } else if args.message.is_some() {
        warn!("[CLI] 未指定 --partner-id，忽略 --message");
    }

    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        tokio::select! {
            _ = sleep(Duration::from_secs(args.duration)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await?;
    }

    client.on_page_unload().await;
    info!("[CLI] 👋 程序退出");
    Ok(())
}
