//! 身份解析
//!
//! 根据宿主页面上下文确定当前操作者。每个组件在每次操作时重新解析，
//! 不做缓存，宿主修改上下文后下一次调用即可生效。

use crate::im::error::MessagingError;
use crate::im::types::{Identity, UserType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// 演示模式下教师页面使用的固定身份
pub const DEMO_TEACHER_ID: i64 = 4;
pub const DEMO_TEACHER_NAME: &str = "teacher2教师";
/// 演示模式下学生页面缺少 currentUser 时的兜底身份
pub const DEMO_STUDENT_ID: i64 = 5;
pub const DEMO_STUDENT_NAME: &str = "student2学生";

/// 身份解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityMode {
    /// 只信任服务端下发并校验过的会话身份
    #[default]
    Session,
    /// 演示/测试模式：按页面标记推断，并使用写死的兜底身份
    Demo,
}

/// 页面上挂载的 currentUser 对象，通常是 `/api/auth/check` 的返回
/// （`{userId, username, role}`），旧页面只有 `id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl CurrentUser {
    /// userId 优先，无效时再看 id
    fn valid_id(&self) -> Option<i64> {
        self.user_id
            .filter(|id| *id > 0)
            .or_else(|| self.id.filter(|id| *id > 0))
    }

    fn display_name(&self) -> String {
        self.real_name
            .clone()
            .or_else(|| self.username.clone())
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }
}

/// 宿主页面上下文
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// 页面标题文本
    pub title: String,
    /// 页面路径
    pub path: String,
    /// 页面脚本挂载的 currentUser
    pub current_user: Option<CurrentUser>,
    /// 服务端注入的已校验会话身份
    pub session: Option<Identity>,
}

/// 页面类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Teacher,
    Student,
}

impl PageContext {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// 按标题（`教师端`/`学生端`）和路径判断页面类别，教师标记优先
    pub fn kind(&self) -> Option<PageKind> {
        let path = self.path.to_ascii_lowercase();
        if self.title.contains("教师端") || path.contains("teacher") {
            Some(PageKind::Teacher)
        } else if self.title.contains("学生端") || path.contains("student") {
            Some(PageKind::Student)
        } else {
            None
        }
    }
}

/// 共享的页面上下文句柄，宿主可随时修改
#[derive(Debug, Clone)]
pub struct IdentitySource {
    page: Arc<RwLock<PageContext>>,
    mode: IdentityMode,
}

impl IdentitySource {
    pub fn new(page: PageContext, mode: IdentityMode) -> Self {
        Self {
            page: Arc::new(RwLock::new(page)),
            mode,
        }
    }

    pub fn mode(&self) -> IdentityMode {
        self.mode
    }

    /// 替换页面上的 currentUser
    pub fn set_current_user(&self, user: Option<CurrentUser>) {
        self.page.write().current_user = user;
    }

    /// 替换服务端注入的会话身份
    pub fn set_session(&self, session: Option<Identity>) {
        self.page.write().session = session;
    }

    /// 修改页面上下文
    pub fn update(&self, f: impl FnOnce(&mut PageContext)) {
        f(&mut self.page.write());
    }

    /// 解析当前身份
    pub fn resolve(&self) -> Result<Identity, MessagingError> {
        let page = self.page.read();
        resolve_identity(&page, self.mode)
    }
}

/// 解析当前身份（纯读取，无副作用）
pub fn resolve_identity(page: &PageContext, mode: IdentityMode) -> Result<Identity, MessagingError> {
    match mode {
        IdentityMode::Session => page.session.clone().ok_or_else(|| {
            debug!("[Identity] 页面未注入会话身份");
            MessagingError::IdentityUnresolved
        }),
        IdentityMode::Demo => resolve_from_page_markers(page),
    }
}

fn resolve_from_page_markers(page: &PageContext) -> Result<Identity, MessagingError> {
    match page.kind() {
        Some(PageKind::Teacher) => {
            // 不与任何登录会话核对
            warn!(
                "[Identity] ⚠️ 演示模式：教师页面使用固定身份 id={}",
                DEMO_TEACHER_ID
            );
            Ok(Identity::new(
                DEMO_TEACHER_ID,
                UserType::Teacher,
                DEMO_TEACHER_NAME,
            ))
        }
        Some(PageKind::Student) => {
            if let Some(user) = page.current_user.as_ref() {
                if let Some(id) = user.valid_id() {
                    debug!("[Identity] 学生页面使用 currentUser id={}", id);
                    return Ok(Identity::new(id, UserType::Student, user.display_name()));
                }
            }
            warn!(
                "[Identity] ⚠️ 演示模式：currentUser 缺失或无效，使用兜底学生 id={}",
                DEMO_STUDENT_ID
            );
            Ok(Identity::new(
                DEMO_STUDENT_ID,
                UserType::Student,
                DEMO_STUDENT_NAME,
            ))
        }
        None => {
            debug!(
                "[Identity] 无法识别页面类别: title={}, path={}",
                page.title, page.path
            );
            Err(MessagingError::IdentityUnresolved)
        }
    }
}
