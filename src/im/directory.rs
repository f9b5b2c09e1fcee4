//! 按课程划分的联系人目录
//!
//! 只用于"发起新对话"：先选课程，再选课程内的联系人

use crate::im::conversation::ActiveConversation;
use crate::im::entities::{Contact, Course};
use crate::im::identity::IdentitySource;
use crate::im::listener::{MessagingView, NoticeLevel};
use crate::im::store::ConversationStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 联系人目录
pub struct ContactDirectory {
    store: Arc<dyn ConversationStore>,
    view: Arc<dyn MessagingView>,
    identity: IdentitySource,
    active: Arc<ActiveConversation>,
}

impl ContactDirectory {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        view: Arc<dyn MessagingView>,
        identity: IdentitySource,
        active: Arc<ActiveConversation>,
    ) -> Self {
        Self {
            store,
            view,
            identity,
            active,
        }
    }

    /// 当前用户的课程，顺序与服务端一致
    pub async fn list_courses(&self) -> Vec<Course> {
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[Directory] {}，课程列表为空", e);
                self.view.render_courses(&[]).await;
                return Vec::new();
            }
        };

        let courses = match self.store.list_courses(&me).await {
            Ok(resp) => match resp.into_result() {
                Ok(data) => data.unwrap_or_default(),
                Err(e) => {
                    warn!("[Directory] 获取课程失败: {}", e);
                    self.view.notify(NoticeLevel::Error, &e.to_string()).await;
                    Vec::new()
                }
            },
            Err(e) => {
                error!("[Directory] 课程请求失败: {:#}", e);
                Vec::new()
            }
        };
        debug!("[Directory] 课程数: {}", courses.len());
        self.view.render_courses(&courses).await;
        courses
    }

    /// 课程内可聊天的联系人；未选课程与课程无联系人是两种不同的空状态
    pub async fn list_course_members(&self, course_id: Option<i64>) -> Vec<Contact> {
        let Some(course_id) = course_id else {
            self.view.render_no_course_selected().await;
            return Vec::new();
        };
        let me = match self.identity.resolve() {
            Ok(me) => me,
            Err(e) => {
                debug!("[Directory] {}，不加载联系人", e);
                self.view.render_no_course_selected().await;
                return Vec::new();
            }
        };

        match self.store.list_course_members(course_id, &me).await {
            Ok(resp) => match resp.into_result() {
                Ok(data) => {
                    let contacts: Vec<Contact> = data
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|c| !me.is(c.id, c.user_type))
                        .collect();
                    if contacts.is_empty() {
                        self.view.render_contacts_empty(course_id).await;
                    } else {
                        self.view.render_contacts(course_id, &contacts).await;
                    }
                    contacts
                }
                Err(e) => {
                    warn!("[Directory] 获取课程 {} 联系人失败: {}", course_id, e);
                    self.view.notify(NoticeLevel::Error, &e.to_string()).await;
                    Vec::new()
                }
            },
            Err(e) => {
                error!("[Directory] 课程 {} 联系人请求失败: {:#}", course_id, e);
                self.view
                    .notify(NoticeLevel::Error, "加载联系人失败，请检查网络连接")
                    .await;
                Vec::new()
            }
        }
    }

    /// 选中联系人：打开对话并切换到会话列表
    pub async fn start_chat(&self, contact: &Contact, course_id: Option<i64>) {
        info!(
            "[Directory] 发起与 {}({}) 的新对话, courseId={:?}",
            contact.name, contact.id, course_id
        );
        self.active
            .open(contact.id, contact.user_type, &contact.name, course_id)
            .await;
        self.view.show_conversation_section().await;
    }
}
