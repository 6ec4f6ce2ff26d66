//! 群组模型

use serde::{Deserialize, Serialize};

/// groups 表行
///
/// id 由远端存储分配，insert 时为 null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_at: String,
    pub name: String,
    pub creator_id: String,
}

/// group_links 表行（用户与群组的成员关系）
///
/// accepted 的生命周期与好友请求一致：插入时待处理，接受后置 true；
/// 群主自己的链接在建群时即为已接受
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupLink {
    #[serde(default)]
    pub created_at: String,
    #[serde(rename = "user_uid")]
    pub user_id: String,
    pub group_id: i64,
    pub accepted: bool,
}
