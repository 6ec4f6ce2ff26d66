//! 好友关系模型

use serde::{Deserialize, Serialize};

/// friendship 表行
///
/// 一对用户之间最多一行，方向由 requester / receiver 决定；
/// accepted 为 false 表示待处理请求，接受后置 true 并记录 accept_date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    #[serde(default)]
    pub created_at: String,
    pub requester_id: String,
    pub receiver_id: String,
    pub accepted: bool,
    #[serde(default)]
    pub accept_date: Option<String>,
}

impl Friendship {
    /// 该行是否涉及指定用户
    pub fn involves(&self, uid: &str) -> bool {
        self.requester_id == uid || self.receiver_id == uid
    }

    /// 关系中的另一方
    pub fn other(&self, uid: &str) -> &str {
        if self.requester_id == uid {
            &self.receiver_id
        } else {
            &self.requester_id
        }
    }
}
