//! 好友关系数据访问层

use crate::fomo::error::Result;
use crate::fomo::friend::models::Friendship;
use crate::fomo::store::{decode_rows, Filter, TableStore};
use crate::fomo::types::timestamp_now;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// friendship 表的读写封装
#[derive(Clone)]
pub struct FriendshipApi {
    store: Arc<dyn TableStore>,
}

/// 无序对过滤条件：同时覆盖两个方向的行
fn pair_filter(uid_a: &str, uid_b: &str) -> Filter {
    Filter::or(vec![
        Filter::and(vec![
            Filter::eq("requester_id", uid_a),
            Filter::eq("receiver_id", uid_b),
        ]),
        Filter::and(vec![
            Filter::eq("requester_id", uid_b),
            Filter::eq("receiver_id", uid_a),
        ]),
    ])
}

impl FriendshipApi {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// 拉取全表，由服务层按本人视角分拣
    pub async fn list_all(&self) -> Result<Vec<Friendship>> {
        let rows = self.store.select("friendship", None).await?;
        Ok(decode_rows(rows)?)
    }

    /// 查询指定方向上的行
    pub async fn find_directed(&self, requester: &str, receiver: &str) -> Result<Option<Friendship>> {
        let filter = Filter::and(vec![
            Filter::eq("requester_id", requester),
            Filter::eq("receiver_id", receiver),
        ]);
        let rows = self.store.select("friendship", Some(&filter)).await?;
        let mut rows: Vec<Friendship> = decode_rows(rows)?;
        Ok(rows.pop())
    }

    /// 插入待处理的好友请求行
    pub async fn insert(&self, requester: &str, receiver: &str) -> Result<()> {
        debug!("[FriendApi] 插入好友请求: {} -> {}", requester, receiver);
        let row = json!({
            "created_at": timestamp_now(),
            "requester_id": requester,
            "receiver_id": receiver,
            "accepted": false,
        });
        self.store.insert("friendship", row).await?;
        Ok(())
    }

    /// 把指定方向的请求标记为已接受
    pub async fn mark_accepted(&self, requester: &str, receiver: &str) -> Result<()> {
        let filter = Filter::and(vec![
            Filter::eq("requester_id", requester),
            Filter::eq("receiver_id", receiver),
        ]);
        let patch = json!({ "accepted": true, "accept_date": timestamp_now() });
        self.store.update("friendship", patch, &filter).await?;
        Ok(())
    }

    /// 删除指定方向的行（拒绝请求）
    pub async fn delete_directed(&self, requester: &str, receiver: &str) -> Result<()> {
        let filter = Filter::and(vec![
            Filter::eq("requester_id", requester),
            Filter::eq("receiver_id", receiver),
        ]);
        self.store.delete("friendship", &filter).await?;
        Ok(())
    }

    /// 删除一对用户之间的所有行，方向无关（解除好友）
    pub async fn delete_pair(&self, uid_a: &str, uid_b: &str) -> Result<()> {
        debug!("[FriendApi] 删除好友关系: {} <-> {}", uid_a, uid_b);
        self.store.delete("friendship", &pair_filter(uid_a, uid_b)).await?;
        Ok(())
    }
}
