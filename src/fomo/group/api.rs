//! 群组数据访问层

use crate::fomo::error::{Result, SyncError};
use crate::fomo::group::models::{Group, GroupLink};
use crate::fomo::store::{decode_rows, Filter, TableStore};
use crate::fomo::types::timestamp_now;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// groups / group_links 表的读写封装
#[derive(Clone)]
pub struct GroupApi {
    store: Arc<dyn TableStore>,
}

impl GroupApi {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    // ---- groups ----

    /// 插入群组行，id 由远端分配
    pub async fn insert_group(&self, name: &str, creator_id: &str) -> Result<()> {
        let group = Group {
            id: None,
            created_at: timestamp_now(),
            name: name.to_string(),
            creator_id: creator_id.to_string(),
        };
        let row = serde_json::to_value(&group)
            .map_err(|e| anyhow::anyhow!("序列化群组行失败: {e}"))?;
        self.store.insert("groups", row).await?;
        Ok(())
    }

    pub async fn get_group(&self, id: i64) -> Result<Group> {
        let rows = self.store.select("groups", Some(&Filter::eq("id", id))).await?;
        let mut groups: Vec<Group> = decode_rows(rows)?;
        groups.pop().ok_or_else(|| SyncError::NotFound(format!("群组 {id}")))
    }

    /// 按群名与创建者回读刚插入的群组行（insert 不返回生成的 id）
    pub async fn find_by_name_and_creator(&self, name: &str, creator_id: &str) -> Result<Group> {
        let filter = Filter::and(vec![
            Filter::eq("name", name),
            Filter::eq("creator_id", creator_id),
        ]);
        let rows = self.store.select("groups", Some(&filter)).await?;
        let mut groups: Vec<Group> = decode_rows(rows)?;
        groups.pop().ok_or_else(|| SyncError::NotFound(format!("群组 {name}")))
    }

    pub async fn list_groups_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let values = ids.iter().map(|id| id.to_string()).collect();
        let rows = self
            .store
            .select("groups", Some(&Filter::is_in("id", values)))
            .await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn delete_group(&self, id: i64) -> Result<()> {
        debug!("[GroupApi] 删除群组: id={}", id);
        self.store.delete("groups", &Filter::eq("id", id)).await?;
        Ok(())
    }

    // ---- group_links ----

    /// 插入成员链接；创建者的链接直接带 accepted = true
    pub async fn insert_link(&self, user_id: &str, group_id: i64, accepted: bool) -> Result<()> {
        let link = GroupLink {
            created_at: timestamp_now(),
            user_id: user_id.to_string(),
            group_id,
            accepted,
        };
        let row = serde_json::to_value(&link)
            .map_err(|e| anyhow::anyhow!("序列化成员链接失败: {e}"))?;
        self.store.insert("group_links", row).await?;
        Ok(())
    }

    /// 指定用户的所有成员链接（含待处理的邀请）
    pub async fn links_of_user(&self, user_id: &str) -> Result<Vec<GroupLink>> {
        let rows = self
            .store
            .select("group_links", Some(&Filter::eq("user_uid", user_id)))
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// 指定群组的所有成员链接
    pub async fn links_of_group(&self, group_id: i64) -> Result<Vec<GroupLink>> {
        let rows = self
            .store
            .select("group_links", Some(&Filter::eq("group_id", group_id)))
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// 把指定用户对指定群组的链接标记为已接受
    pub async fn accept_link(&self, user_id: &str, group_id: i64) -> Result<()> {
        let filter = Filter::and(vec![
            Filter::eq("user_uid", user_id),
            Filter::eq("group_id", group_id),
        ]);
        self.store
            .update("group_links", json!({ "accepted": true }), &filter)
            .await?;
        Ok(())
    }

    /// 删除指定用户对指定群组的链接（拒绝邀请或退群）
    pub async fn delete_link(&self, user_id: &str, group_id: i64) -> Result<()> {
        let filter = Filter::and(vec![
            Filter::eq("user_uid", user_id),
            Filter::eq("group_id", group_id),
        ]);
        self.store.delete("group_links", &filter).await?;
        Ok(())
    }
}
