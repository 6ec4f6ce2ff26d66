//! 用户表数据访问层

use crate::fomo::error::{Result, SyncError};
use crate::fomo::store::{decode_rows, Filter, TableStore};
use crate::fomo::types::LatLng;
use crate::fomo::user::models::{Status, User};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// users / statuses 表的读写封装
#[derive(Clone)]
pub struct UserApi {
    store: Arc<dyn TableStore>,
}

/// get_route 只关心路线相关的三列
#[derive(Debug, Deserialize)]
struct RouteRow {
    #[serde(default)]
    route: Option<Vec<LatLng>>,
    #[serde(default)]
    destination_latitude: Option<f64>,
    #[serde(default)]
    destination_longitude: Option<f64>,
}

impl UserApi {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// 按 uid 查询用户行
    pub async fn get_by_uid(&self, uid: &str) -> Result<User> {
        let rows = self.store.select("users", Some(&Filter::eq("uid", uid))).await?;
        let mut users: Vec<User> = decode_rows(rows)?;
        users.pop().ok_or_else(|| SyncError::NotFound(format!("用户 {uid}")))
    }

    /// 按用户名查询用户行（好友请求以用户名定位目标）
    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        let rows = self
            .store
            .select("users", Some(&Filter::eq("username", username)))
            .await?;
        let mut users: Vec<User> = decode_rows(rows)?;
        users.pop().ok_or_else(|| SyncError::NotFound(format!("用户名 {username}")))
    }

    /// 按 uid 集合批量查询用户行，一次 select 代替逐行解析
    pub async fn list_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .select("users", Some(&Filter::is_in("uid", ids.to_vec())))
            .await?;
        Ok(decode_rows(rows)?)
    }

    /// 拉取完整的状态目录
    pub async fn list_statuses(&self) -> Result<Vec<Status>> {
        let rows = self.store.select("statuses", None).await?;
        Ok(decode_rows(rows)?)
    }

    /// 插入新注册用户的初始行
    pub async fn insert(&self, user: &User) -> Result<()> {
        let row = serde_json::to_value(user)
            .map_err(|e| anyhow::anyhow!("序列化用户行失败: {e}"))?;
        self.store.insert("users", row).await?;
        Ok(())
    }

    /// 合并部分字段到本人的用户行
    pub async fn update_fields(&self, uid: &str, patch: Value) -> Result<()> {
        debug!("[UserApi] 更新用户字段: uid={} patch={}", uid, patch);
        self.store.update("users", patch, &Filter::eq("uid", uid)).await?;
        Ok(())
    }

    /// 持久化路线与目的地
    pub async fn set_route(&self, uid: &str, route: &[LatLng], destination: LatLng) -> Result<()> {
        let patch = json!({
            "route": route,
            "destination_latitude": destination.latitude,
            "destination_longitude": destination.longitude,
        });
        self.store.update("users", patch, &Filter::eq("uid", uid)).await?;
        Ok(())
    }

    /// 清除持久化的路线与目的地（三列同时置空）
    pub async fn clear_route(&self, uid: &str) -> Result<()> {
        let patch = json!({
            "route": Value::Null,
            "destination_latitude": Value::Null,
            "destination_longitude": Value::Null,
        });
        self.store.update("users", patch, &Filter::eq("uid", uid)).await?;
        Ok(())
    }

    /// 读取持久化的路线；路线或目的地任一缺失都视为没有路线
    pub async fn get_route(&self, uid: &str) -> Result<Option<(Vec<LatLng>, LatLng)>> {
        let rows = self.store.select("users", Some(&Filter::eq("uid", uid))).await?;
        let mut rows: Vec<RouteRow> = decode_rows(rows)?;
        let Some(row) = rows.pop() else {
            return Ok(None);
        };
        match (row.route, row.destination_latitude, row.destination_longitude) {
            (Some(route), Some(lat), Some(lng)) if !route.is_empty() => {
                Ok(Some((route, LatLng::new(lat, lng))))
            }
            _ => Ok(None),
        }
    }
}
