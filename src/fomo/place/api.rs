//! 地点数据访问层

use crate::fomo::error::Result;
use crate::fomo::place::models::Place;
use crate::fomo::store::{decode_rows, Filter, TableStore};
use std::sync::Arc;
use tracing::debug;

/// places 表的读写封装；地点对所有者私有，所有操作都带 owner 条件
#[derive(Clone)]
pub struct PlaceApi {
    store: Arc<dyn TableStore>,
}

impl PlaceApi {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Place>> {
        let rows = self
            .store
            .select("places", Some(&Filter::eq("owner_id", owner_id)))
            .await?;
        Ok(decode_rows(rows)?)
    }

    pub async fn insert(&self, place: &Place) -> Result<()> {
        debug!("[PlaceApi] 插入地点: {}", place.name);
        let row = serde_json::to_value(place)
            .map_err(|e| anyhow::anyhow!("序列化地点行失败: {e}"))?;
        self.store.insert("places", row).await?;
        Ok(())
    }

    pub async fn delete(&self, owner_id: &str, id: i64) -> Result<()> {
        let filter = Filter::and(vec![
            Filter::eq("owner_id", owner_id),
            Filter::eq("id", id),
        ]);
        self.store.delete("places", &filter).await?;
        Ok(())
    }
}
