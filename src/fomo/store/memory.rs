//! 内存表存储（测试替身）
//!
//! 行为对齐 [`PostgrestStore`](super::PostgrestStore)：等值过滤按字符串
//! 语义比较，update 合并部分字段，insert 时为显式携带 `id: null` 的行
//! 分配自增整数 id（模拟远端的自增主键列）。

use crate::fomo::store::{Filter, TableStore};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// 进程内的表存储
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn allocate_id(&self) -> i64 {
        let mut guard = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        let id = *guard;
        *guard += 1;
        id
    }
}

/// 按字符串语义比较 JSON 值与过滤条件中的值
fn value_eq_str(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, expected) => row
            .get(column)
            .map(|v| value_eq_str(v, expected))
            .unwrap_or(false),
        Filter::In(column, values) => row
            .get(column)
            .map(|v| values.iter().any(|expected| value_eq_str(v, expected)))
            .unwrap_or(false),
        Filter::And(filters) => filters.iter().all(|f| matches(row, f)),
        Filter::Or(filters) => filters.iter().any(|f| matches(row, f)),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        let tables = self.lock_tables();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(match filter {
            Some(filter) => rows.into_iter().filter(|row| matches(row, filter)).collect(),
            None => rows,
        })
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<()> {
        if row.get("id").map(Value::is_null).unwrap_or(false) {
            let id = self.allocate_id();
            if let Some(object) = row.as_object_mut() {
                object.insert("id".to_string(), Value::from(id));
            }
        }
        self.lock_tables().entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()> {
        let Some(patch_fields) = patch.as_object() else {
            return Err(anyhow::anyhow!("update 的 patch 必须是 JSON 对象"));
        };
        let mut tables = self.lock_tables();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                if let Some(object) = row.as_object_mut() {
                    for (key, value) in patch_fields {
                        object.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        let mut tables = self.lock_tables();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !matches(row, filter));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn select_applies_eq_and_in_filters() {
        let store = MemoryStore::new();
        store.insert("users", json!({"uid": "a", "username": "alice"})).await.unwrap();
        store.insert("users", json!({"uid": "b", "username": "bob"})).await.unwrap();
        store.insert("users", json!({"uid": "c", "username": "carol"})).await.unwrap();

        let rows = store
            .select("users", Some(&Filter::eq("username", "bob")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["uid"], "b");

        let rows = store
            .select(
                "users",
                Some(&Filter::is_in("uid", vec!["a".to_string(), "c".to_string()])),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn or_of_ands_matches_either_direction() {
        let store = MemoryStore::new();
        store
            .insert("friendship", json!({"requester_id": "a", "receiver_id": "b"}))
            .await
            .unwrap();

        let pair = Filter::or(vec![
            Filter::and(vec![Filter::eq("requester_id", "a"), Filter::eq("receiver_id", "b")]),
            Filter::and(vec![Filter::eq("requester_id", "b"), Filter::eq("receiver_id", "a")]),
        ]);
        store.delete("friendship", &pair).await.unwrap();
        assert!(store.select("friendship", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let store = MemoryStore::new();
        store
            .insert("friendship", json!({"requester_id": "a", "receiver_id": "b", "accepted": false}))
            .await
            .unwrap();
        store
            .update(
                "friendship",
                json!({"accepted": true, "accept_date": "2024-11-01T00:00:00Z"}),
                &Filter::eq("requester_id", "a"),
            )
            .await
            .unwrap();

        let rows = store.select("friendship", None).await.unwrap();
        assert_eq!(rows[0]["accepted"], true);
        assert_eq!(rows[0]["accept_date"], "2024-11-01T00:00:00Z");
        // 未出现在 patch 中的字段保持不变
        assert_eq!(rows[0]["receiver_id"], "b");
    }

    #[tokio::test]
    async fn insert_assigns_id_when_explicitly_null() {
        let store = MemoryStore::new();
        store.insert("groups", json!({"id": null, "name": "g1"})).await.unwrap();
        store.insert("groups", json!({"id": null, "name": "g2"})).await.unwrap();

        let rows = store.select("groups", None).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        // 没有 id 列的表不受影响
        store.insert("friendship", json!({"requester_id": "a"})).await.unwrap();
        let rows = store.select("friendship", None).await.unwrap();
        assert!(rows[0].get("id").is_none());
    }
}
