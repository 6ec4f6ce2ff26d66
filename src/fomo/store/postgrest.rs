//! PostgREST 风格的远端表存储客户端
//!
//! 对接 Supabase 一类的 REST 数据接口：`{base}/rest/v1/{table}`，
//! 等值过滤通过查询参数表达，update 为 PATCH 部分字段集。

use crate::fomo::store::{Filter, TableStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

/// 基于 reqwest 的 PostgREST 客户端
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
}

impl PostgrestStore {
    /// 创建新的存储客户端
    ///
    /// `api_key` 与用户的 `access_token` 写入默认请求头，后续所有请求自动携带
    pub fn new(base_url: String, api_key: &str, access_token: &str) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_static("apikey"),
            reqwest::header::HeaderValue::from_str(api_key).context("无效的 apikey")?,
        );
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {access_token}"))
                .context("无效的 access_token")?,
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self { client, base_url })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// 统一的响应检查：非 2xx 一律记录并转为错误
    async fn check_response(
        response: reqwest::Response,
        operation: &str,
        table: &str,
    ) -> Result<String> {
        let status = response.status();
        let body = response.text().await.context("读取响应 body 失败")?;
        if !status.is_success() {
            error!(
                "[Store] {} {} 请求失败，HTTP状态: {}, 响应: {}",
                operation, table, status, body
            );
            return Err(anyhow::anyhow!("HTTP 错误 {status}: {body}"));
        }
        Ok(body)
    }
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn select(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        let operation_id = Uuid::new_v4().to_string();
        let mut query = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = filter {
            query.extend(filter.to_query());
        }

        debug!("[Store] 📡 select {} 过滤条件: {:?}", table, filter);
        let response = self
            .client
            .get(self.table_url(table))
            .header("operationID", &operation_id)
            .query(&query)
            .send()
            .await
            .context("select 请求失败")?;

        let body = Self::check_response(response, "select", table).await?;
        let rows: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| anyhow::anyhow!("解析 select 响应失败: {e}"))?;
        debug!("[Store] select {} 返回 {} 行", table, rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[Store] 📡 insert {}", table);
        let response = self
            .client
            .post(self.table_url(table))
            .header("operationID", &operation_id)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .context("insert 请求失败")?;
        Self::check_response(response, "insert", table).await?;
        Ok(())
    }

    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[Store] 📡 update {} 过滤条件: {:?}", table, filter);
        let response = self
            .client
            .patch(self.table_url(table))
            .header("operationID", &operation_id)
            .header("Prefer", "return=minimal")
            .query(&filter.to_query())
            .json(&patch)
            .send()
            .await
            .context("update 请求失败")?;
        Self::check_response(response, "update", table).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        debug!("[Store] 📡 delete {} 过滤条件: {:?}", table, filter);
        let response = self
            .client
            .delete(self.table_url(table))
            .header("operationID", &operation_id)
            .query(&filter.to_query())
            .send()
            .await
            .context("delete 请求失败")?;
        Self::check_response(response, "delete", table).await?;
        Ok(())
    }
}
