//! 远端表存储契约
//!
//! 远端是一个表状的持久化存储（users / statuses / places / friendship /
//! groups / group_links），支持按行级过滤条件做 select / insert / update /
//! delete，不提供跨表事务。核心只依赖这里定义的 [`TableStore`] 契约，
//! 便于在测试中注入替身实现。

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 行级过滤条件
///
/// `Or(And, And)` 的组合形态用于按无序对删除好友关系，
/// `In` 用于把逐行的用户解析合并成一次批量查询。
#[derive(Debug, Clone)]
pub enum Filter {
    /// 列等于给定值
    Eq(String, String),
    /// 列的值在给定集合中
    In(String, Vec<String>),
    /// 全部条件成立
    And(Vec<Filter>),
    /// 任一条件成立
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq(column.to_string(), value.to_string())
    }

    pub fn is_in(column: &str, values: Vec<String>) -> Self {
        Filter::In(column.to_string(), values)
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// 渲染为 PostgREST 的顶层查询参数
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        match self {
            Filter::Eq(column, value) => vec![(column.clone(), format!("eq.{value}"))],
            Filter::In(column, values) => {
                vec![(column.clone(), format!("in.({})", values.join(",")))]
            }
            Filter::And(filters) => filters.iter().flat_map(|f| f.to_query()).collect(),
            Filter::Or(filters) => {
                let inner = filters.iter().map(|f| f.to_expr()).collect::<Vec<_>>();
                vec![("or".to_string(), format!("({})", inner.join(",")))]
            }
        }
    }

    /// 渲染为嵌套在 or= / and= 中的布尔表达式
    fn to_expr(&self) -> String {
        match self {
            Filter::Eq(column, value) => format!("{column}.eq.{value}"),
            Filter::In(column, values) => format!("{column}.in.({})", values.join(",")),
            Filter::And(filters) => {
                let inner = filters.iter().map(|f| f.to_expr()).collect::<Vec<_>>();
                format!("and({})", inner.join(","))
            }
            Filter::Or(filters) => {
                let inner = filters.iter().map(|f| f.to_expr()).collect::<Vec<_>>();
                format!("or({})", inner.join(","))
            }
        }
    }
}

/// 表存储契约
///
/// 行以 JSON 对象传递，列名与远端存储一致（snake_case）；
/// update 是部分字段集合并，不替换整行。
#[async_trait]
pub trait TableStore: Send + Sync {
    /// 查询表中满足条件的所有行；`filter` 为空时返回全表
    async fn select(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>>;

    /// 插入一行
    async fn insert(&self, table: &str, row: Value) -> Result<()>;

    /// 把 `patch` 中的字段合并到所有满足条件的行
    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()>;

    /// 删除所有满足条件的行
    async fn delete(&self, table: &str, filter: &Filter) -> Result<()>;
}

/// 把 select 返回的 JSON 行反序列化为目标模型
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| anyhow::anyhow!("解析存储行失败: {e}"))
        })
        .collect()
}
