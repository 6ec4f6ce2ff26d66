//! 用户与状态模型

use crate::fomo::types::LatLng;
use serde::{Deserialize, Serialize};

/// 「空闲」状态的描述文本
pub const IDLE_DESCRIPTION: &str = "Idle";

/// 「在路上」状态的描述文本，路线仅在该状态下有效
pub const ON_MY_WAY_DESCRIPTION: &str = "On my way";

/// users 表行
///
/// 字段名与远端存储的列名一致；route 与目的地列可为 null，
/// 仅在「在路上」状态下有值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub email: String,
    pub display_name: String,
    pub username: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// 状态目录中的状态 id（列名为 status）
    #[serde(rename = "status", default = "default_status_id")]
    pub status_id: i64,
    /// 持久化的路线（`{latitude, longitude}` 对象数组）
    #[serde(default)]
    pub route: Option<Vec<LatLng>>,
    #[serde(default)]
    pub destination_latitude: Option<f64>,
    #[serde(default)]
    pub destination_longitude: Option<f64>,
}

fn default_status_id() -> i64 {
    1
}

impl User {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// statuses 表行（状态目录，不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    #[serde(default)]
    pub created_at: String,
    pub description: String,
    pub emoji: String,
}

impl Status {
    /// 状态目录加载前使用的「空闲」占位状态
    pub fn default_idle() -> Self {
        Status {
            id: 7,
            created_at: String::new(),
            description: IDLE_DESCRIPTION.to_string(),
            emoji: "💤".to_string(),
        }
    }

    /// 是否是决定路线有效性的「在路上」状态
    pub fn is_on_my_way(&self) -> bool {
        self.description == ON_MY_WAY_DESCRIPTION
    }
}
