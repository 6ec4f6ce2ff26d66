//! 通用类型定义

use serde::{Deserialize, Serialize};

/// 经纬度坐标
///
/// 序列化格式与远端存储中 route 字段的 `{latitude, longitude}` 对象一致
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// 出行方式（对应 Directions API 的 mode 参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Walking,
    Bicycling,
    Driving,
    Transit,
}

impl TravelMode {
    /// 转换为服务商使用的字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
        }
    }

    /// 从字符串解析出行方式
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "walking" => Some(TravelMode::Walking),
            "bicycling" => Some(TravelMode::Bicycling),
            "driving" => Some(TravelMode::Driving),
            "transit" => Some(TravelMode::Transit),
            _ => None,
        }
    }
}

/// 生成远端存储使用的时间戳字符串（`yyyy-MM-dd'T'HH:mm:ss'Z'`）
pub fn timestamp_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
