//! 私有地点（地理围栏）模型

use crate::fomo::types::LatLng;
use serde::{Deserialize, Serialize};

/// places 表行
///
/// 地点对所有者私有；id 由远端存储分配，insert 时为 null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 半径（米）。包含判定时直接作为经纬度的度数偏移使用，
    /// 未做投影换算——沿用的已知近似，不要悄悄「修正」
    pub radius: f64,
    pub owner_id: String,
}

impl Place {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// 坐标是否落在地点的轴对齐包围盒内；边界上的点视为外部
    pub fn contains(&self, point: LatLng) -> bool {
        self.latitude - self.radius < point.latitude
            && point.latitude < self.latitude + self.radius
            && self.longitude - self.radius < point.longitude
            && point.longitude < self.longitude + self.radius
    }
}

/// 返回第一个包含该坐标的地点，没有则返回 None
pub fn locate(point: LatLng, places: &[Place]) -> Option<&Place> {
    places.iter().find(|place| place.contains(point))
}
