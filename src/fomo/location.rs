//! 定位源契约
//!
//! 同步循环每个节拍询问一次定位源；宿主平台（移动端、桌面端）
//! 注入自己的实现，核心不关心定位的来源。

use crate::fomo::types::LatLng;
use anyhow::Result;
use async_trait::async_trait;

/// 定位源
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// 最近一次已知位置；定位不可用时返回 None
    async fn last_known(&self) -> Result<Option<LatLng>>;
}

/// 无定位能力的占位实现
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn last_known(&self) -> Result<Option<LatLng>> {
        Ok(None)
    }
}

/// 固定坐标的定位源（测试与演示用）
pub struct FixedLocation(pub LatLng);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known(&self) -> Result<Option<LatLng>> {
        Ok(Some(self.0))
    }
}
