//! 路线事件监听器

use crate::fomo::types::LatLng;
use async_trait::async_trait;

/// 路线与目的地变化的回调，两者总是成对通知
#[async_trait]
pub trait RouteListener: Send + Sync {
    /// 当前路线发生变化；清除时两个参数都为 None
    async fn on_route_changed(&self, route: Option<Vec<LatLng>>, destination: Option<LatLng>);
}

/// 空实现，宿主未注册监听器时使用
pub struct EmptyRouteListener;

#[async_trait]
impl RouteListener for EmptyRouteListener {
    async fn on_route_changed(&self, _route: Option<Vec<LatLng>>, _destination: Option<LatLng>) {}
}
