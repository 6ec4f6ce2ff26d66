//! 地点事件监听器

use crate::fomo::place::models::Place;
use async_trait::async_trait;

/// 私有地点集合变化的回调
#[async_trait]
pub trait PlaceListener: Send + Sync {
    /// 地点列表发生变化
    async fn on_place_list_changed(&self, places: Vec<Place>);
}

/// 空实现，宿主未注册监听器时使用
pub struct EmptyPlaceListener;

#[async_trait]
impl PlaceListener for EmptyPlaceListener {
    async fn on_place_list_changed(&self, _places: Vec<Place>) {}
}
