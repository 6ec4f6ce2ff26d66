//! 地点同步服务层

use crate::fomo::error::Result;
use crate::fomo::maps::Geocoder;
use crate::fomo::place::api::PlaceApi;
use crate::fomo::place::listener::PlaceListener;
use crate::fomo::place::models::{locate, Place};
use crate::fomo::state::StateStore;
use crate::fomo::types::LatLng;
use std::sync::Arc;
use tracing::{info, warn};

/// 未指定半径时的默认地理围栏半径（度）
const DEFAULT_RADIUS: f64 = 0.001;

/// 私有地点的同步服务
#[derive(Clone)]
pub struct PlaceService {
    api: PlaceApi,
    geocoder: Arc<dyn Geocoder>,
    state: Arc<StateStore>,
    listener: Arc<dyn PlaceListener>,
}

impl PlaceService {
    pub fn new(
        api: PlaceApi,
        geocoder: Arc<dyn Geocoder>,
        state: Arc<StateStore>,
        listener: Arc<dyn PlaceListener>,
    ) -> Self {
        Self {
            api,
            geocoder,
            state,
            listener,
        }
    }

    /// 📡 拉取本人的地点列表并刷新镜像
    pub async fn fetch_places(&self) -> Result<()> {
        let me = self.state.uid();
        let places = self.api.list_by_owner(&me).await?;
        self.state.replace_places(places.clone());
        self.listener.on_place_list_changed(places).await;
        Ok(())
    }

    /// 新建私有地点
    ///
    /// 坐标缺省为本人当前位置，半径缺省为 [`DEFAULT_RADIUS`]
    pub async fn create_place(
        &self,
        name: &str,
        coords: Option<LatLng>,
        radius: Option<f64>,
    ) -> Result<()> {
        let center = coords.unwrap_or_else(|| self.state.position());
        let place = Place {
            id: None,
            name: name.to_string(),
            latitude: center.latitude,
            longitude: center.longitude,
            radius: radius.unwrap_or(DEFAULT_RADIUS),
            owner_id: self.state.uid(),
        };
        self.api.insert(&place).await?;
        info!("[PlaceSync] ✅ 地点已创建: {}", name);
        self.fetch_places().await
    }

    /// 删除本人的地点
    pub async fn remove_place(&self, id: i64) -> Result<()> {
        let me = self.state.uid();
        self.api.delete(&me, id).await?;
        self.fetch_places().await
    }

    /// 反向地理编码出坐标处的 place_id
    ///
    /// 服务商失败只记日志，按「没有结果」处理
    pub async fn place_id_at(&self, coords: LatLng) -> Option<String> {
        match self.geocoder.place_id(coords).await {
            Ok(place_id) => place_id,
            Err(e) => {
                warn!("[PlaceSync] 反向地理编码失败: {:#}", e);
                None
            }
        }
    }

    /// 本人当前位置所在的地点（第一个命中的地理围栏）
    pub fn current_place(&self) -> Option<Place> {
        let places = self.state.places();
        locate(self.state.position(), &places).cloned()
    }
}
