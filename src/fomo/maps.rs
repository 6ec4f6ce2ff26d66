//! 地图服务商接入（路线规划与反向地理编码）
//!
//! 服务商边界用两个窄契约隔离：路线规划返回候选路线集合，
//! 反向地理编码返回 place_id。HTTP 细节全部留在本模块内。

use crate::fomo::types::{LatLng, TravelMode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// 一条候选路线：总距离与编码折线
#[derive(Debug, Clone)]
pub struct CandidateRoute {
    /// 所有路段距离之和（米）
    pub distance_meters: i64,
    /// 服务商的编码折线（polyline）
    pub polyline: String,
}

/// 路线规划契约
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// 查询从 origin 到 destination 的候选路线，可能为空
    async fn routes(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Result<Vec<CandidateRoute>>;
}

/// 反向地理编码契约
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// 坐标处最近的街道地址的 place_id，没有命中时为 None
    async fn place_id(&self, coords: LatLng) -> Result<Option<String>>;
}

/// Google Maps Web 服务客户端
pub struct GoogleMapsApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// ---- Directions 响应 ----

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
    overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: LegDistance,
}

#[derive(Debug, Deserialize)]
struct LegDistance {
    value: i64,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}

// ---- Geocode 响应 ----

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    place_id: String,
}

impl GoogleMapsApi {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: "https://maps.googleapis.com".to_string(),
        }
    }

    /// 测试用：指向本地替身服务
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DirectionsProvider for GoogleMapsApi {
    async fn routes(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Result<Vec<CandidateRoute>> {
        let operation_id = Uuid::new_v4().to_string();
        debug!(
            "[Maps] 📡 查询候选路线: mode={} operationID={}",
            mode.as_str(),
            operation_id
        );

        let url = format!("{}/maps/api/directions/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("origin", format!("{},{}", origin.latitude, origin.longitude)),
                (
                    "destination",
                    format!("{},{}", destination.latitude, destination.longitude),
                ),
                ("mode", mode.as_str().to_string()),
                ("alternatives", "true".to_string()),
                ("key", self.api_key.clone()),
            ])
            .header("operationID", &operation_id)
            .send()
            .await
            .context("请求 Directions API 失败")?
            .error_for_status()
            .context("Directions API 返回错误状态")?
            .json::<DirectionsResponse>()
            .await
            .context("解析 Directions 响应失败")?;

        let candidates = response
            .routes
            .into_iter()
            .map(|route| CandidateRoute {
                distance_meters: route.legs.iter().map(|leg| leg.distance.value).sum(),
                polyline: route.overview_polyline.points,
            })
            .collect::<Vec<_>>();
        debug!("[Maps] 收到 {} 条候选路线", candidates.len());
        Ok(candidates)
    }
}

#[async_trait]
impl Geocoder for GoogleMapsApi {
    async fn place_id(&self, coords: LatLng) -> Result<Option<String>> {
        let url = format!("{}/maps/api/geocode/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latlng", format!("{},{}", coords.latitude, coords.longitude)),
                ("location_type", "ROOFTOP".to_string()),
                ("result_type", "street_address".to_string()),
                ("key", self.api_key.clone()),
            ])
            .header("operationID", Uuid::new_v4().to_string())
            .send()
            .await
            .context("请求 Geocode API 失败")?
            .error_for_status()
            .context("Geocode API 返回错误状态")?
            .json::<GeocodeResponse>()
            .await
            .context("解析 Geocode 响应失败")?;

        Ok(response.results.into_iter().next().map(|r| r.place_id))
    }
}
