//! 路线同步服务层
//!
//! 路线只在「在路上」状态下有意义。候选路线取总距离最短的一条，
//! 折线解码后以坐标数组持久化；持久化 / 清除 / 回读之间用一把
//! 互斥锁串行化，避免并发写出半套路线。

use crate::fomo::error::Result;
use crate::fomo::maps::DirectionsProvider;
use crate::fomo::route::listener::RouteListener;
use crate::fomo::route::polyline;
use crate::fomo::state::StateStore;
use crate::fomo::types::{LatLng, TravelMode};
use crate::fomo::user::api::UserApi;
use crate::fomo::user::models::ON_MY_WAY_DESCRIPTION;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 路线计算与持久化的同步服务
pub struct RouteService {
    users: UserApi,
    directions: Arc<dyn DirectionsProvider>,
    state: Arc<StateStore>,
    listener: Arc<dyn RouteListener>,
    route_mutex: Mutex<()>,
}

impl RouteService {
    pub fn new(
        users: UserApi,
        directions: Arc<dyn DirectionsProvider>,
        state: Arc<StateStore>,
        listener: Arc<dyn RouteListener>,
    ) -> Self {
        Self {
            users,
            directions,
            state,
            listener,
            route_mutex: Mutex::new(()),
        }
    }

    /// 出发去目的地
    ///
    /// 仅在「在路上」状态下生效；先清掉本地导航状态，再从本人
    /// 当前位置解析路线。解析成功则持久化并重申一次状态；
    /// 没有可用路线时静默保持为空
    pub async fn on_my_way(&self, destination: LatLng) -> Result<()> {
        if !self.state.status().is_on_my_way() {
            debug!("[RouteSync] 当前状态不是「在路上」，忽略路线请求");
            return Ok(());
        }

        self.state.set_navigation(None, None);
        let origin = self.state.position();
        let mode = self.state.mode();

        match self.resolve_route(origin, destination, mode).await {
            Some(route) => {
                self.persist_route(route, destination).await?;
            }
            None => {
                info!("[RouteSync] 没有可用路线，导航保持为空");
            }
        }

        // 重申一次状态，确保远端的 status 列与路线一致
        let statuses = self.state.statuses();
        if let Some(status) = statuses.iter().find(|s| s.description == ON_MY_WAY_DESCRIPTION) {
            let uid = self.state.uid();
            self.users.update_fields(&uid, json!({ "status": status.id })).await?;
        }
        Ok(())
    }

    /// 解析一条最短路线
    ///
    /// 服务商失败或没有候选都按「无路线」处理，只记日志不报错
    pub async fn resolve_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Option<Vec<LatLng>> {
        let candidates = match self.directions.routes(origin, destination, mode).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("[RouteSync] 路线查询失败: {:#}", e);
                return None;
            }
        };

        let best = candidates.into_iter().min_by_key(|c| c.distance_meters)?;
        debug!("[RouteSync] 选中最短候选: {} 米", best.distance_meters);

        match polyline::decode(&best.polyline) {
            Ok(points) if !points.is_empty() => Some(points),
            Ok(_) => None,
            Err(e) => {
                warn!("[RouteSync] 折线解码失败: {:#}", e);
                None
            }
        }
    }

    /// 持久化路线与目的地，刷新镜像并通知监听器
    pub async fn persist_route(&self, route: Vec<LatLng>, destination: LatLng) -> Result<()> {
        let _guard = self.route_mutex.lock().await;
        let uid = self.state.uid();
        self.users.set_route(&uid, &route, destination).await?;
        self.state.set_navigation(Some(route.clone()), Some(destination));
        self.listener.on_route_changed(Some(route), Some(destination)).await;
        info!("[RouteSync] ✅ 路线已持久化");
        Ok(())
    }

    /// 清除路线与目的地（到达或放弃导航）
    pub async fn clear_route(&self) -> Result<()> {
        let _guard = self.route_mutex.lock().await;
        let uid = self.state.uid();
        self.users.clear_route(&uid).await?;
        self.state.set_navigation(None, None);
        self.listener.on_route_changed(None, None).await;
        info!("[RouteSync] 路线已清除");
        Ok(())
    }

    /// 📡 回读持久化的路线（会话恢复时重新发布）
    pub async fn fetch_route(&self) -> Result<()> {
        let _guard = self.route_mutex.lock().await;
        let uid = self.state.uid();
        match self.users.get_route(&uid).await? {
            Some((route, destination)) => {
                self.state.set_navigation(Some(route.clone()), Some(destination));
                self.listener.on_route_changed(Some(route), Some(destination)).await;
            }
            None => {
                self.state.set_navigation(None, None);
                self.listener.on_route_changed(None, None).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fomo::maps::CandidateRoute;
    use crate::fomo::route::listener::EmptyRouteListener;
    use crate::fomo::store::MemoryStore;
    use crate::fomo::testutil::{init_test_logger, seed_user, seeded_store, signed_in_state};
    use crate::fomo::user::models::Status;
    use async_trait::async_trait;

    /// 返回固定候选集合的路线服务商
    struct FixedDirections(Vec<CandidateRoute>);

    #[async_trait]
    impl DirectionsProvider for FixedDirections {
        async fn routes(
            &self,
            _origin: LatLng,
            _destination: LatLng,
            _mode: TravelMode,
        ) -> anyhow::Result<Vec<CandidateRoute>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDirections;

    #[async_trait]
    impl DirectionsProvider for FailingDirections {
        async fn routes(
            &self,
            _origin: LatLng,
            _destination: LatLng,
            _mode: TravelMode,
        ) -> anyhow::Result<Vec<CandidateRoute>> {
            Err(anyhow::anyhow!("服务商超时"))
        }
    }

    fn candidate(distance: i64, route: &[LatLng]) -> CandidateRoute {
        CandidateRoute {
            distance_meters: distance,
            polyline: polyline::encode(route),
        }
    }

    async fn service_with(
        store: Arc<MemoryStore>,
        directions: Arc<dyn DirectionsProvider>,
    ) -> (RouteService, Arc<StateStore>) {
        let state = signed_in_state("u1");
        let svc = RouteService::new(
            UserApi::new(store),
            directions,
            state.clone(),
            Arc::new(EmptyRouteListener),
        );
        (svc, state)
    }

    fn on_my_way_status() -> Status {
        Status {
            id: 9,
            created_at: String::new(),
            description: ON_MY_WAY_DESCRIPTION.to_string(),
            emoji: "🏃".to_string(),
        }
    }

    #[tokio::test]
    async fn resolve_route_picks_minimum_distance_candidate() {
        init_test_logger();
        let short = vec![LatLng::new(43.47, -80.54), LatLng::new(43.48, -80.55)];
        let long = vec![LatLng::new(43.47, -80.54), LatLng::new(44.0, -81.0)];
        let directions = Arc::new(FixedDirections(vec![
            candidate(1200, &long),
            candidate(950, &short),
            candidate(3000, &long),
        ]));
        let (svc, _) = service_with(Arc::new(MemoryStore::new()), directions).await;

        let resolved = svc
            .resolve_route(short[0], short[1], TravelMode::Walking)
            .await
            .unwrap();
        assert_eq!(resolved, short);
    }

    #[tokio::test]
    async fn resolve_route_swallows_provider_failure() {
        init_test_logger();
        let (svc, _) = service_with(Arc::new(MemoryStore::new()), Arc::new(FailingDirections)).await;
        let origin = LatLng::new(43.47, -80.54);
        assert!(svc.resolve_route(origin, origin, TravelMode::Walking).await.is_none());

        let (svc, _) =
            service_with(Arc::new(MemoryStore::new()), Arc::new(FixedDirections(Vec::new()))).await;
        assert!(svc.resolve_route(origin, origin, TravelMode::Walking).await.is_none());
    }

    #[tokio::test]
    async fn on_my_way_is_noop_outside_the_status() {
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let directions = Arc::new(FixedDirections(vec![candidate(
            100,
            &[LatLng::new(43.47, -80.54), LatLng::new(43.48, -80.55)],
        )]));
        let (svc, state) = service_with(store.clone(), directions).await;

        // 默认状态是「空闲」，路线请求被忽略
        svc.on_my_way(LatLng::new(43.48, -80.55)).await.unwrap();
        assert!(state.route().is_none());
        assert!(UserApi::new(store).get_route("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn on_my_way_persists_the_minimum_route() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let short = vec![LatLng::new(43.47, -80.54), LatLng::new(43.48, -80.55)];
        let long = vec![LatLng::new(43.47, -80.54), LatLng::new(44.0, -81.0)];
        let directions = Arc::new(FixedDirections(vec![
            candidate(2000, &long),
            candidate(800, &short),
        ]));
        let (svc, state) = service_with(store.clone(), directions).await;

        state.set_position(LatLng::new(43.47, -80.54));
        state.set_status(on_my_way_status());
        state.replace_statuses(vec![Status::default_idle(), on_my_way_status()]);

        let destination = LatLng::new(43.48, -80.55);
        svc.on_my_way(destination).await.unwrap();

        assert_eq!(state.route(), Some(short.clone()));
        assert_eq!(state.destination(), Some(destination));
        assert!(state.status().is_on_my_way());

        let api = UserApi::new(store);
        let (stored_route, stored_destination) = api.get_route("u1").await.unwrap().unwrap();
        assert_eq!(stored_route, short);
        assert_eq!(stored_destination, destination);
        // 状态列被重申为「在路上」
        assert_eq!(api.get_by_uid("u1").await.unwrap().status_id, 9);
    }

    #[tokio::test]
    async fn on_my_way_with_no_candidates_leaves_navigation_empty() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let (svc, state) = service_with(store.clone(), Arc::new(FixedDirections(Vec::new()))).await;

        state.set_status(on_my_way_status());
        state.replace_statuses(vec![on_my_way_status()]);
        svc.on_my_way(LatLng::new(43.48, -80.55)).await.unwrap();

        assert!(state.route().is_none());
        assert!(state.destination().is_none());
        assert!(UserApi::new(store).get_route("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_then_fetch_round_trip() {
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let (svc, state) = service_with(store.clone(), Arc::new(FixedDirections(Vec::new()))).await;

        let route = vec![LatLng::new(43.47, -80.54), LatLng::new(43.48, -80.55)];
        let destination = LatLng::new(43.48, -80.55);
        svc.persist_route(route.clone(), destination).await.unwrap();

        // 重建一个空镜像，模拟会话恢复
        let (svc2, state2) = service_with(store, Arc::new(FixedDirections(Vec::new()))).await;
        svc2.fetch_route().await.unwrap();
        assert_eq!(state2.route(), Some(route));
        assert_eq!(state2.destination(), Some(destination));

        svc.clear_route().await.unwrap();
        svc2.fetch_route().await.unwrap();
        assert!(state2.route().is_none());
        assert!(state.route().is_none());
    }
}
