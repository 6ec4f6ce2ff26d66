//! FOMO 客户端核心实现模块
//!
//! 聚合各域的同步服务，驱动登录会话与周期同步循环。

use crate::fomo::auth;
use crate::fomo::error::{Result, SyncError};
use crate::fomo::friend::{EmptyFriendListener, FriendListener, FriendService, FriendshipApi};
use crate::fomo::group::{EmptyGroupListener, GroupListener, GroupService, GroupApi};
use crate::fomo::location::{LocationProvider, NoLocation};
use crate::fomo::maps::{DirectionsProvider, Geocoder, GoogleMapsApi};
use crate::fomo::place::{EmptyPlaceListener, PlaceListener, PlaceService, PlaceApi};
use crate::fomo::route::{EmptyRouteListener, RouteListener, RouteService};
use crate::fomo::state::StateStore;
use crate::fomo::store::{PostgrestStore, TableStore};
use crate::fomo::types::{LatLng, TravelMode};
use crate::fomo::user::{ProfileService, User, UserApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 远端存储基础地址
    pub store_base_url: String,
    /// 远端存储的 API key
    pub store_api_key: String,
    /// 地图服务商的 API key
    pub maps_api_key: String,
    /// 周期同步间隔
    pub sync_interval: Duration,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(store_base_url: String, store_api_key: String, maps_api_key: String) -> Self {
        Self {
            store_base_url,
            store_api_key,
            maps_api_key,
            sync_interval: Duration::from_secs(5),
        }
    }
}

/// FOMO 客户端
///
/// 登录后持有各域的同步服务；登出时同步循环停止、镜像清空。
#[derive(Clone)]
pub struct FomoClient {
    pub(crate) config: ClientConfig,
    state: Arc<StateStore>,
    location: Arc<dyn LocationProvider>,
    // 监听器（可由调用方注册）
    friend_listener: Arc<dyn FriendListener>,
    group_listener: Arc<dyn GroupListener>,
    place_listener: Arc<dyn PlaceListener>,
    route_listener: Arc<dyn RouteListener>,
    // 会话期协作方（登录后注入）
    store: Option<Arc<dyn TableStore>>,
    directions: Option<Arc<dyn DirectionsProvider>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    // 各域同步服务
    profile_service: Option<Arc<ProfileService>>,
    friend_service: Option<Arc<FriendService>>,
    group_service: Option<Arc<GroupService>>,
    place_service: Option<Arc<PlaceService>>,
    route_service: Option<Arc<RouteService>>,
    // 同步循环任务句柄，登出时中止
    sync_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl FomoClient {
    /// 创建新的客户端
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: Arc::new(StateStore::new()),
            location: Arc::new(NoLocation),
            friend_listener: Arc::new(EmptyFriendListener),
            group_listener: Arc::new(EmptyGroupListener),
            place_listener: Arc::new(EmptyPlaceListener),
            route_listener: Arc::new(EmptyRouteListener),
            store: None,
            directions: None,
            geocoder: None,
            profile_service: None,
            friend_service: None,
            group_service: None,
            place_service: None,
            route_service: None,
            sync_task: Arc::new(Mutex::new(None)),
        }
    }

    /// 本地状态镜像（只读访问入口）
    pub fn state(&self) -> Arc<StateStore> {
        self.state.clone()
    }

    /// 注入定位源（宿主平台实现）
    pub fn set_location_provider(&mut self, provider: Arc<dyn LocationProvider>) {
        self.location = provider;
    }

    // ---- 监听器注册：服务已存在时用新监听器重建，保持回调一致 ----

    pub fn set_friend_listener(&mut self, listener: Arc<dyn FriendListener>) {
        self.friend_listener = listener;
        self.rebuild_services();
    }

    pub fn set_group_listener(&mut self, listener: Arc<dyn GroupListener>) {
        self.group_listener = listener;
        self.rebuild_services();
    }

    pub fn set_place_listener(&mut self, listener: Arc<dyn PlaceListener>) {
        self.place_listener = listener;
        self.rebuild_services();
    }

    pub fn set_route_listener(&mut self, listener: Arc<dyn RouteListener>) {
        self.route_listener = listener;
        self.rebuild_services();
    }

    fn rebuild_services(&mut self) {
        let (Some(store), Some(directions), Some(geocoder)) =
            (self.store.clone(), self.directions.clone(), self.geocoder.clone())
        else {
            return;
        };
        self.build_services(store, directions, geocoder);
    }

    fn build_services(
        &mut self,
        store: Arc<dyn TableStore>,
        directions: Arc<dyn DirectionsProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) {
        let users = UserApi::new(store.clone());
        self.profile_service = Some(Arc::new(ProfileService::new(
            users.clone(),
            self.state.clone(),
            &self.config.store_base_url,
        )));
        self.friend_service = Some(Arc::new(FriendService::new(
            FriendshipApi::new(store.clone()),
            users.clone(),
            self.state.clone(),
            self.friend_listener.clone(),
        )));
        self.group_service = Some(Arc::new(GroupService::new(
            GroupApi::new(store.clone()),
            users.clone(),
            self.state.clone(),
            self.group_listener.clone(),
        )));
        self.place_service = Some(Arc::new(PlaceService::new(
            PlaceApi::new(store.clone()),
            geocoder.clone(),
            self.state.clone(),
            self.place_listener.clone(),
        )));
        self.route_service = Some(Arc::new(RouteService::new(
            users,
            directions.clone(),
            self.state.clone(),
            self.route_listener.clone(),
        )));
        self.store = Some(store);
        self.directions = Some(directions);
        self.geocoder = Some(geocoder);
    }

    /// 绑定会话协作方并构建各域服务（登录流程与测试注入共用）
    pub fn attach_session(
        &mut self,
        uid: &str,
        store: Arc<dyn TableStore>,
        directions: Arc<dyn DirectionsProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) {
        self.state.set_uid(uid);
        self.build_services(store, directions, geocoder);
        self.state.set_signed_in(true);
    }

    /// 注册新账号并写入初始的用户行
    pub async fn sign_up(&mut self, email: &str, password: &str, display_name: &str) -> Result<()> {
        let session = auth::sign_up_async(
            &self.config.store_base_url,
            &self.config.store_api_key,
            email,
            password,
        )
        .await?;

        let store: Arc<dyn TableStore> = Arc::new(PostgrestStore::new(
            self.config.store_base_url.clone(),
            &self.config.store_api_key,
            &session.access_token,
        )?);
        let user = User {
            uid: session.user.id.clone(),
            created_at: crate::fomo::types::timestamp_now(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            username: display_name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            status_id: 1,
            route: None,
            destination_latitude: None,
            destination_longitude: None,
        };
        UserApi::new(store).insert(&user).await?;
        info!("[Client] ✅ 注册完成: uid={}", session.user.id);
        Ok(())
    }

    /// 登录并启动会话
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let session = auth::sign_in_async(
            &self.config.store_base_url,
            &self.config.store_api_key,
            email,
            password,
        )
        .await?;

        let store: Arc<dyn TableStore> = Arc::new(PostgrestStore::new(
            self.config.store_base_url.clone(),
            &self.config.store_api_key,
            &session.access_token,
        )?);
        let maps = Arc::new(GoogleMapsApi::new(&self.config.maps_api_key));
        let directions: Arc<dyn DirectionsProvider> = maps.clone();
        let geocoder: Arc<dyn Geocoder> = maps;

        self.attach_session(&session.user.id, store, directions, geocoder);
        self.bootstrap().await;
        self.start_sync().await;
        Ok(())
    }

    /// 首次全量拉取；单项失败只记日志，不阻断会话建立
    pub async fn bootstrap(&self) {
        info!("[Client] 🔄 开始首次全量同步");
        if let Some(profile) = &self.profile_service {
            if let Err(e) = profile.fetch_profile().await {
                error!("[Client] ❌ 拉取本人资料失败: {e}");
            }
        }
        if let Some(route) = &self.route_service {
            if let Err(e) = route.fetch_route().await {
                error!("[Client] ❌ 回读路线失败: {e}");
            }
        }
        if let Some(friends) = &self.friend_service {
            if let Err(e) = friends.fetch_friends().await {
                error!("[Client] ❌ 拉取好友失败: {e}");
            }
        }
        if let Some(places) = &self.place_service {
            if let Err(e) = places.fetch_places().await {
                error!("[Client] ❌ 拉取地点失败: {e}");
            }
        }
        if let Some(groups) = &self.group_service {
            if let Err(e) = groups.fetch_groups().await {
                error!("[Client] ❌ 拉取群组失败: {e}");
            }
        }
        info!("[Client] ✅ 首次全量同步完成");
    }

    /// 启动周期同步循环
    ///
    /// 每个节拍依次刷新好友 / 地点 / 群组，并上报定位源的最新位置；
    /// 单项失败只记日志。登录标志翻为 false 时循环退出
    pub async fn start_sync(&self) {
        let Some(friends) = self.friend_service.clone() else {
            return;
        };
        let Some(places) = self.place_service.clone() else {
            return;
        };
        let Some(groups) = self.group_service.clone() else {
            return;
        };
        let Some(profile) = self.profile_service.clone() else {
            return;
        };
        let location = self.location.clone();
        let signed_in = self.state.subscribe_signed_in();
        let sync_interval = self.config.sync_interval;

        let handle = tokio::spawn(async move {
            info!("[Client] 🔄 启动周期同步循环 ({:?})", sync_interval);
            let mut ticker = interval(sync_interval);
            loop {
                ticker.tick().await;
                if !*signed_in.borrow() {
                    info!("[Client] 周期同步循环退出（已登出）");
                    break;
                }

                if let Err(e) = friends.fetch_friends().await {
                    warn!("[Client] 同步好友失败: {e}");
                }
                if let Err(e) = places.fetch_places().await {
                    warn!("[Client] 同步地点失败: {e}");
                }
                if let Err(e) = groups.fetch_groups().await {
                    warn!("[Client] 同步群组失败: {e}");
                }

                match location.last_known().await {
                    Ok(Some(position)) => {
                        if let Err(e) = profile.update_location(position).await {
                            warn!("[Client] 上报位置失败: {e}");
                        }
                    }
                    Ok(None) => debug!("[Client] 定位源暂无位置"),
                    Err(e) => warn!("[Client] 读取定位源失败: {e}"),
                }
            }
        });

        let mut slot = self.sync_task.lock().await;
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// 登出：停止同步循环并清空本地镜像
    pub async fn sign_out(&mut self) {
        self.state.set_signed_in(false);
        if let Some(handle) = self.sync_task.lock().await.take() {
            handle.abort();
        }
        self.state.reset();
        self.store = None;
        self.directions = None;
        self.geocoder = None;
        self.profile_service = None;
        self.friend_service = None;
        self.group_service = None;
        self.place_service = None;
        self.route_service = None;
        info!("[Client] 👋 已登出");
    }

    // ---- 好友操作 ----

    pub async fn create_friend_request(&self, username: &str) -> Result<()> {
        self.friends()?.create_request(username).await
    }

    pub async fn accept_friend_request(&self, requester_uid: &str) -> Result<()> {
        self.friends()?.accept_request(requester_uid).await
    }

    pub async fn decline_friend_request(&self, requester_uid: &str) -> Result<()> {
        self.friends()?.decline_request(requester_uid).await
    }

    pub async fn remove_friend(&self, username: &str) -> Result<()> {
        self.friends()?.remove_friend(username).await
    }

    // ---- 群组操作 ----

    pub async fn create_group(&self, name: &str) -> Result<()> {
        self.groups()?.create_group(name).await
    }

    pub async fn create_group_request(&self, group_id: i64, username: &str) -> Result<()> {
        self.groups()?.create_group_request(group_id, username).await
    }

    pub async fn accept_group_request(&self, group_id: i64) -> Result<()> {
        self.groups()?.accept_group_request(group_id).await
    }

    pub async fn decline_group_request(&self, group_id: i64) -> Result<()> {
        self.groups()?.decline_group_request(group_id).await
    }

    pub async fn leave_group(&self, group_id: i64) -> Result<()> {
        self.groups()?.remove_group(group_id).await
    }

    pub async fn group_members(&self, group_id: i64) -> Result<Vec<User>> {
        let service = self.groups()?;
        service.fetch_groups().await?;
        service.group_members(group_id).await
    }

    // ---- 地点操作 ----

    pub async fn create_place(
        &self,
        name: &str,
        coords: Option<LatLng>,
        radius: Option<f64>,
    ) -> Result<()> {
        self.places()?.create_place(name, coords, radius).await
    }

    pub async fn remove_place(&self, id: i64) -> Result<()> {
        self.places()?.remove_place(id).await
    }

    pub async fn place_id_at(&self, coords: LatLng) -> Result<Option<String>> {
        Ok(self.places()?.place_id_at(coords).await)
    }

    // ---- 路线操作 ----

    pub async fn on_my_way(&self, destination: LatLng) -> Result<()> {
        self.routes()?.on_my_way(destination).await
    }

    pub async fn clear_route(&self) -> Result<()> {
        self.routes()?.clear_route().await
    }

    pub fn set_travel_mode(&self, mode: TravelMode) {
        self.state.set_mode(mode);
    }

    // ---- 资料操作 ----

    pub async fn update_display_name(&self, display_name: &str) -> Result<()> {
        self.profile()?.update_display_name(display_name).await
    }

    pub async fn update_email(&self, email: &str) -> Result<()> {
        self.profile()?.update_email(email).await
    }

    pub async fn update_username(&self, username: &str) -> Result<()> {
        self.profile()?.update_username(username).await
    }

    pub async fn update_status(&self, description: &str) -> Result<()> {
        self.profile()?.update_status(description).await
    }

    pub async fn update_location(&self, position: LatLng) -> Result<()> {
        self.profile()?.update_location(position).await
    }

    // ---- 服务访问守卫：未登录时一律报 NotSignedIn ----

    fn friends(&self) -> Result<&Arc<FriendService>> {
        self.friend_service.as_ref().ok_or(SyncError::NotSignedIn)
    }

    fn groups(&self) -> Result<&Arc<GroupService>> {
        self.group_service.as_ref().ok_or(SyncError::NotSignedIn)
    }

    fn places(&self) -> Result<&Arc<PlaceService>> {
        self.place_service.as_ref().ok_or(SyncError::NotSignedIn)
    }

    fn routes(&self) -> Result<&Arc<RouteService>> {
        self.route_service.as_ref().ok_or(SyncError::NotSignedIn)
    }

    fn profile(&self) -> Result<&Arc<ProfileService>> {
        self.profile_service.as_ref().ok_or(SyncError::NotSignedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fomo::maps::CandidateRoute;
    use crate::fomo::store::MemoryStore;
    use crate::fomo::testutil::{init_test_logger, seed_user, seeded_store};
    use async_trait::async_trait;

    struct NoDirections;

    #[async_trait]
    impl DirectionsProvider for NoDirections {
        async fn routes(
            &self,
            _origin: LatLng,
            _destination: LatLng,
            _mode: TravelMode,
        ) -> anyhow::Result<Vec<CandidateRoute>> {
            Ok(Vec::new())
        }
    }

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn place_id(&self, _coords: LatLng) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    fn test_config() -> ClientConfig {
        let mut config = ClientConfig::new(
            "http://store.local".to_string(),
            "anon-key".to_string(),
            "maps-key".to_string(),
        );
        config.sync_interval = Duration::from_millis(10);
        config
    }

    fn attached_client(store: Arc<MemoryStore>, uid: &str) -> FomoClient {
        let mut client = FomoClient::new(test_config());
        client.attach_session(uid, store, Arc::new(NoDirections), Arc::new(NoGeocoder));
        client
    }

    #[tokio::test]
    async fn operations_require_a_session() {
        let client = FomoClient::new(test_config());
        assert!(matches!(
            client.create_friend_request("bob").await,
            Err(SyncError::NotSignedIn)
        ));
        assert!(matches!(client.create_group("g").await, Err(SyncError::NotSignedIn)));
        assert!(matches!(client.clear_route().await, Err(SyncError::NotSignedIn)));
    }

    #[tokio::test]
    async fn bootstrap_populates_the_mirror() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let client = attached_client(store, "u1");

        client.bootstrap().await;
        let state = client.state();
        assert_eq!(state.username(), "alice");
        assert_eq!(state.statuses().len(), 3);
        assert!(state.signed_in());
    }

    #[tokio::test]
    async fn sign_out_stops_the_session() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let mut client = attached_client(store, "u1");
        client.bootstrap().await;
        client.start_sync().await;

        client.sign_out().await;
        let state = client.state();
        assert!(!state.signed_in());
        assert!(state.uid().is_empty());
        assert!(matches!(
            client.create_friend_request("bob").await,
            Err(SyncError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn sync_loop_publishes_location_fixes() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let here = LatLng::new(43.46, -80.52);

        let mut client = FomoClient::new(test_config());
        client.set_location_provider(Arc::new(crate::fomo::location::FixedLocation(here)));
        client.attach_session("u1", store.clone(), Arc::new(NoDirections), Arc::new(NoGeocoder));
        client.start_sync().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        client.sign_out().await;

        let user = UserApi::new(store).get_by_uid("u1").await.unwrap();
        assert_eq!(user.position(), here);
    }

    #[tokio::test]
    async fn friend_flow_through_the_client() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "a", "alice").await;
        seed_user(&store, "b", "bob").await;

        let alice = attached_client(store.clone(), "a");
        let bob = attached_client(store, "b");

        alice.create_friend_request("bob").await.unwrap();
        bob.accept_friend_request("a").await.unwrap();
        assert_eq!(bob.state().friends().len(), 1);

        alice.bootstrap().await;
        assert_eq!(alice.state().friends().len(), 1);
    }
}
