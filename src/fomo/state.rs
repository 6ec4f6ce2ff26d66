//! 本地状态镜像（State Store）
//!
//! 远端存储是唯一的事实来源，这里只保存各集合的本地镜像。
//! 每个字段只支持整体替换，不做部分合并；并发下「最后一次拉取获胜」。
//! 登录标志是一个 watch 通道，同步引擎与宿主都可以订阅它。

use crate::fomo::group::models::Group;
use crate::fomo::place::models::Place;
use crate::fomo::types::{LatLng, TravelMode};
use crate::fomo::user::models::{Status, User};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// 默认地图中心（滑铁卢）
const DEFAULT_CENTER: LatLng = LatLng {
    latitude: 43.4723,
    longitude: -80.5449,
};

#[derive(Debug, Clone)]
struct Mirror {
    uid: String,
    display_name: String,
    username: String,
    email: String,
    avatar_url: Option<String>,
    latitude: f64,
    longitude: f64,
    center: LatLng,
    status: Status,
    statuses: Vec<Status>,
    friends: Vec<User>,
    friend_requests: Vec<User>,
    group_members: Vec<User>,
    groups: Vec<Group>,
    group_requests: Vec<Group>,
    places: Vec<Place>,
    destination: Option<LatLng>,
    route: Option<Vec<LatLng>>,
    mode: TravelMode,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            uid: String::new(),
            display_name: String::new(),
            username: String::new(),
            email: String::new(),
            avatar_url: None,
            latitude: 0.0,
            longitude: 0.0,
            center: DEFAULT_CENTER,
            status: Status::default_idle(),
            statuses: Vec::new(),
            friends: Vec::new(),
            friend_requests: Vec::new(),
            group_members: Vec::new(),
            groups: Vec::new(),
            group_requests: Vec::new(),
            places: Vec::new(),
            destination: None,
            route: None,
            mode: TravelMode::Walking,
        }
    }
}

/// 状态镜像容器
pub struct StateStore {
    inner: RwLock<Mirror>,
    signed_in_tx: watch::Sender<bool>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (signed_in_tx, _rx) = watch::channel(false);
        Self {
            inner: RwLock::new(Mirror::default()),
            signed_in_tx,
        }
    }

    // 镜像字段整体替换，不存在半更新状态；锁中毒时直接继续使用内部数据
    fn read(&self) -> RwLockReadGuard<'_, Mirror> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Mirror> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // ---- 登录标志 ----

    pub fn signed_in(&self) -> bool {
        *self.signed_in_tx.borrow()
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.signed_in_tx.send_replace(signed_in);
    }

    /// 订阅登录标志的变化（同步引擎的驱动信号）
    pub fn subscribe_signed_in(&self) -> watch::Receiver<bool> {
        self.signed_in_tx.subscribe()
    }

    // ---- 本人资料 ----

    pub fn uid(&self) -> String {
        self.read().uid.clone()
    }

    pub fn set_uid(&self, uid: &str) {
        self.write().uid = uid.to_string();
    }

    pub fn display_name(&self) -> String {
        self.read().display_name.clone()
    }

    pub fn set_display_name(&self, value: &str) {
        self.write().display_name = value.to_string();
    }

    pub fn username(&self) -> String {
        self.read().username.clone()
    }

    pub fn set_username(&self, value: &str) {
        self.write().username = value.to_string();
    }

    pub fn email(&self) -> String {
        self.read().email.clone()
    }

    pub fn set_email(&self, value: &str) {
        self.write().email = value.to_string();
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.read().avatar_url.clone()
    }

    pub fn set_avatar_url(&self, url: Option<String>) {
        self.write().avatar_url = url;
    }

    // ---- 位置 ----

    pub fn position(&self) -> LatLng {
        let guard = self.read();
        LatLng::new(guard.latitude, guard.longitude)
    }

    /// 更新本人坐标并把地图中心移动过去
    pub fn set_position(&self, position: LatLng) {
        let mut guard = self.write();
        guard.latitude = position.latitude;
        guard.longitude = position.longitude;
        guard.center = position;
    }

    pub fn center(&self) -> LatLng {
        self.read().center
    }

    // ---- 状态 ----

    pub fn status(&self) -> Status {
        self.read().status.clone()
    }

    pub fn set_status(&self, status: Status) {
        self.write().status = status;
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.read().statuses.clone()
    }

    pub fn replace_statuses(&self, statuses: Vec<Status>) {
        self.write().statuses = statuses;
    }

    // ---- 好友 ----

    pub fn friends(&self) -> Vec<User> {
        self.read().friends.clone()
    }

    pub fn replace_friends(&self, friends: Vec<User>) {
        self.write().friends = friends;
    }

    pub fn friend_requests(&self) -> Vec<User> {
        self.read().friend_requests.clone()
    }

    pub fn replace_friend_requests(&self, requests: Vec<User>) {
        self.write().friend_requests = requests;
    }

    // ---- 群组 ----

    pub fn groups(&self) -> Vec<Group> {
        self.read().groups.clone()
    }

    pub fn replace_groups(&self, groups: Vec<Group>) {
        self.write().groups = groups;
    }

    pub fn group_requests(&self) -> Vec<Group> {
        self.read().group_requests.clone()
    }

    pub fn replace_group_requests(&self, requests: Vec<Group>) {
        self.write().group_requests = requests;
    }

    pub fn group_members(&self) -> Vec<User> {
        self.read().group_members.clone()
    }

    pub fn replace_group_members(&self, members: Vec<User>) {
        self.write().group_members = members;
    }

    // ---- 地点 ----

    pub fn places(&self) -> Vec<Place> {
        self.read().places.clone()
    }

    pub fn replace_places(&self, places: Vec<Place>) {
        self.write().places = places;
    }

    // ---- 路线 ----

    pub fn destination(&self) -> Option<LatLng> {
        self.read().destination
    }

    pub fn route(&self) -> Option<Vec<LatLng>> {
        self.read().route.clone()
    }

    /// 路线与目的地成对替换（清除时两者同时置空）
    pub fn set_navigation(&self, route: Option<Vec<LatLng>>, destination: Option<LatLng>) {
        let mut guard = self.write();
        guard.route = route;
        guard.destination = destination;
    }

    pub fn mode(&self) -> TravelMode {
        self.read().mode
    }

    pub fn set_mode(&self, mode: TravelMode) {
        self.write().mode = mode;
    }

    /// 退出登录时恢复所有字段的默认值（登录标志单独管理）
    pub fn reset(&self) {
        *self.write() = Mirror::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_wholesale() {
        let state = StateStore::new();
        state.replace_statuses(vec![Status::default_idle()]);
        assert_eq!(state.statuses().len(), 1);
        state.replace_statuses(Vec::new());
        assert!(state.statuses().is_empty());
    }

    #[test]
    fn set_position_moves_center() {
        let state = StateStore::new();
        assert_eq!(state.center(), DEFAULT_CENTER);
        let here = LatLng::new(43.0, -80.0);
        state.set_position(here);
        assert_eq!(state.position(), here);
        assert_eq!(state.center(), here);
    }

    #[test]
    fn reset_restores_defaults_but_keeps_watch() {
        let state = StateStore::new();
        state.set_uid("u1");
        state.set_signed_in(true);
        state.set_navigation(Some(vec![LatLng::new(1.0, 2.0)]), Some(LatLng::new(1.0, 2.0)));

        state.reset();
        assert!(state.uid().is_empty());
        assert!(state.route().is_none());
        assert!(state.destination().is_none());
        // reset 不触碰登录标志
        assert!(state.signed_in());
    }

    #[tokio::test]
    async fn signed_in_watch_notifies_subscribers() {
        let state = StateStore::new();
        let mut rx = state.subscribe_signed_in();
        assert!(!*rx.borrow());
        state.set_signed_in(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
