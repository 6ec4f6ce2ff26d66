//! 个人资料同步服务层

use crate::fomo::error::{Result, SyncError};
use crate::fomo::state::StateStore;
use crate::fomo::types::LatLng;
use crate::fomo::user::api::UserApi;
use crate::fomo::user::models::Status;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// 本人资料与状态目录的同步服务
#[derive(Clone)]
pub struct ProfileService {
    api: UserApi,
    state: Arc<StateStore>,
    storage_base_url: String,
}

impl ProfileService {
    pub fn new(api: UserApi, state: Arc<StateStore>, storage_base_url: &str) -> Self {
        Self {
            api,
            state,
            storage_base_url: storage_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 头像的公开访问地址（对象存储按 uid 存放）
    pub fn avatar_url(&self, uid: &str) -> String {
        format!(
            "{}/storage/v1/object/public/profile-pictures/{}.jpg",
            self.storage_base_url, uid
        )
    }

    /// 📡 拉取状态目录与本人资料，刷新本地镜像
    pub async fn fetch_profile(&self) -> Result<()> {
        let uid = self.state.uid();
        debug!("[Profile] 拉取本人资料: uid={}", uid);

        let statuses = self.api.list_statuses().await?;
        let user = self.api.get_by_uid(&uid).await?;

        // 状态 id 在目录中找不到时回退为占位的「空闲」
        let status = statuses
            .iter()
            .find(|s| s.id == user.status_id)
            .cloned()
            .unwrap_or_else(Status::default_idle);

        self.state.replace_statuses(statuses);
        self.state.set_display_name(&user.display_name);
        self.state.set_username(&user.username);
        self.state.set_email(&user.email);
        self.state.set_status(status);
        self.state.set_avatar_url(Some(self.avatar_url(&uid)));
        Ok(())
    }

    /// 修改显示名（先写远端，成功后更新镜像）
    pub async fn update_display_name(&self, display_name: &str) -> Result<()> {
        let uid = self.state.uid();
        self.api
            .update_fields(&uid, json!({ "display_name": display_name }))
            .await?;
        self.state.set_display_name(display_name);
        info!("[Profile] ✅ 显示名已更新: {}", display_name);
        Ok(())
    }

    /// 修改邮箱
    pub async fn update_email(&self, email: &str) -> Result<()> {
        let uid = self.state.uid();
        self.api.update_fields(&uid, json!({ "email": email })).await?;
        self.state.set_email(email);
        Ok(())
    }

    /// 修改用户名
    pub async fn update_username(&self, username: &str) -> Result<()> {
        let uid = self.state.uid();
        self.api.update_fields(&uid, json!({ "username": username })).await?;
        self.state.set_username(username);
        Ok(())
    }

    /// 按描述切换本人状态，目录中不存在该状态时报 NotFound
    pub async fn update_status(&self, description: &str) -> Result<()> {
        let statuses = self.state.statuses();
        let status = statuses
            .iter()
            .find(|s| s.description == description)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("状态 {description}")))?;

        let uid = self.state.uid();
        self.api.update_fields(&uid, json!({ "status": status.id })).await?;
        info!("[Profile] 状态切换为 {} {}", status.emoji, status.description);
        self.state.set_status(status);
        Ok(())
    }

    /// 上报本人坐标并刷新镜像中的位置与地图中心
    pub async fn update_location(&self, position: LatLng) -> Result<()> {
        let uid = self.state.uid();
        self.api
            .update_fields(
                &uid,
                json!({ "latitude": position.latitude, "longitude": position.longitude }),
            )
            .await?;
        self.state.set_position(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fomo::testutil::{init_test_logger, seed_user, seeded_store, signed_in_state};
    use crate::fomo::user::models::IDLE_DESCRIPTION;

    fn service(store: Arc<crate::fomo::store::MemoryStore>, state: Arc<StateStore>) -> ProfileService {
        ProfileService::new(UserApi::new(store), state, "http://store.local")
    }

    #[tokio::test]
    async fn fetch_profile_resolves_status_from_catalog() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let state = signed_in_state("u1");
        let svc = service(store, state.clone());

        svc.fetch_profile().await.unwrap();
        assert_eq!(state.username(), "alice");
        assert_eq!(state.status().description, "Chilling");
        assert_eq!(state.statuses().len(), 3);
        assert_eq!(
            state.avatar_url().as_deref(),
            Some("http://store.local/storage/v1/object/public/profile-pictures/u1.jpg")
        );
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_description() {
        init_test_logger();
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let state = signed_in_state("u1");
        let svc = service(store, state.clone());
        svc.fetch_profile().await.unwrap();

        svc.update_status(IDLE_DESCRIPTION).await.unwrap();
        assert_eq!(state.status().description, IDLE_DESCRIPTION);

        assert!(matches!(
            svc.update_status("Sleeping").await,
            Err(SyncError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_location_moves_mirror_position() {
        let store = seeded_store().await;
        seed_user(&store, "u1", "alice").await;
        let state = signed_in_state("u1");
        let svc = service(store.clone(), state.clone());

        let here = LatLng::new(43.46, -80.52);
        svc.update_location(here).await.unwrap();
        assert_eq!(state.position(), here);
        assert_eq!(state.center(), here);

        let user = UserApi::new(store).get_by_uid("u1").await.unwrap();
        assert_eq!(user.position(), here);
    }
}
