//! 好友同步服务层
//!
//! 好友关系是一张无序对表：一对用户之间最多一行，方向只区分
//! 请求发起方。两人互发请求时不会产生第二行，而是把已有行
//! 直接升级为已接受。

use crate::fomo::error::{Result, SyncError};
use crate::fomo::friend::api::FriendshipApi;
use crate::fomo::friend::listener::FriendListener;
use crate::fomo::state::StateStore;
use crate::fomo::user::api::UserApi;
use std::sync::Arc;
use tracing::{debug, info};

/// 好友请求与好友列表的同步服务
#[derive(Clone)]
pub struct FriendService {
    api: FriendshipApi,
    users: UserApi,
    state: Arc<StateStore>,
    listener: Arc<dyn FriendListener>,
}

impl FriendService {
    pub fn new(
        api: FriendshipApi,
        users: UserApi,
        state: Arc<StateStore>,
        listener: Arc<dyn FriendListener>,
    ) -> Self {
        Self {
            api,
            users,
            state,
            listener,
        }
    }

    /// 按用户名发送好友请求
    ///
    /// 对方已有指向我的待处理请求时直接合并为好友关系；
    /// 任一方向已存在行时报 AlreadyFriends，不产生重复行
    pub async fn create_request(&self, username: &str) -> Result<()> {
        let me = self.state.uid();
        let target = self.users.get_by_username(username).await?;
        if target.uid == me {
            return Err(SyncError::InvalidTarget);
        }

        // 对向的行先查：两人互发请求时升级已有行而不是新插一行
        if let Some(incoming) = self.api.find_directed(&target.uid, &me).await? {
            if incoming.accepted {
                return Err(SyncError::AlreadyFriends);
            }
            info!("[FriendSync] 🔄 对方已发来请求，直接合并为好友: {}", username);
            self.api.mark_accepted(&target.uid, &me).await?;
            return self.fetch_friends().await;
        }

        if self.api.find_directed(&me, &target.uid).await?.is_some() {
            return Err(SyncError::AlreadyFriends);
        }

        self.api.insert(&me, &target.uid).await?;
        info!("[FriendSync] 📡 好友请求已发送: {}", username);
        self.fetch_friends().await
    }

    /// 接受来自指定用户的好友请求
    pub async fn accept_request(&self, requester_uid: &str) -> Result<()> {
        let me = self.state.uid();
        self.api.mark_accepted(requester_uid, &me).await?;
        info!("[FriendSync] ✅ 已接受好友请求: {}", requester_uid);
        self.fetch_friends().await
    }

    /// 拒绝来自指定用户的好友请求（直接删行）
    pub async fn decline_request(&self, requester_uid: &str) -> Result<()> {
        let me = self.state.uid();
        self.api.delete_directed(requester_uid, &me).await?;
        self.fetch_friends().await
    }

    /// 按用户名解除好友关系，方向无关；用户名不存在时报 NotFound
    pub async fn remove_friend(&self, username: &str) -> Result<()> {
        let me = self.state.uid();
        let target = self.users.get_by_username(username).await?;
        self.api.delete_pair(&me, &target.uid).await?;
        info!("[FriendSync] ❌ 已解除好友关系: {}", username);
        self.fetch_friends().await
    }

    /// 📡 拉取好友关系表并按本人视角分拣
    ///
    /// 已接受且涉及本人的行归入好友；指向本人的待处理行归入
    /// 好友请求；本人发出的待处理请求不对外呈现
    pub async fn fetch_friends(&self) -> Result<()> {
        let me = self.state.uid();
        let rows = self.api.list_all().await?;

        let mut friend_ids: Vec<String> = Vec::new();
        let mut requester_ids: Vec<String> = Vec::new();
        for row in rows.iter().filter(|row| row.involves(&me)) {
            if row.accepted {
                friend_ids.push(row.other(&me).to_string());
            } else if row.receiver_id == me {
                requester_ids.push(row.requester_id.clone());
            }
        }
        debug!(
            "[FriendSync] 分拣完成: {} 位好友, {} 条待处理请求",
            friend_ids.len(),
            requester_ids.len()
        );

        let friends = self.users.list_by_ids(&friend_ids).await?;
        let requesters = self.users.list_by_ids(&requester_ids).await?;

        self.state.replace_friends(friends.clone());
        self.state.replace_friend_requests(requesters.clone());
        self.listener.on_friend_list_changed(friends).await;
        self.listener.on_friend_request_list_changed(requesters).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fomo::friend::listener::EmptyFriendListener;
    use crate::fomo::store::MemoryStore;
    use crate::fomo::testutil::{init_test_logger, seed_user, seeded_store, signed_in_state};

    async fn service_for(store: Arc<MemoryStore>, uid: &str) -> (FriendService, Arc<StateStore>) {
        let state = signed_in_state(uid);
        let svc = FriendService::new(
            FriendshipApi::new(store.clone()),
            UserApi::new(store),
            state.clone(),
            Arc::new(EmptyFriendListener),
        );
        (svc, state)
    }

    async fn two_user_store() -> Arc<MemoryStore> {
        let store = seeded_store().await;
        seed_user(&store, "a", "alice").await;
        seed_user(&store, "b", "bob").await;
        store
    }

    #[tokio::test]
    async fn mutual_requests_collapse_into_single_accepted_row() {
        init_test_logger();
        let store = two_user_store().await;
        let (alice, alice_state) = service_for(store.clone(), "a").await;
        let (bob, bob_state) = service_for(store.clone(), "b").await;

        alice.create_request("bob").await.unwrap();
        bob.create_request("alice").await.unwrap();

        let rows = FriendshipApi::new(store).list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].accepted);
        assert!(rows[0].accept_date.is_some());

        bob.fetch_friends().await.unwrap();
        alice.fetch_friends().await.unwrap();
        assert_eq!(alice_state.friends().len(), 1);
        assert_eq!(bob_state.friends().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_request_is_rejected() {
        init_test_logger();
        let store = two_user_store().await;
        let (alice, _) = service_for(store.clone(), "a").await;

        alice.create_request("bob").await.unwrap();
        assert!(matches!(
            alice.create_request("bob").await,
            Err(SyncError::AlreadyFriends)
        ));
        assert!(matches!(
            alice.create_request("alice").await,
            Err(SyncError::InvalidTarget)
        ));
    }

    #[tokio::test]
    async fn fetch_partitions_rows_by_own_perspective() {
        init_test_logger();
        let store = two_user_store().await;
        seed_user(&store, "c", "carol").await;
        let (alice, alice_state) = service_for(store.clone(), "a").await;
        let (bob, _) = service_for(store.clone(), "b").await;
        let (carol, _) = service_for(store.clone(), "c").await;

        // bob 是已接受的好友，carol 是待处理的来向请求
        alice.create_request("bob").await.unwrap();
        bob.accept_request("a").await.unwrap();
        carol.create_request("alice").await.unwrap();
        alice.fetch_friends().await.unwrap();

        let friends = alice_state.friends();
        let requests = alice_state.friend_requests();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].uid, "b");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].uid, "c");
    }

    #[tokio::test]
    async fn outgoing_pending_request_is_not_surfaced() {
        let store = two_user_store().await;
        let (alice, alice_state) = service_for(store.clone(), "a").await;

        alice.create_request("bob").await.unwrap();
        assert!(alice_state.friends().is_empty());
        assert!(alice_state.friend_requests().is_empty());
    }

    #[tokio::test]
    async fn decline_deletes_the_request_row() {
        let store = two_user_store().await;
        let (alice, _) = service_for(store.clone(), "a").await;
        let (bob, bob_state) = service_for(store.clone(), "b").await;

        alice.create_request("bob").await.unwrap();
        bob.fetch_friends().await.unwrap();
        assert_eq!(bob_state.friend_requests().len(), 1);

        bob.decline_request("a").await.unwrap();
        assert!(bob_state.friend_requests().is_empty());
        assert!(FriendshipApi::new(store).list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removal_works_from_either_side() {
        let store = two_user_store().await;
        let (alice, alice_state) = service_for(store.clone(), "a").await;
        let (bob, bob_state) = service_for(store.clone(), "b").await;

        alice.create_request("bob").await.unwrap();
        bob.accept_request("a").await.unwrap();
        alice.fetch_friends().await.unwrap();
        assert_eq!(alice_state.friends().len(), 1);

        // 非发起方也能解除关系
        bob.remove_friend("alice").await.unwrap();
        alice.fetch_friends().await.unwrap();
        assert!(alice_state.friends().is_empty());
        assert!(bob_state.friends().is_empty());
    }

    #[tokio::test]
    async fn remove_friend_rejects_unknown_username() {
        let store = two_user_store().await;
        let (alice, _) = service_for(store.clone(), "a").await;

        alice.create_request("bob").await.unwrap();
        // 写错用户名必须报错，而不是静默删除零行
        assert!(matches!(
            alice.remove_friend("nobody").await,
            Err(SyncError::NotFound(_))
        ));
        assert_eq!(FriendshipApi::new(store).list_all().await.unwrap().len(), 1);
    }
}
