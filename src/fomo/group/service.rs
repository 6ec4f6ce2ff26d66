//! 群组同步服务层
//!
//! 成员关系由 group_links 表承载，accepted 的生命周期与好友请求
//! 一致：邀请插入待处理链接，接受后置 true。创建者退群时整个
//! 群组连同所有链接一并删除。

use crate::fomo::error::{Result, SyncError};
use crate::fomo::group::api::GroupApi;
use crate::fomo::group::listener::GroupListener;
use crate::fomo::state::StateStore;
use crate::fomo::user::api::UserApi;
use crate::fomo::user::models::User;
use std::sync::Arc;
use tracing::{debug, info};

/// 群组、邀请与成员列表的同步服务
#[derive(Clone)]
pub struct GroupService {
    api: GroupApi,
    users: UserApi,
    state: Arc<StateStore>,
    listener: Arc<dyn GroupListener>,
}

impl GroupService {
    pub fn new(
        api: GroupApi,
        users: UserApi,
        state: Arc<StateStore>,
        listener: Arc<dyn GroupListener>,
    ) -> Self {
        Self {
            api,
            users,
            state,
            listener,
        }
    }

    /// 创建群组并让本人以已接受身份入群
    ///
    /// insert 不返回生成的 id，按群名与创建者回读一次
    pub async fn create_group(&self, name: &str) -> Result<()> {
        let me = self.state.uid();
        self.api.insert_group(name, &me).await?;
        let group = self.api.find_by_name_and_creator(name, &me).await?;
        let id = group
            .id
            .ok_or_else(|| SyncError::NotFound(format!("群组 {name} 的 id")))?;
        self.api.insert_link(&me, id, true).await?;
        info!("[GroupSync] ✅ 群组已创建: {} (id={})", name, id);
        self.fetch_groups().await
    }

    /// 按用户名邀请用户入群（插入待处理链接）
    pub async fn create_group_request(&self, group_id: i64, username: &str) -> Result<()> {
        let me = self.state.uid();
        let target = self.users.get_by_username(username).await?;
        if target.uid == me {
            return Err(SyncError::InvalidTarget);
        }
        // 邀请是幂等的：已有链接（成员或待处理）时不再插行
        let links = self.api.links_of_group(group_id).await?;
        if links.iter().any(|link| link.user_id == target.uid) {
            return Ok(());
        }
        self.api.insert_link(&target.uid, group_id, false).await?;
        info!("[GroupSync] 📡 群组邀请已发送: {} -> group {}", username, group_id);
        Ok(())
    }

    /// 接受群组邀请
    pub async fn accept_group_request(&self, group_id: i64) -> Result<()> {
        let me = self.state.uid();
        self.api.accept_link(&me, group_id).await?;
        info!("[GroupSync] ✅ 已接受群组邀请: group {}", group_id);
        self.fetch_groups().await
    }

    /// 拒绝群组邀请（删除自己的链接）
    pub async fn decline_group_request(&self, group_id: i64) -> Result<()> {
        let me = self.state.uid();
        self.api.delete_link(&me, group_id).await?;
        self.fetch_groups().await
    }

    /// 退出群组
    ///
    /// 创建者退群时级联删除：群组行与所有成员链接一并移除
    pub async fn remove_group(&self, group_id: i64) -> Result<()> {
        let me = self.state.uid();
        let group = self.api.get_group(group_id).await?;
        self.api.delete_link(&me, group_id).await?;

        if group.creator_id == me {
            info!("[GroupSync] ❌ 创建者退群，解散群组: {}", group.name);
            for link in self.api.links_of_group(group_id).await? {
                self.api.delete_link(&link.user_id, group_id).await?;
            }
            self.api.delete_group(group_id).await?;
        }
        self.fetch_groups().await
    }

    /// 📡 拉取本人的成员链接并按接受状态分拣
    pub async fn fetch_groups(&self) -> Result<()> {
        let me = self.state.uid();
        let links = self.api.links_of_user(&me).await?;

        let mut member_ids: Vec<i64> = Vec::new();
        let mut request_ids: Vec<i64> = Vec::new();
        for link in &links {
            if link.accepted {
                member_ids.push(link.group_id);
            } else {
                request_ids.push(link.group_id);
            }
        }
        debug!(
            "[GroupSync] 分拣完成: {} 个群组, {} 条待处理邀请",
            member_ids.len(),
            request_ids.len()
        );

        let groups = self.api.list_groups_by_ids(&member_ids).await?;
        let requests = self.api.list_groups_by_ids(&request_ids).await?;

        self.state.replace_groups(groups.clone());
        self.state.replace_group_requests(requests.clone());
        self.listener.on_group_list_changed(groups).await;
        self.listener.on_group_request_list_changed(requests).await;
        Ok(())
    }

    /// 拉取指定群组的成员并刷新镜像（含待接受的受邀者）
    pub async fn group_members(&self, group_id: i64) -> Result<Vec<User>> {
        let links = self.api.links_of_group(group_id).await?;
        let member_ids: Vec<String> = links.iter().map(|link| link.user_id.clone()).collect();
        let members = self.users.list_by_ids(&member_ids).await?;

        self.state.replace_group_members(members.clone());
        self.listener.on_group_member_list_changed(members.clone()).await;
        Ok(members)
    }
}
