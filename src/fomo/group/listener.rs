//! 群组事件监听器

use crate::fomo::group::models::Group;
use crate::fomo::user::models::User;
use async_trait::async_trait;

/// 群组集合变化的回调，携带变化后的完整集合
#[async_trait]
pub trait GroupListener: Send + Sync {
    /// 已加入的群组列表发生变化
    async fn on_group_list_changed(&self, groups: Vec<Group>);

    /// 待处理的群组邀请列表发生变化
    async fn on_group_request_list_changed(&self, requests: Vec<Group>);

    /// 当前查看群组的成员列表发生变化
    async fn on_group_member_list_changed(&self, members: Vec<User>);
}

/// 空实现，宿主未注册监听器时使用
pub struct EmptyGroupListener;

#[async_trait]
impl GroupListener for EmptyGroupListener {
    async fn on_group_list_changed(&self, _groups: Vec<Group>) {}

    async fn on_group_request_list_changed(&self, _requests: Vec<Group>) {}

    async fn on_group_member_list_changed(&self, _members: Vec<User>) {}
}
