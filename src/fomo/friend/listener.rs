//! 好友事件监听器

use crate::fomo::user::models::User;
use async_trait::async_trait;

/// 好友集合变化的回调
///
/// 回调携带变化后的完整集合，宿主直接整体替换自己的展示层状态
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// 好友列表发生变化
    async fn on_friend_list_changed(&self, friends: Vec<User>);

    /// 待处理的好友请求列表发生变化
    async fn on_friend_request_list_changed(&self, requesters: Vec<User>);
}

/// 空实现，宿主未注册监听器时使用
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friend_list_changed(&self, _friends: Vec<User>) {}

    async fn on_friend_request_list_changed(&self, _requesters: Vec<User>) {}
}
