//! 好友域：请求状态机与好友列表同步

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

pub use api::FriendshipApi;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::Friendship;
pub use service::FriendService;
