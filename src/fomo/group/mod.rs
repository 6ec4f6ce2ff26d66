//! 群组域：群组、邀请与成员列表同步

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

pub use api::GroupApi;
pub use listener::{EmptyGroupListener, GroupListener};
pub use models::{Group, GroupLink};
pub use service::GroupService;
