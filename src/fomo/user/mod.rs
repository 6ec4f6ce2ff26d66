//! 用户域：模型、数据访问与资料服务

pub mod api;
pub mod models;
pub mod service;

pub use api::UserApi;
pub use models::{Status, User, IDLE_DESCRIPTION, ON_MY_WAY_DESCRIPTION};
pub use service::ProfileService;
