//! FOMO 客户端同步核心
//!
//! 按领域划分模块：好友 / 群组 / 地点 / 路线 / 用户资料，
//! 外加远端存储契约、地图服务商接入与同步引擎。

pub mod auth;
pub mod client;
pub mod error;
pub mod friend;
pub mod group;
pub mod location;
pub mod maps;
pub mod place;
pub mod route;
pub mod state;
pub mod store;
pub mod types;
pub mod user;

#[cfg(test)]
pub(crate) mod testutil;

pub use auth::{sign_in_async, sign_up_async};
pub use client::{ClientConfig, FomoClient};
pub use error::{Result, SyncError};
pub use state::StateStore;
pub use types::{LatLng, TravelMode};
