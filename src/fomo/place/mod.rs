//! 地点域：私有地理围栏

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

pub use api::PlaceApi;
pub use listener::{EmptyPlaceListener, PlaceListener};
pub use models::{locate, Place};
pub use service::PlaceService;
