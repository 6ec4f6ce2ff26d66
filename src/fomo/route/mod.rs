//! 路线域：路线计算、折线解码与持久化

pub mod listener;
pub mod polyline;
pub mod service;

pub use listener::{EmptyRouteListener, RouteListener};
pub use service::RouteService;
