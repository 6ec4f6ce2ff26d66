pub mod fomo;

// 重新导出常用类型和函数，方便外部使用
pub use fomo::{
    client::{ClientConfig, FomoClient},
    error::{Result, SyncError},
    sign_in_async, sign_up_async,
    types::{LatLng, TravelMode},
};
