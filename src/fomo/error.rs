//! 统一错误分类
//!
//! 协作方边界（HTTP 存储、地图服务商）内部使用 anyhow 携带上下文，
//! 服务层对外暴露显式的错误枚举，调用方据此把失败映射为「未成功」信号。

use thiserror::Error;

/// 同步核心的错误分类
#[derive(Debug, Error)]
pub enum SyncError {
    /// 远端调用失败（网络 / 存储 / 服务商错误），调用方此前的状态保持不变
    #[error("远端调用失败: {0}")]
    Store(#[from] anyhow::Error),

    /// 期望存在的记录不存在
    #[error("记录不存在: {0}")]
    NotFound(String),

    /// 好友请求不能以自己为目标
    #[error("不能向自己发送好友请求")]
    InvalidTarget,

    /// 这对用户之间已存在好友关系或待处理请求
    #[error("好友关系或请求已存在")]
    AlreadyFriends,

    /// 尚未登录，服务不可用
    #[error("尚未登录")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, SyncError>;
