//! Acquisition 错误类型

use contracts::{ContractError, SourceError};
use thiserror::Error;

/// Acquisition 错误
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// 未注册的 driver
    #[error("source '{label}': driver '{driver}' is not registered")]
    UnknownDriver {
        /// 数据源 label
        label: String,
        /// 请求的 driver
        driver: String,
    },

    /// 数据源报告的错误
    #[error(transparent)]
    Source(#[from] SourceError),

    /// 上一次会话仍有 worker 未 join
    #[error("acquisition session still active with {workers} workers, call stop() first")]
    SessionActive {
        /// 已注册的 worker 数
        workers: usize,
    },

    /// 无法创建 worker 线程
    #[error("failed to spawn worker for source '{label}': {message}")]
    SpawnFailed {
        /// 数据源 label
        label: String,
        /// 错误消息
        message: String,
    },

    /// 配置加载错误
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Acquisition Result 类型别名
pub type Result<T> = std::result::Result<T, AcquisitionError>;
