use crate::models::ServiceTarget;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// 自托管模式下缺少服务地址，或开发环境缺少共享后端地址
    #[error("service url for \"{service}\" is not configured, check your environment")]
    Configuration { service: ServiceTarget },

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// 后端拒绝了补丁，消息原样透传
    #[error("{0}")]
    Remote(String),

    #[error("config version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("app not found: {0}")]
    AppNotFound(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("invalid config path: {0}")]
    InvalidPath(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("settings error: {0}")]
    SettingsError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 错误在界面上的呈现位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// 表单字段内联错误，阻止提交
    InlineField,
    /// 可关闭的通知，表单保留未保存的编辑
    Notification,
    /// 页面级错误边界，整个视图替换为错误状态
    PageBoundary,
}

impl ConsoleError {
    pub fn surface(&self) -> Surface {
        match self {
            ConsoleError::DuplicateKey(_) | ConsoleError::Validation(_) => Surface::InlineField,
            ConsoleError::Remote(_)
            | ConsoleError::VersionConflict { .. }
            | ConsoleError::AppNotFound(_)
            | ConsoleError::EntryNotFound(_)
            | ConsoleError::InvalidPath(_) => Surface::Notification,
            ConsoleError::Configuration { .. }
            | ConsoleError::StorageError(_)
            | ConsoleError::SettingsError(_)
            | ConsoleError::SerializationError(_)
            | ConsoleError::IoError(_) => Surface::PageBoundary,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
