//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//! 发现、打开、解析、写入四类错误与流水线的四个阶段一一对应。

use std::path::{Path, PathBuf};

/// 用户数据汇总的结果类型
pub type Result<T> = std::result::Result<T, IngestError>;

/// 用户数据汇总错误类型
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 源目录无法解析为绝对路径，或遍历目录失败
    #[error("发现错误 ({}): {message}", .path.display())]
    Discovery { path: PathBuf, message: String },

    /// 单个输入文件打开失败
    #[error("打开文件失败 ({}): {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV 结构错误（字段内容错误在宽松模式下不会走到这里）
    #[error(
        "解析错误 ({} 行{}): {message}",
        .path.display(),
        .line.map(|l| l.to_string()).unwrap_or_else(|| "?".into())
    )]
    Parse {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    /// 输出写入失败
    #[error("写入错误: {message}")]
    Write { message: String },

    /// 运行被取消
    #[error("运行已取消")]
    Cancelled,

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 读写错误
    #[error("CSV错误: {0}")]
    Csv(#[from] csv::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 配置文件反序列化错误
    #[error("配置解析错误: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// 配置文件序列化错误
    #[error("配置序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// 指标注册或编码错误
    #[error("指标错误: {0}")]
    Metrics(#[from] prometheus::Error),

    /// 工作任务 panic 或被取消
    #[error("任务错误: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

impl IngestError {
    /// 创建一个发现错误
    pub fn discovery<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        let path = path.as_ref().to_path_buf();
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("发现错误 {}: {}", path.display(), message);
        Self::Discovery { path, message }
    }

    /// 创建一个打开错误
    pub fn open<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        #[cfg(feature = "logging")]
        tracing::error!("打开文件 {} 失败: {}", path.display(), source);
        Self::Open { path, source }
    }

    /// 创建一个解析错误
    pub fn parse<P: AsRef<Path>, S: Into<String>>(path: P, line: Option<u64>, message: S) -> Self {
        let path = path.as_ref().to_path_buf();
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!(
            "解析错误发生在 {} 第{:?}行: {}",
            path.display(),
            line,
            message
        );
        Self::Parse {
            path,
            line,
            message,
        }
    }

    /// 创建一个写入错误
    pub fn write<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("写入错误: {}", message);
        Self::Write { message }
    }

    /// 创建一个配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 创建一个其他类型错误
    pub fn other<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("未知错误: {}", message);
        Self::Other(message)
    }

    pub fn is_discovery_error(&self) -> bool {
        matches!(self, IngestError::Discovery { .. })
    }

    pub fn is_open_error(&self) -> bool {
        matches!(self, IngestError::Open { .. })
    }

    /// 检查是否为解析错误（CSV 结构错误也视为解析错误）
    pub fn is_parse_error(&self) -> bool {
        matches!(self, IngestError::Parse { .. } | IngestError::Csv(_))
    }

    pub fn is_write_error(&self) -> bool {
        matches!(self, IngestError::Write { .. })
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, IngestError::Config(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}
