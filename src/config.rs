//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能

use crate::error::{IngestError, Result};
use crate::pipeline::PipelineKind;
use crate::record::ParseMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 流式流水线解析阶段到写入阶段的默认缓冲容量
pub const DEFAULT_STREAM_CAPACITY: usize = 5;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogConfig,
    /// 流水线配置
    pub pipeline: PipelineConfig,
    /// 指标配置
    pub metrics: MetricsConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 是否启用控制台输出
    pub enable_stdout: bool,
    /// 日志输出目录，空字符串表示不写文件
    pub log_dir: String,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

/// 流水线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 输入根目录
    pub input_dir: PathBuf,
    /// 输出 CSV 文件路径
    pub output_path: PathBuf,
    /// 使用哪种流水线
    pub mode: PipelineKind,
    /// 字段解析模式
    pub parse_mode: ParseMode,
    /// 流式流水线的有界缓冲容量
    pub stream_capacity: usize,
}

/// 指标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 是否记录执行耗时
    pub enabled: bool,
    /// 指标命名空间
    pub namespace: String,
    /// 文本格式指标输出路径（可选）
    pub textfile_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            log_dir: String::new(),
            level: "info".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_path: PathBuf::from("out/users.csv"),
            mode: PipelineKind::Sequential,
            parse_mode: ParseMode::Lenient,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: crate::metrics::EXECUTION_TIME_NAMESPACE.to_string(),
            textfile_path: None,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(IngestError::config(format!("无效的日志级别: {}", self.log.level)));
            }
        }

        if self.pipeline.stream_capacity == 0 {
            return Err(IngestError::config("流式缓冲容量不能为0"));
        }

        if self.pipeline.input_dir.as_os_str().is_empty() {
            return Err(IngestError::config("输入目录不能为空"));
        }

        if self.pipeline.output_path.as_os_str().is_empty() {
            return Err(IngestError::config("输出路径不能为空"));
        }

        if self.metrics.enabled && self.metrics.namespace.trim().is_empty() {
            return Err(IngestError::config("指标命名空间不能为空"));
        }

        Ok(())
    }
}
