//! 多文件用户 CSV 数据汇总
//!
//! 从目录树中发现 CSV 文件，解析为 [`record::Record`]，再写入同一个输出文件。
//! 提供三种并发结构不同、输出语义一致的流水线，见 [`pipeline`]。

// 基础模块 - 始终可用
pub mod cancel;
pub mod config;
pub mod error;
pub mod record;

// 输入输出
pub mod discovery;
pub mod sink;

// 流水线与驱动
pub mod app;
pub mod metrics;
pub mod pipeline;

// 日志模块 - 需要 logging 功能
#[cfg(feature = "logging")]
pub mod logging;

pub use cancel::CancelToken;
pub use config::Config;
pub use error::{IngestError, Result};
pub use pipeline::{Pipeline, PipelineKind, RunReport};
pub use record::Record;
