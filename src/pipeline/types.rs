//! 流水线相关的数据类型定义

use crate::cancel::CancelToken;
use crate::config::{DEFAULT_STREAM_CAPACITY, PipelineConfig};
use crate::record::{ParseMode, Record, SourceHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 流水线种类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// 按发现顺序逐个文件处理
    #[default]
    Sequential,
    /// 每个文件/记录一个工作任务，阶段之间有汇合屏障
    FanOut,
    /// 发现 → 解析 → 写入三阶段，通过通道连接
    Streaming,
}

impl PipelineKind {
    pub fn all() -> [PipelineKind; 3] {
        [Self::Sequential, Self::FanOut, Self::Streaming]
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Self::Sequential),
            "fan_out" => Ok(Self::FanOut),
            "streaming" => Ok(Self::Streaming),
            other => Err(format!("未知的流水线: {other}")),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::FanOut => f.write_str("fan_out"),
            Self::Streaming => f.write_str("streaming"),
        }
    }
}

/// 构造流水线时的选项
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 字段解析模式
    pub parse_mode: ParseMode,
    /// 流式流水线解析 → 写入的缓冲容量
    pub stream_capacity: usize,
    /// 取消上下文
    pub cancel: CancelToken,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parse_mode: ParseMode::Lenient,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            cancel: CancelToken::new(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            parse_mode: config.parse_mode,
            stream_capacity: config.stream_capacity,
            ..Default::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity;
        self
    }
}

/// 失败发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Open,
    Parse,
    Write,
}

/// 单个工作单元的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// 失败阶段
    pub stage: FailureStage,
    /// 相关文件（写入失败时为空）
    pub path: Option<PathBuf>,
    /// 失败原因
    pub reason: String,
}

impl FileFailure {
    pub fn new(stage: FailureStage, path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            stage,
            path,
            reason: reason.into(),
        }
    }
}

/// 工作单元的结果，由汇总方收集
#[derive(Debug)]
pub enum WorkerOutcome<T> {
    Completed(T),
    Failed(FileFailure),
}

/// 流式流水线各阶段之间传递的单元
#[derive(Debug)]
pub struct StreamUnit {
    /// 来源文件句柄，单元被消费后关闭
    pub handle: SourceHandle,
    /// 已解析的记录，阶段 A 发出时为空
    pub records: Vec<Record>,
}

impl StreamUnit {
    pub fn opened(handle: SourceHandle) -> Self {
        Self {
            handle,
            records: Vec::new(),
        }
    }

    pub fn with_records(self, records: Vec<Record>) -> Self {
        Self { records, ..self }
    }
}

/// 一次流水线运行的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// 流水线种类
    pub pipeline: PipelineKind,
    /// 发现的文件数
    pub discovered_files: usize,
    /// 成功解析的文件数
    pub parsed_files: usize,
    /// 解析出的记录数
    pub records_parsed: usize,
    /// 最终输出中的记录数
    pub records_written: usize,
    /// 所有非致命失败
    pub failures: Vec<FileFailure>,
    /// 是否因取消提前结束
    pub cancelled: bool,
    /// 有界缓冲中观察到的最大单元数（仅流式流水线）
    pub peak_in_flight: Option<usize>,
    /// 发送时缓冲已满的次数（仅流式流水线）
    pub backpressure_waits: Option<usize>,
    /// 输出端累计输出行数（含重写）
    pub emitted_rows: usize,
    /// 总耗时
    pub duration: Duration,
}

impl RunReport {
    pub fn new(pipeline: PipelineKind) -> Self {
        Self {
            pipeline,
            discovered_files: 0,
            parsed_files: 0,
            records_parsed: 0,
            records_written: 0,
            failures: Vec::new(),
            cancelled: false,
            peak_in_flight: None,
            backpressure_waits: None,
            emitted_rows: 0,
            duration: Duration::ZERO,
        }
    }

    /// 某阶段的失败数
    pub fn failures_in(&self, stage: FailureStage) -> usize {
        self.failures.iter().filter(|f| f.stage == stage).count()
    }

    /// 是否没有任何失败
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] 文件: {}/{}, 记录: 解析 {} 写入 {}, 失败: 打开 {} 解析 {} 写入 {}, 耗时: {:.3}s",
            self.pipeline,
            self.parsed_files,
            self.discovered_files,
            self.records_parsed,
            self.records_written,
            self.failures_in(FailureStage::Open),
            self.failures_in(FailureStage::Parse),
            self.failures_in(FailureStage::Write),
            self.duration.as_secs_f64()
        )?;
        if let Some(peak) = self.peak_in_flight {
            write!(f, ", 缓冲峰值: {peak}")?;
        }
        if self.cancelled {
            write!(f, " (已取消)")?;
        }
        Ok(())
    }
}
