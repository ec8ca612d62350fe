//! 流水线模块
//!
//! 三种流水线读取同一目录树、产出同一种记录、写入同一种输出端，
//! 区别只在并发结构：
//!
//! - [`SequentialPipeline`]：单线程，出错即停
//! - [`FanOutPipeline`]：每个单元一个任务，阶段之间有屏障
//! - [`StreamingPipeline`]：三阶段通道流水线，解析与写入之间有界缓冲

use crate::error::Result;
use std::path::Path;

pub mod aggregate;
pub mod fan_out;
pub mod handoff;
pub mod sequential;
pub mod streaming;
pub mod types;

pub use aggregate::{Aggregate, Aggregator, Reporter, fan_out_blocking};
pub use fan_out::FanOutPipeline;
pub use handoff::HandoffGauge;
pub use sequential::SequentialPipeline;
pub use streaming::StreamingPipeline;
pub use types::{
    FailureStage, FileFailure, PipelineKind, PipelineOptions, RunReport,
    StreamUnit, WorkerOutcome,
};

/// 流水线的统一接口
pub trait Pipeline {
    /// 流水线种类
    fn kind(&self) -> PipelineKind;

    /// 处理 `root` 下的所有文件并写入输出端
    ///
    /// 流水线在一次运行后被消耗。
    fn run<P: AsRef<Path>>(self, root: P) -> Result<RunReport>;
}
