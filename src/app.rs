//! 单次运行驱动
//!
//! 创建输出端、按配置选择流水线、执行一次并上报执行耗时。

use crate::cancel::CancelToken;
use crate::config::{MetricsConfig, PipelineConfig};
use crate::error::Result;
use crate::metrics::{
    EXECUTION_TIME_NAME, MetricsSink, PrometheusMetrics,
};
use crate::pipeline::{
    FanOutPipeline, Pipeline, PipelineKind, PipelineOptions, RunReport,
    SequentialPipeline, StreamingPipeline,
};
use crate::sink::CsvSink;
use std::time::Instant;

/// 按配置执行一次流水线
///
/// 输出文件在流水线启动前创建（已存在则截断），因此空输入目录也会得到空文件。
/// 无论运行成功与否，执行耗时（秒）都会上报给 `metrics`。
pub fn run_once(
    config: &PipelineConfig,
    cancel: &CancelToken,
    metrics: &dyn MetricsSink,
) -> Result<RunReport> {
    let start = Instant::now();

    #[cfg(feature = "logging")]
    tracing::info!(
        "开始运行 {} 流水线: {} -> {}",
        config.mode,
        config.input_dir.display(),
        config.output_path.display()
    );

    let result = dispatch(config, cancel);

    let elapsed = start.elapsed().as_secs_f64();
    metrics.record_gauge(EXECUTION_TIME_NAME, elapsed);

    #[cfg(feature = "logging")]
    match &result {
        Ok(report) => tracing::info!("运行完成，耗时 {:.3}s: {}", elapsed, report),
        Err(e) => tracing::error!("运行失败，耗时 {:.3}s: {}", elapsed, e),
    }

    result
}

fn dispatch(config: &PipelineConfig, cancel: &CancelToken) -> Result<RunReport> {
    let sink = CsvSink::create(&config.output_path)?;
    let options = PipelineOptions::from_config(config).with_cancel(cancel.clone());
    let root = &config.input_dir;

    match config.mode {
        PipelineKind::Sequential => {
            SequentialPipeline::new(sink, options).run(root)
        }
        PipelineKind::FanOut => FanOutPipeline::new(sink, options).run(root),
        PipelineKind::Streaming => {
            StreamingPipeline::new(sink, options).run(root)
        }
    }
}

/// 根据指标配置构造指标接收方
///
/// 未启用时返回 `None`，调用方可改用 [`crate::metrics::NoopMetrics`]。
pub fn build_metrics(config: &MetricsConfig) -> Result<Option<PrometheusMetrics>> {
    if !config.enabled {
        return Ok(None);
    }
    PrometheusMetrics::new(&config.namespace).map(Some)
}
