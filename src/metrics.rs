//! 执行耗时指标
//!
//! 流水线与指标系统之间唯一的约定：按固定名称上报一个数值样本。
//! 这里只负责采集和文本编码，HTTP 暴露由外部进程负责。

use crate::error::Result;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::path::Path;

/// 执行耗时指标的命名空间
pub const EXECUTION_TIME_NAMESPACE: &str = "process_time";

/// 执行耗时指标名称
pub const EXECUTION_TIME_NAME: &str = "execution_time";

/// 数值样本接收方
pub trait MetricsSink: Send + Sync {
    /// 按名称记录一个 gauge 值
    fn record_gauge(&self, name: &str, value: f64);
}

/// 丢弃所有样本
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_gauge(&self, _name: &str, _value: f64) {}
}

/// 基于 prometheus 注册表的指标
pub struct PrometheusMetrics {
    registry: Registry,
    execution_time: Gauge,
}

impl PrometheusMetrics {
    /// 创建注册表并注册执行耗时 gauge
    pub fn new(namespace: &str) -> Result<Self> {
        let registry = Registry::new();
        let execution_time = Gauge::with_opts(
            Opts::new(EXECUTION_TIME_NAME, "Execution process time")
                .namespace(namespace),
        )?;
        registry.register(Box::new(execution_time.clone()))?;
        Ok(Self {
            registry,
            execution_time,
        })
    }

    /// 当前执行耗时（秒）
    pub fn execution_time(&self) -> f64 {
        self.execution_time.get()
    }

    /// 以 Prometheus 文本格式编码所有指标
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// 写入文本格式指标文件
    pub fn write_textfile<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.gather_text()?)?;
        Ok(())
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record_gauge(&self, name: &str, value: f64) {
        if name == EXECUTION_TIME_NAME {
            self.execution_time.set(value);
        } else {
            #[cfg(feature = "logging")]
            tracing::warn!("忽略未知指标 {}={}", name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_gather() {
        let metrics = PrometheusMetrics::new(EXECUTION_TIME_NAMESPACE).unwrap();
        metrics.record_gauge(EXECUTION_TIME_NAME, 1.5);
        metrics.record_gauge("unknown", 9.0);
        assert!((metrics.execution_time() - 1.5).abs() < f64::EPSILON);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("process_time_execution_time 1.5"));
        assert!(text.contains("Execution process time"));
    }
}
