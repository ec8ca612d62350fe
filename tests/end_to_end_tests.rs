//! 单次运行驱动的端到端测试

mod common;

use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;
use user_ingest::app;
use user_ingest::cancel::CancelToken;
use user_ingest::config::{MetricsConfig, PipelineConfig};
use user_ingest::metrics::{
    EXECUTION_TIME_NAME, MetricsSink, NoopMetrics, PrometheusMetrics,
};
use user_ingest::pipeline::PipelineKind;

use common::create_user_tree;

/// 记录所有上报样本的指标接收方
#[derive(Default)]
struct RecordingMetrics {
    samples: Mutex<Vec<(String, f64)>>,
}

impl MetricsSink for RecordingMetrics {
    fn record_gauge(&self, name: &str, value: f64) {
        self.samples.lock().unwrap().push((name.to_string(), value));
    }
}

fn pipeline_config(
    input: &TempDir,
    output: &std::path::Path,
    mode: PipelineKind,
) -> PipelineConfig {
    PipelineConfig {
        input_dir: input.path().to_path_buf(),
        output_path: output.to_path_buf(),
        mode,
        ..PipelineConfig::default()
    }
}

/// 空目录：三种流水线都产生空输出文件
#[test]
fn test_empty_directory_produces_empty_output() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    for mode in PipelineKind::all() {
        let output = out.path().join(format!("{mode}.csv"));
        let config = pipeline_config(&input, &output, mode);

        let report = app::run_once(&config, &CancelToken::new(), &NoopMetrics)
            .unwrap_or_else(|e| panic!("{mode} 运行失败: {e}"));

        assert_eq!(report.pipeline, mode);
        assert_eq!(report.discovered_files, 0);
        assert_eq!(report.records_written, 0);
        assert!(output.exists(), "{mode} 应该创建输出文件");
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
    }
}

/// 顺序与流式流水线输出字节一致，扇出流水线输出相同的记录集合
#[test]
fn test_pipelines_agree_on_content() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_user_tree(input.path(), 5, 4);

    let mut outputs = Vec::new();
    for mode in PipelineKind::all() {
        let output = out.path().join(format!("{mode}.csv"));
        app::run_once(
            &pipeline_config(&input, &output, mode),
            &CancelToken::new(),
            &NoopMetrics,
        )
        .unwrap();
        outputs.push(output);
    }

    let sequential = fs::read(&outputs[0]).unwrap();
    let streaming = fs::read(&outputs[2]).unwrap();
    assert_eq!(sequential, streaming);

    let mut sequential_lines = common::read_lines(&outputs[0]);
    let mut fan_out_lines = common::read_lines(&outputs[1]);
    sequential_lines.sort();
    fan_out_lines.sort();
    assert_eq!(sequential_lines, fan_out_lines);
}

/// 输出目录不存在时自动创建，已有输出被截断
#[test]
fn test_output_is_created_and_truncated() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_user_tree(input.path(), 1, 2);
    let output = out.path().join("nested/dir/users.csv");

    let config = pipeline_config(&input, &output, PipelineKind::Sequential);
    app::run_once(&config, &CancelToken::new(), &NoopMetrics).unwrap();
    app::run_once(&config, &CancelToken::new(), &NoopMetrics).unwrap();

    assert_eq!(common::read_lines(&output).len(), 2);
}

/// 每次运行都上报一次执行耗时
#[test]
fn test_execution_time_is_reported() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_user_tree(input.path(), 2, 2);
    let metrics = RecordingMetrics::default();

    let config = pipeline_config(&input, &out.path().join("users.csv"), PipelineKind::Streaming);
    app::run_once(&config, &CancelToken::new(), &metrics).unwrap();

    let samples = metrics.samples.lock().unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].0, EXECUTION_TIME_NAME);
    assert!(samples[0].1 >= 0.0);
}

/// 运行失败时也上报耗时
#[test]
fn test_execution_time_reported_on_failure() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let metrics = RecordingMetrics::default();

    let output = out.path().join("users.csv");
    let mut config = pipeline_config(&input, &output, PipelineKind::Sequential);
    config.input_dir = input.path().join("missing");

    let err = app::run_once(&config, &CancelToken::new(), &metrics).unwrap_err();
    assert!(err.is_discovery_error());
    assert_eq!(metrics.samples.lock().unwrap().len(), 1);
}

/// Prometheus 指标写入文本文件
#[test]
fn test_prometheus_textfile() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_user_tree(input.path(), 1, 1);

    let metrics = app::build_metrics(&MetricsConfig::default())
        .unwrap()
        .expect("默认启用指标");
    let config = pipeline_config(&input, &out.path().join("users.csv"), PipelineKind::FanOut);
    app::run_once(&config, &CancelToken::new(), &metrics).unwrap();

    let textfile = out.path().join("metrics.prom");
    metrics.write_textfile(&textfile).unwrap();
    let text = fs::read_to_string(&textfile).unwrap();
    assert!(text.contains("# HELP process_time_execution_time Execution process time"));
    assert!(text.contains("process_time_execution_time "));
}

/// 关闭指标时不创建注册表
#[test]
fn test_metrics_disabled() {
    let config = MetricsConfig {
        enabled: false,
        ..MetricsConfig::default()
    };
    assert!(app::build_metrics(&config).unwrap().is_none());

    let metrics = PrometheusMetrics::new("custom").unwrap();
    metrics.record_gauge(EXECUTION_TIME_NAME, 2.0);
    assert_eq!(metrics.execution_time(), 2.0);
}
