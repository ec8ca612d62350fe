use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use user_ingest::app;
use user_ingest::config::Config;
use user_ingest::metrics::{MetricsSink, NoopMetrics};
use user_ingest::pipeline::PipelineKind;
use user_ingest::record::ParseMode;
use user_ingest::CancelToken;

#[derive(Parser, Debug)]
#[command(name = "user-ingest-cli")]
#[command(author, version, about = "汇总目录树中的用户 CSV 文件")]
struct Args {
    /// 配置文件路径（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 流水线: sequential, fan_out, streaming
    #[arg(short, long)]
    mode: Option<PipelineKind>,

    /// 输入根目录
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 输出 CSV 文件
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 字段无法解析时报错而不是使用零值
    #[arg(long)]
    strict: bool,

    /// 流式流水线的缓冲容量
    #[arg(long)]
    capacity: Option<usize>,

    /// 以 JSON 输出运行报告
    #[arg(long)]
    json: bool,

    /// 将指标以文本格式写入该文件
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path).with_context(|| {
                format!("读取配置文件失败: {}", path.display())
            })?,
            None => Config::default(),
        };

        let pipeline = &mut config.pipeline;
        if let Some(mode) = self.mode {
            pipeline.mode = mode;
        }
        if let Some(input) = &self.input {
            pipeline.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            pipeline.output_path = output.clone();
        }
        if self.strict {
            pipeline.parse_mode = ParseMode::Strict;
        }
        if let Some(capacity) = self.capacity {
            pipeline.stream_capacity = capacity;
        }
        if let Some(path) = &self.metrics_out {
            config.metrics.textfile_path = Some(path.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    #[cfg(feature = "logging")]
    user_ingest::logging::init_logging(&config.log)?;

    let prometheus = app::build_metrics(&config.metrics)?;
    let metrics: &dyn MetricsSink = match &prometheus {
        Some(p) => p,
        None => &NoopMetrics,
    };

    let cancel = CancelToken::new();
    let report = app::run_once(&config.pipeline, &cancel, metrics)?;

    if let (Some(p), Some(path)) = (&prometheus, &config.metrics.textfile_path) {
        p.write_textfile(path)
            .with_context(|| format!("写入指标文件失败: {}", path.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{report}");
        for failure in &report.failures {
            match &failure.path {
                Some(path) => println!(
                    "  {:?} {}: {}",
                    failure.stage,
                    path.display(),
                    failure.reason
                ),
                None => println!("  {:?}: {}", failure.stage, failure.reason),
            }
        }
        println!("输出文件: {}", config.pipeline.output_path.display());
    }

    Ok(())
}
