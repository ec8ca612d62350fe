//! 流式通道流水线
//!
//! ```text
//! 阶段 A (打开) --无界通道--> 阶段 B (解析) --有界通道(容量 5)--> 阶段 C (写入) --> 完成信号
//! ```
//!
//! - 阶段 A 按发现顺序打开文件，打开失败的文件被跳过
//! - 阶段 B 解析每个单元，有界通道满时阻塞，这是唯一的背压点
//! - 阶段 C 独占输出端，每收到一个单元就用累计的全部记录重写输出
//!
//! 文件级顺序与发现顺序一致，文件内保持行顺序。

use super::Pipeline;
use super::handoff::{self, HandoffSender};
use super::types::{
    FailureStage, FileFailure, PipelineKind, PipelineOptions, RunReport, StreamUnit,
};
use crate::cancel::CancelToken;
use crate::discovery;
use crate::error::{IngestError, Result};
use crate::record::{RecordParser, SourceHandle};
use crate::sink::{RecordSink, SinkStats};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// 流式通道流水线
pub struct StreamingPipeline<S> {
    sink: S,
    parser: RecordParser,
    options: PipelineOptions,
}

/// 阶段 A 的结果
#[derive(Debug, Default)]
struct OpenStageSummary {
    failures: Vec<FileFailure>,
    cancelled: bool,
}

/// 阶段 B 的结果
#[derive(Debug, Default)]
struct ParseStageSummary {
    parsed_files: usize,
    records_parsed: usize,
    failures: Vec<FileFailure>,
}

/// 阶段 C 通过完成通道发出的结果
#[derive(Debug, Default)]
struct WriteSummary {
    units: usize,
    failures: Vec<FileFailure>,
    stats: SinkStats,
}

impl<S: RecordSink + 'static> StreamingPipeline<S> {
    pub fn new(sink: S, options: PipelineOptions) -> Self {
        Self {
            sink,
            parser: RecordParser::new(options.parse_mode),
            options,
        }
    }
}

impl<S: RecordSink + 'static> Pipeline for StreamingPipeline<S> {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Streaming
    }

    fn run<P: AsRef<Path>>(self, root: P) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(self.kind());

        let paths = discovery::discover(root)?;
        report.discovered_files = paths.len();

        #[cfg(feature = "logging")]
        tracing::info!(
            "流式流水线开始处理 {} 个文件，缓冲容量: {}，输出端: {}",
            paths.len(),
            self.options.stream_capacity,
            self.sink.name()
        );

        let (unit_tx, unit_rx) = mpsc::channel::<StreamUnit>();
        let (parsed_tx, parsed_rx, gauge) =
            handoff::bounded::<StreamUnit>(self.options.stream_capacity);
        let (done_tx, done_rx) = mpsc::channel::<WriteSummary>();

        let cancel = self.options.cancel.clone();
        let stage_a = thread::Builder::new()
            .name("stream-open".into())
            .spawn(move || open_stage(paths, unit_tx, cancel))?;

        let parser = self.parser;
        let stage_b = thread::Builder::new()
            .name("stream-parse".into())
            .spawn(move || parse_stage(parser, unit_rx, parsed_tx))?;

        let sink = self.sink;
        let stage_c = thread::Builder::new()
            .name("stream-write".into())
            .spawn(move || write_stage(sink, parsed_rx, done_tx))?;

        let written = done_rx
            .recv()
            .map_err(|_| IngestError::other("写入阶段未发出完成信号"))?;

        let opened = join_stage(stage_a, "open")?;
        let parsed = join_stage(stage_b, "parse")?;
        join_stage(stage_c, "write")?;

        report.cancelled = opened.cancelled;
        report.parsed_files = parsed.parsed_files;
        report.records_parsed = parsed.records_parsed;
        report.records_written = written.stats.written_records;
        report.emitted_rows = written.stats.emitted_rows;
        report.failures.extend(opened.failures);
        report.failures.extend(parsed.failures);
        report.failures.extend(written.failures);
        report.peak_in_flight = Some(gauge.peak());
        report.backpressure_waits = Some(gauge.full_sends());
        report.duration = start.elapsed();

        #[cfg(feature = "logging")]
        tracing::info!(
            "流式流水线完成: {}，写入单元: {}，满缓冲发送: {}，写放大: {:.2}",
            report,
            written.units,
            gauge.full_sends(),
            written.stats.write_amplification()
        );

        Ok(report)
    }
}

fn join_stage<T>(handle: JoinHandle<T>, stage: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| IngestError::other(format!("{stage} 阶段线程 panic")))
}

/// 阶段 A：按顺序打开文件并发出只含句柄的单元
fn open_stage(
    paths: Vec<PathBuf>,
    output: mpsc::Sender<StreamUnit>,
    cancel: CancelToken,
) -> OpenStageSummary {
    let mut summary = OpenStageSummary::default();

    for path in paths {
        if cancel.is_cancelled() {
            #[cfg(feature = "logging")]
            tracing::warn!("阶段 A 收到取消请求，停止打开新文件");
            summary.cancelled = true;
            break;
        }

        match SourceHandle::open(&path) {
            Ok(handle) => {
                if output.send(StreamUnit::opened(handle)).is_err() {
                    #[cfg(feature = "logging")]
                    tracing::warn!("解析阶段已退出，阶段 A 提前结束");
                    break;
                }
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!("跳过无法打开的文件 {}: {}", path.display(), e);
                summary.failures.push(FileFailure::new(
                    FailureStage::Open,
                    Some(path),
                    e.to_string(),
                ));
            }
        }
    }

    summary
}

/// 阶段 B：解析单元并送入有界通道，单个文件解析失败只跳过该文件
fn parse_stage(
    parser: RecordParser,
    input: mpsc::Receiver<StreamUnit>,
    output: HandoffSender<StreamUnit>,
) -> ParseStageSummary {
    let mut summary = ParseStageSummary::default();

    for mut unit in input {
        match parser.parse_handle(&mut unit.handle) {
            Ok(records) => {
                summary.parsed_files += 1;
                summary.records_parsed += records.len();
                if output.send(unit.with_records(records)).is_err() {
                    #[cfg(feature = "logging")]
                    tracing::warn!("写入阶段已退出，阶段 B 提前结束");
                    break;
                }
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!("跳过解析失败的文件 {}: {}", unit.handle.path().display(), e);
                summary.failures.push(FileFailure::new(
                    FailureStage::Parse,
                    Some(unit.handle.path().to_path_buf()),
                    e.to_string(),
                ));
            }
        }
    }

    summary
}

/// 阶段 C：累计记录，每个单元后整体重写输出，结束时发出一次完成信号
///
/// 每次重写前先截断输出，最终文件中每条记录只出现一次。
/// 这与逐次追加整个缓冲的写法不同，后者会让前面文件的行在输出中重复出现；
/// 重写带来的额外输出量仍通过 [`SinkStats::emitted_rows`] 统计。
fn write_stage<S: RecordSink>(
    mut sink: S,
    input: Receiver<StreamUnit>,
    done: mpsc::Sender<WriteSummary>,
) {
    let mut summary = WriteSummary::default();
    let mut buffer = Vec::new();

    for StreamUnit { handle, records } in input.iter() {
        buffer.extend(records);
        summary.units += 1;

        if let Err(e) = sink.rewrite_all(&buffer) {
            #[cfg(feature = "logging")]
            tracing::error!("重写输出失败（来源 {}）: {}", handle.path().display(), e);
            summary.failures.push(FileFailure::new(
                FailureStage::Write,
                Some(handle.path().to_path_buf()),
                e.to_string(),
            ));
        }
    }

    if let Err(e) = sink.finalize() {
        #[cfg(feature = "logging")]
        tracing::error!("流式流水线 flush 失败: {}", e);
        summary
            .failures
            .push(FileFailure::new(FailureStage::Write, None, e.to_string()));
    }
    summary.stats = sink.get_stats();

    if done.send(summary).is_err() {
        #[cfg(feature = "logging")]
        tracing::warn!("流水线驱动已退出，完成信号无人接收");
    }
}
