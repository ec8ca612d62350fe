//! 扇出/扇入流水线
//!
//! 三个阶段依次执行，阶段之间有汇合屏障：
//!
//! ```text
//! 发现 → [打开: 每个路径一个任务] → 屏障 → [解析: 每个句柄一个任务] → 屏障
//!      → [写入: 每条记录一个任务, 共用一把输出锁] → 屏障 → flush
//! ```
//!
//! 各阶段结果通过 [`Aggregator`](super::aggregate::Aggregator) 汇总，
//! 任何阶段的失败都不会终止运行，而是记录在 [`RunReport::failures`] 中。
//! 输出行的顺序取决于任务获得锁的顺序，不保证确定。

use super::Pipeline;
use super::aggregate::{Aggregate, fan_out_blocking};
use super::types::{
    FailureStage, FileFailure, PipelineKind, PipelineOptions, RunReport, WorkerOutcome,
};
use crate::discovery;
use crate::error::Result;
use crate::record::{Record, RecordParser, SourceHandle};
use crate::sink::RecordSink;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 扇出/扇入流水线
pub struct FanOutPipeline<S> {
    sink: Arc<Mutex<S>>,
    parser: RecordParser,
    options: PipelineOptions,
}

impl<S: RecordSink + 'static> FanOutPipeline<S> {
    pub fn new(sink: S, options: PipelineOptions) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
            parser: RecordParser::new(options.parse_mode),
            options,
        }
    }

    fn cancelled(&self, report: &mut RunReport) -> bool {
        if self.options.cancel.is_cancelled() {
            #[cfg(feature = "logging")]
            tracing::warn!("扇出流水线收到取消请求，停止派发新任务");
            report.cancelled = true;
        }
        report.cancelled
    }

    /// 在已有的 tokio 运行时中执行
    pub async fn run_async(self, root: PathBuf) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(PipelineKind::FanOut);

        let paths = tokio::task::spawn_blocking(move || discovery::discover(root)).await??;
        report.discovered_files = paths.len();

        #[cfg(feature = "logging")]
        if let Ok(sink) = self.sink.lock() {
            tracing::info!(
                "扇出流水线开始处理 {} 个文件，输出端: {}",
                paths.len(),
                sink.name()
            );
        }

        let mut records = Vec::new();
        if !self.cancelled(&mut report) {
            let opened = open_all(paths).await?;
            report.failures.extend(opened.failures);

            if !self.cancelled(&mut report) {
                let parsed = parse_all(self.parser, opened.items).await?;
                report.parsed_files = parsed.items.len();
                report.failures.extend(parsed.failures);
                records = parsed.items.into_iter().flatten().collect();
            }
        }
        report.records_parsed = records.len();

        if !self.cancelled(&mut report) {
            let written = write_all(&self.sink, records).await?;
            report.records_written = written.items.len();
            report.failures.extend(written.failures);
        }

        match self.sink.lock() {
            Ok(mut sink) => {
                if let Err(e) = sink.finalize() {
                    #[cfg(feature = "logging")]
                    tracing::error!("扇出流水线 flush 失败: {}", e);
                    report
                        .failures
                        .push(FileFailure::new(FailureStage::Write, None, e.to_string()));
                }
                report.emitted_rows = sink.get_stats().emitted_rows;
            }
            Err(_) => report.failures.push(FileFailure::new(
                FailureStage::Write,
                None,
                "输出端锁已损坏",
            )),
        }

        report.duration = start.elapsed();

        #[cfg(feature = "logging")]
        tracing::info!("扇出流水线完成: {}", report);

        Ok(report)
    }
}

impl<S: RecordSink + 'static> Pipeline for FanOutPipeline<S> {
    fn kind(&self) -> PipelineKind {
        PipelineKind::FanOut
    }

    /// 创建专用的多线程运行时并阻塞等待完成
    ///
    /// 不能在 tokio 运行时内部调用，此时请使用 [`FanOutPipeline::run_async`]。
    fn run<P: AsRef<Path>>(self, root: P) -> Result<RunReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("fan-out-worker")
            .build()?;
        runtime.block_on(self.run_async(root.as_ref().to_path_buf()))
    }
}

async fn open_all(paths: Vec<PathBuf>) -> Result<Aggregate<SourceHandle>> {
    fan_out_blocking(paths, FailureStage::Open, |path: PathBuf| {
        match SourceHandle::open(&path) {
            Ok(handle) => WorkerOutcome::Completed(handle),
            Err(e) => WorkerOutcome::Failed(FileFailure::new(
                FailureStage::Open,
                Some(path),
                e.to_string(),
            )),
        }
    })
    .await
}

async fn parse_all(
    parser: RecordParser,
    handles: Vec<SourceHandle>,
) -> Result<Aggregate<Vec<Record>>> {
    fan_out_blocking(handles, FailureStage::Parse, move |mut handle: SourceHandle| {
        match parser.parse_handle(&mut handle) {
            Ok(records) => WorkerOutcome::Completed(records),
            Err(e) => {
                #[cfg(feature = "logging")]
                tracing::warn!("丢弃文件 {} 的解析结果: {}", handle.path().display(), e);
                WorkerOutcome::Failed(FileFailure::new(
                    FailureStage::Parse,
                    Some(handle.path().to_path_buf()),
                    e.to_string(),
                ))
            }
        }
    })
    .await
}

/// 每条记录一个阻塞写入任务，所有任务经过同一把锁访问输出端
async fn write_all<S: RecordSink + 'static>(
    sink: &Arc<Mutex<S>>,
    records: Vec<Record>,
) -> Result<Aggregate<()>> {
    let sink = Arc::clone(sink);
    fan_out_blocking(records, FailureStage::Write, move |record: Record| {
        write_one(&sink, &record)
    })
    .await
}

fn write_one<S: RecordSink>(sink: &Mutex<S>, record: &Record) -> WorkerOutcome<()> {
    let Ok(mut sink) = sink.lock() else {
        return WorkerOutcome::Failed(FileFailure::new(FailureStage::Write, None, "输出端锁已损坏"));
    };

    match sink.write_record(record) {
        Ok(()) => WorkerOutcome::Completed(()),
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::warn!("记录 {} 写入失败: {}", record.id(), e);
            WorkerOutcome::Failed(FileFailure::new(FailureStage::Write, None, e.to_string()))
        }
    }
}
