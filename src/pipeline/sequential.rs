//! 顺序流水线
//!
//! 按发现顺序打开所有文件，逐个完整解析并按“文件 → 行”的顺序累积，
//! 最后一次性写入输出端。任何错误都会立即终止运行，且不会产生部分写入。

use super::Pipeline;
use super::types::{PipelineKind, PipelineOptions, RunReport};
use crate::discovery;
use crate::error::{IngestError, Result};
use crate::record::{RecordParser, SourceHandle};
use crate::sink::RecordSink;
use std::path::Path;
use std::time::Instant;

/// 顺序流水线
pub struct SequentialPipeline<S> {
    sink: S,
    parser: RecordParser,
    options: PipelineOptions,
}

impl<S: RecordSink> SequentialPipeline<S> {
    pub fn new(sink: S, options: PipelineOptions) -> Self {
        Self {
            sink,
            parser: RecordParser::new(options.parse_mode),
            options,
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.options.cancel.is_cancelled() {
            #[cfg(feature = "logging")]
            tracing::warn!("顺序流水线收到取消请求");
            return Err(IngestError::Cancelled);
        }
        Ok(())
    }
}

impl<S: RecordSink> Pipeline for SequentialPipeline<S> {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Sequential
    }

    fn run<P: AsRef<Path>>(mut self, root: P) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(self.kind());

        let paths = discovery::discover(root)?;
        report.discovered_files = paths.len();

        #[cfg(feature = "logging")]
        tracing::info!(
            "顺序流水线开始处理 {} 个文件，输出端: {}",
            paths.len(),
            self.sink.name()
        );

        let mut handles = Vec::with_capacity(paths.len());
        for path in &paths {
            self.check_cancelled()?;
            handles.push(SourceHandle::open(path)?);
        }

        let mut records = Vec::new();
        for mut handle in handles {
            self.check_cancelled()?;
            let parsed = self.parser.parse_handle(&mut handle)?;

            #[cfg(feature = "logging")]
            tracing::debug!(
                "文件 {} 解析出 {} 条记录",
                handle.path().display(),
                parsed.len()
            );

            records.extend(parsed);
            report.parsed_files += 1;
        }
        report.records_parsed = records.len();

        self.sink.write_batch(&records)?;
        self.sink.finalize()?;

        let stats = self.sink.get_stats();
        report.records_written = stats.written_records;
        report.emitted_rows = stats.emitted_rows;
        report.duration = start.elapsed();

        #[cfg(feature = "logging")]
        tracing::info!("顺序流水线完成: {}", report);

        Ok(report)
    }
}
