//! CSV 输出端实现
//!
//! 输出六列且不写表头：`id, "first last", email, country, gender, YYYY-MM-DD`。

use super::{RecordSink, SinkStats};
use crate::error::{IngestError, Result};
use crate::record::Record;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};

/// CSV 文件输出端
///
/// 文件在构造时创建（即使之后没有任何记录也会留下空文件），
/// 输出端被丢弃时关闭。
pub struct CsvSink {
    path: PathBuf,
    writer: ::csv::Writer<File>,
    stats: SinkStats,
}

impl CsvSink {
    /// 创建输出文件，必要时创建上级目录
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let writer = ::csv::WriterBuilder::new().has_headers(false).from_writer(file);

        #[cfg(feature = "logging")]
        tracing::debug!("创建 CSV 输出: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            stats: SinkStats::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, record: &Record) -> Result<()> {
        self.writer.write_record(&record.to_row()).map_err(|e| {
            IngestError::write(format!(
                "写入 {} 失败 (id={}): {}",
                self.path.display(),
                record.id(),
                e
            ))
        })
    }

    fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let mut file = self.writer.get_ref();
        file.set_len(0)?;
        file.rewind()?;
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        "CSV"
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        match self.append(record) {
            Ok(()) => {
                self.stats.written_records += 1;
                self.stats.emitted_rows += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.failed_records += 1;
                Err(e)
            }
        }
    }

    fn rewrite_all(&mut self, records: &[Record]) -> Result<()> {
        self.truncate()?;
        self.stats.written_records = 0;

        for record in records {
            self.write_record(record)?;
        }
        self.writer.flush()?;
        self.stats.rewrites += 1;

        #[cfg(feature = "logging")]
        tracing::trace!("重写 {}: {} 条记录", self.path.display(), records.len());

        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.stats.finish();

        #[cfg(feature = "logging")]
        tracing::info!("CSV输出完成 {}: {}", self.path.display(), self.stats);

        Ok(())
    }

    fn get_stats(&self) -> SinkStats {
        self.stats.clone()
    }
}
