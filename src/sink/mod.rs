//! 输出模块
//!
//! 一次流水线运行共享一个输出端，所有写入者都必须经过同一个串行化点。

use crate::error::Result;
use crate::record::Record;

pub mod csv;
pub mod stats;

pub use self::csv::CsvSink;
pub use stats::SinkStats;

/// 记录输出端的统一接口
pub trait RecordSink: Send {
    /// 输出端名称
    fn name(&self) -> &str;

    /// 追加单条记录
    fn write_record(&mut self, record: &Record) -> Result<()>;

    /// 批量追加记录
    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// 丢弃已有输出，用 `records` 整体重写
    fn rewrite_all(&mut self, records: &[Record]) -> Result<()>;

    /// 完成输出，刷新缓冲
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }

    /// 获取统计信息
    fn get_stats(&self) -> SinkStats {
        SinkStats::default()
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        (**self).write_record(record)
    }

    fn write_batch(&mut self, records: &[Record]) -> Result<()> {
        (**self).write_batch(records)
    }

    fn rewrite_all(&mut self, records: &[Record]) -> Result<()> {
        (**self).rewrite_all(records)
    }

    fn finalize(&mut self) -> Result<()> {
        (**self).finalize()
    }

    fn get_stats(&self) -> SinkStats {
        (**self).get_stats()
    }
}
