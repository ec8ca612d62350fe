//! 输出统计信息模块

use std::time::{Duration, Instant};

/// 输出统计信息
#[derive(Debug, Default, Clone)]
pub struct SinkStats {
    /// 当前输出中的记录数
    pub written_records: usize,
    /// 写入失败的记录数
    pub failed_records: usize,
    /// 整体重写次数
    pub rewrites: usize,
    /// 所有写入（含重写）累计输出的行数
    pub emitted_rows: usize,
    /// 开始时间
    pub start_time: Option<Instant>,
    /// 完成时间
    pub end_time: Option<Instant>,
}

impl SinkStats {
    /// 创建新的统计信息，记录开始时间
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 标记完成，记录结束时间
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// 计算持续时间
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// 写放大倍数：累计输出行数 / 最终记录数
    pub fn write_amplification(&self) -> f64 {
        if self.written_records > 0 {
            self.emitted_rows as f64 / self.written_records as f64
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for SinkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "成功: {}, 失败: {}, 重写: {}, 累计输出: {}, 写放大: {:.2}",
            self.written_records,
            self.failed_records,
            self.rewrites,
            self.emitted_rows,
            self.write_amplification()
        )?;

        if let Some(duration) = self.duration() {
            write!(f, ", 耗时: {:.2}s", duration.as_secs_f64())?;
        }

        Ok(())
    }
}
