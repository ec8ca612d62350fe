//! 集成测试公共模块

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use user_ingest::error::{IngestError, Result};
use user_ingest::record::Record;
use user_ingest::sink::{RecordSink, SinkStats};

/// 输入文件表头
pub const HEADER: &str = "id,first_name,last_name,email,gender,country,birthday";

/// 第 `id` 个用户的输入行
pub fn user_line(id: i64) -> String {
    format!("{id},first{id},last{id},user{id}@example.com,Female,ES,1990/01/02")
}

/// 第 `id` 个用户对应的输出行
pub fn expected_output_line(id: i64) -> String {
    format!("{id},first{id} last{id},user{id}@example.com,ES,Female,1990-01-02")
}

/// 写入一个带表头的用户文件，id 从 `first_id` 开始连续 `rows` 个
pub fn write_user_file(dir: &Path, name: &str, first_id: i64, rows: usize) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let mut content = String::from(HEADER);
    content.push('\n');
    for id in first_id..first_id + rows as i64 {
        content.push_str(&user_line(id));
        content.push('\n');
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// 创建 `files` 个文件，每个 `rows` 行，id 从 1 开始按文件顺序连续编号
///
/// 文件名为 `part_00.csv`、`part_01.csv` ……，字典序即发现顺序。
pub fn create_user_tree(dir: &Path, files: usize, rows: usize) -> Vec<PathBuf> {
    (0..files)
        .map(|i| {
            write_user_file(
                dir,
                &format!("part_{i:02}.csv"),
                (i * rows) as i64 + 1,
                rows,
            )
        })
        .collect()
}

/// 写入一个结构错误（列数不一致）的文件
pub fn write_broken_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let content = format!("{HEADER}\n{}\n1,only,five,fields,here\n", user_line(900));
    fs::write(&path, content).expect("Failed to write broken file");
    path
}

/// 读取输出文件的所有行
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(str::to_string)
        .collect()
}

/// 输出文件中每行的 id
pub fn output_ids(path: &Path) -> Vec<i64> {
    read_lines(path)
        .iter()
        .map(|line| {
            line.split(',')
                .next()
                .and_then(|id| id.parse().ok())
                .expect("output line should start with an id")
        })
        .collect()
}

/// 内存输出端，测试结束后通过共享句柄检查内容
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
    stats: Arc<Mutex<SinkStats>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records().iter().map(Record::id).collect()
    }

    pub fn stats(&self) -> SinkStats {
        self.stats.lock().unwrap().clone()
    }
}

impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        let mut stats = self.stats.lock().unwrap();
        stats.written_records += 1;
        stats.emitted_rows += 1;
        Ok(())
    }

    fn rewrite_all(&mut self, records: &[Record]) -> Result<()> {
        *self.records.lock().unwrap() = records.to_vec();
        let mut stats = self.stats.lock().unwrap();
        stats.written_records = records.len();
        stats.emitted_rows += records.len();
        stats.rewrites += 1;
        Ok(())
    }

    fn get_stats(&self) -> SinkStats {
        self.stats()
    }
}

/// 每第 `every` 次写入失败的输出端
pub struct FailingSink {
    inner: MemorySink,
    every: usize,
    calls: usize,
}

impl FailingSink {
    pub fn new(inner: MemorySink, every: usize) -> Self {
        Self {
            inner,
            every,
            calls: 0,
        }
    }

    fn should_fail(&mut self) -> bool {
        self.calls += 1;
        self.calls % self.every == 0
    }
}

impl RecordSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.should_fail() {
            return Err(IngestError::write(format!("注入的写入失败 id={}", record.id())));
        }
        self.inner.write_record(record)
    }

    fn rewrite_all(&mut self, records: &[Record]) -> Result<()> {
        if self.should_fail() {
            return Err(IngestError::write("注入的重写失败"));
        }
        self.inner.rewrite_all(records)
    }

    fn get_stats(&self) -> SinkStats {
        self.inner.stats()
    }
}

/// 每次重写前休眠的输出端，用于制造背压
pub struct SlowSink {
    inner: MemorySink,
    delay: Duration,
}

impl SlowSink {
    pub fn new(inner: MemorySink, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl RecordSink for SlowSink {
    fn name(&self) -> &str {
        "slow"
    }

    fn write_record(&mut self, record: &Record) -> Result<()> {
        thread::sleep(self.delay);
        self.inner.write_record(record)
    }

    fn rewrite_all(&mut self, records: &[Record]) -> Result<()> {
        thread::sleep(self.delay);
        self.inner.rewrite_all(records)
    }

    fn get_stats(&self) -> SinkStats {
        self.inner.stats()
    }
}
