//! 输入文件句柄

use crate::error::{IngestError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// 已打开的输入文件
///
/// 句柄只被一个解析操作使用，离开作用域即关闭文件。
#[derive(Debug)]
pub struct SourceHandle {
    path: PathBuf,
    reader: BufReader<File>,
}

impl SourceHandle {
    /// 打开输入文件
    ///
    /// # Errors
    /// 打开失败返回 [`IngestError::Open`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IngestError::open(path, e))?;

        #[cfg(feature = "logging")]
        tracing::trace!("打开输入文件: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 以读取器形式借用文件内容
    pub fn reader(&mut self) -> &mut BufReader<File> {
        &mut self.reader
    }
}
