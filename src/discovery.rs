//! 输入文件发现
//!
//! 对根目录做深度优先遍历，按文件名排序，不跟随符号链接，
//! 收集所有非目录条目（不按扩展名过滤）。

use crate::error::{IngestError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 列出 `root` 下所有输入文件的绝对路径
///
/// # Errors
/// - 根路径无法转换为绝对路径时返回 [`IngestError::Discovery`]
/// - 遍历过程中出现任何错误（目录不存在、权限不足等）返回 [`IngestError::Discovery`]
pub fn discover<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let absolute = std::path::absolute(root).map_err(|e| {
        IngestError::discovery(root, format!("无法解析为绝对路径: {e}"))
    })?;

    #[cfg(feature = "logging")]
    tracing::debug!("开始遍历目录: {}", absolute.display());

    let mut paths = Vec::new();
    for entry in WalkDir::new(&absolute)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            IngestError::discovery(&absolute, format!("遍历目录失败: {e}"))
        })?;

        if entry.file_type().is_dir() {
            continue;
        }
        paths.push(entry.into_path());
    }

    #[cfg(feature = "logging")]
    tracing::info!("在 {} 下发现 {} 个文件", absolute.display(), paths.len());

    Ok(paths)
}
