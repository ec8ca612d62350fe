//! 用户记录模块
//!
//! 提供记录类型、CSV 解析和输入文件句柄

pub mod io;
pub mod parser;
pub mod types;

// 重新导出核心类型和函数
pub use io::SourceHandle;
pub use parser::RecordParser;
pub use types::{
    INPUT_COLUMNS, OUTPUT_COLUMNS, ParseMode, Record, RowError, format_birthday,
    parse_birthday, zero_date,
};
