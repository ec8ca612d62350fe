//! 用户 CSV 解析器
//!
//! 输入格式：逗号分隔，`#` 开头的行为注释，第一行固定为表头并跳过，
//! 其余每行七列 `id, first_name, last_name, email, gender, country, birthday`。
//!
//! 结构错误（列数与表头不一致、引号不闭合等）返回 [`IngestError::Parse`]；
//! 字段内容错误按 [`ParseMode`] 处理。

use crate::error::{IngestError, Result};
use crate::record::io::SourceHandle;
use crate::record::types::{ParseMode, Record, RowError};
use csv::ByteRecord;
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

/// 用户 CSV 解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser {
    mode: ParseMode,
}

impl RecordParser {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    fn reader_builder() -> csv::ReaderBuilder {
        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(b',')
            .comment(Some(b'#'))
            .has_headers(true)
            .flexible(false);
        rb
    }

    /// 解析整个已打开的文件
    pub fn parse_handle(&self, handle: &mut SourceHandle) -> Result<Vec<Record>> {
        let path = handle.path().to_path_buf();
        self.parse_reader(handle.reader(), &path)
    }

    /// 从任意读取器解析，`source` 仅用于错误信息
    pub fn parse_reader<R: Read>(&self, reader: R, source: &Path) -> Result<Vec<Record>> {
        let mut csv_reader = Self::reader_builder().from_reader(reader);
        let mut records = Vec::new();
        let mut row = ByteRecord::new();

        loop {
            match csv_reader.read_byte_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    let line = e.position().map(|p| p.line());
                    return Err(IngestError::parse(source, line, e.to_string()));
                }
            }

            let record = self
                .decode_fields(&row)
                .and_then(|fields| Record::from_row(&fields, self.mode))
                .map_err(|e| {
                    IngestError::parse(source, row.position().map(|p| p.line()), e.to_string())
                })?;
            records.push(record);
        }

        #[cfg(feature = "logging")]
        tracing::debug!("解析完成 {}: {} 条记录", source.display(), records.len());

        Ok(records)
    }

    /// 按 UTF-8 解码字段，宽松模式下无效字节替换为 U+FFFD
    fn decode_fields<'r>(
        &self,
        row: &'r ByteRecord,
    ) -> std::result::Result<Vec<Cow<'r, str>>, RowError> {
        row.iter()
            .enumerate()
            .map(|(field, bytes)| match (std::str::from_utf8(bytes), self.mode) {
                (Ok(text), _) => Ok(Cow::Borrowed(text)),
                (Err(_), ParseMode::Lenient) => Ok(String::from_utf8_lossy(bytes)),
                (Err(_), ParseMode::Strict) => Err(RowError::InvalidEncoding { field }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,first_name,last_name,email,gender,country,birthday\n";

    fn parse(content: &str, mode: ParseMode) -> Result<Vec<Record>> {
        parse_bytes(content.as_bytes(), mode)
    }

    fn parse_bytes(content: &[u8], mode: ParseMode) -> Result<Vec<Record>> {
        RecordParser::new(mode).parse_reader(content, Path::new("mem.csv"))
    }

    #[test]
    fn test_header_is_skipped() {
        let content = format!(
            "{HEADER}1,Ada,Lovelace,ada@x.io,Female,UK,1815/12/10\n\
             2,Alan,Turing,alan@x.io,Male,UK,1912/06/23\n"
        );
        let records = parse(&content, ParseMode::Lenient).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), 1);
        assert_eq!(records[1].last_name(), "Turing");
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let content = format!(
            "# exported users\n{HEADER}\n# a comment\n\
             1,Ada,Lovelace,ada@x.io,Female,UK,1815/12/10\n\n"
        );
        let records = parse(&content, ParseMode::Lenient).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(parse("", ParseMode::Lenient).unwrap().is_empty());
        assert!(parse(HEADER, ParseMode::Lenient).unwrap().is_empty());
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let content = format!("{HEADER}3,\"Smith, Jr\",Doe,j@x.io,Male,US,2000/01/02\n");
        let records = parse(&content, ParseMode::Lenient).unwrap();
        assert_eq!(records[0].first_name(), "Smith, Jr");
    }

    #[test]
    fn test_unequal_row_length_is_parse_error() {
        let content = format!("{HEADER}1,Ada,Lovelace\n");
        let err = parse(&content, ParseMode::Lenient).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_short_header_file_is_parse_error() {
        let err = parse("a,b,c\n1,2,3\n", ParseMode::Lenient).unwrap_err();
        match err {
            IngestError::Parse { line, .. } => assert_eq!(line, Some(2)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_strict_mode_reports_field_errors() {
        let content = format!("{HEADER}x,Ada,Lovelace,ada@x.io,Female,UK,1815/12/10\n");
        assert!(parse(&content, ParseMode::Lenient).is_ok());
        assert!(parse(&content, ParseMode::Strict).unwrap_err().is_parse_error());
    }

    #[test]
    fn test_invalid_utf8_field_is_tolerated() {
        let mut content = HEADER.as_bytes().to_vec();
        content.extend_from_slice(b"1,Ren\xe9,Dupont,rene@x.io,Male,FR,1980/03/04\n");
        content.extend_from_slice(b"2,Ana,Lima,ana@x.io,Female,BR,1991/07/08\n");

        let records = parse_bytes(&content, ParseMode::Lenient).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_name(), "Ren\u{FFFD}");
        assert_eq!(records[0].last_name(), "Dupont");
        assert_eq!(records[1].first_name(), "Ana");
    }

    #[test]
    fn test_invalid_utf8_field_rejected_in_strict_mode() {
        let mut content = HEADER.as_bytes().to_vec();
        content.extend_from_slice(b"1,Ren\xe9,Dupont,rene@x.io,Male,FR,1980/03/04\n");

        match parse_bytes(&content, ParseMode::Strict).unwrap_err() {
            IngestError::Parse { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
