//! 用户记录类型定义

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 输入文件的列数
pub const INPUT_COLUMNS: usize = 7;

/// 输出文件的列数
pub const OUTPUT_COLUMNS: usize = 6;

/// 字段内容错误的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// id 非数字时置 0，生日无法解析时置零日期，不报错
    #[default]
    Lenient,
    /// 字段内容错误直接报错
    Strict,
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("未知的解析模式: {other}")),
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// 单行数据转换失败的原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("字段数不足: 期望 {expected}，实际 {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("无效的 id: {0:?}")]
    InvalidId(String),
    #[error("无效的生日 (需要 YYYY/MM/DD): {0:?}")]
    InvalidBirthday(String),
    #[error("第 {field} 列不是有效的 UTF-8")]
    InvalidEncoding { field: usize },
}

/// 零日期 0001-01-01，生日无法解析时使用
#[must_use]
pub fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// 单个用户记录，构造后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    gender: String,
    country: String,
    birthday: NaiveDate,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: 0,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            gender: String::new(),
            country: String::new(),
            birthday: zero_date(),
        }
    }
}

impl Record {
    /// 直接构造记录
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        gender: impl Into<String>,
        country: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            gender: gender.into(),
            country: country.into(),
            birthday,
        }
    }

    /// 从一行输入字段构造记录
    ///
    /// 列顺序: `id, first_name, last_name, email, gender, country, birthday`。
    /// 宽松模式下 id 非数字得到 0，生日无法解析得到 [`zero_date`]。
    pub fn from_row<S: AsRef<str>>(row: &[S], mode: ParseMode) -> Result<Self, RowError> {
        if row.len() < INPUT_COLUMNS {
            return Err(RowError::MissingFields {
                expected: INPUT_COLUMNS,
                found: row.len(),
            });
        }

        let raw_id = row[0].as_ref();
        let id = match (raw_id.parse::<i64>(), mode) {
            (Ok(id), _) => id,
            (Err(_), ParseMode::Lenient) => 0,
            (Err(_), ParseMode::Strict) => {
                return Err(RowError::InvalidId(raw_id.to_string()));
            }
        };

        let raw_birthday = row[6].as_ref();
        let birthday = match (parse_birthday(raw_birthday), mode) {
            (Some(date), _) => date,
            (None, ParseMode::Lenient) => zero_date(),
            (None, ParseMode::Strict) => {
                return Err(RowError::InvalidBirthday(raw_birthday.to_string()));
            }
        };

        Ok(Self {
            id,
            first_name: row[1].as_ref().to_string(),
            last_name: row[2].as_ref().to_string(),
            email: row[3].as_ref().to_string(),
            gender: row[4].as_ref().to_string(),
            country: row[5].as_ref().to_string(),
            birthday,
        })
    }

    /// 转换为输出行: `id, "first last", email, country, gender, YYYY-MM-DD`
    ///
    /// 注意 country 与 gender 的顺序和输入相反，姓名合并为一列。
    #[must_use]
    pub fn to_row(&self) -> [String; OUTPUT_COLUMNS] {
        [
            self.id.to_string(),
            format!("{} {}", self.first_name, self.last_name),
            self.email.clone(),
            self.country.clone(),
            self.gender.clone(),
            format_birthday(self.birthday),
        ]
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn birthday(&self) -> NaiveDate {
        self.birthday
    }
}

/// 解析 `YYYY/MM/DD`，要求四位年、两位月和两位日
#[must_use]
pub fn parse_birthday(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'/' || b[7] != b'/' {
        return None;
    }

    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        b[range].iter().try_fold(0u32, |acc, c| {
            c.is_ascii_digit().then(|| acc * 10 + u32::from(c - b'0'))
        })
    };

    let year = digits(0..4)?;
    let month = digits(5..7)?;
    let day = digits(8..10)?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// 按 `YYYY-MM-DD` 输出日期，零日期输出 `0001-01-01`
#[must_use]
pub fn format_birthday(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}
