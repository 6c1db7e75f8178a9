// 行映射辅助: 日期统一以 TEXT 存储 ("%Y-%m-%d" / "%Y-%m-%d %H:%M:%S")

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Type, Value};
use rusqlite::Row;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub(crate) fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| conversion_error(idx, format!("日期格式错误 '{}': {}", raw, e)))
}

pub(crate) fn get_opt_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => get_date(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn get_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .map_err(|e| conversion_error(idx, format!("时间格式错误 '{}': {}", raw, e)))
}

pub(crate) fn get_opt_datetime(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => get_datetime(row, idx).map(Some),
        None => Ok(None),
    }
}

/// 读取枚举代码列
pub(crate) fn get_code<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("未知代码: {}", raw)))
}

pub(crate) fn get_opt_code<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => get_code(row, idx, parse).map(Some),
        None => Ok(None),
    }
}

// ===== 写入值构造 =====

pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub(crate) fn opt_text(s: Option<&str>) -> Value {
    s.map(text).unwrap_or(Value::Null)
}

pub(crate) fn int(v: i64) -> Value {
    Value::Integer(v)
}

pub(crate) fn opt_int(v: Option<i64>) -> Value {
    v.map(Value::Integer).unwrap_or(Value::Null)
}

pub(crate) fn flag(v: bool) -> Value {
    Value::Integer(if v { 1 } else { 0 })
}

pub(crate) fn opt_real(v: Option<f64>) -> Value {
    v.map(Value::Real).unwrap_or(Value::Null)
}

pub(crate) fn date(d: NaiveDate) -> Value {
    Value::Text(d.format(DATE_FORMAT).to_string())
}

pub(crate) fn opt_date(d: Option<NaiveDate>) -> Value {
    d.map(date).unwrap_or(Value::Null)
}

pub(crate) fn datetime(dt: NaiveDateTime) -> Value {
    Value::Text(dt.format(DATETIME_FORMAT).to_string())
}

pub(crate) fn opt_datetime(dt: Option<NaiveDateTime>) -> Value {
    dt.map(datetime).unwrap_or(Value::Null)
}
