// Predicate → SQL WHERE 子句 (参数化)

use super::row::{DATETIME_FORMAT, DATE_FORMAT};
use super::store::Record;
use crate::repository::error::RepositoryResult;
use crate::repository::query::{CmpOp, Predicate, QueryValue};
use rusqlite::types::Value;

fn to_sql_value(value: &QueryValue) -> Value {
    match value {
        QueryValue::Null => Value::Null,
        QueryValue::Bool(b) => Value::Integer(if *b { 1 } else { 0 }),
        QueryValue::Int(i) => Value::Integer(*i),
        QueryValue::Real(r) => Value::Real(*r),
        QueryValue::Text(s) => Value::Text(s.clone()),
        QueryValue::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        QueryValue::DateTime(dt) => Value::Text(dt.format(DATETIME_FORMAT).to_string()),
    }
}

/// 编译查询条件
///
/// # 参数
/// - predicate: 查询条件
/// - params: 参数输出 (按 ?N 顺序追加)
///
/// # 返回
/// - WHERE 子句表达式; 字段路径无法解析时返回 UnsupportedField
pub fn compile_predicate<T: Record>(
    predicate: &Predicate,
    params: &mut Vec<Value>,
) -> RepositoryResult<String> {
    match predicate {
        Predicate::True => Ok("1".to_string()),
        Predicate::Compare { field, op, value } => {
            let expr = T::resolve_field(field)?;
            if value.is_null() {
                // 与 NULL 的比较: 只有 = / <> 有意义
                return Ok(match op {
                    CmpOp::Eq => format!("{} IS NULL", expr),
                    CmpOp::Ne => format!("{} IS NOT NULL", expr),
                    _ => "0".to_string(),
                });
            }
            params.push(to_sql_value(value));
            Ok(format!("{} {} ?{}", expr, op.symbol(), params.len()))
        }
        Predicate::IsNull(field) => {
            let expr = T::resolve_field(field)?;
            Ok(format!("{} IS NULL", expr))
        }
        Predicate::And(items) => compile_group::<T>(items, " AND ", "1", params),
        Predicate::Or(items) => compile_group::<T>(items, " OR ", "0", params),
        Predicate::Not(inner) => {
            let clause = compile_predicate::<T>(inner, params)?;
            Ok(format!("NOT ({})", clause))
        }
    }
}

fn compile_group<T: Record>(
    items: &[Predicate],
    separator: &str,
    empty: &str,
    params: &mut Vec<Value>,
) -> RepositoryResult<String> {
    if items.is_empty() {
        return Ok(empty.to_string());
    }
    let clauses = items
        .iter()
        .map(|p| compile_predicate::<T>(p, params))
        .collect::<RepositoryResult<Vec<_>>>()?;
    Ok(format!("({})", clauses.join(separator)))
}
