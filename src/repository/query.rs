// ==========================================
// 合规提醒引擎 - 查询条件 (Predicate)
// ==========================================
// 职责: 与存储无关的可组合查询条件
// 形式: 字段路径 + 运算符 + 值, 经 AND / OR / NOT 组合
// 红线: 不含任何 SQL; 字段路径由各存储实现自行解析
// ==========================================

use crate::domain::types::{
    DeliveryStatus, NotificationChannel, ObligationStatus, RiskRating, TimelineKind,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// 查询值
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl QueryValue {
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::Int(v as i64)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Int(v as i64)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Real(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Text(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Text(v)
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        QueryValue::Text(v.clone())
    }
}

impl From<NaiveDate> for QueryValue {
    fn from(v: NaiveDate) -> Self {
        QueryValue::Date(v)
    }
}

impl From<NaiveDateTime> for QueryValue {
    fn from(v: NaiveDateTime) -> Self {
        QueryValue::DateTime(v)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => QueryValue::Null,
        }
    }
}

macro_rules! code_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(v: $ty) -> Self {
                    QueryValue::Text(v.as_str().to_string())
                }
            }
        )*
    };
}

code_value!(ObligationStatus, DeliveryStatus, NotificationChannel, RiskRating, TimelineKind);

// ==========================================
// Predicate - 可组合查询条件
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// 恒真 (不过滤)
    True,
    Compare {
        field: String,
        op: CmpOp,
        value: QueryValue,
    },
    IsNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn all() -> Self {
        Predicate::True
    }

    fn compare(field: &str, op: CmpOp, value: impl Into<QueryValue>) -> Self {
        Predicate::Compare {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    /// 相等; 值缺省时等价于 IS NULL
    pub fn eq(field: &str, value: impl Into<QueryValue>) -> Self {
        match value.into() {
            QueryValue::Null => Predicate::IsNull(field.to_string()),
            v => Self::compare(field, CmpOp::Eq, v),
        }
    }

    /// 不等; 值缺省时等价于 IS NOT NULL
    pub fn ne(field: &str, value: impl Into<QueryValue>) -> Self {
        match value.into() {
            QueryValue::Null => Predicate::is_not_null(field),
            v => Self::compare(field, CmpOp::Ne, v),
        }
    }

    pub fn lt(field: &str, value: impl Into<QueryValue>) -> Self {
        Self::compare(field, CmpOp::Lt, value)
    }

    pub fn le(field: &str, value: impl Into<QueryValue>) -> Self {
        Self::compare(field, CmpOp::Le, value)
    }

    pub fn gt(field: &str, value: impl Into<QueryValue>) -> Self {
        Self::compare(field, CmpOp::Gt, value)
    }

    pub fn ge(field: &str, value: impl Into<QueryValue>) -> Self {
        Self::compare(field, CmpOp::Ge, value)
    }

    pub fn is_null(field: &str) -> Self {
        Predicate::IsNull(field.to_string())
    }

    pub fn is_not_null(field: &str) -> Self {
        Predicate::Not(Box::new(Predicate::IsNull(field.to_string())))
    }

    /// 字段取值属于集合 (展开为 OR)
    pub fn any_of<V: Into<QueryValue>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::Or(values.into_iter().map(|v| Self::eq(field, v)).collect())
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, other) => Predicate::And(vec![p, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, other) => Predicate::Or(vec![p, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// 条件中引用到的全部字段路径
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::True => {}
            Predicate::Compare { field, .. } | Predicate::IsNull(field) => out.push(field),
            Predicate::And(items) | Predicate::Or(items) => {
                items.iter().for_each(|p| p.collect_fields(out))
            }
            Predicate::Not(inner) => inner.collect_fields(out),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Predicate], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, p) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ")")
        }
        match self {
            Predicate::True => write!(f, "TRUE"),
            Predicate::Compare { field, op, value } => {
                write!(f, "{} {} {:?}", field, op.symbol(), value)
            }
            Predicate::IsNull(field) => write!(f, "{} IS NULL", field),
            Predicate::And(items) => join(f, items, "AND"),
            Predicate::Or(items) => join(f, items, "OR"),
            Predicate::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}
