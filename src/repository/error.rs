// ==========================================
// 合规提醒引擎 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束映射按 SQLite 扩展错误码判定, 不依赖错误文本
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 记录 =====
    #[error("记录未找到: {entity} with key={key}")]
    NotFound { entity: String, key: String },

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 连接与事务 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("工作单元失败: {0}")]
    TransactionError(String),

    #[error("SQL 执行失败: {0}")]
    QueryError(String),

    // ===== 谓词与映射 =====
    #[error("不支持的查询字段: {entity}.{field}")]
    UnsupportedField { entity: String, field: String },

    #[error("列值无法映射 (column={column}): {message}")]
    FieldValueError { column: String, message: String },
}

impl RepositoryError {
    pub fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    /// 唯一键 / 主键冲突 (幂等写入据此判定"已存在")
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message) => {
                let text = message.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(text)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(text),
                    _ => RepositoryError::QueryError(text),
                }
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, cause) => {
                RepositoryError::FieldValueError {
                    column: format!("#{}", idx),
                    message: cause.to_string(),
                }
            }
            rusqlite::Error::InvalidColumnType(idx, name, ty) => RepositoryError::FieldValueError {
                column: format!("#{} {}", idx, name),
                message: format!("unexpected {}", ty),
            },
            other => RepositoryError::QueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
