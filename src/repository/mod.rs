// ==========================================
// 合规提醒引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供持久化端口 (RecordStore / UnitOfWork / Predicate) 及其 SQLite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod query;
pub mod sqlite;
pub mod store;

pub use error::{RepositoryError, RepositoryResult};
pub use query::{CmpOp, Predicate, QueryValue};
pub use sqlite::{Record, SqliteStore, SqliteUnitOfWork};
pub use store::{in_unit_of_work, RecordStore, UnitOfWork, WorkScope};
