// ==========================================
// 合规提醒引擎 - SQLite 持久化实现
// ==========================================
// 职责: RecordStore / UnitOfWork 的 SQLite 实现
// 约束: 所有查询使用参数化, 字段路径只能解析为记录类型声明过的表达式
// ==========================================

mod compile;
mod records;
mod row;
mod store;


pub use compile::compile_predicate;
pub use store::{Record, SqliteStore, SqliteUnitOfWork};
