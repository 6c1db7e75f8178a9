use super::compile::compile_predicate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::Predicate;
use crate::repository::store::{RecordStore, UnitOfWork, WorkScope};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// Record - 表映射描述
// ==========================================
// 红线: COLUMNS 顺序 = from_row 读取顺序 = to_values 写入顺序
pub trait Record: Sized + Send + Sync + 'static {
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    const COLUMNS: &'static [&'static str];
    const DEFAULT_ORDER: &'static str;

    fn key(&self) -> &str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn to_values(&self) -> Vec<Value>;

    /// 对象图路径 (如 `status.is_terminal`) → SQL 表达式
    fn resolve_path(_path: &str) -> Option<String> {
        None
    }

    /// 字段路径解析: 先匹配本表列, 再匹配对象图路径
    fn resolve_field(path: &str) -> RepositoryResult<String> {
        if Self::COLUMNS.contains(&path) {
            return Ok(format!("{}.{}", Self::TABLE, path));
        }
        Self::resolve_path(path).ok_or_else(|| RepositoryError::UnsupportedField {
            entity: Self::ENTITY.to_string(),
            field: path.to_string(),
        })
    }
}

// ==========================================
// SqliteStore - 通用记录仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct SqliteStore<T> {
    conn: Arc<Mutex<Connection>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SqliteStore<T> {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn select_sql(where_clause: &str, limit: Option<usize>) -> String {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            T::COLUMNS.join(", "),
            T::TABLE,
            where_clause,
            T::DEFAULT_ORDER
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        sql
    }

    fn query(&self, predicate: &Predicate, limit: Option<usize>) -> RepositoryResult<Vec<T>> {
        let mut params = Vec::new();
        let where_clause = compile_predicate::<T>(predicate, &mut params)?;
        let sql = Self::select_sql(&where_clause, limit);

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| T::from_row(row))?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl<T: Record> RecordStore<T> for SqliteStore<T> {
    fn find(&self, predicate: &Predicate) -> RepositoryResult<Option<T>> {
        Ok(self.query(predicate, Some(1))?.into_iter().next())
    }

    fn find_all(&self, predicate: &Predicate) -> RepositoryResult<Vec<T>> {
        self.query(predicate, None)
    }

    fn find_by_key(&self, key: &str) -> RepositoryResult<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            T::COLUMNS.join(", "),
            T::TABLE,
            T::KEY_COLUMN
        );
        let conn = self.get_conn()?;
        let record = conn
            .query_row(&sql, [key], |row| T::from_row(row))
            .optional()?;
        Ok(record)
    }

    fn count(&self, predicate: &Predicate) -> RepositoryResult<usize> {
        let mut params = Vec::new();
        let where_clause = compile_predicate::<T>(predicate, &mut params)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", T::TABLE, where_clause);

        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    fn insert(&self, record: &T) -> RepositoryResult<()> {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let conn = self.get_conn()?;
        conn.execute(&sql, params_from_iter(record.to_values()))?;
        Ok(())
    }

    fn update(&self, record: &T) -> RepositoryResult<()> {
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            T::TABLE,
            assignments.join(", "),
            T::KEY_COLUMN,
            T::COLUMNS.len() + 1
        );

        let mut values = record.to_values();
        values.push(Value::Text(record.key().to_string()));

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::not_found(T::ENTITY, record.key()));
        }
        Ok(())
    }

    fn delete(&self, record: &T) -> RepositoryResult<()> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, T::KEY_COLUMN);
        let conn = self.get_conn()?;
        conn.execute(&sql, [record.key()])?;
        Ok(())
    }
}

// ==========================================
// SqliteUnitOfWork - 事务边界
// ==========================================
// 与各 SqliteStore 共享同一连接; 连接已在事务中时 begin 不再开启新事务
pub struct SqliteUnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl UnitOfWork for SqliteUnitOfWork {
    fn begin(&self) -> RepositoryResult<WorkScope> {
        let conn = self.get_conn()?;
        if !conn.is_autocommit() {
            return Ok(WorkScope::new(false));
        }
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        Ok(WorkScope::new(true))
    }

    fn commit(&self, scope: WorkScope) -> RepositoryResult<()> {
        if !scope.is_owner() {
            return Ok(());
        }
        let conn = self.get_conn()?;
        conn.execute_batch("COMMIT")
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))
    }

    fn rollback(&self, scope: WorkScope) -> RepositoryResult<()> {
        if !scope.is_owner() {
            return Ok(());
        }
        let conn = self.get_conn()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK")
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))
    }
}
