// ==========================================
// 合规提醒引擎 - 持久化端口
// ==========================================
// 职责: 引擎访问存储的唯一接口
// - RecordStore<T>: find / find_all / insert / update / delete
// - UnitOfWork: 批次提交边界
// 红线: 引擎层只依赖这里的 trait, 不感知存储引擎
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::Predicate;

/// 单一记录类型的存储接口
pub trait RecordStore<T>: Send + Sync {
    /// 查询第一条满足条件的记录 (按默认排序)
    fn find(&self, predicate: &Predicate) -> RepositoryResult<Option<T>>;

    /// 查询全部满足条件的记录 (按默认排序)
    fn find_all(&self, predicate: &Predicate) -> RepositoryResult<Vec<T>>;

    /// 按主键查询
    fn find_by_key(&self, key: &str) -> RepositoryResult<Option<T>>;

    /// 统计满足条件的记录数
    fn count(&self, predicate: &Predicate) -> RepositoryResult<usize>;

    /// 是否存在满足条件的记录
    fn exists(&self, predicate: &Predicate) -> RepositoryResult<bool> {
        Ok(self.count(predicate)? > 0)
    }

    /// 新建记录
    fn insert(&self, record: &T) -> RepositoryResult<()>;

    /// 按主键整行更新
    ///
    /// # 返回
    /// - Err(NotFound): 主键不存在
    fn update(&self, record: &T) -> RepositoryResult<()>;

    /// 按主键删除
    fn delete(&self, record: &T) -> RepositoryResult<()>;
}

/// 工作单元范围
///
/// 嵌套 begin 时只有最外层持有事务, 内层 commit/rollback 不生效
#[derive(Debug)]
#[must_use = "工作单元必须 commit 或 rollback"]
pub struct WorkScope {
    owned: bool,
}

impl WorkScope {
    pub fn new(owned: bool) -> Self {
        Self { owned }
    }

    /// 是否为最外层事务
    pub fn is_owner(&self) -> bool {
        self.owned
    }
}

/// 提交边界
pub trait UnitOfWork: Send + Sync {
    fn begin(&self) -> RepositoryResult<WorkScope>;
    fn commit(&self, scope: WorkScope) -> RepositoryResult<()>;
    fn rollback(&self, scope: WorkScope) -> RepositoryResult<()>;
}

/// 在一个工作单元内执行同步操作: 成功提交, 失败回滚
pub fn in_unit_of_work<R, E>(
    uow: &dyn UnitOfWork,
    work: impl FnOnce() -> Result<R, E>,
) -> Result<R, E>
where
    E: From<RepositoryError>,
{
    let scope = uow.begin()?;
    match work() {
        Ok(value) => {
            uow.commit(scope)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback(scope) {
                tracing::error!("工作单元回滚失败: {}", rollback_err);
            }
            Err(e)
        }
    }
}
