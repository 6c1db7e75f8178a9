// ==========================================
// 合规提醒引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: "无事可做" 不是错误, 以计数 0 返回
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("无效的期间参数: {0}")]
    InvalidPeriod(String),

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("模板引擎初始化失败: {0}")]
    Template(#[from] regex::Error),

    #[error("配置读取失败: {0}")]
    Config(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
