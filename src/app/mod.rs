// ==========================================
// 合规提醒引擎 - 应用层
// ==========================================
// 职责: 组装共享连接、仓储、配置与引擎, 供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
