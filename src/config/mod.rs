// ==========================================
// 合规提醒引擎 - 配置层
// ==========================================
// 职责: 系统配置读取与写入
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod reminder_config_trait;
pub mod settings;

/// 配置层 Result (错误需可跨线程传递)
pub type ConfigResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use reminder_config_trait::ReminderConfigReader;
pub use settings::{ProcessingConfig, SmtpSettings, DEFAULT_ACTION_URL};
