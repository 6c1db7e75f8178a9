// ==========================================
// 合规提醒引擎 - 批次配置快照
// ==========================================
// 职责: 每批次加载一次的不可变配置结构, 批次内不再查询配置表
// ==========================================

use serde::{Deserialize, Serialize};

/// 未配置应用地址时 {{ActionUrl}} 的占位文本
pub const DEFAULT_ACTION_URL: &str = "[Application Link]";

/// 提醒处理配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// 是否启用周期处理 (默认 true)
    pub enabled: bool,
    /// 处理间隔分钟 (默认 15, 下限 1)
    pub interval_minutes: u64,
    /// 最大重试次数 (默认 3)
    pub max_retries: u32,
    /// 周期任务是否先执行批量提醒生成 (默认 false)
    pub generate_reminders: bool,
    /// {{ActionUrl}} 取值
    pub action_url: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 15,
            max_retries: 3,
            generate_reminders: false,
            action_url: DEFAULT_ACTION_URL.to_string(),
        }
    }
}

/// SMTP 发送配置
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

impl SmtpSettings {
    /// 主机与发件地址均非空才视为已配置
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty() && !self.from_address.trim().is_empty()
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            use_ssl: true,
            username: None,
            password: None,
            from_address: String::new(),
            from_name: "ComplyEA".to_string(),
        }
    }
}

// 口令不进日志
impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}
