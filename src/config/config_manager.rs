// ==========================================
// 合规提醒引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::reminder_config_trait::ReminderConfigReader;
use crate::config::settings::SmtpSettings;
use crate::config::ConfigResult;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?)
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值 (UPSERT)
    pub fn set_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!("配置已更新: {}", key);
        Ok(())
    }

    /// 补齐所有已知配置项的默认值 (已存在的不覆盖)
    ///
    /// # 返回
    /// - 新写入的配置项数量
    pub fn ensure_defaults(&self) -> ConfigResult<usize> {
        let conn = self.lock()?;
        let mut inserted = 0;
        for (key, value) in config_keys::DEFAULTS {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        if inserted > 0 {
            tracing::info!("补齐默认配置: {} 项", inserted);
        }
        Ok(inserted)
    }

    /// 获取所有配置的快照（JSON格式, 口令类配置打码）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            let shown = if key == config_keys::SMTP_PASSWORD && !value.is_empty() {
                "***".to_string()
            } else {
                value
            };
            config_map.insert(key, shown);
        }

        Ok(serde_json::to_string_pretty(&json!(config_map))?)
    }

    // ===== 类型化读取 =====

    fn get_string(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_optional(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self
            .get_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 布尔配置: 大小写不敏感的 true / false, 其它值回落默认值
    fn get_bool(&self, key: &str, default: bool) -> ConfigResult<bool> {
        let Some(raw) = self.get_value(key)? else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => {
                tracing::warn!(config_key = key, raw_value = %raw, "布尔配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    fn get_number<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "数值配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 读取 SMTP 配置
    pub fn smtp_settings(&self) -> ConfigResult<SmtpSettings> {
        let defaults = SmtpSettings::default();
        Ok(SmtpSettings {
            host: self.get_string(config_keys::SMTP_HOST, &defaults.host)?.trim().to_string(),
            port: self.get_number(config_keys::SMTP_PORT, defaults.port)?,
            use_ssl: self.get_bool(config_keys::SMTP_USE_SSL, defaults.use_ssl)?,
            username: self.get_optional(config_keys::SMTP_USERNAME)?,
            password: self.get_value(config_keys::SMTP_PASSWORD)?.filter(|v| !v.is_empty()),
            from_address: self
                .get_string(config_keys::FROM_ADDRESS, &defaults.from_address)?
                .trim()
                .to_string(),
            from_name: self.get_string(config_keys::FROM_NAME, &defaults.from_name)?,
        })
    }
}

// ==========================================
// ReminderConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ReminderConfigReader for ConfigManager {
    async fn get_processing_enabled(&self) -> ConfigResult<bool> {
        self.get_bool(config_keys::PROCESSING_ENABLED, true)
    }

    async fn get_interval_minutes(&self) -> ConfigResult<u64> {
        let minutes: i64 = self.get_number(config_keys::PROCESSING_INTERVAL_MINUTES, 15)?;
        Ok(minutes.max(1) as u64)
    }

    async fn get_max_retries(&self) -> ConfigResult<u32> {
        let retries: i64 = self.get_number(config_keys::PROCESSING_MAX_RETRIES, 3)?;
        Ok(retries.max(0) as u32)
    }

    async fn get_generation_enabled(&self) -> ConfigResult<bool> {
        self.get_bool(config_keys::GENERATION_ENABLED, false)
    }

    async fn get_app_base_url(&self) -> ConfigResult<Option<String>> {
        self.get_optional(config_keys::APP_BASE_URL)
    }

    async fn get_smtp_settings(&self) -> ConfigResult<SmtpSettings> {
        self.smtp_settings()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 周期处理
    pub const PROCESSING_ENABLED: &str = "Reminders.Processing.Enabled";
    pub const PROCESSING_INTERVAL_MINUTES: &str = "Reminders.Processing.IntervalMinutes";
    pub const PROCESSING_MAX_RETRIES: &str = "Reminders.Processing.MaxRetries";
    pub const GENERATION_ENABLED: &str = "Reminders.Generation.Enabled";

    // 应用
    pub const APP_BASE_URL: &str = "App.BaseUrl";

    // 邮件
    pub const SMTP_HOST: &str = "Email.Smtp.Host";
    pub const SMTP_PORT: &str = "Email.Smtp.Port";
    pub const SMTP_USE_SSL: &str = "Email.Smtp.UseSsl";
    pub const SMTP_USERNAME: &str = "Email.Smtp.Username";
    pub const SMTP_PASSWORD: &str = "Email.Smtp.Password";
    pub const FROM_ADDRESS: &str = "Email.From.Address";
    pub const FROM_NAME: &str = "Email.From.Name";

    /// 已知配置项及默认值
    pub const DEFAULTS: &[(&str, &str)] = &[
        (PROCESSING_ENABLED, "true"),
        (PROCESSING_INTERVAL_MINUTES, "15"),
        (PROCESSING_MAX_RETRIES, "3"),
        (GENERATION_ENABLED, "false"),
        (APP_BASE_URL, ""),
        (SMTP_HOST, ""),
        (SMTP_PORT, "587"),
        (SMTP_USE_SSL, "true"),
        (SMTP_USERNAME, ""),
        (SMTP_PASSWORD, ""),
        (FROM_ADDRESS, ""),
        (FROM_NAME, "ComplyEA"),
    ];
}
