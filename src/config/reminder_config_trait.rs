// ==========================================
// 合规提醒引擎 - 提醒配置读取 Trait
// ==========================================
// 职责: 定义周期任务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::settings::{ProcessingConfig, SmtpSettings, DEFAULT_ACTION_URL};
use crate::config::ConfigResult;
use async_trait::async_trait;

// ==========================================
// ReminderConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）, 测试中的 MockConfig
#[async_trait]
pub trait ReminderConfigReader: Send + Sync {
    /// 是否启用周期处理
    ///
    /// # 默认值
    /// - true
    async fn get_processing_enabled(&self) -> ConfigResult<bool>;

    /// 处理间隔 (分钟)
    ///
    /// # 默认值
    /// - 15 (下限 1)
    async fn get_interval_minutes(&self) -> ConfigResult<u64>;

    /// 最大重试次数
    ///
    /// # 默认值
    /// - 3
    async fn get_max_retries(&self) -> ConfigResult<u32>;

    /// 周期任务是否执行批量提醒生成
    ///
    /// # 默认值
    /// - false
    async fn get_generation_enabled(&self) -> ConfigResult<bool>;

    /// 应用访问地址 (空表示未配置)
    async fn get_app_base_url(&self) -> ConfigResult<Option<String>>;

    /// SMTP 配置
    async fn get_smtp_settings(&self) -> ConfigResult<SmtpSettings>;

    /// 组装批次配置快照
    async fn load_processing_config(&self) -> ConfigResult<ProcessingConfig> {
        let action_url = self
            .get_app_base_url()
            .await?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACTION_URL.to_string());

        Ok(ProcessingConfig {
            enabled: self.get_processing_enabled().await?,
            interval_minutes: self.get_interval_minutes().await?.max(1),
            max_retries: self.get_max_retries().await?,
            generate_reminders: self.get_generation_enabled().await?,
            action_url,
        })
    }
}
