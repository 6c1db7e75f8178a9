// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use compliance_scheduler::config::{ConfigResult, ReminderConfigReader, SmtpSettings};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub max_retries: u32,
    pub generate_reminders: bool,
    pub app_base_url: Option<String>,
    pub smtp: SmtpSettings,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 15,
            max_retries: 3,
            generate_reminders: false,
            app_base_url: None,
            smtp: SmtpSettings::default(),
        }
    }

    /// 处理关闭
    pub fn disabled() -> Self {
        let mut config = Self::default();
        config.enabled = false;
        config
    }

    /// 每轮先执行批量排程
    pub fn with_generation() -> Self {
        let mut config = Self::default();
        config.generate_reminders = true;
        config
    }
}

#[async_trait]
impl ReminderConfigReader for MockConfig {
    async fn get_processing_enabled(&self) -> ConfigResult<bool> {
        Ok(self.enabled)
    }

    async fn get_interval_minutes(&self) -> ConfigResult<u64> {
        Ok(self.interval_minutes)
    }

    async fn get_max_retries(&self) -> ConfigResult<u32> {
        Ok(self.max_retries)
    }

    async fn get_generation_enabled(&self) -> ConfigResult<bool> {
        Ok(self.generate_reminders)
    }

    async fn get_app_base_url(&self) -> ConfigResult<Option<String>> {
        Ok(self.app_base_url.clone())
    }

    async fn get_smtp_settings(&self) -> ConfigResult<SmtpSettings> {
        Ok(self.smtp.clone())
    }
}
