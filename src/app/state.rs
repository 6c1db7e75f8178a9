// ==========================================
// 合规提醒引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与引擎实例
// ==========================================

use crate::channel::{EmailTransport, SmtpEmailTransport};
use crate::config::{ConfigManager, ReminderConfigReader};
use crate::db;
use crate::engine::{
    ComplianceRepositories, NotificationDispatcher, ObligationGenerator, ObligationWorkflow,
    ReminderScheduler,
};
use crate::worker::ReminderProcessingWorker;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COMPLIANCE_SCHEDULER_DB_PATH";

const DB_FILE_NAME: &str = "compliance_scheduler.db";

/// 应用状态
///
/// 所有仓储与配置共享同一连接, 工作单元因此覆盖全部写入
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 引擎仓储集合
    pub repos: ComplianceRepositories,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库并建表
    /// 2. 安装标准提醒类型与模板
    /// 3. 补齐缺省配置项
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = db::open_and_prepare(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        config
            .ensure_defaults()
            .map_err(|e| format!("默认配置写入失败: {}", e))?;

        let repos = ComplianceRepositories::sqlite(conn.clone());

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            conn,
            repos,
            config,
        })
    }

    pub fn obligation_generator(&self) -> ObligationGenerator {
        ObligationGenerator::new(self.repos.clone())
    }

    pub fn reminder_scheduler(&self) -> ReminderScheduler {
        ReminderScheduler::new(self.repos.clone())
    }

    pub fn workflow(&self) -> ObligationWorkflow {
        ObligationWorkflow::new(self.repos.clone())
    }

    /// 按当前配置构造 SMTP 发送端口
    pub async fn smtp_transport(&self) -> Result<SmtpEmailTransport, String> {
        let settings = self
            .config
            .get_smtp_settings()
            .await
            .map_err(|e| format!("SMTP 配置读取失败: {}", e))?;
        Ok(SmtpEmailTransport::new(settings))
    }

    /// 按当前配置构造通知分发引擎
    pub async fn dispatcher(&self) -> Result<NotificationDispatcher, String> {
        let processing = self
            .config
            .load_processing_config()
            .await
            .map_err(|e| format!("处理配置读取失败: {}", e))?;
        let transport: Arc<dyn EmailTransport> = Arc::new(self.smtp_transport().await?);

        Ok(NotificationDispatcher::new(self.repos.clone(), transport)
            .map_err(|e| e.to_string())?
            .with_action_url(processing.action_url))
    }

    /// 构造周期处理任务 (SMTP 发送)
    pub fn processing_worker(&self) -> ReminderProcessingWorker {
        ReminderProcessingWorker::with_smtp(self.repos.clone(), self.config.clone())
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(format!("./{}", DB_FILE_NAME));

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("compliance-scheduler");
        // 目录创建失败时回落到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}
