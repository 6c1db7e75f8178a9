// ==========================================
// 合规提醒引擎 - 提醒周期处理任务
// ==========================================
// 职责: 启动延迟后周期执行 [批量排程] → 到期分发 → 失败重试
// 调度模型:
// - 单一后台任务, 批次之间只在等待处可被中断
// - 每轮结束重新读取间隔配置 (下限 1 分钟)
// - 单轮失败只记录日志, 任务继续
// 部署约束: 同一数据库只运行一个实例
// ==========================================

use crate::channel::{EmailTransport, SmtpEmailTransport};
use crate::config::{ReminderConfigReader, SmtpSettings};
use crate::engine::{
    ComplianceRepositories, DispatchResult, EngineError, EngineResult, NotificationDispatcher,
    ReminderScheduler,
};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// 读取间隔失败时的回落值 (分钟)
const FALLBACK_INTERVAL_MINUTES: u64 = 15;

/// 按 SMTP 配置构造发送端口 (每轮调用一次, 配置变更无需重启)
pub type TransportFactory = Arc<dyn Fn(SmtpSettings) -> Arc<dyn EmailTransport> + Send + Sync>;

/// 周期任务选项
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// 首轮执行前的启动延迟
    pub initial_delay: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
        }
    }
}

/// 单轮执行摘要
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 处理被配置关闭
    pub skipped: bool,
    /// 批量排程新建的提醒数
    pub scheduled: usize,
    pub dispatch: DispatchResult,
    pub retry: DispatchResult,
}

// ==========================================
// ReminderProcessingWorker
// ==========================================
pub struct ReminderProcessingWorker {
    repos: ComplianceRepositories,
    config: Arc<dyn ReminderConfigReader>,
    transport_factory: TransportFactory,
    options: WorkerOptions,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ReminderProcessingWorker {
    pub fn new(
        repos: ComplianceRepositories,
        config: Arc<dyn ReminderConfigReader>,
        transport_factory: TransportFactory,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            repos,
            config,
            transport_factory,
            options: WorkerOptions::default(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// 使用 SMTP 发送端口
    pub fn with_smtp(repos: ComplianceRepositories, config: Arc<dyn ReminderConfigReader>) -> Self {
        Self::new(
            repos,
            config,
            Arc::new(|settings| Arc::new(SmtpEmailTransport::new(settings)) as Arc<dyn EmailTransport>),
        )
    }

    pub fn with_options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }

    /// 执行一轮处理
    ///
    /// # 参数
    /// - now: 本轮基准时间 (到期判断取其日期部分)
    pub async fn run_once(&self, now: NaiveDateTime) -> EngineResult<RunSummary> {
        let config = self
            .config
            .load_processing_config()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        if !config.enabled {
            debug!("提醒处理已关闭, 跳过本轮");
            return Ok(RunSummary {
                skipped: true,
                ..RunSummary::default()
            });
        }

        let mut summary = RunSummary::default();

        if config.generate_reminders {
            let scheduler = ReminderScheduler::new(self.repos.clone());
            summary.scheduled = scheduler.generate_all(None, now.date())?;
        }

        let smtp = self
            .config
            .get_smtp_settings()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let transport = (self.transport_factory)(smtp);
        if !transport.is_configured() {
            warn!("邮件服务未配置, 本轮发送将记录为失败");
        }

        let dispatcher = NotificationDispatcher::new(self.repos.clone(), transport)?
            .with_action_url(config.action_url.clone());

        summary.dispatch = dispatcher.process_due_reminders(now).await?;

        if summary.dispatch.failed > 0 || dispatcher.has_retryable_failures(config.max_retries)? {
            summary.retry = dispatcher
                .retry_failed_reminders(config.max_retries, now)
                .await?;
        }

        info!(
            scheduled = summary.scheduled,
            processed = summary.dispatch.processed,
            sent = summary.dispatch.sent,
            failed = summary.dispatch.failed,
            retried = summary.retry.processed,
            retry_sent = summary.retry.sent,
            "提醒处理轮次完成"
        );
        Ok(summary)
    }

    /// 在后台任务中启动
    ///
    /// 返回的句柄用于停止任务
    pub fn start(self) -> ReminderProcessingHandle {
        let shutdown_tx = self.shutdown_tx.clone();
        let task_handle = tokio::spawn(async move {
            self.run_loop().await;
        });

        ReminderProcessingHandle {
            shutdown_tx,
            task_handle,
        }
    }

    async fn run_loop(self) {
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            initial_delay_secs = self.options.initial_delay.as_secs(),
            "提醒处理任务已启动"
        );

        if !wait_or_shutdown(self.options.initial_delay, &mut shutdown_rx).await {
            info!("提醒处理任务在首轮前停止");
            return;
        }

        loop {
            if let Err(e) = self.run_once(Local::now().naive_local()).await {
                error!(error = %e, "提醒处理轮次失败, 等待下一轮");
            }

            let interval = self.current_interval().await;
            debug!(interval_secs = interval.as_secs(), "等待下一轮");
            if !wait_or_shutdown(interval, &mut shutdown_rx).await {
                break;
            }
        }

        info!("提醒处理任务已停止");
    }

    async fn current_interval(&self) -> Duration {
        let minutes = match self.config.get_interval_minutes().await {
            Ok(n) => n.max(1),
            Err(e) => {
                warn!(error = %e, "读取处理间隔失败, 使用默认值");
                FALLBACK_INTERVAL_MINUTES
            }
        };
        Duration::from_secs(minutes * 60)
    }
}

/// 等待指定时长或停止信号
///
/// # 返回
/// - true: 等待结束, 继续运行
/// - false: 收到停止信号
async fn wait_or_shutdown(period: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    if *shutdown_rx.borrow() {
        return false;
    }

    let elapsed = tokio::select! {
        _ = tokio::time::sleep(period) => true,
        changed = shutdown_rx.changed() => changed.is_ok(),
    };
    elapsed && !*shutdown_rx.borrow()
}

// ==========================================
// ReminderProcessingHandle
// ==========================================
pub struct ReminderProcessingHandle {
    shutdown_tx: watch::Sender<bool>,
    task_handle: tokio::task::JoinHandle<()>,
}

impl ReminderProcessingHandle {
    /// 发送停止信号并等待任务结束 (进行中的投递会先完成)
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task_handle.await;
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }
}
