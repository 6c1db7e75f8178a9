// ==========================================
// 合规提醒引擎 - 命令行入口
// ==========================================
// 用法:
//   compliance-scheduler init
//   compliance-scheduler generate-obligations --year 2024 --quarter 2
//   compliance-scheduler generate-reminders
//   compliance-scheduler process
//   compliance-scheduler worker
//   compliance-scheduler config set Email.Smtp.Host smtp.example.com
// ==========================================

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use compliance_scheduler::app::{get_default_db_path, AppState};
use compliance_scheduler::config::ReminderConfigReader;
use compliance_scheduler::{logging, ObligationStatus, WorkerOptions, APP_NAME, VERSION};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "compliance-scheduler", version, about = "合规义务生成、提醒排程与通知投递")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 数据库文件路径 (默认: 用户数据目录)
    #[arg(long, global = true)]
    db: Option<String>,

    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 建表并安装标准提醒类型与模板
    Init,

    /// 按期间生成合规义务
    GenerateObligations {
        #[arg(long)]
        year: i32,
        /// 季度 1-4
        #[arg(long)]
        quarter: Option<u32>,
        /// 月份 1-12
        #[arg(long)]
        month: Option<u32>,
        /// 仅处理指定公司
        #[arg(long)]
        company: Option<String>,
    },

    /// 按事件日期创建事件触发类义务
    CreateEventObligation {
        #[arg(long)]
        company: String,
        #[arg(long)]
        requirement: String,
        /// 事件日期 (YYYY-MM-DD)
        #[arg(long)]
        event_date: NaiveDate,
    },

    /// 为未终结义务批量排程提醒
    GenerateReminders {
        #[arg(long)]
        company: Option<String>,
        /// 排程基准日 (默认今天)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// 删除未发送提醒并重新排程
    RegenerateReminders {
        obligation_id: String,
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// 处理到期提醒 (一次)
    Process,

    /// 重试失败提醒 (一次)
    Retry,

    /// 重发指定提醒
    Resend { reminder_id: String },

    /// 预览提醒消息 (不发送)
    Preview { reminder_id: String },

    /// 确认已收到提醒
    Acknowledge { reminder_id: String },

    /// 变更义务状态
    SetStatus {
        obligation_id: String,
        /// PENDING / IN_PROGRESS / SUBMITTED / OVERDUE / COMPLETED / WAIVED
        status: String,
    },

    /// 批量标记义务完成
    Complete {
        #[arg(required = true)]
        obligation_ids: Vec<String>,
    },

    /// 改期并重新排程提醒
    Reschedule {
        obligation_id: String,
        #[arg(long)]
        due_date: NaiveDate,
    },

    /// 标记逾期义务
    MarkOverdue {
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// 发送测试邮件
    TestEmail { to: String },

    /// 运行周期处理任务 (Ctrl+C 停止)
    Worker {
        /// 首轮执行前的延迟秒数
        #[arg(long, default_value_t = 30)]
        initial_delay_secs: u64,
    },

    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 显示当前配置
    Show,
    /// 写入配置项
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_default(if cli.verbose { "debug" } else { "info" });
    tracing::info!("{} v{}", APP_NAME, VERSION);

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let now = Local::now().naive_local();
    let today = now.date();

    match cli.command {
        Commands::Init => {
            println!("数据库已就绪: {}", state.db_path);
        }

        Commands::GenerateObligations {
            year,
            quarter,
            month,
            company,
        } => {
            let generator = state.obligation_generator();
            let created = match company {
                Some(company_id) => generator.generate_for_company(&company_id, year, quarter, month)?,
                None => generator.generate_for_period(year, quarter, month)?,
            };
            println!("新建义务: {}", created);
        }

        Commands::CreateEventObligation {
            company,
            requirement,
            event_date,
        } => {
            match state
                .obligation_generator()
                .create_event_obligation(&company, &requirement, event_date)?
            {
                Some(obligation) => println!(
                    "已创建义务: {} (到期日 {})",
                    obligation.obligation_id,
                    obligation.due_date.map(|d| d.to_string()).unwrap_or_default()
                ),
                None => println!("义务已存在或无法计算到期日, 未创建"),
            }
        }

        Commands::GenerateReminders { company, today: at } => {
            let created = state
                .reminder_scheduler()
                .generate_all(company.as_deref(), at.unwrap_or(today))?;
            println!("新建提醒: {}", created);
        }

        Commands::RegenerateReminders {
            obligation_id,
            today: at,
        } => {
            let obligation = state.workflow().find_obligation(&obligation_id)?;
            let created = state
                .reminder_scheduler()
                .regenerate(&obligation, at.unwrap_or(today))?;
            println!("重新排程提醒: {}", created);
        }

        Commands::Process => {
            let dispatcher = state.dispatcher().await.map_err(|e| anyhow!(e))?;
            let result = dispatcher.process_due_reminders(now).await?;
            println!(
                "processed={} sent={} failed={}",
                result.processed, result.sent, result.failed
            );
        }

        Commands::Retry => {
            let max_retries = state
                .config
                .get_max_retries()
                .await
                .map_err(|e| anyhow!(e))?;
            let dispatcher = state.dispatcher().await.map_err(|e| anyhow!(e))?;
            let result = dispatcher.retry_failed_reminders(max_retries, now).await?;
            println!(
                "processed={} sent={} failed={}",
                result.processed, result.sent, result.failed
            );
        }

        Commands::Resend { reminder_id } => {
            let dispatcher = state.dispatcher().await.map_err(|e| anyhow!(e))?;
            let reminder = dispatcher.resend(&reminder_id, now).await?;
            match reminder.error_message {
                None => println!("提醒已发送: {}", reminder.reminder_id),
                Some(error) => println!("提醒发送失败: {}", error),
            }
        }

        Commands::Preview { reminder_id } => {
            let dispatcher = state.dispatcher().await.map_err(|e| anyhow!(e))?;
            let (subject, body) = dispatcher.preview(&reminder_id, today)?;
            println!("Subject: {}\n\n{}", subject, body);
        }

        Commands::Acknowledge { reminder_id } => {
            let dispatcher = state.dispatcher().await.map_err(|e| anyhow!(e))?;
            let reminder = dispatcher.acknowledge(&reminder_id, now)?;
            println!("已确认提醒: {}", reminder.reminder_id);
        }

        Commands::SetStatus {
            obligation_id,
            status,
        } => {
            let status = ObligationStatus::from_str(&status)
                .ok_or_else(|| anyhow!("未知的义务状态: {}", status))?;
            let obligation = state.workflow().change_status(&obligation_id, status, now)?;
            println!("义务 {} 状态: {}", obligation.obligation_id, obligation.status);
        }

        Commands::Complete { obligation_ids } => {
            let completed = state.workflow().mark_complete(&obligation_ids, now)?;
            println!("已完成义务: {}", completed);
        }

        Commands::Reschedule {
            obligation_id,
            due_date,
        } => {
            let created = state.workflow().reschedule(&obligation_id, due_date, today)?;
            println!("到期日已更新, 重新排程提醒: {}", created);
        }

        Commands::MarkOverdue { today: at } => {
            let marked = state.workflow().mark_overdue(at.unwrap_or(today))?;
            println!("标记逾期: {}", marked);
        }

        Commands::TestEmail { to } => {
            let transport = state.smtp_transport().await.map_err(|e| anyhow!(e))?;
            let result = transport.send_test_email(&to).await;
            if result.success {
                println!("测试邮件已发送: {}", to);
            } else {
                return Err(anyhow!(result
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string())));
            }
        }

        Commands::Worker { initial_delay_secs } => {
            let handle = state
                .processing_worker()
                .with_options(WorkerOptions {
                    initial_delay: Duration::from_secs(initial_delay_secs),
                })
                .start();

            tokio::signal::ctrl_c().await?;
            tracing::info!("收到停止信号, 等待当前批次结束");
            handle.stop().await;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", state.config.get_config_snapshot().map_err(|e| anyhow!(e))?);
            }
            ConfigAction::Set { key, value } => {
                state.config.set_value(&key, &value).map_err(|e| anyhow!(e))?;
                println!("{} = {}", key, value);
            }
        },
    }

    Ok(())
}
