// ==========================================
// 合规提醒引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio + lettre
// 系统定位: 合规义务生成、提醒排程与通知投递
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 持久化端口与 SQLite 实现
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 通知渠道 - 邮件发送
pub mod channel;

// 配置层 - 系统配置
pub mod config;

// 后台任务 - 周期处理
pub mod worker;

// 应用层 - 组装
pub mod app;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DeliveryStatus, NotificationChannel, ObligationStatus, RiskRating, TimelineKind,
};

// 领域实体
pub use domain::{
    ApplicableRegulation, Company, CompanyContact, MessageTemplate, Obligation, PeriodKey,
    RegulatoryAct, Reminder, ReminderSetting, ReminderType, Requirement,
};

// 引擎
pub use engine::{
    ComplianceRepositories, DispatchResult, EngineError, EngineResult, NotificationDispatcher,
    ObligationGenerator, ObligationWorkflow, ReminderScheduler, TemplateRenderer,
};

// 渠道
pub use channel::{EmailResult, EmailTransport, SmtpEmailTransport};

// 后台任务
pub use worker::{ReminderProcessingHandle, ReminderProcessingWorker, RunSummary, WorkerOptions};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "合规提醒引擎";
