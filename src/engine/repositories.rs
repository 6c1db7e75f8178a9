// ==========================================
// 合规提醒引擎 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合各引擎所需的所有记录仓储 + 工作单元
// 目标: 引擎构造只需一个参数; 测试可整体替换存储实现
// ==========================================

use crate::domain::{
    ApplicableRegulation, Company, CompanyContact, MessageTemplate, Obligation, RegulatoryAct,
    Reminder, ReminderSetting, ReminderType, Requirement,
};
use crate::repository::{RecordStore, SqliteStore, SqliteUnitOfWork, UnitOfWork};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 合规引擎仓储集合
///
/// # 包含的仓储
/// - 监管主数据: `companies` / `contacts` / `acts` / `requirements` / `applicable_regulations`
/// - 义务: `obligations`
/// - 提醒: `reminder_types` / `reminder_settings` / `reminders` / `templates`
/// - 提交边界: `unit_of_work`
#[derive(Clone)]
pub struct ComplianceRepositories {
    pub companies: Arc<dyn RecordStore<Company>>,
    pub contacts: Arc<dyn RecordStore<CompanyContact>>,
    pub acts: Arc<dyn RecordStore<RegulatoryAct>>,
    pub requirements: Arc<dyn RecordStore<Requirement>>,
    pub applicable_regulations: Arc<dyn RecordStore<ApplicableRegulation>>,
    pub obligations: Arc<dyn RecordStore<Obligation>>,
    pub reminder_types: Arc<dyn RecordStore<ReminderType>>,
    pub reminder_settings: Arc<dyn RecordStore<ReminderSetting>>,
    pub reminders: Arc<dyn RecordStore<Reminder>>,
    pub templates: Arc<dyn RecordStore<MessageTemplate>>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl ComplianceRepositories {
    /// 基于同一 SQLite 连接创建全部仓储 (工作单元与仓储共享事务)
    pub fn sqlite(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            companies: Arc::new(SqliteStore::<Company>::new(conn.clone())),
            contacts: Arc::new(SqliteStore::<CompanyContact>::new(conn.clone())),
            acts: Arc::new(SqliteStore::<RegulatoryAct>::new(conn.clone())),
            requirements: Arc::new(SqliteStore::<Requirement>::new(conn.clone())),
            applicable_regulations: Arc::new(SqliteStore::<ApplicableRegulation>::new(conn.clone())),
            obligations: Arc::new(SqliteStore::<Obligation>::new(conn.clone())),
            reminder_types: Arc::new(SqliteStore::<ReminderType>::new(conn.clone())),
            reminder_settings: Arc::new(SqliteStore::<ReminderSetting>::new(conn.clone())),
            reminders: Arc::new(SqliteStore::<Reminder>::new(conn.clone())),
            templates: Arc::new(SqliteStore::<MessageTemplate>::new(conn.clone())),
            unit_of_work: Arc::new(SqliteUnitOfWork::new(conn)),
        }
    }
}

// 注: ComplianceRepositories 作为简单的聚合结构体，其正确性由
// 各引擎的测试来验证。
