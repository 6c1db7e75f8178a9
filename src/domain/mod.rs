// ==========================================
// 合规提醒引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod message_template;
pub mod obligation;
pub mod regulatory;
pub mod reminder;
pub mod types;

// 重导出核心类型
pub use message_template::{MessageTemplate, DEFAULT_TEMPLATE_CODE};
pub use obligation::{Obligation, PeriodKey};
pub use regulatory::{ApplicableRegulation, Company, CompanyContact, RegulatoryAct, Requirement};
pub use reminder::{reminder_codes, Reminder, ReminderSetting, ReminderType};
pub use types::{DeliveryStatus, NotificationChannel, ObligationStatus, RiskRating, TimelineKind};
