// ==========================================
// 合规提醒引擎 - 引擎层
// ==========================================
// 职责: 义务生成 / 提醒排程 / 模板渲染 / 通知分发 / 状态流转
// 红线: 引擎不拼 SQL, 只通过 RecordStore + Predicate 访问存储
// ==========================================

pub mod dispatcher;
pub mod due_date;
pub mod error;
pub mod obligation_generator;
pub mod reminder_scheduler;
pub mod repositories;
pub mod template;
pub mod workflow;

// 重导出核心引擎
pub use dispatcher::{DispatchResult, NotificationDispatcher};
pub use due_date::calculate_due_date;
pub use error::{EngineError, EngineResult};
pub use obligation_generator::ObligationGenerator;
pub use reminder_scheduler::{ReminderScheduler, ResolvedRecipient};
pub use repositories::ComplianceRepositories;
pub use template::{ReminderContext, TemplateRenderer};
pub use workflow::ObligationWorkflow;
