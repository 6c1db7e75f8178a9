// ==========================================
// 合规提醒引擎 - 后台任务层
// ==========================================
// 职责: 周期触发提醒处理 (可取消的后台任务)
// ==========================================

pub mod reminder_processing;

pub use reminder_processing::{
    ReminderProcessingHandle, ReminderProcessingWorker, RunSummary, TransportFactory,
    WorkerOptions,
};
