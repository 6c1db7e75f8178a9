// ==========================================
// 合规提醒引擎 - 提醒实体
// ==========================================
// 职责: 提醒类型目录、公司提醒设置、提醒记录
// 红线: (义务, 提醒类型) 唯一
// ==========================================

use crate::domain::types::{DeliveryStatus, NotificationChannel};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 标准提醒类型代码
pub mod reminder_codes {
    pub const INITIAL: &str = "INITIAL";
    pub const FIRST: &str = "FIRST";
    pub const SECOND: &str = "SECOND";
    pub const FINAL: &str = "FINAL";
    pub const ESCALATION: &str = "ESCALATION";
}

// ==========================================
// ReminderType - 提醒类型 (有序目录)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderType {
    pub code: String,
    pub name: String,
    pub sort_order: i32,
    pub default_days_before_due: i32,
    pub is_escalation: bool,
    pub is_active: bool,
}

impl ReminderType {
    fn standard(code: &str, name: &str, sort_order: i32, days: i32, is_escalation: bool) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            sort_order,
            default_days_before_due: days,
            is_escalation,
            is_active: true,
        }
    }

    /// 标准提醒类型目录 (按 sort_order 排列)
    pub fn standard_catalog() -> Vec<ReminderType> {
        use reminder_codes::*;
        vec![
            Self::standard(INITIAL, "Initial Reminder", 1, 30, false),
            Self::standard(FIRST, "First Follow-up", 2, 14, false),
            Self::standard(SECOND, "Second Follow-up", 3, 7, false),
            Self::standard(FINAL, "Final Notice", 4, 3, false),
            Self::standard(ESCALATION, "Escalation", 5, 1, true),
        ]
    }
}

// ==========================================
// ReminderSetting - 公司提醒设置
// ==========================================
// 每家公司只查询一条"默认"设置 (reminder_type_code 为空)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSetting {
    pub setting_id: String,
    pub company_id: String,
    pub reminder_type_code: Option<String>,
    pub is_enabled: bool,
    pub initial_reminder_days: i32,
    pub first_reminder_days: i32,
    pub second_reminder_days: i32,
    pub final_notice_days: i32,
    pub default_channel: Option<NotificationChannel>,
    pub escalate_to_manager: bool,
    pub escalation_contact_id: Option<String>,
}

impl ReminderSetting {
    /// 创建公司默认设置 (30 / 14 / 7 / 3 天)
    pub fn company_default(company_id: &str) -> Self {
        Self {
            setting_id: uuid::Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            reminder_type_code: None,
            is_enabled: true,
            initial_reminder_days: 30,
            first_reminder_days: 14,
            second_reminder_days: 7,
            final_notice_days: 3,
            default_channel: None,
            escalate_to_manager: false,
            escalation_contact_id: None,
        }
    }

    /// 指定提醒类型的提前天数覆写
    ///
    /// # 返回
    /// - Some(days): 该类型存在覆写字段
    /// - None: 无覆写 (ESCALATION 及未知类型), 调用方回落到类型默认值
    pub fn days_before_due(&self, reminder_type_code: &str) -> Option<i32> {
        match reminder_type_code {
            reminder_codes::INITIAL => Some(self.initial_reminder_days),
            reminder_codes::FIRST => Some(self.first_reminder_days),
            reminder_codes::SECOND => Some(self.second_reminder_days),
            reminder_codes::FINAL => Some(self.final_notice_days),
            _ => None,
        }
    }
}

// ==========================================
// Reminder - 提醒记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: String,
    pub obligation_id: String,
    pub reminder_type_code: String,
    pub scheduled_date: NaiveDate,
    pub sent_date: Option<NaiveDateTime>,
    pub delivery_status: DeliveryStatus,
    pub channel: NotificationChannel,
    pub recipient_contact_id: Option<String>,
    pub recipient_email: Option<String>,
    pub message_subject: Option<String>,
    pub message_body: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub acknowledged_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Reminder {
    /// 主题或正文任一为空时需要渲染
    pub fn needs_rendering(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map_or(true, |v| v.trim().is_empty());
        blank(&self.message_subject) || blank(&self.message_body)
    }

    /// 重试预算内的失败提醒
    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.delivery_status == DeliveryStatus::Failed && self.retry_count < max_retries
    }
}
