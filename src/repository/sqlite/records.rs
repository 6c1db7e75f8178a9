// 各领域实体的表映射

use super::row::*;
use super::store::Record;
use crate::domain::types::{
    DeliveryStatus, NotificationChannel, ObligationStatus, RiskRating, TimelineKind,
};
use crate::domain::{
    ApplicableRegulation, Company, CompanyContact, MessageTemplate, Obligation, RegulatoryAct,
    Reminder, ReminderSetting, ReminderType, Requirement,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// 终态集合的 SQL 字面量: ('COMPLETED','WAIVED')
fn terminal_status_list() -> String {
    let codes: Vec<String> = ObligationStatus::TERMINAL
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect();
    format!("({})", codes.join(","))
}

// ==========================================
// 监管主数据
// ==========================================

impl Record for Company {
    const ENTITY: &'static str = "Company";
    const TABLE: &'static str = "company";
    const KEY_COLUMN: &'static str = "company_id";
    const COLUMNS: &'static [&'static str] =
        &["company_id", "name", "short_name", "email", "company_kind", "is_active"];
    const DEFAULT_ORDER: &'static str = "name, company_id";

    fn key(&self) -> &str {
        &self.company_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            company_id: row.get(0)?,
            name: row.get(1)?,
            short_name: row.get(2)?,
            email: row.get(3)?,
            company_kind: row.get(4)?,
            is_active: row.get(5)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.company_id),
            text(&self.name),
            opt_text(self.short_name.as_deref()),
            opt_text(self.email.as_deref()),
            opt_text(self.company_kind.as_deref()),
            flag(self.is_active),
        ]
    }
}

impl Record for CompanyContact {
    const ENTITY: &'static str = "CompanyContact";
    const TABLE: &'static str = "company_contact";
    const KEY_COLUMN: &'static str = "contact_id";
    const COLUMNS: &'static [&'static str] =
        &["contact_id", "company_id", "first_name", "last_name", "email", "is_active"];
    const DEFAULT_ORDER: &'static str = "first_name, contact_id";

    fn key(&self) -> &str {
        &self.contact_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_id: row.get(0)?,
            company_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            is_active: row.get(5)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.contact_id),
            text(&self.company_id),
            text(&self.first_name),
            opt_text(self.last_name.as_deref()),
            opt_text(self.email.as_deref()),
            flag(self.is_active),
        ]
    }
}

impl Record for RegulatoryAct {
    const ENTITY: &'static str = "RegulatoryAct";
    const TABLE: &'static str = "regulatory_act";
    const KEY_COLUMN: &'static str = "act_id";
    const COLUMNS: &'static [&'static str] = &["act_id", "name", "short_name", "is_active"];
    const DEFAULT_ORDER: &'static str = "name, act_id";

    fn key(&self) -> &str {
        &self.act_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            act_id: row.get(0)?,
            name: row.get(1)?,
            short_name: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.act_id),
            text(&self.name),
            opt_text(self.short_name.as_deref()),
            flag(self.is_active),
        ]
    }
}

impl Record for Requirement {
    const ENTITY: &'static str = "Requirement";
    const TABLE: &'static str = "compliance_requirement";
    const KEY_COLUMN: &'static str = "requirement_id";
    const COLUMNS: &'static [&'static str] = &[
        "requirement_id",
        "act_id",
        "title",
        "section_reference",
        "timeline_kind",
        "due_day_of_month",
        "due_month",
        "days_after_event",
        "applicable_company_kind",
        "default_risk_rating",
        "penalty_amount",
        "is_active",
    ];
    const DEFAULT_ORDER: &'static str = "title, requirement_id";

    fn key(&self) -> &str {
        &self.requirement_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            requirement_id: row.get(0)?,
            act_id: row.get(1)?,
            title: row.get(2)?,
            section_reference: row.get(3)?,
            timeline_kind: get_code(row, 4, TimelineKind::from_str)?,
            due_day_of_month: row.get(5)?,
            due_month: row.get(6)?,
            days_after_event: row.get(7)?,
            applicable_company_kind: row.get(8)?,
            default_risk_rating: get_opt_code(row, 9, RiskRating::from_str)?,
            penalty_amount: row.get(10)?,
            is_active: row.get(11)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.requirement_id),
            text(&self.act_id),
            text(&self.title),
            opt_text(self.section_reference.as_deref()),
            text(self.timeline_kind.as_str()),
            opt_int(self.due_day_of_month.map(i64::from)),
            opt_int(self.due_month.map(i64::from)),
            opt_int(self.days_after_event.map(i64::from)),
            opt_text(self.applicable_company_kind.as_deref()),
            opt_text(self.default_risk_rating.map(|r| r.as_str())),
            opt_real(self.penalty_amount),
            flag(self.is_active),
        ]
    }

    fn resolve_path(path: &str) -> Option<String> {
        match path {
            "act.is_active" => Some(
                "(SELECT a.is_active FROM regulatory_act a \
                 WHERE a.act_id = compliance_requirement.act_id)"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl Record for ApplicableRegulation {
    const ENTITY: &'static str = "ApplicableRegulation";
    const TABLE: &'static str = "applicable_regulation";
    const KEY_COLUMN: &'static str = "applicable_id";
    const COLUMNS: &'static [&'static str] = &["applicable_id", "company_id", "act_id", "is_active"];
    const DEFAULT_ORDER: &'static str = "applicable_id";

    fn key(&self) -> &str {
        &self.applicable_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            applicable_id: row.get(0)?,
            company_id: row.get(1)?,
            act_id: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.applicable_id),
            text(&self.company_id),
            text(&self.act_id),
            flag(self.is_active),
        ]
    }

    fn resolve_path(path: &str) -> Option<String> {
        match path {
            "company.is_active" => Some(
                "(SELECT c.is_active FROM company c \
                 WHERE c.company_id = applicable_regulation.company_id)"
                    .to_string(),
            ),
            "act.is_active" => Some(
                "(SELECT a.is_active FROM regulatory_act a \
                 WHERE a.act_id = applicable_regulation.act_id)"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

// ==========================================
// 合规义务
// ==========================================

impl Record for Obligation {
    const ENTITY: &'static str = "Obligation";
    const TABLE: &'static str = "compliance_obligation";
    const KEY_COLUMN: &'static str = "obligation_id";
    const COLUMNS: &'static [&'static str] = &[
        "obligation_id",
        "company_id",
        "requirement_id",
        "title",
        "period_year",
        "period_quarter",
        "period_month",
        "due_date",
        "status",
        "assigned_contact_id",
        "risk_rating",
        "completed_date",
        "created_at",
    ];
    const DEFAULT_ORDER: &'static str = "due_date, obligation_id";

    fn key(&self) -> &str {
        &self.obligation_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            obligation_id: row.get(0)?,
            company_id: row.get(1)?,
            requirement_id: row.get(2)?,
            title: row.get(3)?,
            period_year: row.get(4)?,
            period_quarter: row.get(5)?,
            period_month: row.get(6)?,
            due_date: get_opt_date(row, 7)?,
            status: get_code(row, 8, ObligationStatus::from_str)?,
            assigned_contact_id: row.get(9)?,
            risk_rating: get_opt_code(row, 10, RiskRating::from_str)?,
            completed_date: get_opt_datetime(row, 11)?,
            created_at: get_datetime(row, 12)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.obligation_id),
            text(&self.company_id),
            text(&self.requirement_id),
            opt_text(self.title.as_deref()),
            int(self.period_year as i64),
            opt_int(self.period_quarter.map(i64::from)),
            opt_int(self.period_month.map(i64::from)),
            opt_date(self.due_date),
            text(self.status.as_str()),
            opt_text(self.assigned_contact_id.as_deref()),
            opt_text(self.risk_rating.map(|r| r.as_str())),
            opt_datetime(self.completed_date),
            datetime(self.created_at),
        ]
    }

    fn resolve_path(path: &str) -> Option<String> {
        match path {
            "status.is_terminal" => Some(format!(
                "(compliance_obligation.status IN {})",
                terminal_status_list()
            )),
            "company.is_active" => Some(
                "(SELECT c.is_active FROM company c \
                 WHERE c.company_id = compliance_obligation.company_id)"
                    .to_string(),
            ),
            "requirement.act_id" => Some(
                "(SELECT r.act_id FROM compliance_requirement r \
                 WHERE r.requirement_id = compliance_obligation.requirement_id)"
                    .to_string(),
            ),
            "requirement.timeline_kind" => Some(
                "(SELECT r.timeline_kind FROM compliance_requirement r \
                 WHERE r.requirement_id = compliance_obligation.requirement_id)"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

// ==========================================
// 提醒
// ==========================================

impl Record for ReminderType {
    const ENTITY: &'static str = "ReminderType";
    const TABLE: &'static str = "reminder_type";
    const KEY_COLUMN: &'static str = "code";
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "name",
        "sort_order",
        "default_days_before_due",
        "is_escalation",
        "is_active",
    ];
    const DEFAULT_ORDER: &'static str = "sort_order, code";

    fn key(&self) -> &str {
        &self.code
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code: row.get(0)?,
            name: row.get(1)?,
            sort_order: row.get(2)?,
            default_days_before_due: row.get(3)?,
            is_escalation: row.get(4)?,
            is_active: row.get(5)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.code),
            text(&self.name),
            int(self.sort_order as i64),
            int(self.default_days_before_due as i64),
            flag(self.is_escalation),
            flag(self.is_active),
        ]
    }
}

impl Record for ReminderSetting {
    const ENTITY: &'static str = "ReminderSetting";
    const TABLE: &'static str = "reminder_setting";
    const KEY_COLUMN: &'static str = "setting_id";
    const COLUMNS: &'static [&'static str] = &[
        "setting_id",
        "company_id",
        "reminder_type_code",
        "is_enabled",
        "initial_reminder_days",
        "first_reminder_days",
        "second_reminder_days",
        "final_notice_days",
        "default_channel",
        "escalate_to_manager",
        "escalation_contact_id",
    ];
    const DEFAULT_ORDER: &'static str = "setting_id";

    fn key(&self) -> &str {
        &self.setting_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            setting_id: row.get(0)?,
            company_id: row.get(1)?,
            reminder_type_code: row.get(2)?,
            is_enabled: row.get(3)?,
            initial_reminder_days: row.get(4)?,
            first_reminder_days: row.get(5)?,
            second_reminder_days: row.get(6)?,
            final_notice_days: row.get(7)?,
            default_channel: get_opt_code(row, 8, NotificationChannel::from_str)?,
            escalate_to_manager: row.get(9)?,
            escalation_contact_id: row.get(10)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.setting_id),
            text(&self.company_id),
            opt_text(self.reminder_type_code.as_deref()),
            flag(self.is_enabled),
            int(self.initial_reminder_days as i64),
            int(self.first_reminder_days as i64),
            int(self.second_reminder_days as i64),
            int(self.final_notice_days as i64),
            opt_text(self.default_channel.map(|c| c.as_str())),
            flag(self.escalate_to_manager),
            opt_text(self.escalation_contact_id.as_deref()),
        ]
    }
}

impl Record for Reminder {
    const ENTITY: &'static str = "Reminder";
    const TABLE: &'static str = "compliance_reminder";
    const KEY_COLUMN: &'static str = "reminder_id";
    const COLUMNS: &'static [&'static str] = &[
        "reminder_id",
        "obligation_id",
        "reminder_type_code",
        "scheduled_date",
        "sent_date",
        "delivery_status",
        "channel",
        "recipient_contact_id",
        "recipient_email",
        "message_subject",
        "message_body",
        "error_message",
        "retry_count",
        "acknowledged_date",
        "created_at",
    ];
    const DEFAULT_ORDER: &'static str = "scheduled_date, reminder_id";

    fn key(&self) -> &str {
        &self.reminder_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            reminder_id: row.get(0)?,
            obligation_id: row.get(1)?,
            reminder_type_code: row.get(2)?,
            scheduled_date: get_date(row, 3)?,
            sent_date: get_opt_datetime(row, 4)?,
            delivery_status: get_code(row, 5, DeliveryStatus::from_str)?,
            channel: get_code(row, 6, NotificationChannel::from_str)?,
            recipient_contact_id: row.get(7)?,
            recipient_email: row.get(8)?,
            message_subject: row.get(9)?,
            message_body: row.get(10)?,
            error_message: row.get(11)?,
            retry_count: row.get(12)?,
            acknowledged_date: get_opt_datetime(row, 13)?,
            created_at: get_datetime(row, 14)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.reminder_id),
            text(&self.obligation_id),
            text(&self.reminder_type_code),
            date(self.scheduled_date),
            opt_datetime(self.sent_date),
            text(self.delivery_status.as_str()),
            text(self.channel.as_str()),
            opt_text(self.recipient_contact_id.as_deref()),
            opt_text(self.recipient_email.as_deref()),
            opt_text(self.message_subject.as_deref()),
            opt_text(self.message_body.as_deref()),
            opt_text(self.error_message.as_deref()),
            int(self.retry_count as i64),
            opt_datetime(self.acknowledged_date),
            datetime(self.created_at),
        ]
    }

    fn resolve_path(path: &str) -> Option<String> {
        match path {
            "obligation.company_id" => Some(
                "(SELECT o.company_id FROM compliance_obligation o \
                 WHERE o.obligation_id = compliance_reminder.obligation_id)"
                    .to_string(),
            ),
            "obligation.status" => Some(
                "(SELECT o.status FROM compliance_obligation o \
                 WHERE o.obligation_id = compliance_reminder.obligation_id)"
                    .to_string(),
            ),
            "obligation.status.is_terminal" => Some(format!(
                "((SELECT o.status FROM compliance_obligation o \
                 WHERE o.obligation_id = compliance_reminder.obligation_id) IN {})",
                terminal_status_list()
            )),
            "reminder_type.is_escalation" => Some(
                "(SELECT t.is_escalation FROM reminder_type t \
                 WHERE t.code = compliance_reminder.reminder_type_code)"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl Record for MessageTemplate {
    const ENTITY: &'static str = "MessageTemplate";
    const TABLE: &'static str = "message_template";
    const KEY_COLUMN: &'static str = "template_id";
    const COLUMNS: &'static [&'static str] = &[
        "template_id",
        "code",
        "name",
        "reminder_type_code",
        "subject",
        "body_html",
        "body_text",
        "is_active",
        "is_default",
    ];
    const DEFAULT_ORDER: &'static str = "is_default DESC, code, template_id";

    fn key(&self) -> &str {
        &self.template_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            template_id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            reminder_type_code: row.get(3)?,
            subject: row.get(4)?,
            body_html: row.get(5)?,
            body_text: row.get(6)?,
            is_active: row.get(7)?,
            is_default: row.get(8)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            text(&self.template_id),
            text(&self.code),
            text(&self.name),
            opt_text(self.reminder_type_code.as_deref()),
            text(&self.subject),
            text(&self.body_html),
            opt_text(self.body_text.as_deref()),
            flag(self.is_active),
            flag(self.is_default),
        ]
    }
}
