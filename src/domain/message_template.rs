// ==========================================
// 合规提醒引擎 - 消息模板实体
// ==========================================
// 职责: 提醒消息模板 + 标准模板目录
// 占位符: {{Token}}, 词表见 engine::template
// ==========================================

use crate::domain::reminder::reminder_codes;
use serde::{Deserialize, Serialize};

/// 全局兜底模板代码
pub const DEFAULT_TEMPLATE_CODE: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub template_id: String,
    pub code: String,
    pub name: String,
    pub reminder_type_code: Option<String>,
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>, // 纯文本备选正文
    pub is_active: bool,
    pub is_default: bool,
}

impl MessageTemplate {
    fn standard(
        code: &str,
        name: &str,
        reminder_type_code: Option<&str>,
        subject: &str,
        headline: &str,
        body_text: &str,
    ) -> Self {
        Self {
            template_id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: name.to_string(),
            reminder_type_code: reminder_type_code.map(|c| c.to_string()),
            subject: subject.to_string(),
            body_html: standard_body(headline),
            body_text: Some(body_text.to_string()),
            is_active: true,
            is_default: true,
        }
    }

    /// 标准模板目录: 每个标准提醒类型一份 + DEFAULT
    pub fn standard_catalog() -> Vec<MessageTemplate> {
        use reminder_codes::*;
        vec![
            Self::standard(
                INITIAL,
                "Initial Reminder",
                Some(INITIAL),
                "[Initial Reminder] {{RequirementTitle}} due {{DueDate}}",
                "a compliance obligation is coming due in <strong>{{DaysUntilDue}} days</strong>",
                "REMINDER: {{RequirementTitle}} due in {{DaysUntilDue}} days. Please take action.",
            ),
            Self::standard(
                FIRST,
                "First Follow-up Reminder",
                Some(FIRST),
                "[Reminder] {{RequirementTitle}} due in {{DaysUntilDue}} days",
                "a compliance obligation is still open and due in <strong>{{DaysUntilDue}} days</strong>",
                "FOLLOW-UP: {{RequirementTitle}} due in {{DaysUntilDue}} days. Action required.",
            ),
            Self::standard(
                SECOND,
                "Second Follow-up Reminder",
                Some(SECOND),
                "[Urgent] {{RequirementTitle}} due in {{DaysUntilDue}} days",
                "an urgent compliance obligation is due in <strong>{{DaysUntilDue}} days</strong>",
                "URGENT: {{RequirementTitle}} due in {{DaysUntilDue}} days. Immediate action required.",
            ),
            Self::standard(
                FINAL,
                "Final Notice",
                Some(FINAL),
                "[FINAL NOTICE] {{RequirementTitle}} due in {{DaysUntilDue}} days",
                "this is the final notice: the obligation below is due in <strong>{{DaysUntilDue}} days</strong>",
                "FINAL NOTICE: {{RequirementTitle}} due in {{DaysUntilDue}} days!",
            ),
            Self::standard(
                ESCALATION,
                "Escalation Notice",
                Some(ESCALATION),
                "[ESCALATION] {{RequirementTitle}} requires immediate attention",
                "the obligation below has been escalated and requires management attention",
                "ESCALATION: {{RequirementTitle}} requires immediate management attention.",
            ),
            Self::standard(
                DEFAULT_TEMPLATE_CODE,
                "Default Reminder",
                None,
                "[ComplyEA] Compliance Reminder: {{RequirementTitle}}",
                "a compliance obligation requires your attention",
                "ComplyEA Reminder: {{RequirementTitle}} due {{DueDate}}",
            ),
        ]
    }
}

fn standard_body(headline: &str) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
<p>Dear {{{{RecipientFirstName}}}},</p>
<p>Please note that {headline}.</p>
<ul>
<li><strong>Company:</strong> {{{{CompanyName}}}}</li>
<li><strong>Requirement:</strong> {{{{RequirementTitle}}}} ({{{{SectionReference}}}})</li>
<li><strong>Regulatory Act:</strong> {{{{RegulatoryAct}}}}</li>
<li><strong>Due Date:</strong> {{{{DueDate}}}}</li>
<li><strong>Current Status:</strong> {{{{ObligationStatus}}}}</li>
<li><strong>Risk Rating:</strong> {{{{RiskRating}}}}</li>
</ul>
<p><a href="{{{{ActionUrl}}}}">View Obligation</a></p>
<p>Sent {{{{CurrentDate}}}} by the compliance notification system.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_has_default_and_per_type() {
        let catalog = MessageTemplate::standard_catalog();
        assert_eq!(catalog.len(), 6);
        let default = catalog
            .iter()
            .find(|t| t.code == DEFAULT_TEMPLATE_CODE)
            .unwrap();
        assert!(default.reminder_type_code.is_none());
        assert!(catalog.iter().all(|t| t.is_active && t.is_default));
    }

    #[test]
    fn test_standard_body_keeps_placeholders() {
        let body = standard_body("x");
        assert!(body.contains("{{RecipientFirstName}}"));
        assert!(body.contains("{{ActionUrl}}"));
    }
}
