// ==========================================
// 合规提醒引擎 - 消息模板渲染
// ==========================================
// 职责: {{Token}} 占位符替换
// 红线:
// - 词表封闭; 未识别占位符原样保留
// - 缺失值渲染为空串
// - 给定 today 时结果确定且无副作用
// ==========================================

use crate::config::settings::DEFAULT_ACTION_URL;
use crate::domain::{
    Company, CompanyContact, MessageTemplate, Obligation, RegulatoryAct, Reminder, ReminderType,
    Requirement,
};
use crate::engine::error::EngineResult;
use crate::engine::repositories::ComplianceRepositories;
use chrono::NaiveDate;
use regex::{Captures, Regex};

const PLACEHOLDER_PATTERN: &str = r"\{\{(\w+)\}\}";
const LONG_DATE_FORMAT: &str = "%B %d, %Y";
const SHORT_DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// ReminderContext - 渲染上下文
// ==========================================
// 提醒 → 义务 → (公司, 要求 → 法规) 的已加载对象图, 任一环节可缺失
#[derive(Debug, Clone)]
pub struct ReminderContext {
    pub reminder: Reminder,
    pub obligation: Option<Obligation>,
    pub company: Option<Company>,
    pub requirement: Option<Requirement>,
    pub act: Option<RegulatoryAct>,
    pub recipient: Option<CompanyContact>,
    pub reminder_type: Option<ReminderType>,
}

impl ReminderContext {
    /// 仅含提醒本身的上下文
    pub fn bare(reminder: Reminder) -> Self {
        Self {
            reminder,
            obligation: None,
            company: None,
            requirement: None,
            act: None,
            recipient: None,
            reminder_type: None,
        }
    }

    /// 从仓储加载提醒的对象图
    pub fn load(repos: &ComplianceRepositories, reminder: Reminder) -> EngineResult<Self> {
        let mut ctx = Self::bare(reminder);

        ctx.obligation = repos.obligations.find_by_key(&ctx.reminder.obligation_id)?;
        if let Some(obligation) = &ctx.obligation {
            ctx.company = repos.companies.find_by_key(&obligation.company_id)?;
            ctx.requirement = repos.requirements.find_by_key(&obligation.requirement_id)?;
        }
        if let Some(requirement) = &ctx.requirement {
            ctx.act = repos.acts.find_by_key(&requirement.act_id)?;
        }
        if let Some(contact_id) = &ctx.reminder.recipient_contact_id {
            ctx.recipient = repos.contacts.find_by_key(contact_id)?;
        }
        ctx.reminder_type = repos
            .reminder_types
            .find_by_key(&ctx.reminder.reminder_type_code)?;

        Ok(ctx)
    }

    /// 义务标题, 缺省回落到要求标题
    pub fn obligation_title(&self) -> Option<&str> {
        self.obligation
            .as_ref()
            .and_then(|o| o.title.as_deref())
            .or_else(|| self.requirement.as_ref().map(|r| r.title.as_str()))
    }

    /// 要求标题, 缺省回落到义务标题
    pub fn requirement_title(&self) -> Option<&str> {
        self.requirement
            .as_ref()
            .map(|r| r.title.as_str())
            .or_else(|| self.obligation.as_ref().and_then(|o| o.title.as_deref()))
    }
}

// ==========================================
// TemplateRenderer - 占位符渲染器
// ==========================================
pub struct TemplateRenderer {
    pattern: Regex,
    action_url: String,
}

impl TemplateRenderer {
    pub fn new() -> EngineResult<Self> {
        Ok(Self {
            pattern: Regex::new(PLACEHOLDER_PATTERN)?,
            action_url: DEFAULT_ACTION_URL.to_string(),
        })
    }

    /// 设置 {{ActionUrl}} 的替换值
    pub fn with_action_url(mut self, action_url: impl Into<String>) -> Self {
        self.action_url = action_url.into();
        self
    }

    /// 渲染模板文本
    ///
    /// # 参数
    /// - template: 含 {{Token}} 的模板文本
    /// - ctx: 提醒对象图
    /// - today: 计算 DaysUntilDue / CurrentDate 的基准日
    pub fn render(&self, template: &str, ctx: &ReminderContext, today: NaiveDate) -> String {
        self.pattern
            .replace_all(template, |caps: &Captures| {
                self.resolve(&caps[1], ctx, today)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// 生成 (主题, 正文)
    ///
    /// 有模板时渲染模板, 否则生成内置默认消息
    pub fn compose(
        &self,
        template: Option<&MessageTemplate>,
        ctx: &ReminderContext,
        today: NaiveDate,
    ) -> (String, String) {
        match template {
            Some(t) => (
                self.render(&t.subject, ctx, today),
                self.render(&t.body_html, ctx, today),
            ),
            None => (default_subject(ctx), default_body(ctx)),
        }
    }

    /// 解析单个占位符
    ///
    /// # 返回
    /// - Some(value): 词表内占位符 (缺失值为空串)
    /// - None: 未识别, 调用方保留原文
    fn resolve(&self, token: &str, ctx: &ReminderContext, today: NaiveDate) -> Option<String> {
        let obligation = ctx.obligation.as_ref();
        let requirement = ctx.requirement.as_ref();
        let company = ctx.company.as_ref();
        let act = ctx.act.as_ref();
        let due_date = obligation.and_then(|o| o.due_date);

        let value = match token {
            "CompanyName" => company.map(|c| c.name.clone()),
            "CompanyShortName" => company.map(|c| c.display_short_name().to_string()),
            "RequirementTitle" => ctx.requirement_title().map(str::to_string),
            "ObligationTitle" => ctx.obligation_title().map(str::to_string),
            "DueDate" => due_date.map(|d| d.format(LONG_DATE_FORMAT).to_string()),
            "DueDateShort" => due_date.map(|d| d.format(SHORT_DATE_FORMAT).to_string()),
            "DaysUntilDue" => due_date.map(|d| (d - today).num_days().to_string()),
            "RecipientName" => ctx.recipient.as_ref().map(|c| c.full_name()),
            "RecipientFirstName" => ctx.recipient.as_ref().map(|c| c.first_name.clone()),
            "ObligationStatus" => obligation.map(|o| o.status.display_name().to_string()),
            "RegulatoryAct" => act.map(|a| a.short_name.clone().unwrap_or_else(|| a.name.clone())),
            "RegulatoryActFull" => act.map(|a| a.name.clone()),
            "PeriodYear" => obligation.map(|o| o.period_year.to_string()),
            "PeriodQuarter" => obligation
                .and_then(|o| o.period_quarter)
                .map(|q| format!("Q{}", q)),
            "PeriodMonth" => obligation.and_then(|o| o.period_month).and_then(month_name),
            "SectionReference" => requirement.and_then(|r| r.section_reference.clone()),
            "RiskRating" => obligation
                .and_then(|o| o.risk_rating)
                .map(|r| r.display_name().to_string()),
            "PenaltyAmount" => requirement.and_then(|r| r.penalty_amount).map(format_thousands),
            "ReminderType" => ctx.reminder_type.as_ref().map(|t| t.name.clone()),
            "ScheduledDate" => Some(ctx.reminder.scheduled_date.format(LONG_DATE_FORMAT).to_string()),
            "CurrentDate" => Some(today.format(LONG_DATE_FORMAT).to_string()),
            "ActionUrl" => Some(self.action_url.clone()),
            _ => return None,
        };
        Some(value.unwrap_or_default())
    }
}

fn month_name(month: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(2000, month, 1).map(|d| d.format("%B").to_string())
}

/// 整数千分位格式 (四舍五入, 无小数)
pub fn format_thousands(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// 内置默认主题 (无可用模板时)
pub fn default_subject(ctx: &ReminderContext) -> String {
    let type_name = ctx
        .reminder_type
        .as_ref()
        .map_or("Reminder", |t| t.name.as_str());
    format!(
        "[{}] Compliance Obligation Due: {}",
        type_name,
        ctx.obligation_title().unwrap_or("Unknown")
    )
}

/// 内置默认正文 (无可用模板时)
pub fn default_body(ctx: &ReminderContext) -> String {
    const NA: &str = "N/A";
    let first_name = ctx
        .recipient
        .as_ref()
        .map_or("Compliance Officer", |c| c.first_name.as_str());
    let company = ctx.company.as_ref().map_or(NA, |c| c.name.as_str());
    let title = ctx.obligation_title().unwrap_or(NA);
    let act = ctx.act.as_ref().map_or(NA, |a| a.name.as_str());
    let due_date = ctx
        .obligation
        .as_ref()
        .and_then(|o| o.due_date)
        .map_or_else(|| NA.to_string(), |d| d.format(LONG_DATE_FORMAT).to_string());
    let status = ctx
        .obligation
        .as_ref()
        .map_or(NA, |o| o.status.display_name());

    let row = |label: &str, value: &str| {
        format!(
            "<tr><td style='padding: 8px; border: 1px solid #ddd; background: #f5f5f5;'><strong>{}:</strong></td>\n\
             <td style='padding: 8px; border: 1px solid #ddd;'>{}</td></tr>\n",
            label, value
        )
    };

    format!(
        "<html>\n<body>\n<h2>Compliance Reminder</h2>\n\n\
         <p>Dear {first_name},</p>\n\n\
         <p>This is a reminder that the following compliance obligation is due:</p>\n\n\
         <table style='border-collapse: collapse; margin: 20px 0;'>\n{rows}</table>\n\n\
         <p>Please ensure this obligation is addressed before the due date to maintain compliance.</p>\n\n\
         <p>Best regards,<br/>ComplyEA Notification System</p>\n</body>\n</html>",
        first_name = first_name,
        rows = [
            row("Company", company),
            row("Requirement", title),
            row("Regulatory Act", act),
            row("Due Date", &due_date),
            row("Status", status),
        ]
        .concat(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        DeliveryStatus, NotificationChannel, ObligationStatus, RiskRating, TimelineKind,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn reminder() -> Reminder {
        Reminder {
            reminder_id: "REM1".to_string(),
            obligation_id: "O1".to_string(),
            reminder_type_code: "INITIAL".to_string(),
            scheduled_date: d(2024, 5, 16),
            sent_date: None,
            delivery_status: DeliveryStatus::Pending,
            channel: NotificationChannel::Email,
            recipient_contact_id: Some("P1".to_string()),
            recipient_email: Some("jane@acme.test".to_string()),
            message_subject: None,
            message_body: None,
            error_message: None,
            retry_count: 0,
            acknowledged_date: None,
            created_at: d(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn full_context() -> ReminderContext {
        let mut ctx = ReminderContext::bare(reminder());
        ctx.obligation = Some(Obligation {
            obligation_id: "O1".to_string(),
            company_id: "C1".to_string(),
            requirement_id: "R1".to_string(),
            title: None,
            period_year: 2024,
            period_quarter: Some(2),
            period_month: None,
            due_date: Some(d(2024, 6, 15)),
            status: ObligationStatus::InProgress,
            assigned_contact_id: Some("P1".to_string()),
            risk_rating: Some(RiskRating::High),
            completed_date: None,
            created_at: d(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        });
        ctx.company = Some(Company {
            company_id: "C1".to_string(),
            name: "Acme Holdings Limited".to_string(),
            short_name: None,
            email: Some("info@acme.test".to_string()),
            company_kind: None,
            is_active: true,
        });
        ctx.requirement = Some(Requirement {
            requirement_id: "R1".to_string(),
            act_id: "A1".to_string(),
            title: "Quarterly VAT Return".to_string(),
            section_reference: Some("s.28".to_string()),
            timeline_kind: TimelineKind::Quarterly,
            due_day_of_month: Some(15),
            due_month: None,
            days_after_event: None,
            applicable_company_kind: None,
            default_risk_rating: Some(RiskRating::High),
            penalty_amount: Some(1_250_000.4),
            is_active: true,
        });
        ctx.act = Some(RegulatoryAct {
            act_id: "A1".to_string(),
            name: "Value Added Tax Act".to_string(),
            short_name: Some("VAT Act".to_string()),
            is_active: true,
        });
        ctx.recipient = Some(CompanyContact {
            contact_id: "P1".to_string(),
            company_id: "C1".to_string(),
            first_name: "Jane".to_string(),
            last_name: Some("Doe".to_string()),
            email: Some("jane@acme.test".to_string()),
            is_active: true,
        });
        ctx.reminder_type = Some(ReminderType {
            code: "INITIAL".to_string(),
            name: "Initial Reminder".to_string(),
            sort_order: 1,
            default_days_before_due: 30,
            is_escalation: false,
            is_active: true,
        });
        ctx
    }

    #[test]
    fn test_render_full_vocabulary() {
        let renderer = TemplateRenderer::new().unwrap();
        let ctx = full_context();
        let today = d(2024, 5, 16);

        let out = renderer.render(
            "{{CompanyShortName}}|{{RequirementTitle}}|{{ObligationTitle}}|{{DueDate}}|{{DueDateShort}}|{{DaysUntilDue}}",
            &ctx,
            today,
        );
        assert_eq!(
            out,
            "Acme Holdings Limited|Quarterly VAT Return|Quarterly VAT Return|June 15, 2024|2024-06-15|30"
        );

        let out = renderer.render(
            "{{RecipientName}}|{{RecipientFirstName}}|{{ObligationStatus}}|{{RegulatoryAct}}|{{RegulatoryActFull}}",
            &ctx,
            today,
        );
        assert_eq!(out, "Jane Doe|Jane|In Progress|VAT Act|Value Added Tax Act");

        let out = renderer.render(
            "{{PeriodYear}} {{PeriodQuarter}} [{{PeriodMonth}}] {{SectionReference}} {{RiskRating}} {{PenaltyAmount}}",
            &ctx,
            today,
        );
        assert_eq!(out, "2024 Q2 [] s.28 High 1,250,000");

        let out = renderer.render(
            "{{ReminderType}}|{{ScheduledDate}}|{{CurrentDate}}|{{ActionUrl}}",
            &ctx,
            today,
        );
        assert_eq!(
            out,
            "Initial Reminder|May 16, 2024|May 16, 2024|[Application Link]"
        );
    }

    #[test]
    fn test_unknown_token_passes_through() {
        let renderer = TemplateRenderer::new().unwrap();
        let ctx = full_context();
        let out = renderer.render("Hello {{Unknown}} {{CompanyName}}", &ctx, d(2024, 5, 16));
        assert_eq!(out, "Hello {{Unknown}} Acme Holdings Limited");
    }

    #[test]
    fn test_absent_graph_renders_empty() {
        let renderer = TemplateRenderer::new().unwrap();
        let ctx = ReminderContext::bare(reminder());
        let out = renderer.render("[{{CompanyName}}][{{DueDate}}][{{RiskRating}}]", &ctx, d(2024, 5, 16));
        assert_eq!(out, "[][][]");
    }

    #[test]
    fn test_action_url_override() {
        let renderer = TemplateRenderer::new()
            .unwrap()
            .with_action_url("https://comply.example.com/o/1");
        let ctx = ReminderContext::bare(reminder());
        assert_eq!(
            renderer.render("{{ActionUrl}}", &ctx, d(2024, 5, 16)),
            "https://comply.example.com/o/1"
        );
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.5), "1,234,568");
        assert_eq!(format_thousands(-25000.0), "-25,000");
    }

    #[test]
    fn test_default_message_without_template() {
        let renderer = TemplateRenderer::new().unwrap();
        let ctx = full_context();
        let (subject, body) = renderer.compose(None, &ctx, d(2024, 5, 16));
        assert_eq!(
            subject,
            "[Initial Reminder] Compliance Obligation Due: Quarterly VAT Return"
        );
        assert!(body.contains("Dear Jane,"));
        assert!(body.contains("June 15, 2024"));

        let bare = ReminderContext::bare(reminder());
        let (subject, body) = renderer.compose(None, &bare, d(2024, 5, 16));
        assert_eq!(subject, "[Reminder] Compliance Obligation Due: Unknown");
        assert!(body.contains("Dear Compliance Officer,"));
        assert!(body.contains("N/A"));
    }
}
