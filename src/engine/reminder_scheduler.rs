// ==========================================
// 合规提醒引擎 - 提醒排程引擎
// ==========================================
// 职责: 为未终结且有到期日的义务按提醒类型目录排程提醒
// 输入: compliance_obligation + reminder_type + reminder_setting
// 输出: 新增 compliance_reminder (delivery_status = PENDING)
// 红线:
// - 终结状态义务不排程
// - 不在过去排程 (scheduled_date < today 直接跳过)
// - (义务, 提醒类型) 唯一
// ==========================================

use crate::domain::types::{DeliveryStatus, NotificationChannel};
use crate::domain::{Company, Obligation, Reminder, ReminderSetting, ReminderType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::ComplianceRepositories;
use crate::repository::{in_unit_of_work, Predicate};
use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

/// 解析后的提醒接收人
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRecipient {
    pub contact_id: Option<String>,
    pub email: Option<String>,
}

// ==========================================
// ReminderScheduler - 提醒排程引擎
// ==========================================
pub struct ReminderScheduler {
    repos: ComplianceRepositories,
}

impl ReminderScheduler {
    pub fn new(repos: ComplianceRepositories) -> Self {
        Self { repos }
    }

    /// 为单个义务排程提醒
    ///
    /// # 参数
    /// - obligation: 目标义务
    /// - today: 排程基准日 (早于该日的提醒不创建)
    ///
    /// # 返回
    /// - 新建提醒数量
    #[instrument(skip(self, obligation), fields(obligation = %obligation.obligation_id))]
    pub fn generate_for_obligation(
        &self,
        obligation: &Obligation,
        today: NaiveDate,
    ) -> EngineResult<usize> {
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.generate_inner(obligation, today)
        })
    }

    /// 批量排程: 全部未终结且有到期日的义务
    ///
    /// # 参数
    /// - company_id: 仅处理指定公司 (可选)
    #[instrument(skip(self))]
    pub fn generate_all(&self, company_id: Option<&str>, today: NaiveDate) -> EngineResult<usize> {
        let created = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            let mut predicate = Predicate::eq("status.is_terminal", false)
                .and(Predicate::is_not_null("due_date"));
            if let Some(company_id) = company_id {
                predicate = predicate.and(Predicate::eq("company_id", company_id));
            }

            let obligations = self.repos.obligations.find_all(&predicate)?;
            let mut total = 0;
            for obligation in &obligations {
                total += self.generate_inner(obligation, today)?;
            }
            Ok::<usize, EngineError>(total)
        })?;

        info!("批量提醒排程完成: 新建={}", created);
        Ok(created)
    }

    /// 重新排程: 删除未发送的提醒后重新生成
    ///
    /// 到期日变更后调用; 已发送的提醒保留
    #[instrument(skip(self, obligation), fields(obligation = %obligation.obligation_id))]
    pub fn regenerate(&self, obligation: &Obligation, today: NaiveDate) -> EngineResult<usize> {
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            let unsent = self.repos.reminders.find_all(
                &Predicate::eq("obligation_id", obligation.obligation_id.as_str())
                    .and(Predicate::is_null("sent_date")),
            )?;
            for reminder in &unsent {
                self.repos.reminders.delete(reminder)?;
            }
            debug!("已删除未发送提醒: {}", unsent.len());

            self.generate_inner(obligation, today)
        })
    }

    /// 解析公司生效的提醒设置
    ///
    /// 仅取公司级 (reminder_type_code 为空) 且启用的一条; 无则返回 None,
    /// 调用方按字段回落到提醒类型默认值
    pub fn resolve_settings(&self, company_id: &str) -> EngineResult<Option<ReminderSetting>> {
        let predicate = Predicate::eq("company_id", company_id)
            .and(Predicate::is_null("reminder_type_code"))
            .and(Predicate::eq("is_enabled", true));
        Ok(self.repos.reminder_settings.find(&predicate)?)
    }

    // ==========================================
    // 内部实现
    // ==========================================

    fn generate_inner(&self, obligation: &Obligation, today: NaiveDate) -> EngineResult<usize> {
        let Some(due_date) = obligation.due_date else {
            return Ok(0);
        };
        if obligation.is_terminal() {
            debug!("义务已终结, 不排程: status={}", obligation.status);
            return Ok(0);
        }

        let settings = self.resolve_settings(&obligation.company_id)?;
        let company = self.repos.companies.find_by_key(&obligation.company_id)?;
        let reminder_types = self
            .repos
            .reminder_types
            .find_all(&Predicate::eq("is_active", true))?;

        let channel = settings
            .as_ref()
            .and_then(|s| s.default_channel)
            .unwrap_or_default();
        let escalate = settings.as_ref().map_or(false, |s| s.escalate_to_manager);

        let mut created = 0;
        for reminder_type in &reminder_types {
            if reminder_type.is_escalation && !escalate {
                continue;
            }

            if self.reminder_exists(&obligation.obligation_id, &reminder_type.code)? {
                continue;
            }

            let days_before_due = effective_days_before_due(settings.as_ref(), reminder_type);
            if days_before_due <= 0 {
                continue;
            }

            let scheduled_date = due_date - Duration::days(i64::from(days_before_due));
            if scheduled_date < today {
                debug!(
                    "排程日期已过, 跳过: type={}, scheduled={}",
                    reminder_type.code, scheduled_date
                );
                continue;
            }

            let recipient =
                self.resolve_recipient(obligation, company.as_ref(), settings.as_ref(), reminder_type)?;
            if recipient.email.is_none() {
                warn!(
                    "提醒无收件邮箱, 发送时将失败: type={}, company={}",
                    reminder_type.code, obligation.company_id
                );
            }

            let reminder = Reminder {
                reminder_id: uuid::Uuid::new_v4().to_string(),
                obligation_id: obligation.obligation_id.clone(),
                reminder_type_code: reminder_type.code.clone(),
                scheduled_date,
                sent_date: None,
                delivery_status: DeliveryStatus::Pending,
                channel,
                recipient_contact_id: recipient.contact_id,
                recipient_email: recipient.email,
                message_subject: None,
                message_body: None,
                error_message: None,
                retry_count: 0,
                acknowledged_date: None,
                created_at: Utc::now().naive_utc(),
            };

            match self.repos.reminders.insert(&reminder) {
                Ok(()) => created += 1,
                Err(e) if e.is_duplicate() => continue,
                Err(e) => return Err(e.into()),
            }
        }

        debug!("义务提醒排程: 类型数={}, 新建={}", reminder_types.len(), created);
        Ok(created)
    }

    fn reminder_exists(&self, obligation_id: &str, reminder_type_code: &str) -> EngineResult<bool> {
        let predicate = Predicate::eq("obligation_id", obligation_id)
            .and(Predicate::eq("reminder_type_code", reminder_type_code));
        Ok(self.repos.reminders.exists(&predicate)?)
    }

    /// 解析接收人
    ///
    /// - 升级类型: 设置中的升级联系人 (若有)
    /// - 其它: 义务指派联系人
    /// - 联系人缺失或无邮箱时, 邮箱回落到公司邮箱
    fn resolve_recipient(
        &self,
        obligation: &Obligation,
        company: Option<&Company>,
        settings: Option<&ReminderSetting>,
        reminder_type: &ReminderType,
    ) -> EngineResult<ResolvedRecipient> {
        let company_email = || company.and_then(|c| non_blank(c.email.clone()));

        let escalation_contact = if reminder_type.is_escalation {
            settings.and_then(|s| s.escalation_contact_id.as_deref())
        } else {
            None
        };

        for contact_id in [escalation_contact, obligation.assigned_contact_id.as_deref()]
            .into_iter()
            .flatten()
        {
            if let Some(contact) = self.repos.contacts.find_by_key(contact_id)? {
                return Ok(ResolvedRecipient {
                    contact_id: Some(contact.contact_id),
                    email: non_blank(contact.email).or_else(company_email),
                });
            }
        }

        Ok(ResolvedRecipient {
            contact_id: None,
            email: company_email(),
        })
    }
}

/// 生效的提前天数: 设置中该类型的覆写, 否则类型默认值
pub fn effective_days_before_due(
    settings: Option<&ReminderSetting>,
    reminder_type: &ReminderType,
) -> i32 {
    settings
        .and_then(|s| s.days_before_due(&reminder_type.code))
        .unwrap_or(reminder_type.default_days_before_due)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
