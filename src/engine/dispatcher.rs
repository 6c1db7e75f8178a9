// ==========================================
// 合规提醒引擎 - 通知分发引擎
// ==========================================
// 职责: 到期提醒的渲染、投递与状态迁移
// 状态机:
//   PENDING → SENT (成功)
//   PENDING → FAILED (retry_count += 1)
//   FAILED --(重试/重发)--> PENDING → ...
//   SENT → ACKNOWLEDGED (人工确认)
// 红线:
// - 单条失败不影响批次 (逐条隔离)
// - 缺少收件邮箱为硬失败, 不调用发送端口
// - 每条提醒的状态变更独立提交
// ==========================================

use crate::channel::{EmailResult, EmailTransport};
use crate::domain::types::DeliveryStatus;
use crate::domain::{MessageTemplate, Reminder, DEFAULT_TEMPLATE_CODE};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::ComplianceRepositories;
use crate::engine::template::{ReminderContext, TemplateRenderer};
use crate::repository::{in_unit_of_work, Predicate};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub const NO_RECIPIENT_MESSAGE: &str = "No recipient email address configured.";
pub const SMS_NOT_SUPPORTED_MESSAGE: &str = "SMS channel has no configured transport.";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// 批次分发统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
}

impl DispatchResult {
    fn record(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }
}

// ==========================================
// NotificationDispatcher - 通知分发引擎
// ==========================================
pub struct NotificationDispatcher {
    repos: ComplianceRepositories,
    transport: Arc<dyn EmailTransport>,
    renderer: TemplateRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        repos: ComplianceRepositories,
        transport: Arc<dyn EmailTransport>,
    ) -> EngineResult<Self> {
        Ok(Self {
            repos,
            transport,
            renderer: TemplateRenderer::new()?,
        })
    }

    /// 设置模板 {{ActionUrl}} 的取值
    pub fn with_action_url(mut self, action_url: impl Into<String>) -> Self {
        self.renderer = self.renderer.with_action_url(action_url);
        self
    }

    // ==========================================
    // 批次入口
    // ==========================================

    /// 处理全部到期的待发送提醒
    ///
    /// 选取条件: PENDING + scheduled_date <= today + 未发送
    #[instrument(skip(self))]
    pub async fn process_due_reminders(&self, now: NaiveDateTime) -> EngineResult<DispatchResult> {
        let today = now.date();
        let due = self.repos.reminders.find_all(
            &Predicate::eq("delivery_status", DeliveryStatus::Pending)
                .and(Predicate::le("scheduled_date", today))
                .and(Predicate::is_null("sent_date")),
        )?;

        if due.is_empty() {
            debug!("无到期提醒");
            return Ok(DispatchResult::default());
        }

        let result = self.dispatch_batch(due, now).await;
        info!(
            "到期提醒处理完成: processed={}, sent={}, failed={}",
            result.processed, result.sent, result.failed
        );
        Ok(result)
    }

    /// 重试失败提醒 (retry_count < max_retries)
    #[instrument(skip(self))]
    pub async fn retry_failed_reminders(
        &self,
        max_retries: u32,
        now: NaiveDateTime,
    ) -> EngineResult<DispatchResult> {
        let failed = self.repos.reminders.find_all(&retryable_predicate(max_retries))?;
        if failed.is_empty() {
            return Ok(DispatchResult::default());
        }

        let reset: Vec<Reminder> = failed
            .into_iter()
            .map(|mut r| {
                r.delivery_status = DeliveryStatus::Pending;
                r
            })
            .collect();

        let result = self.dispatch_batch(reset, now).await;
        info!(
            "失败提醒重试完成: processed={}, sent={}, failed={}",
            result.processed, result.sent, result.failed
        );
        Ok(result)
    }

    /// 是否存在重试预算内的失败提醒
    pub fn has_retryable_failures(&self, max_retries: u32) -> EngineResult<bool> {
        Ok(self.repos.reminders.exists(&retryable_predicate(max_retries))?)
    }

    // ==========================================
    // 单条操作
    // ==========================================

    /// 发送单条提醒并持久化结果
    ///
    /// 渲染失败 (对象图无法加载等) 与投递失败同样记为 FAILED 并计入重试次数
    ///
    /// # 返回
    /// - Ok(true): 发送成功
    /// - Ok(false): 发送失败 (已记录错误与重试次数)
    /// - Err: 写入存储失败
    pub async fn send_reminder(&self, reminder: &mut Reminder, now: NaiveDateTime) -> EngineResult<bool> {
        // 纯文本备选正文只随本次渲染产生, 已有消息不再补算
        let rendered = if reminder.needs_rendering() {
            self.populate_message(reminder, now.date())
        } else {
            Ok(None)
        };

        let outcome = match rendered {
            Ok(text_body) => self.deliver(reminder, text_body.as_deref()).await,
            Err(e) => {
                error!(reminder = %reminder.reminder_id, error = %e, "提醒消息渲染失败");
                EmailResult::failed(e.to_string())
            }
        };
        apply_outcome(reminder, &outcome, now);

        let saved = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.repos.reminders.update(&*reminder)
        });
        if let Err(e) = saved {
            if outcome.success {
                error!(
                    reminder = %reminder.reminder_id,
                    error = %e,
                    "邮件已投递但状态写入失败, 下一轮可能重复发送"
                );
            }
            return Err(e.into());
        }

        if outcome.success {
            debug!(reminder = %reminder.reminder_id, "提醒发送成功");
        } else {
            warn!(
                reminder = %reminder.reminder_id,
                retry_count = reminder.retry_count,
                error = reminder.error_message.as_deref().unwrap_or(""),
                "提醒发送失败"
            );
        }
        Ok(outcome.success)
    }

    /// 人工重发: 重置为 PENDING, 清空发送时间与错误后立即发送
    #[instrument(skip(self))]
    pub async fn resend(&self, reminder_id: &str, now: NaiveDateTime) -> EngineResult<Reminder> {
        let mut reminder = self.load_reminder(reminder_id)?;
        reminder.delivery_status = DeliveryStatus::Pending;
        reminder.sent_date = None;
        reminder.error_message = None;

        self.send_reminder(&mut reminder, now).await?;
        Ok(reminder)
    }

    /// 预览提醒消息 (不发送, 不写入)
    pub fn preview(&self, reminder_id: &str, today: NaiveDate) -> EngineResult<(String, String)> {
        let mut reminder = self.load_reminder(reminder_id)?;
        if reminder.needs_rendering() {
            self.populate_message(&mut reminder, today)?;
        }
        Ok((
            reminder.message_subject.unwrap_or_default(),
            reminder.message_body.unwrap_or_default(),
        ))
    }

    /// 收件人确认: 仅 SENT → ACKNOWLEDGED
    #[instrument(skip(self))]
    pub fn acknowledge(&self, reminder_id: &str, now: NaiveDateTime) -> EngineResult<Reminder> {
        let mut reminder = self.load_reminder(reminder_id)?;
        if reminder.delivery_status != DeliveryStatus::Sent {
            return Err(EngineError::InvalidStateTransition {
                from: reminder.delivery_status.to_string(),
                to: DeliveryStatus::Acknowledged.to_string(),
            });
        }

        reminder.delivery_status = DeliveryStatus::Acknowledged;
        reminder.acknowledged_date = Some(now);
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.repos.reminders.update(&reminder)
        })?;
        Ok(reminder)
    }

    /// 按模板填充主题与正文
    ///
    /// 模板查找顺序:
    /// 1. 提醒类型 + 启用 + 默认
    /// 2. 提醒类型 + 启用
    /// 3. DEFAULT 代码 + 启用
    /// 4. 内置默认消息
    ///
    /// # 返回
    /// - 模板带纯文本正文时返回其渲染结果
    pub fn populate_message(
        &self,
        reminder: &mut Reminder,
        today: NaiveDate,
    ) -> EngineResult<Option<String>> {
        let template = self.select_template(&reminder.reminder_type_code)?;
        let ctx = ReminderContext::load(&self.repos, reminder.clone())?;
        let (subject, body) = self.renderer.compose(template.as_ref(), &ctx, today);
        let text_body = template
            .as_ref()
            .and_then(|t| t.body_text.as_deref())
            .map(|text| self.renderer.render(text, &ctx, today));

        reminder.message_subject = Some(subject);
        reminder.message_body = Some(body);
        Ok(text_body)
    }

    // ==========================================
    // 内部实现
    // ==========================================

    async fn dispatch_batch(&self, reminders: Vec<Reminder>, now: NaiveDateTime) -> DispatchResult {
        let mut result = DispatchResult::default();
        for mut reminder in reminders {
            match self.send_reminder(&mut reminder, now).await {
                Ok(success) => result.record(success),
                Err(e) => {
                    error!(reminder = %reminder.reminder_id, error = %e, "提醒处理异常");
                    result.record(false);
                }
            }
        }
        result
    }

    async fn deliver(&self, reminder: &Reminder, text_body: Option<&str>) -> EmailResult {
        if !reminder.channel.requires_email() {
            return EmailResult::failed(SMS_NOT_SUPPORTED_MESSAGE);
        }

        let Some(to) = reminder
            .recipient_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
        else {
            return EmailResult::failed(NO_RECIPIENT_MESSAGE);
        };

        self.transport
            .send_email(
                to,
                reminder.message_subject.as_deref().unwrap_or_default(),
                reminder.message_body.as_deref().unwrap_or_default(),
                text_body,
            )
            .await
    }

    fn select_template(&self, reminder_type_code: &str) -> EngineResult<Option<MessageTemplate>> {
        let by_type = Predicate::eq("reminder_type_code", reminder_type_code)
            .and(Predicate::eq("is_active", true));

        if let Some(t) = self
            .repos
            .templates
            .find(&by_type.clone().and(Predicate::eq("is_default", true)))?
        {
            return Ok(Some(t));
        }
        if let Some(t) = self.repos.templates.find(&by_type)? {
            return Ok(Some(t));
        }
        Ok(self.repos.templates.find(
            &Predicate::eq("code", DEFAULT_TEMPLATE_CODE).and(Predicate::eq("is_active", true)),
        )?)
    }

    fn load_reminder(&self, reminder_id: &str) -> EngineResult<Reminder> {
        self.repos
            .reminders
            .find_by_key(reminder_id)?
            .ok_or_else(|| EngineError::not_found("Reminder", reminder_id))
    }
}

fn retryable_predicate(max_retries: u32) -> Predicate {
    Predicate::eq("delivery_status", DeliveryStatus::Failed)
        .and(Predicate::lt("retry_count", max_retries))
}

/// 按发送结果迁移状态
fn apply_outcome(reminder: &mut Reminder, outcome: &EmailResult, now: NaiveDateTime) {
    if outcome.success {
        reminder.delivery_status = DeliveryStatus::Sent;
        reminder.sent_date = Some(now);
        reminder.error_message = None;
    } else {
        reminder.delivery_status = DeliveryStatus::Failed;
        reminder.retry_count += 1;
        reminder.error_message = Some(
            outcome
                .error_message
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::NotificationChannel;

    fn reminder() -> Reminder {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Reminder {
            reminder_id: "R1".to_string(),
            obligation_id: "O1".to_string(),
            reminder_type_code: "INITIAL".to_string(),
            scheduled_date: ts.date(),
            sent_date: None,
            delivery_status: DeliveryStatus::Pending,
            channel: NotificationChannel::Email,
            recipient_contact_id: None,
            recipient_email: None,
            message_subject: None,
            message_body: None,
            error_message: Some("old".to_string()),
            retry_count: 1,
            acknowledged_date: None,
            created_at: ts,
        }
    }

    #[test]
    fn test_apply_success_outcome() {
        let mut r = reminder();
        let now = r.created_at;
        apply_outcome(&mut r, &EmailResult::succeeded(), now);
        assert_eq!(r.delivery_status, DeliveryStatus::Sent);
        assert_eq!(r.sent_date, Some(now));
        assert_eq!(r.error_message, None);
        assert_eq!(r.retry_count, 1);
    }

    #[test]
    fn test_apply_failure_outcome_increments_retry() {
        let mut r = reminder();
        let now = r.created_at;
        apply_outcome(&mut r, &EmailResult::failed("SMTP error: timeout"), now);
        assert_eq!(r.delivery_status, DeliveryStatus::Failed);
        assert_eq!(r.retry_count, 2);
        assert_eq!(r.error_message.as_deref(), Some("SMTP error: timeout"));
        assert_eq!(r.sent_date, None);
    }

    #[test]
    fn test_dispatch_result_counts() {
        let mut result = DispatchResult::default();
        result.record(true);
        result.record(false);
        result.record(true);
        assert_eq!(result, DispatchResult { processed: 3, sent: 2, failed: 1 });
    }
}
