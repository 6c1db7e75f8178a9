// ==========================================
// 合规提醒引擎 - SMTP 邮件发送
// ==========================================
// 职责: EmailTransport 的 SMTP 实现 (lettre + tokio)
// 连接策略:
// - 465 + SSL → 隐式 TLS
// - 其它端口 + SSL → STARTTLS
// - 未启用 SSL → 明文
// ==========================================

use crate::channel::{EmailResult, EmailTransport};
use crate::config::SmtpSettings;
use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, warn};

/// 单次发送超时
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

pub const NOT_CONFIGURED_MESSAGE: &str =
    "Email service is not configured. Please configure SMTP settings.";
pub const MISSING_RECIPIENT_MESSAGE: &str = "Recipient email address is required.";

pub struct SmtpEmailTransport {
    settings: SmtpSettings,
}

impl SmtpEmailTransport {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    fn build_mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
        let host = self.settings.host.as_str();
        let builder = if self.settings.use_ssl && self.settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| format!("SMTP error: {}", e))?
        } else if self.settings.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| format!("SMTP error: {}", e))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let mut builder = builder
            .port(self.settings.port)
            .timeout(Some(SEND_TIMEOUT));

        if let Some(username) = &self.settings.username {
            let password = self.settings.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(builder.build())
    }

    fn build_message(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<Message, String> {
        let from_address: Address = self
            .settings
            .from_address
            .parse()
            .map_err(|e| format!("Invalid sender address: {}", e))?;
        let to_address: Address = to
            .trim()
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;

        let from_name = Some(self.settings.from_name.clone()).filter(|n| !n.trim().is_empty());
        let builder = Message::builder()
            .from(Mailbox::new(from_name, from_address))
            .to(Mailbox::new(None, to_address))
            .subject(subject);

        let message = match text_body {
            Some(text) => builder.multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html_body.to_string(),
            )),
            None => builder
                .header(ContentType::TEXT_HTML)
                .body(html_body.to_string()),
        };
        message.map_err(|e| format!("Invalid email message: {}", e))
    }

    /// 发送测试邮件 (验证 SMTP 配置)
    pub async fn send_test_email(&self, to: &str) -> EmailResult {
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject = format!("{} - Test Email", self.settings.from_name);
        let html = format!(
            "<html><body>\
             <h2>Test Email</h2>\
             <p>This is a test email from the compliance notification system.</p>\
             <p>If you received this email, your SMTP settings are configured correctly.</p>\
             <p>Sent at: {}</p>\
             </body></html>",
            now
        );
        let text = format!(
            "This is a test email from the compliance notification system. Sent at: {}",
            now
        );
        self.send_email(to, &subject, &html, Some(&text)).await
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> EmailResult {
        if !self.is_configured() {
            return EmailResult::failed(NOT_CONFIGURED_MESSAGE);
        }
        if to.trim().is_empty() {
            return EmailResult::failed(MISSING_RECIPIENT_MESSAGE);
        }

        let message = match self.build_message(to, subject, html_body, text_body) {
            Ok(m) => m,
            Err(e) => return EmailResult::failed(e),
        };
        let mailer = match self.build_mailer() {
            Ok(m) => m,
            Err(e) => return EmailResult::failed(e),
        };

        match mailer.send(message).await {
            Ok(_) => {
                debug!(to = to, "邮件发送成功");
                EmailResult::succeeded()
            }
            Err(e) => {
                warn!(to = to, error = %e, "邮件发送失败");
                EmailResult::failed(format!("SMTP error: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            from_address: "noreply@example.com".to_string(),
            ..SmtpSettings::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_transport_fails_without_sending() {
        let transport = SmtpEmailTransport::new(SmtpSettings::default());
        assert!(!transport.is_configured());
        let result = transport.send_email("a@example.com", "s", "<p>b</p>", None).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some(NOT_CONFIGURED_MESSAGE));
    }

    #[tokio::test]
    async fn test_blank_recipient_is_rejected() {
        let transport = SmtpEmailTransport::new(configured());
        let result = transport.send_email("  ", "s", "<p>b</p>", None).await;
        assert_eq!(result.error_message.as_deref(), Some(MISSING_RECIPIENT_MESSAGE));
    }

    #[test]
    fn test_build_message_with_text_alternative() {
        let transport = SmtpEmailTransport::new(configured());
        let message = transport
            .build_message("ops@acme.test", "Subject", "<p>Hi</p>", Some("Hi"))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Subject"));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let transport = SmtpEmailTransport::new(configured());
        let err = transport
            .build_message("not-an-address", "s", "<p>b</p>", None)
            .unwrap_err();
        assert!(err.starts_with("Invalid recipient address"));
    }
}
