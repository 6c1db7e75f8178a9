// ==========================================
// Mock 邮件发送端口 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use compliance_scheduler::channel::{EmailResult, EmailTransport};
use std::sync::Mutex;

/// 已发送邮件记录
#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

/// Mock 发送端口
///
/// 记录每次发送; 设置 failure 后所有发送返回失败
#[derive(Debug, Default)]
pub struct MockTransport {
    failure: Mutex<Option<String>>,
    sent: Mutex<Vec<SentEmail>>,
    attempts: Mutex<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有发送均失败
    pub fn failing(message: &str) -> Self {
        let transport = Self::default();
        transport.set_failure(Some(message));
        transport
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// 发送端口被调用的次数 (含失败)
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EmailTransport for MockTransport {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> EmailResult {
        *self.attempts.lock().unwrap() += 1;

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return EmailResult::failed(message);
        }

        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            text_body: text_body.map(str::to_string),
        });
        EmailResult::succeeded()
    }
}
