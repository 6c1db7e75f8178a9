// ==========================================
// 合规提醒引擎 - 通知渠道端口
// ==========================================
// 职责: 定义邮件发送接口（投递实现位于 smtp.rs）
// 红线: 渠道层不修改提醒记录, 只返回发送结果
// ==========================================

pub mod smtp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use smtp::SmtpEmailTransport;

/// 发送结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl EmailResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// 邮件发送端口
///
/// 超时由实现自行负责, 调用方不做逐条超时控制
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// 是否具备发送所需的最小配置
    fn is_configured(&self) -> bool;

    /// 发送一封邮件
    ///
    /// # 参数
    /// - to: 收件地址
    /// - subject: 主题
    /// - html_body: HTML 正文
    /// - text_body: 可选纯文本备选正文
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> EmailResult;
}
