// ==========================================
// 合规提醒引擎 - 领域类型定义
// ==========================================
// 职责: 周期类型、义务状态、投递状态、通知渠道、风险等级
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 周期类型 (Timeline Kind)
// ==========================================
// 决定一条合规要求如何展开为具体期间的义务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineKind {
    Always,      // 持续性义务 (名义到期日 12-31)
    Annual,      // 每年一次
    Quarterly,   // 每季度一次
    Monthly,     // 每月一次
    EventDriven, // 事件触发 (不参与期间扫描)
    Fixed,       // 固定截止日
}

impl TimelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineKind::Always => "ALWAYS",
            TimelineKind::Annual => "ANNUAL",
            TimelineKind::Quarterly => "QUARTERLY",
            TimelineKind::Monthly => "MONTHLY",
            TimelineKind::EventDriven => "EVENT_DRIVEN",
            TimelineKind::Fixed => "FIXED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALWAYS" => Some(TimelineKind::Always),
            "ANNUAL" => Some(TimelineKind::Annual),
            "QUARTERLY" => Some(TimelineKind::Quarterly),
            "MONTHLY" => Some(TimelineKind::Monthly),
            "EVENT_DRIVEN" | "EVENT" => Some(TimelineKind::EventDriven),
            "FIXED" => Some(TimelineKind::Fixed),
            _ => None,
        }
    }
}

impl fmt::Display for TimelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 义务状态 (Obligation Status)
// ==========================================
// 终态: COMPLETED / WAIVED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObligationStatus {
    Pending,    // 未开始
    InProgress, // 处理中
    Submitted,  // 已提交待审
    Overdue,    // 已逾期
    Completed,  // 已完成
    Waived,     // 已豁免
}

impl ObligationStatus {
    /// 所有终态 (用于查询条件展开)
    pub const TERMINAL: [ObligationStatus; 2] =
        [ObligationStatus::Completed, ObligationStatus::Waived];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "PENDING",
            ObligationStatus::InProgress => "IN_PROGRESS",
            ObligationStatus::Submitted => "SUBMITTED",
            ObligationStatus::Overdue => "OVERDUE",
            ObligationStatus::Completed => "COMPLETED",
            ObligationStatus::Waived => "WAIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(ObligationStatus::Pending),
            "IN_PROGRESS" | "INPROGRESS" => Some(ObligationStatus::InProgress),
            "SUBMITTED" => Some(ObligationStatus::Submitted),
            "OVERDUE" => Some(ObligationStatus::Overdue),
            "COMPLETED" => Some(ObligationStatus::Completed),
            "WAIVED" => Some(ObligationStatus::Waived),
            _ => None,
        }
    }

    /// 展示名称 (模板 {{ObligationStatus}} 使用)
    pub fn display_name(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "Pending",
            ObligationStatus::InProgress => "In Progress",
            ObligationStatus::Submitted => "Submitted",
            ObligationStatus::Overdue => "Overdue",
            ObligationStatus::Completed => "Completed",
            ObligationStatus::Waived => "Waived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ObligationStatus::Completed | ObligationStatus::Waived)
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 投递状态 (Delivery Status)
// ==========================================
// 状态机: PENDING → SENT (成功终态) / PENDING → FAILED → (重置) PENDING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Acknowledged,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
            DeliveryStatus::Acknowledged => "ACKNOWLEDGED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(DeliveryStatus::Pending),
            "SENT" => Some(DeliveryStatus::Sent),
            "FAILED" => Some(DeliveryStatus::Failed),
            "ACKNOWLEDGED" => Some(DeliveryStatus::Acknowledged),
            _ => None,
        }
    }

    /// 是否表示成功送达
    pub fn is_successful(&self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Acknowledged)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 通知渠道 (Notification Channel)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    Email,
    Sms,
    Both, // 邮件 + 短信
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "EMAIL",
            NotificationChannel::Sms => "SMS",
            NotificationChannel::Both => "BOTH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EMAIL" => Some(NotificationChannel::Email),
            "SMS" => Some(NotificationChannel::Sms),
            "BOTH" => Some(NotificationChannel::Both),
            _ => None,
        }
    }

    /// 该渠道是否需要邮件地址
    pub fn requires_email(&self) -> bool {
        matches!(self, NotificationChannel::Email | NotificationChannel::Both)
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        NotificationChannel::Email
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 风险等级 (Risk Rating)
// ==========================================
// 顺序: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskRating {
    Low,
    Medium,
    High,
}

impl RiskRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Low => "LOW",
            RiskRating::Medium => "MEDIUM",
            RiskRating::High => "HIGH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(RiskRating::Low),
            "MEDIUM" => Some(RiskRating::Medium),
            "HIGH" => Some(RiskRating::High),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RiskRating::Low => "Low",
            RiskRating::Medium => "Medium",
            RiskRating::High => "High",
        }
    }
}

impl fmt::Display for RiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
