// ==========================================
// 合规提醒引擎 - 合规义务实体
// ==========================================
// 红线: (公司, 要求, 年, 季?, 月?) 唯一; 季/月缺省表示"不适用"而非 0
// ==========================================

use crate::domain::types::{ObligationStatus, RiskRating};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// PeriodKey - 期间键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub quarter: Option<u32>,
    pub month: Option<u32>,
}

impl PeriodKey {
    pub fn annual(year: i32) -> Self {
        Self { year, quarter: None, month: None }
    }

    pub fn quarterly(year: i32, quarter: u32) -> Self {
        Self { year, quarter: Some(quarter), month: None }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self { year, quarter: None, month: Some(month) }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.quarter, self.month) {
            (_, Some(m)) => write!(f, "{}-{:02}", self.year, m),
            (Some(q), None) => write!(f, "{}-Q{}", self.year, q),
            (None, None) => write!(f, "{}", self.year),
        }
    }
}

// ==========================================
// Obligation - 合规义务 (某公司某期间的具体实例)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub obligation_id: String,
    pub company_id: String,
    pub requirement_id: String,
    pub title: Option<String>,
    pub period_year: i32,
    pub period_quarter: Option<u32>,
    pub period_month: Option<u32>,
    pub due_date: Option<NaiveDate>,
    pub status: ObligationStatus,
    pub assigned_contact_id: Option<String>,
    pub risk_rating: Option<RiskRating>,
    pub completed_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Obligation {
    pub fn period(&self) -> PeriodKey {
        PeriodKey {
            year: self.period_year,
            quarter: self.period_quarter,
            month: self.period_month,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
