// ==========================================
// 合规提醒引擎 - 监管主数据实体
// ==========================================
// 职责: 公司、联系人、监管法规、合规要求、适用法规
// 红线: 合规要求一旦被义务引用即视为不可变 (修改不回溯已生成义务)
// ==========================================

use crate::domain::types::{RiskRating, TimelineKind};
use serde::{Deserialize, Serialize};

// ==========================================
// Company - 公司
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub email: Option<String>,       // 无具体联系人时的兜底收件地址
    pub company_kind: Option<String>, // 公司类型代码 (PRIVATE / PUBLIC / NGO ...)
    pub is_active: bool,
}

impl Company {
    /// 简称, 缺省回落到全称
    pub fn display_short_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

// ==========================================
// CompanyContact - 公司联系人
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyContact {
    pub contact_id: String,
    pub company_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
}

impl CompanyContact {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name,
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

// ==========================================
// RegulatoryAct - 监管法规
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryAct {
    pub act_id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub is_active: bool,
}

// ==========================================
// Requirement - 合规要求 (周期规则)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub requirement_id: String,
    pub act_id: String,
    pub title: String,
    pub section_reference: Option<String>,
    pub timeline_kind: TimelineKind,
    pub due_day_of_month: Option<u32>, // 缺省 15
    pub due_month: Option<u32>,        // 年度/固定类型缺省 12
    pub days_after_event: Option<i32>, // 仅事件触发类型
    pub applicable_company_kind: Option<String>, // None 表示不限公司类型
    pub default_risk_rating: Option<RiskRating>,
    pub penalty_amount: Option<f64>,
    pub is_active: bool,
}

impl Requirement {
    /// 是否适用于指定公司类型
    ///
    /// 类型代码按 ASCII 大小写不敏感比较;
    /// 只有两侧都有值且不同才视为不适用
    pub fn applies_to(&self, company_kind: Option<&str>) -> bool {
        match (self.applicable_company_kind.as_deref(), company_kind) {
            (Some(required), Some(actual)) => required.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }
}

// ==========================================
// ApplicableRegulation - 公司适用法规
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicableRegulation {
    pub applicable_id: String,
    pub company_id: String,
    pub act_id: String,
    pub is_active: bool,
}
