// ==========================================
// 合规提醒引擎 - 到期日计算
// ==========================================
// 职责: 周期规则 + 期间 → 具体到期日 (纯函数, 无副作用)
// 红线: 日期非法时按当月天数截断 (如 2 月 31 日 → 2 月末)
// ==========================================

use crate::domain::types::TimelineKind;
use crate::domain::Requirement;
use chrono::{Datelike, Duration, NaiveDate};

/// 缺省到期日 (每月 15 日)
pub const DEFAULT_DUE_DAY: u32 = 15;
/// 年度/固定类型缺省到期月 (12 月)
pub const DEFAULT_DUE_MONTH: u32 = 12;

/// 计算到期日
///
/// # 参数
/// - requirement: 合规要求 (周期规则)
/// - year: 期间年份
/// - quarter: 季度 (1-4), 季度类型必填
/// - month: 月份 (1-12), 月度类型必填
/// - event_date: 事件日期, 事件触发类型必填
///
/// # 返回
/// - None: 必要参数缺失或日期无法构造
pub fn calculate_due_date(
    requirement: &Requirement,
    year: i32,
    quarter: Option<u32>,
    month: Option<u32>,
    event_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    let day = requirement.due_day_of_month.unwrap_or(DEFAULT_DUE_DAY);

    match requirement.timeline_kind {
        TimelineKind::Annual | TimelineKind::Fixed => {
            let due_month = requirement.due_month.unwrap_or(DEFAULT_DUE_MONTH);
            date_clamped(year, due_month, day)
        }
        TimelineKind::Quarterly => {
            let q = quarter?;
            date_clamped(year, q * 3, day)
        }
        TimelineKind::Monthly => date_clamped(year, month?, day),
        TimelineKind::EventDriven => {
            let event = event_date?;
            let offset = requirement.days_after_event?;
            event.checked_add_signed(Duration::days(offset as i64))
        }
        TimelineKind::Always => NaiveDate::from_ymd_opt(year, 12, 31),
    }
}

/// 当月天数
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next_first.pred_opt()?.day())
}

/// 构造日期, 日按当月天数截断 (下限 1)
pub fn date_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let max_day = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, max_day))
}
