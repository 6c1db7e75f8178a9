// ==========================================
// 合规提醒引擎 - 义务生成引擎
// ==========================================
// 职责: (公司, 适用法规, 期间) → 去重后的合规义务
// 输入: applicable_regulation + compliance_requirement
// 输出: 新增 compliance_obligation (status = PENDING)
// 红线: 同参数重复执行不产生新记录 (幂等); 事件触发类型不参与期间扫描
// ==========================================

use crate::domain::types::{ObligationStatus, TimelineKind};
use crate::domain::{ApplicableRegulation, Company, Obligation, PeriodKey, Requirement};
use crate::engine::due_date::calculate_due_date;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::ComplianceRepositories;
use crate::repository::{in_unit_of_work, Predicate};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info, instrument};

// ==========================================
// ObligationGenerator - 义务生成引擎
// ==========================================
pub struct ObligationGenerator {
    repos: ComplianceRepositories,
}

impl ObligationGenerator {
    /// 创建新的义务生成引擎
    pub fn new(repos: ComplianceRepositories) -> Self {
        Self { repos }
    }

    // ==========================================
    // 入口方法
    // ==========================================

    /// 为单条适用法规生成义务
    ///
    /// # 参数
    /// - regulation: 公司适用法规
    /// - year: 年份
    /// - quarter: 季度 (可选, 1-4)
    /// - month: 月份 (可选, 1-12)
    ///
    /// # 返回
    /// - 新建义务数量
    #[instrument(skip(self, regulation), fields(regulation = %regulation.applicable_id))]
    pub fn generate_for_regulation(
        &self,
        regulation: &ApplicableRegulation,
        year: i32,
        quarter: Option<u32>,
        month: Option<u32>,
    ) -> EngineResult<usize> {
        validate_period(quarter, month)?;
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.generate_for_regulation_inner(regulation, year, quarter, month)
        })
    }

    /// 为单个公司的全部有效适用法规生成义务
    #[instrument(skip(self))]
    pub fn generate_for_company(
        &self,
        company_id: &str,
        year: i32,
        quarter: Option<u32>,
        month: Option<u32>,
    ) -> EngineResult<usize> {
        validate_period(quarter, month)?;
        let company = self
            .repos
            .companies
            .find_by_key(company_id)?
            .ok_or_else(|| EngineError::not_found("Company", company_id))?;

        let created = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.generate_for_company_inner(&company, year, quarter, month)
        })?;

        info!("公司义务生成完成: company={}, 新建={}", company.company_id, created);
        Ok(created)
    }

    /// 为全部有效公司生成义务
    #[instrument(skip(self))]
    pub fn generate_for_period(
        &self,
        year: i32,
        quarter: Option<u32>,
        month: Option<u32>,
    ) -> EngineResult<usize> {
        validate_period(quarter, month)?;

        let created = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            let companies = self
                .repos
                .companies
                .find_all(&Predicate::eq("is_active", true))?;

            let mut total = 0;
            for company in &companies {
                total += self.generate_for_company_inner(company, year, quarter, month)?;
            }
            Ok::<usize, EngineError>(total)
        })?;

        info!(
            "期间义务生成完成: period={}, 新建={}",
            PeriodKey { year, quarter, month },
            created
        );
        Ok(created)
    }

    /// 按事件日期创建事件触发类义务
    ///
    /// 期间年份取事件日期所在年份
    ///
    /// # 返回
    /// - Some(obligation): 新建的义务
    /// - None: 同期间义务已存在, 或要求未配置事件后天数
    #[instrument(skip(self))]
    pub fn create_event_obligation(
        &self,
        company_id: &str,
        requirement_id: &str,
        event_date: NaiveDate,
    ) -> EngineResult<Option<Obligation>> {
        let company = self
            .repos
            .companies
            .find_by_key(company_id)?
            .ok_or_else(|| EngineError::not_found("Company", company_id))?;
        let requirement = self
            .repos
            .requirements
            .find_by_key(requirement_id)?
            .ok_or_else(|| EngineError::not_found("Requirement", requirement_id))?;

        if requirement.timeline_kind != TimelineKind::EventDriven {
            return Err(EngineError::InvalidPeriod(format!(
                "要求 {} 的周期类型为 {}, 不是事件触发类型",
                requirement.requirement_id, requirement.timeline_kind
            )));
        }

        let period = PeriodKey::annual(event_date.year());
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.create_if_absent(&company, &requirement, period, Some(event_date))
        })
    }

    /// 指定期间的义务是否已存在
    ///
    /// 季/月缺省按 "不适用" 精确匹配
    pub fn obligation_exists(
        &self,
        company_id: &str,
        requirement_id: &str,
        period: PeriodKey,
    ) -> EngineResult<bool> {
        let predicate = Predicate::eq("company_id", company_id)
            .and(Predicate::eq("requirement_id", requirement_id))
            .and(Predicate::eq("period_year", period.year))
            .and(Predicate::eq("period_quarter", period.quarter))
            .and(Predicate::eq("period_month", period.month));
        Ok(self.repos.obligations.exists(&predicate)?)
    }

    // ==========================================
    // 内部实现
    // ==========================================

    fn generate_for_company_inner(
        &self,
        company: &Company,
        year: i32,
        quarter: Option<u32>,
        month: Option<u32>,
    ) -> EngineResult<usize> {
        if !company.is_active {
            return Ok(0);
        }

        let regulations = self.repos.applicable_regulations.find_all(
            &Predicate::eq("company_id", company.company_id.as_str())
                .and(Predicate::eq("is_active", true)),
        )?;

        let mut total = 0;
        for regulation in &regulations {
            total += self.generate_for_regulation_inner(regulation, year, quarter, month)?;
        }
        Ok(total)
    }

    fn generate_for_regulation_inner(
        &self,
        regulation: &ApplicableRegulation,
        year: i32,
        quarter: Option<u32>,
        month: Option<u32>,
    ) -> EngineResult<usize> {
        if !regulation.is_active {
            return Ok(0);
        }

        let company = self
            .repos
            .companies
            .find_by_key(&regulation.company_id)?
            .ok_or_else(|| EngineError::not_found("Company", &regulation.company_id))?;
        if !company.is_active {
            return Ok(0);
        }

        let requirements = self.repos.requirements.find_all(
            &Predicate::eq("act_id", regulation.act_id.as_str())
                .and(Predicate::eq("is_active", true)),
        )?;

        let mut created = 0;
        for requirement in &requirements {
            if !requirement.applies_to(company.company_kind.as_deref()) {
                debug!(
                    "要求不适用于公司类型, 跳过: requirement={}, company_kind={:?}",
                    requirement.requirement_id, company.company_kind
                );
                continue;
            }

            for period in expand_periods(requirement.timeline_kind, year, quarter, month) {
                if self
                    .create_if_absent(&company, requirement, period, None)?
                    .is_some()
                {
                    created += 1;
                }
            }
        }

        debug!(
            "适用法规义务生成: regulation={}, 要求数={}, 新建={}",
            regulation.applicable_id,
            requirements.len(),
            created
        );
        Ok(created)
    }

    fn create_if_absent(
        &self,
        company: &Company,
        requirement: &Requirement,
        period: PeriodKey,
        event_date: Option<NaiveDate>,
    ) -> EngineResult<Option<Obligation>> {
        if self.obligation_exists(&company.company_id, &requirement.requirement_id, period)? {
            return Ok(None);
        }

        let Some(due_date) =
            calculate_due_date(requirement, period.year, period.quarter, period.month, event_date)
        else {
            debug!(
                "无法计算到期日, 跳过: requirement={}, period={}",
                requirement.requirement_id, period
            );
            return Ok(None);
        };

        let obligation = Obligation {
            obligation_id: uuid::Uuid::new_v4().to_string(),
            company_id: company.company_id.clone(),
            requirement_id: requirement.requirement_id.clone(),
            title: None,
            period_year: period.year,
            period_quarter: period.quarter,
            period_month: period.month,
            due_date: Some(due_date),
            status: ObligationStatus::Pending,
            assigned_contact_id: None,
            risk_rating: requirement.default_risk_rating,
            completed_date: None,
            created_at: Utc::now().naive_utc(),
        };

        match self.repos.obligations.insert(&obligation) {
            Ok(()) => Ok(Some(obligation)),
            // 唯一索引兜底: 视为已存在
            Err(e) if e.is_duplicate() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// 校验期间参数
fn validate_period(quarter: Option<u32>, month: Option<u32>) -> EngineResult<()> {
    if let Some(q) = quarter {
        if !(1..=4).contains(&q) {
            return Err(EngineError::InvalidPeriod(format!("季度必须在 1-4 之间: {}", q)));
        }
    }
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(EngineError::InvalidPeriod(format!("月份必须在 1-12 之间: {}", m)));
        }
    }
    Ok(())
}

/// 按周期类型展开待尝试的期间
///
/// - 年度 / 持续 / 固定: 全年一次
/// - 季度: 指定季度, 否则 1-4 季度
/// - 月度: 指定月份; 仅指定季度时取该季度 3 个月; 否则 1-12 月
/// - 事件触发: 不展开
pub fn expand_periods(
    kind: TimelineKind,
    year: i32,
    quarter: Option<u32>,
    month: Option<u32>,
) -> Vec<PeriodKey> {
    match kind {
        TimelineKind::Annual | TimelineKind::Always | TimelineKind::Fixed => {
            vec![PeriodKey::annual(year)]
        }
        TimelineKind::Quarterly => match quarter {
            Some(q) => vec![PeriodKey::quarterly(year, q)],
            None => (1..=4).map(|q| PeriodKey::quarterly(year, q)).collect(),
        },
        TimelineKind::Monthly => match (month, quarter) {
            (Some(m), _) => vec![PeriodKey::monthly(year, m)],
            (None, Some(q)) => {
                let start = (q - 1) * 3 + 1;
                (start..start + 3).map(|m| PeriodKey::monthly(year, m)).collect()
            }
            (None, None) => (1..=12).map(|m| PeriodKey::monthly(year, m)).collect(),
        },
        TimelineKind::EventDriven => Vec::new(),
    }
}
