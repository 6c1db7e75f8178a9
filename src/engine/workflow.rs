// ==========================================
// 合规提醒引擎 - 义务状态流转
// ==========================================
// 职责: 状态变更 / 批量完成 / 逾期标记 / 到期日改期
// 红线:
// - 进入终结状态时写入 completed_date (已有则保留)
// - 终结状态义务不再改期
// ==========================================

use crate::domain::types::ObligationStatus;
use crate::domain::Obligation;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::reminder_scheduler::ReminderScheduler;
use crate::engine::repositories::ComplianceRepositories;
use crate::repository::{in_unit_of_work, Predicate};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, instrument};

pub struct ObligationWorkflow {
    repos: ComplianceRepositories,
    scheduler: ReminderScheduler,
}

impl ObligationWorkflow {
    pub fn new(repos: ComplianceRepositories) -> Self {
        Self {
            scheduler: ReminderScheduler::new(repos.clone()),
            repos,
        }
    }

    pub fn find_obligation(&self, obligation_id: &str) -> EngineResult<Obligation> {
        self.repos
            .obligations
            .find_by_key(obligation_id)?
            .ok_or_else(|| EngineError::not_found("Obligation", obligation_id))
    }

    /// 变更义务状态
    #[instrument(skip(self))]
    pub fn change_status(
        &self,
        obligation_id: &str,
        status: ObligationStatus,
        now: NaiveDateTime,
    ) -> EngineResult<Obligation> {
        let mut obligation = self.find_obligation(obligation_id)?;
        apply_status(&mut obligation, status, now);
        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            self.repos.obligations.update(&obligation)
        })?;
        Ok(obligation)
    }

    /// 批量标记完成 (已终结的义务跳过)
    ///
    /// # 返回
    /// - 实际完成的数量
    #[instrument(skip(self, obligation_ids))]
    pub fn mark_complete(&self, obligation_ids: &[String], now: NaiveDateTime) -> EngineResult<usize> {
        let completed = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            let mut completed = 0;
            for id in obligation_ids {
                let Some(mut obligation) = self.repos.obligations.find_by_key(id)? else {
                    continue;
                };
                if obligation.is_terminal() {
                    continue;
                }
                apply_status(&mut obligation, ObligationStatus::Completed, now);
                self.repos.obligations.update(&obligation)?;
                completed += 1;
            }
            Ok::<usize, EngineError>(completed)
        })?;

        info!("批量完成义务: 请求={}, 完成={}", obligation_ids.len(), completed);
        Ok(completed)
    }

    /// 标记逾期: 到期日早于 today 且处于 PENDING / IN_PROGRESS
    #[instrument(skip(self))]
    pub fn mark_overdue(&self, today: NaiveDate) -> EngineResult<usize> {
        let marked = in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            let late = self.repos.obligations.find_all(
                &Predicate::lt("due_date", today).and(Predicate::any_of(
                    "status",
                    [ObligationStatus::Pending, ObligationStatus::InProgress],
                )),
            )?;
            for obligation in &late {
                let mut obligation = obligation.clone();
                obligation.status = ObligationStatus::Overdue;
                self.repos.obligations.update(&obligation)?;
            }
            Ok::<usize, EngineError>(late.len())
        })?;

        info!("逾期义务标记完成: {}", marked);
        Ok(marked)
    }

    /// 改期: 更新到期日并重新排程未发送的提醒
    ///
    /// # 返回
    /// - 重新排程后新建的提醒数
    #[instrument(skip(self))]
    pub fn reschedule(
        &self,
        obligation_id: &str,
        new_due_date: NaiveDate,
        today: NaiveDate,
    ) -> EngineResult<usize> {
        let mut obligation = self.find_obligation(obligation_id)?;
        if obligation.is_terminal() {
            return Err(EngineError::InvalidStateTransition {
                from: obligation.status.to_string(),
                to: "RESCHEDULED".to_string(),
            });
        }

        in_unit_of_work(self.repos.unit_of_work.as_ref(), || {
            obligation.due_date = Some(new_due_date);
            self.repos.obligations.update(&obligation)?;
            self.scheduler.regenerate(&obligation, today)
        })
    }
}

fn apply_status(obligation: &mut Obligation, status: ObligationStatus, now: NaiveDateTime) {
    obligation.status = status;
    if status.is_terminal() && obligation.completed_date.is_none() {
        obligation.completed_date = Some(now);
    }
}
