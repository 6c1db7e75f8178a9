// ==========================================
// 义务状态流转集成测试
// ==========================================


use compliance_scheduler::domain::reminder_codes::{FIRST, INITIAL};
use compliance_scheduler::domain::types::{DeliveryStatus, ObligationStatus, TimelineKind};
use compliance_scheduler::engine::{EngineError, ObligationWorkflow, ReminderScheduler};
use test_helpers::*;

/// C1 / A1 下三条年度要求各一条义务
fn seed_three(env: &TestEnv) {
    env.seed_company_with_act("C1", "A1");
    for (obligation_id, requirement_id, due, status) in [
        ("O1", "R1", d(2024, 6, 15), ObligationStatus::Pending),
        ("O2", "R2", d(2024, 6, 10), ObligationStatus::Submitted),
        ("O3", "R3", d(2024, 7, 1), ObligationStatus::InProgress),
    ] {
        env.add_requirement(&requirement(requirement_id, "A1", TimelineKind::Annual));
        let mut o = obligation(obligation_id, "C1", requirement_id, due);
        o.status = status;
        env.add_obligation(&o);
    }
}

#[test]
fn test_change_status_records_completion() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_obligation(&env, d(2024, 6, 15));
    let workflow = ObligationWorkflow::new(env.repos.clone());

    let updated = workflow
        .change_status("O1", ObligationStatus::InProgress, at(2024, 6, 1, 9))
        .unwrap();
    assert_eq!(updated.completed_date, None);

    workflow
        .change_status("O1", ObligationStatus::Completed, at(2024, 6, 3, 9))
        .unwrap();
    let stored = workflow.find_obligation("O1").unwrap();
    assert_eq!(stored.status, ObligationStatus::Completed);
    assert_eq!(stored.completed_date, Some(at(2024, 6, 3, 9)));

    assert!(matches!(
        workflow.change_status("NOPE", ObligationStatus::Completed, at(2024, 6, 3, 9)),
        Err(EngineError::NotFound { .. })
    ));
}

#[test]
fn test_mark_complete_skips_terminal_and_missing() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_three(&env);
    let workflow = ObligationWorkflow::new(env.repos.clone());
    workflow
        .change_status("O2", ObligationStatus::Waived, at(2024, 6, 1, 0))
        .unwrap();

    let ids: Vec<String> = ["O1", "O2", "NOPE"].iter().map(|s| s.to_string()).collect();
    let completed = workflow.mark_complete(&ids, at(2024, 6, 2, 0)).unwrap();
    assert_eq!(completed, 1);

    assert_eq!(workflow.find_obligation("O1").unwrap().status, ObligationStatus::Completed);
    let waived = workflow.find_obligation("O2").unwrap();
    assert_eq!(waived.status, ObligationStatus::Waived);
    assert_eq!(waived.completed_date, Some(at(2024, 6, 1, 0)));
}

#[test]
fn test_mark_overdue_only_open_and_late() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_three(&env);
    let workflow = ObligationWorkflow::new(env.repos.clone());

    assert_eq!(workflow.mark_overdue(d(2024, 6, 20)).unwrap(), 1);
    assert_eq!(workflow.find_obligation("O1").unwrap().status, ObligationStatus::Overdue);
    assert_eq!(workflow.find_obligation("O2").unwrap().status, ObligationStatus::Submitted);
    assert_eq!(workflow.find_obligation("O3").unwrap().status, ObligationStatus::InProgress);

    // 已逾期的不重复计数
    assert_eq!(workflow.mark_overdue(d(2024, 6, 20)).unwrap(), 0);
}

#[test]
fn test_reschedule_regenerates_unsent_reminders() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let o = seed_obligation(&env, d(2024, 12, 15));
    ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&o, d(2024, 11, 1))
        .unwrap();

    let mut initial = env.reminder_of_type("O1", INITIAL).unwrap();
    initial.delivery_status = DeliveryStatus::Sent;
    initial.sent_date = Some(at(2024, 11, 15, 9));
    env.repos.reminders.update(&initial).unwrap();

    let created = ObligationWorkflow::new(env.repos.clone())
        .reschedule("O1", d(2024, 12, 31), d(2024, 11, 20))
        .unwrap();
    assert_eq!(created, 3);

    assert_eq!(
        env.repos.obligations.find_by_key("O1").unwrap().unwrap().due_date,
        Some(d(2024, 12, 31))
    );
    assert_eq!(
        env.reminder_of_type("O1", FIRST).unwrap().scheduled_date,
        d(2024, 12, 17)
    );
    assert_eq!(env.reminder_of_type("O1", INITIAL).unwrap().reminder_id, initial.reminder_id);
}

#[test]
fn test_reschedule_rejected_for_terminal() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_obligation(&env, d(2024, 12, 15));
    let workflow = ObligationWorkflow::new(env.repos.clone());
    workflow
        .change_status("O1", ObligationStatus::Completed, at(2024, 12, 1, 0))
        .unwrap();

    let result = workflow.reschedule("O1", d(2024, 12, 31), d(2024, 12, 2));
    assert!(matches!(result, Err(EngineError::InvalidStateTransition { .. })));
    assert_eq!(
        workflow.find_obligation("O1").unwrap().due_date,
        Some(d(2024, 12, 15))
    );
}
