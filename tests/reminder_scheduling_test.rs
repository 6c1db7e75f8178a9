// ==========================================
// 提醒排程引擎集成测试
// ==========================================
// 测试范围:
// 1. 提前天数: 设置覆写 / 类型默认值 / 非正数跳过
// 2. 不在过去排程
// 3. 终结状态排除
// 4. 接收人解析与升级提醒
// 5. 重新排程与批量排程
// ==========================================


use compliance_scheduler::domain::reminder_codes::{ESCALATION, FINAL, FIRST, INITIAL, SECOND};
use compliance_scheduler::domain::types::{
    DeliveryStatus, NotificationChannel, ObligationStatus, TimelineKind,
};
use compliance_scheduler::domain::ReminderSetting;
use compliance_scheduler::engine::{ObligationGenerator, ReminderScheduler};
use test_helpers::*;

// ==========================================
// 基本排程
// ==========================================

#[test]
fn test_quarterly_scenario_initial_reminder_date() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    env.add_requirement(&requirement("R-Q", "A1", TimelineKind::Quarterly));
    let mut setting = ReminderSetting::company_default("C1");
    setting.initial_reminder_days = 30;
    env.add_setting(&setting);

    ObligationGenerator::new(env.repos.clone())
        .generate_for_company("C1", 2024, Some(2), None)
        .unwrap();
    let obligation = env.obligations_of("C1").remove(0);
    assert_eq!(obligation.due_date, Some(d(2024, 6, 15)));

    let scheduler = ReminderScheduler::new(env.repos.clone());
    let created = scheduler.generate_for_obligation(&obligation, d(2024, 5, 1)).unwrap();
    assert_eq!(created, 4);

    let initial = env.reminder_of_type(&obligation.obligation_id, INITIAL).unwrap();
    assert_eq!(initial.scheduled_date, d(2024, 5, 16));
    assert_eq!(initial.delivery_status, DeliveryStatus::Pending);
    assert_eq!(initial.channel, NotificationChannel::Email);
    assert_eq!(initial.retry_count, 0);

    assert_eq!(
        env.reminder_of_type(&obligation.obligation_id, FINAL).unwrap().scheduled_date,
        d(2024, 6, 12)
    );
    // 未开启升级
    assert!(env.reminder_of_type(&obligation.obligation_id, ESCALATION).is_none());

    // 重复执行不产生重复提醒
    assert_eq!(scheduler.generate_for_obligation(&obligation, d(2024, 5, 1)).unwrap(), 0);
    assert_eq!(env.reminders_of(&obligation.obligation_id).len(), 4);
}

#[test]
fn test_type_defaults_without_settings() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 12, 15));

    let created = ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 11, 1))
        .unwrap();
    assert_eq!(created, 4);

    let dates: Vec<_> = [INITIAL, FIRST, SECOND, FINAL]
        .iter()
        .map(|code| env.reminder_of_type("O1", code).unwrap().scheduled_date)
        .collect();
    assert_eq!(dates, vec![d(2024, 11, 15), d(2024, 12, 1), d(2024, 12, 8), d(2024, 12, 12)]);
}

#[test]
fn test_disabled_setting_falls_back_to_defaults() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 12, 15));
    let mut setting = ReminderSetting::company_default("C1");
    setting.is_enabled = false;
    setting.initial_reminder_days = 60;
    setting.default_channel = Some(NotificationChannel::Sms);
    env.add_setting(&setting);

    ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 9, 1))
        .unwrap();

    let initial = env.reminder_of_type("O1", INITIAL).unwrap();
    assert_eq!(initial.scheduled_date, d(2024, 11, 15));
    assert_eq!(initial.channel, NotificationChannel::Email);
}

#[test]
fn test_non_positive_days_skipped() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 12, 15));
    let mut setting = ReminderSetting::company_default("C1");
    setting.second_reminder_days = 0;
    setting.final_notice_days = -2;
    setting.default_channel = Some(NotificationChannel::Both);
    env.add_setting(&setting);

    let created = ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 11, 1))
        .unwrap();
    assert_eq!(created, 2);
    assert!(env.reminder_of_type("O1", SECOND).is_none());
    assert!(env.reminder_of_type("O1", FINAL).is_none());
    assert_eq!(
        env.reminder_of_type("O1", INITIAL).unwrap().channel,
        NotificationChannel::Both
    );
}

// ==========================================
// 排除规则
// ==========================================

#[test]
fn test_final_notice_in_past_is_skipped() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 1, 10));
    let mut setting = ReminderSetting::company_default("C1");
    setting.final_notice_days = 3;
    env.add_setting(&setting);

    let created = ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 1, 20))
        .unwrap();
    assert_eq!(created, 0);
    assert!(env.reminder_of_type("O1", FINAL).is_none());
}

#[test]
fn test_partially_past_window() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 6, 15));

    // 05-16 / 06-01 已过, 06-08 当天可排程
    let created = ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 6, 8))
        .unwrap();
    assert_eq!(created, 2);
    assert!(env.reminder_of_type("O1", INITIAL).is_none());
    assert_eq!(env.reminder_of_type("O1", SECOND).unwrap().scheduled_date, d(2024, 6, 8));
}

#[test]
fn test_terminal_obligation_yields_no_reminders() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mut obligation = seed_obligation(&env, d(2024, 12, 15));
    let mut setting = ReminderSetting::company_default("C1");
    setting.escalate_to_manager = true;
    env.add_setting(&setting);

    let scheduler = ReminderScheduler::new(env.repos.clone());
    for status in [ObligationStatus::Completed, ObligationStatus::Waived] {
        obligation.status = status;
        assert_eq!(scheduler.generate_for_obligation(&obligation, d(2024, 1, 1)).unwrap(), 0);
    }

    obligation.status = ObligationStatus::Pending;
    obligation.due_date = None;
    assert_eq!(scheduler.generate_for_obligation(&obligation, d(2024, 1, 1)).unwrap(), 0);
    assert!(env.reminders_of("O1").is_empty());
}

// ==========================================
// 接收人
// ==========================================

#[test]
fn test_recipient_falls_back_to_company_email() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 12, 15));

    ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 11, 1))
        .unwrap();

    let initial = env.reminder_of_type("O1", INITIAL).unwrap();
    assert_eq!(initial.recipient_contact_id, None);
    assert_eq!(initial.recipient_email.as_deref(), Some("compliance@c1.test"));
}

#[test]
fn test_assigned_contact_and_escalation_contact() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    env.add_requirement(&requirement("R1", "A1", TimelineKind::Annual));
    env.add_contact(&contact("P-OFFICER", "C1", "Olive", Some("olive@c1.test")));
    env.add_contact(&contact("P-BOSS", "C1", "Boris", Some("boris@c1.test")));

    let mut o = obligation("O1", "C1", "R1", d(2024, 12, 15));
    o.assigned_contact_id = Some("P-OFFICER".to_string());
    env.add_obligation(&o);

    let mut setting = ReminderSetting::company_default("C1");
    setting.escalate_to_manager = true;
    setting.escalation_contact_id = Some("P-BOSS".to_string());
    env.add_setting(&setting);

    let created = ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&o, d(2024, 11, 1))
        .unwrap();
    assert_eq!(created, 5);

    let initial = env.reminder_of_type("O1", INITIAL).unwrap();
    assert_eq!(initial.recipient_contact_id.as_deref(), Some("P-OFFICER"));
    assert_eq!(initial.recipient_email.as_deref(), Some("olive@c1.test"));

    let escalation = env.reminder_of_type("O1", ESCALATION).unwrap();
    assert_eq!(escalation.scheduled_date, d(2024, 12, 14));
    assert_eq!(escalation.recipient_contact_id.as_deref(), Some("P-BOSS"));
    assert_eq!(escalation.recipient_email.as_deref(), Some("boris@c1.test"));
}

#[test]
fn test_contact_without_email_falls_back_to_company() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    env.add_requirement(&requirement("R1", "A1", TimelineKind::Annual));
    env.add_contact(&contact("P-NOMAIL", "C1", "Nora", None));
    env.add_contact(&contact("P-BLANK", "C1", "Bea", Some("  ")));

    let mut o = obligation("O1", "C1", "R1", d(2024, 12, 15));
    o.assigned_contact_id = Some("P-NOMAIL".to_string());
    env.add_obligation(&o);

    let mut setting = ReminderSetting::company_default("C1");
    setting.escalate_to_manager = true;
    setting.escalation_contact_id = Some("P-BLANK".to_string());
    env.add_setting(&setting);

    ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&o, d(2024, 11, 1))
        .unwrap();

    let initial = env.reminder_of_type("O1", INITIAL).unwrap();
    assert_eq!(initial.recipient_contact_id.as_deref(), Some("P-NOMAIL"));
    assert_eq!(initial.recipient_email.as_deref(), Some("compliance@c1.test"));

    let escalation = env.reminder_of_type("O1", ESCALATION).unwrap();
    assert_eq!(escalation.recipient_contact_id.as_deref(), Some("P-BLANK"));
    assert_eq!(escalation.recipient_email.as_deref(), Some("compliance@c1.test"));
}

#[test]
fn test_escalation_without_contact_uses_standard_recipient() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let obligation = seed_obligation(&env, d(2024, 12, 15));
    let mut setting = ReminderSetting::company_default("C1");
    setting.escalate_to_manager = true;
    env.add_setting(&setting);

    ReminderScheduler::new(env.repos.clone())
        .generate_for_obligation(&obligation, d(2024, 11, 1))
        .unwrap();

    let escalation = env.reminder_of_type("O1", ESCALATION).unwrap();
    assert_eq!(escalation.recipient_email.as_deref(), Some("compliance@c1.test"));
}

// ==========================================
// 重新排程 / 批量
// ==========================================

#[test]
fn test_regenerate_keeps_sent_reminders() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mut obligation = seed_obligation(&env, d(2024, 12, 15));
    let scheduler = ReminderScheduler::new(env.repos.clone());
    scheduler.generate_for_obligation(&obligation, d(2024, 11, 1)).unwrap();

    let mut initial = env.reminder_of_type("O1", INITIAL).unwrap();
    initial.delivery_status = DeliveryStatus::Sent;
    initial.sent_date = Some(at(2024, 11, 15, 9));
    env.repos.reminders.update(&initial).unwrap();

    obligation.due_date = Some(d(2024, 12, 31));
    env.repos.obligations.update(&obligation).unwrap();

    let created = scheduler.regenerate(&obligation, d(2024, 11, 20)).unwrap();
    assert_eq!(created, 3);

    let kept = env.reminder_of_type("O1", INITIAL).unwrap();
    assert_eq!(kept.reminder_id, initial.reminder_id);
    assert_eq!(kept.scheduled_date, d(2024, 11, 15));
    assert_eq!(env.reminder_of_type("O1", FIRST).unwrap().scheduled_date, d(2024, 12, 17));
    assert_eq!(env.reminders_of("O1").len(), 4);
}

#[test]
fn test_generate_all_filters_obligations() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    env.seed_company_with_act("C2", "A1");
    env.add_requirement(&requirement("R1", "A1", TimelineKind::Annual));

    env.add_obligation(&obligation("O-OPEN", "C1", "R1", d(2024, 12, 15)));
    let mut done = obligation("O-DONE", "C1", "R1", d(2025, 12, 15));
    done.status = ObligationStatus::Completed;
    env.add_obligation(&done);
    let mut undated = obligation("O-UNDATED", "C1", "R1", d(2026, 12, 15));
    undated.due_date = None;
    env.add_obligation(&undated);
    env.add_obligation(&obligation("O-OTHER", "C2", "R1", d(2024, 12, 15)));

    let scheduler = ReminderScheduler::new(env.repos.clone());
    assert_eq!(scheduler.generate_all(Some("C1"), d(2024, 11, 1)).unwrap(), 4);
    assert!(env.reminders_of("O-DONE").is_empty());
    assert!(env.reminders_of("O-UNDATED").is_empty());
    assert!(env.reminders_of("O-OTHER").is_empty());

    assert_eq!(scheduler.generate_all(None, d(2024, 11, 1)).unwrap(), 4);
    assert_eq!(env.reminders_of("O-OTHER").len(), 4);
}

#[test]
fn test_resolve_settings_ignores_type_specific_rows() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_obligation(&env, d(2024, 12, 15));
    let mut typed = ReminderSetting::company_default("C1");
    typed.reminder_type_code = Some(INITIAL.to_string());
    env.add_setting(&typed);

    let scheduler = ReminderScheduler::new(env.repos.clone());
    assert!(scheduler.resolve_settings("C1").unwrap().is_none());

    let general = ReminderSetting::company_default("C1");
    env.add_setting(&general);
    assert_eq!(
        scheduler.resolve_settings("C1").unwrap().map(|s| s.setting_id),
        Some(general.setting_id)
    );
}
