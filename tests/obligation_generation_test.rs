// ==========================================
// 义务生成引擎集成测试
// ==========================================
// 测试范围:
// 1. 期间展开: 年度 / 季度 / 月度 / 事件触发
// 2. 幂等: 同参数重复执行不新增
// 3. 过滤: 公司类型 / 启用状态
// 4. 事件触发义务
// ==========================================


use compliance_scheduler::domain::types::{ObligationStatus, RiskRating, TimelineKind};
use compliance_scheduler::domain::PeriodKey;
use compliance_scheduler::engine::{EngineError, ObligationGenerator};
use test_helpers::*;

/// C1 适用 A1; A1 下含年度 / 季度 / 月度 / 事件触发要求各一条
fn seed_mixed_act(env: &TestEnv) {
    env.seed_company_with_act("C1", "A1");
    env.add_requirement(&requirement("R-ANNUAL", "A1", TimelineKind::Annual));
    env.add_requirement(&requirement("R-QUARTER", "A1", TimelineKind::Quarterly));
    env.add_requirement(&requirement("R-MONTH", "A1", TimelineKind::Monthly));
    let mut event = requirement("R-EVENT", "A1", TimelineKind::EventDriven);
    event.days_after_event = Some(30);
    env.add_requirement(&event);
}

// ==========================================
// 期间展开与幂等
// ==========================================

#[test]
fn test_generate_full_year_is_idempotent() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);
    let generator = ObligationGenerator::new(env.repos.clone());

    // 年度 1 + 季度 4 + 月度 12, 事件触发不参与
    let first = generator.generate_for_company("C1", 2024, None, None).unwrap();
    assert_eq!(first, 17);

    let second = generator.generate_for_company("C1", 2024, None, None).unwrap();
    assert_eq!(second, 0);
    assert_eq!(env.obligations_of("C1").len(), 17);

    assert!(env
        .obligations_of("C1")
        .iter()
        .all(|o| o.requirement_id != "R-EVENT"));
}

#[test]
fn test_generate_single_quarter() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);
    let generator = ObligationGenerator::new(env.repos.clone());

    // 年度 1 + 季度 1 + 该季度 3 个月
    let created = generator.generate_for_period(2024, Some(2), None).unwrap();
    assert_eq!(created, 5);

    let quarterly = env
        .obligations_of("C1")
        .into_iter()
        .find(|o| o.requirement_id == "R-QUARTER")
        .unwrap();
    assert_eq!(quarterly.period(), PeriodKey::quarterly(2024, 2));
    assert_eq!(quarterly.due_date, Some(d(2024, 6, 15)));
    assert_eq!(quarterly.status, ObligationStatus::Pending);

    let mut months: Vec<u32> = env
        .obligations_of("C1")
        .iter()
        .filter(|o| o.requirement_id == "R-MONTH")
        .filter_map(|o| o.period_month)
        .collect();
    months.sort_unstable();
    assert_eq!(months, vec![4, 5, 6]);

    // 全年补齐时已有期间不重复创建: 季度 +3, 月度 +9
    let rest = generator.generate_for_period(2024, None, None).unwrap();
    assert_eq!(rest, 12);
}

#[test]
fn test_annual_obligation_key_has_no_sub_period() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);
    let generator = ObligationGenerator::new(env.repos.clone());

    generator.generate_for_company("C1", 2024, Some(3), Some(7)).unwrap();

    assert!(generator
        .obligation_exists("C1", "R-ANNUAL", PeriodKey::annual(2024))
        .unwrap());
    assert!(!generator
        .obligation_exists("C1", "R-ANNUAL", PeriodKey::quarterly(2024, 3))
        .unwrap());
    assert!(generator
        .obligation_exists("C1", "R-MONTH", PeriodKey::monthly(2024, 7))
        .unwrap());
}

#[test]
fn test_monthly_due_day_clamped_to_month_end() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    let mut monthly = requirement("R-MONTH", "A1", TimelineKind::Monthly);
    monthly.due_day_of_month = Some(31);
    env.add_requirement(&monthly);

    let generator = ObligationGenerator::new(env.repos.clone());
    assert_eq!(generator.generate_for_company("C1", 2024, None, Some(4)).unwrap(), 1);

    let obligation = &env.obligations_of("C1")[0];
    assert_eq!(obligation.due_date, Some(d(2024, 4, 30)));
}

#[test]
fn test_risk_rating_copied_from_requirement() {
    let env = TestEnv::new().expect("无法创建测试环境");
    env.seed_company_with_act("C1", "A1");
    let mut annual = requirement("R1", "A1", TimelineKind::Annual);
    annual.default_risk_rating = Some(RiskRating::High);
    annual.due_month = Some(3);
    env.add_requirement(&annual);

    ObligationGenerator::new(env.repos.clone())
        .generate_for_company("C1", 2025, None, None)
        .unwrap();

    let obligation = &env.obligations_of("C1")[0];
    assert_eq!(obligation.risk_rating, Some(RiskRating::High));
    assert_eq!(obligation.due_date, Some(d(2025, 3, 15)));
}

// ==========================================
// 过滤规则
// ==========================================

#[test]
fn test_company_kind_filter() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let mut private = company("C1");
    private.company_kind = Some("PRIVATE".to_string());
    env.add_company(&private);
    // 未设置类型的公司不受限制
    env.add_company(&company("C2"));
    env.add_act(&act("A1"));
    env.add_applicable(&applicable("AR1", "C1", "A1"));
    env.add_applicable(&applicable("AR2", "C2", "A1"));

    let mut public_only = requirement("R-PUBLIC", "A1", TimelineKind::Annual);
    public_only.applicable_company_kind = Some("PUBLIC".to_string());
    env.add_requirement(&public_only);
    env.add_requirement(&requirement("R-ALL", "A1", TimelineKind::Annual));

    let created = ObligationGenerator::new(env.repos.clone())
        .generate_for_period(2024, None, None)
        .unwrap();
    assert_eq!(created, 3);

    let c1: Vec<String> = env.obligations_of("C1").into_iter().map(|o| o.requirement_id).collect();
    assert_eq!(c1, vec!["R-ALL".to_string()]);
    assert_eq!(env.obligations_of("C2").len(), 2);
}

#[test]
fn test_inactive_records_are_skipped() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let mut dormant = company("C1");
    dormant.is_active = false;
    env.add_company(&dormant);
    env.add_company(&company("C2"));
    env.add_act(&act("A1"));
    env.add_applicable(&applicable("AR1", "C1", "A1"));
    let mut lapsed = applicable("AR2", "C2", "A1");
    lapsed.is_active = false;
    env.add_applicable(&lapsed);
    env.add_requirement(&requirement("R1", "A1", TimelineKind::Annual));

    let generator = ObligationGenerator::new(env.repos.clone());
    assert_eq!(generator.generate_for_period(2024, None, None).unwrap(), 0);
    assert_eq!(generator.generate_for_regulation(&lapsed, 2024, None, None).unwrap(), 0);

    // 停用的要求同样跳过
    env.add_applicable(&applicable("AR3", "C2", "A1"));
    let mut retired = requirement("R2", "A1", TimelineKind::Annual);
    retired.is_active = false;
    env.add_requirement(&retired);

    assert_eq!(generator.generate_for_company("C2", 2024, None, None).unwrap(), 1);
    assert_eq!(env.obligations_of("C2")[0].requirement_id, "R1");
}

#[test]
fn test_invalid_period_rejected() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);
    let generator = ObligationGenerator::new(env.repos.clone());

    assert!(matches!(
        generator.generate_for_period(2024, Some(5), None),
        Err(EngineError::InvalidPeriod(_))
    ));
    assert!(matches!(
        generator.generate_for_company("C1", 2024, None, Some(0)),
        Err(EngineError::InvalidPeriod(_))
    ));
    assert!(env.obligations_of("C1").is_empty());
}

#[test]
fn test_unknown_company_is_not_found() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let result = ObligationGenerator::new(env.repos.clone()).generate_for_company("NOPE", 2024, None, None);
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
}

// ==========================================
// 事件触发义务
// ==========================================

#[test]
fn test_event_obligation_created_once() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);
    let generator = ObligationGenerator::new(env.repos.clone());

    let created = generator
        .create_event_obligation("C1", "R-EVENT", d(2024, 3, 10))
        .unwrap()
        .expect("应创建事件义务");
    assert_eq!(created.due_date, Some(d(2024, 4, 9)));
    assert_eq!(created.period(), PeriodKey::annual(2024));

    let again = generator
        .create_event_obligation("C1", "R-EVENT", d(2024, 8, 1))
        .unwrap();
    assert!(again.is_none());
}

#[test]
fn test_event_obligation_requires_event_requirement() {
    let env = TestEnv::new().expect("无法创建测试环境");
    seed_mixed_act(&env);

    let result = ObligationGenerator::new(env.repos.clone()).create_event_obligation(
        "C1",
        "R-ANNUAL",
        d(2024, 3, 10),
    );
    assert!(matches!(result, Err(EngineError::InvalidPeriod(_))));
}
