// ==========================================
// 合规提醒引擎 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表 + 标准参考数据 (提醒类型 / 消息模板)
// ==========================================

use crate::domain::{MessageTemplate, ReminderType};
use crate::repository::sqlite::Record;
use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS company (
    company_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    short_name TEXT,
    email TEXT,
    company_kind TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS company_contact (
    contact_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT,
    email TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS regulatory_act (
    act_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    short_name TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS compliance_requirement (
    requirement_id TEXT PRIMARY KEY,
    act_id TEXT NOT NULL REFERENCES regulatory_act(act_id),
    title TEXT NOT NULL,
    section_reference TEXT,
    timeline_kind TEXT NOT NULL,
    due_day_of_month INTEGER,
    due_month INTEGER,
    days_after_event INTEGER,
    applicable_company_kind TEXT,
    default_risk_rating TEXT,
    penalty_amount REAL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS applicable_regulation (
    applicable_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
    act_id TEXT NOT NULL REFERENCES regulatory_act(act_id),
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS compliance_obligation (
    obligation_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES company(company_id),
    requirement_id TEXT NOT NULL REFERENCES compliance_requirement(requirement_id),
    title TEXT,
    period_year INTEGER NOT NULL,
    period_quarter INTEGER,
    period_month INTEGER,
    due_date TEXT,
    status TEXT NOT NULL,
    assigned_contact_id TEXT REFERENCES company_contact(contact_id),
    risk_rating TEXT,
    completed_date TEXT,
    created_at TEXT NOT NULL
);

-- 季/月缺省按 -1 参与唯一性, 避免 NULL 互不相等
CREATE UNIQUE INDEX IF NOT EXISTS ux_obligation_period ON compliance_obligation (
    company_id, requirement_id, period_year,
    COALESCE(period_quarter, -1), COALESCE(period_month, -1)
);

CREATE TABLE IF NOT EXISTS reminder_type (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    default_days_before_due INTEGER NOT NULL,
    is_escalation INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS reminder_setting (
    setting_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
    reminder_type_code TEXT REFERENCES reminder_type(code),
    is_enabled INTEGER NOT NULL DEFAULT 1,
    initial_reminder_days INTEGER NOT NULL DEFAULT 30,
    first_reminder_days INTEGER NOT NULL DEFAULT 14,
    second_reminder_days INTEGER NOT NULL DEFAULT 7,
    final_notice_days INTEGER NOT NULL DEFAULT 3,
    default_channel TEXT,
    escalate_to_manager INTEGER NOT NULL DEFAULT 0,
    escalation_contact_id TEXT REFERENCES company_contact(contact_id)
);

CREATE TABLE IF NOT EXISTS compliance_reminder (
    reminder_id TEXT PRIMARY KEY,
    obligation_id TEXT NOT NULL REFERENCES compliance_obligation(obligation_id) ON DELETE CASCADE,
    reminder_type_code TEXT NOT NULL REFERENCES reminder_type(code),
    scheduled_date TEXT NOT NULL,
    sent_date TEXT,
    delivery_status TEXT NOT NULL,
    channel TEXT NOT NULL,
    recipient_contact_id TEXT REFERENCES company_contact(contact_id),
    recipient_email TEXT,
    message_subject TEXT,
    message_body TEXT,
    error_message TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    acknowledged_date TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (obligation_id, reminder_type_code)
);

CREATE INDEX IF NOT EXISTS ix_reminder_due
    ON compliance_reminder (delivery_status, scheduled_date);

CREATE TABLE IF NOT EXISTS message_template (
    template_id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    reminder_type_code TEXT REFERENCES reminder_type(code),
    subject TEXT NOT NULL,
    body_html TEXT NOT NULL,
    body_text TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0
);
"#;

/// 幂等建表
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 安装标准参考数据 (仅补缺, 不覆盖已有记录)
///
/// # 返回
/// - (新增提醒类型数, 新增模板数)
pub fn install_reference_data(conn: &Connection) -> rusqlite::Result<(usize, usize)> {
    let mut types_added = 0;
    for reminder_type in ReminderType::standard_catalog() {
        types_added += insert_if_missing(conn, &reminder_type, "code", &reminder_type.code)?;
    }

    let mut templates_added = 0;
    for template in MessageTemplate::standard_catalog() {
        templates_added += insert_if_missing(conn, &template, "code", &template.code)?;
    }

    tracing::info!(
        "标准参考数据安装完成: 提醒类型新增={}, 模板新增={}",
        types_added,
        templates_added
    );
    Ok((types_added, templates_added))
}

fn insert_if_missing<T: Record>(
    conn: &Connection,
    record: &T,
    unique_column: &str,
    unique_value: &str,
) -> rusqlite::Result<usize> {
    let exists: bool = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE {} = ?1", T::TABLE, unique_column),
            [unique_value],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if exists {
        return Ok(0);
    }

    let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(record.to_values()))
}

/// 打开数据库并完成建表 + 参考数据安装
pub fn open_and_prepare(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    install_reference_data(&conn)?;
    Ok(conn)
}
