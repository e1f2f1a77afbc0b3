use crate::error::{is_unique_violation, AppError};
use rusqlite::{params, Connection};

/// Display-only data for a condition row. The engine stores it but never
/// looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayPayload {
    pub name: String,
    pub icon: Vec<u8>,
}

impl DisplayPayload {
    pub fn new(name: impl Into<String>, icon: Vec<u8>) -> Self {
        Self { name: name.into(), icon }
    }
}

/// One user rule: when `application_identifier` becomes frontmost, switch to
/// `input_source_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub application_identifier: String,
    pub input_source_id: String,
    pub enabled: bool,
    /// Application name and icon.
    pub display: DisplayPayload,
    /// Input source name and icon. Not persisted; refreshed from the
    /// installed input source.
    pub input_source: DisplayPayload,
}

impl Condition {
    pub fn new(
        application_identifier: &str,
        input_source_id: &str,
        display: DisplayPayload,
    ) -> Self {
        Self {
            application_identifier: application_identifier.to_string(),
            input_source_id: input_source_id.to_string(),
            enabled: true,
            display,
            input_source: DisplayPayload::default(),
        }
    }
}

/// Persisted form of a [`Condition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionRecord {
    pub application_identifier: String,
    pub input_source_id: String,
    pub enabled: bool,
    pub display_name: String,
    pub display_icon: Vec<u8>,
}

impl From<&Condition> for ConditionRecord {
    fn from(condition: &Condition) -> Self {
        Self {
            application_identifier: condition.application_identifier.clone(),
            input_source_id: condition.input_source_id.clone(),
            enabled: condition.enabled,
            display_name: condition.display.name.clone(),
            display_icon: condition.display.icon.clone(),
        }
    }
}

impl From<ConditionRecord> for Condition {
    fn from(record: ConditionRecord) -> Self {
        Self {
            application_identifier: record.application_identifier,
            input_source_id: record.input_source_id,
            enabled: record.enabled,
            display: DisplayPayload::new(record.display_name, record.display_icon),
            input_source: DisplayPayload::default(),
        }
    }
}

impl ConditionRecord {
    /// Load all records in list order.
    pub fn load_all(conn: &Connection) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT application_identifier, input_source_id, enabled, display_name, display_icon
             FROM conditions ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Self {
                application_identifier: row.get(0)?,
                input_source_id: row.get(1)?,
                enabled: row.get(2)?,
                display_name: row.get(3)?,
                display_icon: row.get(4)?,
            })
        })?;

        rows.collect()
    }

    /// Replace the stored list with `records`, keeping their order.
    pub fn save_all(conn: &mut Connection, records: &[Self]) -> Result<(), AppError> {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM conditions", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO conditions
                 (position, application_identifier, input_source_id, enabled, display_name, display_icon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, record) in (0_i64..).zip(records) {
                stmt.execute(params![
                    position,
                    record.application_identifier,
                    record.input_source_id,
                    record.enabled,
                    record.display_name,
                    record.display_icon,
                ])
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::InvalidInput {
                            field: "application_identifier",
                            reason: format!("'{}' appears twice", record.application_identifier),
                        }
                    } else {
                        AppError::Database(e)
                    }
                })?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
