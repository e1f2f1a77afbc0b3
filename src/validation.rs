use crate::constants::{DEBOUNCE_MS_RANGE, MAX_IDENTIFIER_LEN, PUMP_INTERVAL_MS_RANGE};
use crate::error::AppError;

/// Validate an application or input source identifier.
/// Returns the trimmed identifier.
pub fn validate_identifier<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput {
            field,
            reason: "cannot be empty".into(),
        });
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::InvalidInput {
            field,
            reason: format!("cannot exceed {MAX_IDENTIFIER_LEN} characters"),
        });
    }
    Ok(value)
}

/// Validate the debounce window in milliseconds.
pub fn validate_debounce_ms(debounce_ms: u64) -> Result<(), AppError> {
    if !DEBOUNCE_MS_RANGE.contains(&debounce_ms) {
        return Err(AppError::InvalidInput {
            field: "debounce_ms",
            reason: format!(
                "must be {}-{}",
                DEBOUNCE_MS_RANGE.start(),
                DEBOUNCE_MS_RANGE.end()
            ),
        });
    }
    Ok(())
}

/// Validate the pump interval in milliseconds.
pub fn validate_pump_interval_ms(interval_ms: u64) -> Result<(), AppError> {
    if !PUMP_INTERVAL_MS_RANGE.contains(&interval_ms) {
        return Err(AppError::InvalidInput {
            field: "pump_interval_ms",
            reason: format!(
                "must be {}-{}",
                PUMP_INTERVAL_MS_RANGE.start(),
                PUMP_INTERVAL_MS_RANGE.end()
            ),
        });
    }
    Ok(())
}
