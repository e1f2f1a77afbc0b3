// src/constants.rs

/// Delay between an activation signal and the frontmost-application check (ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Longest slice the host loop spends inside the platform run loop (ms)
pub const DEFAULT_PUMP_INTERVAL_MS: u64 = 250;

/// Accepted range for the debounce window (ms)
pub const DEBOUNCE_MS_RANGE: std::ops::RangeInclusive<u64> = 1..=5000;

/// Accepted range for the pump interval (ms)
pub const PUMP_INTERVAL_MS_RANGE: std::ops::RangeInclusive<u64> = 10..=5000;

/// Maximum length of an application or input source identifier
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Row 0 of the condition list is the "add condition" affordance
pub const ADD_ROW: usize = 0;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "INPUTSHIFT_LOG";
