pub mod condition;

pub use condition::{Condition, ConditionRecord, DisplayPayload};
