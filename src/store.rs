//! Ordered, per-application list of input source conditions.
//!
//! The list is addressed two ways:
//! - positions (0-based) into the stored list, returned by [`ConditionStore::upsert`];
//! - rows, as the condition list UI shows them: row [`ADD_ROW`] is the
//!   "add condition" affordance and row `k >= 1` is position `k - 1`.

use crate::constants::ADD_ROW;
use crate::error::{AppError, Result};
use crate::models::{Condition, ConditionRecord, DisplayPayload};
use crate::platform::{InputSourceController, InputSourceHandle};
use crate::validation::validate_identifier;
use log::warn;

#[derive(Debug, Default)]
pub struct ConditionStore {
    conditions: Vec<Condition>,
}

/// Result of loading persisted records.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub store: ConditionStore,
    /// Records skipped because their input source is not installed here.
    pub stale: Vec<AppError>,
}

impl ConditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Insert or update the condition for `application_identifier`.
    ///
    /// An existing condition keeps its identity: its input source and display
    /// payload are replaced and it is re-enabled. New or updated, the touched
    /// condition moves to the top of the list, so the returned position is
    /// always 0.
    pub fn upsert(
        &mut self,
        application_identifier: &str,
        input_source_id: &str,
        display: DisplayPayload,
    ) -> Result<usize> {
        let application_identifier =
            validate_identifier("application_identifier", application_identifier)?;
        let input_source_id = validate_identifier("input_source_id", input_source_id)?;

        let existing = self
            .conditions
            .iter()
            .position(|c| c.application_identifier == application_identifier);

        let condition = match existing {
            Some(position) => {
                let mut condition = self.conditions.remove(position);
                if condition.input_source_id != input_source_id {
                    input_source_id.clone_into(&mut condition.input_source_id);
                    condition.input_source = DisplayPayload::default();
                }
                condition.display = display;
                condition.enabled = true;
                condition
            }
            None => Condition::new(application_identifier, input_source_id, display),
        };

        self.conditions.insert(0, condition);
        Ok(0)
    }

    /// Remove the condition shown at `row`.
    pub fn remove(&mut self, row: usize) -> Result<Condition> {
        let position = self.position_of_row(row)?;
        Ok(self.conditions.remove(position))
    }

    /// Enable or disable the condition shown at `row`. Order is unchanged.
    pub fn set_enabled(&mut self, row: usize, enabled: bool) -> Result<()> {
        let position = self.position_of_row(row)?;
        if let Some(condition) = self.conditions.get_mut(position) {
            condition.enabled = enabled;
        }
        Ok(())
    }

    /// Attach the input source's name and icon to the condition at `position`.
    pub fn set_input_source_display(&mut self, position: usize, display: DisplayPayload) {
        if let Some(condition) = self.conditions.get_mut(position) {
            condition.input_source = display;
        }
    }

    /// Condition shown at `row`.
    pub fn get_row(&self, row: usize) -> Result<&Condition> {
        let position = self.position_of_row(row)?;
        self.conditions.get(position).ok_or(AppError::OutOfRange {
            row,
            len: self.conditions.len(),
        })
    }

    /// First enabled condition for `application_identifier`, in list order.
    pub fn match_application(&self, application_identifier: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .filter(|c| c.enabled)
            .find(|c| c.application_identifier == application_identifier)
    }

    pub fn all(&self) -> &[Condition] {
        &self.conditions
    }

    /// Row under which the condition at `position` is displayed.
    pub fn row_of_position(position: usize) -> usize {
        position + 1
    }

    pub fn to_records(&self) -> Vec<ConditionRecord> {
        self.conditions.iter().map(ConditionRecord::from).collect()
    }

    /// Rebuild a store from persisted records.
    ///
    /// Records whose input source no longer resolves are skipped and reported
    /// in [`LoadReport::stale`]. The input source id is normalized to what
    /// the controller reports for the resolved handle.
    pub fn from_records<C>(records: Vec<ConditionRecord>, controller: &C) -> LoadReport
    where
        C: InputSourceController,
    {
        let mut report = LoadReport::default();

        for record in records {
            if report
                .store
                .conditions
                .iter()
                .any(|c| c.application_identifier == record.application_identifier)
            {
                warn!(
                    "Skipping duplicate persisted condition for {}",
                    record.application_identifier
                );
                continue;
            }

            let Some(handle) = controller.resolve(&record.input_source_id) else {
                let stale = AppError::StaleReference {
                    application_identifier: record.application_identifier,
                    input_source_id: record.input_source_id,
                };
                warn!("Skipping condition: {stale}");
                report.stale.push(stale);
                continue;
            };

            let mut condition = Condition::from(record);
            handle.id().clone_into(&mut condition.input_source_id);
            condition.input_source = input_source_display(&handle);
            report.store.conditions.push(condition);
        }

        report
    }

    fn position_of_row(&self, row: usize) -> Result<usize> {
        let len = self.conditions.len();
        if row == ADD_ROW || row > len {
            return Err(AppError::OutOfRange { row, len });
        }
        Ok(row - 1)
    }
}

/// Name and icon of an input source, for display next to a condition.
pub fn input_source_display<H: InputSourceHandle>(handle: &H) -> DisplayPayload {
    DisplayPayload::new(
        handle.localized_name().unwrap_or_default(),
        handle.icon().unwrap_or_default(),
    )
}
