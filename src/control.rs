//! Line-oriented JSON control protocol.
//!
//! Each input line is one request object, each reply is one line of JSON:
//!
//! ```text
//! {"type":"add_current"}            -> {"type":"added","row":1}
//! {"type":"set_enabled","row":1,"enabled":false}
//! {"type":"list"}                   -> {"type":"conditions","conditions":[...]}
//! ```

use crate::models::Condition;
use crate::signal::ServiceHandle;
use crate::store::ConditionStore;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ControlRequest {
    #[serde(rename = "add_current")]
    AddCurrent,
    #[serde(rename = "remove")]
    Remove { row: usize },
    #[serde(rename = "set_enabled")]
    SetEnabled { row: usize, enabled: bool },
    #[serde(rename = "list")]
    List,
    #[serde(rename = "activate")]
    Activate { row: usize },
    #[serde(rename = "quit")]
    Quit,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ControlReply {
    #[serde(rename = "added")]
    Added { row: usize },
    #[serde(rename = "removed")]
    Removed {
        #[serde(rename = "applicationIdentifier")]
        application_identifier: String,
    },
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "conditions")]
    Conditions { conditions: Vec<ConditionView> },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "bye")]
    Bye,
}

/// A condition as listed to clients, addressed by its UI row.
#[derive(Debug, Serialize)]
pub struct ConditionView {
    pub row: usize,
    #[serde(rename = "applicationIdentifier")]
    pub application_identifier: String,
    #[serde(rename = "applicationName")]
    pub application_name: String,
    #[serde(rename = "inputSourceId")]
    pub input_source_id: String,
    #[serde(rename = "inputSourceName")]
    pub input_source_name: String,
    pub enabled: bool,
}

impl ConditionView {
    fn from_position(position: usize, condition: Condition) -> Self {
        Self {
            row: ConditionStore::row_of_position(position),
            application_identifier: condition.application_identifier,
            application_name: condition.display.name,
            input_source_id: condition.input_source_id,
            input_source_name: condition.input_source.name,
            enabled: condition.enabled,
        }
    }
}

/// Serve requests from `reader` until EOF or a `quit` request.
///
/// EOF only ends this reader; `quit` also shuts the service down.
pub fn serve<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    handle: &ServiceHandle,
) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<ControlRequest>(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring malformed control request: {e}");
                let reply = ControlReply::Error {
                    message: format!("malformed request: {e}"),
                };
                write_reply(writer, &reply)?;
                continue;
            }
        };
        debug!("Control request: {request:?}");

        let reply = handle_request(request, handle);
        write_reply(writer, &reply)?;
        if matches!(reply, ControlReply::Bye) {
            return Ok(());
        }
    }

    debug!("Control input closed");
    Ok(())
}

fn handle_request(request: ControlRequest, handle: &ServiceHandle) -> ControlReply {
    let result = match request {
        ControlRequest::AddCurrent => handle.add_current_application().map(|position| {
            ControlReply::Added {
                row: ConditionStore::row_of_position(position),
            }
        }),
        ControlRequest::Remove { row } => handle.remove(row).map(|removed| ControlReply::Removed {
            application_identifier: removed.application_identifier,
        }),
        ControlRequest::SetEnabled { row, enabled } => {
            handle.set_enabled(row, enabled).map(|()| ControlReply::Ok)
        }
        ControlRequest::List => handle.conditions().map(|conditions| ControlReply::Conditions {
            conditions: conditions
                .into_iter()
                .enumerate()
                .map(|(position, condition)| ConditionView::from_position(position, condition))
                .collect(),
        }),
        ControlRequest::Activate { row } => {
            handle.activate_condition(row).map(|()| ControlReply::Ok)
        }
        ControlRequest::Quit => {
            if let Err(e) = handle.shutdown() {
                warn!("Shutdown request failed: {e}");
            }
            Ok(ControlReply::Bye)
        }
    };

    result.unwrap_or_else(|e| ControlReply::Error { message: e.to_string() })
}

fn write_reply<W: Write>(writer: &mut W, reply: &ControlReply) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, reply)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
