//! Corrective feedback for tool names the registry does not know.
//!
//! After a step's results are appended, [`unknown_tool_feedback`] looks for
//! unknown-operation results and, if any exist, builds one extra result
//! telling the model which names were rejected and which are valid.

use serde_json::json;
use uuid::Uuid;

use crate::constants::FEEDBACK_CALL_ID_PREFIX;
use crate::message::{Outcome, ResultSource, ToolResult};

/// Builds the synthetic feedback result for one step, if it needs one.
///
/// Detection keys off [`Outcome::UnknownOperation`], never the error text.
/// Rejected names keep the order their calls were dispatched in and are
/// not deduplicated.
pub fn unknown_tool_feedback(results: &[ToolResult], valid_names: &[String]) -> Option<ToolResult> {
    let rejected: Vec<&str> = results
        .iter()
        .filter(|r| r.is_unknown_operation())
        .map(|r| r.name.as_str())
        .collect();
    if rejected.is_empty() {
        return None;
    }

    let error = format!(
        "Unknown tool(s) requested: {}. Valid tools are: {}. Retry using one of the valid tool names.",
        quoted(&rejected),
        valid_names.join(", "),
    );
    tracing::debug!(rejected = ?rejected, "sending unknown-tool feedback");

    Some(ToolResult {
        call_id: format!("{FEEDBACK_CALL_ID_PREFIX}{}", Uuid::new_v4().simple()),
        name: String::new(),
        outcome: Outcome::Failure,
        source: ResultSource::Feedback,
        payload: json!({
            "ok": false,
            "error": error,
            "rejected": rejected,
            "valid_tools": valid_names,
        }),
    })
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
