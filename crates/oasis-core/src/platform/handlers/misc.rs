//! `do_nothing`, `interview`.
//!
//! `interview` is the one handler that manages its own trace row instead of
//! letting [`dispatch`](super::dispatch) write it centrally: the Driver
//! calls it once to record the prompt (row created with `response = NULL`)
//! and again, after the follow-up LLM call completes, to fill in the
//! response on that same row.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{as_object, Ctx, Outcome};

/// `do_nothing[]` — emits a trace only.
pub fn do_nothing() -> Result<Outcome, PlatformError> {
    Ok(Outcome::traced(Value::Null, "do_nothing", json!({})))
}

/// `interview[prompt_or_record]` — never advertised as an LLM tool;
/// only ever invoked via `act-by-manual`.
///
/// Accepts three payload shapes:
/// - `{prompt}` — creates a new trace row with `response: null`, returns
///   `{trace_id}`. The Driver fills the response in with a second call once
///   the one-shot LLM completion lands.
/// - `{prompt, response}` — creates a new trace row with both fields
///   already set, for callers that already have the response in hand.
/// - `{trace_id, response}` — fills in the response on a previously created
///   row; fails if no such row exists or it was not an `interview` row.
pub async fn interview(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;

    if let Some(trace_id) = map.get("trace_id").and_then(Value::as_i64) {
        let response = map
            .get("response")
            .and_then(Value::as_str)
            .ok_or_else(|| PlatformError::Precondition("missing or invalid argument 'response'".to_string()))?;
        let trace = store::trace::get_trace(ctx.pool, trace_id)
            .await?
            .ok_or_else(|| PlatformError::Precondition(format!("no such trace row {trace_id}")))?;
        if trace.action != "interview" {
            return Err(PlatformError::Precondition(format!(
                "trace row {trace_id} is not an interview"
            )));
        }
        store::trace::fill_response(ctx.pool, trace_id, response).await?;
        return Ok(Outcome::untraced(json!({ "trace_id": trace_id })));
    }

    let prompt = map
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or_else(|| PlatformError::Precondition("missing or invalid argument 'prompt'".to_string()))?;
    let response = map.get("response").and_then(Value::as_str);

    let trace_id = store::trace::insert_trace(ctx.pool, agent_id, "interview", Some(prompt), &ctx.clock.now())
        .await?;
    if let Some(response) = response {
        store::trace::fill_response(ctx.pool, trace_id, response).await?;
    }

    Ok(Outcome::untraced(json!({ "trace_id": trace_id })))
}
