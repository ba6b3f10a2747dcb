//! `create_group`, `join_group`, `leave_group`, `send_to_group`,
//! `listen_from_group`.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{arg_i64, arg_str, as_object, current_user, Ctx, Outcome};

/// `create_group[name]` → `{group_id}`.
pub async fn create_group(ctx: &mut Ctx<'_>, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let name = arg_str(map, "name")?;

    let group_id = store::groups::insert_group(ctx.pool, &name, &ctx.clock.now()).await?;

    Ok(Outcome::traced(
        json!({ "group_id": group_id }),
        "create_group",
        json!({ "group_id": group_id, "name": name }),
    ))
}

/// `join_group[group_id]` — fails on unknown group or an existing
/// membership.
pub async fn join_group(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let group_id = arg_i64(map, "group_id")?;

    store::groups::get_group(ctx.pool, group_id)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no such group {group_id}")))?;

    if !store::groups::join_group(ctx.pool, group_id, user.id, &ctx.clock.now()).await? {
        return Err(PlatformError::Precondition("already a member".to_string()));
    }

    Ok(Outcome::traced(
        json!({ "group_id": group_id }),
        "join_group",
        json!({ "group_id": group_id }),
    ))
}

/// `leave_group[group_id]` — fails if not currently a member.
pub async fn leave_group(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let group_id = arg_i64(map, "group_id")?;

    if !store::groups::leave_group(ctx.pool, group_id, user.id).await? {
        return Err(PlatformError::Precondition("not a member".to_string()));
    }

    Ok(Outcome::traced(
        json!({ "group_id": group_id }),
        "leave_group",
        json!({ "group_id": group_id }),
    ))
}

/// `send_to_group[group_id, text]` — fails unless the sender is a current
/// member at send time.
pub async fn send_to_group(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let map = as_object(payload)?;
    let group_id = arg_i64(map, "group_id")?;
    let text = arg_str(map, "text")?;

    if !store::groups::is_member(ctx.pool, group_id, user.id).await? {
        return Err(PlatformError::Precondition(
            "not a member of this group".to_string(),
        ));
    }

    let message_id =
        store::groups::send_message(ctx.pool, group_id, user.id, &text, &ctx.clock.now()).await?;

    Ok(Outcome::traced(
        json!({ "message_id": message_id }),
        "send_to_group",
        json!({ "group_id": group_id, "message_id": message_id, "text": text }),
    ))
}

/// `listen_from_group[]` — every message in every group the sender is
/// currently a member of. Read-only: no trace row.
pub async fn listen_from_group(ctx: &mut Ctx<'_>, agent_id: i64) -> Result<Outcome, PlatformError> {
    let user = current_user(ctx, agent_id).await?;
    let messages = store::groups::messages_for_member(ctx.pool, user.id).await?;
    Ok(Outcome::untraced(json!(messages)))
}
