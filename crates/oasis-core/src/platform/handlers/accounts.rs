//! `sign_up`, `sign_up_product`, `purchase_product`.

use serde_json::{json, Value};

use crate::error::PlatformError;
use crate::store;

use super::{arg_i64, arg_str, as_object, Ctx, Outcome};

/// `sign_up[handle, display_name, bio]` → `{user_id}`.
///
/// Inserts a `User` row keyed by the sender's `agent_id`; fails if this
/// agent already signed up (idempotent intention, mirroring
/// `sign_up_product`'s duplicate-name rejection).
pub async fn sign_up(ctx: &mut Ctx<'_>, agent_id: i64, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let handle = arg_str(map, "handle")?;
    let display_name = arg_str(map, "display_name")?;
    let bio = super::arg_opt_str(map, "bio").unwrap_or_default();

    if store::users::get_user_by_agent_id(ctx.pool, agent_id).await?.is_some() {
        return Err(PlatformError::Precondition(format!(
            "agent {agent_id} has already signed up"
        )));
    }

    let user_id = store::users::insert_user(ctx.pool, agent_id, &handle, &display_name, &bio, &ctx.clock.now())
        .await?;

    ctx.graph.add_agent(
        user_id,
        crate::agent_graph::AgentProfile {
            handle,
            display_name,
            bio,
        },
    );

    Ok(Outcome::traced(
        json!({ "user_id": user_id }),
        "sign_up",
        json!({ "user_id": user_id }),
    ))
}

/// `sign_up_product[id, name]` — fails on duplicate name. `id` is accepted
/// for wire compatibility but ignored; the Store assigns the canonical id.
pub async fn sign_up_product(ctx: &mut Ctx<'_>, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let name = arg_str(map, "name")?;

    let product_id = store::products::insert_product(ctx.pool, &name)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("product '{name}' already exists")))?;

    Ok(Outcome::traced(
        json!({ "product_id": product_id }),
        "sign_up_product",
        json!({ "product_id": product_id, "name": name }),
    ))
}

/// `purchase_product[name, qty]` — increments `sales` by `qty`; fails if the
/// product name is unknown.
pub async fn purchase_product(ctx: &mut Ctx<'_>, payload: &Value) -> Result<Outcome, PlatformError> {
    let map = as_object(payload)?;
    let name = arg_str(map, "name")?;
    let qty = arg_i64(map, "qty")?;
    if qty <= 0 {
        return Err(PlatformError::Precondition("qty must be positive".to_string()));
    }

    let product = store::products::get_product_by_name(ctx.pool, &name)
        .await?
        .ok_or_else(|| PlatformError::Precondition(format!("no product named '{name}'")))?;

    for _ in 0..qty {
        store::products::purchase_product(ctx.pool, product.id).await?;
    }

    Ok(Outcome::traced(
        json!({ "product_id": product.id, "qty": qty }),
        "purchase_product",
        json!({ "product_id": product.id, "qty": qty }),
    ))
}
