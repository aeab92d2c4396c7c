//! Direct access to order lines. Every change reprices the parent order in the
//! same transaction, and only pending orders can be edited.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;

use bazar_db::queries::{orders, products};
use bazar_types::api::{
    Claims, CreateOrderItemRequest, Envelope, MessageOnly, UpdateOrderItemRequest,
};
use bazar_types::models::{Order, OrderItem};

use crate::error::{ApiError, JsonBody, PathParam};
use crate::guard;
use crate::orders::NOT_FOUND as ORDER_NOT_FOUND;
use crate::state::{AppState, blocking};
use crate::validate;

const NOT_FOUND: &str = "Línea de pedido no encontrada";

/// Item plus its parent order, checked for existence and ownership.
fn authorize_item(conn: &Connection, actor: &Claims, id: i64) -> Result<(OrderItem, Order), ApiError> {
    let item = orders::find_item(conn, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    let order = guard::authorize(actor, orders::find_by_id(conn, item.order_id)?, ORDER_NOT_FOUND)?;
    Ok((item, order))
}

fn ensure_editable(order: &Order) -> Result<(), ApiError> {
    if !order.status.is_editable() {
        return Err(ApiError::validation(format!(
            "El pedido está en estado {} y ya no se puede modificar",
            order.status
        )));
    }
    Ok(())
}

/// GET /order-items
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = (!claims.is_admin()).then_some(claims.user_id);
    let items = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| orders::list_items_for_user(conn, scope))?)
    })
    .await?;

    Ok(Json(Envelope::new(items)))
}

/// GET /order-items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = blocking(&state, move |db| {
        db.with_conn(|conn| authorize_item(conn, &claims, id).map(|(item, _)| item))
    })
    .await?;

    Ok(Json(Envelope::new(item)))
}

/// POST /order-items: add a line to a pending order.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateOrderItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = req
        .order_id
        .ok_or_else(|| ApiError::validation("El pedido es obligatorio"))?;
    let product_id = req
        .product_id
        .ok_or_else(|| ApiError::validation("El producto es obligatorio"))?;
    let quantity = validate::quantity(req.quantity)?;

    let item = blocking(&state, move |db| {
        db.transaction(|tx| {
            let order = guard::authorize(&claims, orders::find_by_id(tx, order_id)?, ORDER_NOT_FOUND)?;
            ensure_editable(&order)?;

            let product = products::find_by_id(tx, product_id)?
                .filter(|p| p.available)
                .ok_or_else(|| ApiError::not_found("Producto no disponible"))?;
            if product.user_id == order.user_id {
                return Err(ApiError::validation("No puedes comprar tu propio producto"));
            }

            let id = orders::insert_item(tx, order_id, product.id, quantity, product.price)?;
            orders::recompute_total(tx, order_id)?;
            orders::find_item(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(Envelope::new(item))))
}

/// PUT /order-items/{id}: change the quantity.
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateOrderItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = req
        .quantity
        .ok_or_else(|| ApiError::validation("La cantidad es obligatoria"))?;
    let quantity = validate::quantity(Some(quantity))?;

    let item = blocking(&state, move |db| {
        db.transaction(|tx| {
            let (_, order) = authorize_item(tx, &claims, id)?;
            ensure_editable(&order)?;

            orders::update_item_quantity(tx, id, quantity)?;
            orders::recompute_total(tx, order.id)?;
            orders::find_item(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok(Json(Envelope::new(item)))
}

/// DELETE /order-items/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            let (_, order) = authorize_item(tx, &claims, id)?;
            ensure_editable(&order)?;

            orders::delete_item(tx, id)?;
            orders::recompute_total(tx, order.id)?;
            Ok(())
        })
    })
    .await?;

    Ok(Json(MessageOnly::new("Línea de pedido eliminada")))
}
