use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use tracing::info;

use bazar_db::queries::{orders, products};
use bazar_types::api::{
    Claims, CreateOrderRequest, Envelope, MessageOnly, OrderCreated, OrderDetail, UpdateOrderRequest,
};
use bazar_types::models::{Order, OrderStatus};

use crate::error::{ApiError, JsonBody, PathParam};
use crate::guard;
use crate::state::{AppState, blocking};
use crate::validate;

pub(crate) const NOT_FOUND: &str = "Pedido no encontrado";

pub(crate) fn detail(conn: &Connection, order: Order) -> Result<OrderDetail, ApiError> {
    let items = orders::list_items(conn, order.id)?;
    Ok(OrderDetail { order, items })
}

fn load_detail(conn: &Connection, id: i64) -> Result<OrderDetail, ApiError> {
    let order = orders::find_by_id(conn, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    detail(conn, order)
}

/// GET /orders: admins see every order, everybody else their own.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = (!claims.is_admin()).then_some(claims.user_id);

    let listed = blocking(&state, move |db| {
        db.with_conn(|conn| {
            orders::list(conn, scope)?
                .into_iter()
                .map(|order| detail(conn, order))
                .collect::<Result<Vec<_>, _>>()
        })
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// GET /orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let order = blocking(&state, move |db| {
        db.with_conn(|conn| {
            let order = guard::authorize(&claims, orders::find_by_id(conn, id)?, NOT_FOUND)?;
            detail(conn, order)
        })
    })
    .await?;

    Ok(Json(Envelope::new(order)))
}

/// POST /orders: the order and all of its items are written as one unit.
///
/// Lines naming a product that does not exist, is no longer available or
/// belongs to the buyer are skipped and reported back in `skipped`.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::validation("El pedido debe incluir al menos un producto"));
    }

    let buyer = claims.user_id;
    let (order, skipped) = blocking(&state, move |db| {
        db.transaction(|tx| {
            let order_id = orders::insert(tx, buyer)?;
            let mut skipped = Vec::new();

            for line in &req.items {
                let Some(product_id) = line.product_id else {
                    continue;
                };
                let quantity = match validate::quantity(line.quantity) {
                    Ok(q) => q,
                    Err(_) => {
                        skipped.push(product_id);
                        continue;
                    }
                };

                match products::find_by_id(tx, product_id)? {
                    Some(product) if product.available && product.user_id != buyer => {
                        orders::insert_item(tx, order_id, product.id, quantity, product.price)?;
                    }
                    _ => skipped.push(product_id),
                }
            }

            orders::recompute_total(tx, order_id)?;
            Ok((load_detail(tx, order_id)?, skipped))
        })
    })
    .await?;

    info!(
        "User {} created order {} with {} item(s), {} skipped",
        buyer,
        order.order.id,
        order.items.len(),
        skipped.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            results: order,
            skipped,
            message: "Pedido creado".to_string(),
        }),
    ))
}

/// PUT /orders/{id}: move the order through its lifecycle.
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let next: OrderStatus = validate::parse_enum(
        &validate::required(req.status, "El estado es obligatorio")?,
        "Estado de pedido no válido (pending, paid, close, canceled)",
    )?;

    let order = blocking(&state, move |db| {
        db.transaction(|tx| {
            let current = guard::authorize(&claims, orders::find_by_id(tx, id)?, NOT_FOUND)?;

            if !current.status.can_transition_to(next) {
                return Err(ApiError::validation(format!(
                    "No se puede pasar un pedido de {} a {}",
                    current.status, next
                )));
            }

            if next == OrderStatus::Paid && current.status != OrderStatus::Paid {
                if products::count_unsellable_in_order(tx, id)? > 0 {
                    return Err(ApiError::validation(
                        "El pedido incluye productos que ya no están disponibles",
                    ));
                }
                orders::set_status(tx, id, next, Some(chrono::Utc::now()))?;
                let retired = products::mark_sold_for_order(tx, id)?;
                info!("Order {} paid; {} product(s) marked sold", id, retired);
            } else {
                orders::set_status(tx, id, next, None)?;
                info!("Order {} moved from {} to {}", id, current.status, next);
            }

            load_detail(tx, id)
        })
    })
    .await?;

    Ok(Json(Envelope::with_message(order, "Pedido actualizado")))
}

/// DELETE /orders/{id}: only pending or canceled orders; paid and closed ones
/// are kept as sales history.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        db.transaction(|tx| {
            let order = guard::authorize(&claims, orders::find_by_id(tx, id)?, NOT_FOUND)?;
            if !matches!(order.status, OrderStatus::Pending | OrderStatus::Canceled) {
                return Err(ApiError::validation(format!(
                    "Un pedido en estado {} no se puede eliminar",
                    order.status
                )));
            }
            orders::delete(tx, id)?;
            Ok(())
        })
    })
    .await?;

    info!("Order {} deleted", id);
    Ok(Json(MessageOnly::new("Pedido eliminado")))
}
