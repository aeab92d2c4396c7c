use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use bazar_db::models::{NewProduct, ProductChanges, ProductFilter};
use bazar_db::queries::{products, users};
use bazar_types::api::{
    Claims, CreateProductRequest, Envelope, ProductDeleted, ProductQuery, UpdateProductRequest,
};
use bazar_types::models::{Category, Role, Tag};

use crate::error::{ApiError, JsonBody, PathParam, QueryParams};
use crate::guard;
use crate::state::{AppState, blocking};
use crate::validate;

const NOT_FOUND: &str = "Producto no encontrado";
const INVALID_CATEGORY: &str = "Categoría no válida";
const INVALID_TAG: &str = "Estado del producto no válido (new, used, acceptable)";
const MAX_TITLE: usize = 120;
const MAX_LOCATION: usize = 120;
const MAX_IMAGE_URL: usize = 500;

fn parse_filter(query: ProductQuery) -> Result<ProductFilter, ApiError> {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    Ok(ProductFilter {
        q: non_blank(query.q),
        category: non_blank(query.category)
            .map(|c| validate::parse_enum::<Category>(&c, INVALID_CATEGORY))
            .transpose()?,
        tag: non_blank(query.tags)
            .map(|t| validate::parse_enum::<Tag>(&t, INVALID_TAG))
            .transpose()?,
    })
}

fn parse_new_product(owner: i64, req: CreateProductRequest) -> Result<NewProduct, ApiError> {
    let title = validate::required(req.title, "El título es obligatorio")?;
    let description = validate::required(req.description, "La descripción es obligatoria")?;
    let price = validate::price(
        req.price
            .ok_or_else(|| ApiError::validation("El precio es obligatorio"))?,
    )?;
    let location = validate::required(req.location, "La ubicación es obligatoria")?;
    let tags = validate::parse_enum(
        &validate::required(req.tags, "El estado del producto es obligatorio")?,
        INVALID_TAG,
    )?;
    let category = validate::parse_enum(
        &validate::required(req.category, "La categoría es obligatoria")?,
        INVALID_CATEGORY,
    )?;
    let image_url = req
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    validate::max_len(&title, MAX_TITLE, "título")?;
    validate::max_len(&location, MAX_LOCATION, "ubicación")?;
    if let Some(url) = &image_url {
        validate::max_len(url, MAX_IMAGE_URL, "imagen")?;
    }

    Ok(NewProduct {
        user_id: owner,
        title,
        description,
        price,
        location,
        image_url,
        tags,
        category,
        available: req.available.unwrap_or(true),
    })
}

fn parse_changes(req: UpdateProductRequest) -> Result<ProductChanges, ApiError> {
    let changes = ProductChanges {
        title: validate::optional(req.title, "El título no puede estar vacío")?,
        description: validate::optional(req.description, "La descripción no puede estar vacía")?,
        price: req.price.map(validate::price).transpose()?,
        location: validate::optional(req.location, "La ubicación no puede estar vacía")?,
        image_url: req
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        tags: req
            .tags
            .map(|t| validate::parse_enum(&t, INVALID_TAG))
            .transpose()?,
        category: req
            .category
            .map(|c| validate::parse_enum(&c, INVALID_CATEGORY))
            .transpose()?,
        available: req.available,
    };

    if let Some(title) = &changes.title {
        validate::max_len(title, MAX_TITLE, "título")?;
    }
    if let Some(location) = &changes.location {
        validate::max_len(location, MAX_LOCATION, "ubicación")?;
    }
    if let Some(url) = &changes.image_url {
        validate::max_len(url, MAX_IMAGE_URL, "imagen")?;
    }
    Ok(changes)
}

/// GET /products?q=&category=&tags=: public catalog search over available products.
pub async fn search(
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = parse_filter(query)?;

    let found = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| products::search(conn, &filter))?)
    })
    .await?;

    if found.is_empty() && state.settings.empty_search_not_found {
        return Err(ApiError::not_found("No se encontraron productos"));
    }

    Ok(Json(Envelope::new(found)))
}

/// GET /products/{id}: public; sold or withdrawn products are not shown.
pub async fn get_product(
    State(state): State<AppState>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let product = blocking(&state, move |db| {
        db.with_conn(|conn| products::find_by_id(conn, id))?
            .filter(|p| p.available)
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    })
    .await?;

    Ok(Json(Envelope::new(product)))
}

/// GET /products/user/{id}: public listing of one seller's available products.
pub async fn list_by_user(
    State(state): State<AppState>,
    WithRejection(Path(user_id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, move |db| {
        db.with_conn(|conn| {
            if users::find_active(conn, user_id)?.is_none() {
                return Err(ApiError::not_found("Usuario no encontrado"));
            }
            Ok(products::list_by_user(conn, user_id, true)?)
        })
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// GET /products/user: every product of the caller, including sold ones.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let listed = blocking(&state, move |db| {
        Ok(db.with_conn(|conn| products::list_by_user(conn, claims.user_id, false))?)
    })
    .await?;

    Ok(Json(Envelope::new(listed)))
}

/// POST /products: sellers only.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): JsonBody<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    guard::require_role(&claims, Role::Seller, "Solo los vendedores pueden publicar productos")?;
    let new_product = parse_new_product(claims.user_id, req)?;

    let product = blocking(&state, move |db| {
        db.transaction(|tx| {
            let id = products::insert(tx, &new_product)?;
            products::find_by_id(tx, id)?
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("product {} missing after insert", id)))
        })
    })
    .await?;

    info!("User {} listed product {} ({})", claims.user_id, product.id, product.title);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(product, "Producto creado correctamente")),
    ))
}

/// PUT /products/{id}: partial update by owner or admin.
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
    WithRejection(Json(req), _): JsonBody<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let changes = parse_changes(req)?;

    let product = blocking(&state, move |db| {
        db.transaction(|tx| {
            let current = guard::authorize(&claims, products::find_by_id(tx, id)?, NOT_FOUND)?;
            if current.was_sold && changes.available == Some(true) {
                return Err(ApiError::validation(
                    "Un producto vendido no puede volver a estar disponible",
                ));
            }

            products::update(tx, id, &changes)?;
            products::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))
        })
    })
    .await?;

    Ok(Json(Envelope::with_message(product, "Producto actualizado")))
}

/// DELETE /products/{id}: products that appear in an order are retired
/// instead of removed.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): PathParam<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = blocking(&state, move |db| {
        db.transaction(|tx| {
            let product = guard::authorize(&claims, products::find_by_id(tx, id)?, NOT_FOUND)?;

            if product.was_sold || products::count_order_items(tx, id)? > 0 {
                products::mark_sold(tx, id)?;
                let retired = products::find_by_id(tx, id)?.ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
                info!("Product {} was sold or ordered; deactivated instead of deleting", id);
                return Ok(ProductDeleted {
                    results: retired,
                    deleted: false,
                    message: "El producto ya fue vendido: se ha desactivado en lugar de eliminarse"
                        .to_string(),
                });
            }

            products::delete(tx, id)?;
            info!("Product {} deleted by user {}", id, claims.user_id);
            Ok(ProductDeleted {
                results: product,
                deleted: true,
                message: "Producto eliminado".to_string(),
            })
        })
    })
    .await?;

    Ok(Json(outcome))
}
