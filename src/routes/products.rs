use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::Field},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        self, DeleteProductRequest, NewProduct, ProductListQuery, ProductSummary,
        UpdateProductRequest,
    },
    queries::product_queries,
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductSummary>>> {
    let products = product_queries::list_products(&state.db, params).await?;

    Ok(Json(products))
}

/// Multipart create: product fields plus one `image` file part. The image
/// lands on disk before the row is inserted; a failed insert removes the
/// file again so no orphan is left behind.
pub async fn upload_product(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut name: Option<String> = None;
    let mut price: Option<String> = None;
    let mut type_id: Option<String> = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        match field.name() {
            Some("name") => name = Some(read_text(field).await?),
            Some("price") => price = Some(read_text(field).await?),
            Some("type_id") | Some("typeId") => type_id = Some(read_text(field).await?),
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read image field: {}", e))
                })?;
                image = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| AppError::BadRequest("name is required".to_string()))?;
    models::validate_name(&name)?;

    let price: Decimal = price
        .ok_or_else(|| AppError::BadRequest("price is required".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("price must be a decimal number".to_string()))?;
    models::validate_price(price)?;

    let type_id: i32 = type_id
        .ok_or_else(|| AppError::BadRequest("type_id is required".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("type_id must be an integer".to_string()))?;

    let (file_name, data) =
        image.ok_or_else(|| AppError::BadRequest("image file is required".to_string()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("image file is empty".to_string()));
    }

    let stored = state.images.save(&file_name, &data).await?;

    let product = NewProduct {
        name,
        price,
        type_id,
        image_path: stored.clone(),
    };

    if let Err(err) = product_queries::create_product(&state.db, &product).await {
        // the row never landed; drop the file written above
        if let Err(cleanup) = state.images.remove(&stored).await {
            tracing::warn!("Failed to remove orphaned image {}: {}", stored, cleanup);
        }
        return Err(err);
    }

    tracing::info!("Product {} created with image {}", product.name, stored);

    Ok(Json(json!({ "message": "Product uploaded successfully" })))
}

pub async fn update_product(
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Value>> {
    models::validate_name(&payload.match_name)?;

    if let Some(ref new_name) = payload.new_name {
        models::validate_name(new_name)?;
    }

    if let Some(new_price) = payload.new_price {
        models::validate_price(new_price)?;
    }

    let rows = product_queries::update_product(&state.db, payload).await?;

    if rows == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(Json(json!({ "message": "Product updated successfully" })))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Json(payload): Json<DeleteProductRequest>,
) -> Result<Json<Value>> {
    models::validate_name(&payload.name)?;

    let rows = product_queries::delete_product(&state.db, &payload.name).await?;

    if rows == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

async fn read_text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart field: {}", e)))
}
