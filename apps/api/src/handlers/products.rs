//! Product CRUD endpoints.
//!
//! Every write goes through the repository, which appends the matching
//! product log row in the same transaction.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use stockroom_core::validation::{validate_new_product, validate_patch};
use stockroom_core::{ChangeSource, FieldErrors, NewProduct, Product, ProductPatch, ValidationError};

use crate::error::ApiResult;
use crate::state::AppState;

/// `?source=manual|scanned` on write endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SourceParams {
    pub source: Option<String>,
}

impl SourceParams {
    fn change_source(&self) -> ApiResult<ChangeSource> {
        match self.source.as_deref().map(str::trim) {
            None | Some("") => Ok(ChangeSource::default()),
            Some(raw) => Ok(raw.parse()?),
        }
    }
}

/// Create payload as received. Required fields are optional here so a
/// missing one is reported per field instead of as a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub quantity: Option<i64>,
    pub alert_threshold: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
}

impl ProductForm {
    /// Checks presence of required fields, then every field's content.
    pub fn into_new_product(self) -> Result<NewProduct, FieldErrors> {
        let mut missing = FieldErrors::new();
        for (field, present) in [
            ("name", self.name.is_some()),
            ("sku", self.sku.is_some()),
            ("quantity", self.quantity.is_some()),
        ] {
            if !present {
                missing.check(Err(ValidationError::Required {
                    field: field.to_string(),
                }));
            }
        }
        missing.into_result()?;

        let product = NewProduct {
            name: self.name.unwrap_or_default(),
            sku: self.sku.unwrap_or_default(),
            barcode: self.barcode,
            quantity: self.quantity.unwrap_or_default(),
            alert_threshold: self.alert_threshold.unwrap_or_default(),
            expiry_date: self.expiry_date,
        }
        .normalized();

        validate_new_product(&product)?;
        Ok(product)
    }
}

/// `GET /api/products/`
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

/// `POST /api/products/?source=`
pub async fn create_product(
    State(state): State<AppState>,
    params: Result<Query<SourceParams>, QueryRejection>,
    payload: Result<Json<ProductForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Query(params) = params?;
    let Json(form) = payload?;
    let source = params.change_source()?;
    let new = form.into_new_product()?;

    let product = state.db.products().create(&new, source).await?;
    info!(id = product.id, sku = %product.sku, %source, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products/{id}/`
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    Ok(Json(state.db.products().get(id).await?))
}

/// `PUT /api/products/{id}/?source=` with any subset of fields.
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<SourceParams>, QueryRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    let Query(params) = params?;
    let Json(patch) = payload?;
    let source = params.change_source()?;

    let patch = patch.normalized();
    validate_patch(&patch)?;

    let product = state.db.products().update(id, &patch, source).await?;
    info!(id, %source, "Product updated");

    Ok(Json(product))
}

/// `DELETE /api/products/{id}/?source=`
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<SourceParams>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    let Query(params) = params?;
    let source = params.change_source()?;

    let product = state.db.products().delete(id, source).await?;
    info!(id, sku = %product.sku, %source, "Product deleted");

    Ok(StatusCode::NO_CONTENT)
}
