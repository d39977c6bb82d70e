//! Plain REST facade over the operation catalog
//!
//! Every route is a `GET` that forwards exactly one backend call. Path and query
//! values arrive as strings and are coerced by the catalog, so malformed input is
//! rejected with a 400 before the backend is contacted. Extractor rejections are
//! converted into `AppError` so every failure carries the same JSON body.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    domain::operations::{Operation, OperationRequest},
    errors::AppError,
    mxp_client::UpstreamPayload,
    AppState,
};

type RawParams = HashMap<String, String>;

pub async fn account(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    forward(&state, Operation::Account, path).await
}

pub async fn crew(
    State(state): State<AppState>,
    query: Result<Query<RawParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    forward(&state, Operation::Crew, query).await
}

pub async fn folio(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
    query: Result<Query<RawParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let Path(path) = path?;
    forward(&state, Operation::Folio, query.into_iter().chain(path)).await
}

pub async fn document(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    forward(&state, Operation::Document, path).await
}

pub async fn icafe(
    State(state): State<AppState>,
    query: Result<Query<RawParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    forward(&state, Operation::ICafe, query).await
}

pub async fn person_image(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    forward(&state, Operation::PersonImage, path).await
}

pub async fn quick_code(State(state): State<AppState>) -> Result<Response, AppError> {
    forward(&state, Operation::QuickCode, RawParams::new()).await
}

pub async fn sailor_manifest(
    State(state): State<AppState>,
    query: Result<Query<RawParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    forward(&state, Operation::SailorManifest, query).await
}

pub async fn receipt_image(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    forward(&state, Operation::ReceiptImage, path).await
}

pub async fn person_invoice(
    State(state): State<AppState>,
    path: Result<Path<RawParams>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(path) = path?;
    forward(&state, Operation::PersonInvoice, path).await
}

/// Path values are chained last so they win over a same-named query value.
async fn forward(
    state: &AppState,
    operation: Operation,
    raw: impl IntoIterator<Item = (String, String)>,
) -> Result<Response, AppError> {
    let arguments: Map<String, Value> = raw
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let request = OperationRequest::from_arguments(operation, &arguments)?;

    debug!(operation = operation.name(), "forwarding rest request");
    let payload = state.upstream.fetch(&request).await?;
    Ok(payload_response(payload))
}

pub fn payload_response(payload: UpstreamPayload) -> Response {
    match payload {
        UpstreamPayload::Json(value) => Json(value).into_response(),
        UpstreamPayload::Image {
            content_type,
            bytes,
        } => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
    }
}
