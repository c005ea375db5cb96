use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use serde::Serialize;

use crate::error::IngestionError;
use crate::ingestion::{IngestionContext, TempUpload, is_csv_media_type};
use crate::query::SearchParams;
use crate::types::SearchPage;

use super::AppState;
use super::error::ApiError;

/// Multipart field carrying the CSV file.
pub const FILE_FIELD: &str = "file";

/// Used when the client sends no file name.
const UNNAMED_FILE: &str = "upload.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub row_count: u64,
    pub headers: Vec<String>,
}

/// `GET /data/search`
#[tracing::instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchPage>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    tracing::debug!(?params, "search");

    let engine = state.queries.clone();
    let page = tokio::task::spawn_blocking(move || engine.search(&params)).await??;
    tracing::debug!(total = page.total_count, returned = page.data_entries.len(), "search done");
    Ok(Json(page))
}

/// `POST /data/upload`
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let unnamed = IngestionContext {
        file_name: String::new(),
        media_type: None,
        bytes: 0,
    };
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            tracing::debug!(%rejection, "upload is not a multipart request");
            return Err(state.pipeline.reject(&unnamed, IngestionError::MissingFile).into());
        }
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| state.pipeline.reject(&unnamed, e.into()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut ctx = IngestionContext {
            file_name: field.file_name().unwrap_or(UNNAMED_FILE).to_owned(),
            media_type: field.content_type().map(str::to_owned),
            bytes: 0,
        };
        if !is_csv_media_type(ctx.media_type.as_deref()) {
            let err = IngestionError::NotCsv {
                media_type: ctx.media_type.clone(),
            };
            return Err(state.pipeline.reject(&ctx, err).into());
        }

        // `spooled` removes its file on every return path below.
        let mut spooled =
            TempUpload::new_in(state.upload_dir.as_path()).map_err(|e| state.pipeline.reject(&ctx, e.into()))?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| state.pipeline.reject(&ctx, e.into()))?
        {
            spooled
                .append(&chunk)
                .await
                .map_err(|e| state.pipeline.reject(&ctx, e.into()))?;
        }
        spooled
            .seal()
            .await
            .map_err(|e| state.pipeline.reject(&ctx, e.into()))?;
        ctx.bytes = spooled.bytes_written();

        let file = state.pipeline.ingest_upload(spooled, ctx).await?;
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "File uploaded successfully".to_string(),
                row_count: file.row_count,
                headers: file.headers,
            }),
        ));
    }

    Err(state.pipeline.reject(&unnamed, IngestionError::MissingFile).into())
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
