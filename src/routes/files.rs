use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use crate::error::AppError;
use crate::models::file::{
    CopyFileRequest, ExpiryOption, ListFilesQuery, RenameFileRequest,
};
use crate::models::user::Identity;
use crate::services::file_service::{self, UploadFile};
use crate::state::AppState;

pub async fn upload_files(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut files: Vec<UploadFile> = Vec::new();
    let mut expiry = ExpiryOption::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("expiry") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable expiry field: {}", e)))?;
                expiry = text.parse().map_err(AppError::BadRequest)?;
            }
            _ => {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Unreadable file part: {}", e))
                })?;
                files.push(UploadFile {
                    name: file_name,
                    content_type,
                    data,
                });
            }
        }
    }

    let stored = file_service::upload(&state, files, expiry, &identity).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "stored": stored }, "error": null })),
    ))
}

pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListFilesQuery>,
) -> Json<Value> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).min(500);

    let (files, total) = file_service::list_files(&state, query.sort, page, per_page).await;

    Json(json!({
        "data": {
            "files": files,
            "page": page,
            "per_page": per_page,
            "total": total,
        },
        "error": null
    }))
}

pub async fn download_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let (record, disk_path) = file_service::download(&state, &file_name).await?;

    let content_type = mime_guess::from_path(&record.file_name)
        .first_or_octet_stream()
        .to_string();

    let file = tokio::fs::File::open(&disk_path).await?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let response = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", record.file_size.to_string())
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", record.file_name),
        )
        .header(
            "Last-Modified",
            record
                .upload_time
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Response build failed: {}", e)))?;

    Ok(response)
}

pub async fn delete_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(file_name): Path<String>,
) -> Result<StatusCode, AppError> {
    file_service::delete(&state, &file_name, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn file_checksum(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let sha256 = file_service::checksum(&state, &file_name).await?;
    Ok(Json(json!({
        "data": { "file_name": file_name, "sha256": sha256 },
        "error": null
    })))
}

pub async fn rename_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RenameFileRequest>,
) -> Result<Json<Value>, AppError> {
    let record = file_service::rename(&state, &req.old_name, &req.new_name, &identity).await?;
    Ok(Json(json!({ "data": record, "error": null })))
}

pub async fn copy_file(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CopyFileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let record = file_service::copy(&state, &req.file_name, &identity).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": { "new_file_name": record.file_name, "record": record },
            "error": null
        })),
    ))
}
