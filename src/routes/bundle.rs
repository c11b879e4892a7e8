use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::AppError;
use crate::models::file::BundleRequest;
use crate::state::AppState;

/// Download several files as one tar.gz. Names that resolve to nothing on
/// disk are skipped; the bundle holds whatever was still present.
pub async fn download_bundle(
    State(state): State<AppState>,
    Json(req): Json<BundleRequest>,
) -> Result<axum::response::Response, AppError> {
    if req.file_names.is_empty() {
        return Err(AppError::BadRequest("No file names provided".into()));
    }

    let mut paths = Vec::new();
    for name in &req.file_names {
        if state.files.get(name).await.is_some() {
            paths.push((name.clone(), state.config.uploads_dir().join(name)));
        }
    }
    if paths.is_empty() {
        return Err(AppError::NotFound(
            "None of the requested files exist".into(),
        ));
    }

    // Built in memory; bundles are bounded by the disk quota.
    let data = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
        let buf = Vec::new();
        let encoder = GzEncoder::new(buf, Compression::default());
        let mut tar_builder = tar::Builder::new(encoder);

        for (name, path) in &paths {
            if path.is_file() {
                tar_builder.append_path_with_name(path, name)?;
            }
        }

        let encoder = tar_builder.into_inner()?;
        let buf = encoder.finish()?;
        Ok(buf)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Bundle task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("Bundle creation failed: {}", e)))?;

    let response = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/gzip")
        .header("Content-Length", data.len().to_string())
        .header(
            "Content-Disposition",
            "attachment; filename=\"files.tar.gz\"",
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Response build failed: {}", e)))?;

    Ok(response)
}
