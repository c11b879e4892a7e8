use crate::error::AppError;
use crate::models::file::{FileRecord, FileView, ExpiryOption};
use crate::models::job::JobKind;
use crate::models::user::Identity;
use crate::services::{mime, quota};
use crate::state::AppState;
use bytes::Bytes;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// One candidate file from an upload batch.
#[derive(Debug)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

fn resolve_path(state: &AppState, file_name: &str) -> PathBuf {
    state.config.uploads_dir().join(file_name)
}

/// File names double as metadata keys and on-disk names, so anything that
/// could escape the uploads directory is rejected outright.
fn validate_file_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::BadRequest("Empty file name".into()));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') || name == ".." {
        return Err(AppError::BadRequest(format!(
            "Invalid file name: {}",
            name
        )));
    }
    Ok(())
}

/// Mutations require a writer role, and then ownership unless the caller
/// is an admin.
fn authorize_mutation(record: &FileRecord, identity: &Identity) -> Result<(), AppError> {
    use crate::models::user::Role;
    if !identity.role.can_write() {
        return Err(AppError::Forbidden(
            "Viewers cannot modify files".into(),
        ));
    }
    if identity.role == Role::Admin {
        return Ok(());
    }
    match &record.owner {
        Some(owner) if owner.eq_ignore_ascii_case(&identity.username) => Ok(()),
        _ => Err(AppError::Forbidden(format!(
            "Only the owner or an admin may modify '{}'",
            record.file_name
        ))),
    }
}

/// Admit and persist a batch of files. Checks run per file, in order: size
/// limit, declared-type validation, then a fresh quota computation (usage
/// moves as earlier files in the batch land). The batch is not atomic;
/// files written before a failing one stay written, and the first failure
/// is returned as-is.
pub async fn upload(
    state: &AppState,
    files: Vec<UploadFile>,
    expiry: ExpiryOption,
    identity: &Identity,
) -> Result<usize, AppError> {
    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }
    if !identity.role.can_write() {
        return Err(AppError::Forbidden("Viewers cannot upload files".into()));
    }

    let uploads_dir = state.config.uploads_dir();
    tokio::fs::create_dir_all(&uploads_dir).await?;

    let max_file_size = state.config.max_file_size_bytes();
    let ceiling = state.config.max_disk_space_bytes();
    let mut stored = 0usize;

    for file in files {
        validate_file_name(&file.name)?;

        let file_size = file.data.len() as u64;
        if file_size > max_file_size {
            return Err(AppError::FileTooLarge(format!(
                "File '{}' exceeds the maximum file size ({} MB)",
                file.name, state.config.max_file_size_mb
            )));
        }

        mime::validate(&file.name, &file.content_type)?;

        let usage = quota::disk_usage(&uploads_dir, ceiling);
        if usage.used + file_size > ceiling {
            return Err(AppError::QuotaExceeded(format!(
                "Upload of '{}' would exceed the allocated space ({})",
                file.name,
                quota::format_bytes(ceiling)
            )));
        }

        let disk_path = resolve_path(state, &file.name);
        let mut out = tokio::fs::File::create(&disk_path).await?;
        out.write_all(&file.data).await?;
        out.flush().await?;

        let now = Utc::now();
        let expiry_time = expiry.deadline_from(now);
        let record = FileRecord {
            file_name: file.name.clone(),
            file_path: disk_path.to_string_lossy().into_owned(),
            upload_time: now,
            expiry_time,
            file_size,
            owner: Some(identity.username.clone()),
        };

        state.files.insert(record).await;
        if let Some(run_at) = expiry_time {
            state
                .jobs
                .schedule(JobKind::ExpireFile { file_name: file.name.clone() }, run_at)
                .await;
        }
        state
            .users
            .add_file_to_user(&identity.username, &disk_path.to_string_lossy())
            .await;
        state.metrics.record_upload().await;

        tracing::info!(
            file = %file.name,
            size = file_size,
            owner = %identity.username,
            expires = ?expiry_time,
            "File uploaded"
        );
        stored += 1;
    }

    Ok(stored)
}

pub async fn list_files(
    state: &AppState,
    sort: Option<String>,
    page: u64,
    per_page: u64,
) -> (Vec<FileView>, usize) {
    let mut records = state.files.list().await;
    let total = records.len();

    let (key, descending) = match sort.as_deref() {
        Some(s) => match s.strip_prefix('-') {
            Some(rest) => (rest.to_string(), true),
            None => (s.to_string(), false),
        },
        None => ("name".to_string(), false),
    };
    match key.as_str() {
        "size" => records.sort_by_key(|r| r.file_size),
        "date" | "uploaded" => records.sort_by_key(|r| r.upload_time),
        _ => records.sort_by(|a, b| a.file_name.cmp(&b.file_name)),
    }
    if descending {
        records.reverse();
    }

    let start = ((page - 1) * per_page) as usize;
    let views = records
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(|r| FileView {
            download_uri: format!("/api/v1/files/{}", urlencoding::encode(&r.file_name)),
            file_name: r.file_name,
            upload_time: r.upload_time,
            expiry_time: r.expiry_time,
            file_size: r.file_size,
            owner: r.owner,
        })
        .collect();

    (views, total)
}

/// Resolve a record and its on-disk path for streaming, bumping the
/// download counter.
pub async fn download(
    state: &AppState,
    file_name: &str,
) -> Result<(FileRecord, PathBuf), AppError> {
    let record = state
        .files
        .get(file_name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", file_name)))?;

    let disk_path = resolve_path(state, file_name);
    if !disk_path.exists() {
        return Err(AppError::NotFound(format!(
            "File not found on disk: {}",
            file_name
        )));
    }

    state.metrics.record_download().await;
    Ok((record, disk_path))
}

pub async fn checksum(state: &AppState, file_name: &str) -> Result<String, AppError> {
    if state.files.get(file_name).await.is_none() {
        return Err(AppError::NotFound(format!("File not found: {}", file_name)));
    }
    let disk_path = resolve_path(state, file_name);
    let data = tokio::fs::read(&disk_path)
        .await
        .map_err(|_| AppError::NotFound(format!("File not found on disk: {}", file_name)))?;

    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

pub async fn delete(
    state: &AppState,
    file_name: &str,
    identity: &Identity,
) -> Result<(), AppError> {
    let record = state
        .files
        .get(file_name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", file_name)))?;
    authorize_mutation(&record, identity)?;

    let disk_path = resolve_path(state, file_name);
    if disk_path.exists() {
        tokio::fs::remove_file(&disk_path).await?;
    }

    state.files.remove(file_name).await;
    state.users.remove_file_from_user(&record.file_path).await;
    state.jobs.deregister_file(file_name).await;
    state.metrics.record_delete().await;

    tracing::info!(file = %file_name, by = %identity.username, "File deleted");
    Ok(())
}

pub async fn rename(
    state: &AppState,
    old_name: &str,
    new_name: &str,
    identity: &Identity,
) -> Result<FileRecord, AppError> {
    validate_file_name(new_name)?;

    let old_ext = std::path::Path::new(old_name)
        .extension()
        .map(|e| e.to_ascii_lowercase());
    let new_ext = std::path::Path::new(new_name)
        .extension()
        .map(|e| e.to_ascii_lowercase());
    if old_ext != new_ext {
        return Err(AppError::BadRequest(
            "Changing the file extension is not allowed".into(),
        ));
    }

    let record = state
        .files
        .get(old_name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", old_name)))?;
    authorize_mutation(&record, identity)?;

    if state.files.contains(new_name).await {
        return Err(AppError::Conflict(format!(
            "A file named '{}' already exists",
            new_name
        )));
    }

    let old_path = resolve_path(state, old_name);
    let new_path = resolve_path(state, new_name);
    tokio::fs::rename(&old_path, &new_path).await?;

    let updated = state
        .files
        .rename(old_name, new_name, &new_path.to_string_lossy())
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", old_name)))?;
    state
        .users
        .update_file_path(&record.file_path, &new_path.to_string_lossy())
        .await;

    // The deadline travels with the record; reschedule under the new name.
    state.jobs.deregister_file(old_name).await;
    if let Some(run_at) = updated.expiry_time {
        state
            .jobs
            .schedule(JobKind::ExpireFile { file_name: new_name.to_string() }, run_at)
            .await;
    }

    tracing::info!(from = %old_name, to = %new_name, by = %identity.username, "File renamed");
    Ok(updated)
}

/// First free name in the `stem (copy).ext`, `stem (copy 2).ext`, ... series.
async fn next_copy_name(state: &AppState, file_name: &str) -> String {
    let path = std::path::Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut attempt = 2u32;
    let mut candidate = format!("{} (copy){}", stem, ext);
    while state.files.contains(&candidate).await {
        candidate = format!("{} (copy {}){}", stem, attempt, ext);
        attempt += 1;
    }
    candidate
}

pub async fn copy(
    state: &AppState,
    file_name: &str,
    identity: &Identity,
) -> Result<FileRecord, AppError> {
    if !identity.role.can_write() {
        return Err(AppError::Forbidden("Viewers cannot copy files".into()));
    }

    let source = state
        .files
        .get(file_name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("File not found: {}", file_name)))?;

    let uploads_dir = state.config.uploads_dir();
    let ceiling = state.config.max_disk_space_bytes();
    let usage = quota::disk_usage(&uploads_dir, ceiling);
    if usage.used + source.file_size > ceiling {
        return Err(AppError::QuotaExceeded(format!(
            "Copy of '{}' would exceed the allocated space ({})",
            file_name,
            quota::format_bytes(ceiling)
        )));
    }

    let new_name = next_copy_name(state, file_name).await;
    let src_path = resolve_path(state, file_name);
    let dst_path = resolve_path(state, &new_name);
    tokio::fs::copy(&src_path, &dst_path).await?;

    let now = Utc::now();
    let record = FileRecord {
        file_name: new_name.clone(),
        file_path: dst_path.to_string_lossy().into_owned(),
        upload_time: now,
        expiry_time: source.expiry_time,
        file_size: source.file_size,
        owner: Some(identity.username.clone()),
    };

    state.files.insert(record.clone()).await;
    if let Some(run_at) = record.expiry_time {
        state
            .jobs
            .schedule(JobKind::ExpireFile { file_name: new_name.clone() }, run_at)
            .await;
    }
    state
        .users
        .add_file_to_user(&identity.username, &record.file_path)
        .await;
    state.metrics.record_upload().await;

    tracing::info!(from = %file_name, to = %new_name, by = %identity.username, "File copied");
    Ok(record)
}
