pub mod metadata;
pub mod metrics;
pub mod users;

use std::path::Path;

/// Full-document overwrite via write-temp-then-rename, so a concurrent
/// reader never observes a partially written file.
pub(crate) fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp_path, &data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load a JSON document, degrading to the default on a missing or
/// unreadable file. Corrupt state is logged and treated as "no data",
/// never surfaced as a startup failure.
pub(crate) fn read_json_or_default<T: serde::de::DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    match std::fs::read(path) {
        Ok(data) => match serde_json::from_slice(&data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Corrupt store document, starting empty");
                T::default()
            }
        },
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Unreadable store document, starting empty");
            T::default()
        }
    }
}
