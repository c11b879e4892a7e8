use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::services::quota;
use crate::state::AppState;

pub async fn available_space(State(state): State<AppState>) -> Json<Value> {
    let space = quota::disk_usage(
        &state.config.uploads_dir(),
        state.config.max_disk_space_bytes(),
    );
    let status = space.status(
        state.config.warning_threshold_percent,
        state.config.critical_threshold_percent,
    );

    Json(json!({
        "data": {
            "total": space.total,
            "free": space.free,
            "used": space.used,
            "used_percent": space.used_percent(),
            "status": status,
            "formatted": {
                "total": quota::format_bytes(space.total),
                "free": quota::format_bytes(space.free),
                "used": quota::format_bytes(space.used),
            },
        },
        "error": null
    }))
}
