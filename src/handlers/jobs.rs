use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::ReconcileOutcome;
use crate::services::reconcile::run_reconciliation;
use crate::state::AppState;

// POST /api/jobs/expire-bookings
//
// Takes no body. Preflight OPTIONS is answered by the CORS layer.
pub async fn expire_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = run_reconciliation(state.store.as_ref(), &state.clock).await?;

    let body = match outcome {
        ReconcileOutcome::NothingExpired { checked } => serde_json::json!({
            "success": true,
            "message": "No expired bookings found",
            "checked": checked,
        }),
        ReconcileOutcome::Reconciled(summary) => serde_json::json!({
            "success": true,
            "message": format!(
                "Completed {} expired booking(s) and released {} room(s)",
                summary.bookings_updated, summary.rooms_updated
            ),
            "checked": summary.checked,
            "bookings_updated": summary.bookings_updated,
            "rooms_updated": summary.rooms_updated,
            "rooms": summary.rooms,
        }),
    };

    Ok(Json(body))
}
