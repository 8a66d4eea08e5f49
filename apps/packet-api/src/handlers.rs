//! HTTP handlers for packet-api

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use packet_forms::{decode_pdf_base64, fill_document, inspect_document, FillValues};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::models::*;
use crate::state::{AppState, FormEntry};
use crate::store;

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "packet-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /api/forms
pub async fn list_forms(State(state): State<Arc<AppState>>) -> Json<FormListResponse> {
    let forms: Vec<FormSummary> = state
        .forms
        .iter()
        .map(|(name, entry)| FormSummary {
            name: name.clone(),
            description: entry.profile.description.clone(),
            template_available: entry.template.path().exists(),
            profile: entry.profile.clone(),
        })
        .collect();
    let count = forms.len();

    Json(FormListResponse {
        success: true,
        forms,
        count,
    })
}

/// Handler: GET /api/forms/:form/template
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let entry = state.form(&form)?;
    let pdf_base64 = load_template(entry, &form).await?;
    Ok(Json(TemplateResponse {
        success: true,
        form,
        pdf_base64,
    }))
}

/// Handler: POST /api/forms/:form/inspect
pub async fn inspect_form(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
    Json(req): Json<InspectRequest>,
) -> Result<Json<InspectResponse>, ApiError> {
    let entry = state.form(&form)?;
    let source = match non_blank(req.pdf_base64) {
        Some(pdf) => pdf,
        None => load_template(entry.clone(), &form).await?,
    };

    let report = blocking(move || {
        let bytes = decode_pdf_base64(&source)?;
        Ok(inspect_document(&bytes, &entry.profile)?)
    })
    .await?;

    Ok(Json(InspectResponse {
        success: true,
        form,
        report,
    }))
}

/// Handler: POST /api/forms/:form/fill
pub async fn fill_form(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
    Json(req): Json<FillRequest>,
) -> Result<Json<FillResponse>, ApiError> {
    let entry = state.form(&form)?;
    let user_id = match req.user_id {
        Some(id) if id.trim().is_empty() => {
            return Err(ApiError::InvalidRequest("userId must not be blank".into()))
        }
        other => other,
    };

    let values = FillValues::derive(
        &req.full_name,
        req.date.as_deref(),
        req.fallback_date.as_deref(),
    );

    let source = match non_blank(req.pdf_base64) {
        Some(pdf) => pdf,
        None => {
            let saved = match &user_id {
                Some(user_id) => store::get_progress(&state.db, user_id, &form).await?,
                None => None,
            };
            match saved {
                Some(record) if record.filled => {
                    debug!(user_id = %record.user_id, form = %record.form_name, "Saved progress is already filled");
                    return Err(ApiError::NothingToFill);
                }
                Some(record) => {
                    debug!(user_id = %record.user_id, form = %record.form_name, "Filling saved progress");
                    record.pdf_base64
                }
                None => load_template(entry.clone(), &form).await?,
            }
        }
    };

    let filled = blocking(move || {
        let bytes = decode_pdf_base64(&source)?;
        Ok(fill_document(&bytes, &entry.profile, &values)?)
    })
    .await?
    .ok_or(ApiError::NothingToFill)?;

    let pdf_base64 = BASE64.encode(&filled.bytes);
    let saved = match &user_id {
        Some(user_id) => {
            store::upsert_progress(&state.db, user_id, &form, &pdf_base64, true).await?;
            true
        }
        None => false,
    };

    info!(
        form = %form,
        mode = ?filled.mode,
        changes = filled.changes,
        saved,
        "Filled form"
    );

    Ok(Json(FillResponse {
        success: true,
        form,
        mode: filled.mode,
        changes: filled.changes,
        flattened: filled.flattened,
        saved,
        pdf_base64,
    }))
}

/// Handler: GET /api/progress/:user_id/:form
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, form)): Path<(String, String)>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let record = store::get_progress(&state.db, &user_id, &form)
        .await?
        .ok_or(ApiError::ProgressNotFound { user_id, form })?;

    Ok(Json(ProgressResponse {
        success: true,
        user_id: record.user_id,
        form: record.form_name,
        pdf_base64: record.pdf_base64,
        filled: record.filled,
        updated_at: record.updated_at,
    }))
}

/// Handler: PUT /api/progress/:user_id/:form
pub async fn save_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, form)): Path<(String, String)>,
    Json(req): Json<SaveProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    state.form(&form)?;
    let bytes = decode_pdf_base64(&req.pdf_base64)?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidRequest("pdfBase64 is empty".into()));
    }

    let pdf_base64 = BASE64.encode(&bytes);
    let updated_at =
        store::upsert_progress(&state.db, &user_id, &form, &pdf_base64, false).await?;

    Ok(Json(ProgressResponse {
        success: true,
        user_id,
        form,
        pdf_base64,
        filled: false,
        updated_at,
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn load_template(entry: Arc<FormEntry>, form: &str) -> Result<String, ApiError> {
    blocking(move || Ok(entry.template.load_base64()?))
        .await?
        .ok_or_else(|| ApiError::TemplateMissing(form.to_string()))
}

/// Run PDF work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
}
