use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;
use crate::matching::{DocumentSource, MatchResult};
use crate::state::AppState;

/// One uploaded file held in memory.
struct Upload {
    file_name: String,
    bytes: Bytes,
}

impl Upload {
    fn source(&self) -> DocumentSource<'_> {
        DocumentSource::new(&self.file_name, &self.bytes)
    }
}

#[derive(Default)]
struct MatchForm {
    resume: Option<Upload>,
    job_description: Option<Upload>,
    required_years: Option<u32>,
}

impl MatchForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MatchForm::default();

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" | "job_description" => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .ok_or_else(|| {
                            AppError::Validation(format!("Field '{name}' must be a file upload"))
                        })?;
                    let bytes = field.bytes().await.map_err(malformed)?;
                    debug!("Received {name}: {file_name} ({} bytes)", bytes.len());
                    let upload = Some(Upload { file_name, bytes });
                    if name == "resume" {
                        form.resume = upload;
                    } else {
                        form.job_description = upload;
                    }
                }
                "required_years" => {
                    let raw = field.text().await.map_err(malformed)?;
                    let years = raw.trim().parse::<u32>().map_err(|_| {
                        AppError::Validation(format!(
                            "'required_years' must be a non-negative integer, got {raw:?}"
                        ))
                    })?;
                    form.required_years = Some(years);
                }
                other => debug!("Ignoring unknown multipart field '{other}'"),
            }
        }

        Ok(form)
    }
}

fn malformed(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(err.body_text());
    }
    AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
}

/// POST /api/v1/match
/// Multipart form with `resume` and `job_description` files and an optional
/// `required_years` override.
pub async fn handle_match(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchResult>, AppError> {
    let form = MatchForm::read(multipart).await?;
    let resume = form
        .resume
        .ok_or_else(|| AppError::Validation("Missing 'resume' file".to_string()))?;
    let job_description = form
        .job_description
        .ok_or_else(|| AppError::Validation("Missing 'job_description' file".to_string()))?;
    let required_years = form.required_years;

    // Extraction and analysis are CPU-bound.
    let pipeline = state.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || {
        pipeline.evaluate_with(resume.source(), job_description.source(), required_years)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Match task failed: {e}")))??;

    Ok(Json(result))
}
