//! # Admin API Handlers
//!
//! JSON endpoints for editing the site: raw settings, the two achievements
//! lists (through the list editor, so every edit is sanitized and persisted
//! immediately), and the featured video slots including title autofill.
//!
//! All routes here sit behind the API key middleware.

use super::AppState;
use super::types::{
    AchievementsResponse, ErrorResponse, IconJson, MoveRequest, SchemaEntry, SchemaResponse,
    SetSettingRequest, SettingResponse, SettingsResponse, UpdateFieldRequest, VideoPatchRequest,
    VideosResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use vtsite_core::video::youtube_video_id;
use vtsite_core::{
    AchievementCategory, AchievementEditor, AchievementField, AutofillOutcome, AutofillTicket,
    SCHEMA, Sanitized, Settings, SiteError, VideoPatch,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// An admin call that failed, as status code plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SiteError> for ApiError {
    fn from(e: SiteError) -> Self {
        let status = match &e {
            SiteError::UnknownSetting(_) | SiteError::UnknownCategory(_) => StatusCode::NOT_FOUND,
            SiteError::UnknownField(_)
            | SiteError::IndexOutOfRange { .. }
            | SiteError::IconNotInVocabulary { .. }
            | SiteError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SiteError::ListFull(_) => StatusCode::CONFLICT,
            SiteError::SerializationError(_) | SiteError::IoError(_) => {
                tracing::error!(event = "admin_storage_error", error = %e, "Admin call failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run `write` with exclusive access to the settings. Store commits block on
/// disk, so this happens on the blocking pool.
pub(crate) async fn write_settings<F, T>(state: &AppState, write: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Settings) -> Result<T, SiteError> + Send + 'static,
    T: Send + 'static,
{
    let settings = Arc::clone(&state.settings);
    tokio::task::spawn_blocking(move || {
        let mut guard = settings.blocking_write();
        write(&mut guard)
    })
    .await
    .map_err(|e| SiteError::IoError(format!("settings writer failed: {e}")))?
    .map_err(ApiError::from)
}

fn log_sanitized(sanitized: &Sanitized) {
    if sanitized.dropped_fields > 0 || sanitized.dropped_records > 0 || sanitized.malformed {
        tracing::warn!(
            event = "setting_coerced",
            key = sanitized.key,
            dropped_fields = sanitized.dropped_fields,
            dropped_records = sanitized.dropped_records,
            malformed = sanitized.malformed,
            "Submitted value was coerced by its sanitizer"
        );
    }
    tracing::info!(event = "setting_saved", key = sanitized.key, "Setting saved");
}

// =============================================================================
// SCHEMA AND SETTINGS
// =============================================================================

/// `GET /admin/schema`
pub async fn schema_handler() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        success: true,
        settings: SCHEMA.iter().map(SchemaEntry::from).collect(),
    })
}

/// `GET /admin/settings`
pub async fn list_settings_handler(State(state): State<AppState>) -> ApiResult<SettingsResponse> {
    let settings = state.settings.read().await;
    let snapshot = settings.snapshot()?;
    let orphaned = settings.orphaned_keys()?;
    Ok(Json(SettingsResponse::from_snapshot(snapshot, orphaned)))
}

/// `PUT /admin/settings/{key}`
pub async fn set_setting_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<SetSettingRequest>,
) -> ApiResult<SettingResponse> {
    let raw = request.raw_value();
    let (sanitized, value) = write_settings(&state, move |settings| {
        let sanitized = settings.set(&key, &raw)?;
        let value = settings.get(&key)?;
        Ok((sanitized, value))
    })
    .await?;
    log_sanitized(&sanitized);
    Ok(Json(SettingResponse::written(&sanitized, value)))
}

/// `DELETE /admin/settings/{key}`: back to the declared default.
pub async fn reset_setting_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<SettingResponse> {
    let target = key.clone();
    let (removed, value) = write_settings(&state, move |settings| {
        let removed = settings.reset(&target)?;
        Ok((removed, settings.get(&target)?))
    })
    .await?;
    tracing::info!(event = "setting_reset", key = %key, removed, "Setting reset to default");
    Ok(Json(SettingResponse::reset(&key, value)))
}

// =============================================================================
// ACHIEVEMENTS
// =============================================================================

fn achievements_response(editor: &AchievementEditor, index: Option<usize>) -> AchievementsResponse {
    AchievementsResponse {
        success: true,
        category: editor.category(),
        records: editor.records().to_vec(),
        labels: editor.ordinal_labels(),
        icons: editor.vocabulary().choices().map(IconJson::from).collect(),
        index,
    }
}

/// Load the category's editor, apply `edit`, write the list back.
async fn edit_achievements<F>(
    state: &AppState,
    category: &str,
    edit: F,
) -> ApiResult<AchievementsResponse>
where
    F: FnOnce(&mut AchievementEditor) -> Result<Option<usize>, SiteError> + Send + 'static,
{
    let category: AchievementCategory = category.parse()?;
    let (editor, index, sanitized) = write_settings(state, move |settings| {
        let mut editor = AchievementEditor::load(category, settings)?;
        let index = edit(&mut editor)?;
        let sanitized = editor.commit(settings)?;
        Ok((editor, index, sanitized))
    })
    .await?;
    log_sanitized(&sanitized);
    Ok(Json(achievements_response(&editor, index)))
}

/// `GET /admin/achievements/{category}`
pub async fn list_achievements_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<AchievementsResponse> {
    let category: AchievementCategory = category.parse()?;
    let settings = state.settings.read().await;
    let editor = AchievementEditor::load(category, &settings)?;
    Ok(Json(achievements_response(&editor, None)))
}

/// `POST /admin/achievements/{category}`: append an empty record.
pub async fn add_achievement_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<AchievementsResponse> {
    edit_achievements(&state, &category, |editor| editor.add_record().map(Some)).await
}

/// `PATCH /admin/achievements/{category}/{index}`
pub async fn update_achievement_handler(
    State(state): State<AppState>,
    Path((category, index)): Path<(String, usize)>,
    Json(request): Json<UpdateFieldRequest>,
) -> ApiResult<AchievementsResponse> {
    let field: AchievementField = request.field.parse()?;
    edit_achievements(&state, &category, move |editor| {
        editor.update_field(index, field, &request.value)?;
        Ok(Some(index))
    })
    .await
}

/// `DELETE /admin/achievements/{category}/{index}`
pub async fn remove_achievement_handler(
    State(state): State<AppState>,
    Path((category, index)): Path<(String, usize)>,
) -> ApiResult<AchievementsResponse> {
    edit_achievements(&state, &category, move |editor| {
        editor.remove_record(index)?;
        Ok(None)
    })
    .await
}

/// `POST /admin/achievements/{category}/move`
pub async fn move_achievement_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<AchievementsResponse> {
    edit_achievements(&state, &category, move |editor| {
        editor.move_record(request.from, request.to)?;
        Ok(Some(request.to))
    })
    .await
}

// =============================================================================
// VIDEOS
// =============================================================================

/// `GET /admin/videos`
pub async fn list_videos_handler(State(state): State<AppState>) -> ApiResult<VideosResponse> {
    let settings = state.settings.read().await;
    Ok(Json(VideosResponse::new(settings.videos()?.value)))
}

/// `PUT /admin/videos/{slot}`
pub async fn update_video_handler(
    State(state): State<AppState>,
    Path(slot): Path<usize>,
    Json(request): Json<VideoPatchRequest>,
) -> ApiResult<VideosResponse> {
    let patch = VideoPatch::from(request);
    let (sanitized, videos) = write_settings(&state, move |settings| {
        let mut entries = settings.videos()?.value;
        patch.apply(&mut entries, slot)?;
        let sanitized = settings.set_videos(&entries)?;
        Ok((sanitized, settings.videos()?.value))
    })
    .await?;
    log_sanitized(&sanitized);
    Ok(Json(VideosResponse::new(videos)))
}

/// `POST /admin/videos/{slot}/autofill`: fetch the title for the slot's URL.
///
/// The settings lock is not held during the fetch. The result is only
/// written if the slot still has the URL the fetch was started for.
pub async fn autofill_handler(
    State(state): State<AppState>,
    Path(slot): Path<usize>,
) -> ApiResult<VideosResponse> {
    let ticket = {
        let settings = state.settings.read().await;
        AutofillTicket::start(&settings.videos()?.value, slot)?
    };

    let fetched = if youtube_video_id(&ticket.url).is_none() {
        tracing::warn!(
            event = "autofill_failed",
            slot,
            reason = "not_a_youtube_url",
            "Video title autofill skipped"
        );
        None
    } else {
        match state.oembed.fetch_title(&ticket.url).await {
            Ok(title) => Some(title),
            Err(e) => {
                tracing::warn!(
                    event = "autofill_failed",
                    slot,
                    error = %e,
                    "Video title autofill failed"
                );
                None
            }
        }
    };

    let (outcome, sanitized, videos) = write_settings(&state, move |settings| {
        let mut entries = settings.videos()?.value;
        let outcome = ticket.complete(&mut entries, fetched);
        let sanitized = match outcome {
            AutofillOutcome::Superseded => None,
            AutofillOutcome::Filled(_) | AutofillOutcome::Failed => {
                Some(settings.set_videos(&entries)?)
            }
        };
        Ok((outcome, sanitized, settings.videos()?.value))
    })
    .await?;
    match &sanitized {
        Some(sanitized) => log_sanitized(sanitized),
        None => tracing::info!(
            event = "autofill_superseded",
            slot,
            "Slot URL changed during autofill, result discarded"
        ),
    }
    Ok(Json(VideosResponse::new(videos).with_outcome(&outcome)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MemoryMailer;
    use crate::oembed::OembedClient;
    use vtsite_core::NonceKey;

    fn state() -> AppState {
        AppState::new(
            Settings::in_memory(),
            NonceKey::from_secret(b"admin test secret"),
            Arc::new(MemoryMailer::new()),
            OembedClient::new("http://127.0.0.1:9/oembed", 1).expect("client"),
        )
    }

    #[tokio::test]
    async fn writes_run_beside_the_async_runtime() {
        let state = state();
        let sanitized = write_settings(&state, |settings| settings.set("tagline", " <b>Hi</b> "))
            .await
            .expect("write");
        assert_eq!(sanitized.stored, "Hi");

        let settings = state.settings.read().await;
        assert_eq!(settings.text("tagline").expect("text"), "Hi");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_achievement_edits_all_land() {
        let state = state();
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let state = state.clone();
            tasks.push(tokio::spawn(async move {
                edit_achievements(&state, "personal", |editor| editor.add_record().map(Some))
                    .await
                    .map(|_| ())
            }));
        }
        for task in tasks {
            task.await.expect("join").expect("edit");
        }

        let settings = state.settings.read().await;
        let records = settings
            .achievements(AchievementCategory::Personal)
            .expect("achievements")
            .value;
        assert_eq!(records.len(), 8);
    }

    #[tokio::test]
    async fn write_errors_keep_their_status() {
        let state = state();
        let err = write_settings(&state, |settings| settings.set("no_such_key", "x"))
            .await
            .expect_err("unknown key");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_statuses() {
        let status = |e: SiteError| ApiError::from(e).status;
        assert_eq!(status(SiteError::UnknownSetting("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(SiteError::UnknownCategory("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(SiteError::IndexOutOfRange { index: 3, len: 1 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(SiteError::ListFull(100)), StatusCode::CONFLICT);
        assert_eq!(
            status(SiteError::IoError("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
