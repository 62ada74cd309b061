use std::path::PathBuf;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::admin::AdminState;
use crate::config::{ChangeEvent, Config, Format, Store, StoreError};
use crate::form::{FieldError, FormView, ListError, Navigation, Submission, Values};
use crate::path::{Path, PathError};

/// Failures of an admin request, mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Path(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::List(ListError::NotFound(_))) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::List(ListError::OutOfRange { .. })) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::List(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let fields = match &self {
            ApiError::Store(StoreError::Rejected(rejection)) => rejection.fields.clone(),
            _ => Vec::new(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Admin request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Admin request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub file: PathBuf,
    pub format: Format,
    pub auto_apply: bool,
    pub auto_save: bool,
    pub watching: bool,
}

#[derive(Serialize)]
pub struct ConfigPage {
    pub values: Values,
    pub form: FormView,
    pub navigation: Navigation,
}

#[derive(Serialize)]
pub struct SubmitOutcome {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<ChangeEvent>,
    pub values: Values,
}

#[derive(Serialize)]
pub struct ItemOutcome {
    pub path: Path,
    pub len: usize,
}

#[derive(Serialize)]
pub struct SaveOutcome {
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct FocusQuery {
    #[serde(default)]
    pub focus: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub path: String,
    pub index: usize,
}

/// Run a store call on the blocking pool. Mutations may write the file
/// (auto-save, save) and reloads read it.
async fn blocking<T, R, F>(state: &AdminState<T>, f: F) -> Result<R, ApiError>
where
    T: Config,
    R: Send + 'static,
    F: FnOnce(Store<T>) -> Result<R, StoreError> + Send + 'static,
{
    let store = state.store.clone();
    Ok(tokio::task::spawn_blocking(move || f(store)).await??)
}

pub async fn get_status<T: Config>(State(state): State<AdminState<T>>) -> Json<SystemStatus> {
    let store = &state.store;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        file: store.file().to_path_buf(),
        format: store.format(),
        auto_apply: store.auto_apply(),
        auto_save: store.auto_save(),
        watching: store.is_watching(),
    })
}

pub async fn get_config<T: Config>(
    State(state): State<AdminState<T>>,
    Query(query): Query<FocusQuery>,
) -> Result<Json<ConfigPage>, ApiError> {
    let focus = Path::parse(&query.focus)?;
    let store = &state.store;
    Ok(Json(ConfigPage {
        values: store.extract(),
        form: store.render(&focus),
        navigation: store.navigate(&focus),
    }))
}

/// Apply the submission when auto-apply is on, otherwise answer with the
/// preview and wait for `/admin/config/confirm`.
pub async fn submit_config<T: Config>(
    State(state): State<AdminState<T>>,
    Form(submission): Form<Submission>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let store = &state.store;
    if !store.auto_apply() {
        let values = store.preview(&submission).map_err(StoreError::from)?;
        return Ok(Json(SubmitOutcome {
            applied: false,
            event: None,
            values,
        }));
    }
    apply(&state, submission).await
}

pub async fn confirm_config<T: Config>(
    State(state): State<AdminState<T>>,
    Form(submission): Form<Submission>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    apply(&state, submission).await
}

async fn apply<T: Config>(
    state: &AdminState<T>,
    submission: Submission,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let outcome = blocking(state, move |store| {
        store.mark_form_submit();
        let event = store.apply(&submission)?;
        Ok(SubmitOutcome {
            applied: true,
            event: Some(event),
            values: store.extract(),
        })
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn add_item<T: Config>(
    State(state): State<AdminState<T>>,
    Form(request): Form<ItemRequest>,
) -> Result<Json<ItemOutcome>, ApiError> {
    let path = Path::parse(&request.path)?;
    let target = path.clone();
    let len = blocking(&state, move |store| {
        store.mark_form_submit();
        store.add_item(&target)
    })
    .await?;
    Ok(Json(ItemOutcome { path, len }))
}

/// The index is required; a form without one is rejected by the extractor.
pub async fn remove_item<T: Config>(
    State(state): State<AdminState<T>>,
    Form(request): Form<RemoveItemRequest>,
) -> Result<Json<ItemOutcome>, ApiError> {
    let path = Path::parse(&request.path)?;
    let target = path.clone();
    let len = blocking(&state, move |store| {
        store.mark_form_submit();
        store.remove_item(&target, request.index)
    })
    .await?;
    Ok(Json(ItemOutcome { path, len }))
}

pub async fn reload<T: Config>(
    State(state): State<AdminState<T>>,
) -> Result<Json<ChangeEvent>, ApiError> {
    Ok(Json(blocking(&state, |store| store.reload()).await?))
}

pub async fn save<T: Config>(
    State(state): State<AdminState<T>>,
) -> Result<Json<SaveOutcome>, ApiError> {
    blocking(&state, |store| store.save()).await?;
    Ok(Json(SaveOutcome { saved: true }))
}
