//! HTTP API handlers for Promille.
//!
//! Every endpoint that touches a person responds with a fresh
//! [`PersonSnapshot`], so callers always see the state their mutation
//! produced. Unknown person ids become `404`; rejected numeric input becomes
//! `422`. Removing an unknown drink from a known person is *not* an error —
//! the person comes back unchanged.
//!
//! # Endpoints
//!
//! - `POST /person` - Create a person
//! - `GET /person/{id}` - Fetch a person
//! - `PUT /person/{id}` - Update weight and gender flag
//! - `POST /person/{id}/drink` - Record a drink
//! - `DELETE /person/{id}/drink/{drink_id}` - Remove a drink
//! - `GET /health` - Health check

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::Error;
use crate::model::{DrinkRequest, PersonRequest, PersonSnapshot};
use crate::storage::{PersonHandle, PersonRepository};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: PersonRepository,
}

/// An error returned by an API handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    Invalid(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::PersonNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidWeight(_) | Error::InvalidVolume(_) | Error::InvalidStrength(_) => {
                ApiError::Invalid(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Invalid(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router.
///
/// CORS is wide open: the service carries no credentials and the original
/// deployment is driven straight from browsers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/person", post(create_person))
        .route("/person/:id", get(get_person).put(update_person))
        .route("/person/:id/drink", post(add_drink))
        .route("/person/:id/drink/:drink_id", delete(remove_drink))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fetch a person handle or report the id as unknown.
async fn find_person(state: &AppState, id: Uuid) -> Result<PersonHandle, ApiError> {
    state
        .repository
        .find(id)
        .await
        .ok_or_else(|| ApiError::from(Error::PersonNotFound(id)))
}

/// POST /person - Create a person.
///
/// # Request Body
///
/// ```json
/// {
///     "is_female": false,
///     "weight": 80.0
/// }
/// ```
///
/// # Response
///
/// Returns `201 Created` with the new person's snapshot, or `422` if the
/// weight is not positive.
#[instrument(skip(state))]
pub async fn create_person(
    State(state): State<AppState>,
    Json(request): Json<PersonRequest>,
) -> Result<(StatusCode, Json<PersonSnapshot>), ApiError> {
    let handle = state
        .repository
        .create(request.is_female, request.weight)
        .await
        .map_err(|e| {
            warn!(weight = request.weight, error = %e, "Rejected person creation");
            ApiError::from(e)
        })?;

    let snapshot = PersonSnapshot::of(&*handle.read().await);
    info!(
        person = %snapshot.id,
        gender = snapshot.gender,
        weight = snapshot.weight,
        "Person created"
    );
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /person/{id} - Fetch a person's current snapshot.
///
/// Returns `404` if the id was never issued.
#[instrument(skip(state))]
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonSnapshot>, ApiError> {
    let handle = find_person(&state, id).await?;
    let snapshot = PersonSnapshot::of(&*handle.read().await);

    info!(
        person = %id,
        drinks = snapshot.drinks.len(),
        bac = snapshot.blood_alcohol_concentration,
        "Person queried"
    );
    Ok(Json(snapshot))
}

/// PUT /person/{id} - Overwrite a person's weight and gender flag.
///
/// Takes the same body as `POST /person`. The update is applied in one
/// exclusive-access scope, so concurrent readers never observe a half-updated
/// person. Returns `404` for an unknown id, `422` for a non-positive weight.
#[instrument(skip(state))]
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PersonRequest>,
) -> Result<Json<PersonSnapshot>, ApiError> {
    let handle = find_person(&state, id).await?;

    let snapshot = {
        let mut person = handle.write().await;
        person.set_weight(request.weight).map_err(|e| {
            warn!(person = %id, weight = request.weight, error = %e, "Rejected person update");
            ApiError::from(e)
        })?;
        person.set_is_female(request.is_female);
        PersonSnapshot::of(&person)
    };

    info!(
        person = %id,
        gender = snapshot.gender,
        weight = snapshot.weight,
        "Person updated"
    );
    Ok(Json(snapshot))
}

/// POST /person/{id}/drink - Record a drink for a person.
///
/// # Request Body
///
/// ```json
/// {
///     "volume": 0.5,
///     "strength_percent": 5.0
/// }
/// ```
///
/// The drink is stamped with the server's current time. Returns `404` for an
/// unknown person, `422` for a non-positive volume or a strength outside
/// `[0, 100]`.
#[instrument(skip(state))]
pub async fn add_drink(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DrinkRequest>,
) -> Result<Json<PersonSnapshot>, ApiError> {
    let handle = find_person(&state, id).await?;

    let snapshot = {
        let mut person = handle.write().await;
        let drink = person
            .drink(request.volume, request.strength_percent)
            .map_err(|e| {
                warn!(
                    person = %id,
                    volume = request.volume,
                    strength = request.strength_percent,
                    error = %e,
                    "Rejected drink"
                );
                ApiError::from(e)
            })?;
        info!(person = %id, drink = %drink.id(), "Drink recorded");
        PersonSnapshot::of(&person)
    };

    Ok(Json(snapshot))
}

/// DELETE /person/{id}/drink/{drink_id} - Remove a drink from a person.
///
/// An unknown drink id is a silent no-op: the response is `200` with the
/// unchanged person. Only an unknown *person* id is an error (`404`).
#[instrument(skip(state))]
pub async fn remove_drink(
    State(state): State<AppState>,
    Path((id, drink_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PersonSnapshot>, ApiError> {
    let handle = find_person(&state, id).await?;

    let snapshot = {
        let mut person = handle.write().await;
        if person.remove_drink(drink_id) {
            info!(person = %id, drink = %drink_id, "Drink removed");
        } else {
            info!(person = %id, drink = %drink_id, "Unknown drink id ignored");
        }
        PersonSnapshot::of(&person)
    };

    Ok(Json(snapshot))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
