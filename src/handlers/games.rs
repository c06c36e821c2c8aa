//! Game collection handlers.
//!
//! Each handler is a direct pass-through to the injected [`GameStore`]:
//! parse the path/body, make one store call, encode the result as JSON.
//! Store failures surface as `ApiError::Internal` (HTTP 500); lookups
//! that miss surface as `ApiError::NotFound` (HTTP 404, empty body).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use metrics::counter;
use tracing::debug;

use crate::errors::ApiError;
use crate::inventory::store::{GameFields, GameRecord};
use crate::metrics::GAMES_CREATED_TOTAL;
use crate::AppState;

/// `GET /api/hello/` -- connectivity probe, plain text.
#[utoipa::path(
    get,
    path = "/api/hello/",
    tag = "Tester",
    operation_id = "Hello",
    responses((status = 200, description = "Plain-text greeting"))
)]
pub async fn hello() -> &'static str {
    "Hello"
}

/// `GET /api/gamelist/` -- every record, in insertion order.
#[utoipa::path(
    get,
    path = "/api/gamelist/",
    tag = "Games",
    operation_id = "ListGames",
    responses((status = 200, description = "All game records", body = [GameRecord]))
)]
pub async fn list_games(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    let games = state.store.list_all().await?;
    Ok(Json(games))
}

/// `GET /api/games/:id` -- a single record by identifier.
#[utoipa::path(
    get,
    path = "/api/games/{id}",
    tag = "Games",
    operation_id = "GetGame",
    params(("id" = String, Path, description = "Record identifier")),
    responses(
        (status = 200, description = "The matching record", body = GameRecord),
        (status = 404, description = "No record with that identifier")
    )
)]
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GameRecord>, ApiError> {
    match state.store.find_by_id(&id).await? {
        Some(game) => Ok(Json(game)),
        None => Err(ApiError::NotFound),
    }
}

/// `PUT /api/games/:id/update` -- overwrite the payload fields of a record.
///
/// The store call is an upsert: when no record with `id` exists, one is
/// inserted under that id, but the route still answers 404 -- success is
/// only reported when a prior record existed.
#[utoipa::path(
    put,
    path = "/api/games/{id}/update",
    tag = "Games",
    operation_id = "UpdateGame",
    params(("id" = String, Path, description = "Record identifier")),
    request_body = GameFields,
    responses(
        (status = 200, description = "The record after the update", body = GameRecord),
        (status = 404, description = "No record existed before the update")
    )
)]
pub async fn update_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(fields): Json<GameFields>,
) -> Result<Json<GameRecord>, ApiError> {
    let outcome = state.store.upsert_by_id(&id, fields).await?;
    if outcome.created {
        debug!("update for unknown id {id} inserted a new record");
        return Err(ApiError::NotFound);
    }
    Ok(Json(outcome.record))
}

/// `DELETE /api/games/:id/remove` -- remove a record, then return the
/// remaining collection.
#[utoipa::path(
    delete,
    path = "/api/games/{id}/remove",
    tag = "Games",
    operation_id = "RemoveGame",
    params(("id" = String, Path, description = "Record identifier")),
    responses((status = 200, description = "All remaining records", body = [GameRecord]))
)]
pub async fn remove_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    state.store.delete_by_id(&id).await?;
    debug!("removed game record {id}");
    let games = state.store.list_all().await?;
    Ok(Json(games))
}

/// `POST /api/addgame/` -- insert a record, then return the full
/// collection including it.
#[utoipa::path(
    post,
    path = "/api/addgame/",
    tag = "Games",
    operation_id = "AddGame",
    request_body = GameFields,
    responses((status = 200, description = "All records after the insert", body = [GameRecord]))
)]
pub async fn add_game(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<GameFields>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    let record = state.store.insert(fields).await?;
    debug!("inserted game record {}", record.id);
    counter!(GAMES_CREATED_TOTAL).increment(1);

    let games = state.store.list_all().await?;
    Ok(Json(games))
}
