use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use lockebox_db::models::RunRow;
use lockebox_types::api::{Claims, CreateRunRequest, UpdateRunRequest};
use lockebox_types::models::NuzlockeRun;

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson};

pub async fn list_runs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.get_runs_for_user(&uid))
        .await
        .map_err(join_err)??;

    let runs: Vec<NuzlockeRun> = rows.into_iter().map(run_from_row).collect();
    Ok(Json(runs))
}

pub async fn create_run(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateRunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let run = NuzlockeRun {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        game_version: req.game_version,
        run_name: req.run_name,
        current_route: req.current_route,
        encounters: req.encounters,
        box_pokemon: req.box_pokemon,
        grave_pokemon: req.grave_pokemon,
        badges: req.badges,
        rivals_defeated: req.rivals_defeated,
        bosses_defeated: req.bosses_defeated,
        created_at: now,
        updated_at: now,
    };

    let row = row_from_run(&run)?;
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.insert_run(&row))
        .await
        .map_err(join_err)??;

    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_run_id(&id)?;
    let row = load_owned_run(&state, id, claims.sub).await?;
    Ok(Json(run_from_row(row)))
}

pub async fn update_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateRunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_run_id(&id)?;
    let row = load_owned_run(&state, id, claims.sub).await?;
    let mut run = run_from_row(row);

    // Merge only the fields the client actually sent.
    if let Some(v) = req.game_version {
        run.game_version = Some(v);
    }
    if let Some(v) = req.run_name {
        run.run_name = Some(v);
    }
    if let Some(v) = req.current_route {
        run.current_route = Some(v);
    }
    if let Some(v) = req.encounters {
        run.encounters = v;
    }
    if let Some(v) = req.box_pokemon {
        run.box_pokemon = v;
    }
    if let Some(v) = req.grave_pokemon {
        run.grave_pokemon = v;
    }
    if let Some(v) = req.badges {
        run.badges = v;
    }
    if let Some(v) = req.rivals_defeated {
        run.rivals_defeated = v;
    }
    if let Some(v) = req.bosses_defeated {
        run.bosses_defeated = v;
    }
    run.updated_at = Utc::now();

    let row = row_from_run(&run)?;
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.update_run(&row))
        .await
        .map_err(join_err)??;

    Ok(Json(run))
}

pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_run_id(&id)?;
    load_owned_run(&state, id, claims.sub).await?;

    let db = state.clone();
    let rid = id.to_string();
    let deleted = tokio::task::spawn_blocking(move || db.db.delete_run(&rid))
        .await
        .map_err(join_err)??;

    if !deleted {
        // Lost a race with a concurrent delete of the same run.
        return Err(ApiError::RunNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Absent run is 404; present but foreign-owned is 403.
async fn load_owned_run(state: &AppState, id: Uuid, user_id: Uuid) -> Result<RunRow, ApiError> {
    let db = state.clone();
    let rid = id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_run_by_id(&rid))
        .await
        .map_err(join_err)??
        .ok_or(ApiError::RunNotFound)?;

    if row.user_id != user_id.to_string() {
        return Err(ApiError::NotYourRun);
    }

    Ok(row)
}

fn parse_run_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest("malformed run id"))
}

fn join_err(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(anyhow::anyhow!("blocking task join: {}", e))
}

fn run_from_row(row: RunRow) -> NuzlockeRun {
    NuzlockeRun {
        id: parse_uuid(&row.id, "run id"),
        user_id: parse_uuid(&row.user_id, "run owner"),
        game_version: row.game_version,
        run_name: row.run_name,
        current_route: row.current_route,
        encounters: parse_list(&row.encounters, &row.id, "encounters"),
        box_pokemon: parse_list(&row.box_pokemon, &row.id, "box_pokemon"),
        grave_pokemon: parse_list(&row.grave_pokemon, &row.id, "grave_pokemon"),
        badges: parse_list(&row.badges, &row.id, "badges"),
        rivals_defeated: parse_list(&row.rivals_defeated, &row.id, "rivals_defeated"),
        bosses_defeated: parse_list(&row.bosses_defeated, &row.id, "bosses_defeated"),
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
    }
}

fn row_from_run(run: &NuzlockeRun) -> Result<RunRow, ApiError> {
    Ok(RunRow {
        id: run.id.to_string(),
        user_id: run.user_id.to_string(),
        game_version: run.game_version.clone(),
        run_name: run.run_name.clone(),
        current_route: run.current_route.clone(),
        encounters: encode_list(&run.encounters)?,
        box_pokemon: encode_list(&run.box_pokemon)?,
        grave_pokemon: encode_list(&run.grave_pokemon)?,
        badges: encode_list(&run.badges)?,
        rivals_defeated: encode_list(&run.rivals_defeated)?,
        bosses_defeated: encode_list(&run.bosses_defeated)?,
        created_at: run.created_at.to_rfc3339(),
        updated_at: run.updated_at.to_rfc3339(),
    })
}

fn encode_list<T: Serialize>(list: &[T]) -> Result<String, ApiError> {
    serde_json::to_string(list).map_err(|e| ApiError::Internal(e.into()))
}

fn parse_list<T: DeserializeOwned>(json: &str, run_id: &str, column: &str) -> Vec<T> {
    serde_json::from_str(json).unwrap_or_else(|e| {
        warn!("Corrupt {} on run '{}': {}", column, run_id, e);
        Vec::new()
    })
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, run_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite default timestamps are "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on run '{}': {}", raw, run_id, e);
            DateTime::default()
        })
}
