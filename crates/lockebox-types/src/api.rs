use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Encounter;

// -- JWT Claims --

/// JWT claims shared between token issuance (register/login) and the REST
/// auth middleware. Canonical definition lives here in lockebox-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Runs --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CreateRunRequest {
    pub game_version: Option<String>,
    pub run_name: Option<String>,
    pub current_route: Option<String>,
    pub encounters: Vec<Encounter>,
    pub box_pokemon: Vec<Encounter>,
    pub grave_pokemon: Vec<Encounter>,
    pub badges: Vec<String>,
    pub rivals_defeated: Vec<String>,
    pub bosses_defeated: Vec<String>,
}

/// Partial update. Absent fields are left unchanged; these are the only
/// client-writable fields, anything else in the body is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct UpdateRunRequest {
    pub game_version: Option<String>,
    pub run_name: Option<String>,
    pub current_route: Option<String>,
    pub encounters: Option<Vec<Encounter>>,
    pub box_pokemon: Option<Vec<Encounter>>,
    pub grave_pokemon: Option<Vec<Encounter>>,
    pub badges: Option<Vec<String>>,
    pub rivals_defeated: Option<Vec<String>>,
    pub bosses_defeated: Option<Vec<String>>,
}
