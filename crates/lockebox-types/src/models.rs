use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a recorded Pokémon stands in the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterStatus {
    Captured,
    Fainted,
    Skipped,
    #[default]
    Upcoming,
}

/// One recorded Pokémon interaction within a run. Encounters live embedded
/// inside the run document and are never addressed individually.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encounter {
    pub route_name: Option<String>,
    /// PokeAPI species id (e.g. 25 for Pikachu).
    pub pokemon_id: Option<u32>,
    pub pokemon_name: Option<String>,
    pub nickname: Option<String>,
    pub status: EncounterStatus,
    pub nature: Option<String>,
    /// Sprite URL, from PokeAPI.
    pub image: Option<String>,
}

/// A tracked playthrough, owned by exactly one user. This is both the
/// domain model and the JSON document returned by the run endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NuzlockeRun {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_version: Option<String>,
    pub run_name: Option<String>,
    /// The last route the user is tracking.
    pub current_route: Option<String>,
    pub encounters: Vec<Encounter>,
    /// Pokémon currently alive and in the PC box.
    pub box_pokemon: Vec<Encounter>,
    /// Pokémon that fainted during the run.
    pub grave_pokemon: Vec<Encounter>,
    pub badges: Vec<String>,
    pub rivals_defeated: Vec<String>,
    pub bosses_defeated: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encounter_status_defaults_to_upcoming() {
        let enc: Encounter = serde_json::from_str(r#"{"routeName":"Route 101"}"#).unwrap();
        assert_eq!(enc.status, EncounterStatus::Upcoming);
        assert_eq!(enc.route_name.as_deref(), Some("Route 101"));
        assert_eq!(enc.nickname, None);
    }

    #[test]
    fn encounter_serializes_camel_case_keys() {
        let enc = Encounter {
            route_name: Some("Route 101".into()),
            pokemon_id: Some(261),
            pokemon_name: Some("Poochyena".into()),
            nickname: Some("Shadow".into()),
            status: EncounterStatus::Captured,
            nature: Some("Adamant".into()),
            image: None,
        };

        let json = serde_json::to_value(&enc).unwrap();
        assert_eq!(json["routeName"], "Route 101");
        assert_eq!(json["pokemonId"], 261);
        assert_eq!(json["pokemonName"], "Poochyena");
        assert_eq!(json["status"], "Captured");
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(serde_json::from_str::<EncounterStatus>(r#""Released""#).is_err());
    }
}
