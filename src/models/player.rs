use super::{flatten_metadata, Fields};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kinds of player identifier tracked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IdentifierType {
    #[serde(rename = "BEGUID")]
    BeGuid,
    #[serde(rename = "legacyBEGUID")]
    BeLegacyGuid,
    #[serde(rename = "conanCharName")]
    ConanCharName,
    #[serde(rename = "egsID")]
    EgsId,
    #[serde(rename = "funcomID")]
    FuncomId,
    #[serde(rename = "ip")]
    Ip,
    #[serde(rename = "mcUUID")]
    McUuid,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "playFabID")]
    PlayFabId,
    #[serde(rename = "steamFamilyShareOwner")]
    SteamFamilyShareOwner,
    #[serde(rename = "steamID")]
    SteamId,
    #[serde(rename = "survivorName")]
    SurvivorName,
}

impl IdentifierType {
    pub const ALL: [IdentifierType; 12] = [
        IdentifierType::BeGuid,
        IdentifierType::BeLegacyGuid,
        IdentifierType::ConanCharName,
        IdentifierType::EgsId,
        IdentifierType::FuncomId,
        IdentifierType::Ip,
        IdentifierType::McUuid,
        IdentifierType::Name,
        IdentifierType::PlayFabId,
        IdentifierType::SteamFamilyShareOwner,
        IdentifierType::SteamId,
        IdentifierType::SurvivorName,
    ];

    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::BeGuid => "BEGUID",
            IdentifierType::BeLegacyGuid => "legacyBEGUID",
            IdentifierType::ConanCharName => "conanCharName",
            IdentifierType::EgsId => "egsID",
            IdentifierType::FuncomId => "funcomID",
            IdentifierType::Ip => "ip",
            IdentifierType::McUuid => "mcUUID",
            IdentifierType::Name => "name",
            IdentifierType::PlayFabId => "playFabID",
            IdentifierType::SteamFamilyShareOwner => "steamFamilyShareOwner",
            IdentifierType::SteamId => "steamID",
            IdentifierType::SurvivorName => "survivorName",
        }
    }
}

impl FromStr for IdentifierType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::decode(format!("unknown identifier type {:?}", s)))
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One identifier attached to a player (a name, a Steam ID, an IP, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    /// The identifier record's id, not the identifier value.
    pub id: u64,
    pub kind: IdentifierType,
    /// The identifier value; absent for some kinds.
    pub name: Option<String>,
    pub player_id: u64,
    pub private: bool,
    pub last_seen: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl Identifier {
    pub fn from_resource(resource: &Value) -> Result<Self> {
        let f = Fields::new("Identifier", resource);
        let kind: String = f.required(&["attributes", "type"])?;
        Ok(Self {
            id: f.required_id(&["id"])?,
            kind: kind.parse()?,
            name: f.optional(&["attributes", "identifier"])?,
            player_id: f.required_id(&["relationships", "player", "data", "id"])?,
            private: f.or_default(&["attributes", "private"])?,
            last_seen: f.required_datetime(&["attributes", "lastSeen"])?,
            metadata: f.object_or_empty(&["attributes", "metadata"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// Private profiles are left out of searches and lists.
    pub private: bool,
    /// Set when a search by unique identifier matched this player exactly.
    pub positive_match: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Session metadata, present when the player came from a server listing.
    pub first_time: Option<bool>,
    pub score: Option<i64>,
    /// Seconds in the current session.
    pub playtime: Option<f64>,
    pub identifiers: Vec<Identifier>,
}

impl Player {
    pub fn from_resource(resource: &Value) -> Result<Self> {
        Self::with_identifiers(resource, Vec::new())
    }

    /// Decode with identifiers that were resolved from `included`.
    pub fn with_identifiers(resource: &Value, identifiers: Vec<Identifier>) -> Result<Self> {
        let f = Fields::new("Player", resource);
        let meta = flatten_metadata(resource);
        let m = Fields::new("Player.meta", &meta);
        Ok(Self {
            id: f.required_id(&["id"])?,
            name: f.required(&["attributes", "name"])?,
            private: f.or_default(&["attributes", "private"])?,
            positive_match: f.or_default(&["attributes", "positiveMatch"])?,
            created_at: f.required_datetime(&["attributes", "createdAt"])?,
            updated_at: f.required_datetime(&["attributes", "updatedAt"])?,
            first_time: m.optional(&["firstTime"])?,
            score: m.optional(&["score"])?,
            playtime: m.optional(&["time"])?,
            identifiers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn player_json() -> Value {
        json!({
            "type": "player",
            "id": "42",
            "attributes": {
                "name": "Alice",
                "private": false,
                "positiveMatch": false,
                "createdAt": "2020-01-01T00:00:00.000Z",
                "updatedAt": "2021-01-01T00:00:00.000Z"
            }
        })
    }

    #[test]
    fn player_without_meta_has_no_session_fields() {
        let p = Player::from_resource(&player_json()).unwrap();
        assert_eq!(p.id, 42);
        assert_eq!(p.name, "Alice");
        assert_eq!(p.first_time, None);
        assert_eq!(p.score, None);
        assert_eq!(p.playtime, None);
        assert!(p.identifiers.is_empty());
    }

    #[test]
    fn player_meta_is_flattened() {
        let mut v = player_json();
        v["meta"] = json!({"metadata": [
            {"key": "score", "value": 7},
            {"key": "time", "value": 93.5},
            {"key": "firstTime", "value": true}
        ]});
        let p = Player::from_resource(&v).unwrap();
        assert_eq!(p.score, Some(7));
        assert_eq!(p.playtime, Some(93.5));
        assert_eq!(p.first_time, Some(true));
    }

    #[test]
    fn player_requires_name() {
        let mut v = player_json();
        v["attributes"].as_object_mut().unwrap().remove("name");
        assert!(matches!(Player::from_resource(&v), Err(Error::Decode(_))));
    }

    #[test]
    fn identifier_decoding() {
        let i = Identifier::from_resource(&json!({
            "type": "identifier",
            "id": "900",
            "attributes": {
                "type": "steamID",
                "identifier": "76561198000000000",
                "lastSeen": "2021-02-02T02:02:02.000Z",
                "private": true,
                "metadata": null
            },
            "relationships": {"player": {"data": {"type": "player", "id": "42"}}}
        }))
        .unwrap();
        assert_eq!(i.id, 900);
        assert_eq!(i.kind, IdentifierType::SteamId);
        assert_eq!(i.name.as_deref(), Some("76561198000000000"));
        assert_eq!(i.player_id, 42);
        assert!(i.private);
        assert!(i.metadata.is_empty());
    }

    #[test]
    fn identifier_type_names_round_trip() {
        for t in IdentifierType::ALL {
            assert_eq!(t.as_str().parse::<IdentifierType>().unwrap(), t);
        }
        assert!("discordID".parse::<IdentifierType>().is_err());
    }
}
