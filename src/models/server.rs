use super::{data_object, included, Fields, Player};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    /// Hostname, e.g. `play.example.com`.
    pub address: Option<String>,
    pub ip: String,
    pub port: u16,
    pub query_port: Option<u16>,
    pub country: Option<String>,
    /// `online`, `offline`, `dead` or `invalid`.
    pub status: String,
    pub player_count: u32,
    pub max_players: u32,
    pub rank: Option<u32>,
    pub private: bool,
    /// Game specific settings such as map or version.
    pub details: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only filled when players were requested.
    pub players: Vec<Player>,
}

impl Server {
    pub fn from_resource(resource: &Value) -> Result<Self> {
        Self::with_players(resource, Vec::new())
    }

    pub fn with_players(resource: &Value, players: Vec<Player>) -> Result<Self> {
        let f = Fields::new("Server", resource);
        Ok(Self {
            id: f.required_id(&["id"])?,
            name: f.required(&["attributes", "name"])?,
            address: f.optional(&["attributes", "address"])?,
            ip: f.required(&["attributes", "ip"])?,
            port: f.required(&["attributes", "port"])?,
            query_port: f.optional(&["attributes", "portQuery"])?,
            country: f.optional(&["attributes", "country"])?,
            status: f.required(&["attributes", "status"])?,
            player_count: f.required(&["attributes", "players"])?,
            max_players: f.required(&["attributes", "maxPlayers"])?,
            rank: f.optional(&["attributes", "rank"])?,
            private: f.or_default(&["attributes", "private"])?,
            details: f.object_or_empty(&["attributes", "details"]),
            created_at: f.required_datetime(&["attributes", "createdAt"])?,
            updated_at: f.required_datetime(&["attributes", "updatedAt"])?,
            players,
        })
    }

    /// Decode a single-server document, attaching any included players.
    pub fn from_document(doc: &Value) -> Result<Self> {
        let players = included(doc, "player")
            .map(Player::from_resource)
            .collect::<Result<Vec<_>>>()?;
        Self::with_players(data_object(doc)?, players)
    }
}

#[cfg(test)]
pub(crate) fn server_json(id: u64) -> Value {
    serde_json::json!({
        "type": "server",
        "id": id.to_string(),
        "attributes": {
            "id": id.to_string(),
            "name": format!("Server {}", id),
            "address": null,
            "ip": "127.0.0.1",
            "port": 2302,
            "portQuery": 2303,
            "country": "US",
            "status": "online",
            "players": 3,
            "maxPlayers": 64,
            "rank": 100,
            "private": false,
            "details": {"map": "Altis"},
            "createdAt": "2019-01-01T00:00:00.000Z",
            "updatedAt": "2021-01-01T00:00:00.000Z"
        }
    })
}
