use super::{Fields, Server};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One stretch of time a player spent on a server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    pub player_id: u64,
    pub player_name: String,
    pub server_id: u64,
    pub first_time: bool,
    // The service occasionally omits either bound.
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
    pub server: Option<Server>,
}

impl Session {
    /// Decode with the session's server, if it was side-loaded.
    pub fn from_resource(resource: &Value, server: Option<Server>) -> Result<Self> {
        let f = Fields::new("Session", resource);
        Ok(Self {
            id: f.required(&["id"])?,
            player_id: f.required_id(&["relationships", "player", "data", "id"])?,
            player_name: f.required(&["attributes", "name"])?,
            server_id: f.required_id(&["relationships", "server", "data", "id"])?,
            first_time: f.or_default(&["attributes", "firstTime"])?,
            start: f.optional_datetime(&["attributes", "start"])?,
            stop: f.optional_datetime(&["attributes", "stop"])?,
            server,
        })
    }

    /// Session length in seconds; zero while either bound is unknown.
    pub fn playtime(&self) -> f64 {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => (stop - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
pub(crate) fn session_json(id: &str, player_id: u64, server_id: u64) -> Value {
    serde_json::json!({
        "type": "session",
        "id": id,
        "attributes": {
            "name": "Alice",
            "firstTime": false,
            "start": "2021-01-01T10:00:00.000Z",
            "stop": "2021-01-01T11:30:00.000Z"
        },
        "relationships": {
            "player": {"data": {"type": "player", "id": player_id.to_string()}},
            "server": {"data": {"type": "server", "id": server_id.to_string()}}
        }
    })
}
