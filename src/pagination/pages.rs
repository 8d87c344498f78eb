use crate::error::Result;
use crate::models::{data_array, included, parse_id, Identifier, Player, Server, Session};
use serde_json::Value;
use std::collections::HashMap;

/// Turns one page document into records, resolving side-loaded relations
/// before each record is built.
pub trait PageDecoder {
    type Item;

    fn decode_page(&self, doc: &Value) -> Result<Vec<Self::Item>>;
}

/// Server listings: plain resources, no joins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerPage;

impl PageDecoder for ServerPage {
    type Item = Server;

    fn decode_page(&self, doc: &Value) -> Result<Vec<Server>> {
        data_array(doc)?.iter().map(Server::from_resource).collect()
    }
}

/// Player search: each player gets the included identifiers it owns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerPage;

impl PageDecoder for PlayerPage {
    type Item = Player;

    fn decode_page(&self, doc: &Value) -> Result<Vec<Player>> {
        let mut identifiers: HashMap<u64, Vec<Identifier>> = HashMap::new();
        for resource in included(doc, "identifier") {
            let identifier = Identifier::from_resource(resource)?;
            identifiers
                .entry(identifier.player_id)
                .or_default()
                .push(identifier);
        }

        data_array(doc)?
            .iter()
            .map(|resource| {
                let owned = resource
                    .get("id")
                    .and_then(parse_id)
                    .and_then(|id| identifiers.get(&id).cloned())
                    .unwrap_or_default();
                Player::with_identifiers(resource, owned)
            })
            .collect()
    }
}

/// Session history: each session gets its included server, when present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPage;

impl PageDecoder for SessionPage {
    type Item = Session;

    fn decode_page(&self, doc: &Value) -> Result<Vec<Session>> {
        let servers = included(doc, "server")
            .map(|resource| Server::from_resource(resource).map(|s| (s.id, s)))
            .collect::<Result<HashMap<u64, Server>>>()?;

        data_array(doc)?
            .iter()
            .map(|resource| {
                let server = crate::models::lookup(resource, &["relationships", "server", "data", "id"])
                    .and_then(parse_id)
                    .and_then(|id| servers.get(&id).cloned());
                Session::from_resource(resource, server)
            })
            .collect()
    }
}
