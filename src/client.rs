use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{HttpClient, PathParam, ReqwestTransport, RequestOptions, Route, Transport};
use crate::limiter::Bucket;
use crate::models::{data_array, data_object, lookup, parse_id, DataPoint, IdentifierType, Player, Resolution, Server};
use crate::pagination::{Paginator, PlayerPage, ServerPage, SessionPage};
use crate::types::Params;
use crate::utils::{isoify_datetime, TimeRange};
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Identifier matching is limited by the service to one call per second.
pub const MATCH_PLAYERS_BUCKET: Bucket = Bucket::new("match_players", 1, Duration::from_secs(1));
pub const MAX_MATCH_IDENTIFIERS: usize = 100;

/// Typed access to the BattleMetrics API.
pub struct BattleMetricsClient<T: Transport = ReqwestTransport> {
    http: HttpClient<T>,
}

impl BattleMetricsClient<ReqwestTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            http: HttpClient::from_config(cfg)?,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&Config::from_env()?)
    }
}

/// Filters for [`BattleMetricsClient::list_players`].
#[derive(Debug, Clone)]
pub struct PlayerQuery {
    pub limit: usize,
    /// ISO 3166-1 alpha-2 country codes.
    pub countries: Vec<String>,
    /// Maximum server distance to the caller, in kilometres.
    pub distance: Option<i64>,
    /// Requires a token and `server_ids`.
    pub first_seen_after: Option<DateTime<Utc>>,
    /// Requires a token and `server_ids`.
    pub first_seen_before: Option<DateTime<Utc>>,
    pub game: Option<String>,
    pub include_identifiers: bool,
    pub is_online: bool,
    pub last_seen_after: Option<DateTime<Utc>>,
    pub last_seen_before: Option<DateTime<Utc>>,
    /// Requires `public == false`.
    pub online_at: Option<DateTime<Utc>>,
    /// Requires a token.
    pub organization_id: Option<u64>,
    /// When false only players on your own servers are returned; requires a token.
    pub public: bool,
    pub search: Option<String>,
    pub server_ids: Vec<u64>,
}

impl Default for PlayerQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            countries: Vec::new(),
            distance: None,
            first_seen_after: None,
            first_seen_before: None,
            game: None,
            include_identifiers: false,
            is_online: false,
            last_seen_after: None,
            last_seen_before: None,
            online_at: None,
            organization_id: None,
            public: true,
            search: None,
            server_ids: Vec::new(),
        }
    }
}

/// Filters for [`BattleMetricsClient::get_player_session_history`].
#[derive(Debug, Clone)]
pub struct SessionQuery {
    pub limit: usize,
    pub organization_ids: Vec<u64>,
    pub server_ids: Vec<u64>,
    /// Side-load each session's server.
    pub include_servers: bool,
}

impl SessionQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            organization_ids: Vec::new(),
            server_ids: Vec::new(),
            include_servers: true,
        }
    }
}

/// Filters for [`BattleMetricsClient::list_servers`].
#[derive(Debug, Clone)]
pub struct ServerQuery {
    pub limit: usize,
    pub search: Option<String>,
    pub game: Option<String>,
    pub countries: Vec<String>,
    /// `online`, `offline`, `dead` or `invalid`.
    pub status: Option<String>,
}

impl Default for ServerQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            search: None,
            game: None,
            countries: Vec::new(),
            status: None,
        }
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

fn check_limit(limit: usize) -> Result<()> {
    if limit < 1 {
        return Err(Error::validation("limit must be at least 1"));
    }
    Ok(())
}

fn sorted_datapoints(doc: &Value) -> Result<Vec<DataPoint>> {
    let mut points = data_array(doc)?
        .iter()
        .map(DataPoint::from_resource)
        .collect::<Result<Vec<_>>>()?;
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

impl<T: Transport> BattleMetricsClient<T> {
    pub fn new(transport: T, cfg: &Config) -> Self {
        Self {
            http: HttpClient::new(transport, cfg),
        }
    }

    /// The underlying request pipeline.
    pub fn http(&self) -> &HttpClient<T> {
        &self.http
    }

    fn route_get(&self, template: &str, params: &[(&str, PathParam)]) -> Route {
        Route::get(self.http.base_url(), template, params)
    }

    /// Server details, optionally with the players currently online.
    pub async fn get_server_info(&self, server_id: u64, include_players: bool) -> Result<Server> {
        let route = self.route_get("/servers/{server_id}", &[("server_id", server_id.into())]);
        let mut params = Params::new();
        if include_players {
            params.insert("include", "player");
        }
        let doc = self
            .http
            .request_json(&route, RequestOptions { params: Some(&params), ..Default::default() })
            .await?;
        Server::from_document(&doc)
    }

    /// Servers ordered by rank.
    pub fn list_servers(&self, query: ServerQuery) -> Result<Paginator<'_, T, ServerPage>> {
        check_limit(query.limit)?;
        let mut params = Params::new().with("sort", "rank");
        if let Some(search) = query.search {
            params.insert("filter[search]", search);
        }
        if let Some(game) = query.game {
            params.insert("filter[game]", game);
        }
        if !query.countries.is_empty() {
            params.insert("filter[countries][]", query.countries);
        }
        if let Some(status) = query.status {
            params.insert("filter[status]", status);
        }
        let route = self.route_get("/servers", &[]);
        Ok(Paginator::new(&self.http, route, params, query.limit, ServerPage))
    }

    pub async fn get_player_info(&self, player_id: u64) -> Result<Player> {
        let route = self.route_get("/players/{player_id}", &[("player_id", player_id.into())]);
        let doc = self.http.request_json(&route, RequestOptions::default()).await?;
        Player::from_resource(data_object(&doc)?)
    }

    /// Search players, most recently seen first.
    ///
    /// Several filters need a token or other filters; those combinations are
    /// checked here before any request goes out.
    pub fn list_players(&self, query: PlayerQuery) -> Result<Paginator<'_, T, PlayerPage>> {
        check_limit(query.limit)?;
        let authed = self.http.has_token();

        let mut params = Params::new().with("sort", "-lastSeen");
        if !query.countries.is_empty() {
            params.insert("filter[server][countries][]", query.countries);
        }
        if let Some(distance) = query.distance {
            if distance < 0 {
                return Err(Error::validation("distance cannot be negative"));
            }
            if distance > 0 {
                params.insert("filter[server][maxDistance]", distance.to_string());
            }
        }
        if query.first_seen_after.is_some() || query.first_seen_before.is_some() {
            let which = if query.first_seen_after.is_some() { "after" } else { "before" };
            if !authed {
                return Err(Error::validation(format!(
                    "authentication required for first_seen_{}",
                    which
                )));
            }
            if query.server_ids.is_empty() {
                return Err(Error::validation(format!(
                    "server_ids required for first_seen_{}",
                    which
                )));
            }
            params.insert(
                "filter[firstSeen]",
                format!(
                    "{}:{}",
                    query.first_seen_after.map(isoify_datetime).unwrap_or_default(),
                    query.first_seen_before.map(isoify_datetime).unwrap_or_default()
                ),
            );
        }
        if let Some(game) = query.game {
            params.insert("filter[server][game]", game);
        }
        if query.include_identifiers {
            params.insert("include", "identifier");
        }
        if query.is_online {
            params.insert("filter[online]", true);
        }
        if let Some(after) = query.last_seen_after {
            params.insert("filter[after]", isoify_datetime(after));
        }
        if let Some(before) = query.last_seen_before {
            params.insert("filter[before]", isoify_datetime(before));
        }
        if let Some(at) = query.online_at {
            if query.public {
                return Err(Error::validation("public=false required for online_at"));
            }
            params.insert("filter[sessions][at]", isoify_datetime(at));
        }
        if let Some(org) = query.organization_id {
            if !authed {
                return Err(Error::validation("authentication required for organization_id"));
            }
            params.insert("filter[organization]", org);
        }
        if !query.public {
            if !authed {
                return Err(Error::validation("authentication required for public=false"));
            }
            // The API defaults to public results.
            params.insert("filter[public]", false);
        }
        if let Some(search) = query.search {
            params.insert("filter[search]", search);
        }
        if !query.server_ids.is_empty() {
            params.insert("filter[servers]", join_ids(&query.server_ids));
        }

        let route = self.route_get("/players", &[]);
        Ok(Paginator::new(&self.http, route, params, query.limit, PlayerPage))
    }

    /// A player's sessions, most recent first.
    pub fn get_player_session_history(
        &self,
        player_id: u64,
        query: SessionQuery,
    ) -> Result<Paginator<'_, T, SessionPage>> {
        check_limit(query.limit)?;
        let mut params = Params::new();
        if !query.organization_ids.is_empty() {
            params.insert("filter[organizations]", join_ids(&query.organization_ids));
        }
        if !query.server_ids.is_empty() {
            params.insert("filter[servers]", join_ids(&query.server_ids));
        }
        if query.include_servers {
            params.insert("include", "server");
        }
        let route = self.route_get(
            "/players/{player_id}/relationships/sessions",
            &[("player_id", player_id.into())],
        );
        Ok(Paginator::new(&self.http, route, params, query.limit, SessionPage))
    }

    /// Player count history of a server, oldest first.
    pub async fn get_player_count_history(
        &self,
        server_id: u64,
        range: TimeRange,
        resolution: Resolution,
    ) -> Result<Vec<DataPoint>> {
        let route = self.route_get(
            "/servers/{server_id}/player-count-history",
            &[("server_id", server_id.into())],
        );
        let params = Params::new()
            .with("start", isoify_datetime(range.start))
            .with("stop", isoify_datetime(range.stop))
            .with("resolution", resolution.as_param());
        let doc = self
            .http
            .request_json(&route, RequestOptions { params: Some(&params), ..Default::default() })
            .await?;
        sorted_datapoints(&doc)
    }

    /// Daily time played by a player on one server, oldest first.
    /// Values are seconds.
    pub async fn get_player_time_played_history(
        &self,
        player_id: u64,
        server_id: u64,
        range: TimeRange,
    ) -> Result<Vec<DataPoint>> {
        let route = self.route_get(
            "/players/{player_id}/time-played-history/{server_id}",
            &[("player_id", player_id.into()), ("server_id", server_id.into())],
        );
        let params = Params::new()
            .with("start", isoify_datetime(range.start))
            .with("stop", isoify_datetime(range.stop));
        let doc = self
            .http
            .request_json(&route, RequestOptions { params: Some(&params), ..Default::default() })
            .await?;
        sorted_datapoints(&doc)
    }

    /// Resolve identifiers of one kind to player ids.
    ///
    /// Every requested identifier is present in the result; unmatched ones
    /// map to `None`. Needs a token with RCON view permission.
    pub async fn match_players<S: AsRef<str>>(
        &self,
        identifiers: &[S],
        kind: IdentifierType,
    ) -> Result<HashMap<String, Option<u64>>> {
        if identifiers.is_empty() {
            return Err(Error::validation("at least 1 identifier must be given"));
        }
        if identifiers.len() > MAX_MATCH_IDENTIFIERS {
            return Err(Error::validation(format!(
                "only {} identifiers can be requested at once",
                MAX_MATCH_IDENTIFIERS
            )));
        }

        let data: Vec<Value> = identifiers
            .iter()
            .map(|i| {
                json!({
                    "type": "identifier",
                    "attributes": {"type": kind.as_str(), "identifier": i.as_ref()}
                })
            })
            .collect();
        let body = json!({ "data": data });

        let route = Route::post(self.http.base_url(), "/players/match", &[]);
        let doc = self
            .http
            .request_json(
                &route,
                RequestOptions {
                    bucket: Some(&MATCH_PLAYERS_BUCKET),
                    json: Some(&body),
                    ..Default::default()
                },
            )
            .await?;

        let mut results: HashMap<String, Option<u64>> = identifiers
            .iter()
            .map(|i| (i.as_ref().to_string(), None))
            .collect();
        for entry in data_array(&doc)? {
            let identifier = lookup(entry, &["attributes", "identifier"])
                .and_then(Value::as_str)
                .ok_or_else(|| Error::decode("match result is missing attributes.identifier"))?;
            let player_id = lookup(entry, &["relationships", "player", "data", "id"])
                .and_then(parse_id)
                .ok_or_else(|| Error::decode("match result is missing its player id"))?;
            results.insert(identifier.to_string(), Some(player_id));
        }
        debug!(
            "matched {} of {} identifiers",
            results.values().filter(|v| v.is_some()).count(),
            results.len()
        );
        Ok(results)
    }

    /// Single-identifier form of [`match_players`](Self::match_players).
    pub async fn match_player(&self, identifier: &str, kind: IdentifierType) -> Result<Option<u64>> {
        let results = self.match_players(&[identifier], kind).await?;
        Ok(results.get(identifier).copied().flatten())
    }
}
