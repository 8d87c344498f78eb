use battlemetrics::{BattleMetricsClient, Config, PlayerQuery, ServerQuery, SessionQuery};
use futures::TryStreamExt;
use httpmock::{Method::GET, MockServer};
use serde_json::{json, Value};

fn client(server: &MockServer, token: Option<&str>) -> BattleMetricsClient {
    let cfg = Config {
        token: token.map(str::to_string),
        api_url: server.base_url(),
        ..Config::default()
    };
    BattleMetricsClient::from_config(&cfg).unwrap()
}

fn server_json(id: u64) -> Value {
    json!({
        "type": "server",
        "id": id.to_string(),
        "attributes": {
            "name": format!("Server {}", id),
            "ip": "10.0.0.1",
            "port": 2302,
            "status": "online",
            "players": 1,
            "maxPlayers": 10,
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-02T00:00:00.000Z"
        }
    })
}

fn page(ids: &[u64], next: Option<String>) -> Value {
    let data: Vec<Value> = ids.iter().map(|id| server_json(*id)).collect();
    json!({"data": data, "links": {"next": next}})
}

#[tokio::test]
async fn limit_truncates_and_shrinks_page_size() {
    let server = MockServer::start_async().await;
    let next = format!("{}/servers?sort=rank&page%5Bkey%5D=second", server.base_url());
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/servers")
                .query_param("sort", "rank")
                .query_param("page[size]", "5");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page(&[1, 2, 3], Some(next.clone())));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/servers")
                .query_param("page[key]", "second")
                .query_param("page[size]", "2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page(&[4, 5, 6], Some(next.clone())));
        })
        .await;

    let c = client(&server, None);
    let servers = c
        .list_servers(ServerQuery { limit: 5, ..Default::default() })
        .unwrap()
        .flatten()
        .await
        .unwrap();
    let ids: Vec<u64> = servers.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;
}

#[tokio::test]
async fn empty_first_page_yields_nothing() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/servers");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [], "links": {"next": "https://elsewhere.invalid/servers?page%5Bkey%5D=x"}}));
        })
        .await;
    let c = client(&server, None);
    let mut pager = c.list_servers(ServerQuery::default()).unwrap();
    assert!(pager.next().await.unwrap().is_none());
    assert!(pager.is_exhausted());
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn stream_view_follows_links() {
    let server = MockServer::start_async().await;
    let next = format!("{}/servers?page%5Bkey%5D=2", server.base_url());
    server
        .mock_async(|when, then| {
            when.method(GET).path("/servers").query_param("page[key]", "2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page(&[3], None));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/servers").query_param("sort", "rank");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(page(&[1, 2], Some(next.clone())));
        })
        .await;
    let c = client(&server, None);
    let all: Vec<_> = c
        .list_servers(ServerQuery { limit: 100, ..Default::default() })
        .unwrap()
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn country_filters_are_sent_as_repeated_keys() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/players")
                .query_param("filter[server][countries][]", "US")
                .query_param("filter[server][countries][]", "CA")
                .query_param("sort", "-lastSeen")
                .query_param("page[size]", "10");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [], "links": {}}));
        })
        .await;
    let c = client(&server, None);
    let players = c
        .list_players(PlayerQuery {
            countries: vec!["US".into(), "CA".into()],
            ..Default::default()
        })
        .unwrap()
        .flatten()
        .await
        .unwrap();
    assert!(players.is_empty());
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn session_history_attaches_servers() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/players/77/relationships/sessions")
                .query_param("include", "server");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": [{
                        "type": "session",
                        "id": "abc",
                        "attributes": {
                            "name": "Alice",
                            "start": "2021-01-01T10:00:00.000Z",
                            "stop": null
                        },
                        "relationships": {
                            "player": {"data": {"type": "player", "id": "77"}},
                            "server": {"data": {"type": "server", "id": "5"}}
                        }
                    }],
                    "included": [server_json(5)],
                    "links": {}
                }));
        })
        .await;
    let c = client(&server, None);
    let sessions = c
        .get_player_session_history(77, SessionQuery::new(10))
        .unwrap()
        .flatten()
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].server.as_ref().map(|s| s.name.as_str()), Some("Server 5"));
    assert_eq!(sessions[0].playtime(), 0.0);
}

fn player_json(id: u64) -> Value {
    json!({
        "type": "player",
        "id": id.to_string(),
        "attributes": {
            "name": format!("player-{}", id),
            "createdAt": "2020-01-01T00:00:00.000Z",
            "updatedAt": "2020-01-01T00:00:00.000Z"
        }
    })
}

fn identifier_json(id: u64, player_id: u64) -> Value {
    json!({
        "type": "identifier",
        "id": id.to_string(),
        "attributes": {
            "type": "name",
            "identifier": format!("alias-{}", player_id),
            "lastSeen": "2021-01-01T00:00:00.000Z"
        },
        "relationships": {"player": {"data": {"type": "player", "id": player_id.to_string()}}}
    })
}

fn player_page(ids: &[u64], next: &str) -> Value {
    let data: Vec<Value> = ids.iter().map(|id| player_json(*id)).collect();
    let included: Vec<Value> = ids.iter().map(|id| identifier_json(id + 100, *id)).collect();
    json!({"data": data, "included": included, "links": {"next": next}})
}

#[tokio::test]
async fn player_search_respects_limit_across_pages() {
    let server = MockServer::start_async().await;
    let next = format!("{}/players?sort=-lastSeen&page%5Bkey%5D=more", server.base_url());
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/players")
                .query_param("include", "identifier")
                .query_param("page[size]", "5");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(player_page(&[1, 2, 3], &next));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/players")
                .query_param("page[key]", "more")
                .query_param("page[size]", "2");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(player_page(&[4, 5, 6], &next));
        })
        .await;

    let c = client(&server, None);
    let players = c
        .list_players(PlayerQuery {
            limit: 5,
            include_identifiers: true,
            ..Default::default()
        })
        .unwrap()
        .flatten()
        .await
        .unwrap();
    assert_eq!(players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    for p in &players {
        assert_eq!(p.identifiers.len(), 1);
        assert_eq!(p.identifiers[0].player_id, p.id);
        assert_eq!(p.identifiers[0].name.as_deref(), Some(format!("alias-{}", p.id).as_str()));
    }
    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;
}
