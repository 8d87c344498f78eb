use battlemetrics::{
    BattleMetricsClient, Config, Error, IdentifierType, PlayerQuery, Resolution, TimeRange,
};
use chrono::{TimeZone, Utc};
use httpmock::{Method::GET, Method::POST, MockServer};
use serde_json::{json, Value};

fn client(server: &MockServer, token: Option<&str>) -> BattleMetricsClient {
    let cfg = Config {
        token: token.map(str::to_string),
        api_url: server.base_url(),
        ..Config::default()
    };
    BattleMetricsClient::from_config(&cfg).unwrap()
}

fn point(minute: u32, value: i64) -> Value {
    json!({
        "type": "dataPoint",
        "attributes": {
            "timestamp": format!("2021-05-01T12:{:02}:00.000Z", minute),
            "value": value
        }
    })
}

#[tokio::test]
async fn player_count_history_for_one_hour() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/servers/42/player-count-history")
                .query_param("start", "2021-05-01T12:00:00Z")
                .query_param("stop", "2021-05-01T13:00:00Z")
                .query_param("resolution", "raw");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [point(50, 9), point(10, 4), point(30, 7), point(0, 2)]}));
        })
        .await;
    let c = client(&server, None);
    let stop = Utc.with_ymd_and_hms(2021, 5, 1, 13, 0, 0).unwrap();
    let points = c
        .get_player_count_history(42, TimeRange::last_hour(stop), Resolution::Raw)
        .await
        .unwrap();
    assert_eq!(points.len(), 4);
    assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(points.iter().map(|p| p.value).collect::<Vec<_>>(), vec![2, 4, 7, 9]);
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn time_played_history_uses_both_ids() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/players/7/time-played-history/42")
                .query_param("start", "2021-05-01T00:00:00Z");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [point(0, 3600)]}));
        })
        .await;
    let c = client(&server, None);
    let range = TimeRange::builder()
        .after(Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap())
        .before(Utc.with_ymd_and_hms(2021, 5, 8, 0, 0, 0).unwrap())
        .build()
        .unwrap();
    let points = c.get_player_time_played_history(7, 42, range).await.unwrap();
    assert_eq!(points[0].value, 3600);
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn server_info_with_players() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/servers/42").query_param("include", "player");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": {
                        "type": "server",
                        "id": "42",
                        "attributes": {
                            "name": "Main",
                            "ip": "10.0.0.1",
                            "port": 2302,
                            "status": "online",
                            "players": 1,
                            "maxPlayers": 10,
                            "createdAt": "2020-01-01T00:00:00.000Z",
                            "updatedAt": "2020-01-02T00:00:00.000Z"
                        }
                    },
                    "included": [{
                        "type": "player",
                        "id": "7",
                        "attributes": {
                            "name": "Alice",
                            "createdAt": "2020-01-01T00:00:00.000Z",
                            "updatedAt": "2020-01-01T00:00:00.000Z"
                        }
                    }]
                }));
        })
        .await;
    let c = client(&server, None);
    let s = c.get_server_info(42, true).await.unwrap();
    assert_eq!(s.name, "Main");
    assert_eq!(s.players.len(), 1);
    assert_eq!(s.players[0].name, "Alice");
}

#[tokio::test]
async fn match_players_posts_identifiers() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/players/match")
                .header("authorization", "Bearer tok")
                .header("content-type", "application/json")
                .body_contains(r#""identifier":"76561198000000001""#)
                .body_contains(r#""type":"steamID""#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": [{
                    "type": "identifier",
                    "attributes": {"type": "steamID", "identifier": "76561198000000001"},
                    "relationships": {"player": {"data": {"type": "player", "id": "1001"}}}
                }]}));
        })
        .await;
    let c = client(&server, Some("tok"));
    let found = c
        .match_player("76561198000000001", IdentifierType::SteamId)
        .await
        .unwrap();
    assert_eq!(found, Some(1001));
    m.assert_hits_async(1).await;
}

#[tokio::test]
async fn invalid_queries_never_reach_the_network() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(500);
        })
        .await;
    let c = client(&server, None);
    let err = c
        .list_players(PlayerQuery { public: false, ..Default::default() })
        .err()
        .unwrap();
    assert!(matches!(err, Error::Validation(_)));
    let none: [&str; 0] = [];
    assert!(matches!(
        c.match_players(&none, IdentifierType::Name).await,
        Err(Error::Validation(_))
    ));
    any.assert_hits_async(0).await;
}
