mod cli;

use anyhow::Context;
use battlemetrics::{
    BattleMetricsClient, Config, IdentifierType, PlayerQuery, Resolution, ServerQuery,
    SessionQuery, TimeRange,
};
use chrono::{Duration, Utc};
use clap::ArgMatches;
use serde::Serialize;
use std::collections::BTreeMap;

fn print_json<T: Serialize>(record: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

fn opt_string(m: &ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id).cloned()
}

fn server_ids(m: &ArgMatches) -> Vec<u64> {
    m.get_many::<u64>("server")
        .map(|ids| ids.copied().collect())
        .unwrap_or_default()
}

fn limit(m: &ArgMatches) -> usize {
    m.get_one::<usize>("limit").copied().unwrap_or(10)
}

async fn run(client: &BattleMetricsClient, name: &str, m: &ArgMatches) -> anyhow::Result<()> {
    match name {
        "server" => {
            let id = *m.get_one::<u64>("id").context("server id is required")?;
            print_json(&client.get_server_info(id, m.get_flag("players")).await?)?;
        }
        "servers" => {
            let query = ServerQuery {
                limit: limit(m),
                search: opt_string(m, "search"),
                game: opt_string(m, "game"),
                ..Default::default()
            };
            let mut servers = client.list_servers(query)?;
            while let Some(server) = servers.next().await? {
                print_json(&server)?;
            }
        }
        "player" => {
            let id = *m.get_one::<u64>("id").context("player id is required")?;
            print_json(&client.get_player_info(id).await?)?;
        }
        "players" => {
            let query = PlayerQuery {
                limit: limit(m),
                search: opt_string(m, "search"),
                game: opt_string(m, "game"),
                is_online: m.get_flag("online"),
                include_identifiers: m.get_flag("identifiers"),
                server_ids: server_ids(m),
                ..Default::default()
            };
            let mut players = client.list_players(query)?;
            while let Some(player) = players.next().await? {
                print_json(&player)?;
            }
        }
        "sessions" => {
            let player_id = *m.get_one::<u64>("player_id").context("player id is required")?;
            let query = SessionQuery {
                server_ids: server_ids(m),
                ..SessionQuery::new(limit(m))
            };
            let mut sessions = client.get_player_session_history(player_id, query)?;
            while let Some(session) = sessions.next().await? {
                print_json(&session)?;
            }
        }
        "player-count" => {
            let server_id = *m.get_one::<u64>("server_id").context("server id is required")?;
            let hours = m.get_one::<i64>("hours").copied().unwrap_or(1);
            let resolution: Resolution = m
                .get_one::<String>("resolution")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default();
            let stop = Utc::now();
            let range = TimeRange::new(stop - Duration::hours(hours), stop);
            for point in client.get_player_count_history(server_id, range, resolution).await? {
                print_json(&point)?;
            }
        }
        "time-played" => {
            let player_id = *m.get_one::<u64>("player_id").context("player id is required")?;
            let server_id = *m.get_one::<u64>("server_id").context("server id is required")?;
            let days = m.get_one::<i64>("days").copied().unwrap_or(7);
            let stop = Utc::now();
            let range = TimeRange::new(stop - Duration::days(days), stop);
            for point in client
                .get_player_time_played_history(player_id, server_id, range)
                .await?
            {
                print_json(&point)?;
            }
        }
        "match" => {
            let kind: IdentifierType = m
                .get_one::<String>("type")
                .map(String::as_str)
                .unwrap_or("steamID")
                .parse()?;
            let identifiers: Vec<String> = m
                .get_many::<String>("identifiers")
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default();
            let matched: BTreeMap<_, _> = client.match_players(&identifiers, kind).await?.into_iter().collect();
            for (identifier, player_id) in matched {
                print_json(&serde_json::json!({"identifier": identifier, "player_id": player_id}))?;
            }
        }
        other => anyhow::bail!("unknown command {other:?}"),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")] // requests are serialized per client anyway
async fn main() -> anyhow::Result<()> {
    let mut cmd = cli::build_cli();
    let matches = cmd.clone().get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("battlemetrics {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some((name, sub)) = matches.subcommand() else {
        cmd.print_help()?;
        return Ok(());
    };

    let cfg = Config::from_env()?;
    let client = BattleMetricsClient::from_config(&cfg)?;
    run(&client, name, sub).await
}
