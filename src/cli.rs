use clap::{value_parser, Arg, ArgAction, Command};

fn limit_arg() -> Arg {
    Arg::new("limit")
        .long("limit")
        .num_args(1)
        .default_value("10")
        .value_parser(value_parser!(usize))
        .help("Maximum number of records to print")
}

fn server_ids_arg() -> Arg {
    Arg::new("server")
        .long("server")
        .num_args(1)
        .action(ArgAction::Append)
        .value_parser(value_parser!(u64))
        .help("Restrict to this server id (repeatable)")
}

pub fn build_cli() -> Command {
    Command::new("battlemetrics")
        .about("Query the BattleMetrics API and print records as JSON lines")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("server")
                .about("Show one server")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(u64)))
                .arg(
                    Arg::new("players")
                        .long("players")
                        .action(ArgAction::SetTrue)
                        .help("Include the players currently online"),
                ),
        )
        .subcommand(
            Command::new("servers")
                .about("List servers by rank")
                .arg(Arg::new("search").long("search").num_args(1))
                .arg(Arg::new("game").long("game").num_args(1))
                .arg(limit_arg()),
        )
        .subcommand(
            Command::new("player")
                .about("Show one player")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(u64))),
        )
        .subcommand(
            Command::new("players")
                .about("Search players, most recently seen first")
                .arg(Arg::new("search").long("search").num_args(1))
                .arg(Arg::new("game").long("game").num_args(1))
                .arg(
                    Arg::new("online")
                        .long("online")
                        .action(ArgAction::SetTrue)
                        .help("Only players currently online"),
                )
                .arg(
                    Arg::new("identifiers")
                        .long("identifiers")
                        .action(ArgAction::SetTrue)
                        .help("Include each player's identifiers"),
                )
                .arg(server_ids_arg())
                .arg(limit_arg()),
        )
        .subcommand(
            Command::new("sessions")
                .about("Show a player's session history")
                .arg(Arg::new("player_id").required(true).value_parser(value_parser!(u64)))
                .arg(server_ids_arg())
                .arg(limit_arg()),
        )
        .subcommand(
            Command::new("player-count")
                .about("Show a server's player count history")
                .arg(Arg::new("server_id").required(true).value_parser(value_parser!(u64)))
                .arg(
                    Arg::new("hours")
                        .long("hours")
                        .num_args(1)
                        .default_value("1")
                        .value_parser(value_parser!(i64).range(1..))
                        .help("How far back to look"),
                )
                .arg(
                    Arg::new("resolution")
                        .long("resolution")
                        .num_args(1)
                        .default_value("raw")
                        .help("raw, 30, 60 or 1440"),
                ),
        )
        .subcommand(
            Command::new("time-played")
                .about("Show a player's daily time played on one server")
                .arg(Arg::new("player_id").required(true).value_parser(value_parser!(u64)))
                .arg(Arg::new("server_id").required(true).value_parser(value_parser!(u64)))
                .arg(
                    Arg::new("days")
                        .long("days")
                        .num_args(1)
                        .default_value("7")
                        .value_parser(value_parser!(i64).range(1..))
                        .help("How far back to look"),
                ),
        )
        .subcommand(
            Command::new("match")
                .about("Resolve identifiers to player ids (needs a token)")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .num_args(1)
                        .default_value("steamID")
                        .help("Identifier type, e.g. steamID, name, BEGUID"),
                )
                .arg(Arg::new("identifiers").required(true).num_args(1..)),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_repeated_server_filters() {
        let m = build_cli()
            .try_get_matches_from(["battlemetrics", "players", "--server", "1", "--server", "2", "--online"])
            .unwrap();
        let (name, sub) = m.subcommand().unwrap();
        assert_eq!(name, "players");
        let ids: Vec<u64> = sub.get_many::<u64>("server").unwrap().copied().collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(sub.get_flag("online"));
        assert_eq!(sub.get_one::<usize>("limit"), Some(&10));
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(build_cli()
            .try_get_matches_from(["battlemetrics", "server", "abc"])
            .is_err());
    }
}
