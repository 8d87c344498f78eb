//! Async client for the BattleMetrics API.
//!
//! All calls made through one [`BattleMetricsClient`] are serialized and
//! rate limited: locally by per-endpoint leaky buckets, remotely by obeying
//! `Retry-After`. Collection endpoints return lazy [`Paginator`]s.
//!
//! ```no_run
//! # async fn demo() -> battlemetrics::Result<()> {
//! use battlemetrics::{BattleMetricsClient, Config, ServerQuery};
//!
//! let client = BattleMetricsClient::from_config(&Config::from_env()?)?;
//! let server = client.get_server_info(3411152, true).await?;
//! println!("{} has {} players", server.name, server.player_count);
//!
//! let mut servers = client.list_servers(ServerQuery { limit: 25, ..Default::default() })?;
//! while let Some(s) = servers.next().await? {
//!     println!("{} {}", s.id, s.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod limiter;
pub mod models;
pub mod pagination;
pub mod types;
pub mod utils;

pub use client::{BattleMetricsClient, PlayerQuery, ServerQuery, SessionQuery};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{DataPoint, Identifier, IdentifierType, Player, Resolution, Server, Session};
pub use pagination::Paginator;
pub use utils::TimeRange;
