use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Service configuration, read from the environment (a `.env` file is
/// loaded first when present).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite archive written by the station's collection engine. Opened
    /// read-only on every request.
    pub database: PathBuf,
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = env::var("SKYREPORT_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("weewx.sdb"));

        let bind = env::var("SKYREPORT_BIND")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .context("SKYREPORT_BIND is not a valid socket address")?;

        Ok(Self { database, bind })
    }
}
