use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::setup::{DEFAULT_COLLECTION, DEFAULT_DATABASE};

/// A `mongod` process the operator starts by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub host: String,
    pub port: u16,
    pub dbpath: String,
}

impl ServerSpec {
    pub fn new(host: &str, port: u16, dbpath: &str) -> Self {
        Self {
            host: host.into(),
            port,
            dbpath: dbpath.into(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Topology for the manual sharding procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunbookConfig {
    pub shards: Vec<ServerSpec>,
    pub config_servers: Vec<ServerSpec>,
    /// Host that runs `mongos`.
    pub router: String,
    pub chunk_size_mb: Option<u32>,
    pub database: String,
    pub collection: String,
    /// Field order is significant.
    pub shard_key: Vec<String>,
}

impl Default for RunbookConfig {
    fn default() -> Self {
        Self {
            shards: vec![
                ServerSpec::new("localhost", 10000, "/data/shard1"),
                ServerSpec::new("localhost", 10001, "/data/shard2"),
            ],
            config_servers: vec![ServerSpec::new("localhost", 20000, "/data/config")],
            router: "localhost".into(),
            chunk_size_mb: None,
            database: DEFAULT_DATABASE.into(),
            collection: DEFAULT_COLLECTION.into(),
            shard_key: vec!["GateExecID".into(), "TradeDateID".into(), "Timestamp".into()],
        }
    }
}

impl RunbookConfig {
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.shards.is_empty() {
            problems.push("runbook needs at least one shard".to_string());
        }
        if self.config_servers.is_empty() {
            problems.push("runbook needs at least one config server".to_string());
        }
        if self.shard_key.is_empty() {
            problems.push("runbook shard_key is empty".to_string());
        }
        if self.database.trim().is_empty() || self.collection.trim().is_empty() {
            problems.push("runbook database and collection must be set".to_string());
        }

        let mut seen = HashSet::new();
        for server in self.shards.iter().chain(&self.config_servers) {
            if server.port == 0 {
                problems.push(format!("{}: port 0 is not usable", server.host));
            }
            if !seen.insert(server.address()) {
                problems.push(format!("{} is listed more than once", server.address()));
            }
        }
        problems
    }
}

/// Render the operator procedure for standing up sharding on the configured
/// topology. Nothing here is executed.
pub fn render_runbook(config: &RunbookConfig) -> String {
    let namespace = format!("{}.{}", config.database, config.collection);
    let mut out = String::new();

    let _ = writeln!(out, "# Sharding runbook for {namespace}\n");

    let _ = writeln!(out, "1. Create data directories");
    let mut hosts: Vec<(&str, Vec<&str>)> = Vec::new();
    for server in config.shards.iter().chain(&config.config_servers) {
        match hosts.iter_mut().find(|(h, _)| *h == server.host) {
            Some((_, paths)) => paths.push(server.dbpath.as_str()),
            None => hosts.push((server.host.as_str(), vec![server.dbpath.as_str()])),
        }
    }
    for (host, paths) in &hosts {
        let _ = writeln!(out, "   [{host}] mkdir -p {}", paths.join(" "));
    }

    let _ = writeln!(out, "\n2. Start shard servers");
    for shard in &config.shards {
        let _ = writeln!(
            out,
            "   [{}] mongod --shardsvr --dbpath {} --port {}",
            shard.host, shard.dbpath, shard.port
        );
    }

    let _ = writeln!(out, "\n3. Start config servers");
    for cfg in &config.config_servers {
        let _ = writeln!(
            out,
            "   [{}] mongod --configsvr --dbpath {} --port {}",
            cfg.host, cfg.dbpath, cfg.port
        );
    }

    let config_db: Vec<String> = config.config_servers.iter().map(ServerSpec::address).collect();
    let chunk_size = config
        .chunk_size_mb
        .map(|mb| format!(" --chunkSize {mb}"))
        .unwrap_or_default();
    let _ = writeln!(out, "\n4. Start the router");
    let _ = writeln!(
        out,
        "   [{}] mongos --configdb {}{chunk_size}",
        config.router,
        config_db.join(",")
    );

    let _ = writeln!(out, "\n5. From a mongo shell connected to the router");
    let _ = writeln!(out, "   use admin");
    for shard in &config.shards {
        let _ = writeln!(out, "   db.runCommand({{ addshard: \"{}\" }})", shard.address());
    }
    let _ = writeln!(
        out,
        "   db.runCommand({{ enablesharding: \"{}\" }})",
        config.database
    );
    let key: Vec<String> = config.shard_key.iter().map(|f| format!("{f}: 1")).collect();
    let _ = writeln!(
        out,
        "   db.runCommand({{ shardcollection: \"{namespace}\", key: {{ {} }} }})",
        key.join(", ")
    );

    let _ = writeln!(out, "\n6. Create indexes with `shardstat init`");
    let _ = writeln!(
        out,
        "\nAfter dropping {}, enable sharding and shard {namespace} again, then re-create its indexes.",
        config.database
    );

    out
}
