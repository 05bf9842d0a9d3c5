//! Command-line interface.

use std::fmt::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;
use crate::lifecycle::startup::{self, StartupError, StartupOptions};
use crate::routing::RouteTable;
use crate::routing::web::web_routes;

#[derive(Parser, Debug)]
#[command(name = "league-web")]
#[command(about = "League management web backend", long_about = None)]
pub struct Cli {
    /// Server configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dotenv file supplementing the process environment
    #[arg(short, long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve HTTP until SIGINT or SIGTERM (default)
    Serve,
    /// Print a resolved settings domain or value as JSON
    #[command(name = "config:show")]
    ConfigShow {
        /// Domain name (`session`) or dotted path (`session.cookie`)
        path: String,
    },
    /// List named routes with their gates
    #[command(name = "route:list")]
    RouteList,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("no configuration value at {0:?}")]
    UnknownPath(String),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Cli {
    fn options(&self) -> StartupOptions {
        StartupOptions {
            config_path: self.config.clone(),
            env_file: self.env_file.clone(),
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let options = cli.options();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => startup::serve(options).await?,
        Commands::ConfigShow { path } => {
            let (_, settings) = startup::load(&options)?;
            println!("{}", show_config(&settings, &path)?);
        }
        Commands::RouteList => {
            let routes = web_routes().map_err(StartupError::from)?;
            print!("{}", route_list(&routes));
        }
    }
    Ok(())
}

/// Pretty JSON for a domain name or `domain.dotted.path`.
pub fn show_config(settings: &Settings, path: &str) -> Result<String, CliError> {
    let value: Value = match settings.domain(path) {
        Some(domain) => domain.to_value(),
        None => settings
            .get(path)
            .cloned()
            .ok_or_else(|| CliError::UnknownPath(path.to_string()))?,
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// One aligned row per route, in match order.
pub fn route_list(routes: &RouteTable) -> String {
    let rows: Vec<[String; 5]> = routes
        .iter()
        .map(|route| {
            let methods = route
                .method
                .allowed()
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("|");
            let gates = route
                .gates
                .iter()
                .map(|g| g.as_str())
                .collect::<Vec<_>>()
                .join(",");
            [
                methods,
                route.pattern.as_str().to_string(),
                route.name.clone(),
                route.handler.to_string(),
                gates,
            ]
        })
        .collect();

    let header = ["METHOD", "URI", "NAME", "ACTION", "MIDDLEWARE"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 5]| {
        let mut text = String::new();
        for (i, cell) in cells.iter().enumerate() {
            let _ = write!(text, "{:<width$}  ", cell, width = widths[i]);
        }
        out.push_str(text.trim_end());
        out.push('\n');
    };
    line(header);
    for row in &rows {
        line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]);
    }
    out
}
