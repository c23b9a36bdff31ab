use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use consult_desk_lib::config::{self, ConsultConfig, PartialConfig, PartialServerSettings};
use consult_desk_lib::server::{self, generate_auth_token, ServerAppState};
use consult_desk_lib::shutdown::{self, ShutdownState};
use std::path::PathBuf;

/// Consult Desk - persona-driven stakeholder consultation server
#[derive(Parser, Debug)]
#[command(name = "consult-desk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP/WebSocket server
    Serve(ServeArgs),

    /// Print the resolved configuration and converter availability
    Check {
        /// Config file layered over the global one
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Port to bind the server to
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind the server to
    #[arg(long)]
    bind: Option<String>,

    /// Config file layered over the global one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allowed CORS origin (repeatable); any origin when omitted
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,

    /// Fixed auth token (or set CONSULT_SERVER_TOKEN env var)
    /// If not provided, a random token is generated on each startup
    #[arg(long, env = "CONSULT_SERVER_TOKEN")]
    token: Option<String>,
}

impl ServeArgs {
    /// Flags as the highest-priority config layer
    fn to_partial(&self) -> Option<PartialConfig> {
        if self.port.is_none() && self.bind.is_none() && self.cors_origins.is_empty() {
            return None;
        }

        Some(PartialConfig {
            server: Some(PartialServerSettings {
                bind: self.bind.clone(),
                port: self.port,
                cors_origins: (!self.cors_origins.is_empty()).then(|| self.cors_origins.clone()),
            }),
            ..Default::default()
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Check { config } => run_check(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let config = config::load_config(args.config.as_deref(), args.to_partial())?;
    let (bind, port) = (config.server.bind.clone(), config.server.port);
    let cors_origins = config.server.cors_origins.clone();

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async move {
        let shutdown_state = ShutdownState::new();
        if let Err(e) = shutdown::register_signal_handlers(shutdown_state.clone()) {
            log::warn!("Failed to register signal handlers: {}", e);
        }

        // Use provided token or generate a random one
        let auth_token = args.token.unwrap_or_else(generate_auth_token);

        let state = ServerAppState::from_config(auth_token, config, shutdown_state.clone())
            .map_err(|e| anyhow!(e))?;
        let manager = state.manager.clone();

        let served = server::run_server(port, &bind, state, &cors_origins).await;

        shutdown::handle_shutdown(&shutdown_state, || shutdown::close_consultations(&manager));

        served.map_err(|e| anyhow!(e))
    })
}

fn run_check(config_path: Option<PathBuf>) -> Result<()> {
    let config: ConsultConfig = config::load_config(config_path.as_deref(), None)?;

    let rendered = toml::to_string_pretty(&redacted(&config))
        .context("Failed to render configuration")?;
    println!("{}", rendered);

    let converter = &config.report.pdf_command;
    match which::which(converter) {
        Ok(path) => println!("PDF converter: {} ({})", converter, path.display()),
        Err(_) => println!("PDF converter: {} (not found on PATH)", converter),
    }

    let store = if config.store.is_configured() {
        "configured"
    } else {
        "not configured (saving and admin listing disabled)"
    };
    println!("Store: {}", store);

    Ok(())
}

/// Copy of the config with the store key masked
fn redacted(config: &ConsultConfig) -> ConsultConfig {
    let mut shown = config.clone();
    if shown.store.api_key.is_some() {
        shown.store.api_key = Some("********".to_string());
    }
    shown
}
