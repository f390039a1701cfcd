//! Command-line front end for the SLDB client
//!
//! Loads configuration, performs a single SLDB call, and prints the decoded
//! result as JSON on stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sldb_client::config::{require_credentials, AppConfig};
use sldb_client::{GameType, SldbClient};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// SLDB Client - query the SLDB skill-rating service
#[derive(Parser)]
#[command(
    name = "sldb-client",
    version,
    about = "Query the SLDB skill-rating service over XML-RPC",
    long_about = "Issues a single authenticated call against an SLDB instance and prints the \
                 decoded result (skills, match skill changes, leaderboards, player stats, \
                 preferences) as JSON."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// SLDB host override
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// SLDB port override
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// SLDB login override
    #[arg(short, long, value_name = "LOGIN")]
    username: Option<String>,

    /// SLDB password override (prefer SLDB_PASSWORD)
    #[arg(long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Trace every request and reply
    #[arg(short, long)]
    verbose: bool,

    /// Validate configuration and exit without calling SLDB
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read a preference of an account
    GetPref {
        account_id: u64,
        pref_name: String,
    },
    /// Set a preference of an account (omit the value to reset it)
    SetPref {
        account_id: u64,
        pref_name: String,
        value: Option<String>,
    },
    /// Fetch skills of one or more accounts
    Skills {
        #[arg(short, long, default_value = "BA")]
        mod_name: String,
        #[arg(required = true)]
        account_ids: Vec<u64>,
    },
    /// Fetch skill changes of the players of one or more matches
    MatchSkills {
        #[arg(required = true)]
        match_ids: Vec<String>,
    },
    /// Fetch leaderboards (Duel, FFA, Team, TeamFFA, Global)
    Leaderboards {
        #[arg(short, long, default_value = "BA")]
        mod_name: String,
        #[arg(required = true)]
        game_types: Vec<GameType>,
    },
    /// Fetch win/loss/undecided counts of an account
    PlayerStats {
        #[arg(short, long, default_value = "BA")]
        mod_name: String,
        account_id: u64,
    },
    /// Fetch skill graphs of an account
    SkillGraphs {
        #[arg(short, long, default_value = "BA")]
        mod_name: String,
        account_id: u64,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if let Some(host) = &args.host {
        config.sldb.host = host.clone();
    }
    if let Some(port) = args.port {
        config.sldb.port = port;
    }
    if let Some(username) = &args.username {
        config.sldb.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.sldb.password = password.clone();
    }
    if args.verbose {
        config.sldb.verbose = true;
    }

    sldb_client::config::validate_config(&config)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &SldbClient, command: Command) -> Result<()> {
    match command {
        Command::GetPref {
            account_id,
            pref_name,
        } => print_json(&client.get_pref(account_id, &pref_name).await?),
        Command::SetPref {
            account_id,
            pref_name,
            value,
        } => {
            client
                .set_pref(account_id, &pref_name, value.as_deref())
                .await?;
            info!("Preference {} updated for account {}", pref_name, account_id);
            Ok(())
        }
        Command::Skills {
            mod_name,
            account_ids,
        } => print_json(&client.get_skills(&mod_name, &account_ids).await?),
        Command::MatchSkills { match_ids } => {
            let match_ids: Vec<&str> = match_ids.iter().map(String::as_str).collect();
            print_json(&client.get_match_skills(&match_ids).await?)
        }
        Command::Leaderboards {
            mod_name,
            game_types,
        } => print_json(&client.get_leaderboards(&mod_name, &game_types).await?),
        Command::PlayerStats {
            mod_name,
            account_id,
        } => print_json(&client.get_player_stats(&mod_name, account_id).await?),
        Command::SkillGraphs {
            mod_name,
            account_id,
        } => print_json(&client.get_player_skill_graphs(&mod_name, account_id).await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Loaded configuration: {:?}", config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("   Service: {}", config.service.name);
        info!("   SLDB: {}", config.sldb.endpoint_url());
        info!("   Verbose: {}", config.sldb.verbose);
        return Ok(());
    }

    let Some(command) = args.command else {
        error!("No command given; see --help");
        std::process::exit(2);
    };

    if let Err(e) = require_credentials(&config.sldb) {
        error!("{}", e);
        std::process::exit(1);
    }

    let client = SldbClient::new(&config.sldb)?;
    if let Err(e) = run(&client, command).await {
        error!("SLDB call failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
