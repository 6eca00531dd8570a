//! Board CLI - command-line front end for the refresh board
//!
//! Keeps the signed-in credential in a file so successive invocations share
//! one session, and refreshes it transparently when an admin invalidates it.

use anyhow::{anyhow, Context, Result};
use board_client::{BoardClient, ClientError, FileKeyValueStore};
use board_core::{init_logging, BoardConfig, LoggingConfig, Role};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "board")]
#[command(about = "Talk to a refresh board server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL, e.g. http://127.0.0.1:3333/api
    #[arg(long)]
    base_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new name
    Register { name: String },

    /// Sign in and keep the credential
    Login { name: String },

    /// Forget the stored credential
    Logout,

    /// Show who the stored credential belongs to
    Whoami,

    /// Fetch the greeting for the signed-in user
    Welcome,

    /// List all users (admin only)
    Users,

    /// Change a user's role (admin only)
    SetRole {
        name: String,
        /// user, superuser or admin
        role: Role,
    },

    /// Read the message board (superuser or admin)
    Messages,

    /// Post a message
    Post { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    init_logging(&LoggingConfig::default().with_level(level))
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env_overrides();
    if let Some(base_url) = cli.base_url {
        config.client.base_url = base_url;
    }
    config.validate()?;

    let client = build_client(&config)?;
    debug!("Using {}", config.client.base_url);

    let result = run(cli.command, &client).await;
    let must_sign_in = result
        .as_ref()
        .err()
        .and_then(|e| e.downcast_ref::<ClientError>())
        .is_some_and(ClientError::requires_sign_in);
    if must_sign_in {
        eprintln!("Not signed in or session no longer valid; run `board login <name>`.");
    }
    result
}

async fn run(command: Commands, client: &BoardClient) -> Result<()> {
    match command {
        Commands::Register { name } => {
            client.register(&name).await?;
            println!("Registered {}. Sign in with `board login {}`.", name, name);
        }
        Commands::Login { name } => {
            let user = client.sign_in(&name).await?;
            println!("Signed in as {} ({})", user.name, user.role);
        }
        Commands::Logout => {
            client.sign_out()?;
            println!("Signed out");
        }
        Commands::Whoami => match client.current_user() {
            Some(claims) => println!("{} ({})", claims.name, claims.role),
            None => println!("Not signed in"),
        },
        Commands::Welcome => {
            println!("{}", client.welcome().await?);
        }
        Commands::Users => {
            for user in client.list_users().await? {
                let marker = if user.must_refresh { " *" } else { "" };
                println!("{:<20} {}{}", user.name, user.role, marker);
            }
        }
        Commands::SetRole { name, role } => {
            let user = client.set_role(&name, role).await?;
            println!("{} is now {}; their session must be refreshed", user.name, user.role);
        }
        Commands::Messages => {
            let messages = client.list_messages().await?;
            if messages.is_empty() {
                println!("No messages yet");
            }
            for message in messages {
                println!("{}: {}", message.sender, message.content);
            }
        }
        Commands::Post { text } => {
            let message = client.post_message(&text).await?;
            info!("Posted message {}", message.id);
            println!("Posted");
        }
    }

    Ok(())
}

fn build_client(config: &BoardConfig) -> Result<BoardClient> {
    let path = match &config.client.credential_file {
        Some(path) => path.clone(),
        None => FileKeyValueStore::default_path()
            .context("No config directory available for the credential file")?,
    };
    debug!("Credential file: {}", path.display());

    let backend = Arc::new(FileKeyValueStore::new(path));
    Ok(BoardClient::http(&config.client, backend)?)
}

fn load_config(config_path: Option<&Path>) -> Result<BoardConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return Ok(BoardConfig::from_file(path)?);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("refresh-board").join("config.toml")),
        Some(PathBuf::from("board.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return Ok(BoardConfig::from_file(path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(BoardConfig::default())
}
