use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use api::{ApiClient, ApiConfig, SessionStore, UserFormData, UserStatus};
use clap::{Args, Parser, Subcommand};
use state::{Debouncer, Directory, ThemeStore};
use store::{ClientConfig, FileStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::ThemeAction;

#[derive(Parser)]
#[command(name = "usradm")]
#[command(about = "Manage the users of a user-management service", long_about = None)]
struct Cli {
    /// Config file (default: usradm.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        /// Read from USRADM_PASSWORD, else from the first line of stdin
        #[arg(long, env = "USRADM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the session token
    Logout,
    /// Show whether a session token is stored
    Status,
    /// List users, optionally filtered by the server
    Users {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one user
    Show { id: String },
    /// Create a user
    Create(UserArgs),
    /// Replace a user's fields
    Update {
        id: String,
        #[command(flatten)]
        fields: UserArgs,
    },
    /// Delete a user
    Delete { id: String },
    /// Show or change the theme preference
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },
}

#[derive(Args)]
struct UserArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: String,
    /// ACTIVE or LOCKED
    #[arg(long, default_value = "ACTIVE")]
    status: UserStatus,
    /// YYYY-MM-DD
    #[arg(long)]
    date_of_birth: String,
}

impl From<UserArgs> for UserFormData {
    fn from(args: UserArgs) -> Self {
        UserFormData {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            status: args.status,
            date_of_birth: args.date_of_birth,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = FileStore::default_dir();
    let config_path = cli
        .config
        .unwrap_or_else(|| data_dir.join(ClientConfig::filename()));
    let client_config = ClientConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let api_config = ApiConfig::from_env(&client_config)?;
    debug!(base_url = %api_config.base_url, "resolved API config");

    let storage = FileStore::new(data_dir);
    let session = SessionStore::new(storage.clone());
    session.initialize_auth();

    let client = ApiClient::from_config(&api_config, session).context("building HTTP client")?;
    let directory = Directory::new(client).with_debouncer(Debouncer::from_millis(
        client_config.directory.search_debounce_ms,
    ));
    let out = &mut io::stdout().lock();

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    eprint!("Password: ");
                    commands::read_password(&mut io::stdin().lock())?
                }
            };
            commands::login(directory.client(), &email, &password, out).await
        }
        Commands::Logout => commands::logout(directory.client(), out),
        Commands::Status => commands::status(directory.client(), out),
        Commands::Users { search } => commands::list_users(&directory, search.as_deref(), out).await,
        Commands::Show { id } => commands::show_user(directory.client(), &id, out).await,
        Commands::Create(fields) => commands::create_user(&directory, &fields.into(), out).await,
        Commands::Update { id, fields } => {
            commands::update_user(&directory, &id, &fields.into(), out).await
        }
        Commands::Delete { id } => commands::delete_user(&directory, &id, out).await,
        Commands::Theme { action } => {
            let mut themes = ThemeStore::new(&storage);
            commands::theme(&mut themes, action, out)
        }
    }
}
