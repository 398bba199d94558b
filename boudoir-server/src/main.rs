use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use boudoir_lib::model::NewUser;
use boudoir_lib::model::Role;
use boudoir_server::Server;
use boudoir_server::ServerConfig;
use boudoir_server::ServerError;
use boudoir_server::open_marketplace;
use boudoir_server::paths;
use clap::Parser;
use clap::Subcommand;
use log::LevelFilter;
use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::SharedLogger;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "boudoir-server")]
#[command(about = "Le Boudoir du Boubou marketplace API server", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database file (`:memory:` for a throwaway database)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[arg(long, value_parser = ["error", "warn", "info", "debug", "trace"], global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Rewrite article image columns into canonical JSON arrays
    FixImages,

    /// Create an account with any role, e.g. the first admin
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        password: String,

        #[arg(long, default_value = "ADMIN")]
        role: String,
    },
}

fn load_config(cli: &Cli) -> Result<ServerConfig, ServerError> {
    let mut config = ServerConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = cli.log_level.as_deref().and_then(|l| l.parse::<LevelFilter>().ok()) {
        config.log_level = level;
    }
    if let Some(Command::Serve { addr: Some(addr) }) = &cli.command {
        config.addr = *addr;
    }
    Ok(config)
}

/// Terminal logger plus a file logger in the platform cache directory.
fn init_logging(level: LevelFilter) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    paths::rotate_logs();
    if let Some(path) = paths::log_file() {
        let file = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| File::create(&path));
        match file {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("Could not open log file {}: {}", path.display(), e),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

async fn run(command: Command, config: ServerConfig) -> Result<(), ServerError> {
    let market = open_marketplace(&config).await?;

    match command {
        Command::Serve { .. } => {
            let server = Server::bind(config.addr, market).await?;
            let shutdown = CancellationToken::new();

            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    signal.cancel();
                }
            });

            server.run(shutdown).await;
        }
        Command::FixImages => {
            let changed = market.db().articles().normalize_images().await?;
            log::info!("Normalized images of {} article(s)", changed);
            println!("{} article(s) updated", changed);
        }
        Command::CreateUser {
            email,
            name,
            password,
            role,
        } => {
            let role = Role::parse(&role.to_uppercase()).ok_or(ServerError::UnknownRole(role))?;
            let user = market
                .create_account(NewUser {
                    email,
                    name,
                    password,
                    role,
                })
                .await?;
            println!("Created {} {} ({})", user.role, user.email, user.id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_level);

    let command = cli.command.unwrap_or(Command::Serve { addr: None });
    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
