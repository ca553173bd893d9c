//! Native local storage bridge: persistent key-value storage for a host
//! scripting layer, usable one-shot from the shell or served over a socket.

mod app;
mod ipc;

use std::path::PathBuf;

use bridge_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use native_local_storage::{create_bridge, NativeLocalStorage};

/// Native local storage command-line interface.
#[derive(Parser)]
#[command(name = "native-local-storage")]
#[command(about = "Persistent key-value storage bridge backed by platform preferences")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides config.json.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (socket, logs, config). Defaults to ~/.native-local-storage
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Storage backend (file, sqlite, memory). Overrides config.json.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Preference suite to read and write. Overrides config.json.
    #[arg(long, global = true)]
    suite: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get { key: String },
    /// Store a value under a key
    Set { key: String, value: String },
    /// Remove a key
    Remove { key: String },
    /// Add one to the integer stored under a key and print the result
    Increment { key: String },
    /// Remove every key in the suite
    Clear,
    /// List the keys in the suite
    Keys,
    /// Drive the live activity of a running bridge
    #[command(subcommand)]
    Activity(ActivityCommand),
    /// Serve the bridge protocol
    Serve {
        /// Serve on stdin/stdout instead of the Unix socket
        #[arg(long)]
        stdio: bool,
    },
    /// Stop a running bridge
    Stop,
    /// Check whether a bridge is running
    Status,
}

#[derive(Subcommand)]
enum ActivityCommand {
    /// Start an activity showing the integer stored under a key
    Create { key: String },
    /// Push the integer stored under a key into the current activity
    Update { key: String },
    /// End the current activity
    Delete { key: String },
    /// Update the current activity, starting one if needed
    Auto { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };

    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.parse()?;
    }
    if let Some(suite) = cli.suite {
        config.suite_name = suite;
    }
    config.validate()?;

    paths.ensure_dirs()?;
    init_logging(&config.log_level, &paths);

    match cli.command.unwrap_or(Commands::Serve { stdio: false }) {
        Commands::Get { key } => {
            let bridge = create_bridge(&config, &paths)?;
            match bridge.get_item(&key)? {
                Some(value) => println!("{}", value),
                None => eprintln!("{} is not set", key),
            }
        }
        Commands::Set { key, value } => {
            create_bridge(&config, &paths)?.set_item(&key, &value)?;
        }
        Commands::Remove { key } => {
            create_bridge(&config, &paths)?.remove_item(&key)?;
        }
        Commands::Increment { key } => {
            println!("{}", create_bridge(&config, &paths)?.increment_item(&key)?);
        }
        Commands::Clear => {
            create_bridge(&config, &paths)?.clear()?;
        }
        Commands::Keys => {
            for key in create_bridge(&config, &paths)?.keys()? {
                println!("{}", key);
            }
        }
        Commands::Activity(command) => {
            let (method, key) = match command {
                ActivityCommand::Create { key } => (bridge_ipc::Method::CreateActivity, key),
                ActivityCommand::Update { key } => (bridge_ipc::Method::UpdateActivity, key),
                ActivityCommand::Delete { key } => (bridge_ipc::Method::DeleteActivity, key),
                ActivityCommand::Auto { key } => (bridge_ipc::Method::AutoUpdateActivity, key),
            };
            app::forward_activity(&paths, method, &key).await?;
        }
        Commands::Serve { stdio } => {
            app::run_bridge(config, paths, stdio).await?;
        }
        Commands::Stop => {
            app::stop_bridge(&paths).await?;
        }
        Commands::Status => {
            app::check_status(&paths).await?;
        }
    }

    Ok(())
}
