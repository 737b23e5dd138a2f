use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::error;

use task_manager::app::run_server;
use task_manager::commands;
use task_manager::config::Config;

/// Task Manager server and maintenance commands.
#[derive(Parser)]
#[command(name = "task-manager")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Overrides HOST.
        #[arg(long)]
        host: Option<String>,
        /// Overrides PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the database tables outside production.
    Deploy,
    /// List the registered models with their row counts.
    Shell,
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_server(config).await.map_err(|e| e.to_string())
        }
        Command::Deploy => commands::deploy(&config).await.map_err(|e| e.to_string()),
        Command::Shell => commands::shell(&config).await.map(|lines| {
            println!("Task Manager models ({} profile):", config.profile);
            for line in lines {
                println!("  {line}");
            }
        }).map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
