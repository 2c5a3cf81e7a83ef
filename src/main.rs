mod cli;

use clap::Parser;
use cli::{Cli, Command};
use lvdb::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match args.command {
        Some(Command::Serve { config, host, port }) => {
            let mut settings = match config {
                Some(path) => ServerConfig::from_file(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            if args.db.is_some() {
                settings.db = args.db;
            }

            let db = settings.open_db()?;
            lvdb::server::serve(&settings, db).await?;
        }
        Some(command) => {
            let db = ServerConfig { db: args.db, ..Default::default() }.open_db()?;
            cli::execute_command(&db, command)?;
        }
        None => {
            let db = ServerConfig { db: args.db, ..Default::default() }.open_db()?;
            cli::run_repl(&db);
        }
    }

    Ok(())
}
