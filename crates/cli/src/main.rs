mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sitedrop")]
#[command(version, about = "Deploy an HTML page or ZIP bundle as a new Netlify site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run the deploy endpoint over HTTP
    ///
    /// Reads NETLIFY_API_KEY (and optionally NETLIFY_API_BASE,
    /// NETLIFY_ADMIN_BASE, SITEDROP_CLEANUP_ON_FAILURE) from the
    /// environment or a .env file.
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to serve on
        #[arg(short, long, env = "PORT", default_value = "8888")]
        port: u16,

        /// Largest accepted request body, in MiB
        #[arg(long, default_value = "10")]
        max_body_mb: usize,
    },

    /// Deploy a local file or directory as a new site
    Deploy {
        /// Website name (slugified for the site, kept as-is for the admin URL)
        #[arg(short, long)]
        name: String,

        /// .zip bundle, directory, or single HTML file
        path: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sitedrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            max_body_mb,
        } => commands::serve::run(host, port, max_body_mb).await,
        Command::Deploy { name, path } => commands::deploy::run(name, path).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitedrop", &mut io::stdout());
            Ok(())
        }
    }
}
