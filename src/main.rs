//! CLI entry point for prismic-press

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prismic_press::cache::CacheDb;
use prismic_press::commands;
use prismic_press::generator::Generator;
use prismic_press::Press;

#[derive(Parser)]
#[command(name = "prismic-press")]
#[command(version)]
#[command(about = "A static blog generator for posts stored in Prismic", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Ignore the generation cache and rewrite every page
        #[arg(short, long)]
        force: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Serve the existing output without generating first
        #[arg(long)]
        no_generate: bool,
    },

    /// Clean the public folder and cache
    Clean,

    /// List posts in the repository
    List {
        /// Also fetch each post and show its reading time
        #[arg(short, long)]
        reading_time: bool,
    },

    /// Verify that every listed post can be retrieved
    Check,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "prismic_press=debug,info"
    } else {
        "prismic_press=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Generate { force } => {
            let press = Press::new(&base_dir)?;
            tracing::info!("Generating static files...");
            commands::generate::run_with_client(&press, press.client()?, force).await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            no_generate,
        } => {
            let press = Press::new(&base_dir)?;
            let client = press.client()?;
            let generator = Generator::new(&press, client)?;

            if !no_generate {
                tracing::info!("Generating static files...");
                let mut cache = CacheDb::load(&press.cache_dir);
                generator.generate(&mut cache).await?;
                cache.save(&press.cache_dir)?;
            }

            tracing::info!("Starting server at http://{}:{}", ip, port);
            prismic_press::server::start(generator, &ip, port).await?;
        }

        Commands::Clean => {
            let press = Press::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            press.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { reading_time } => {
            let press = Press::new(&base_dir)?;
            commands::list::run(&press, reading_time).await?;
        }

        Commands::Check => {
            let press = Press::new(&base_dir)?;
            commands::check::run(&press).await?;
            println!("All posts resolve.");
        }

        Commands::Version => {
            println!("prismic-press version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
