use anyhow::{Context, Result, bail};
use callbell_server::{Bootstrap, ServerConfig};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "callbell")]
#[command(about = "Call signaling and room routing server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),

    /// Write a config file with the defaults (prompts unless --yes).
    Init {
        #[arg(short, long, default_value = "callbell.json")]
        out: PathBuf,

        #[arg(short, long)]
        yes: bool,

        #[arg(long)]
        force: bool,
    },

    /// Load and validate a config file without starting anything.
    CheckConfig {
        #[arg(short, long, default_value = "callbell.json")]
        config: PathBuf,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    bind: Option<SocketAddr>,

    #[arg(long)]
    path: Option<String>,

    #[arg(long)]
    call_timeout: Option<u64>,

    #[arg(long)]
    cors: bool,
}

impl ServeArgs {
    fn resolve(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        if let Some(secs) = self.call_timeout {
            config.call_timeout_secs = secs;
        }
        if self.cors {
            config.cors_permissive = true;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Serve(args) => {
            let config = args.resolve()?;
            init_tracing(&config.log_level);

            println!("{}", "📞 Starting callbell...".green().bold());
            println!("   🔌 Listen: {}", config.bind_addr);
            println!("   🛣️  Path:   {}", config.path);

            Bootstrap::new(config)
                .serve()
                .await
                .context("Signaling server stopped with an error")?;

            println!("{}", "👋 Server stopped".cyan());
        }

        Commands::Init { out, yes, force } => {
            let config = if yes {
                ServerConfig::default()
            } else {
                prompt_config()?
            };
            write_config(&out, &config, force)?;
            println!("{} {}", "✨ Config written to".green().bold(), out.display());
        }

        Commands::CheckConfig { config } => {
            let loaded = ServerConfig::load(&config)
                .with_context(|| format!("Failed to load {}", config.display()))?;
            println!("{} {}", "✅ Config is valid:".green().bold(), config.display());
            println!("   🔌 Listen:       {}", loaded.bind_addr);
            println!("   🛣️  Path:         {}", loaded.path);
            println!("   ⏱️  Call timeout: {}s", loaded.call_timeout_secs);
        }
    }

    Ok(())
}

fn prompt_config() -> Result<ServerConfig> {
    let defaults = ServerConfig::default();

    let bind_addr: SocketAddr = Input::new()
        .with_prompt("Listen address")
        .default(defaults.bind_addr)
        .interact_text()?;
    let path: String = Input::new()
        .with_prompt("WebSocket path")
        .default(defaults.path.clone())
        .interact_text()?;
    let call_timeout_secs: u64 = Input::new()
        .with_prompt("Seconds a call may ring")
        .default(defaults.call_timeout_secs)
        .interact_text()?;
    let cors_permissive = Confirm::new()
        .with_prompt("Allow cross-origin browsers (permissive CORS)?")
        .default(defaults.cors_permissive)
        .interact()?;

    let config = ServerConfig {
        bind_addr,
        path,
        call_timeout_secs,
        cors_permissive,
        ..defaults
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn write_config(out: &Path, config: &ServerConfig, force: bool) -> Result<()> {
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.display());
    }
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(out, config.to_json()?).with_context(|| format!("Failed to write {}", out.display()))
}
