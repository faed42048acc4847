use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use miniwob_action_space::{
    Action, ActionKind, ActionSpaceConfig, BrowserSession, CapabilityGroup, SessionOptions,
    execute_action,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "miniwob-actions", about = "Inspect and execute MiniWoB action spaces")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List action kinds and their capability groups
    Kinds,
    /// Print the action schema as JSON
    Schema {
        #[command(flatten)]
        source: ConfigSource,
        #[arg(long, requires = "screen_height")]
        screen_width: Option<f64>,
        #[arg(long, requires = "screen_width")]
        screen_height: Option<f64>,
    },
    /// Open a task page and execute one action
    Execute {
        #[command(flatten)]
        source: ConfigSource,
        /// Task page URL
        #[arg(long)]
        url: String,
        /// Action instance as JSON, e.g. '{"action_type":1,"coords":[10,20]}'
        #[arg(long)]
        action: String,
        #[arg(long, env = "MINIWOB_DEBUG_URL")]
        debug_url: Option<String>,
        #[arg(long, env = "MINIWOB_CHROME_PATH")]
        chrome_path: Option<PathBuf>,
        #[arg(long)]
        headless: bool,
    },
}

#[derive(Args)]
struct ConfigSource {
    /// Named preset
    #[arg(long, default_value = "all_supported", conflicts_with = "config")]
    preset: String,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigSource {
    fn load(&self) -> Result<ActionSpaceConfig> {
        match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                ActionSpaceConfig::from_json_str(&json)
                    .with_context(|| format!("failed to parse {}", path.display()))
            }
            None => Ok(ActionSpaceConfig::preset(&self.preset)?),
        }
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.debug)?;

    match cli.command {
        Command::Kinds => print_kinds(),
        Command::Schema {
            source,
            screen_width,
            screen_height,
        } => {
            let config = source.load()?;
            if let (Some(width), Some(height)) = (screen_width, screen_height) {
                config.set_screen_size(width, height)?;
            }
            let space = config.action_space()?;
            println!("{}", serde_json::to_string_pretty(&space)?);
            Ok(())
        }
        Command::Execute {
            source,
            url,
            action,
            debug_url,
            chrome_path,
            headless,
        } => {
            let config = source.load()?;
            let action: Action =
                serde_json::from_str(&action).context("action is not valid JSON")?;

            let mut session = BrowserSession::launch(&SessionOptions {
                debug_url,
                chrome_path,
                headless,
                window_size: None,
            })?;
            session.open(&url)?;

            if !config.has_screen_geometry() {
                let (width, height) = session.viewport_size()?;
                info!(width, height, "using viewport as screen geometry");
                config.set_screen_size(width, height)?;
            }
            let space = config.action_space()?;
            if !space.contains(&action) {
                bail!("action {} does not fit the action space", serde_json::to_string(&action)?);
            }

            execute_action(&action, &config, &mut session)?;
            info!(kind = %config.resolve_kind(&action)?, "action executed");
            Ok(())
        }
    }
}

fn print_kinds() -> Result<()> {
    for (index, kind) in ActionKind::ALL.into_iter().enumerate() {
        let groups: Vec<_> = kind
            .groups()
            .into_iter()
            .map(|group| group.field().as_str())
            .collect();
        let status = if kind.is_dispatchable() { "" } else { " (not dispatchable)" };
        println!("{index:>2} {kind:<30} fields: [{}]{status}", groups.join(", "));
    }
    for group in CapabilityGroup::ALL {
        let members: Vec<_> = group.members().iter().map(|k| k.as_str()).collect();
        println!("{:?}: {}", group, members.join(", "));
    }
    Ok(())
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
