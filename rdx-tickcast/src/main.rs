use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tickcast::prelude::*;
use tickcast::{ENGINE_NAME, VERSION};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "tickcast.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration: optional TOML file, then TICKCAST_* overrides.
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = ClockConfig::load(Some(path.as_path()))?;

    // 2. Initialize structured logging. RUST_LOG wins over the config file.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    print_banner(&config);

    // 3. Build the subject, attach one digital clock, and run until Ctrl+C.
    let display = Arc::new(DigitalClock::stdout());
    match config.variant {
        ClockVariant::Topics => {
            let clock = TopicClock::new(&config);
            for name in &config.topics {
                match Topic::from_name(name) {
                    Some(topic) => {
                        let id = clock.register(topic, display.clone()).await;
                        info!(?id, %topic, "digital clock subscribed");
                    }
                    None => warn!(topic = %name, "ignoring unknown topic"),
                }
            }
            clock.run_until_ctrl_c().await?;
        }
        ClockVariant::Simple => {
            let clock = SimpleClock::new(&config);
            let id = clock.register(display).await;
            info!(?id, "digital clock attached");
            clock.run_until_ctrl_c().await?;
        }
    }

    Ok(())
}

fn print_banner(config: &ClockConfig) {
    if std::env::var("QUIET_MODE").is_ok() {
        return;
    }
    let zone = config
        .timezone
        .map(|tz| tz.name().to_string())
        .unwrap_or_else(|| "local".to_string());
    println!("{} v{}", ENGINE_NAME.cyan().bold(), VERSION);
    println!(
        "{}",
        format!(
            "variant: {:?}  tick: {:?}  timezone: {}",
            config.variant,
            config.tick_interval(),
            zone
        )
        .dimmed()
    );
}
