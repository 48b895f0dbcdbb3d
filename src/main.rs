use tracing::{error, info};

use whisperchain::api::{FeedOptions, FeedSort, WhisperApi};
use whisperchain::config::AppConfig;
use whisperchain::telemetry;

#[tokio::main]
async fn main() {
    telemetry::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let api = match WhisperApi::from_config(&config) {
        Ok(api) => api,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let sort = FeedSort::parse(&std::env::args().nth(1).unwrap_or_default());
    info!(environment = config.environment.as_str(), sort = sort.as_str(), "loading feed");

    match api.get_themes().await {
        Ok(themes) => {
            for theme in themes {
                println!("[theme] {}", theme.name);
            }
        }
        Err(e) => error!("failed to load themes: {}", e),
    }

    match api.get_whispers(None, FeedOptions::new(sort)).await {
        Ok(feed) => {
            for whisper in feed {
                println!(
                    "{} ({} likes, {} replies): {}",
                    whisper.author_display_name.as_deref().unwrap_or("anonymous"),
                    whisper.likes_count,
                    whisper.chain_count,
                    whisper.transformed_text
                );
            }
        }
        Err(e) => {
            error!("failed to load feed: {}", e);
            std::process::exit(1);
        }
    }
}
