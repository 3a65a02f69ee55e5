use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Telegram relay bot for Together-hosted models", long_about = None)]
pub struct Args {
    /// Path to the config file (default: ~/.config/chatrelay/config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Telegram bot token (overrides config file and TELEGRAM_BOT_TOKEN)
    #[arg(long)]
    pub telegram_token: Option<String>,

    /// Together API key (overrides config file and TOGETHER_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Inference API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Log filter (tracing env-filter syntax)
    #[arg(long, default_value = "chatrelay=info")]
    pub log: String,
}
