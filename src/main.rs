use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

mod app;
mod backend;
mod cli;
mod config;
mod controller;
mod core;
mod mediator;
mod models;
mod session;
mod transport;

use crate::app::Application;
use crate::backend::together::TogetherBackend;
use crate::cli::Args;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::core::error::RelayError;
use crate::mediator::InferenceMediator;
use crate::session::SessionStore;
use crate::transport::ChatTransport;
use crate::transport::telegram::TelegramApi;

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .init();

    let settings = Config::load(args.config.as_ref())?.resolve(&args)?;

    let api = Arc::new(TelegramApi::new(&settings.telegram_token));
    let backend = Arc::new(TogetherBackend::new(
        settings.together_base_url,
        settings.together_api_key,
    ));

    let sessions = Arc::new(SessionStore::new());
    let mediator = InferenceMediator::new(sessions.clone(), backend);
    let (stop_tx, stop_rx) = watch::channel(false);
    let controller = Arc::new(ConversationController::new(
        api.clone() as Arc<dyn ChatTransport>,
        sessions,
        mediator,
        stop_tx,
    ));

    Application::new(api, controller, stop_rx).run().await
}
