pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod providers;
pub mod repl;
pub mod session;

use anyhow::Result;
use reqwest::Client;
use std::io;
use std::time::Duration;
use tracing::{error, info};

use config::Config;
use error::StartupError;
use repl::run_repl;
use session::{ChatSession, GeminiBackend};

pub async fn run() -> Result<()> {
    let cfg = Config::from_env().inspect_err(|err| error!(error = %err, "startup failed"))?;
    info!(
        model = %cfg.model,
        model_base_url = %cfg.model_base_url,
        model_timeout_secs = cfg.model_timeout_secs,
        temperature = cfg.generation.temperature,
        top_p = cfg.generation.top_p,
        top_k = cfg.generation.top_k,
        max_output_tokens = cfg.generation.max_output_tokens,
        system_prompt = cfg.system_prompt.is_some(),
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .build()
        .map_err(StartupError::ClientInit)?;
    println!("Gemini model initialized successfully.");

    let mut session = ChatSession::new(GeminiBackend::new(&client, &cfg));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_repl(&mut session, stdin.lock(), &mut stdout).await
}
