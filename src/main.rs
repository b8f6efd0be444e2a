use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = gemchat::logging::init();
    gemchat::run().await
}
