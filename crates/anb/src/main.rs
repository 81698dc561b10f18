use std::sync::Arc;

use anb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), anb_core::Error> {
    anb_core::logging::init("anb")?;

    let cfg = Arc::new(Config::load()?);

    anb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| anb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
