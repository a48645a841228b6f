use anyhow::Result;
use std::sync::Arc;

use shipping_connector::{
    carrier::GlsClient, config::Config, logging, scheduler, store::MemoryStore,
    tracker::TrackingPoller,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = Config::from_env();

    // The in-memory store stands in for the host ERP's document store; hosts
    // embedding the library wire their own NoteStore here.
    let store = Arc::new(MemoryStore::new());
    let gls = Arc::new(GlsClient::new(config.gls.clone())?);

    let poller = Arc::new(TrackingPoller::new(store, gls));

    tracing::info!(cron_schedule = %config.cron_schedule, "starting tracking scheduler");

    scheduler::create_and_run_scheduler(config, poller).await?;

    Ok(())
}
