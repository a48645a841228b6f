use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{config::Config, tracker::TrackingPoller};

pub async fn create_and_run_scheduler(config: Config, poller: Arc<TrackingPoller>) -> Result<()> {
    let scheduler = JobScheduler::new().await?;

    let job_poller = poller.clone();
    let job = Job::new_async(config.cron_schedule.as_str(), move |_uuid, _l| {
        let poller = job_poller.clone();
        Box::pin(async move {
            execute_sweep(poller).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    execute_sweep(poller.clone()).await;

    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
    }
}

async fn execute_sweep(poller: Arc<TrackingPoller>) {
    tracing::info!("executing scheduled tracking sweep");

    if let Err(e) = poller.run().await {
        tracing::error!(error = %e, "tracking sweep failed");
    } else {
        tracing::info!("tracking sweep completed");
    }
}
