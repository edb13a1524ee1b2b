//! Client for the trigger endpoint of a running server.

use crate::cli::TriggerArgs;
use std::time::Duration;

/// Post `args.count` times to the trigger endpoint, printing one
/// `index status body` line per call.
pub async fn run(args: &TriggerArgs) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    for i in 0..args.count {
        let response = client.post(&args.url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        println!("{i} {status} {body}");

        if i + 1 < args.count {
            tokio::time::sleep(Duration::from_secs(args.interval_secs)).await;
        }
    }
    Ok(())
}
