mod reading;

use anyhow::{bail, Context};
use clap::Parser;
use reading::{ReadingPayload, Sensor, StoredReading};
use std::time::Duration;
use tracing::{error, info, warn};

/// Posts simulated temperature readings to the endpoint
#[derive(Debug, Parser)]
struct Args {
    /// Base URL of the temperature endpoint
    #[arg(long, env = "ENDPOINT_URL", default_value = "http://localhost:8080/")]
    url: String,

    /// Shared secret expected by the endpoint
    #[arg(long, env = "SECRET")]
    secret: String,

    /// Milliseconds between readings
    #[arg(long, env = "INTERVAL_MS", default_value_t = 1000)]
    interval_ms: u64,

    /// Starting temperature of the simulated sensor
    #[arg(long, env = "BASE_TEMPERATURE", default_value_t = 21.0)]
    base: f64,

    /// Stop after this many readings (0 runs until interrupted)
    #[arg(long, env = "COUNT", default_value_t = 0)]
    count: u64,

    /// Fetch and print the stored readings once instead of posting
    #[arg(long)]
    read: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        });

    let result = if args.read {
        read_all(&client, &args.url).await
    } else {
        tokio::select! {
            result = run(&client, &args) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(client: &reqwest::Client, args: &Args) -> anyhow::Result<()> {
    info!("Starting temperature simulator");
    info!(
        "Endpoint: {}, interval: {} ms, base: {}",
        args.url, args.interval_ms, args.base
    );

    let mut sensor = Sensor::new(args.base);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut sent: u64 = 0;
    let mut failed: u64 = 0;

    while args.count == 0 || sent + failed < args.count {
        ticker.tick().await;

        let temperature = sensor.next_reading(&mut rand::thread_rng());
        let payload = ReadingPayload {
            secret: args.secret.clone(),
            temperature,
        };

        match post_reading(client, &args.url, &payload).await {
            Ok(body) => {
                sent += 1;
                info!("Sent {:.2}: {}", temperature, body);
            }
            Err(e) => {
                failed += 1;
                warn!("Failed to send {:.2}: {:#}", temperature, e);
            }
        }
    }

    info!("Done: {} sent, {} failed", sent, failed);
    Ok(())
}

async fn post_reading(
    client: &reqwest::Client,
    url: &str,
    payload: &ReadingPayload,
) -> anyhow::Result<String> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .context("request failed")?;
    let status = response.status();
    let body = response.text().await.context("failed to read response")?;

    if !status.is_success() || body.starts_with("Error:") {
        bail!("{} {}", status, body);
    }
    Ok(body)
}

async fn read_all(client: &reqwest::Client, url: &str) -> anyhow::Result<()> {
    let response = client.get(url).send().await.context("request failed")?;
    let status = response.status();
    let body = response.text().await.context("failed to read response")?;

    if !status.is_success() {
        bail!("{} {}", status, body);
    }

    let readings: Vec<StoredReading> =
        serde_json::from_str(&body).context("endpoint returned an unexpected body")?;
    for r in &readings {
        println!("{}\t{:.2}", r.recorded_at, r.temperature);
    }
    info!("{} readings stored", readings.len());
    Ok(())
}
