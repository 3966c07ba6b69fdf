//! Load client for the ranking server.
//!
//! Fires concurrent `GET /ranking` requests and tallies the `X-Cache`
//! header of each response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use parking_lot::Mutex;

use ranking_flight::api::X_CACHE;

/// Drives concurrent traffic at a ranking server.
#[derive(Debug, Parser)]
#[command(name = "load_client")]
struct Cli {
    /// Which scenario to run.
    #[arg(value_enum)]
    test: TestType,

    /// Base URL of the ranking server.
    #[arg(default_value = "http://localhost:80")]
    server_url: String,

    /// Override the number of concurrent requests.
    #[arg(short, long)]
    concurrency: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TestType {
    /// Cache stampede: wait for expiry, then 100 concurrent requests
    Stampede,
    /// Normal load: 10 concurrent requests
    Normal,
}

impl TestType {
    fn concurrency(self) -> usize {
        match self {
            TestType::Stampede => 100,
            TestType::Normal => 10,
        }
    }
}

/// Tally for one run. `failed` counts transport errors only; every response
/// received is a `success` and is also counted in `error_status` when its
/// status is not 2xx.
#[derive(Debug, Default)]
struct TestResult {
    total: usize,
    success: usize,
    failed: usize,
    error_status: usize,
    duration: Duration,
    cache_hit: usize,
    cache_miss: usize,
    cache_shared: usize,
}

impl TestResult {
    fn record_failure(&mut self) {
        self.failed += 1;
    }

    fn record_response(&mut self, ok: bool, cache_status: Option<&str>) {
        self.success += 1;
        if !ok {
            self.error_status += 1;
        }
        match cache_status {
            Some("HIT") => self.cache_hit += 1,
            Some("MISS") => self.cache_miss += 1,
            Some("SHARED") => self.cache_shared += 1,
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let concurrency = cli.concurrency.unwrap_or_else(|| cli.test.concurrency());

    println!("=== {:?} Test ===", cli.test);
    println!("Server: {}", cli.server_url);
    println!("Time: {}\n", chrono::Local::now().format("%H:%M:%S"));

    match cli.test {
        TestType::Stampede => {
            println!("Cache Stampede Test");
            println!("Waiting for cache to expire (11s)...");
            tokio::time::sleep(Duration::from_secs(11)).await;
        }
        TestType::Normal => println!("Normal Load Test"),
    }

    let result = run_load_test(&cli.server_url, concurrency).await?;
    print_result(&result);
    Ok(())
}

async fn run_load_test(server_url: &str, concurrent: usize) -> anyhow::Result<TestResult> {
    let client = reqwest::Client::new();
    let url = format!("{}/ranking", server_url.trim_end_matches('/'));
    let result = Arc::new(Mutex::new(TestResult {
        total: concurrent,
        ..TestResult::default()
    }));

    let start = Instant::now();
    let mut handles = Vec::with_capacity(concurrent);
    for _ in 0..concurrent {
        let client = client.clone();
        let url = url.clone();
        let result = result.clone();
        handles.push(tokio::spawn(async move {
            let response = client.get(&url).send().await;

            let response = match response {
                Ok(response) => response,
                Err(_) => {
                    result.lock().record_failure();
                    return;
                }
            };
            let ok = response.status().is_success();
            let status = response
                .headers()
                .get(X_CACHE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            // Drain the body so the connection can be reused.
            let _ = response.bytes().await;

            result.lock().record_response(ok, status.as_deref());
        }));
    }

    for handle in handles {
        handle.await?;
    }

    let mut result = Arc::try_unwrap(result)
        .map_err(|_| anyhow::anyhow!("request tasks still hold the result"))?
        .into_inner();
    result.duration = start.elapsed();
    Ok(result)
}

fn print_result(result: &TestResult) {
    println!("\nResults:");
    println!("  Total requests: {}", result.total);
    println!("  Successful: {}", result.success);
    println!("  Failed: {}", result.failed);
    println!("  Non-2xx responses: {}", result.error_status);
    println!("  Duration: {:.3}s", result.duration.as_secs_f64());
    println!("  Cache status:");
    println!("    - HIT: {}", result.cache_hit);
    println!("    - MISS: {}", result.cache_miss);
    println!("    - SHARED: {}", result.cache_shared);

    if result.cache_shared > 0 {
        println!(
            "\nSingleflight working! {} requests shared the result.",
            result.cache_shared
        );
    }
}
