//! Fetch posts example
//!
//! Fetches posts 1..=10 from jsonplaceholder under one execution policy and prints
//! lifecycle events and the final report.
//!
//! ```text
//! cargo run --example fetch_posts -- concurrent_settled
//! ```
//!
//! Policies: `sequential`, `fold_sequential` (default), `concurrent`, `concurrent_settled`.

use batch_fetch::{
    BatchReport, BatchRunner, Event, ExecutionPolicy, HttpConfig, HttpJsonFetcher, Outcome,
    RunnerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let policy: ExecutionPolicy = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => ExecutionPolicy::FoldSequential,
    };

    let fetcher: HttpJsonFetcher = HttpJsonFetcher::new(&HttpConfig::default())?;
    let runner = BatchRunner::with_config(
        fetcher,
        RunnerConfig {
            policy,
            ..Default::default()
        },
    )?;

    // Subscribe to events
    let mut events = runner.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::BatchStarted { policy, total }) => {
                    println!("▶ {} posts, policy {}", total, policy);
                }
                Ok(Event::ItemDispatched { index, id }) => {
                    println!("  → #{} dispatched (post {})", index, id);
                }
                Ok(Event::ItemSucceeded { index, id }) => {
                    println!("  ✓ #{} done (post {})", index, id);
                }
                Ok(Event::ItemFailed { index, id, error }) => {
                    println!("  ✗ #{} failed (post {}): {}", index, id, error);
                }
                Ok(Event::ItemRetrying { index, attempt, .. }) => {
                    println!("  ↻ #{} retry {}", index, attempt);
                }
                Ok(Event::BatchAborted { index, error, .. }) => {
                    println!("■ aborted at #{}: {}", index, error);
                    break;
                }
                Ok(Event::BatchCancelled { completed, total }) => {
                    println!("■ cancelled after {}/{}", completed, total);
                    break;
                }
                Ok(Event::BatchFinished {
                    succeeded, failed, ..
                }) => {
                    println!("■ finished: {} ok, {} failed", succeeded, failed);
                    break;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    eprintln!("  [WARNING] Event receiver lagged, missed {n} events!");
                }
                Err(_) => break,
            }
        }
    });

    let ids: Vec<u32> = (1..=10).collect();
    let result = runner.run_default(&ids).await;
    printer.await.ok();

    match result? {
        BatchReport::Completed(posts) => {
            for post in posts {
                println!("{}: {}", post["id"], post["title"]);
            }
        }
        BatchReport::Settled(outcomes) => {
            for outcome in outcomes {
                match outcome {
                    Outcome::Success(post) => println!("{}: {}", post["id"], post["title"]),
                    Outcome::Failure(e) => println!("error: {}", e),
                }
            }
        }
    }

    Ok(())
}
