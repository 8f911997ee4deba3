//! Example: retrying an unreliable operation with backoff and jitter
//!
//! This example demonstrates:
//! 1. Simple retry with exponential backoff
//! 2. Classifying errors so only transient ones are retried
//! 3. Jitter impact (run multiple times to see variance)
//!
//! Run with:
//! ```bash
//! cargo run -p stamina --example retry_basic
//! ```

use stamina::config::RetryConfig;
use stamina::engine::Retrier;
use stamina::jitter::Jitter;
use stamina::{jitter, strategy};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: Arc<AtomicU32>,
    fail_count: u32,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("transient error on attempt {0}")]
    Transient(u32),
    #[error("invalid credentials")]
    Auth,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: Arc::new(AtomicU32::new(0)),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.fail_count {
            println!("  attempt {}: FAILED (transient)", attempt + 1);
            Err(ApiError::Transient(attempt + 1))
        } else {
            println!("  attempt {}: SUCCESS", attempt + 1);
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: simple retry with exponential backoff
async fn example_simple_retry() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Example 1: Exponential Backoff ===\n");

    let retrier = Retrier::builder()
        .max_attempts(5)
        .strategy(strategy::exponential(Duration::from_millis(50)))
        .jitter(jitter::none())
        .build();

    let api = UnreliableApi::new(2); // Fail first 2 attempts

    println!("Calling unreliable API (fails twice before succeeding)...");
    let start = Instant::now();
    let result = retrier.execute(|| api.call()).await?;

    println!(
        "\nGot {result:?} after {} attempts in {:?}",
        api.total_attempts(),
        start.elapsed()
    );
    Ok(())
}

/// Example 2: only transient errors are retried
async fn example_classification() {
    println!("\n=== Example 2: Error Classification ===\n");

    let retrier = Retrier::builder()
        .config(
            RetryConfig::new(5)
                .with_should_retry(|e: &ApiError| matches!(e, ApiError::Transient(_))),
        )
        .strategy(strategy::constant(Duration::from_millis(20)))
        .build();

    println!("An auth failure is terminal on the first attempt:");
    let result = retrier
        .execute(|| async { Err::<String, _>(ApiError::Auth) })
        .await;

    match result {
        Err(err) if err.is_operation() => {
            println!("  not retried: {}", err.into_operation().unwrap());
        }
        other => println!("  unexpected outcome: {other:?}"),
    }
}

/// Example 3: jitter spreads concurrent retriers apart
async fn example_jitter() {
    println!("\n=== Example 3: Jitter ===\n");

    let base = Duration::from_millis(400);
    println!("Base delay {base:?} through each jitter function:");
    for (name, jittered) in [
        ("none", jitter::none().apply(base, 1)),
        ("full", jitter::full().apply(base, 1)),
        ("equal", jitter::equal().apply(base, 1)),
        (
            "decorrelated",
            jitter::decorrelated_with_base(Duration::from_millis(100)).apply(base, 1),
        ),
    ] {
        println!("  {name:>12}: {jittered:?}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    example_simple_retry().await?;
    example_classification().await;
    example_jitter().await;
    Ok(())
}
