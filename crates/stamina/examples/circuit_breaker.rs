//! Example: sharing a circuit breaker across retry executions
//!
//! This example demonstrates:
//! 1. A breaker tripping after sustained failures
//! 2. Fail-fast admission denial while the breaker is open
//! 3. Recovery through the half-open probe
//!
//! Run with:
//! ```bash
//! cargo run -p stamina --example circuit_breaker
//! ```

use stamina::breaker::CircuitBreaker;
use stamina::engine::Retrier;
use stamina::{jitter, strategy};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct Unavailable;

/// A backend that can be toggled between healthy and down
struct Backend {
    healthy: AtomicBool,
}

impl Backend {
    async fn call(&self) -> Result<&'static str, Unavailable> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok("200 OK")
        } else {
            Err(Unavailable)
        }
    }
}

#[tokio::main]
async fn main() {
    let backend = Arc::new(Backend {
        healthy: AtomicBool::new(false),
    });
    let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_millis(500)));

    let retrier: Retrier<Unavailable> = Retrier::builder()
        .max_attempts(5)
        .strategy(strategy::constant(Duration::from_millis(50)))
        .jitter(jitter::full())
        .circuit_breaker(Arc::clone(&breaker))
        .build();

    println!("Backend is down; three failures will trip the breaker.\n");
    let result = retrier.execute(|| backend.call()).await;
    println!("first execution:  {result:?}");
    println!("breaker state:    {:?}\n", breaker.current_state());

    // While open, executions are denied without touching the backend.
    let result = retrier.execute(|| backend.call()).await;
    println!("second execution: {result:?} (failed fast)\n");

    println!("Waiting out the reset timeout, then bringing the backend up...");
    tokio::time::sleep(Duration::from_millis(600)).await;
    backend.healthy.store(true, Ordering::SeqCst);

    // The half-open probe succeeds and the breaker closes again.
    let result = retrier.execute(|| backend.call()).await;
    println!("third execution:  {result:?}");
    println!("breaker state:    {:?}", breaker.current_state());
}
