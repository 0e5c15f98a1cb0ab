//! Example: Using the in-process lock store
//!
//! Run with: `cargo run --example memory_lock`
//!
//! No server needed. Shows contention between tasks sharing one store.

use doclock::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let coordinator = LockCoordinator::new(MemoryLockStore::new());

    // Several workers race for the same lock; one wins, the rest get a hint.
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .lock::<String, LockError>("nightly-job", Some(Duration::from_secs(15)))
                    .on_acquired_async(move || async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(format!("worker {worker} ran the job"))
                    })
                    .on_contended_with_hint(move |secs| {
                        Ok(format!("worker {worker} skipped, retry in {secs}s"))
                    })
                    .execute()
                    .await
            })
        })
        .collect();

    for worker in workers {
        println!("{}", worker.await??);
    }

    // The job lock was released by the winner
    let acquisition = coordinator.acquire_with_wait_hint("nightly-job", None).await?;
    println!("after the race: {:?}", acquisition);
    coordinator.release("nightly-job").await?;

    Ok(())
}
