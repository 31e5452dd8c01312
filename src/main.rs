//! Demo driver: many tasks, each waiting on a few short timeouts.
//!
//! By default every task is a continuation on one cooperative scheduler.
//! Built with `--features thread-baseline`, every task is an OS thread that
//! sleeps 10 ms three times instead, for comparison.
//!
//! Workload knobs (environment): `COSCHED_TASKS`, plus `COSCHED_TIMEOUTS` and
//! `COSCHED_DELAY_MS` for the scheduler mode. Scheduler knobs: see [`cosched::Builder::from_env`].

use anyhow::Context;
use cosched::config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Instant;

const DEFAULT_TASKS: u64 = 100_000;
const DEFAULT_TIMEOUTS: u64 = 3;
const DEFAULT_DELAY_MS: u64 = 1;

#[cfg_attr(feature = "thread-baseline", allow(dead_code))]
struct Workload {
    tasks: u64,
    timeouts: u64,
    delay_ms: u64,
}

impl Workload {
    fn from_env() -> Result<Self, cosched::ConfigError> {
        Ok(Self {
            tasks: config::env_u64("COSCHED_TASKS")?.unwrap_or(DEFAULT_TASKS),
            timeouts: config::env_u64("COSCHED_TIMEOUTS")?.unwrap_or(DEFAULT_TIMEOUTS),
            delay_ms: config::env_u64("COSCHED_DELAY_MS")?.unwrap_or(DEFAULT_DELAY_MS),
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let workload = Workload::from_env().context("reading workload configuration")?;

    run(&workload)
}

#[cfg(not(feature = "thread-baseline"))]
fn run(workload: &Workload) -> anyhow::Result<()> {
    use cosched::{Builder, timeout_ms};

    let mut scheduler = Builder::from_env()
        .context("reading scheduler configuration")?
        .build();

    let start = Instant::now();
    for _ in 0..workload.tasks {
        let (timeouts, delay_ms) = (workload.timeouts, workload.delay_ms);
        scheduler.submit(async move {
            for _ in 0..timeouts {
                timeout_ms(delay_ms).await;
            }
        });
    }

    let report = scheduler.run_until_idle();

    tracing::info!(
        tasks = workload.tasks,
        iterations = report.iterations,
        sweeps = report.sweeps,
        resumes = report.resumes,
        completed = report.completed,
        elapsed = ?start.elapsed(),
        "all continuations finished"
    );
    println!("{}", report.iterations);

    Ok(())
}

/// Per-thread sleep in baseline mode.
#[cfg(feature = "thread-baseline")]
const BASELINE_SLEEP: std::time::Duration = std::time::Duration::from_millis(10);

/// Sleeps per baseline thread.
#[cfg(feature = "thread-baseline")]
const BASELINE_SLEEPS: u32 = 3;

#[cfg(feature = "thread-baseline")]
fn run(workload: &Workload) -> anyhow::Result<()> {
    use anyhow::anyhow;
    use std::thread;

    let start = Instant::now();
    let mut handles = Vec::with_capacity(workload.tasks as usize);

    for i in 0..workload.tasks {
        let handle = thread::Builder::new()
            .spawn(|| {
                for _ in 0..BASELINE_SLEEPS {
                    thread::sleep(BASELINE_SLEEP);
                }
            })
            .with_context(|| format!("spawning baseline thread {i}"))?;
        handles.push(handle);
    }

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("baseline thread panicked"))?;
    }

    tracing::info!(
        threads = workload.tasks,
        elapsed = ?start.elapsed(),
        "all baseline threads finished"
    );

    Ok(())
}

#[cfg(all(test, feature = "thread-baseline"))]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_threads_sleep_fixed_intervals() {
        // Timeout knobs do not apply to the thread baseline.
        let workload = Workload {
            tasks: 4,
            timeouts: 1,
            delay_ms: 0,
        };

        let start = Instant::now();
        run(&workload).expect("baseline run");

        assert!(start.elapsed() >= BASELINE_SLEEP * BASELINE_SLEEPS);
    }
}
