//! Shared helpers for `cachedag` integration tests: tracing setup, graph
//! and plan-file builders, and a fake executor backed by an in-memory store.

pub mod builders;
pub mod fake_executor;

use std::sync::{Arc, Once};
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use cachedag::engine::{PlanRunner, RuntimeOptions};
use cachedag::store::MemoryStore;

use crate::builders::Fixture;
use crate::fake_executor::{FakeExecutor, FakeOutput};

/// Upper bound for a single plan run in tests, worker drain included.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs go through the test writer, so the harness only prints them for
/// failing tests (unless run with `-- --nocapture`). `RUST_LOG` overrides
/// the default of `info` for `cachedag`, e.g.
/// `RUST_LOG=cachedag::engine=trace cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,cachedag=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future, failing the test if it takes longer than [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(RUN_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("plan run did not finish within {RUN_TIMEOUT:?}"))
}

/// A runner over `fixture` whose executor produces results of the fixture's
/// sizes and persists into a clone of `store`.
pub fn fake_runner<'g>(
    fixture: &'g Fixture,
    store: &MemoryStore<FakeOutput>,
    options: RuntimeOptions,
) -> PlanRunner<'g, FakeExecutor, MemoryStore<FakeOutput>> {
    PlanRunner::new(
        &fixture.graph,
        FakeExecutor::new(fixture.sizes.clone()),
        Arc::new(store.clone()),
        options,
    )
}
