pub mod builders;
pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for tests that spawn real processes.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-captured `tracing` subscriber once per test binary.
///
/// Output only shows for failing tests (or with `--nocapture`); raise the
/// level with `RUST_LOG=projmk=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("projmk=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, failing the test if it runs past [`TEST_TIMEOUT`]. Guards
/// pipeline runs that shell out against a hung collaborator.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("pipeline run exceeded {TEST_TIMEOUT:?}"))
}
