// crates/test-utils/src/lib.rs

//! Shared helpers for the `runasd` integration tests.
//!
//! Supervision tests run against fake processes and real `/bin/sh`
//! children alike, and both report through background tasks. The helpers
//! here bound every wait so a missed exit notification fails the test
//! instead of hanging it.

pub mod builders;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use runasd::logging::{filter_directives, LOG_ENV};

/// Upper bound for any single wait in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

static INIT: Once = Once::new();

/// Route logs to the test writer, filtered the same way as the daemon.
///
/// Output shows up for failing tests only. Set `RUNASD_LOG`, e.g.
/// `info,runasd::child=debug`, to see the supervised program's output too.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV).ok();
        let filter = EnvFilter::try_new(filter_directives(None, env.as_deref()))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test once [`TEST_TIMEOUT`] has passed.
///
/// Used around runtime futures: a runtime that never finishes is a bug.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("no result within {TEST_TIMEOUT:?}"))
}

/// Poll `condition` until it holds or [`TEST_TIMEOUT`] has passed.
///
/// Returns the last value of `condition`.
#[allow(dead_code)]
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + TEST_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    condition()
}
