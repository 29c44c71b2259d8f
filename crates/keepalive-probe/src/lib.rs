//! # Keepalive Probe
//!
//! ```text
//! Aggregator::run_cycle(trigger)
//!   ├── Registry::keys()            lazy, paged
//!   ├── EndpointProber::probe(url)  bounded fan-out, results kept in scan order
//!   │     └── RetryingProber → HttpProbe::probe_once (timeout + cache-bust)
//!   └── Report::render() → Notifier::deliver
//! ```

pub mod aggregator;
pub mod probe;
pub mod retry;

pub use aggregator::{Aggregator, NO_ENDPOINTS_TEXT};
pub use probe::{HttpProbe, Probe, TIMEOUT_DETAIL};
pub use retry::{EndpointProber, RetryingProber, UNKNOWN_ERROR_DETAIL};
