//! In-process storage endpoint simulation
//!
//! Lets the upload manager be exercised against jittery and unreliable
//! storage without running a server.

pub mod flaky_transport;

pub use flaky_transport::{FlakyTransport, FlakyTransportConfig};

#[allow(unused_imports)]
pub use flaky_transport::TransportStats;
