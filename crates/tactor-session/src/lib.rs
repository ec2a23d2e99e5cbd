//! Device session state machine.
//!
//! A [`Session`] owns the driver and tracks the interface lifecycle
//! (uninitialized, ready, connected) together with the single bound device.
//! Dropping a session runs the same teardown as an explicit `shutdown`, so a
//! host that never shuts down cleanly still releases the driver.

mod session;

/// Device bound to a session.
pub use session::DeviceRecord;
/// Owned session context over a driver.
pub use session::Session;
/// Lifecycle state derived from a session.
pub use session::SessionState;
#[cfg(test)]
mod tests;
