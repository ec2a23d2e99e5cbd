//! Driver facade for vibrotactor hardware.
//!
//! [`TactorDriver`] mirrors the vendor device-interface library: every call
//! returns a raw integer where negative means failure, and the detailed
//! reason is fetched separately through [`TactorDriver::last_error`].
//! [`SimDriver`] is an in-process implementation used on machines without
//! the vendor library and throughout the tests. With the `vendor` feature,
//! `VendorDriver` binds the real library at runtime.

mod driver;
mod sim;
#[cfg(feature = "vendor")]
mod vendor;

/// Vendor device-interface calls.
pub use driver::TactorDriver;
/// Vendor function names used in error reports.
pub use driver::func;
/// Call journal shared with a simulated driver.
pub use sim::{DriverCall, Journal};
/// In-process simulated driver.
pub use sim::SimDriver;
/// Runtime binding to the vendor library.
#[cfg(feature = "vendor")]
pub use vendor::VendorDriver;
