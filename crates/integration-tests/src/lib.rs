//! Session-level test support for the Logitech protocol engine.
//!
//! [`logitech_virtual::VirtualG920`] answers HID++ traffic written to a
//! [`fffb_hid_common::mock::MockTransport`], so negotiation, feature lookup and
//! the effect lifecycle run end to end without hardware.

pub mod logitech_virtual;

pub use logitech_virtual::{
    VirtualG920, g920_handle, g920_info, request_feature, request_function, request_params,
};

/// Route library logs to the test harness. `RUST_LOG=trace` shows every exchange.
pub fn init_tracing() {
    // An earlier test in the same binary may already have installed one.
    let _installed = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .is_ok();
}
