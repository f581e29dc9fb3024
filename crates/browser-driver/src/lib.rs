//! Browser I/O boundary: the port the Resolution Engine (C5) drives, a
//! Chromium-backed implementation, and an in-memory fake for tests.
//!
//! Grounded in the teacher's cdp-adapter hexagonal split (`ports.rs` +
//! `NoopTransport`/`ChromiumTransport`), generalized so candidate strings
//! using the §4.2 selector DSL resolve through one JS-side engine regardless
//! of which sub-strategy the caller is attempting.

mod chromium;
mod error;
mod fake;
mod js;
mod port;

pub use chromium::ChromiumDriver;
pub use error::DriverError;
pub use fake::{FakeDriver, FakeElement};
pub use port::{BrowserDriver, ElementRef, MouseButton};
