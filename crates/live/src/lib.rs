//! Live PowerPoint backend.
//!
//! Drives a running `PowerPoint.Application` through late-bound
//! automation. The adapter logic is written against the [`Dispatch`]
//! trait; [`ComConnector`] supplies real COM objects on Windows and
//! reports itself unavailable everywhere else.

pub mod adapter;
pub mod dispatch;

mod com;
#[cfg(test)]
mod fake;

pub use adapter::LiveAdapter;
pub use com::{ComConnector, ComObject};
pub use dispatch::{AutomationError, AutomationResult, Connector, Dispatch, DispatchExt, Variant};

/// The live backend over real COM automation.
pub type ComAdapter = LiveAdapter<ComConnector>;

impl ComAdapter {
    /// Live adapter bound to `PowerPoint.Application`.
    pub fn com() -> Self {
        LiveAdapter::new(ComConnector)
    }
}
