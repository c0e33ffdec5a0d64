//! Backend selection.
//!
//! Exactly one adapter serves a process. The choice depends on the host
//! operating system, the configured preference, and whether the candidate
//! actually comes up.

use crate::config::BackendPreference;
use ppt_mcp_core::{PowerPointAdapter, UnavailableAdapter};
use ppt_mcp_live::ComAdapter;
use ppt_mcp_pptx::PptxAdapter;

/// Operating system family, as far as backend selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Other
        }
    }
}

/// Builds candidate backends.
pub trait BackendFactory {
    fn live(&self) -> Box<dyn PowerPointAdapter>;

    fn pptx(&self) -> Box<dyn PowerPointAdapter>;
}

/// The real backends of this build.
#[derive(Debug, Default)]
pub struct SystemBackends;

impl BackendFactory for SystemBackends {
    fn live(&self) -> Box<dyn PowerPointAdapter> {
        Box::new(ComAdapter::com())
    }

    fn pptx(&self) -> Box<dyn PowerPointAdapter> {
        Box::new(PptxAdapter::new())
    }
}

/// Pick the adapter for this process.
///
/// `auto` tries live automation on Windows, then the file backend, then
/// falls back to the degraded adapter. `live` and `pptx` only try their own
/// backend before degrading.
pub fn select_adapter(
    host: HostOs,
    preference: BackendPreference,
    backends: &impl BackendFactory,
) -> Box<dyn PowerPointAdapter> {
    if matches!(preference, BackendPreference::Auto | BackendPreference::Live) {
        if host == HostOs::Windows {
            let mut live = backends.live();
            if live.is_available() && live.initialize() {
                log::info!("Using live PowerPoint automation");
                return live;
            }
            log::warn!("PowerPoint automation could not be initialized");
        } else if preference == BackendPreference::Live {
            log::warn!("Live PowerPoint automation requires Windows");
        }
    }

    if matches!(preference, BackendPreference::Auto | BackendPreference::Pptx) {
        let pptx = backends.pptx();
        if pptx.is_available() {
            log::info!("Using PPTX file backend");
            return pptx;
        }
        log::warn!("PPTX file backend is not available");
    }

    log::warn!("No PowerPoint backend available, running degraded");
    Box::new(UnavailableAdapter::new())
}
