//! RTW Frontend
//!
//! Render request controller for the ray tracer page, with a native dry-run
//! driver for checking scenes and parameters outside the browser.

pub mod capability;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod logging;
pub mod panel;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use capability::{CapabilityError, DryRunCapability, RenderingCapability};
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use controller::{
    AcquisitionError, ControllerError, ControllerPhase, PendingLoad, RenderController,
    SharedController,
};
#[cfg(not(target_arch = "wasm32"))]
pub use fetch::NativeSceneFetcher;
pub use fetch::{FetchError, SceneFetcher};
pub use logging::init_logging;
pub use panel::{ControlPanel, FormState};
