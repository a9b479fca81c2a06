//! RTW core data structures
//!
//! Everything the render controller needs that does not touch a host:
//! - Render parameter fields and the parameter validator
//! - RenderRequest: arguments of one `draw` call
//! - Scene catalog and scene text formatting
//! - Draw surfaces
//! - Diagnostic channels, sink and log

pub mod diagnostics;
pub mod params;
pub mod request;
pub mod scene;
pub mod surface;

pub use diagnostics::*;
pub use params::*;
pub use request::*;
pub use scene::*;
pub use surface::*;
