//! Rendering capability interface
//!
//! The rendering capability is the external module that turns a scene and
//! render parameters into pixels. The controller only knows this trait.

use std::future::Future;

use rtw_core::{DrawSurface, ErrorChannel, PixelSurface, RenderRequest};
use thiserror::Error;

/// Error type for rendering capability setup
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("Rendering capability failed to initialize: {0}")]
    Initialization(String),

    #[error("Rendering capability not available: {0}")]
    NotAvailable(String),
}

/// The external rendering capability
///
/// `initialize` must complete once before the first `draw`. The controller
/// guarantees this ordering.
pub trait RenderingCapability {
    /// Surface type this capability draws into
    type Surface: DrawSurface;

    /// Get the name of this capability
    fn name(&self) -> &str;

    /// One-time asynchronous setup
    ///
    /// Problems that do not end initialization are reported through
    /// `channel`; a returned error means the capability is unusable.
    fn initialize(
        &mut self,
        channel: &dyn ErrorChannel,
    ) -> impl Future<Output = Result<(), CapabilityError>>;

    /// Render `request` into `surface`
    ///
    /// The surface has already been resized to the request's dimensions.
    /// Problems are reported through `channel`, any number of times; there is
    /// no return value to act on.
    fn draw(
        &mut self,
        surface: &mut Self::Surface,
        request: &RenderRequest,
        channel: &dyn ErrorChannel,
    );
}

/// A capability that logs each request instead of producing pixels
///
/// Used by the native driver to check scenes and parameters offline.
#[derive(Debug, Default)]
pub struct DryRunCapability {
    initialized: bool,
    draws: u64,
}

impl DryRunCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `draw` calls so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RenderingCapability for DryRunCapability {
    type Surface = PixelSurface;

    fn name(&self) -> &str {
        "dry-run"
    }

    async fn initialize(&mut self, _channel: &dyn ErrorChannel) -> Result<(), CapabilityError> {
        self.initialized = true;
        Ok(())
    }

    fn draw(
        &mut self,
        surface: &mut PixelSurface,
        request: &RenderRequest,
        channel: &dyn ErrorChannel,
    ) {
        if !self.initialized {
            channel.error(&["draw called before initialization".to_string()]);
            return;
        }
        self.draws += 1;

        // Same first check a real renderer does with the scene text
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&request.scene_text) {
            channel.error(&["Unable to parse scene json!".to_string(), e.to_string()]);
            return;
        }

        tracing::info!(
            surface = ?surface.size(),
            "dry run: {}",
            request
        );
    }
}

#[cfg(test)]
mod tests {
    use rtw_core::{MemoryChannel, RenderParams};

    use super::*;

    fn request(scene: &str) -> RenderRequest {
        RenderRequest::new(
            scene,
            RenderParams {
                width: 4,
                height: 3,
                samples_per_pixel: 1,
                max_bounces: 0,
            },
        )
    }

    #[test]
    fn test_dry_run_requires_initialize() {
        let mut capability = DryRunCapability::new();
        let mut surface = PixelSurface::new(4, 3);
        let channel = MemoryChannel::new();

        capability.draw(&mut surface, &request("{}"), &channel);
        assert_eq!(capability.draws(), 0);
        assert_eq!(channel.calls().len(), 1);

        pollster::block_on(capability.initialize(&channel)).unwrap();
        capability.draw(&mut surface, &request("{}"), &channel);
        assert_eq!(capability.draws(), 1);
        assert_eq!(channel.calls().len(), 1);
    }

    #[test]
    fn test_dry_run_reports_bad_scene() {
        let mut capability = DryRunCapability::new();
        let channel = MemoryChannel::new();
        pollster::block_on(capability.initialize(&channel)).unwrap();

        capability.draw(&mut PixelSurface::new(4, 3), &request("not json"), &channel);

        let calls = channel.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "Unable to parse scene json!");
        assert_eq!(calls[0].len(), 2);
    }
}
