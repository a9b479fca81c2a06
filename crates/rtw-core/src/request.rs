//! Render request passed to the rendering capability

use std::fmt;

use crate::params::RenderParams;

/// Everything one `draw` call needs
///
/// Built fresh on every render trigger from the current UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// JSON scene description, exactly as it appears in the scene editor
    pub scene_text: String,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_bounces: u32,
}

impl RenderRequest {
    /// Create a request from scene text and validated parameters
    pub fn new(scene_text: impl Into<String>, params: RenderParams) -> Self {
        Self {
            scene_text: scene_text.into(),
            width: params.width,
            height: params.height,
            samples_per_pixel: params.samples_per_pixel,
            max_bounces: params.max_bounces,
        }
    }

    /// The numeric parameters of this request
    pub fn params(&self) -> RenderParams {
        RenderParams {
            width: self.width,
            height: self.height,
            samples_per_pixel: self.samples_per_pixel,
            max_bounces: self.max_bounces,
        }
    }

    /// Target surface size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, {} spp, {} bounces, {} bytes of scene",
            self.width,
            self.height,
            self.samples_per_pixel,
            self.max_bounces,
            self.scene_text.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_params() {
        let params = RenderParams {
            width: 400,
            height: 300,
            samples_per_pixel: 10,
            max_bounces: 5,
        };
        let request = RenderRequest::new(r#"{"foo":1}"#, params);

        assert_eq!(request.scene_text, r#"{"foo":1}"#);
        assert_eq!(request.dimensions(), (400, 300));
        assert_eq!(request.params(), params);
        assert_eq!(
            request.to_string(),
            "400x300, 10 spp, 5 bounces, 9 bytes of scene"
        );
    }
}
