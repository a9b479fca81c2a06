//! Draw surfaces that receive rendered pixels

/// A pixel-addressable render target
pub trait DrawSurface {
    /// Current size in pixels as `(width, height)`
    fn size(&self) -> (u32, u32);

    /// Resize the surface. Existing content is discarded.
    fn resize(&mut self, width: u32, height: u32);
}

/// Surface errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Pixel data has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// In-memory RGBA surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Default for PixelSurface {
    /// Same initial size as an HTML canvas
    fn default() -> Self {
        Self::new(300, 150)
    }
}

impl PixelSurface {
    /// Create a cleared surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; Self::byte_len(width, height)],
        }
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Replace the whole image with `data` (RGBA, row-major)
    pub fn put_rgba(&mut self, data: &[u8]) -> Result<(), SurfaceError> {
        if data.len() != self.pixels.len() {
            return Err(SurfaceError::SizeMismatch {
                expected: self.pixels.len(),
                actual: data.len(),
            });
        }
        self.pixels.copy_from_slice(data);
        Ok(())
    }

    /// RGBA value at `(x, y)`, if in bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }
}

impl DrawSurface for PixelSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(Self::byte_len(width, height), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_clears() {
        let mut surface = PixelSurface::new(2, 1);
        surface.put_rgba(&[255; 8]).unwrap();
        assert_eq!(surface.pixel(1, 0), Some([255; 4]));

        surface.resize(2, 1);
        assert_eq!(surface.pixel(1, 0), Some([0; 4]));

        surface.resize(400, 300);
        assert_eq!(surface.size(), (400, 300));
        assert_eq!(surface.as_rgba().len(), 400 * 300 * 4);
    }

    #[test]
    fn test_put_rgba_size_mismatch() {
        let mut surface = PixelSurface::new(2, 2);
        assert_eq!(
            surface.put_rgba(&[0; 4]),
            Err(SurfaceError::SizeMismatch {
                expected: 16,
                actual: 4
            })
        );
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let surface = PixelSurface::default();
        assert_eq!(surface.size(), (300, 150));
        assert!(surface.pixel(300, 0).is_none());
        assert!(surface.pixel(0, 150).is_none());
    }
}
