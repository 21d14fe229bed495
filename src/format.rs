//! Output format and crop geometry.
//!
//! The sensor is operated in exactly one mode; negotiation always resolves to
//! it. The crop surface exists for API symmetry with format negotiation and
//! always reports the full pixel array.

/// Pixel encodings the sensor can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelCode {
    /// 12-bit raw Bayer, RGGB order.
    Srggb12,
}

/// The negotiated output format and frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFormat {
    pub width: u32,
    pub height: u32,
    pub code: PixelCode,
}

impl ActiveFormat {
    /// The single mode this driver programs the sensor into.
    pub const FIXED: Self = Self {
        width: 1280,
        height: 800,
        code: PixelCode::Srggb12,
    };

    /// Enumerates the selectable modes. There is exactly one.
    pub fn supported() -> &'static [ActiveFormat] {
        &[Self::FIXED]
    }
}

impl Default for ActiveFormat {
    fn default() -> Self {
        Self::FIXED
    }
}

/// A rectangle within the pixel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// The full active pixel array. No optical cropping is implemented.
    pub const FULL: Self = Self {
        left: 0,
        top: 0,
        width: 1280,
        height: 800,
    };
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::FULL
    }
}

/// Selection rectangles a caller can address. Only [`CropTarget::Crop`] is
/// supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropTarget {
    Crop,
    CropBounds,
    CropDefault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_supported_mode() {
        assert_eq!(ActiveFormat::supported(), &[ActiveFormat::FIXED]);
        assert_eq!(ActiveFormat::default(), ActiveFormat::FIXED);
    }

    #[test]
    fn test_default_crop_covers_the_array() {
        let crop = CropRegion::default();
        assert_eq!(crop, CropRegion::FULL);
        assert_eq!((crop.width, crop.height), (1280, 800));
        assert_eq!((crop.left, crop.top), (0, 0));
    }
}
