//! Raw decoded frames.
//!
//! [`RawFrame`] is the unit of work flowing through the pipeline: a tightly
//! packed pixel buffer plus the dimensions and [`PixelFormat`] needed to
//! encode it. Frames are produced by a [`FrameSource`](crate::FrameSource),
//! owned exclusively by their persistence job, and released once written.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use ffmpeg_next::format::Pixel;
use image::ExtendedColorType;

/// Pixel format of a decoded frame buffer.
///
/// Controls the colour model of the buffers produced by
/// [`VideoSource`](crate::VideoSource) and the encoding performed by
/// [`ImagePersister`](crate::ImagePersister).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Rgba8 => Pixel::RGBA,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Map to the corresponding `image` colour type for encoding.
    pub(crate) fn to_color_type(self) -> ExtendedColorType {
        match self {
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
            PixelFormat::Rgba8 => ExtendedColorType::Rgba8,
            PixelFormat::Gray8 => ExtendedColorType::L8,
        }
    }

    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One decoded still image, in source order.
///
/// The pixel buffer is tightly packed — `width × height × bytes_per_pixel`
/// with no per-row padding. FFmpeg frames frequently carry stride padding;
/// [`VideoSource`](crate::VideoSource) strips it before constructing a
/// `RawFrame`, so the buffer can be handed to an image encoder as-is.
#[derive(Clone)]
pub struct RawFrame {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    data: Vec<u8>,
}

impl Debug for RawFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_format", &self.pixel_format)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl RawFrame {
    /// Wrap a packed pixel buffer.
    ///
    /// `data.len()` must equal `width × height × bytes_per_pixel`.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * pixel_format.bytes_per_pixel(),
        );
        Self {
            width,
            height,
            pixel_format,
            data,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format of the buffer.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The packed pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
