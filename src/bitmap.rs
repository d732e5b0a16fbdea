//! Raw bitmaps handed in by producers
//!
//! A [`Bitmap`] is an immutable, reference-counted block of pixels plus the
//! geometry needed to read it (width, height, row stride in elements). Image
//! panels compare bitmaps by data pointer, so re-publishing the same bitmap
//! never re-uploads a texture.

use std::sync::Arc;

/// Pixel layouts accepted by image panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Bgr8,
    Bgra8,
    /// Float channels are expected in `[0, 1]` and clamped on upload
    Gray32F,
    Bgr32F,
    Bgra32F,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Gray32F => 1,
            PixelFormat::Bgr8 | PixelFormat::Bgr32F => 3,
            PixelFormat::Bgra8 | PixelFormat::Bgra32F => 4,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            PixelFormat::Gray32F | PixelFormat::Bgr32F | PixelFormat::Bgra32F
        )
    }
}

/// Shared pixel storage
#[derive(Debug, Clone)]
pub enum PixelData {
    U8(Arc<[u8]>),
    F32(Arc<[f32]>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            PixelData::U8(data) => data.len(),
            PixelData::F32(data) => data.len(),
        }
    }

    fn ptr_eq(&self, other: &PixelData) -> bool {
        match (self, other) {
            (PixelData::U8(a), PixelData::U8(b)) => Arc::ptr_eq(a, b),
            (PixelData::F32(a), PixelData::F32(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An immutable image published to an image panel
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: usize,
    height: usize,
    /// Elements (not bytes) between the starts of two rows
    stride: usize,
    format: PixelFormat,
    data: PixelData,
}

impl Bitmap {
    /// Tightly packed 8-bit bitmap
    pub fn from_u8(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: impl Into<Arc<[u8]>>,
    ) -> Result<Self, String> {
        Self::new(width, height, width.saturating_mul(format.channels()), format, PixelData::U8(data.into()))
    }

    /// Tightly packed float bitmap
    pub fn from_f32(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: impl Into<Arc<[f32]>>,
    ) -> Result<Self, String> {
        Self::new(width, height, width.saturating_mul(format.channels()), format, PixelData::F32(data.into()))
    }

    /// Bitmap whose rows are `stride` elements apart (e.g. a sub-view of a larger buffer)
    pub fn new(
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
        data: PixelData,
    ) -> Result<Self, String> {
        let float_data = matches!(data, PixelData::F32(_));
        if float_data != format.is_float() {
            return Err(format!(
                "Pixel format {:?} does not match {} sample data",
                format,
                if float_data { "f32" } else { "u8" }
            ));
        }

        let row_len = width
            .checked_mul(format.channels())
            .ok_or_else(|| format!("{}-pixel {:?} row overflows usize", width, format))?;
        if stride < row_len {
            return Err(format!(
                "Row stride {} is shorter than a {}-pixel {:?} row ({} elements)",
                stride, width, format, row_len
            ));
        }

        let required = match height {
            0 => 0,
            _ => stride
                .checked_mul(height - 1)
                .and_then(|rows| rows.checked_add(row_len))
                .ok_or_else(|| format!("{}x{} bitmap with stride {} overflows usize", width, height, stride))?,
        };
        if data.len() < required {
            return Err(format!(
                "{}x{} {:?} bitmap needs {} elements, got {}",
                width,
                height,
                format,
                required,
                data.len()
            ));
        }

        Ok(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when both bitmaps share the same pixel storage
    pub fn same_data(&self, other: &Bitmap) -> bool {
        self.data.ptr_eq(&other.data)
    }

    /// Convert to an RGBA egui image, honoring the row stride
    pub fn to_color_image(&self) -> egui::ColorImage {
        let channels = self.format.channels();
        let mut rgba = Vec::with_capacity(self.width * self.height * 4);

        for y in 0..self.height {
            let row_start = y * self.stride;
            for x in 0..self.width {
                let start = row_start + x * channels;
                let pixel = match &self.data {
                    PixelData::U8(data) => bgra_from_u8(&data[start..start + channels]),
                    PixelData::F32(data) => bgra_from_f32(&data[start..start + channels]),
                };
                rgba.extend_from_slice(&pixel);
            }
        }

        egui::ColorImage::from_rgba_unmultiplied([self.width, self.height], &rgba)
    }
}

fn bgra_from_u8(px: &[u8]) -> [u8; 4] {
    match *px {
        [v] => [v, v, v, 255],
        [b, g, r] => [r, g, b, 255],
        [b, g, r, a] => [r, g, b, a],
        _ => [0, 0, 0, 255],
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn bgra_from_f32(px: &[f32]) -> [u8; 4] {
    let mut bytes = [0u8; 4];
    for (dst, src) in bytes.iter_mut().zip(px) {
        *dst = unit_to_u8(*src);
    }
    match px.len() {
        1 => bgra_from_u8(&bytes[..1]),
        3 => bgra_from_u8(&bytes[..3]),
        _ => bgra_from_u8(&bytes),
    }
}

impl From<image::GrayImage> for Bitmap {
    fn from(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width: width as usize,
            height: height as usize,
            stride: width as usize,
            format: PixelFormat::Gray8,
            data: PixelData::U8(img.into_raw().into()),
        }
    }
}

impl From<image::RgbImage> for Bitmap {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let mut raw = img.into_raw();
        for px in raw.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        Self {
            width: width as usize,
            height: height as usize,
            stride: width as usize * 3,
            format: PixelFormat::Bgr8,
            data: PixelData::U8(raw.into()),
        }
    }
}

impl From<image::RgbaImage> for Bitmap {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut raw = img.into_raw();
        for px in raw.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Self {
            width: width as usize,
            height: height as usize,
            stride: width as usize * 4,
            format: PixelFormat::Bgra8,
            data: PixelData::U8(raw.into()),
        }
    }
}

impl From<&image::DynamicImage> for Bitmap {
    fn from(img: &image::DynamicImage) -> Self {
        match img {
            image::DynamicImage::ImageLuma8(gray) => gray.clone().into(),
            image::DynamicImage::ImageRgb8(rgb) => rgb.clone().into(),
            other => other.to_rgba8().into(),
        }
    }
}
