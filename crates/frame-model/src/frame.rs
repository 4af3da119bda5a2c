//! Raw pixel buffers produced by capture backends.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Errors raised when a buffer does not match its declared geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("buffer too small: {actual} bytes for {width}x{height} (stride {stride}, need {required})")]
    BufferTooSmall {
        width: u32,
        height: u32,
        stride: usize,
        required: usize,
        actual: usize,
    },

    #[error("stride {stride} shorter than a row of {row_bytes} bytes")]
    StrideTooShort { stride: usize, row_bytes: usize },

    #[error("empty frame ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("region ({x}, {y}, {width}x{height}) outside frame {frame_width}x{frame_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Channel order of a packed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    Bgra,
    Rgba,
    Bgr,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra | Self::Rgba => 4,
            Self::Bgr => 3,
        }
    }

    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::Bgr)
    }

    /// Byte offsets of red, green and blue within one pixel.
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            Self::Rgba => [0, 1, 2],
            Self::Bgra | Self::Bgr => [2, 1, 0],
        }
    }
}

/// One captured frame: pixel bytes plus geometry.
///
/// Rows may be padded (`stride >= width * bytes_per_pixel`). The buffer
/// belongs to whoever grabbed it; anything keeping it past a tick clones it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    stride: usize,
}

impl FrameBuffer {
    /// Wrap tightly packed pixel bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32, layout: PixelLayout) -> Result<Self, FrameError> {
        let stride = width as usize * layout.bytes_per_pixel();
        Self::with_stride(data, width, height, layout, stride)
    }

    /// Wrap pixel bytes with an explicit row stride.
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        layout: PixelLayout,
        stride: usize,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let row_bytes = width as usize * layout.bytes_per_pixel();
        if stride < row_bytes {
            return Err(FrameError::StrideTooShort { stride, row_bytes });
        }
        let required = stride * (height as usize - 1) + row_bytes;
        if data.len() < required {
            return Err(FrameError::BufferTooSmall {
                width,
                height,
                stride,
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
            stride,
        })
    }

    /// A frame filled with one colour given as `[r, g, b, a]`.
    pub fn solid(width: u32, height: u32, layout: PixelLayout, rgba: [u8; 4]) -> Result<Self, FrameError> {
        let bpp = layout.bytes_per_pixel();
        let [r, g, b, a] = rgba;
        let pixel: Vec<u8> = match layout {
            PixelLayout::Rgba => vec![r, g, b, a],
            PixelLayout::Bgra => vec![b, g, r, a],
            PixelLayout::Bgr => vec![b, g, r],
        };
        let mut data = Vec::with_capacity(width as usize * height as usize * bpp);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&pixel);
        }
        Self::new(data, width, height, layout)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.layout.bytes_per_pixel()
    }

    /// Raw bytes including any row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_tightly_packed(&self) -> bool {
        self.stride == self.width as usize * self.bytes_per_pixel()
    }

    /// Pixel bytes of row `y` without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.bytes_per_pixel()]
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`; 3-channel frames report opaque alpha.
    pub fn rgba_at(&self, x: u32, y: u32) -> [u8; 4] {
        let bpp = self.bytes_per_pixel();
        let px = &self.row(y)[x as usize * bpp..(x as usize + 1) * bpp];
        let [ri, gi, bi] = self.layout.rgb_offsets();
        let a = if self.layout.has_alpha() { px[3] } else { 255 };
        [px[ri], px[gi], px[bi], a]
    }

    /// Contiguous pixel bytes, copying only when rows are padded.
    pub fn packed(&self) -> Cow<'_, [u8]> {
        if self.is_tightly_packed() {
            let len = self.stride * self.height as usize;
            return Cow::Borrowed(&self.data[..len]);
        }
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * self.bytes_per_pixel());
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        Cow::Owned(out)
    }

    /// Copy a sub-region into a new, tightly packed frame.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, FrameError> {
        let out_of_bounds = width == 0
            || height == 0
            || x.checked_add(width).map_or(true, |r| r > self.width)
            || y.checked_add(height).map_or(true, |b| b > self.height);
        if out_of_bounds {
            return Err(FrameError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                frame_width: self.width,
                frame_height: self.height,
            });
        }
        let bpp = self.bytes_per_pixel();
        let mut out = Vec::with_capacity(width as usize * height as usize * bpp);
        for row in y..y + height {
            let line = self.row(row);
            out.extend_from_slice(&line[x as usize * bpp..(x + width) as usize * bpp]);
        }
        Self::new(out, width, height, self.layout)
    }
}
