use ndarray::ArrayView3;

/// Pixel layout of a [`Frame`]'s bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 32-bit blue/green/red/alpha, the layout the capture output asks for.
    #[default]
    Bgra32,
    Rgb24,
}

impl PixelFormat {
    pub fn channels(self) -> u8 {
        match self {
            PixelFormat::Bgra32 => 4,
            PixelFormat::Rgb24 => 3,
        }
    }

    /// Byte offsets of the red, green and blue samples inside one pixel.
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelFormat::Bgra32 => [2, 1, 0],
            PixelFormat::Rgb24 => [0, 1, 2],
        }
    }
}

/// One camera image: contiguous pixel bytes in row-major order.
///
/// Frames are ephemeral. The session hands each one to the preview slot and
/// at most one detection pass, then drops it.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (format.channels() as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            format,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> u8 {
        self.format.channels()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns `(r, g, b)` at pixel `(x, y)` regardless of the byte layout.
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let channels = self.channels() as usize;
        let base = (y as usize * self.width as usize + x as usize) * channels;
        let [r, g, b] = self.format.rgb_offsets();
        (
            self.data[base + r],
            self.data[base + g],
            self.data[base + b],
        )
    }

    /// Rotates the image clockwise by a multiple of 90 degrees.
    ///
    /// Angles are normalised into `0..360`; anything that is not a multiple
    /// of 90 is rounded down to the previous quarter turn.
    pub fn rotated(&self, degrees: u32) -> Frame {
        let quarter_turns = (degrees % 360) / 90;
        if quarter_turns == 0 {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let channels = self.channels() as usize;
        let (dst_w, dst_h) = if quarter_turns % 2 == 1 { (h, w) } else { (w, h) };
        let mut out = vec![0u8; self.data.len()];

        for y in 0..h {
            for x in 0..w {
                let (dx, dy) = match quarter_turns {
                    1 => (h - 1 - y, x),
                    2 => (w - 1 - x, h - 1 - y),
                    _ => (y, w - 1 - x),
                };
                let src = (y * w + x) * channels;
                let dst = (dy * dst_w + dx) * channels;
                out[dst..dst + channels].copy_from_slice(&self.data[src..src + channels]);
            }
        }

        Frame::new(out, dst_w as u32, dst_h as u32, self.format, self.index)
    }

    /// Mirrors the image around its vertical axis.
    pub fn mirrored(&self) -> Frame {
        let w = self.width as usize;
        let channels = self.channels() as usize;
        let row_len = w * channels;
        if row_len == 0 {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.data.len());

        for row in self.data.chunks_exact(row_len) {
            for x in (0..w).rev() {
                out.extend_from_slice(&row[x * channels..(x + 1) * channels]);
            }
        }

        Frame::new(out, self.width, self.height, self.format, self.index)
    }

    /// Converts to tightly packed RGBA bytes for display surfaces.
    pub fn to_rgba(&self) -> Vec<u8> {
        let channels = self.channels() as usize;
        let [r, g, b] = self.format.rgb_offsets();
        let has_alpha = channels == 4;
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);

        for px in self.data.chunks_exact(channels) {
            out.push(px[r]);
            out.push(px[g]);
            out.push(px[b]);
            out.push(if has_alpha { px[3] } else { 255 });
        }
        out
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels() as usize,
        )
    }
}
