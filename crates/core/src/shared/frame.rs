use ndarray::ArrayView3;

/// An RGB color triple.
pub type Rgb = [u8; 3];

/// A single camera/video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the attention core never
/// looks at pixels, the landmark source and overlay renderer do.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgb, index: usize) -> Self {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of this frame in its source stream.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let offset = self.offset(x as i64, y as i64)?;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Writes one pixel; coordinates outside the frame are ignored.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(offset) = self.offset(x, y) {
            self.data[offset..offset + CHANNELS].copy_from_slice(&color);
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * CHANNELS)
    }
}
