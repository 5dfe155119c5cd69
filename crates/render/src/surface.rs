use std::io::{self, Write};

/// Errors from creating a surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface must have a non-zero size, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const BLUE: Rgba = Rgba([0, 0, 255, 255]);
    pub const GREEN: Rgba = Rgba([0, 128, 0, 255]);
    pub const RED: Rgba = Rgba([255, 0, 0, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 255])
    }

    /// Composite over an opaque background and drop alpha.
    pub fn over(self, background: Rgba) -> [u8; 3] {
        let [r, g, b, a] = self.0;
        let a = a as u16;
        let blend = |fg: u8, bg: u8| ((fg as u16 * a + bg as u16 * (255 - a)) / 255) as u8;
        [
            blend(r, background.0[0]),
            blend(g, background.0[1]),
            blend(b, background.0[2]),
        ]
    }
}

/// A fixed-size 2D raster, row-major, origin top-left.
///
/// The surface is sized by its owner and never resized by renderers. Drawing
/// outside the bounds is clipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
    }

    /// Fill the rectangle `[x, x + w) x [y, y + h)`, clipped to the surface.
    ///
    /// Returns the number of pixels written; zero when the rectangle lies
    /// entirely outside.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba) -> usize {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(i64::from(w)).min(i64::from(self.width));
        let y1 = y.saturating_add(i64::from(h)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return 0;
        }

        let stride = self.width as usize;
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize;
            let end = row * stride + x1 as usize;
            self.pixels[start..end].fill(color);
        }
        ((x1 - x0) * (y1 - y0)) as usize
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// True if every pixel in the rectangle equals `color`.
    ///
    /// Pixels outside the surface are ignored.
    pub fn region_is(&self, x: u32, y: u32, w: u32, h: u32, color: Rgba) -> bool {
        (y..y.saturating_add(h))
            .flat_map(|py| (x..x.saturating_add(w)).map(move |px| (px, py)))
            .filter_map(|(px, py)| self.pixel(px, py))
            .all(|c| c == color)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Raw RGBA bytes, row-major. Suitable for texture uploads.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.0).collect()
    }

    /// Write the surface as a binary PPM (P6), compositing over white.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let body: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|p| p.over(Rgba::WHITE))
            .collect();
        out.write_all(&body)?;
        out.flush()
    }
}
