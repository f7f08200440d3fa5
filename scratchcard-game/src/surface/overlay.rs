use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Slate base colour of the overlay, fully opaque.
pub const OVERLAY_BASE: [u8; 4] = [0x64, 0x74, 0x8b, 0xff];
pub const OVERLAY_LABEL: &str = "RASPE AQUI";
const SPECKLE_COUNT: usize = 2000;
const SPECKLE_MAX_DARKEN: f64 = 0.15;
/// Strength of the label tint over the fill. Alpha is never touched.
const LABEL_TINT: f64 = 0.2;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// RGBA overlay covering the prize panel. Erasing clears pixels to fully
/// transparent; coverage is read back from the alpha channel.
#[derive(Clone)]
pub struct OverlayBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl OverlayBuffer {
    /// Opaque fill with darker speckles. The speckle pattern is seeded by the
    /// dimensions, so a redraw at the same size looks the same.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&OVERLAY_BASE);
        }

        let mut buffer = Self {
            width,
            height,
            pixels,
        };
        buffer.speckle();
        buffer.stamp_label();
        buffer
    }

    fn speckle(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let mut rng = StdRng::seed_from_u64(((self.width as u64) << 32) | self.height as u64);
        for _ in 0..SPECKLE_COUNT {
            let x = rng.gen_range(0..self.width);
            let y = rng.gen_range(0..self.height);
            let keep = 1.0 - rng.gen_range(0.0..SPECKLE_MAX_DARKEN);

            let offset = self.offset(x, y);
            for channel in &mut self.pixels[offset..offset + 3] {
                *channel = (*channel as f64 * keep) as u8;
            }
        }
    }

    /// Block-letter [`OVERLAY_LABEL`] lightened into the colour channels,
    /// centred on the label anchor. Too small a surface gets no label.
    fn stamp_label(&mut self) {
        let columns = OVERLAY_LABEL.chars().count() as u32 * (GLYPH_WIDTH + 1) - 1;
        let scale = (self.width as f64 * 0.6 / columns as f64)
            .min(self.height as f64 * 0.15 / GLYPH_HEIGHT as f64)
            .floor() as u32;
        if scale == 0 {
            return;
        }

        let (cx, cy) = self.label_anchor();
        let left = (cx - (columns * scale) as f64 / 2.0).max(0.0) as u32;
        let top = (cy - (GLYPH_HEIGHT * scale) as f64 / 2.0).max(0.0) as u32;

        for (index, c) in OVERLAY_LABEL.chars().enumerate() {
            let Some(rows) = glyph(c) else {
                continue;
            };
            let origin_x = left + index as u32 * (GLYPH_WIDTH + 1) * scale;

            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.tint_block(origin_x + col * scale, top + row as u32 * scale, scale);
                }
            }
        }
    }

    fn tint_block(&mut self, x0: u32, y0: u32, size: u32) {
        for y in y0..(y0 + size).min(self.height) {
            for x in x0..(x0 + size).min(self.width) {
                let offset = self.offset(x, y);
                for channel in &mut self.pixels[offset..offset + 3] {
                    *channel += ((255 - *channel) as f64 * LABEL_TINT) as u8;
                }
            }
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Centre of the [`OVERLAY_LABEL`] stamp.
    pub fn label_anchor(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.offset(x, y) + 3])
    }

    /// Clear every pixel whose centre lies inside the disc. Returns how many
    /// pixels went from visible to transparent.
    pub fn erase_disc(&mut self, cx: f64, cy: f64, radius: f64) -> usize {
        if self.width == 0
            || self.height == 0
            || !radius.is_finite()
            || radius <= 0.0
            || !cx.is_finite()
            || !cy.is_finite()
        {
            return 0;
        }

        let min_x = (cx - radius).floor().max(0.0) as i64;
        let max_x = (cx + radius).ceil().min(self.width as f64 - 1.0) as i64;
        let min_y = (cy - radius).floor().max(0.0) as i64;
        let max_y = (cy + radius).ceil().min(self.height as f64 - 1.0) as i64;
        let radius_sq = radius * radius;
        let mut cleared = 0;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }

                let offset = self.offset(x as u32, y as u32);
                if self.pixels[offset + 3] != 0 {
                    cleared += 1;
                }
                self.pixels[offset..offset + 4].fill(0);
            }
        }

        cleared
    }
}

/// 5x7 bitmaps for the letters of [`OVERLAY_LABEL`], one row per byte.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        _ => return None,
    };
    Some(rows)
}

/// Percentage of fully transparent pixels. O(pixels) per call.
pub fn compute_coverage(buffer: &OverlayBuffer) -> f64 {
    let total = buffer.pixels.len() / 4;
    if total == 0 {
        return 0.0;
    }

    let transparent = buffer
        .pixels
        .chunks_exact(4)
        .filter(|pixel| pixel[3] == 0)
        .count();

    100.0 * transparent as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_overlay_is_opaque() {
        let buffer = OverlayBuffer::new(64, 32);
        assert_eq!(buffer.pixels().len(), 64 * 32 * 4);
        assert!(buffer.pixels().chunks_exact(4).all(|px| px[3] == 0xff));
        assert_eq!(compute_coverage(&buffer), 0.0);
    }

    #[test]
    fn test_same_size_redraw_is_identical() {
        let a = OverlayBuffer::new(50, 40);
        let b = OverlayBuffer::new(50, 40);
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_erase_disc_clears_inside_only() {
        let mut buffer = OverlayBuffer::new(100, 100);
        let cleared = buffer.erase_disc(50.0, 50.0, 10.0);

        assert!(cleared > 300 && cleared < 330, "cleared {cleared}");
        assert_eq!(buffer.alpha_at(50, 50), Some(0));
        assert_eq!(buffer.alpha_at(50, 62), Some(0xff));
        assert_eq!(buffer.alpha_at(100, 0), None);

        // erasing the same spot again clears nothing new
        assert_eq!(buffer.erase_disc(50.0, 50.0, 10.0), 0);
    }

    #[test]
    fn test_erase_outside_bounds() {
        let mut buffer = OverlayBuffer::new(20, 20);
        assert_eq!(buffer.erase_disc(-50.0, -50.0, 10.0), 0);
        assert_eq!(buffer.erase_disc(f64::NAN, 5.0, 10.0), 0);
        assert!(buffer.erase_disc(0.0, 0.0, 5.0) > 0);
    }

    #[test]
    fn test_label_is_tinted_not_transparent() {
        let buffer = OverlayBuffer::new(480, 270);
        // speckles only darken, so anything lighter than the base is label
        let lighter = buffer
            .pixels()
            .chunks_exact(4)
            .filter(|px| px[0] > OVERLAY_BASE[0])
            .count();

        assert!(lighter > 0);
        assert!(buffer.pixels().chunks_exact(4).all(|px| px[3] == 0xff));
        assert_eq!(compute_coverage(&buffer), 0.0);
    }

    #[test]
    fn test_non_finite_radius_erases_nothing() {
        let mut buffer = OverlayBuffer::new(40, 40);
        assert_eq!(buffer.erase_disc(20.0, 20.0, f64::NAN), 0);
        assert_eq!(buffer.erase_disc(20.0, 20.0, f64::INFINITY), 0);
        assert_eq!(buffer.erase_disc(20.0, 20.0, -3.0), 0);
        assert_eq!(compute_coverage(&buffer), 0.0);
    }

    #[test]
    fn test_coverage_counts_transparent_pixels() {
        let mut buffer = OverlayBuffer::new(10, 10);
        buffer.erase_disc(5.0, 5.0, 100.0);
        assert_eq!(compute_coverage(&buffer), 100.0);

        assert_eq!(compute_coverage(&OverlayBuffer::new(0, 10)), 0.0);
    }
}
