use image::{Rgba, RgbaImage};

use super::font::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open: the right and bottom edges are outside
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }
}

impl From<[u32; 4]> for Rect {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

/// CPU-side RGBA8 drawing surface. Everything drawn is clipped to the canvas.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let x_end = rect.x.saturating_add(rect.width).min(self.width());
        let y_end = rect.y.saturating_add(rect.height).min(self.height());
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    /// Outline drawn inside `rect`
    pub fn stroke_rect(&mut self, rect: Rect, thickness: u32, color: Rgba<u8>) {
        let t = thickness.min(rect.width / 2).min(rect.height / 2).max(1);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(
            Rect::new(rect.x, rect.y + rect.height.saturating_sub(t), rect.width, t),
            color,
        );
        self.fill_rect(Rect::new(rect.x, rect.y, t, rect.height), color);
        self.fill_rect(
            Rect::new(rect.x + rect.width.saturating_sub(t), rect.y, t, rect.height),
            color,
        );
    }

    /// Width in pixels of `text` drawn at `scale`
    pub fn text_width(text: &str, scale: u32) -> u32 {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return 0;
        }
        (chars * GLYPH_ADVANCE - 1) * scale
    }

    pub fn text_height(scale: u32) -> u32 {
        GLYPH_HEIGHT * scale
    }

    /// Draws `text` with its top-left corner at (`x`, `y`); each font pixel
    /// becomes a `scale` x `scale` block
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, scale: u32, color: Rgba<u8>) {
        let scale = scale.max(1);
        let mut origin_x = x;
        for c in text.chars() {
            let glyph = font::glyph(c);
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if font::is_set(&glyph, col, row) {
                        self.fill_rect(
                            Rect::new(origin_x + col * scale, y + row * scale, scale, scale),
                            color,
                        );
                    }
                }
            }
            origin_x += GLYPH_ADVANCE * scale;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Raw RGBA bytes, top row first
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(10, 20, 5, 5);
        assert!(rect.contains(10, 20));
        assert!(rect.contains(14, 24));
        assert!(!rect.contains(15, 24));
        assert!(!rect.contains(9, 20));
    }

    #[test]
    fn test_fill_rect_is_clipped_to_canvas() {
        let mut canvas = Canvas::new(8, 8);
        canvas.clear(BLACK);
        canvas.fill_rect(Rect::new(6, 6, 10, 10), RED);

        assert_eq!(canvas.pixel(7, 7), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some(BLACK));
        assert_eq!(canvas.pixel(8, 8), None);
        assert_eq!(canvas.as_raw().len(), 8 * 8 * 4);
    }

    #[test]
    fn test_stroke_leaves_interior_untouched() {
        let mut canvas = Canvas::new(10, 10);
        canvas.clear(BLACK);
        canvas.stroke_rect(Rect::new(0, 0, 10, 10), 2, RED);

        assert_eq!(canvas.pixel(0, 5), Some(RED));
        assert_eq!(canvas.pixel(9, 9), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some(BLACK));
    }

    #[test]
    fn test_text_is_drawn_at_scale() {
        let mut canvas = Canvas::new(32, 32);
        canvas.clear(BLACK);
        canvas.draw_text(2, 2, "L", 2, RED);

        // Left column of "L" covers x 2..4 for every row
        assert_eq!(canvas.pixel(2, 2), Some(RED));
        assert_eq!(canvas.pixel(3, 15), Some(RED));
        // Top-right of "L" is empty
        assert_eq!(canvas.pixel(10, 2), Some(BLACK));
        assert_eq!(Canvas::text_width("L", 2), 10);
        assert_eq!(Canvas::text_width("AB", 1), 11);
        assert_eq!(Canvas::text_width("", 3), 0);
    }
}
