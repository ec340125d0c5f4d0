use image::Rgba;

use super::canvas::{Canvas, Rect};
use crate::config::{ButtonSpec, ScreenConfig};

const BACKGROUND: Rgba<u8> = Rgba([18, 22, 30, 255]);
const TITLE: Rgba<u8> = Rgba([235, 240, 250, 255]);
const BUTTON: Rgba<u8> = Rgba([44, 52, 70, 255]);
const BUTTON_ACTIVE: Rgba<u8> = Rgba([66, 128, 220, 255]);
const BUTTON_BORDER: Rgba<u8> = Rgba([190, 200, 220, 255]);
const TEXT: Rgba<u8> = Rgba([210, 215, 225, 255]);

const MARGIN: u32 = 16;
const TITLE_SCALE: u32 = 3;
const LABEL_SCALE: u32 = 2;
const BODY_SCALE: u32 = 2;
const LINE_GAP: u32 = 6;

const HINT: &str = "Click a button above.";

/// A clickable region of the screen and the page it opens
#[derive(Debug, Clone)]
pub struct ScreenButton {
    pub label: String,
    pub rect: Rect,
    pub lines: Vec<String>,
}

impl From<&ButtonSpec> for ScreenButton {
    fn from(spec: &ButtonSpec) -> Self {
        Self {
            label: spec.label.clone(),
            rect: Rect::from(spec.rect),
            lines: spec.lines.clone(),
        }
    }
}

/// The screen's content: a title, a row of buttons and the active page
pub struct ScreenDisplay {
    canvas: Canvas,
    title: String,
    buttons: Vec<ScreenButton>,
    active: Option<usize>,
    dirty: bool,
}

impl ScreenDisplay {
    pub fn new(config: &ScreenConfig) -> Self {
        let mut display = Self {
            canvas: Canvas::new(config.width, config.height),
            title: config.title.clone(),
            buttons: config.buttons.iter().map(ScreenButton::from).collect(),
            active: None,
            dirty: false,
        };
        display.redraw();
        display
    }

    /// Repaints the whole canvas and marks it for upload
    pub fn redraw(&mut self) {
        self.canvas.clear(BACKGROUND);
        self.canvas.draw_text(MARGIN, MARGIN, &self.title, TITLE_SCALE, TITLE);

        let mut body_top = MARGIN + Canvas::text_height(TITLE_SCALE) + MARGIN;
        for (index, button) in self.buttons.iter().enumerate() {
            let fill = if self.active == Some(index) {
                BUTTON_ACTIVE
            } else {
                BUTTON
            };
            self.canvas.fill_rect(button.rect, fill);
            self.canvas.stroke_rect(button.rect, 2, BUTTON_BORDER);

            let label_width = Canvas::text_width(&button.label, LABEL_SCALE);
            let label_height = Canvas::text_height(LABEL_SCALE);
            let x = button.rect.x + button.rect.width.saturating_sub(label_width) / 2;
            let y = button.rect.y + button.rect.height.saturating_sub(label_height) / 2;
            self.canvas.draw_text(x, y, &button.label, LABEL_SCALE, TITLE);

            body_top = body_top.max(button.rect.y + button.rect.height + MARGIN);
        }

        let line_height = Canvas::text_height(BODY_SCALE) + LINE_GAP;
        match self.active.and_then(|index| self.buttons.get(index)) {
            Some(button) => {
                for (row, line) in button.lines.iter().enumerate() {
                    let y = body_top + row as u32 * line_height;
                    self.canvas.draw_text(MARGIN, y, line, BODY_SCALE, TEXT);
                }
            }
            None => self.canvas.draw_text(MARGIN, body_top, HINT, BODY_SCALE, TEXT),
        }

        self.dirty = true;
    }

    /// Hit-tests a click given as a texture coordinate of the screen mesh.
    ///
    /// On a hit the button becomes active and the canvas is redrawn. Returns
    /// the index of the button that was hit.
    pub fn click_uv(&mut self, uv: [f32; 2]) -> Option<usize> {
        let (x, y) = self.uv_to_pixel(uv)?;
        self.click_pixel(x, y)
    }

    pub fn click_pixel(&mut self, x: u32, y: u32) -> Option<usize> {
        let index = self
            .buttons
            .iter()
            .position(|button| button.rect.contains(x, y))?;
        if self.active != Some(index) {
            self.active = Some(index);
            self.redraw();
        }
        Some(index)
    }

    /// Canvas pixel under a texture coordinate, None outside [0, 1]
    pub fn uv_to_pixel(&self, uv: [f32; 2]) -> Option<(u32, u32)> {
        let [u, v] = uv;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        let width = self.canvas.width();
        let height = self.canvas.height();
        let x = ((u * width as f32) as u32).min(width - 1);
        let y = ((v * height as f32) as u32).min(height - 1);
        Some((x, y))
    }

    pub fn active(&self) -> Option<&ScreenButton> {
        self.active.and_then(|index| self.buttons.get(index))
    }

    pub fn buttons(&self) -> &[ScreenButton] {
        &self.buttons
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Returns whether the canvas changed since the last call, clearing the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> ScreenDisplay {
        ScreenDisplay::new(&ScreenConfig::default())
    }

    #[test]
    fn test_new_display_is_drawn_and_dirty() {
        let mut display = display();
        assert_eq!(display.canvas().width(), 512);
        assert_eq!(display.canvas().height(), 320);
        assert!(display.take_dirty());
        assert!(!display.take_dirty());
        assert!(display.active().is_none());
    }

    #[test]
    fn test_button_is_painted_with_border() {
        let display = display();
        let rect = display.buttons()[0].rect;
        assert_eq!(display.canvas().pixel(rect.x, rect.y), Some(BUTTON_BORDER));
        assert_eq!(display.canvas().pixel(rect.x + 4, rect.y + 4), Some(BUTTON));
    }

    #[test]
    fn test_click_on_button_activates_and_redraws() {
        let mut display = display();
        display.take_dirty();

        // Centre of "Projects" at [181, 64, 150, 44]
        let uv = [256.0 / 512.0, 86.0 / 320.0];
        assert_eq!(display.click_uv(uv), Some(1));
        assert_eq!(display.active().map(|b| b.label.as_str()), Some("Projects"));
        assert!(display.take_dirty());

        let rect = display.buttons()[1].rect;
        assert_eq!(display.canvas().pixel(rect.x + 4, rect.y + 4), Some(BUTTON_ACTIVE));
    }

    #[test]
    fn test_click_outside_buttons_changes_nothing() {
        let mut display = display();
        display.click_pixel(20, 70);
        display.take_dirty();

        assert_eq!(display.click_uv([0.5, 0.9]), None);
        assert_eq!(display.click_uv([1.5, 0.5]), None);
        assert_eq!(display.active().map(|b| b.label.as_str()), Some("About"));
        assert!(!display.take_dirty());
    }

    #[test]
    fn test_uv_edges_map_inside_canvas() {
        let display = display();
        assert_eq!(display.uv_to_pixel([0.0, 0.0]), Some((0, 0)));
        assert_eq!(display.uv_to_pixel([1.0, 1.0]), Some((511, 319)));
        assert_eq!(display.uv_to_pixel([-0.1, 0.5]), None);
    }
}
