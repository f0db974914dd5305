//! Sprites
//!
//! A sprite draws itself one page-row slice at a time. Renderers pass the
//! slice as an inclusive column range within a single page, together with
//! a segment buffer whose first byte is `column_a`.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::ssd1306::{COLUMNS, PAGES};

/// Something that can draw into a page slice
pub trait Sprite {
    /// Whether the sprite should be drawn at all
    fn is_visible(&self) -> bool;

    /// OR this sprite's pixels for columns `column_a..=column_b` of `page`
    /// into `segments`
    ///
    /// `segments[0]` corresponds to `column_a`. Pixels outside the slice
    /// must be left alone.
    fn render(&self, column_a: u8, page: u8, column_b: u8, segments: &mut [u8]);
}

/// Page-organized monochrome image
///
/// `data` holds `width` bytes per page, pages stacked top to bottom. The
/// position and visibility are atomics so a shared `&Bitmap` can be moved
/// or hidden while a renderer holds it.
#[derive(Debug)]
pub struct Bitmap<'a> {
    data: &'a [u8],
    width: u8,
    column: AtomicU8,
    page: AtomicU8,
    visible: AtomicBool,
}

impl<'a> Bitmap<'a> {
    /// Visible bitmap with its top-left corner at `column`, `page`
    pub const fn new(data: &'a [u8], width: u8, column: u8, page: u8) -> Self {
        Self {
            data,
            width,
            column: AtomicU8::new(column),
            page: AtomicU8::new(page),
            visible: AtomicBool::new(true),
        }
    }

    /// Width in columns
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Height in pages
    pub fn height(&self) -> u8 {
        if self.width == 0 {
            return 0;
        }
        (self.data.len() / self.width as usize).min(PAGES as usize) as u8
    }

    /// Top-left corner as `(column, page)`
    pub fn position(&self) -> (u8, u8) {
        (
            self.column.load(Ordering::Relaxed),
            self.page.load(Ordering::Relaxed),
        )
    }

    pub fn move_to(&self, column: u8, page: u8) {
        self.column.store(column, Ordering::Relaxed);
        self.page.store(page, Ordering::Relaxed);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}

impl Sprite for Bitmap<'_> {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn render(&self, column_a: u8, page: u8, column_b: u8, segments: &mut [u8]) {
        let (column, top) = self.position();
        if page < top || page - top >= self.height() {
            return;
        }

        // Overlap of the slice with the sprite, clipped to the panel
        let sprite_end = (column as usize + self.width as usize).min(COLUMNS as usize);
        let start = column_a.max(column) as usize;
        let end = (column_b as usize + 1).min(sprite_end);
        if start >= end {
            return;
        }

        let row = (page - top) as usize * self.width as usize;
        for x in start..end {
            let Some(segment) = segments.get_mut(x - column_a as usize) else {
                break;
            };
            *segment |= self.data[row + x - column as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4 columns x 2 pages
    static ARROW: [u8; 8] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80];

    #[test]
    fn test_height_from_data() {
        let bitmap = Bitmap::new(&ARROW, 4, 0, 0);
        assert_eq!(bitmap.height(), 2);
        assert_eq!(Bitmap::new(&ARROW, 0, 0, 0).height(), 0);
    }

    #[test]
    fn test_render_full_overlap() {
        let bitmap = Bitmap::new(&ARROW, 4, 10, 3);
        let mut segments = [0u8; 8];
        bitmap.render(8, 4, 15, &mut segments);
        assert_eq!(segments, [0, 0, 0x10, 0x20, 0x40, 0x80, 0, 0]);
    }

    #[test]
    fn test_render_clips_to_slice() {
        let bitmap = Bitmap::new(&ARROW, 4, 10, 0);
        let mut segments = [0u8; 2];
        bitmap.render(12, 0, 13, &mut segments);
        assert_eq!(segments, [0x04, 0x08]);

        let mut segments = [0u8; 3];
        bitmap.render(7, 0, 9, &mut segments);
        assert_eq!(segments, [0, 0, 0]);
    }

    #[test]
    fn test_render_ors_into_existing_pixels() {
        let bitmap = Bitmap::new(&ARROW, 4, 0, 0);
        let mut segments = [0x80u8; 4];
        bitmap.render(0, 0, 3, &mut segments);
        assert_eq!(segments, [0x81, 0x82, 0x84, 0x88]);
    }

    #[test]
    fn test_render_outside_pages() {
        let bitmap = Bitmap::new(&ARROW, 4, 0, 2);
        let mut segments = [0u8; 4];
        bitmap.render(0, 1, 3, &mut segments);
        bitmap.render(0, 4, 3, &mut segments);
        assert_eq!(segments, [0; 4]);
    }

    #[test]
    fn test_move_and_hide() {
        let bitmap = Bitmap::new(&ARROW, 4, 0, 0);
        bitmap.move_to(124, 6);
        assert_eq!(bitmap.position(), (124, 6));

        let mut segments = [0u8; 4];
        bitmap.render(124, 7, 127, &mut segments);
        assert_eq!(segments, [0x10, 0x20, 0x40, 0x80]);

        bitmap.set_visible(false);
        assert!(!bitmap.is_visible());
    }

    #[test]
    fn test_clipped_at_right_edge() {
        let bitmap = Bitmap::new(&ARROW, 4, 126, 0);
        let mut segments = [0u8; 2];
        bitmap.render(126, 0, 127, &mut segments);
        assert_eq!(segments, [0x01, 0x02]);
    }
}
