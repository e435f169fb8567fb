//! CPU composition of the box overlay.
//!
//! Frames are built by copying the displayed raster and drawing rectangle
//! outlines into it, each box labelled with its class name. Everything is
//! clipped to the image.

use ab_glyph::{Font, FontArc, InvalidFont, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::classes::ClassCatalog;
use crate::editor::Mode;
use crate::geometry::PixelBox;
use crate::palette::{ClassPalette, Rgb};

/// Outline thickness of stored boxes in pixels.
pub const BOX_THICKNESS: i32 = 2;
/// Outline thickness of the drawing preview.
pub const PREVIEW_THICKNESS: i32 = 1;
/// Label text height in pixels.
pub const LABEL_SIZE: f32 = 14.0;
/// Where the active class is written: left edge and baseline.
pub const ACTIVE_CLASS_ORIGIN: (i64, i64) = (10, 15);

const EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// What to draw on top of the image.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub boxes: &'a [PixelBox],
    pub selected: Option<usize>,
    pub mode: Mode,
    /// Rubber band of a drag in progress
    pub preview: Option<PixelBox>,
    /// Class labels; `None` draws outlines only
    pub labels: Option<Labels<'a>>,
}

/// Text drawn next to the boxes.
#[derive(Debug, Clone, Copy)]
pub struct Labels<'a> {
    pub catalog: &'a ClassCatalog,
    pub font: &'a LabelFont,
    /// Class new boxes get, written in the top-left corner
    pub active_class: u32,
}

/// Draw the overlay onto a copy of `base`.
pub fn compose(base: &RgbaImage, overlay: &Overlay<'_>, palette: &ClassPalette) -> RgbaImage {
    let mut frame = base.clone();

    for (index, bbox) in overlay.boxes.iter().enumerate() {
        let color = if overlay.selected == Some(index) {
            match overlay.mode {
                Mode::EditingId => palette.editing,
                _ => palette.selected,
            }
        } else {
            palette.color_for(bbox.class_id)
        };
        draw_outline(&mut frame, bbox, color, BOX_THICKNESS);

        if let Some(labels) = &overlay.labels {
            draw_box_label(&mut frame, labels, bbox, color);
        }
    }

    if let Some(labels) = &overlay.labels {
        let (x, baseline) = ACTIVE_CLASS_ORIGIN;
        labels.font.draw(
            &mut frame,
            &labels.catalog.label(labels.active_class),
            x,
            baseline,
            palette.color_for(labels.active_class),
        );
    }

    if let Some(preview) = &overlay.preview {
        draw_outline(&mut frame, preview, palette.preview, PREVIEW_THICKNESS);
    }

    frame
}

/// Write the class label just above the box, or inside its top edge when
/// there is no room above.
fn draw_box_label(image: &mut RgbaImage, labels: &Labels<'_>, bbox: &PixelBox, color: Rgb) {
    let font = labels.font;
    let descent = font.descent().abs().ceil() as i64;
    let ascent = font.ascent().ceil() as i64;
    let top = i64::from(bbox.y1);

    let baseline = if top - descent - 1 >= ascent {
        top - descent - 1
    } else {
        top + i64::from(BOX_THICKNESS) + ascent
    };
    let x = i64::from(bbox.x1) + i64::from(BOX_THICKNESS) + 1;
    font.draw(image, &labels.catalog.label(bbox.class_id), x, baseline, color);
}

/// Draw a rectangle outline growing inward from the box edges.
pub fn draw_outline(image: &mut RgbaImage, bbox: &PixelBox, color: Rgb, thickness: i32) {
    let pixel = Rgba([color[0], color[1], color[2], 255]);
    for t in 0..i64::from(thickness.max(1)) {
        let (x1, y1) = (i64::from(bbox.x1) + t, i64::from(bbox.y1) + t);
        let (x2, y2) = (i64::from(bbox.x2) - t, i64::from(bbox.y2) - t);
        if x1 > x2 || y1 > y2 {
            break;
        }
        hline(image, x1, x2, y1, pixel);
        hline(image, x1, x2, y2, pixel);
        vline(image, x1, y1, y2, pixel);
        vline(image, x2, y1, y2, pixel);
    }
}

/// Clamp `[a, b]` to `[0, len)`; `None` if nothing is left.
fn clip(a: i64, b: i64, len: u32) -> Option<(u32, u32)> {
    let max = i64::from(len) - 1;
    let lo = a.max(0);
    let hi = b.min(max);
    if lo > hi {
        return None;
    }
    Some((u32::try_from(lo).ok()?, u32::try_from(hi).ok()?))
}

fn hline(image: &mut RgbaImage, x1: i64, x2: i64, y: i64, pixel: Rgba<u8>) {
    let Some((y, _)) = clip(y, y, image.height()) else {
        return;
    };
    if let Some((lo, hi)) = clip(x1, x2, image.width()) {
        for x in lo..=hi {
            image.put_pixel(x, y, pixel);
        }
    }
}

fn vline(image: &mut RgbaImage, x: i64, y1: i64, y2: i64, pixel: Rgba<u8>) {
    let Some((x, _)) = clip(x, x, image.width()) else {
        return;
    };
    if let Some((lo, hi)) = clip(y1, y2, image.height()) {
        for y in lo..=hi {
            image.put_pixel(x, y, pixel);
        }
    }
}

// ============================================================================
// Text
// ============================================================================

/// Font used for class labels.
#[derive(Debug, Clone)]
pub struct LabelFont {
    font: FontArc,
    scale: PxScale,
}

impl LabelFont {
    /// The monospace font bundled with the crate, at [`LABEL_SIZE`].
    pub fn embedded() -> Result<Self, InvalidFont> {
        Ok(Self {
            font: FontArc::try_from_slice(EMBEDDED_FONT)?,
            scale: PxScale::from(LABEL_SIZE),
        })
    }

    /// Distance from the baseline to the top of the tallest glyph.
    pub fn ascent(&self) -> f32 {
        self.font.as_scaled(self.scale).ascent()
    }

    /// Distance from the baseline to the lowest descender (negative).
    pub fn descent(&self) -> f32 {
        self.font.as_scaled(self.scale).descent()
    }

    /// Draw `text` starting at `x` with its baseline on row `baseline`.
    ///
    /// Glyph coverage is blended over the existing pixels.
    pub fn draw(&self, image: &mut RgbaImage, text: &str, x: i64, baseline: i64, color: Rgb) {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = x as f32;
        let mut previous = None;

        for c in text.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, glyph.id);
            }
            glyph.position = ab_glyph::point(caret, baseline as f32);
            caret += scaled.h_advance(glyph.id);
            previous = Some(glyph.id);

            let Some(outlined) = scaled.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
            outlined.draw(|gx, gy, coverage| {
                blend(image, left + i64::from(gx), top + i64::from(gy), color, coverage);
            });
        }
    }
}

fn blend(image: &mut RgbaImage, x: i64, y: i64, color: Rgb, coverage: f32) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= image.width() || y >= image.height() {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    let pixel = image.get_pixel_mut(x, y);
    for (channel, target) in pixel.0.iter_mut().zip(color) {
        let mixed = f32::from(*channel) * (1.0 - alpha) + f32::from(target) * alpha;
        *channel = mixed.round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{GREEN, MAGENTA, ORANGE, RED, WHITE};

    fn lit_pixels(image: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> Vec<Rgb> {
        xs.flat_map(|x| ys.clone().map(move |y| (x, y)))
            .map(|(x, y)| rgb(image, x, y))
            .filter(|p| *p != [0, 0, 0])
            .collect()
    }

    fn rgb(image: &RgbaImage, x: u32, y: u32) -> Rgb {
        let p = image.get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    fn blank() -> RgbaImage {
        RgbaImage::new(40, 30)
    }

    #[test]
    fn test_boxes_drawn_in_class_colors() {
        let boxes = [
            PixelBox::new(2, 2, 10, 10, 0),
            PixelBox::new(20, 2, 30, 10, 1),
            PixelBox::new(2, 15, 10, 25, 9),
        ];
        let overlay = Overlay {
            boxes: &boxes,
            selected: None,
            mode: Mode::Idle,
            preview: None,
            labels: None,
        };
        let frame = compose(&blank(), &overlay, &ClassPalette::default());

        assert_eq!(rgb(&frame, 2, 5), GREEN);
        assert_eq!(rgb(&frame, 3, 5), GREEN);
        assert_eq!(rgb(&frame, 4, 5), [0, 0, 0], "outline is two pixels thick");
        assert_eq!(rgb(&frame, 30, 10), RED);
        assert_eq!(rgb(&frame, 2, 25), MAGENTA);
    }

    #[test]
    fn test_selected_and_editing_colors() {
        let boxes = [PixelBox::new(2, 2, 10, 10, 0)];
        let mut overlay = Overlay {
            boxes: &boxes,
            selected: Some(0),
            mode: Mode::BoxSelected,
            preview: None,
            labels: None,
        };
        let palette = ClassPalette::default();
        assert_eq!(rgb(&compose(&blank(), &overlay, &palette), 2, 2), WHITE);

        overlay.mode = Mode::EditingId;
        assert_eq!(rgb(&compose(&blank(), &overlay, &palette), 2, 2), ORANGE);
    }

    #[test]
    fn test_preview_is_thin() {
        let overlay = Overlay {
            boxes: &[],
            selected: None,
            mode: Mode::Drawing,
            preview: Some(PixelBox::new(5, 5, 15, 15, 0)),
            labels: None,
        };
        let frame = compose(&blank(), &overlay, &ClassPalette::default());
        assert_eq!(rgb(&frame, 5, 10), [0, 255, 0]);
        assert_eq!(rgb(&frame, 6, 10), [0, 0, 0]);
    }

    #[test]
    fn test_outline_is_clipped() {
        let mut image = blank();
        draw_outline(&mut image, &PixelBox::new(-10, -10, 100, 5, 0), WHITE, 2);
        assert_eq!(rgb(&image, 0, 5), WHITE);
        assert_eq!(rgb(&image, 39, 4), WHITE);
        assert_eq!(rgb(&image, 0, 0), [0, 0, 0]);

        // Entirely outside
        draw_outline(&mut image, &PixelBox::new(50, 50, 60, 60, 0), WHITE, 2);
    }

    #[test]
    fn test_base_image_untouched() {
        let base = blank();
        let boxes = [PixelBox::new(0, 0, 39, 29, 0)];
        let overlay = Overlay {
            boxes: &boxes,
            selected: None,
            mode: Mode::Idle,
            preview: None,
            labels: None,
        };
        let _ = compose(&base, &overlay, &ClassPalette::default());
        assert!(base.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }

    #[test]
    fn test_labels_name_each_box_and_the_active_class() {
        let font = LabelFont::embedded().unwrap();
        let catalog = ClassCatalog::from_names(vec!["ball".into(), "player".into()]);
        let boxes = [PixelBox::new(40, 50, 100, 80, 1)];
        let overlay = Overlay {
            boxes: &boxes,
            selected: None,
            mode: Mode::Idle,
            preview: None,
            labels: Some(Labels {
                catalog: &catalog,
                font: &font,
                active_class: 0,
            }),
        };
        let frame = compose(&RgbaImage::new(120, 90), &overlay, &ClassPalette::default());

        // "player" sits on top of the box in the class colour
        let label = lit_pixels(&frame, 40..100, 30..50);
        assert!(!label.is_empty());
        assert!(label.iter().all(|p| p[1] == 0 && p[2] == 0));

        // "ball" in the corner, in the active class colour
        let active = lit_pixels(&frame, 5..60, 0..20);
        assert!(!active.is_empty());
        assert!(active.iter().all(|p| p[0] == 0 && p[2] == 0));

        // Outline untouched by the text
        assert_eq!(rgb(&frame, 40, 65), RED);
    }

    #[test]
    fn test_label_moves_inside_box_at_top_edge() {
        let font = LabelFont::embedded().unwrap();
        let catalog = ClassCatalog::numeric(2);
        let boxes = [PixelBox::new(60, 1, 110, 60, 1)];
        let overlay = Overlay {
            boxes: &boxes,
            selected: None,
            mode: Mode::Idle,
            preview: None,
            labels: Some(Labels {
                catalog: &catalog,
                font: &font,
                active_class: 0,
            }),
        };
        let frame = compose(&RgbaImage::new(120, 90), &overlay, &ClassPalette::default());
        assert!(!lit_pixels(&frame, 63..100, 4..25).is_empty());
    }

    #[test]
    fn test_far_out_box_does_not_overflow() {
        let mut image = blank();
        let bbox = PixelBox::new(i32::MAX - 1, i32::MIN, i32::MAX, i32::MAX, 0);
        draw_outline(&mut image, &bbox, WHITE, 2);
        assert!(lit_pixels(&image, 0..40, 0..30).is_empty());

        let whole = PixelBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 0);
        draw_outline(&mut image, &whole, WHITE, 2);
        assert!(lit_pixels(&image, 0..40, 0..30).is_empty());
    }
}
