use image::{Rgba, RgbaImage};

use crate::model::{Atlas, Rect};

/// Copy `src` into `canvas` with its top-left corner at (dx, dy).
/// Pixels falling outside the canvas are dropped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let rw = sw.min(cw.saturating_sub(dx));
    let rh = sh.min(ch.saturating_sub(dy));
    for yy in 0..rh {
        for xx in 0..rw {
            let px = *src.get_pixel(xx, yy);
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }
}

/// Draw a red 1px outline just inside `rect` (debug aid).
pub fn draw_outline(canvas: &mut RgbaImage, rect: Rect) {
    if rect.w == 0 || rect.h == 0 {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let red = Rgba([255, 0, 0, 255]);
    let right = rect.right() - 1;
    let bottom = rect.bottom() - 1;
    for x in rect.x..=right.min(cw.saturating_sub(1)) {
        if rect.y < ch {
            canvas.put_pixel(x, rect.y, red);
        }
        if bottom < ch {
            canvas.put_pixel(x, bottom, red);
        }
    }
    for y in rect.y..=bottom.min(ch.saturating_sub(1)) {
        if rect.x < cw {
            canvas.put_pixel(rect.x, y, red);
        }
        if right < cw {
            canvas.put_pixel(right, y, red);
        }
    }
}

/// Render `atlas` into a fresh transparent canvas.
///
/// `sources[i]` is the pixel data of the request with index `i`; placements whose
/// source is missing are left transparent.
pub fn compose_atlas<K>(atlas: &Atlas<K>, sources: &[RgbaImage], outlines: bool) -> RgbaImage {
    let mut canvas = RgbaImage::new(atlas.width, atlas.height);
    for placed in &atlas.images {
        if let Some(src) = sources.get(placed.index) {
            blit_rgba(src, &mut canvas, placed.x, placed.y);
        }
        if outlines {
            draw_outline(&mut canvas, placed.rect());
        }
    }
    canvas
}
