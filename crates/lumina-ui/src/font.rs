//! Built-in 5x7 bitmap font for printable ASCII.
//!
//! Each glyph is five columns, least significant bit at the top row.
//! Characters outside `' '..='~'` render as `'?'`.

use glam::Vec2;

/// Glyph cell width in font pixels, including one column of spacing.
pub const ADVANCE: f32 = 6.0;
/// Glyph cell height in font pixels, including one row of spacing.
pub const LINE_HEIGHT: f32 = 8.0;
/// Rows actually covered by a glyph.
pub const GLYPH_ROWS: u32 = 7;

const FIRST: u8 = b' ';

#[rustfmt::skip]
const GLYPHS: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], [0x00, 0x00, 0x5F, 0x00, 0x00], [0x00, 0x07, 0x00, 0x07, 0x00],
    [0x14, 0x7F, 0x14, 0x7F, 0x14], [0x24, 0x2A, 0x7F, 0x2A, 0x12], [0x23, 0x13, 0x08, 0x64, 0x62],
    [0x36, 0x49, 0x55, 0x22, 0x50], [0x00, 0x05, 0x03, 0x00, 0x00], [0x00, 0x1C, 0x22, 0x41, 0x00],
    [0x00, 0x41, 0x22, 0x1C, 0x00], [0x08, 0x2A, 0x1C, 0x2A, 0x08], [0x08, 0x08, 0x3E, 0x08, 0x08],
    [0x00, 0x50, 0x30, 0x00, 0x00], [0x08, 0x08, 0x08, 0x08, 0x08], [0x00, 0x60, 0x60, 0x00, 0x00],
    [0x20, 0x10, 0x08, 0x04, 0x02],
    // 0-9
    [0x3E, 0x51, 0x49, 0x45, 0x3E], [0x00, 0x42, 0x7F, 0x40, 0x00], [0x42, 0x61, 0x51, 0x49, 0x46],
    [0x21, 0x41, 0x45, 0x4B, 0x31], [0x18, 0x14, 0x12, 0x7F, 0x10], [0x27, 0x45, 0x45, 0x45, 0x39],
    [0x3C, 0x4A, 0x49, 0x49, 0x30], [0x01, 0x71, 0x09, 0x05, 0x03], [0x36, 0x49, 0x49, 0x49, 0x36],
    [0x06, 0x49, 0x49, 0x29, 0x1E],
    [0x00, 0x36, 0x36, 0x00, 0x00], [0x00, 0x56, 0x36, 0x00, 0x00], [0x00, 0x08, 0x14, 0x22, 0x41],
    [0x14, 0x14, 0x14, 0x14, 0x14], [0x41, 0x22, 0x14, 0x08, 0x00], [0x02, 0x01, 0x51, 0x09, 0x06],
    [0x32, 0x49, 0x79, 0x41, 0x3E],
    // A-Z
    [0x7E, 0x11, 0x11, 0x11, 0x7E], [0x7F, 0x49, 0x49, 0x49, 0x36], [0x3E, 0x41, 0x41, 0x41, 0x22],
    [0x7F, 0x41, 0x41, 0x22, 0x1C], [0x7F, 0x49, 0x49, 0x49, 0x41], [0x7F, 0x09, 0x09, 0x01, 0x01],
    [0x3E, 0x41, 0x41, 0x51, 0x32], [0x7F, 0x08, 0x08, 0x08, 0x7F], [0x00, 0x41, 0x7F, 0x41, 0x00],
    [0x20, 0x40, 0x41, 0x3F, 0x01], [0x7F, 0x08, 0x14, 0x22, 0x41], [0x7F, 0x40, 0x40, 0x40, 0x40],
    [0x7F, 0x02, 0x04, 0x02, 0x7F], [0x7F, 0x04, 0x08, 0x10, 0x7F], [0x3E, 0x41, 0x41, 0x41, 0x3E],
    [0x7F, 0x09, 0x09, 0x09, 0x06], [0x3E, 0x41, 0x51, 0x21, 0x5E], [0x7F, 0x09, 0x19, 0x29, 0x46],
    [0x46, 0x49, 0x49, 0x49, 0x31], [0x01, 0x01, 0x7F, 0x01, 0x01], [0x3F, 0x40, 0x40, 0x40, 0x3F],
    [0x1F, 0x20, 0x40, 0x20, 0x1F], [0x7F, 0x20, 0x18, 0x20, 0x7F], [0x63, 0x14, 0x08, 0x14, 0x63],
    [0x03, 0x04, 0x78, 0x04, 0x03], [0x61, 0x51, 0x49, 0x45, 0x43],
    [0x00, 0x00, 0x7F, 0x41, 0x41], [0x02, 0x04, 0x08, 0x10, 0x20], [0x41, 0x41, 0x7F, 0x00, 0x00],
    [0x04, 0x02, 0x01, 0x02, 0x04], [0x40, 0x40, 0x40, 0x40, 0x40], [0x00, 0x01, 0x02, 0x04, 0x00],
    // a-z
    [0x20, 0x54, 0x54, 0x54, 0x78], [0x7F, 0x48, 0x44, 0x44, 0x38], [0x38, 0x44, 0x44, 0x44, 0x20],
    [0x38, 0x44, 0x44, 0x48, 0x7F], [0x38, 0x54, 0x54, 0x54, 0x18], [0x08, 0x7E, 0x09, 0x01, 0x02],
    [0x08, 0x14, 0x54, 0x54, 0x3C], [0x7F, 0x08, 0x04, 0x04, 0x78], [0x00, 0x44, 0x7D, 0x40, 0x00],
    [0x20, 0x40, 0x44, 0x3D, 0x00], [0x00, 0x7F, 0x10, 0x28, 0x44], [0x00, 0x41, 0x7F, 0x40, 0x00],
    [0x7C, 0x04, 0x18, 0x04, 0x78], [0x7C, 0x08, 0x04, 0x04, 0x78], [0x38, 0x44, 0x44, 0x44, 0x38],
    [0x7C, 0x14, 0x14, 0x14, 0x08], [0x08, 0x14, 0x14, 0x18, 0x7C], [0x7C, 0x08, 0x04, 0x04, 0x08],
    [0x48, 0x54, 0x54, 0x54, 0x20], [0x04, 0x3F, 0x44, 0x40, 0x20], [0x3C, 0x40, 0x40, 0x20, 0x7C],
    [0x1C, 0x20, 0x40, 0x20, 0x1C], [0x3C, 0x40, 0x30, 0x40, 0x3C], [0x44, 0x28, 0x10, 0x28, 0x44],
    [0x0C, 0x50, 0x50, 0x50, 0x3C], [0x44, 0x64, 0x54, 0x4C, 0x44],
    [0x00, 0x08, 0x36, 0x41, 0x00], [0x00, 0x00, 0x7F, 0x00, 0x00], [0x00, 0x41, 0x36, 0x08, 0x00],
    [0x02, 0x01, 0x02, 0x04, 0x02],
];

/// Column bitmap for `c`.
#[must_use]
pub fn glyph(c: char) -> [u8; 5] {
    let index = if (' '..='~').contains(&c) { c as u8 - FIRST } else { b'?' - FIRST };
    GLYPHS[usize::from(index)]
}

/// Width of `text` in font pixels times `scale`. No trailing spacing column.
#[must_use]
pub fn text_width(text: &str, scale: f32) -> f32 {
    let count = text.chars().count() as f32;
    if count == 0.0 {
        0.0
    } else {
        (count * ADVANCE - 1.0) * scale
    }
}

/// Size of a single line of `text`.
#[must_use]
pub fn text_size(text: &str, scale: f32) -> Vec2 {
    Vec2::new(text_width(text, scale), GLYPH_ROWS as f32 * scale)
}

/// Calls `pixel(column, row)` for every lit pixel of `c`.
pub fn for_each_pixel(c: char, mut pixel: impl FnMut(u32, u32)) {
    for (column, bits) in glyph(c).iter().enumerate() {
        for row in 0..GLYPH_ROWS {
            if bits & (1 << row) != 0 {
                pixel(column as u32, row);
            }
        }
    }
}

/// Calls `run(column, first_row, length)` for each vertical run of lit pixels.
/// Emitting runs instead of pixels keeps text quads few.
pub fn for_each_run(c: char, mut run: impl FnMut(u32, u32, u32)) {
    for (column, bits) in glyph(c).iter().enumerate() {
        let mut row = 0;
        while row < GLYPH_ROWS {
            if bits & (1 << row) == 0 {
                row += 1;
                continue;
            }
            let start = row;
            while row < GLYPH_ROWS && bits & (1 << row) != 0 {
                row += 1;
            }
            run(column as u32, start, row - start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_is_blank() {
        let mut count = 0;
        for_each_pixel(' ', |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unknown_falls_back_to_question_mark() {
        assert_eq!(glyph('\u{e9}'), glyph('?'));
        assert_eq!(glyph('\n'), glyph('?'));
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 1.0), 0.0);
        assert_eq!(text_width("A", 1.0), 5.0);
        assert_eq!(text_width("AB", 2.0), 22.0);
    }

    #[test]
    fn test_runs_cover_same_pixels() {
        for c in ['A', 'g', '#', '0', '~'] {
            let mut pixels = 0;
            for_each_pixel(c, |_, _| pixels += 1);
            let mut covered = 0;
            for_each_run(c, |_, _, len| covered += len);
            assert_eq!(pixels, covered, "glyph {c}");
        }
    }

    #[test]
    fn test_capital_i_is_vertical_bar_in_middle() {
        let mut columns = Vec::new();
        for_each_run('I', |col, start, len| {
            if len == 7 {
                columns.push((col, start));
            }
        });
        assert_eq!(columns, vec![(2, 0)]);
    }
}
