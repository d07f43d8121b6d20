//! Fixed-size ARGB pixel buffer and the primitives the simulator window
//! draws with.  Everything clips to the canvas; nothing here needs a display.

/// Glyph cell size of the built-in font, and the horizontal advance.
pub const GLYPH_W: usize = 3;
pub const GLYPH_H: usize = 5;
const ADVANCE:     usize = GLYPH_W + 1;

pub struct Canvas {
    width:  usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, color: u32) -> Self {
        Canvas { width, height, pixels: vec![color; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    /// Row-major buffer, ready for `minifb::Window::update_with_buffer`.
    pub fn pixels(&self) -> &[u32] { &self.pixels }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn plot(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        let x_end = (x + w).min(self.width);
        if x >= x_end {
            return;
        }
        for row in y..(y + h).min(self.height) {
            let start = row * self.width;
            self.pixels[start + x..start + x_end].fill(color);
        }
    }

    /// One-pixel frame around the rectangle.
    pub fn outline_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    /// Bresenham line, both endpoints inclusive.
    pub fn line(&mut self, (x0, y0): (usize, usize), (x1, y1): (usize, usize), color: u32) {
        let (mut x, mut y) = (x0 as i64, y0 as i64);
        let (x1, y1) = (x1 as i64, y1 as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            // Walking between two non-negative endpoints never goes below zero.
            self.plot(x as usize, y as usize, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Draw `text` in the 3×5 font.  Stops at the right edge; returns the x
    /// just past the last glyph drawn.
    pub fn text(&mut self, text: &str, x: usize, y: usize, color: u32) -> usize {
        let mut cx = x;
        for ch in text.chars() {
            if cx + GLYPH_W > self.width {
                break;
            }
            let bits = glyph(ch);
            for row in 0..GLYPH_H {
                for col in 0..GLYPH_W {
                    let shift = (GLYPH_H - 1 - row) * GLYPH_W + (GLYPH_W - 1 - col);
                    if (bits >> shift) & 1 == 1 {
                        self.plot(cx + col, y + row, color);
                    }
                }
            }
            cx += ADVANCE;
        }
        cx
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 font: one octal digit per row, top row first
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0o75557, '1' => 0o26227, '2' => 0o71747, '3' => 0o71717,
        '4' => 0o55711, '5' => 0o74717, '6' => 0o74757, '7' => 0o71111,
        '8' => 0o75757, '9' => 0o75717,
        'A' => 0o75755, 'B' => 0o65656, 'C' => 0o74447, 'D' => 0o65556,
        'E' => 0o74747, 'F' => 0o74744, 'G' => 0o74557, 'H' => 0o55755,
        'I' => 0o72227, 'J' => 0o11157, 'K' => 0o55655, 'L' => 0o44447,
        'M' => 0o57555, 'N' => 0o75555, 'O' => 0o75557, 'P' => 0o75744,
        'Q' => 0o75571, 'R' => 0o65655, 'S' => 0o74717, 'T' => 0o72222,
        'U' => 0o55557, 'V' => 0o55522, 'W' => 0o55575, 'X' => 0o55255,
        'Y' => 0o55722, 'Z' => 0o71247,
        '_' => 0o00007, '-' => 0o00700, '.' => 0o00002, ',' => 0o00024,
        ':' => 0o02020, '=' => 0o07070, '/' => 0o11244,
        '>' | '▶' => 0o42124,
        ' ' => 0,
        _   => 0o00200,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
