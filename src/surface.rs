use crate::error::BloomError;
use crate::sketch::{Leaf, Segment, Sketchpad};
use std::path::Path;
use tiny_skia::{
    Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

/// Owned drawing surface: a branch layer painted over the background, and a
/// transparent leaf layer composited on top.
pub struct DrawSurface {
    branches: Pixmap,
    leaves: Pixmap,
    background: Color,
}

impl DrawSurface {
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, BloomError> {
        let alloc = || Pixmap::new(width, height).ok_or(BloomError::Surface { width, height });
        let mut surface = DrawSurface {
            branches: alloc()?,
            leaves: alloc()?,
            background,
        };
        surface.clear();
        Ok(surface)
    }

    pub fn width(&self) -> u32 {
        self.branches.width()
    }

    pub fn height(&self) -> u32 {
        self.branches.height()
    }

    pub fn clear(&mut self) {
        self.branches.fill(self.background);
        self.leaves.fill(Color::TRANSPARENT);
    }

    /// Flatten both layers into a new pixmap.
    pub fn composite(&self) -> Pixmap {
        let mut out = self.branches.clone();
        out.draw_pixmap(
            0,
            0,
            self.leaves.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        out
    }

    pub fn save_png(&self, path: &Path) -> Result<(), BloomError> {
        save_png(&self.composite(), path)
    }

    /// Premultiplied RGBA of the branch layer at `(x, y)`.
    pub fn branch_pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        let p = self.branches.pixel(x, y)?;
        Some((p.red(), p.green(), p.blue(), p.alpha()))
    }

    /// Premultiplied RGBA of the leaf layer at `(x, y)`.
    pub fn leaf_pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        let p = self.leaves.pixel(x, y)?;
        Some((p.red(), p.green(), p.blue(), p.alpha()))
    }
}

impl Sketchpad for DrawSurface {
    fn segment(&mut self, segment: &Segment) {
        draw_line(
            &mut self.branches,
            segment.from,
            segment.to,
            segment.color.color(),
            segment.weight,
        );
    }

    fn leaf(&mut self, leaf: &Leaf) {
        let (r, g, b) = leaf.rgb;
        fill_lens(
            &mut self.leaves,
            leaf.at,
            leaf.heading,
            leaf.size,
            Color::from_rgba8(r, g, b, 230),
        );
    }
}

pub fn save_png(pixmap: &Pixmap, path: &Path) -> Result<(), BloomError> {
    pixmap.save_png(path).map_err(|e| BloomError::Png {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn draw_line(pixmap: &mut Pixmap, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        ..Stroke::default()
    };
    let mut pb = PathBuilder::new();
    pb.move_to(from.0, from.1);
    pb.line_to(to.0, to.1);
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Almond-shaped leaf: two quadratic arcs meeting at the stem and the tip,
/// pointing along `heading`.
fn fill_lens(pixmap: &mut Pixmap, at: (f32, f32), heading: f32, size: f32, color: Color) {
    let half_width = size * 0.3;
    let mut pb = PathBuilder::new();
    pb.move_to(0.0, 0.0);
    pb.quad_to(half_width, -size / 2.0, 0.0, -size);
    pb.quad_to(-half_width, -size / 2.0, 0.0, 0.0);
    pb.close();

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let transform = Transform::from_rotate(heading).post_translate(at.0, at.1);
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
}
