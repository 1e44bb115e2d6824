//! Icon rasteriser on `tiny-skia`, with `usvg` decoding the glyphs.
//!
//! Drawing order for a canvas of side `N`:
//!
//! 1. clear to transparent;
//! 2. background shape inset by `N × 5/200` on every side, painted with the
//!    solid colour or gradient;
//! 3. glyph centred on the canvas, rotated clockwise about the centre, in a
//!    `N × scale%` box.
//!
//! Transforms are values passed to each draw call, so nothing leaks from
//! one step into the next.

use super::{Color, Fill, Glyph, IconSpec, Shape, TextGlyph, VectorGlyph};
use crate::error::DocToolsError;
use once_cell::sync::Lazy;
use resvg::tiny_skia::{
    FillRule, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap, Point,
    RadialGradient, Rect, Shader, SpreadMode, Transform,
};
use resvg::usvg::{self, fontdb};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::{debug, warn};

/// Corner radius of a rounded square, relative to its side.
const CORNER_RATIO: f32 = 0.15;

/// Cubic Bézier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// System fonts, scanned once per process.
static FONTS: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!("Loaded {} font faces", db.len());
    remap_generic_families(&mut db);
    Arc::new(db)
});

/// Point the generic CSS families at faces that are actually installed.
///
/// fontdb maps `sans-serif` to "Arial", `serif` to "Times New Roman" and
/// `monospace` to "Courier New"; on hosts without those a text glyph would
/// silently lay out to nothing.
fn remap_generic_families(db: &mut fontdb::Database) {
    let families: Vec<String> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .collect();
    let Some(first) = families.first().cloned() else {
        warn!("No system fonts found; text glyphs will not render");
        return;
    };
    let pick = |hint: fn(&str) -> bool| {
        families
            .iter()
            .find(|name| hint(&name.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_else(|| first.clone())
    };

    if !has_family(db, fontdb::Family::SansSerif) {
        let name = pick(|n| n.contains("sans") && !n.contains("mono"));
        debug!("sans-serif → {}", name);
        db.set_sans_serif_family(name);
    }
    if !has_family(db, fontdb::Family::Serif) {
        let name = pick(|n| n.contains("serif") && !n.contains("sans"));
        debug!("serif → {}", name);
        db.set_serif_family(name);
    }
    if !has_family(db, fontdb::Family::Monospace) {
        let name = pick(|n| n.contains("mono"));
        debug!("monospace → {}", name);
        db.set_monospace_family(name);
    }
}

fn has_family(db: &fontdb::Database, family: fontdb::Family<'_>) -> bool {
    db.query(&fontdb::Query {
        families: &[family],
        ..fontdb::Query::default()
    })
    .is_some()
}

/// Outcome of decoding a vector glyph.
#[derive(Debug)]
pub enum GlyphRaster {
    /// The synthesised SVG parsed and has something to draw.
    Decoded(usvg::Tree),
    /// Decoding failed; a disc is drawn instead.
    Fallback { reason: String },
}

/// Render `spec` onto a fresh `size × size` pixmap.
pub fn render_icon(spec: &IconSpec, size: u32) -> Result<Pixmap, DocToolsError> {
    spec.validate()?;
    let mut pixmap = Pixmap::new(size, size).ok_or_else(|| {
        DocToolsError::InvalidConfig(format!("icon size must be at least 1 px, got {size}"))
    })?;

    let n = size as f32;
    let padding = n * 5.0 / 200.0;
    let background = n - padding * 2.0;

    if let Some(path) = shape_path(spec.shape, n, padding, background) {
        let paint = Paint {
            shader: fill_shader(&spec.fill, n),
            anti_alias: true,
            ..Paint::default()
        };
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    let draw = n * spec.glyph_scale_percent / 100.0;
    let centre = Transform::from_translate(n / 2.0, n / 2.0).pre_rotate(spec.rotation_degrees);

    match &spec.glyph {
        Glyph::Vector(glyph) => match decode_vector_glyph(glyph, spec.glyph_color) {
            GlyphRaster::Decoded(tree) => {
                let scale = draw / 100.0;
                let transform = centre
                    .pre_translate(-draw / 2.0, -draw / 2.0)
                    .pre_scale(scale, scale);
                resvg::render(&tree, transform, &mut pixmap.as_mut());
            }
            GlyphRaster::Fallback { reason } => {
                warn!("Vector glyph fell back to a disc: {}", reason);
                draw_disc(&mut pixmap, centre, draw / 4.0, spec.glyph_color);
            }
        },
        Glyph::Text(text) => draw_text(&mut pixmap, centre, draw, text, spec.glyph_color),
    }

    Ok(pixmap)
}

/// Synthesise a standalone 100×100 SVG around the glyph path and decode it.
pub fn decode_vector_glyph(glyph: &VectorGlyph, color: Color) -> GlyphRaster {
    if glyph.width == 0 || glyph.height == 0 {
        return GlyphRaster::Fallback {
            reason: format!("empty view box {}x{}", glyph.width, glyph.height),
        };
    }
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 {w} {h}"><path fill="{fill}" fill-opacity="{opacity}" d="{d}"/></svg>"#,
        w = glyph.width,
        h = glyph.height,
        fill = hex_rgb(color),
        opacity = color.opacity(),
        d = xml_escape(&glyph.path),
    );
    match usvg::Tree::from_str(&svg, &usvg::Options::default()) {
        Ok(tree) if tree.root().has_children() => GlyphRaster::Decoded(tree),
        Ok(_) => GlyphRaster::Fallback {
            reason: "glyph path draws nothing".into(),
        },
        Err(e) => GlyphRaster::Fallback {
            reason: e.to_string(),
        },
    }
}

// ── Background ───────────────────────────────────────────────────────────

fn shape_path(shape: Shape, n: f32, padding: f32, background: f32) -> Option<Path> {
    match shape {
        Shape::Circle => PathBuilder::from_circle(n / 2.0, n / 2.0, background / 2.0),
        Shape::Square => {
            Rect::from_xywh(padding, padding, background, background).map(PathBuilder::from_rect)
        }
        Shape::RoundedSquare => {
            rounded_square(padding, padding, background, background * CORNER_RATIO)
        }
        Shape::Hexagon => {
            let radius = background / 2.0;
            let mut pb = PathBuilder::new();
            for i in 0..6 {
                let angle = i as f32 * PI / 3.0;
                let (x, y) = (n / 2.0 + radius * angle.cos(), n / 2.0 + radius * angle.sin());
                if i == 0 {
                    pb.move_to(x, y);
                } else {
                    pb.line_to(x, y);
                }
            }
            pb.close();
            pb.finish()
        }
    }
}

fn rounded_square(x: f32, y: f32, side: f32, radius: f32) -> Option<Path> {
    let r = radius.min(side / 2.0);
    let k = r * KAPPA;
    let (right, bottom) = (x + side, y + side);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn fill_shader(fill: &Fill, n: f32) -> Shader<'static> {
    let stops = |start: Color, end: Color| {
        vec![
            GradientStop::new(0.0, start.to_skia()),
            GradientStop::new(1.0, end.to_skia()),
        ]
    };
    match *fill {
        Fill::Solid { color } => Shader::SolidColor(color.to_skia()),
        Fill::LinearGradient { start, end, angle } => {
            let (sin, cos) = angle.to_radians().sin_cos();
            let half = n / 2.0;
            LinearGradient::new(
                Point::from_xy(half - cos * half, half - sin * half),
                Point::from_xy(half + cos * half, half + sin * half),
                stops(start, end),
                SpreadMode::Pad,
                Transform::identity(),
            )
            .unwrap_or(Shader::SolidColor(start.to_skia()))
        }
        Fill::RadialGradient { start, end } => {
            let centre = Point::from_xy(n / 2.0, n / 2.0);
            RadialGradient::new(
                centre,
                centre,
                n / 2.0,
                stops(start, end),
                SpreadMode::Pad,
                Transform::identity(),
            )
            .unwrap_or(Shader::SolidColor(start.to_skia()))
        }
    }
}

// ── Glyph ────────────────────────────────────────────────────────────────

fn draw_disc(pixmap: &mut Pixmap, transform: Transform, radius: f32, color: Color) {
    if let Some(path) = PathBuilder::from_circle(0.0, 0.0, radius) {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }
}

/// Text centred on the origin of `transform`, `draw` px tall.
fn draw_text(pixmap: &mut Pixmap, transform: Transform, draw: f32, glyph: &TextGlyph, color: Color) {
    if glyph.text.is_empty() || draw <= 0.0 {
        return;
    }
    let side = pixmap.width();
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{side}" height="{side}"><text x="0" y="0" text-anchor="middle" dominant-baseline="central" font-family="{family}" font-weight="{weight}" font-size="{draw}" fill="{fill}" fill-opacity="{opacity}">{text}</text></svg>"#,
        family = xml_escape(&glyph.font_family),
        weight = xml_escape(&glyph.font_weight),
        fill = hex_rgb(color),
        opacity = color.opacity(),
        text = xml_escape(&glyph.text),
    );
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..usvg::Options::default()
    };
    match usvg::Tree::from_str(&svg, &options) {
        Ok(tree) if tree.root().has_children() => {
            resvg::render(&tree, transform, &mut pixmap.as_mut())
        }
        Ok(_) => warn!(
            "Text glyph '{}' matched no installed font for '{}'",
            glyph.text, glyph.font_family
        ),
        Err(e) => warn!("Text glyph '{}' could not be laid out: {}", glyph.text, e),
    }
}

fn hex_rgb(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon::star_glyph;

    fn pixel(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn solid(shape: Shape, color: Color) -> IconSpec {
        IconSpec {
            glyph_scale_percent: 0.0,
            shape,
            fill: Fill::Solid { color },
            ..IconSpec::default()
        }
    }

    #[test]
    fn corners_stay_transparent_inside_padding() {
        let p = render_icon(&solid(Shape::Square, Color::rgb(255, 0, 0)), 200).unwrap();
        assert_eq!(pixel(&p, 0, 0).3, 0);
        assert_eq!(pixel(&p, 4, 4).3, 0);
        assert_eq!(pixel(&p, 6, 6), (255, 0, 0, 255));
        assert_eq!(pixel(&p, 100, 100), (255, 0, 0, 255));
    }

    #[test]
    fn circle_leaves_corners_clear() {
        let p = render_icon(&solid(Shape::Circle, Color::rgb(0, 0, 255)), 100).unwrap();
        assert_eq!(pixel(&p, 10, 10).3, 0);
        assert_eq!(pixel(&p, 50, 50), (0, 0, 255, 255));
    }

    #[test]
    fn rounded_square_clips_corner_but_fills_edge_midpoint() {
        let p = render_icon(&solid(Shape::RoundedSquare, Color::WHITE), 200).unwrap();
        assert_eq!(pixel(&p, 7, 7).3, 0);
        assert_eq!(pixel(&p, 100, 7).3, 255);
    }

    #[test]
    fn hexagon_points_sideways() {
        let p = render_icon(&solid(Shape::Hexagon, Color::WHITE), 200).unwrap();
        // Vertices at 0° and 180°: the horizontal midline reaches the padding,
        // the vertical one stops short of it.
        assert_eq!(pixel(&p, 8, 100).3, 255);
        assert_eq!(pixel(&p, 100, 8).3, 0);
    }

    #[test]
    fn linear_gradient_runs_from_start_to_end() {
        let spec = IconSpec {
            glyph_scale_percent: 0.0,
            shape: Shape::Square,
            fill: Fill::LinearGradient {
                start: Color::rgb(255, 0, 0),
                end: Color::rgb(0, 0, 255),
                angle: 0.0,
            },
            ..IconSpec::default()
        };
        let p = render_icon(&spec, 200).unwrap();
        let left = pixel(&p, 8, 100);
        let right = pixel(&p, 191, 100);
        assert!(left.0 > 200 && left.2 < 55, "{left:?}");
        assert!(right.2 > 200 && right.0 < 55, "{right:?}");
    }

    #[test]
    fn radial_gradient_centre_is_start_colour() {
        let spec = IconSpec {
            glyph_scale_percent: 0.0,
            shape: Shape::Square,
            fill: Fill::RadialGradient {
                start: Color::rgb(0, 255, 0),
                end: Color::BLACK,
            },
            ..IconSpec::default()
        };
        let p = render_icon(&spec, 100).unwrap();
        assert!(pixel(&p, 50, 50).1 > 240);
    }

    #[test]
    fn vector_glyph_is_drawn_in_glyph_colour() {
        let spec = IconSpec {
            glyph: Glyph::Vector(VectorGlyph {
                width: 10,
                height: 10,
                path: "M0 0 H10 V10 H0 Z".into(),
            }),
            glyph_color: Color::rgb(255, 255, 0),
            glyph_scale_percent: 50.0,
            ..solid(Shape::Square, Color::BLACK)
        };
        let p = render_icon(&spec, 100).unwrap();
        assert_eq!(pixel(&p, 50, 50), (255, 255, 0, 255));
        assert_eq!(pixel(&p, 10, 10), (0, 0, 0, 255));
    }

    #[test]
    fn bad_path_falls_back_to_disc() {
        let glyph = VectorGlyph {
            width: 10,
            height: 10,
            path: "not a path".into(),
        };
        assert!(matches!(
            decode_vector_glyph(&glyph, Color::WHITE),
            GlyphRaster::Fallback { .. }
        ));

        let spec = IconSpec {
            glyph: Glyph::Vector(glyph),
            glyph_color: Color::rgb(255, 0, 0),
            glyph_scale_percent: 80.0,
            ..solid(Shape::Square, Color::BLACK)
        };
        let p = render_icon(&spec, 100).unwrap();
        // Disc of radius 80/4 = 20 around the centre.
        assert_eq!(pixel(&p, 50, 50), (255, 0, 0, 255));
        assert_eq!(pixel(&p, 50, 25), (0, 0, 0, 255));
    }

    #[test]
    fn zero_view_box_falls_back() {
        let glyph = VectorGlyph {
            width: 0,
            height: 24,
            path: "M0 0 H1".into(),
        };
        assert!(matches!(
            decode_vector_glyph(&glyph, Color::WHITE),
            GlyphRaster::Fallback { .. }
        ));
    }

    #[test]
    fn star_decodes() {
        assert!(matches!(
            decode_vector_glyph(&star_glyph(), Color::WHITE),
            GlyphRaster::Decoded(_)
        ));
    }

    #[test]
    fn rendering_is_deterministic() {
        let spec = IconSpec {
            rotation_degrees: 15.0,
            fill: Fill::LinearGradient {
                start: Color::rgb(0x63, 0x66, 0xF1),
                end: Color::rgb(0x8B, 0x5C, 0xF6),
                angle: 45.0,
            },
            ..IconSpec::default()
        };
        let a = render_icon(&spec, 128).unwrap().encode_png().unwrap();
        let b = render_icon(&spec, 128).unwrap().encode_png().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn default_family_text_draws_pixels() {
        if FONTS.len() == 0 {
            return;
        }
        let background = solid(Shape::Square, Color::BLACK);
        let with_text = IconSpec {
            glyph: Glyph::Text(TextGlyph::new("W")),
            glyph_color: Color::WHITE,
            glyph_scale_percent: 60.0,
            ..background.clone()
        };
        let bare = IconSpec {
            glyph: Glyph::Text(TextGlyph::new("")),
            ..background
        };

        let drawn = render_icon(&with_text, 128).unwrap();
        let empty = render_icon(&bare, 128).unwrap();
        let changed = drawn
            .data()
            .iter()
            .zip(empty.data())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 100, "only {changed} bytes changed");
    }

    #[test]
    fn generic_families_resolve_to_installed_faces() {
        if FONTS.len() == 0 {
            return;
        }
        for family in [
            fontdb::Family::SansSerif,
            fontdb::Family::Serif,
            fontdb::Family::Monospace,
        ] {
            assert!(has_family(&FONTS, family), "{family:?} has no face");
        }
    }

    #[test]
    fn empty_text_draws_nothing() {
        let spec = IconSpec {
            glyph: Glyph::Text(TextGlyph::new("")),
            ..solid(Shape::Square, Color::BLACK)
        };
        let with_empty = render_icon(
            &IconSpec {
                glyph_scale_percent: 60.0,
                ..spec.clone()
            },
            64,
        )
        .unwrap();
        let background_only = render_icon(&spec, 64).unwrap();
        assert_eq!(with_empty.data(), background_only.data());
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(render_icon(&IconSpec::default(), 0).is_err());
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(xml_escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
