//! Icon designer: a background shape plus a glyph, rasterised to N×N.
//!
//! An [`IconSpec`] fully determines the pixels for a given size; rendering
//! the same spec at the same size twice yields byte-identical PNGs.
//!
//! ```rust,no_run
//! use edgequake_doctools::icon::{export_icon, IconSpec, IconTemplate};
//!
//! let mut spec = IconSpec::default();
//! IconTemplate::by_name("Neon").unwrap().apply(&mut spec);
//! let export = export_icon(&spec, 256).unwrap();
//! assert!(export.data_uri.starts_with("data:image/png;base64,"));
//! ```

pub mod color;
pub mod render;

pub use color::Color;
pub use render::{decode_vector_glyph, render_icon, GlyphRaster};

use crate::error::DocToolsError;
use crate::output::IconExport;
use crate::pipeline::encode::data_uri;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Sizes offered for export.
pub const EXPORT_SIZES: [u32; 4] = [64, 128, 256, 512];

/// Gradient angle used when nothing else sets one.
pub const DEFAULT_GRADIENT_ANGLE: f32 = 45.0;

// ── Spec ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    Circle,
    Square,
    #[default]
    RoundedSquare,
    Hexagon,
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(Shape::Circle),
            "square" => Ok(Shape::Square),
            "rounded-square" | "rounded" => Ok(Shape::RoundedSquare),
            "hexagon" => Ok(Shape::Hexagon),
            other => Err(format!(
                "unknown shape '{other}' (expected circle, square, rounded-square or hexagon)"
            )),
        }
    }
}

/// Background paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fill {
    Solid { color: Color },
    LinearGradient { start: Color, end: Color, angle: f32 },
    RadialGradient { start: Color, end: Color },
}

/// A single-path vector glyph with its own coordinate box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorGlyph {
    pub width: u32,
    pub height: u32,
    /// SVG path data.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextGlyph {
    pub text: String,
    pub font_family: String,
    pub font_weight: String,
}

impl TextGlyph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: "Arial, sans-serif".to_string(),
            font_weight: "bold".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Glyph {
    Vector(VectorGlyph),
    Text(TextGlyph),
}

/// Everything needed to draw an icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSpec {
    pub glyph: Glyph,
    pub glyph_color: Color,
    /// Glyph box as a percentage of the canvas side.
    pub glyph_scale_percent: f32,
    /// Clockwise rotation of the glyph, in degrees.
    pub rotation_degrees: f32,
    pub shape: Shape,
    pub fill: Fill,
}

/// Five-pointed star on a 100×100 box.
pub fn star_glyph() -> VectorGlyph {
    VectorGlyph {
        width: 100,
        height: 100,
        path: "M50 4 L61 38 L97 38 L68 60 L79 95 L50 73 L21 95 L32 60 L3 38 L39 38 Z".to_string(),
    }
}

impl Default for IconSpec {
    fn default() -> Self {
        Self {
            glyph: Glyph::Vector(star_glyph()),
            glyph_color: Color::WHITE,
            glyph_scale_percent: 60.0,
            rotation_degrees: 0.0,
            shape: Shape::RoundedSquare,
            fill: Fill::Solid {
                color: Color::BLACK,
            },
        }
    }
}

impl IconSpec {
    pub fn validate(&self) -> Result<(), DocToolsError> {
        if !(self.glyph_scale_percent.is_finite() && self.glyph_scale_percent >= 0.0) {
            return Err(DocToolsError::InvalidConfig(format!(
                "glyph scale must be a non-negative percentage, got {}",
                self.glyph_scale_percent
            )));
        }
        if !self.rotation_degrees.is_finite() {
            return Err(DocToolsError::InvalidConfig("rotation must be finite".into()));
        }
        if let Fill::LinearGradient { angle, .. } = self.fill {
            if !angle.is_finite() {
                return Err(DocToolsError::InvalidConfig(
                    "gradient angle must be finite".into(),
                ));
            }
        }
        Ok(())
    }
}

// ── Templates ────────────────────────────────────────────────────────────

/// Background part of a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateFill {
    Solid(Color),
    /// `angle: None` keeps the current gradient angle.
    Linear {
        start: Color,
        end: Color,
        angle: Option<f32>,
    },
    Radial { start: Color, end: Color },
}

/// A named style preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconTemplate {
    pub name: &'static str,
    pub fill: TemplateFill,
    pub glyph_color: Color,
    pub shape: Shape,
    pub glyph_scale_percent: f32,
    /// Applied only when set.
    pub rotation_degrees: Option<f32>,
}

pub const TEMPLATES: [IconTemplate; 8] = [
    IconTemplate {
        name: "iOS Style",
        fill: TemplateFill::Solid(Color::BLACK),
        glyph_color: Color::WHITE,
        shape: Shape::RoundedSquare,
        glyph_scale_percent: 60.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Material",
        fill: TemplateFill::Solid(Color::rgb(0x4C, 0xAF, 0x50)),
        glyph_color: Color::WHITE,
        shape: Shape::Circle,
        glyph_scale_percent: 55.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Minimal",
        fill: TemplateFill::Solid(Color::WHITE),
        glyph_color: Color::BLACK,
        shape: Shape::Square,
        glyph_scale_percent: 50.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Gradient",
        fill: TemplateFill::Linear {
            start: Color::rgb(0x63, 0x66, 0xF1),
            end: Color::rgb(0x8B, 0x5C, 0xF6),
            angle: Some(45.0),
        },
        glyph_color: Color::WHITE,
        shape: Shape::RoundedSquare,
        glyph_scale_percent: 65.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Neon",
        fill: TemplateFill::Radial {
            start: Color::rgb(0xFF, 0x00, 0x6E),
            end: Color::rgb(0x83, 0x38, 0xEC),
        },
        glyph_color: Color::WHITE,
        shape: Shape::Circle,
        glyph_scale_percent: 70.0,
        rotation_degrees: Some(15.0),
    },
    IconTemplate {
        name: "Retro",
        fill: TemplateFill::Linear {
            start: Color::rgb(0xF7, 0x25, 0x85),
            end: Color::rgb(0xB5, 0x17, 0x9E),
            angle: Some(135.0),
        },
        glyph_color: Color::rgb(0xFF, 0xE6, 0x6D),
        shape: Shape::Square,
        glyph_scale_percent: 65.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Glassmorphism",
        fill: TemplateFill::Linear {
            start: Color::rgba(255, 255, 255, 51),
            end: Color::rgba(255, 255, 255, 13),
            angle: None,
        },
        glyph_color: Color::WHITE,
        shape: Shape::RoundedSquare,
        glyph_scale_percent: 60.0,
        rotation_degrees: None,
    },
    IconTemplate {
        name: "Neumorphism",
        fill: TemplateFill::Solid(Color::rgb(0xE0, 0xE5, 0xEC)),
        glyph_color: Color::rgb(0x9B, 0xAA, 0xCF),
        shape: Shape::RoundedSquare,
        glyph_scale_percent: 55.0,
        rotation_degrees: None,
    },
];

impl IconTemplate {
    /// Case-insensitive lookup; `_` and `-` match a space (`ios_style`).
    pub fn by_name(name: &str) -> Option<&'static IconTemplate> {
        let wanted = name.replace(['_', '-'], " ");
        TEMPLATES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(wanted.trim()))
    }

    /// Overwrite fill, glyph colour, shape, glyph scale and (when set)
    /// rotation. The glyph itself is kept.
    pub fn apply(&self, spec: &mut IconSpec) {
        spec.fill = match self.fill {
            TemplateFill::Solid(color) => Fill::Solid { color },
            TemplateFill::Linear { start, end, angle } => {
                let current = match spec.fill {
                    Fill::LinearGradient { angle, .. } => angle,
                    _ => DEFAULT_GRADIENT_ANGLE,
                };
                Fill::LinearGradient {
                    start,
                    end,
                    angle: angle.unwrap_or(current),
                }
            }
            TemplateFill::Radial { start, end } => Fill::RadialGradient { start, end },
        };
        spec.glyph_color = self.glyph_color;
        spec.shape = self.shape;
        spec.glyph_scale_percent = self.glyph_scale_percent;
        if let Some(rotation) = self.rotation_degrees {
            spec.rotation_degrees = rotation;
        }
    }
}

// ── Export ───────────────────────────────────────────────────────────────

/// Render `spec` at `size` (one of [`EXPORT_SIZES`]) and wrap the PNG as a
/// data URI named `icon-<unix-epoch-ms>.png`.
pub fn export_icon(spec: &IconSpec, size: u32) -> Result<IconExport, DocToolsError> {
    if !EXPORT_SIZES.contains(&size) {
        return Err(DocToolsError::InvalidConfig(format!(
            "export size must be one of {EXPORT_SIZES:?}, got {size}"
        )));
    }
    let pixmap = render_icon(spec, size)?;
    let png = pixmap
        .encode_png()
        .map_err(|e| DocToolsError::EncodeFailed {
            page: 1,
            detail: e.to_string(),
        })?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    info!("Exported {}×{} icon ({} bytes)", size, size, png.len());
    Ok(IconExport {
        size,
        filename: format!("icon-{millis}.png"),
        data_uri: data_uri("image/png", &png),
        png,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_templates_with_unique_names() {
        let mut names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn lookup_is_forgiving() {
        assert_eq!(IconTemplate::by_name("ios_style").unwrap().name, "iOS Style");
        assert_eq!(IconTemplate::by_name("NEON").unwrap().name, "Neon");
        assert!(IconTemplate::by_name("Brutalist").is_none());
    }

    #[test]
    fn neon_sets_rotation_but_material_keeps_it() {
        let mut spec = IconSpec {
            rotation_degrees: 30.0,
            ..IconSpec::default()
        };
        IconTemplate::by_name("Material").unwrap().apply(&mut spec);
        assert_eq!(spec.rotation_degrees, 30.0);
        assert_eq!(spec.shape, Shape::Circle);
        IconTemplate::by_name("Neon").unwrap().apply(&mut spec);
        assert_eq!(spec.rotation_degrees, 15.0);
        assert!(matches!(spec.fill, Fill::RadialGradient { .. }));
    }

    #[test]
    fn glassmorphism_keeps_current_angle() {
        let mut spec = IconSpec::default();
        IconTemplate::by_name("Retro").unwrap().apply(&mut spec);
        IconTemplate::by_name("Glassmorphism").unwrap().apply(&mut spec);
        match spec.fill {
            Fill::LinearGradient { angle, start, .. } => {
                assert_eq!(angle, 135.0);
                assert_eq!(start.a, 51);
            }
            other => panic!("expected linear gradient, got {other:?}"),
        }

        let mut fresh = IconSpec::default();
        IconTemplate::by_name("Glassmorphism").unwrap().apply(&mut fresh);
        assert!(matches!(fresh.fill, Fill::LinearGradient { angle, .. } if angle == 45.0));
    }

    #[test]
    fn templates_keep_the_glyph() {
        let mut spec = IconSpec {
            glyph: Glyph::Text(TextGlyph::new("AB")),
            ..IconSpec::default()
        };
        IconTemplate::by_name("Minimal").unwrap().apply(&mut spec);
        assert_eq!(spec.glyph, Glyph::Text(TextGlyph::new("AB")));
    }

    #[test]
    fn shapes_parse() {
        assert_eq!("rounded-square".parse::<Shape>().unwrap(), Shape::RoundedSquare);
        assert_eq!("Hexagon".parse::<Shape>().unwrap(), Shape::Hexagon);
        assert!("triangle".parse::<Shape>().is_err());
    }

    #[test]
    fn export_rejects_odd_sizes() {
        assert!(export_icon(&IconSpec::default(), 100).is_err());
    }

    #[test]
    fn export_is_a_png_data_uri() {
        let export = export_icon(&IconSpec::default(), 64).unwrap();
        assert!(export.data_uri.starts_with("data:image/png;base64,"));
        assert!(export.filename.starts_with("icon-"));
        assert!(export.filename.ends_with(".png"));
        let decoded = image::load_from_memory(&export.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let spec = IconSpec {
            glyph_scale_percent: f32::NAN,
            ..IconSpec::default()
        };
        assert!(spec.validate().is_err());
        assert!(IconSpec::default().validate().is_ok());
    }

    #[test]
    fn spec_serialises_with_tags() {
        let json = serde_json::to_value(IconSpec::default()).unwrap();
        assert_eq!(json["shape"], "rounded-square");
        assert_eq!(json["fill"]["type"], "solid");
        assert_eq!(json["glyph"]["kind"], "vector");
    }
}
