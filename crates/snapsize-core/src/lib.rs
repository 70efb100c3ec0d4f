//! Snapsize Core - Image editing library
//!
//! This crate provides the core editing functionality for Snapsize: the
//! image state store, crop interaction geometry, and the deterministic
//! rasterization pipeline that turns editor state into an encoded file.

pub mod crop;
pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod preview;
pub mod raster;
pub mod state;

pub use crop::{CropSession, Handle};
pub use geometry::{display_scale, CropRect, Viewport};
pub use raster::{render_frame, RenderedFrame};
pub use state::{EditorStore, ImageState};

/// Minimum crop edge length in source pixels. Prevents degenerate crops.
pub const MIN_CROP_SIZE: u32 = 30;

/// Maximum number of undo snapshots kept; oldest are evicted first.
pub const HISTORY_CAPACITY: usize = 20;

/// Default JPEG quality applied when an image is loaded.
pub const DEFAULT_QUALITY: u8 = 90;

/// Output encoding for export and preview.
///
/// This is a closed set; the "jpg" spelling is accepted as an alias for
/// [`OutputFormat::Jpeg`] during parsing but never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG (no alpha channel).
    #[default]
    Jpeg,
    /// Lossless PNG with alpha.
    Png,
    /// Lossless WebP with alpha.
    WebP,
}

impl OutputFormat {
    /// Parse a user-facing format name. Case-insensitive; resolves the
    /// "jpg" alias to [`OutputFormat::Jpeg`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Canonical lowercase name, matching the serde form.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// MIME type used when encoding this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// File extension for download filenames (jpeg uses "jpg").
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Whether the encoding can represent transparent pixels.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Background applied behind the image during rasterization.
///
/// Transparency is only honored by formats with an alpha channel; the
/// rasterizer substitutes opaque white for transparent JPEG exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// No fill; pixels outside the image stay fully transparent.
    Transparent,
    /// Fill the whole canvas with a solid color before drawing.
    Solid(Rgb),
}

impl Default for Background {
    fn default() -> Self {
        Background::Solid(Rgb::WHITE)
    }
}

impl Background {
    /// Parse a CSS-style background value: "transparent" or "#RRGGBB".
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("transparent") {
            return Some(Background::Transparent);
        }
        let hex = value.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Background::Solid(Rgb::new(r, g, b)))
    }

    /// CSS-style string form, the inverse of [`Background::parse`].
    pub fn to_css(self) -> String {
        match self {
            Background::Transparent => "transparent".to_string(),
            Background::Solid(c) => format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b),
        }
    }
}

/// A named fixed target size matching a known document requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub category: &'static str,
}

/// Built-in target sizes offered by the editor UI.
pub const PRESETS: &[Preset] = &[
    // Passport & ID photos
    Preset {
        name: "Passport Photo",
        width: 413,
        height: 531,
        category: "ID Photos",
    },
    Preset {
        name: "PAN Card",
        width: 206,
        height: 265,
        category: "ID Photos",
    },
    Preset {
        name: "Aadhaar Card",
        width: 140,
        height: 182,
        category: "ID Photos",
    },
    Preset {
        name: "Visa Photo",
        width: 600,
        height: 600,
        category: "ID Photos",
    },
    Preset {
        name: "Stamp Size",
        width: 130,
        height: 150,
        category: "ID Photos",
    },
    // Standard sizes
    Preset {
        name: "300 x 300",
        width: 300,
        height: 300,
        category: "Standard",
    },
    Preset {
        name: "600 x 600",
        width: 600,
        height: 600,
        category: "Standard",
    },
    Preset {
        name: "800 x 800",
        width: 800,
        height: 800,
        category: "Standard",
    },
    Preset {
        name: "1024 x 1024",
        width: 1024,
        height: 1024,
        category: "Standard",
    },
    // Job application forms
    Preset {
        name: "SSC Form",
        width: 200,
        height: 230,
        category: "Job Forms",
    },
    Preset {
        name: "UPSC Form",
        width: 200,
        height: 240,
        category: "Job Forms",
    },
    Preset {
        name: "Bank PO",
        width: 200,
        height: 230,
        category: "Job Forms",
    },
    Preset {
        name: "Railway Form",
        width: 165,
        height: 200,
        category: "Job Forms",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_canonical() {
        assert_eq!(OutputFormat::parse("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::parse("webp"), Some(OutputFormat::WebP));
    }

    #[test]
    fn test_format_parse_jpg_alias() {
        assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::parse("JPG"), Some(OutputFormat::Jpeg));
    }

    #[test]
    fn test_format_parse_unknown() {
        assert_eq!(OutputFormat::parse("svg"), None);
        assert_eq!(OutputFormat::parse(""), None);
    }

    #[test]
    fn test_format_name_round_trips_through_parse() {
        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP] {
            assert_eq!(OutputFormat::parse(format.name()), Some(format));
        }
    }

    #[test]
    fn test_format_mime_and_extension_consistent() {
        // jpeg -> .jpg but the MIME stays image/jpeg
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::WebP.mime_type(), "image/webp");
    }

    #[test]
    fn test_format_alpha_support() {
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(OutputFormat::Png.supports_alpha());
        assert!(OutputFormat::WebP.supports_alpha());
    }

    #[test]
    fn test_background_parse_hex() {
        assert_eq!(
            Background::parse("#0066CC"),
            Some(Background::Solid(Rgb::new(0x00, 0x66, 0xCC)))
        );
        assert_eq!(
            Background::parse("#ffffff"),
            Some(Background::Solid(Rgb::WHITE))
        );
    }

    #[test]
    fn test_background_parse_transparent() {
        assert_eq!(
            Background::parse("transparent"),
            Some(Background::Transparent)
        );
        assert_eq!(
            Background::parse("Transparent"),
            Some(Background::Transparent)
        );
    }

    #[test]
    fn test_background_parse_invalid() {
        assert_eq!(Background::parse("#FFF"), None);
        assert_eq!(Background::parse("white"), None);
        assert_eq!(Background::parse("#GGGGGG"), None);
    }

    #[test]
    fn test_background_css_round_trip() {
        for value in ["transparent", "#CC0000", "#F5F5F5"] {
            let bg = Background::parse(value).unwrap();
            assert_eq!(Background::parse(&bg.to_css()), Some(bg));
        }
    }

    #[test]
    fn test_background_default_is_white() {
        assert_eq!(Background::default(), Background::Solid(Rgb::WHITE));
    }

    #[test]
    fn test_presets_contain_job_forms() {
        let ssc = PRESETS.iter().find(|p| p.name == "SSC Form").unwrap();
        assert_eq!((ssc.width, ssc.height), (200, 230));
        assert_eq!(ssc.category, "Job Forms");
    }

    #[test]
    fn test_presets_all_positive() {
        for preset in PRESETS {
            assert!(preset.width >= 1 && preset.height >= 1, "{}", preset.name);
        }
    }
}
