//! Brand colors to CSS custom properties
//!
//! A tenant supplies up to six `#rrggbb` colors. Missing or malformed colors
//! fall back per field to the built-in palette, and a handful of tones are
//! derived from the base colors by scaling their brightness.

use crmdesk_core::{BrandSettings, Error, Result};
use serde::Serialize;
use std::fmt::Write;
use std::ops::Range;
use tracing::debug;

pub const DEFAULT_PRIMARY: &str = "#3b3b3b";
pub const DEFAULT_SECONDARY: &str = "#636363";
pub const DEFAULT_SURFACE: &str = "#ffffff";
pub const DEFAULT_TEXT: &str = "#3b3b3b";

const ACCENT_LIGHTEN: f64 = 0.3;
const TEXT_SECONDARY_LIGHTEN: f64 = 0.7;
const BUTTON_HOVER_DARKEN: f64 = -0.2;
const INPUT_BG_LIGHTEN: f64 = 0.85;

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }

        let channel = |range: Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Scale every channel by `1 + percent`, clamped to 0-255
    ///
    /// This is multiplicative: a zero channel stays zero whatever the
    /// adjustment.
    pub fn adjust(self, percent: f64) -> Self {
        Self {
            r: scale_channel(self.r, percent),
            g: scale_channel(self.g, percent),
            b: scale_channel(self.b, percent),
        }
    }
}

fn scale_channel(channel: u8, percent: f64) -> u8 {
    let value = f64::from(channel);
    (value + value * percent).round().clamp(0.0, 255.0) as u8
}

/// Lighten (positive) or darken (negative) a hex color
pub fn adjust_brightness(hex: &str, percent: f64) -> Result<String> {
    Ok(Rgb::from_hex(hex)?.adjust(percent).to_hex())
}

/// A validated color, keeping the tenant's own spelling for output
#[derive(Debug, Clone)]
struct BrandColor {
    css: String,
    rgb: Rgb,
}

impl BrandColor {
    fn pick(value: Option<&str>, role: &str, fallback: &BrandColor) -> BrandColor {
        let Some(value) = value.map(str::trim) else {
            return fallback.clone();
        };

        match Rgb::from_hex(value) {
            Ok(rgb) if value.starts_with('#') => BrandColor {
                css: value.to_string(),
                rgb,
            },
            Ok(rgb) => BrandColor {
                css: rgb.to_hex(),
                rgb,
            },
            Err(_) => {
                debug!(role, value, "Ignoring malformed brand color");
                fallback.clone()
            }
        }
    }

    fn builtin(hex: &str, rgb: Rgb) -> BrandColor {
        BrandColor {
            css: hex.to_string(),
            rgb,
        }
    }

    fn adjusted(&self, percent: f64) -> String {
        self.rgb.adjust(percent).to_hex()
    }
}

/// The full set of CSS custom properties for one render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedPalette {
    entries: Vec<(&'static str, String)>,
}

impl DerivedPalette {
    /// Value of a custom property, e.g. `--primary-color`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn entries(&self) -> &[(&'static str, String)] {
        &self.entries
    }

    pub fn primary(&self) -> &str {
        self.get("--primary-color").unwrap_or(DEFAULT_PRIMARY)
    }

    /// Render as a `:root { ... }` block
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.entries {
            // Writing to a String cannot fail
            let _ = writeln!(css, "  {}: {};", name, value);
        }
        css.push_str("}\n");
        css
    }
}

/// Derive the palette for a tenant's brand settings
///
/// `None` (no tenant, failed verification) yields the default palette.
pub fn derive_palette(settings: Option<&BrandSettings>) -> DerivedPalette {
    let default_primary = BrandColor::builtin(DEFAULT_PRIMARY, Rgb::new(0x3b, 0x3b, 0x3b));
    let default_secondary = BrandColor::builtin(DEFAULT_SECONDARY, Rgb::new(0x63, 0x63, 0x63));
    let default_surface = BrandColor::builtin(DEFAULT_SURFACE, Rgb::new(0xff, 0xff, 0xff));
    let default_text = BrandColor::builtin(DEFAULT_TEXT, Rgb::new(0x3b, 0x3b, 0x3b));

    let primary = BrandColor::pick(
        settings.and_then(|s| s.primary_color.as_deref()),
        "primary",
        &default_primary,
    );
    let secondary = BrandColor::pick(
        settings.and_then(|s| s.secondary_color.as_deref()),
        "secondary",
        &default_secondary,
    );
    let text = BrandColor::pick(
        settings.and_then(|s| s.text_color.as_deref()),
        "text",
        &default_text,
    );
    let surface = BrandColor::pick(
        settings.and_then(|s| s.background_color.as_deref()),
        "background",
        &default_surface,
    );
    let header_bg = BrandColor::pick(
        settings.and_then(|s| s.header_bg_color.as_deref()),
        "header_bg",
        &primary,
    );
    let header_text = BrandColor::pick(
        settings.and_then(|s| s.header_text_color.as_deref()),
        "header_text",
        &surface,
    );

    let accent = secondary.adjusted(ACCENT_LIGHTEN);

    let entries = vec![
        ("--primary-color", primary.css.clone()),
        ("--secondary-color", secondary.css.clone()),
        ("--text-color", text.css.clone()),
        ("--background-color", surface.css.clone()),
        ("--surface-color", surface.css.clone()),
        ("--header-bg-color", header_bg.css.clone()),
        ("--header-text-color", header_text.css.clone()),
        ("--border-color", secondary.css.clone()),
        ("--accent-color", accent.clone()),
        ("--text-secondary-color", text.adjusted(TEXT_SECONDARY_LIGHTEN)),
        ("--button-bg-color", primary.css.clone()),
        ("--button-text-color", surface.css.clone()),
        ("--button-hover-color", primary.adjusted(BUTTON_HOVER_DARKEN)),
        ("--input-bg-color", primary.adjusted(INPUT_BG_LIGHTEN)),
        ("--sidebar-bg-color", header_bg.css.clone()),
        ("--sidebar-text-color", header_text.css.clone()),
        ("--sidebar-active-color", accent),
        ("--link-color", primary.css),
    ];

    DerivedPalette { entries }
}
