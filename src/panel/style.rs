//! Plot line styles
//!
//! A style string is either empty (default color) or `#RRGGBBAA`: exactly
//! eight hex digits, case-insensitive.

/// Line color as parsed from a style string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LineColor {
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("Line color must start with '#': {:?}", s))?;
        if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("Invalid line color (expected #RRGGBBAA): {:?}", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(LineColor {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: channel(6)?,
        })
    }

    /// Channels are 0..=255, so this maps them onto egui's normalized colors
    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

/// Style of one plot group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineStyle {
    pub color: Option<LineColor>,
}

impl LineStyle {
    pub fn parse(style: &str) -> Result<Self, String> {
        if style.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            color: Some(LineColor::from_hex(style)?),
        })
    }

    /// Parse a style, logging and falling back to the default color on errors
    pub fn parse_or_default(style: &str) -> Self {
        match Self::parse(style) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Ignoring plot style: {}", e);
                debug_assert!(false, "invalid plot style {style:?}: {e}");
                Self::default()
            }
        }
    }

    pub fn has_custom_line_color(&self) -> bool {
        self.color.is_some()
    }
}
