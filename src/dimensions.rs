//! Preview dimension resolution
//!
//! Turns partial constraints (width, height, aspect ratio) into a concrete
//! pixel size. Aspect ratios are always expressed as `width / height`.

use serde::{Deserialize, Serialize};

/// Width used when neither side is constrained
pub const DEFAULT_BASE_WIDTH: u32 = 640;

/// Ratio used when none is given (16:9)
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Named aspect ratio presets, plus a free-form ratio
///
/// Deserializes from a bare number (`1.77`), a preset name, `"16:9"`, or the
/// tagged form it serializes to (`{"custom": 1.77}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "AspectRatioInput")]
pub enum AspectRatio {
    /// 1:1
    Square,
    /// 4:3
    Standard,
    /// 3:2
    Classic,
    /// 16:9
    Widescreen,
    /// 21:9
    UltraWide,
    /// 9:16
    Portrait,
    /// Any `width / height` value
    Custom(f64),
}

impl AspectRatio {
    pub fn value(&self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Standard => 4.0 / 3.0,
            AspectRatio::Classic => 3.0 / 2.0,
            AspectRatio::Widescreen => 16.0 / 9.0,
            AspectRatio::UltraWide => 21.0 / 9.0,
            AspectRatio::Portrait => 9.0 / 16.0,
            AspectRatio::Custom(ratio) => *ratio,
        }
    }

    /// Parse `"16:9"`, a preset name, or a plain decimal such as `"1.77"`
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "square" => return Some(AspectRatio::Square),
            "standard" => return Some(AspectRatio::Standard),
            "classic" => return Some(AspectRatio::Classic),
            "widescreen" => return Some(AspectRatio::Widescreen),
            "ultra_wide" | "ultrawide" => return Some(AspectRatio::UltraWide),
            "portrait" => return Some(AspectRatio::Portrait),
            _ => {}
        }

        if let Some((w, h)) = trimmed.split_once(':') {
            let w: f64 = w.trim().parse().ok()?;
            let h: f64 = h.trim().parse().ok()?;
            if h == 0.0 {
                return None;
            }
            return Some(AspectRatio::Custom(w / h));
        }

        trimmed.parse::<f64>().ok().map(AspectRatio::Custom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AspectRatioInput {
    Number(f64),
    Text(String),
    Tagged { custom: f64 },
}

impl TryFrom<AspectRatioInput> for AspectRatio {
    type Error = String;

    fn try_from(input: AspectRatioInput) -> Result<Self, Self::Error> {
        let ratio = match input {
            AspectRatioInput::Number(value) | AspectRatioInput::Tagged { custom: value } => {
                AspectRatio::Custom(value)
            }
            AspectRatioInput::Text(text) => AspectRatio::parse(&text)
                .ok_or_else(|| format!("invalid aspect ratio: {:?}", text))?,
        };

        let value = ratio.value();
        if !value.is_finite() || value <= 0.0 {
            return Err(format!("aspect ratio must be positive, got {}", value));
        }
        Ok(ratio)
    }
}

impl From<f64> for AspectRatio {
    fn from(ratio: f64) -> Self {
        AspectRatio::Custom(ratio)
    }
}

/// Partial size constraints supplied by the host
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

impl DimensionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit width and height; any ratio is ignored when both are set
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            aspect_ratio: None,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<AspectRatio>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn resolve(&self) -> Dimensions {
        resolve_dimensions(self)
    }
}

/// Concrete pixel size of the preview surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        resolve_dimensions(&DimensionSpec::default())
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolve a spec into a concrete size.
///
/// Explicit width and height win outright. Otherwise the missing side is
/// derived from the present one through the ratio (default 16:9), and with
/// neither side present the height is derived from [`DEFAULT_BASE_WIDTH`].
/// Derived sides are floored and never drop below one pixel.
pub fn resolve_dimensions(spec: &DimensionSpec) -> Dimensions {
    if let (Some(width), Some(height)) = (spec.width, spec.height) {
        return Dimensions { width, height };
    }

    let ratio = spec
        .aspect_ratio
        .map(|r| r.value())
        .unwrap_or(DEFAULT_ASPECT_RATIO);

    match (spec.width, spec.height) {
        (Some(width), None) => Dimensions {
            width,
            height: height_for(width, ratio),
        },
        (None, Some(height)) => Dimensions {
            width: width_for(height, ratio),
            height,
        },
        _ => Dimensions {
            width: DEFAULT_BASE_WIDTH,
            height: height_for(DEFAULT_BASE_WIDTH, ratio),
        },
    }
}

// Preset ratios are not exact in binary; exact products must not floor one
// pixel short.
const FLOOR_EPSILON: f64 = 1e-9;

fn width_for(height: u32, ratio: f64) -> u32 {
    clamp_side(height as f64 * ratio)
}

fn height_for(width: u32, ratio: f64) -> u32 {
    clamp_side(width as f64 / ratio)
}

fn clamp_side(raw: f64) -> u32 {
    let value = (raw + FLOOR_EPSILON).floor();
    if value.is_finite() && value >= 1.0 {
        value.min(u32::MAX as f64) as u32
    } else {
        1
    }
}
