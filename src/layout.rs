//! Preview surface sizing

use serde::{Deserialize, Serialize};

use crate::dimensions::Dimensions;
use crate::types::CaptureOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Inline,
    /// Fixed to the viewport origin, behind other content
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "value")]
pub enum Length {
    Px(u32),
    Percent(u8),
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Length::Px(px) => write!(f, "{}px", px),
            Length::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    Cover,
    Contain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLayout {
    pub mode: DisplayMode,
    pub width: Length,
    pub height: Length,
    pub object_fit: ObjectFit,
    /// Stacking order; fullscreen previews sit behind the host's controls
    pub z_index: i32,
    /// Whether the REC overlay is drawn over the preview while recording
    pub show_indicator: bool,
}

impl PreviewLayout {
    pub fn compute(options: &CaptureOptions, dimensions: Dimensions) -> Self {
        if options.display_fullscreen {
            Self {
                mode: DisplayMode::Fullscreen,
                width: Length::Percent(100),
                height: Length::Percent(100),
                object_fit: ObjectFit::Cover,
                z_index: -1,
                show_indicator: options.show_indicator,
            }
        } else {
            Self {
                mode: DisplayMode::Inline,
                width: Length::Px(dimensions.width),
                height: Length::Px(dimensions.height),
                object_fit: ObjectFit::Cover,
                z_index: 0,
                show_indicator: options.show_indicator,
            }
        }
    }
}
