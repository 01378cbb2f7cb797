use super::error::{ChartError, ChartResult};
use crate::dynamics::{IntegrationMode, SpringConfig};
use crate::geometry::{RingParams, Segments, MAX_SEGMENTS};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> ChartResult<Self> {
        let invalid = || ChartError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear RGBA for shading, decoding the sRGB channels.
    pub fn to_linear_rgba(self) -> [f32; 4] {
        let decode = |c: u8| {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [decode(self.r), decode(self.g), decode(self.b), 1.0]
    }
}

impl TryFrom<String> for Color {
    type Error = ChartError;

    fn try_from(value: String) -> ChartResult<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    Rotate,
    Grow,
}

impl AnimationKind {
    pub fn target(self, theta_length: f32, config: &ChartConfig) -> f32 {
        match self {
            AnimationKind::Rotate => theta_length,
            AnimationKind::Grow => config.height,
        }
    }

    pub fn ring_params(self, theta_start: f32, theta_length: f32, config: &ChartConfig, value: f32) -> RingParams {
        let (height, theta_length) = match self {
            AnimationKind::Rotate => (config.height, value),
            AnimationKind::Grow => (value, theta_length),
        };
        RingParams {
            outer_radius: config.outer_radius,
            inner_radius: config.inner_radius,
            height,
            theta_start,
            theta_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub percentage: f32,
    pub color: Color,
    #[serde(default)]
    pub animation: AnimationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub immediate: bool,
    /// Initial label state. Only interpreted by the label overlay.
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub spring: Option<SpringConfig>,
}

fn default_expanded() -> bool {
    true
}

impl SectionSpec {
    pub fn new(percentage: f32, color: Color, animation: AnimationKind) -> Self {
        Self {
            percentage,
            color,
            animation,
            title: String::new(),
            subtitle: String::new(),
            immediate: false,
            expanded: true,
            spring: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        self.title = title.into();
        self.subtitle = subtitle.into();
        self
    }

    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    pub fn with_spring(mut self, spring: SpringConfig) -> Self {
        self.spring = Some(spring);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub height: f32,
    /// Stagger between consecutive sections, in milliseconds.
    pub delay: u64,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub label_radius: f32,
    pub collapsible_labels: bool,
    pub segments: Segments,
    pub spring: SpringConfig,
    pub integration: IntegrationMode,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            height: 1.0,
            delay: 1000,
            outer_radius: 2.0,
            inner_radius: 1.0,
            label_radius: 2.0,
            collapsible_labels: false,
            segments: Segments::default(),
            spring: SpringConfig::default(),
            integration: IntegrationMode::PerFrame,
        }
    }
}

impl ChartConfig {
    pub fn validate(&self) -> ChartResult<()> {
        let invalid = |msg: &str| Err(ChartError::InvalidConfig(msg.to_string()));

        if !(self.height.is_finite() && self.height > 0.0) {
            return invalid("height must be positive");
        }
        if !(self.inner_radius.is_finite() && self.inner_radius > 0.0) {
            return invalid("inner radius must be positive");
        }
        if !(self.outer_radius.is_finite() && self.outer_radius > self.inner_radius) {
            return invalid("outer radius must exceed inner radius");
        }
        if !(self.label_radius.is_finite() && self.label_radius >= 0.0) {
            return invalid("label radius must be non-negative");
        }
        if self.segments.radial == 0 || self.segments.height == 0 {
            return invalid("segment counts must be at least 1");
        }
        if self.segments.radial > MAX_SEGMENTS || self.segments.height > MAX_SEGMENTS {
            return invalid("segment counts too large");
        }
        if !self.spring.is_valid() {
            return invalid("spring needs positive mass and stiffness");
        }
        if let IntegrationMode::DeltaTime { reference_hz } = self.integration {
            if !(reference_hz.is_finite() && reference_hz > 0.0) {
                return invalid("reference rate must be positive");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSpec {
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub config: ChartConfig,
}

impl ChartSpec {
    pub fn new(sections: Vec<SectionSpec>, config: ChartConfig) -> Self {
        Self { sections, config }
    }

    pub fn from_json(json: &str) -> ChartResult<Self> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ChartResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Percentages are not required to add up to 100.
    pub fn validate(&self) -> ChartResult<()> {
        self.config.validate()?;
        for (index, section) in self.sections.iter().enumerate() {
            let p = section.percentage;
            if !(p.is_finite() && p > 0.0 && p <= 100.0) {
                return Err(ChartError::InvalidSection {
                    index,
                    reason: format!("percentage {p} outside (0, 100]"),
                });
            }
            if let Some(spring) = &section.spring {
                if !spring.is_valid() {
                    return Err(ChartError::InvalidSection {
                        index,
                        reason: "spring needs positive mass and stiffness".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn total_percentage(&self) -> f32 {
        self.sections.iter().map(|s| s.percentage).sum()
    }

    /// Three-section scholarship breakdown used by the demo binary.
    pub fn demo() -> Self {
        let colors = [
            Color::new(0xFF, 0xC8, 0x00),
            Color::new(0x81, 0x62, 0xC4),
            Color::new(0x63, 0x34, 0xC8),
        ];
        Self::new(
            vec![
                SectionSpec::new(20.0, colors[0], AnimationKind::Rotate)
                    .titled("Primer Foundation Scholarship", "$8,960"),
                SectionSpec::new(20.0, colors[1], AnimationKind::Rotate).titled("Primer Tuition", "$18,500"),
                SectionSpec::new(60.0, colors[2], AnimationKind::Rotate)
                    .titled("Family Responsibility", "$8,280"),
            ],
            ChartConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::from_hex("#FFC800").unwrap(), Color::new(255, 200, 0));
        assert_eq!(Color::from_hex("#8162c4").unwrap(), Color::new(0x81, 0x62, 0xC4));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::new(255, 255, 255));
        assert!(Color::from_hex("FFC800").is_err());
        assert!(Color::from_hex("#FFC80").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
        assert!(Color::from_hex("#é1").is_err());
        assert_eq!(Color::new(0x63, 0x34, 0xC8).to_hex(), "#6334C8");
    }

    #[test]
    fn loads_page_shaped_json() {
        let json = r##"{
            "sections": [
                { "percentage": 20, "color": "#FFC800", "animation": "rotate",
                  "title": "Primer Foundation Scholarship", "subtitle": "$8,960" },
                { "percentage": 20, "color": "#8162C4", "animation": "grow", "immediate": true },
                { "percentage": 60, "color": "#6334C8",
                  "spring": { "mass": 10, "tension": 0.2, "friction": 0.5 } }
            ],
            "config": { "height": 1, "delay": 1000, "outerRadius": 2, "innerRadius": 1 }
        }"##;
        let spec = ChartSpec::from_json(json).unwrap();

        assert_eq!(spec.sections.len(), 3);
        assert_eq!(spec.sections[1].animation, AnimationKind::Grow);
        assert!(spec.sections[1].immediate);
        assert!(spec.sections[0].expanded);
        assert_eq!(spec.sections[2].animation, AnimationKind::Rotate);
        let spring = spec.sections[2].spring.unwrap();
        assert_eq!(spring.mass, 10.0);
        assert_eq!(spring.stiffness, 0.2);
        assert_eq!(spring.damping, 0.5);
        assert_eq!(spec.config.delay, 1000);
        assert_eq!(spec.config.segments, Segments::default());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut spec = ChartSpec::demo();
        spec.config.inner_radius = 3.0;
        assert!(matches!(spec.validate(), Err(ChartError::InvalidConfig(_))));

        let mut spec = ChartSpec::demo();
        spec.sections[1].percentage = 0.0;
        assert!(matches!(spec.validate(), Err(ChartError::InvalidSection { index: 1, .. })));
    }

    #[test]
    fn rejects_oversized_segment_counts() {
        let mut spec = ChartSpec::demo();
        spec.config.segments = Segments { radial: u32::MAX, height: 16 };
        assert!(matches!(spec.validate(), Err(ChartError::InvalidConfig(_))));

        spec.config.segments = Segments { radial: MAX_SEGMENTS, height: MAX_SEGMENTS };
        assert!(spec.validate().is_ok());

        let json = r##"{ "sections": [], "config": { "segments": { "radial": 16, "height": 100000 } } }"##;
        assert!(matches!(ChartSpec::from_json(json), Err(ChartError::InvalidConfig(_))));
    }

    #[test]
    fn sums_other_than_hundred_are_accepted() {
        let mut spec = ChartSpec::demo();
        spec.sections.push(SectionSpec::new(50.0, Color::new(0, 0, 0), AnimationKind::Grow));
        assert!(spec.validate().is_ok());
        assert_eq!(spec.total_percentage(), 150.0);
    }

    #[test]
    fn animation_kind_picks_the_animated_parameter() {
        let config = ChartConfig::default();
        let rotate = AnimationKind::Rotate.ring_params(0.5, 2.0, &config, 0.25);
        assert_eq!((rotate.theta_length, rotate.height), (0.25, 1.0));

        let grow = AnimationKind::Grow.ring_params(0.5, 2.0, &config, 0.25);
        assert_eq!((grow.theta_length, grow.height), (2.0, 0.25));
        assert_eq!(AnimationKind::Grow.target(2.0, &config), 1.0);
    }
}
