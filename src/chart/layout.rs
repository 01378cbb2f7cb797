use super::model::{ChartSpec, Color};
use glam::Vec3;
use std::f32::consts::TAU;
use std::time::Duration;

pub fn percent_to_radians(percentage: f32) -> f32 {
    percentage * TAU / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionLayout {
    pub index: usize,
    pub theta_start: f32,
    pub theta_length: f32,
    pub delay: Duration,
}

impl SectionLayout {
    pub fn mid_angle(&self) -> f32 {
        self.theta_start + self.theta_length / 2.0
    }
}

/// Lays sections end to end in sequence order.
///
/// Totals other than 100 are not normalized, so an overfull chart wraps past a full
/// turn. Section `i` waits `i * delay` unless it is marked immediate.
pub fn layout_sections(spec: &ChartSpec) -> Vec<SectionLayout> {
    let mut covered = 0.0;
    spec.sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let theta_start = percent_to_radians(covered);
            covered += section.percentage;

            let delay = if section.immediate {
                Duration::ZERO
            } else {
                Duration::from_millis((index as u64).saturating_mul(spec.config.delay))
            };

            SectionLayout {
                index,
                theta_start,
                theta_length: percent_to_radians(section.percentage),
                delay,
            }
        })
        .collect()
}

pub fn label_anchor(angle: f32, radius: f32) -> Vec3 {
    Vec3::new(angle.sin() * radius, 0.0, angle.cos() * radius)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionLabel {
    pub index: usize,
    pub title: String,
    pub subtitle: String,
    pub color: Color,
    pub anchor: Vec3,
    pub expanded: bool,
}

pub fn section_labels(spec: &ChartSpec, layout: &[SectionLayout]) -> Vec<SectionLabel> {
    spec.sections
        .iter()
        .zip(layout)
        .map(|(section, slot)| SectionLabel {
            index: slot.index,
            title: section.title.clone(),
            subtitle: section.subtitle.clone(),
            color: section.color,
            anchor: label_anchor(slot.mid_angle(), spec.config.label_radius),
            expanded: section.expanded,
        })
        .collect()
}
