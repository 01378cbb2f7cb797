use super::error::ChartResult;
use super::layout::{layout_sections, section_labels, SectionLabel, SectionLayout};
use super::model::ChartSpec;
use super::scheduler::FrameScheduler;
use super::section::{SectionController, SectionState};
use crate::geometry::MeshTarget;
use std::time::Duration;

#[derive(Debug)]
pub struct DonutChart {
    spec: ChartSpec,
    layout: Vec<SectionLayout>,
    labels: Vec<SectionLabel>,
    sections: Vec<SectionController>,
    scheduler: FrameScheduler,
    mounted: bool,
}

impl DonutChart {
    pub fn new(spec: ChartSpec) -> ChartResult<Self> {
        spec.validate()?;

        let layout = layout_sections(&spec);
        let labels = section_labels(&spec, &layout);
        let sections = spec
            .sections
            .iter()
            .zip(&layout)
            .map(|(section, slot)| SectionController::new(section, slot, &spec.config))
            .collect();

        if spec.sections.is_empty() {
            log::warn!("chart has no sections, nothing will be drawn");
        } else if (spec.total_percentage() - 100.0).abs() > 0.01 {
            log::info!("section percentages sum to {}", spec.total_percentage());
        }

        Ok(Self {
            spec,
            layout,
            labels,
            sections,
            scheduler: FrameScheduler::new(),
            mounted: false,
        })
    }

    pub fn mount(&mut self, now: Duration) {
        if self.mounted {
            return;
        }
        self.scheduler.advance(now);
        for section in &mut self.sections {
            section.mount(&mut self.scheduler);
        }
        self.mounted = true;
        log::info!("mounted chart with {} sections", self.sections.len());
    }

    pub fn tick(&mut self, now: Duration, target: &mut dyn MeshTarget) {
        if !self.mounted {
            return;
        }
        let tick = self.scheduler.advance(now);
        for section in &mut self.sections {
            section.on_tick(&tick, &mut self.scheduler, target);
        }
    }

    pub fn unmount(&mut self, target: &mut dyn MeshTarget) {
        for section in &mut self.sections {
            section.unmount(&mut self.scheduler, target);
        }
        self.mounted = false;
    }

    pub fn unmount_section(&mut self, index: usize, target: &mut dyn MeshTarget) -> bool {
        match self.sections.get_mut(index) {
            Some(section) => {
                section.unmount(&mut self.scheduler, target);
                true
            }
            None => false,
        }
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn layout(&self) -> &[SectionLayout] {
        &self.layout
    }

    pub fn labels(&self) -> &[SectionLabel] {
        &self.labels
    }

    pub fn sections(&self) -> &[SectionController] {
        &self.sections
    }

    pub fn section_state(&self, index: usize) -> Option<SectionState> {
        self.sections.get(index).map(SectionController::state)
    }

    /// Flips a label between expanded and collapsed. Returns the new state, or `None`
    /// when labels are fixed or the index is out of range.
    pub fn toggle_label(&mut self, index: usize) -> Option<bool> {
        if !self.spec.config.collapsible_labels {
            return None;
        }
        let label = self.labels.get_mut(index)?;
        label.expanded = !label.expanded;
        Some(label.expanded)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_settled(&self) -> bool {
        self.sections
            .iter()
            .all(|s| matches!(s.state(), SectionState::Settled | SectionState::Unmounted))
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::model::{AnimationKind, ChartConfig, Color, SectionSpec};
    use crate::geometry::{MeshArena, Segments};

    fn coarse(mut spec: ChartSpec) -> ChartSpec {
        spec.config.segments = Segments { radial: 8, height: 1 };
        spec
    }

    #[test]
    fn rejects_invalid_spec() {
        let mut spec = ChartSpec::demo();
        spec.sections[0].percentage = -5.0;
        assert!(DonutChart::new(spec).is_err());
    }

    #[test]
    fn nothing_happens_before_mount() {
        let mut chart = DonutChart::new(coarse(ChartSpec::demo())).unwrap();
        let mut arena = MeshArena::new();
        chart.tick(Duration::from_secs(10), &mut arena);
        assert_eq!(arena.stats().installs, 0);
        assert_eq!(chart.section_state(0), Some(SectionState::Pending));
    }

    #[test]
    fn demo_chart_settles_with_one_mesh_per_section() {
        let mut chart = DonutChart::new(coarse(ChartSpec::demo())).unwrap();
        let mut arena = MeshArena::new();
        chart.mount(Duration::ZERO);

        let mut now = Duration::ZERO;
        while !chart.is_settled() {
            now += Duration::from_millis(16);
            chart.tick(now, &mut arena);
            assert!(now < Duration::from_secs(30));
        }

        assert_eq!(arena.live(), 3);
        assert_eq!(arena.stats().overwrites, 0);
        chart.unmount(&mut arena);
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn oversized_delay_keeps_late_sections_pending() {
        let mut spec = coarse(ChartSpec::demo());
        spec.sections.push(SectionSpec::new(10.0, Color::new(0, 0, 0), AnimationKind::Grow));
        spec.config.delay = u64::MAX / 2;
        let mut chart = DonutChart::new(spec).unwrap();
        let mut arena = MeshArena::new();
        chart.mount(Duration::from_millis(5));
        chart.tick(Duration::from_secs(60), &mut arena);

        assert_eq!(chart.section_state(0), Some(SectionState::Animating));
        assert!((1..4).all(|i| chart.section_state(i) == Some(SectionState::Pending)));
        assert_eq!(arena.live(), 1);
    }

    #[test]
    fn labels_toggle_only_when_collapsible() {
        let mut chart = DonutChart::new(ChartSpec::demo()).unwrap();
        assert_eq!(chart.toggle_label(0), None);

        let mut spec = ChartSpec::demo();
        spec.config.collapsible_labels = true;
        let mut chart = DonutChart::new(spec).unwrap();
        assert_eq!(chart.toggle_label(1), Some(false));
        assert_eq!(chart.toggle_label(1), Some(true));
        assert_eq!(chart.toggle_label(9), None);
    }

    #[test]
    fn unmounting_one_section_leaves_the_rest() {
        let spec = ChartSpec::new(
            vec![
                SectionSpec::new(50.0, Color::new(1, 1, 1), AnimationKind::Grow).immediate(),
                SectionSpec::new(50.0, Color::new(2, 2, 2), AnimationKind::Grow).immediate(),
            ],
            ChartConfig::default(),
        );
        let mut chart = DonutChart::new(coarse(spec)).unwrap();
        let mut arena = MeshArena::new();
        chart.mount(Duration::ZERO);
        chart.tick(Duration::from_millis(16), &mut arena);

        assert!(chart.unmount_section(0, &mut arena));
        assert!(!chart.unmount_section(5, &mut arena));
        chart.tick(Duration::from_millis(32), &mut arena);

        assert_eq!(chart.section_state(0), Some(SectionState::Unmounted));
        assert_eq!(chart.section_state(1), Some(SectionState::Animating));
        assert!(arena.get(0).is_none());
        assert!(arena.get(1).is_some());
    }
}
