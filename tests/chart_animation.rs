use donut3d::chart::{
    AnimationKind, ChartConfig, ChartSpec, Clock, Color, DonutChart, ManualClock, SectionSpec, SectionState,
};
use donut3d::geometry::{MeshArena, MeshData, MeshHandle, MeshTarget, Segments};
use std::collections::HashMap;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

/// Mesh store that records every call, checking release-before-install as it goes.
#[derive(Default)]
struct RecordingTarget {
    arena: MeshArena,
    live: HashMap<usize, MeshHandle>,
    installs: Vec<(Duration, usize, MeshData)>,
    now: Duration,
}

impl MeshTarget for RecordingTarget {
    fn install(&mut self, slot: usize, mesh: MeshData) -> MeshHandle {
        assert!(!self.live.contains_key(&slot), "slot {slot} installed twice without release");
        self.installs.push((self.now, slot, mesh.clone()));
        let handle = self.arena.install(slot, mesh);
        self.live.insert(slot, handle);
        handle
    }

    fn release(&mut self, handle: MeshHandle) -> bool {
        assert_eq!(self.live.remove(&handle.slot()), Some(handle));
        self.arena.release(handle)
    }
}

impl RecordingTarget {
    fn first_install(&self, slot: usize) -> Option<Duration> {
        self.installs.iter().find(|(_, s, _)| *s == slot).map(|(t, _, _)| *t)
    }

    fn meshes_for(&self, slot: usize) -> impl Iterator<Item = &MeshData> + '_ {
        self.installs.iter().filter(move |(_, s, _)| *s == slot).map(|(_, _, m)| m)
    }
}

fn coarse(mut spec: ChartSpec) -> ChartSpec {
    spec.config.segments = Segments { radial: 8, height: 1 };
    spec
}

fn run(chart: &mut DonutChart, target: &mut RecordingTarget, clock: &mut ManualClock, until: Duration) {
    while clock.now() < until {
        let now = clock.advance(FRAME);
        target.now = now;
        chart.tick(now, target);
    }
}

fn scenario() -> ChartSpec {
    let color = Color::new(0x81, 0x62, 0xC4);
    coarse(ChartSpec::new(
        vec![
            SectionSpec::new(20.0, color, AnimationKind::Rotate),
            SectionSpec::new(20.0, color, AnimationKind::Rotate).immediate(),
            SectionSpec::new(60.0, color, AnimationKind::Rotate),
        ],
        ChartConfig::default(),
    ))
}

#[test]
fn staggered_scenario_starts_sections_on_schedule() {
    let mut chart = DonutChart::new(scenario()).unwrap();
    let delays: Vec<u128> = chart.layout().iter().map(|s| s.delay.as_millis()).collect();
    assert_eq!(delays, vec![0, 0, 2000]);

    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(6));

    let first = target.first_install(0).unwrap();
    let second = target.first_install(1).unwrap();
    let third = target.first_install(2).unwrap();
    assert!(first <= FRAME && second <= FRAME);
    assert!(third >= Duration::from_millis(2000));
    assert!(third <= Duration::from_millis(2000) + FRAME);
    assert!(chart.is_settled());
}

#[test]
fn rotate_sweep_grows_monotonically() {
    let mut chart = DonutChart::new(scenario()).unwrap();
    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(3));

    // Volume of a fixed-height ring slice is proportional to its sweep.
    let volumes: Vec<f32> = target.meshes_for(0).map(MeshData::signed_volume).collect();
    assert!(volumes.len() > 10);
    assert!(volumes.windows(2).all(|w| w[0] <= w[1] + 1e-4), "{volumes:?}");

    let full = 0.2 * std::f32::consts::PI * (4.0 - 1.0);
    let last = *volumes.last().unwrap();
    assert!((last - full).abs() / full < 0.03, "{last} vs {full}");
}

#[test]
fn grow_height_rises_monotonically() {
    let spec = coarse(ChartSpec::new(
        vec![SectionSpec::new(50.0, Color::new(1, 2, 3), AnimationKind::Grow)],
        ChartConfig::default(),
    ));
    let mut chart = DonutChart::new(spec).unwrap();
    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(3));

    let heights: Vec<f32> = target
        .meshes_for(0)
        .filter_map(MeshData::bounds)
        .map(|b| b.size().y)
        .collect();
    assert!(heights.windows(2).all(|w| w[0] <= w[1]), "{heights:?}");
    assert!((heights.last().unwrap() - 1.0).abs() < 0.01);
}

#[test]
fn unmount_mid_animation_stops_all_work() {
    let mut chart = DonutChart::new(scenario()).unwrap();
    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_millis(300));
    assert_eq!(chart.section_state(0), Some(SectionState::Animating));

    chart.unmount(&mut target);
    let installs = target.installs.len();
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(5));

    assert_eq!(target.installs.len(), installs);
    assert!(target.live.is_empty());
    assert_eq!(target.arena.live(), 0);
    assert!((0..3).all(|i| chart.section_state(i) == Some(SectionState::Unmounted)));
}

#[test]
fn settled_chart_does_no_further_rebuilds() {
    let mut chart = DonutChart::new(scenario()).unwrap();
    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(6));
    assert!(chart.is_settled());

    let installs = target.installs.len();
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(8));
    assert_eq!(target.installs.len(), installs);
    assert_eq!(target.arena.live(), 3);
    assert_eq!(target.arena.stats().overwrites, 0);
}

#[test]
fn empty_chart_renders_nothing() {
    let mut chart = DonutChart::new(ChartSpec::default()).unwrap();
    let mut clock = ManualClock::new();
    let mut target = RecordingTarget::default();
    chart.mount(clock.now());
    run(&mut chart, &mut target, &mut clock, Duration::from_secs(1));

    assert!(chart.labels().is_empty());
    assert!(chart.is_settled());
    assert!(target.installs.is_empty());
}

#[test]
fn labels_match_section_titles() {
    let chart = DonutChart::new(ChartSpec::demo()).unwrap();
    let titles: Vec<&str> = chart.labels().iter().map(|l| l.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Primer Foundation Scholarship", "Primer Tuition", "Family Responsibility"]
    );
    assert!(chart.labels().iter().all(|l| (l.anchor.length() - 2.0).abs() < 1e-4));
}
