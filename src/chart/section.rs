use super::layout::SectionLayout;
use super::model::{AnimationKind, ChartConfig, SectionSpec};
use super::scheduler::{FrameScheduler, TaskHandle, Tick};
use crate::dynamics::{IntegrationMode, Spring, SpringConfig};
use crate::geometry::{MeshHandle, MeshTarget, RingBuilder};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Waiting for the entrance delay. No geometry exists.
    Pending,
    Animating,
    /// Spring converged; the last mesh stays installed.
    Settled,
    /// Torn down. Ticks are ignored from here on.
    Unmounted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionStats {
    pub rebuilds: u32,
    /// Frames whose geometry was degenerate and showed nothing.
    pub empty_frames: u32,
    pub last_value: Option<f32>,
    pub started_at: Option<Duration>,
    pub settled_at: Option<Duration>,
}

#[derive(Debug, Clone)]
struct SliceGeometry {
    index: usize,
    kind: AnimationKind,
    theta_start: f32,
    theta_length: f32,
    builder: RingBuilder,
    config: ChartConfig,
}

impl SliceGeometry {
    /// Releases the current mesh and installs the frame for `value`, or leaves the
    /// slot empty when the slice is degenerate.
    fn apply(&self, value: f32, mesh: &mut Option<MeshHandle>, stats: &mut SectionStats, target: &mut dyn MeshTarget) {
        let params = self.kind.ring_params(self.theta_start, self.theta_length, &self.config, value);
        let built = self.builder.build(params);

        if let Some(handle) = mesh.take() {
            target.release(handle);
        }

        match built {
            Ok(data) => {
                *mesh = Some(target.install(self.index, data));
                stats.rebuilds += 1;
            }
            Err(err) => {
                stats.empty_frames += 1;
                log::debug!("section {} frame at {value:.4} has no geometry: {err}", self.index);
            }
        }
        stats.last_value = Some(value);
    }
}

#[derive(Debug)]
pub struct SectionController {
    geometry: SliceGeometry,
    target_value: f32,
    spring_config: SpringConfig,
    mode: IntegrationMode,
    delay: Duration,
    state: SectionState,
    spring: Option<Spring>,
    timer: Option<TaskHandle>,
    frames: Option<TaskHandle>,
    mesh: Option<MeshHandle>,
    stats: SectionStats,
}

impl SectionController {
    pub fn new(section: &SectionSpec, layout: &SectionLayout, config: &ChartConfig) -> Self {
        let geometry = SliceGeometry {
            index: layout.index,
            kind: section.animation,
            theta_start: layout.theta_start,
            theta_length: layout.theta_length,
            builder: RingBuilder::new(config.segments),
            config: config.clone(),
        };

        Self {
            geometry,
            target_value: section.animation.target(layout.theta_length, config),
            spring_config: section.spring.unwrap_or(config.spring),
            mode: config.integration,
            delay: layout.delay,
            state: SectionState::Pending,
            spring: None,
            timer: None,
            frames: None,
            mesh: None,
            stats: SectionStats::default(),
        }
    }

    pub fn with_spring(mut self, spring: SpringConfig) -> Self {
        self.spring_config = spring;
        self
    }

    pub fn index(&self) -> usize {
        self.geometry.index
    }

    pub fn kind(&self) -> AnimationKind {
        self.geometry.kind
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn target_value(&self) -> f32 {
        self.target_value
    }

    /// Latest value handed to the geometry builder.
    pub fn animated_value(&self) -> Option<f32> {
        self.stats.last_value
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn stats(&self) -> SectionStats {
        self.stats
    }

    /// Schedules the entrance. Only meaningful while pending.
    pub fn mount(&mut self, scheduler: &mut FrameScheduler) {
        if self.state != SectionState::Pending || self.timer.is_some() {
            return;
        }
        self.timer = Some(scheduler.set_timeout(self.delay));
    }

    pub fn on_tick(&mut self, tick: &Tick, scheduler: &mut FrameScheduler, target: &mut dyn MeshTarget) {
        match self.state {
            SectionState::Pending => {
                let Some(timer) = self.timer else {
                    return;
                };
                if !tick.fired(timer) {
                    return;
                }
                self.timer = None;
                self.start(tick, scheduler, target);
            }
            SectionState::Animating => {
                if self.frames.is_some_and(|frames| tick.fired(frames)) {
                    self.step(tick, scheduler, target);
                }
            }
            SectionState::Settled | SectionState::Unmounted => {}
        }
    }

    /// Cancels pending work and releases the mesh. Later ticks are no-ops.
    pub fn unmount(&mut self, scheduler: &mut FrameScheduler, target: &mut dyn MeshTarget) {
        if self.state == SectionState::Unmounted {
            return;
        }
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        if let Some(frames) = self.frames.take() {
            scheduler.cancel(frames);
        }
        if let Some(handle) = self.mesh.take() {
            target.release(handle);
        }
        self.spring = None;
        self.state = SectionState::Unmounted;
        log::debug!("section {} unmounted", self.geometry.index);
    }

    fn start(&mut self, tick: &Tick, scheduler: &mut FrameScheduler, target: &mut dyn MeshTarget) {
        self.state = SectionState::Animating;
        self.stats.started_at = Some(tick.now);
        self.spring = Some(Spring::new(self.target_value, self.spring_config).with_mode(self.mode));
        log::debug!(
            "section {} animating toward {:.4} at {:?}",
            self.geometry.index,
            self.target_value,
            tick.now
        );

        self.step(tick, scheduler, target);
        if self.state == SectionState::Animating {
            self.frames = Some(scheduler.request_frames());
        }
    }

    fn step(&mut self, tick: &Tick, scheduler: &mut FrameScheduler, target: &mut dyn MeshTarget) {
        let Some(spring) = self.spring.as_mut() else {
            return;
        };

        let geometry = &self.geometry;
        let mesh = &mut self.mesh;
        let stats = &mut self.stats;
        let wants_more = spring.drive(
            tick.dt.as_secs_f32(),
            Some(|value: f32| geometry.apply(value, mesh, stats, target)),
        );

        if !wants_more {
            self.settle(tick, scheduler);
        }
    }

    fn settle(&mut self, tick: &Tick, scheduler: &mut FrameScheduler) {
        if let Some(frames) = self.frames.take() {
            scheduler.cancel(frames);
        }
        self.spring = None;
        self.state = SectionState::Settled;
        self.stats.settled_at = Some(tick.now);
        log::debug!("section {} settled at {:?}", self.geometry.index, tick.now);
    }
}
