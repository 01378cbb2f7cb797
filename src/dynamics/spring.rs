use serde::{Deserialize, Serialize};

/// Distance to the target under which a spring counts as settled.
pub const CONVERGENCE_EPSILON: f32 = 0.001;

/// Upper bound on the per-step scale in delta-time mode. Long frame hitches would
/// otherwise blow up the explicit integration.
const MAX_STEP_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub mass: f32,
    #[serde(alias = "tension")]
    pub stiffness: f32,
    #[serde(alias = "friction")]
    pub damping: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        let (stiffness, damping) = SpringPreset::Gentle.params();
        Self {
            mass: 1.0,
            stiffness,
            damping,
        }
    }
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        Self {
            mass: 1.0,
            stiffness,
            damping,
        }
    }

    pub fn from_preset(preset: SpringPreset) -> Self {
        let (stiffness, damping) = preset.params();
        Self::new(stiffness, damping)
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn is_underdamped_or_critical(&self) -> bool {
        self.damping <= 2.0 * (self.stiffness * self.mass).sqrt()
    }

    pub fn is_valid(&self) -> bool {
        self.mass > 0.0
            && self.stiffness > 0.0
            && self.damping >= 0.0
            && self.mass.is_finite()
            && self.stiffness.is_finite()
            && self.damping.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringPreset {
    Gentle,
    Snappy,
}

impl SpringPreset {
    /// Returns `(stiffness, damping)`.
    pub fn params(self) -> (f32, f32) {
        match self {
            SpringPreset::Gentle => (0.1, 0.8),
            SpringPreset::Snappy => (0.2, 0.5),
        }
    }
}

/// How a spring step relates to wall-clock time.
///
/// `PerFrame` advances one full step per call, so animation speed follows the
/// display's frame rate. `DeltaTime` scales the step by the elapsed time relative
/// to a reference rate and matches `PerFrame` when frames arrive at exactly that rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IntegrationMode {
    #[default]
    PerFrame,
    DeltaTime { reference_hz: f32 },
}

impl IntegrationMode {
    pub fn step_scale(self, dt: f32) -> f32 {
        match self {
            IntegrationMode::PerFrame => 1.0,
            IntegrationMode::DeltaTime { reference_hz } => {
                if !dt.is_finite() || !reference_hz.is_finite() {
                    return 0.0;
                }
                (dt * reference_hz).clamp(0.0, MAX_STEP_SCALE)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationState {
    pub position: f32,
    pub velocity: f32,
    pub target: f32,
}

impl AnimationState {
    pub fn at_rest(target: f32) -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            target,
        }
    }

    pub fn is_converged(&self) -> bool {
        (self.position - self.target).abs() <= CONVERGENCE_EPSILON
    }
}

/// One frame of a damped harmonic oscillator with unit mass and unit step.
pub fn step(state: AnimationState, target: f32, stiffness: f32, damping: f32) -> AnimationState {
    step_scaled(state, target, &SpringConfig::new(stiffness, damping), 1.0)
}

/// Semi-implicit Euler step of size `h` frames.
pub fn step_scaled(state: AnimationState, target: f32, config: &SpringConfig, h: f32) -> AnimationState {
    let force = -config.stiffness * (state.position - target);
    let damping_force = -config.damping * state.velocity;
    let acceleration = (force + damping_force) / config.mass;

    let velocity = state.velocity + acceleration * h;
    let position = state.position + velocity * h;

    AnimationState {
        position,
        velocity,
        target,
    }
}

#[derive(Debug, Clone)]
pub struct Spring {
    state: AnimationState,
    config: SpringConfig,
    mode: IntegrationMode,
    steps: u32,
    settled: bool,
}

impl Spring {
    pub fn new(target: f32, config: SpringConfig) -> Self {
        Self {
            state: AnimationState::at_rest(target),
            config,
            mode: IntegrationMode::PerFrame,
            steps: 0,
            settled: false,
        }
    }

    pub fn with_mode(mut self, mode: IntegrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Advances one tick and returns the new position, or `None` once settled.
    ///
    /// The first call always steps, even when the target is already reached, so a
    /// consumer sees at least one value.
    pub fn advance(&mut self, dt: f32) -> Option<f32> {
        if self.settled {
            return None;
        }

        let h = self.mode.step_scale(dt);
        self.state = step_scaled(self.state, self.state.target, &self.config, h);
        self.steps += 1;
        self.settled = self.state.is_converged();

        Some(self.state.position)
    }

    /// Advances one tick and hands the new position to `consumer`.
    ///
    /// Returns `true` while the spring still wants frames.
    pub fn drive<F: FnMut(f32)>(&mut self, dt: f32, consumer: Option<F>) -> bool {
        if let Some(position) = self.advance(dt) {
            match consumer {
                Some(mut consumer) => consumer(position),
                None => log::warn!("spring stepped without a consumer, value {position} dropped"),
            }
        }
        !self.settled
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    pub fn position(&self) -> f32 {
        self.state.position
    }

    pub fn target(&self) -> f32 {
        self.state.target
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}
