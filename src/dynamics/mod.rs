//! Spring integration driving the section entrance animations.

pub mod spring;

pub use spring::{
    step, step_scaled, AnimationState, IntegrationMode, Spring, SpringConfig, SpringPreset,
    CONVERGENCE_EPSILON,
};
