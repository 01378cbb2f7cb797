//! Donut chart composition
//!
//! Turns a list of percentage sections into staggered, spring-driven ring slices
//! and the label cards that sit on their midpoints.

pub mod donut;
pub mod error;
pub mod layout;
pub mod model;
pub mod scheduler;
pub mod section;

pub use donut::DonutChart;
pub use error::{ChartError, ChartResult};
pub use layout::{label_anchor, layout_sections, percent_to_radians, section_labels, SectionLabel, SectionLayout};
pub use model::{AnimationKind, ChartConfig, ChartSpec, Color, SectionSpec};
pub use scheduler::{Clock, FrameScheduler, ManualClock, SystemClock, Tick, TaskHandle};
pub use section::{SectionController, SectionState, SectionStats};
