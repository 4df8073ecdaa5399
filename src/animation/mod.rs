//! Zoom animation: a timed state machine and the view snapshot it animates.

pub mod controller;
pub mod zoom;

pub use controller::{AnimationController, AnimationKind, AnimationState, Timing};
pub use zoom::{Indicator, ZoomTransition};
