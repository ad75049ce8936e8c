//! Input-driven model controls.

pub mod orientation;

pub use orientation::{InputPolicy, Orientation, OrientationController, normalize_pointer, step};
