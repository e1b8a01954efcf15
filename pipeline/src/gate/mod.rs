pub mod motion;

pub use motion::{MotionGate, MotionReading, REFERENCE_PIXELS};
