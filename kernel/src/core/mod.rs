//! Time primitives for the stepping driver.

pub mod clock;

pub use clock::StepClock;
