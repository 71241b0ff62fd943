//! Decoding of the status frames which the scooter controller sends as notifications on the FFF2
//! characteristic.

pub mod frame;
pub mod mode;

pub use frame::{validate, FrameError, StatusFrame};
pub use mode::{decode, Mode};
