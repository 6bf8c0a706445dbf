//! Galileo High Accuracy Service message blocks.

pub mod phase;
pub mod tables;

pub use phase::{PhaseBiases, SatelliteBiases, SignalBias, SystemBiases};
pub use tables::Constellation;
