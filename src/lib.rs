//! # simlink
//!
//! Remote-control plumbing for GNSS signal simulators and a decoder for the
//! Galileo High Accuracy Service (HAS) phase-bias block.
//!
//! ## Features
//!
//! - **Parameter store**: typed field keys mapped to bitfields that keep their
//!   raw bits and scaled decimal value in one place
//! - **Field schemas**: ordered bitfield declarations that parse payloads into a
//!   store and encode a store back into a payload
//! - **HAS phase biases**: mask-driven reconstruction of per-system,
//!   per-satellite, per-signal phase-bias records
//! - **Protocol client**: blocking TCP/UDP connection with exact-length reads
//!   and little-endian fixed-layout encoders
//!
//! ## Quick Start
//!
//! ```rust
//! use simlink::has::phase;
//! use simlink::store::{Field, FieldKey, ParameterStore};
//!
//! let mut store = ParameterStore::new();
//! store.insert(FieldKey::PhaseValidityIntervalIndex, Field::unsigned(3, 4).unwrap());
//! store.insert(FieldKey::NSys, Field::unsigned(1, 4).unwrap());
//! store.insert(FieldKey::GnssId(1), Field::unsigned(2, 4).unwrap());
//! store.insert(FieldKey::SatelliteMask(1), Field::from_binary("01", false, 1.0).unwrap());
//! store.insert(FieldKey::SignalMask(1), Field::from_binary("1", false, 1.0).unwrap());
//! store.insert(FieldKey::phase_bias(1, 1, 1), Field::from_decimal(0.25, 11, true, 0.01).unwrap());
//! store.insert(FieldKey::phase_discontinuity(1, 1, 1), Field::unsigned(1, 2).unwrap());
//!
//! let biases = phase::decode(&store).unwrap();
//! assert_eq!(biases.systems[0].satellites[0].sat, 2);
//! assert_eq!(biases.systems[0].satellites[0].signals[0].signal, "E1-B I/NAV OS");
//! ```
//!
//! ## Architecture
//!
//! - [`store`] - Field keys, fields and the parameter store
//! - [`bitmask`] - Position-indexed presence masks
//! - [`bits`] - MSB-first bit reader and writer
//! - [`schema`] - Bitfield declarations, payload parser and generator
//! - [`has`] - HAS tables and the phase-bias block
//! - [`packet`] - Little-endian protocol fields
//! - [`client`] - Simulator socket client

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]

pub mod bitmask;
pub mod bits;
pub mod client;
pub mod has;
pub mod packet;
pub mod schema;
pub mod store;

// Re-export main public types for convenience
pub use bitmask::Bitmask;
pub use client::{Client, ClientError};
pub use has::phase::PhaseBiases;
pub use schema::{FieldSchema, FieldSpec, Unit};
pub use store::{CodecError, Field, FieldKey, ParameterStore};
