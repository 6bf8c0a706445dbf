//! HAS phase-bias block.
//!
//! The block carries, for every system declared in the mask block, one
//! phase bias and one discontinuity indicator per active satellite and active
//! signal. Field keys address satellites and signals by their rank among the
//! set bits of the masks, while satellite IDs and signal labels come from the
//! raw bit positions.

use crate::bitmask::Bitmask;
use crate::has::tables::{Constellation, SIGNAL_TABLE_LEN};
use crate::schema::{FieldSchema, Unit};
use crate::store::{CodecError, FieldKey, ParameterStore};
use serde::Serialize;
use tracing::debug;

pub const VALIDITY_INDEX_WIDTH: u8 = 4;
pub const PHASE_BIAS_WIDTH: u8 = 11;
pub const PHASE_BIAS_RESOLUTION_M: f64 = 0.01;
pub const DISCONTINUITY_WIDTH: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalBias {
    pub signal: &'static str,
    /// Meters.
    pub phase_bias: f64,
    pub discontinuity_indicator: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteBiases {
    pub sat: u8,
    pub signals: Vec<SignalBias>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemBiases {
    pub gnss: Constellation,
    pub satellites: Vec<SatelliteBiases>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseBiases {
    pub validity_interval_index: u8,
    pub systems: Vec<SystemBiases>,
}

/// Decodes the whole phase-bias block. Any missing or unsupported field
/// aborts the decode; no partial record is produced.
pub fn decode(store: &ParameterStore) -> Result<PhaseBiases, CodecError> {
    let validity_interval_index = require_u8(store, &FieldKey::PhaseValidityIntervalIndex)?;
    let n_sys = require_u8(store, &FieldKey::NSys)?;

    let systems = (1..=n_sys)
        .map(|system| decode_system(store, system))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PhaseBiases {
        validity_interval_index,
        systems,
    })
}

/// Decodes the block of the 1-based system index `system`.
pub fn decode_system(store: &ParameterStore, system: u8) -> Result<SystemBiases, CodecError> {
    let gnss_id = store.require_index(&FieldKey::GnssId(system))?;
    let gnss = Constellation::from_gnss_id(gnss_id).ok_or(CodecError::UnsupportedGnssId(gnss_id))?;

    let satellite_mask = Bitmask::from_field(store.require(&FieldKey::SatelliteMask(system))?);
    let signal_key = FieldKey::SignalMask(system);
    let signal_mask = Bitmask::from_field(store.require(&signal_key)?);
    if signal_mask.len() > SIGNAL_TABLE_LEN {
        return Err(CodecError::MaskTooWide {
            key: signal_key,
            width: signal_mask.len(),
            capacity: SIGNAL_TABLE_LEN,
        });
    }

    debug!(
        system,
        gnss = gnss.name(),
        satellites = satellite_mask.count_ones(),
        signals = signal_mask.count_ones(),
        "decoding phase biases"
    );

    let mut satellites = Vec::with_capacity(satellite_mask.count_ones());
    for (sat_rank, sat_position) in satellite_mask.set_positions().enumerate() {
        let sat_counter = (sat_rank + 1) as u8;

        let mut signals = Vec::with_capacity(signal_mask.count_ones());
        for (sig_rank, sig_position) in signal_mask.set_positions().enumerate() {
            let sig_counter = (sig_rank + 1) as u8;
            let signal = gnss
                .signal_label(sig_position)
                .ok_or_else(|| CodecError::MaskTooWide {
                    key: FieldKey::SignalMask(system),
                    width: signal_mask.len(),
                    capacity: SIGNAL_TABLE_LEN,
                })?;

            let phase_bias = store
                .require(&FieldKey::phase_bias(system, sat_counter, sig_counter))?
                .decimal();
            let discontinuity_indicator = require_u8(
                store,
                &FieldKey::phase_discontinuity(system, sat_counter, sig_counter),
            )?;

            signals.push(SignalBias {
                signal,
                phase_bias,
                discontinuity_indicator,
            });
        }

        satellites.push(SatelliteBiases {
            sat: (sat_position + 1) as u8,
            signals,
        });
    }

    Ok(SystemBiases { gnss, satellites })
}

/// Declares the block's fields for `n_sys` systems with dense satellite and
/// signal indices. Only slots whose mask bits are set travel on the wire, so
/// callers pass the mask population counts (see [`schema_for_masks`]).
pub fn declare_schema(n_sys: u8, sat_counts: &[u8], sig_counts: &[u8]) -> Result<FieldSchema, CodecError> {
    let systems = usize::from(n_sys);
    if sat_counts.len() < systems || sig_counts.len() < systems {
        return Err(CodecError::CountMismatch {
            n_sys: systems,
            sat_counts: sat_counts.len(),
            sig_counts: sig_counts.len(),
        });
    }

    let mut schema = FieldSchema::new();
    schema.push(FieldKey::PhaseValidityIntervalIndex, VALIDITY_INDEX_WIDTH)?;

    for system in 1..=n_sys {
        let index = usize::from(system - 1);
        for sat in 1..=sat_counts[index] {
            for sig in 1..=sig_counts[index] {
                schema.push_scaled(
                    FieldKey::phase_bias(system, sat, sig),
                    PHASE_BIAS_WIDTH,
                    true,
                    PHASE_BIAS_RESOLUTION_M,
                    Unit::Meter,
                )?;
                schema.push(FieldKey::phase_discontinuity(system, sat, sig), DISCONTINUITY_WIDTH)?;
            }
        }
    }

    Ok(schema)
}

/// Schema for the slots actually transmitted under the given
/// `(satellite_mask, signal_mask)` pairs, one pair per system.
pub fn schema_for_masks(masks: &[(Bitmask, Bitmask)]) -> Result<FieldSchema, CodecError> {
    let n_sys = u8::try_from(masks.len()).map_err(|_| CodecError::CountMismatch {
        n_sys: masks.len(),
        sat_counts: masks.len(),
        sig_counts: masks.len(),
    })?;
    let sat_counts: Vec<u8> = masks.iter().map(|(sats, _)| sats.count_ones() as u8).collect();
    let sig_counts: Vec<u8> = masks.iter().map(|(_, sigs)| sigs.count_ones() as u8).collect();

    declare_schema(n_sys, &sat_counts, &sig_counts)
}

fn require_u8(store: &ParameterStore, key: &FieldKey) -> Result<u8, CodecError> {
    let value = store.require_index(key)?;
    u8::try_from(value).map_err(|_| CodecError::InvalidValue {
        key: key.clone(),
        value: value as f64,
    })
}
