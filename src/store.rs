//! Parameter store shared by the wire parser and the message decoders.
//!
//! Every decoded bitfield is kept once, as raw bits plus the signedness and
//! scale it was declared with. The decimal value is always derived from those
//! bits, so the binary and decimal views of a field cannot drift apart.

use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-slot field families of the phase-bias block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKind {
    PhaseBias,
    PhaseDiscontinuity,
}

impl SlotKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SlotKind::PhaseBias => "pb",
            SlotKind::PhaseDiscontinuity => "pbi",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "pb" => Some(SlotKind::PhaseBias),
            "pbi" => Some(SlotKind::PhaseDiscontinuity),
            _ => None,
        }
    }
}

/// Address of one satellite/signal slot. `satellite` and `signal` are
/// 1-based active counters, not mask positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub kind: SlotKind,
    pub system: u8,
    pub satellite: u8,
    pub signal: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    NSys,
    PhaseValidityIntervalIndex,
    GnssId(u8),
    SatelliteMask(u8),
    SignalMask(u8),
    Slot(SlotKey),
    /// Any field outside the phase-bias block, kept verbatim.
    Other(String),
}

impl FieldKey {
    pub fn phase_bias(system: u8, satellite: u8, signal: u8) -> Self {
        FieldKey::Slot(SlotKey {
            kind: SlotKind::PhaseBias,
            system,
            satellite,
            signal,
        })
    }

    pub fn phase_discontinuity(system: u8, satellite: u8, signal: u8) -> Self {
        FieldKey::Slot(SlotKey {
            kind: SlotKind::PhaseDiscontinuity,
            system,
            satellite,
            signal,
        })
    }

    fn parse_slot(name: &str) -> Option<SlotKey> {
        let mut parts = name.split(' ');
        let kind = SlotKind::from_prefix(parts.next()?)?;
        let system = parts.next()?.strip_prefix("sys")?.parse().ok()?;
        let satellite = parts.next()?.strip_prefix("sat")?.parse().ok()?;
        let signal = parts.next()?.strip_prefix("sig")?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(SlotKey {
            kind,
            system,
            satellite,
            signal,
        })
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::NSys => f.write_str("n_sys"),
            FieldKey::PhaseValidityIntervalIndex => f.write_str("phase_validity_interval_index"),
            FieldKey::GnssId(system) => write!(f, "gnss_id {}", system),
            FieldKey::SatelliteMask(system) => write!(f, "satellite_mask {}", system),
            FieldKey::SignalMask(system) => write!(f, "signal_mask {}", system),
            FieldKey::Slot(slot) => write!(
                f,
                "{} sys{} sat{} sig{}",
                slot.kind.prefix(),
                slot.system,
                slot.satellite,
                slot.signal
            ),
            FieldKey::Other(name) => f.write_str(name),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        let per_system = |prefix: &str| -> Option<u8> {
            name.strip_prefix(prefix)?.parse().ok()
        };

        match name {
            "n_sys" => FieldKey::NSys,
            "phase_validity_interval_index" => FieldKey::PhaseValidityIntervalIndex,
            _ => {
                if let Some(system) = per_system("gnss_id ") {
                    FieldKey::GnssId(system)
                } else if let Some(system) = per_system("satellite_mask ") {
                    FieldKey::SatelliteMask(system)
                } else if let Some(system) = per_system("signal_mask ") {
                    FieldKey::SignalMask(system)
                } else if let Some(slot) = FieldKey::parse_slot(name) {
                    FieldKey::Slot(slot)
                } else {
                    FieldKey::Other(name.to_string())
                }
            }
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldKey::from(name.as_str()))
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported gnss id {0}")]
    UnsupportedGnssId(u64),
    #[error("missing field `{0}`")]
    MissingField(FieldKey),
    #[error("field `{key}` does not hold a valid integer ({value})")]
    InvalidValue { key: FieldKey, value: f64 },
    #[error("mask `{key}` has {width} positions, table only has {capacity}")]
    MaskTooWide {
        key: FieldKey,
        width: usize,
        capacity: usize,
    },
    #[error("invalid binary representation `{0}`")]
    InvalidBinary(String),
    #[error("field `{key}` has unsupported width {width}")]
    InvalidWidth { key: FieldKey, width: u8 },
    #[error("field `{0}` declared twice")]
    DuplicateField(FieldKey),
    #[error("payload truncated at `{key}`: needed {needed} bits, {available} left")]
    Truncated {
        key: FieldKey,
        needed: u8,
        available: usize,
    },
    #[error("value {value} does not fit in {width} bits")]
    ValueOutOfRange { value: f64, width: u8 },
    #[error("binary `{binary}` does not decode to {decimal}")]
    InconsistentField { binary: String, decimal: f64 },
    #[error("{n_sys} systems declared, got {sat_counts} satellite counts and {sig_counts} signal counts")]
    CountMismatch {
        n_sys: usize,
        sat_counts: usize,
        sig_counts: usize,
    },
}

/// One decoded bitfield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldRepr", into = "FieldRepr")]
pub struct Field {
    raw: u64,
    width: u8,
    signed: bool,
    scale: f64,
}

impl Field {
    pub const MAX_WIDTH: u8 = 64;

    /// Unsigned, unscaled field.
    pub fn unsigned(raw: u64, width: u8) -> Result<Self, CodecError> {
        Self::from_raw(raw, width, false, 1.0)
    }

    pub fn from_raw(raw: u64, width: u8, signed: bool, scale: f64) -> Result<Self, CodecError> {
        if width == 0 || width > Self::MAX_WIDTH {
            return Err(CodecError::InvalidBinary(format!("{} bits", width)));
        }
        if raw & !low_mask(width) != 0 {
            return Err(CodecError::ValueOutOfRange {
                value: raw as f64,
                width,
            });
        }
        Ok(Self {
            raw,
            width,
            signed,
            scale,
        })
    }

    /// Quantizes a physical value to the nearest representable step.
    pub fn from_decimal(value: f64, width: u8, signed: bool, scale: f64) -> Result<Self, CodecError> {
        if width == 0 || width > Self::MAX_WIDTH || !value.is_finite() || scale == 0.0 {
            return Err(CodecError::ValueOutOfRange { value, width });
        }

        let steps = (value / scale).round();
        let (min, max) = if signed {
            let half = 2f64.powi(i32::from(width) - 1);
            (-half, half - 1.0)
        } else {
            (0.0, 2f64.powi(i32::from(width)) - 1.0)
        };
        if steps < min || steps > max {
            return Err(CodecError::ValueOutOfRange { value, width });
        }

        let raw = if signed {
            (steps as i64 as u64) & low_mask(width)
        } else {
            steps as u64
        };
        Self::from_raw(raw, width, signed, scale)
    }

    /// Parses a `'0'`/`'1'` string, most significant bit first.
    pub fn from_binary(binary: &str, signed: bool, scale: f64) -> Result<Self, CodecError> {
        let width = binary.len();
        if width == 0 || width > usize::from(Self::MAX_WIDTH) {
            return Err(CodecError::InvalidBinary(binary.to_string()));
        }

        let mut raw = 0u64;
        for c in binary.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                _ => return Err(CodecError::InvalidBinary(binary.to_string())),
            };
            raw = (raw << 1) | bit;
        }
        Self::from_raw(raw, width as u8, signed, scale)
    }

    pub fn raw(&self) -> u64 {
        self.raw
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Bits, most significant first.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.width).rev().map(move |shift| (self.raw >> shift) & 1 == 1)
    }

    pub fn binary(&self) -> String {
        self.bits().map(|bit| if bit { '1' } else { '0' }).collect()
    }

    pub fn decimal(&self) -> f64 {
        let value = if self.signed && (self.raw >> (self.width - 1)) & 1 == 1 {
            // sign-extend two's complement
            (self.raw | !low_mask(self.width)) as i64 as f64
        } else {
            self.raw as f64
        };
        value * self.scale
    }

    /// Decimal value as a non-negative integer, if it is one.
    pub fn as_index(&self) -> Option<u64> {
        let value = self.decimal();
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Some(value as u64)
        } else {
            None
        }
    }
}

fn low_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn unit_scale() -> f64 {
    1.0
}

/// Serialized form: `{"binary": "0101", "signed": false, "scale": 1.0, "decimal": 5.0}`.
/// `decimal` is optional on input and must agree with the bits when present.
#[derive(Serialize, Deserialize)]
struct FieldRepr {
    binary: String,
    #[serde(default)]
    signed: bool,
    #[serde(default = "unit_scale")]
    scale: f64,
    #[serde(default)]
    decimal: Option<f64>,
}

impl TryFrom<FieldRepr> for Field {
    type Error = CodecError;

    fn try_from(repr: FieldRepr) -> Result<Self, Self::Error> {
        let field = Field::from_binary(&repr.binary, repr.signed, repr.scale)?;
        if let Some(decimal) = repr.decimal {
            if (field.decimal() - decimal).abs() > repr.scale.abs() * 1e-6 {
                return Err(CodecError::InconsistentField {
                    binary: repr.binary,
                    decimal,
                });
            }
        }
        Ok(field)
    }
}

impl From<Field> for FieldRepr {
    fn from(field: Field) -> Self {
        FieldRepr {
            binary: field.binary(),
            signed: field.signed,
            scale: field.scale,
            decimal: Some(field.decimal()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterStore {
    fields: BTreeMap<FieldKey, Field>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, field: Field) -> Option<Field> {
        self.fields.insert(key, field)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Like [`get`](Self::get) but a missing key is a schema error.
    pub fn require(&self, key: &FieldKey) -> Result<&Field, CodecError> {
        self.fields
            .get(key)
            .ok_or_else(|| CodecError::MissingField(key.clone()))
    }

    /// Reads a field that must hold a non-negative integer.
    pub fn require_index(&self, key: &FieldKey) -> Result<u64, CodecError> {
        let field = self.require(key)?;
        field.as_index().ok_or_else(|| CodecError::InvalidValue {
            key: key.clone(),
            value: field.decimal(),
        })
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &Field)> {
        self.fields.iter()
    }
}
