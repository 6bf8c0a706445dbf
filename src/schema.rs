//! Ordered bitfield declarations and the parser/generator driven by them.

use crate::bits::{BitReader, BitWriter};
use crate::store::{CodecError, Field, FieldKey, ParameterStore};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Unitless,
    Meter,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Unitless => "",
            Unit::Meter => "m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub width: u8,
    pub signed: bool,
    pub scale: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    keys: BTreeSet<FieldKey>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an unsigned, unscaled field.
    pub fn push(&mut self, key: FieldKey, width: u8) -> Result<&mut Self, CodecError> {
        self.push_scaled(key, width, false, 1.0, Unit::Unitless)
    }

    pub fn push_scaled(
        &mut self,
        key: FieldKey,
        width: u8,
        signed: bool,
        scale: f64,
        unit: Unit,
    ) -> Result<&mut Self, CodecError> {
        if width == 0 || width > Field::MAX_WIDTH {
            return Err(CodecError::InvalidWidth { key, width });
        }
        if !self.keys.insert(key.clone()) {
            return Err(CodecError::DuplicateField(key));
        }

        self.fields.push(FieldSpec {
            key,
            width,
            signed,
            scale,
            unit,
        });
        Ok(self)
    }

    /// Appends every declaration of `other`, in order.
    pub fn extend(&mut self, other: FieldSchema) -> Result<&mut Self, CodecError> {
        for spec in other.fields {
            self.push_scaled(spec.key, spec.width, spec.signed, spec.scale, spec.unit)?;
        }
        Ok(self)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.fields.iter().map(|spec| &spec.key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn bit_len(&self) -> usize {
        self.fields.iter().map(|spec| usize::from(spec.width)).sum()
    }

    /// Reads every declared field from `payload`, MSB first, in declaration
    /// order. Trailing bits past the last field are ignored.
    pub fn parse(&self, payload: &[u8]) -> Result<ParameterStore, CodecError> {
        let mut reader = BitReader::new(payload);
        let mut store = ParameterStore::new();

        for spec in &self.fields {
            let raw = reader.read(spec.width).ok_or_else(|| CodecError::Truncated {
                key: spec.key.clone(),
                needed: spec.width,
                available: reader.remaining(),
            })?;
            let field = Field::from_raw(raw, spec.width, spec.signed, spec.scale)?;
            store.insert(spec.key.clone(), field);
        }

        Ok(store)
    }

    /// Writes the declared fields of `store` back into a payload.
    pub fn encode(&self, store: &ParameterStore) -> Result<Vec<u8>, CodecError> {
        let mut writer = BitWriter::new();

        for spec in &self.fields {
            let field = store.require(&spec.key)?;
            if field.width() != spec.width {
                return Err(CodecError::InvalidWidth {
                    key: spec.key.clone(),
                    width: field.width(),
                });
            }
            writer.write(field.raw(), spec.width);
        }

        Ok(writer.into_bytes())
    }
}
