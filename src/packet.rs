//! Fixed-layout little-endian fields of the simulator command protocol.

use arrayvec::ArrayVec;
use static_assertions::const_assert_eq;
use thiserror::Error;

pub const TAG_LEN: usize = 1;
pub const TRIPLET_LEN: usize = 24;
pub const MAX_PACKET_SIZE: usize = 256;

const_assert_eq!(TRIPLET_LEN, 3 * core::mem::size_of::<f64>());

pub type PacketBuffer = ArrayVec<u8, MAX_PACKET_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("packet exceeds {} bytes", MAX_PACKET_SIZE)]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageTag(pub u8);

impl MessageTag {
    pub fn to_le_bytes(self) -> [u8; TAG_LEN] {
        self.0.to_le_bytes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DynamicType(pub u8);

impl DynamicType {
    pub fn to_le_bytes(self) -> [u8; TAG_LEN] {
        self.0.to_le_bytes()
    }
}

/// Earth-centered Earth-fixed position, meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_le_bytes(&self) -> [u8; TRIPLET_LEN] {
        triplet_to_le_bytes([self.x, self.y, self.z])
    }

    pub fn from_le_bytes(bytes: &[u8; TRIPLET_LEN]) -> Self {
        let [x, y, z] = triplet_from_le_bytes(bytes);
        Self { x, y, z }
    }
}

/// Body attitude, radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Attitude {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    pub fn to_le_bytes(&self) -> [u8; TRIPLET_LEN] {
        triplet_to_le_bytes([self.yaw, self.pitch, self.roll])
    }

    pub fn from_le_bytes(bytes: &[u8; TRIPLET_LEN]) -> Self {
        let [yaw, pitch, roll] = triplet_from_le_bytes(bytes);
        Self { yaw, pitch, roll }
    }
}

fn triplet_to_le_bytes(values: [f64; 3]) -> [u8; TRIPLET_LEN] {
    let mut bytes = [0u8; TRIPLET_LEN];
    for (chunk, value) in bytes.chunks_exact_mut(8).zip(values) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn triplet_from_le_bytes(bytes: &[u8; TRIPLET_LEN]) -> [f64; 3] {
    let mut values = [0f64; 3];
    for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        *value = f64::from_le_bytes(raw);
    }
    values
}

/// Concatenates protocol fields into one outbound packet.
#[derive(Debug, Default)]
pub struct PacketBuilder {
    buffer: PacketBuffer,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_tag(&mut self, tag: MessageTag) -> Result<&mut Self, PacketError> {
        self.bytes(&tag.to_le_bytes())
    }

    pub fn dynamic_type(&mut self, dynamic_type: DynamicType) -> Result<&mut Self, PacketError> {
        self.bytes(&dynamic_type.to_le_bytes())
    }

    pub fn f64(&mut self, value: f64) -> Result<&mut Self, PacketError> {
        self.bytes(&value.to_le_bytes())
    }

    pub fn ecef(&mut self, position: &Ecef) -> Result<&mut Self, PacketError> {
        self.bytes(&position.to_le_bytes())
    }

    pub fn attitude(&mut self, attitude: &Attitude) -> Result<&mut Self, PacketError> {
        self.bytes(&attitude.to_le_bytes())
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, PacketError> {
        self.buffer
            .try_extend_from_slice(bytes)
            .map_err(|_| PacketError::Overflow)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(self) -> PacketBuffer {
        self.buffer
    }
}
