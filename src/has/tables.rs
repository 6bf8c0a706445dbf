//! Constellation identifiers and signal-mask label tables of the HAS format.

use core::fmt;
use serde::Serialize;

pub const SIGNAL_TABLE_LEN: usize = 16;
pub const RESERVED: &str = "Reserved";

pub static GPS_SIGNALS: [&str; SIGNAL_TABLE_LEN] = [
    "L1C/A",
    RESERVED,
    RESERVED,
    "L1C(D)",
    "L1C(P)",
    "L1C(D+P)",
    "L2 CM",
    "L2 CL",
    "L2 CM+CL",
    "L2 P",
    RESERVED,
    "L5 I",
    "L5 Q",
    "L5 I + L5 Q",
    RESERVED,
    RESERVED,
];

pub static GALILEO_SIGNALS: [&str; SIGNAL_TABLE_LEN] = [
    "E1-B I/NAV OS",
    "E1-C",
    "E1-B + E1-C",
    "E5a-I F/NAV OS",
    "E5a-Q",
    "E5a-I+E5a-Q",
    "E5b-I I/NAV OS",
    "E5b-Q",
    "E5b-I+E5b-Q",
    "E5-I",
    "E5-Q",
    "E5-I + E5-Q",
    "E6-B C/NAV HAS",
    "E6-C",
    "E6-B + E6-C",
    RESERVED,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Constellation {
    #[serde(rename = "GPS")]
    Gps,
    #[serde(rename = "GALILEO")]
    Galileo,
}

impl Constellation {
    pub fn from_gnss_id(gnss_id: u64) -> Option<Self> {
        match gnss_id {
            0 => Some(Constellation::Gps),
            2 => Some(Constellation::Galileo),
            _ => None,
        }
    }

    pub fn gnss_id(self) -> u8 {
        match self {
            Constellation::Gps => 0,
            Constellation::Galileo => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Constellation::Gps => "GPS",
            Constellation::Galileo => "GALILEO",
        }
    }

    /// Label per signal-mask position. Reserved positions still occupy a slot.
    pub fn signal_table(self) -> &'static [&'static str; SIGNAL_TABLE_LEN] {
        match self {
            Constellation::Gps => &GPS_SIGNALS,
            Constellation::Galileo => &GALILEO_SIGNALS,
        }
    }

    pub fn signal_label(self, position: usize) -> Option<&'static str> {
        self.signal_table().get(position).copied()
    }
}

impl fmt::Display for Constellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
