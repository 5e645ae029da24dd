#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod codec;
pub mod driver;
pub mod error;
pub mod header;
pub mod message;
pub mod pdo;
pub mod policy;
pub mod replay;
pub mod sequencer;
pub mod sink;
pub mod source;
pub mod vdo;

#[cfg(test)]
mod dummy;

pub use error::{CodecError, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CcPin {
    CC1,
    CC2,
}

/// Raw pin number that is neither 1 nor 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("CC pin must be 1 or 2, got {0}")]
pub struct InvalidCcPin(pub u8);

impl TryFrom<u8> for CcPin {
    type Error = InvalidCcPin;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::CC1),
            2 => Ok(Self::CC2),
            _ => Err(InvalidCcPin(value)),
        }
    }
}

impl From<CcPin> for u8 {
    fn from(pin: CcPin) -> u8 {
        match pin {
            CcPin::CC1 => 1,
            CcPin::CC2 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerRole {
    Source,
    Sink,
}

impl From<bool> for PowerRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Sink,
            true => Self::Source,
        }
    }
}

impl From<PowerRole> for bool {
    fn from(role: PowerRole) -> bool {
        match role {
            PowerRole::Sink => false,
            PowerRole::Source => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRole {
    Ufp,
    Dfp,
}

impl From<bool> for DataRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Ufp,
            true => Self::Dfp,
        }
    }
}

impl From<DataRole> for bool {
    fn from(role: DataRole) -> bool {
        match role {
            DataRole::Ufp => false,
            DataRole::Dfp => true,
        }
    }
}

/// Type-C current advertisement, as seen by the CC comparator (2 bit code).
///
/// A source applies the matching pull-up, a sink reads back which level its partner advertises.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCurrent {
    /// Default USB power (Rd-Default)
    Default = 0b01,
    /// 1.5 A (Rd-1.5)
    Medium = 0b10,
    /// 3 A (Rd-3.0)
    High = 0b11,
}

impl HostCurrent {
    /// Comparator code for this advertisement.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Name of a 2 bit CC comparator code.
pub fn current_level_name(code: u8) -> &'static str {
    match code & 0b11 {
        0b00 => "Ra/low",
        0b01 => "Rd-Default",
        0b10 => "Rd-1.5",
        _ => "Rd-3.0",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_pin_numbers() {
        assert_eq!(CcPin::try_from(1), Ok(CcPin::CC1));
        assert_eq!(CcPin::try_from(2), Ok(CcPin::CC2));
        assert_eq!(u8::from(CcPin::CC2), 2);

        for raw in [0, 3, 0xff] {
            assert_eq!(CcPin::try_from(raw), Err(InvalidCcPin(raw)));
        }
    }

    #[test]
    fn invalid_cc_pin_message() {
        assert_eq!(
            std::format!("{}", InvalidCcPin(3)),
            "CC pin must be 1 or 2, got 3"
        );
    }
}
