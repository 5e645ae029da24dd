//! Decisions the negotiation flows delegate to the application.
//!
//! Policies run inside the poll loop. A sink must answer Source_Capabilities within a few
//! hundred milliseconds, so implementations must return quickly and must not block.

use crate::{message::Message, pdo::PowerDataObject};

pub trait SinkPolicy {
    /// Picks an offered object, returns its index and the current to request in mA.
    ///
    /// `None` leaves the offer unanswered.
    fn select_pdo(&mut self, pdos: &[PowerDataObject]) -> Option<(usize, u32)>;

    /// Called for Accept and PS_RDY.
    fn accepted(&mut self, _message: &Message) {}
}

pub trait SourcePolicy {
    /// Whether the requested profile (zero based index into the advertisement) can be served.
    fn validate_profile(&mut self, profile: usize, request: &Message) -> bool;

    /// Switch the output to the accepted profile. Runs between Accept and PS_RDY.
    fn switch_to_profile(&mut self, profile: usize, request: &Message);

    /// Cut the output, on setup and when a request is refused.
    fn disable_output(&mut self);

    /// Enable the default 5 V output once a sink is attached.
    fn enable_default_output(&mut self);
}

/// First fixed supply at `voltage` volts.
///
/// Requests `current` mA, or everything the supply offers when `None`.
pub fn select_pdo_for_voltage(
    pdos: &[PowerDataObject],
    voltage: u32,
    current: Option<u32>,
) -> Option<(usize, u32)> {
    pdos.iter().enumerate().find_map(|(index, pdo)| match pdo {
        PowerDataObject::FixedSupply(fixed) if fixed.voltage_mv() / 1000 == voltage => {
            Some((index, current.unwrap_or(fixed.max_current_ma())))
        }
        _ => None,
    })
}

/// Fixed supply delivering the most power into a resistive load of `resistance` ohms.
///
/// The current needed gets 10% headroom; supplies that cannot deliver it are skipped.
pub fn select_pdo_for_resistance(
    pdos: &[PowerDataObject],
    resistance: u32,
) -> Option<(usize, u32)> {
    if resistance == 0 {
        return None;
    }

    let mut best: Option<(usize, u32, u64)> = None;
    for (index, pdo) in pdos.iter().enumerate() {
        let PowerDataObject::FixedSupply(fixed) = pdo else {
            continue;
        };
        let voltage = u64::from(fixed.voltage_mv());
        let divisor = u64::from(resistance) * 10;
        let current = voltage * 11 / divisor;
        if current > u64::from(fixed.max_current_ma()) {
            continue;
        }

        // uW, not derived from the rounded current so light loads still rank by voltage
        let power = voltage * voltage * 11 / divisor;
        if best.map_or(true, |(_, _, best_power)| power > best_power) {
            // bounded by the 10 bit current field
            best = Some((index, current as u32, power));
        }
    }

    best.map(|(index, current, _)| (index, current))
}

/// Sink policy asking for a fixed voltage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoltagePolicy {
    /// Volts
    pub voltage: u32,
    /// mA, the supply maximum when `None`
    pub current: Option<u32>,
}

impl SinkPolicy for VoltagePolicy {
    fn select_pdo(&mut self, pdos: &[PowerDataObject]) -> Option<(usize, u32)> {
        select_pdo_for_voltage(pdos, self.voltage, self.current)
    }
}

/// Sink policy maximising power into a resistive load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResistancePolicy {
    /// Ohms
    pub resistance: u32,
}

impl SinkPolicy for ResistancePolicy {
    fn select_pdo(&mut self, pdos: &[PowerDataObject]) -> Option<(usize, u32)> {
        select_pdo_for_resistance(pdos, self.resistance)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::pdo::{build_fixed_pdo, parse_pdo},
    };

    fn fixed(voltage_mv: u32, current_ma: u32) -> PowerDataObject {
        parse_pdo(build_fixed_pdo(voltage_mv, current_ma, 0, 0))
    }

    fn pps() -> PowerDataObject {
        parse_pdo([0x3c, 0x21, 0xa4, 0xc9])
    }

    #[test]
    fn voltage_match_uses_offered_current() {
        let pdos = [fixed(5000, 1500)];

        assert_eq!(select_pdo_for_voltage(&pdos, 5, None), Some((0, 1500)));
    }

    #[test]
    fn voltage_match_skips_other_kinds() {
        let pdos = [pps(), fixed(5000, 3000), fixed(9000, 2000)];

        assert_eq!(select_pdo_for_voltage(&pdos, 9, Some(500)), Some((2, 500)));
        assert_eq!(select_pdo_for_voltage(&pdos, 20, None), None);
    }

    #[test]
    fn resistance_maximises_power_within_limits() {
        // 8 ohm: 5 V needs 687 mA, 9 V needs 1237 mA, 20 V needs 2750 mA
        let pdos = [fixed(5000, 3000), fixed(9000, 3000), pps(), fixed(20000, 2250)];

        assert_eq!(select_pdo_for_resistance(&pdos, 8), Some((1, 1237)));
    }

    #[test]
    fn resistance_without_candidates() {
        let pdos = [fixed(20000, 500), pps()];

        assert_eq!(select_pdo_for_resistance(&pdos, 8), None);
        assert_eq!(select_pdo_for_resistance(&pdos, 0), None);
    }

    #[test]
    fn resistance_does_not_overflow() {
        let pdos = [fixed(5000, 3000), fixed(20000, 3000)];

        assert_eq!(select_pdo_for_resistance(&pdos, 500_000_000), Some((1, 0)));
        assert_eq!(select_pdo_for_resistance(&pdos, u32::MAX), Some((1, 0)));
        assert_eq!(select_pdo_for_resistance(&pdos[..1], u32::MAX), Some((0, 0)));
    }

    #[test]
    fn ready_made_policies() {
        let pdos = [fixed(5000, 3000), fixed(15000, 3000)];

        let mut voltage = VoltagePolicy {
            voltage: 15,
            current: None,
        };
        let mut resistance = ResistancePolicy { resistance: 10 };

        assert_eq!(voltage.select_pdo(&pdos), Some((1, 3000)));
        assert_eq!(resistance.select_pdo(&pdos), Some((1, 1650)));
    }
}
