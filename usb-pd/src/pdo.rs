use {
    crate::error::CodecError,
    byteorder::{ByteOrder, LittleEndian},
    proc_bitfield::bitfield,
};

/// Supply type, selected by bits 30..=31 of every power data object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdoKind {
    Fixed,
    Battery,
    Variable,
    Pps,
}

impl From<u8> for PdoKind {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Fixed,
            0b01 => Self::Battery,
            0b10 => Self::Variable,
            _ => Self::Pps,
        }
    }
}

impl From<PdoKind> for u8 {
    fn from(kind: PdoKind) -> u8 {
        match kind {
            PdoKind::Fixed => 0b00,
            PdoKind::Battery => 0b01,
            PdoKind::Variable => 0b10,
            PdoKind::Pps => 0b11,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerDataObject {
    FixedSupply(FixedSupply),
    Battery(Battery),
    VariableSupply(VariableSupply),
    AugmentedPowerDataObject(AugmentedPowerDataObject),
}

impl PowerDataObject {
    pub fn kind(&self) -> PdoKind {
        match self {
            Self::FixedSupply(_) => PdoKind::Fixed,
            Self::Battery(_) => PdoKind::Battery,
            Self::VariableSupply(_) => PdoKind::Variable,
            Self::AugmentedPowerDataObject(_) => PdoKind::Pps,
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct PowerDataObjectRaw(pub u32): Debug, FromStorage, IntoStorage {
        pub kind: u8 [get PdoKind, set PdoKind] @ 30..=31,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct FixedSupply(pub u32): Debug, FromStorage, IntoStorage {
        pub kind: u8 @ 30..=31,
        pub dual_role_power: bool @ 29,
        pub usb_suspend_supported: bool @ 28,
        pub unconstrained_power: bool @ 27,
        pub usb_communications_capable: bool @ 26,
        pub dual_role_data: bool @ 25,
        pub unchunked_extended_messages_supported: bool @ 24,
        pub epr_mode_capable: bool @ 23,
        /// Overload capability code, 0 means none
        pub peak_current: u8 @ 20..=21,
        /// 50 mV
        pub raw_voltage: u16 @ 10..=19,
        /// 10 mA
        pub raw_max_current: u16 @ 0..=9,
        /// Most significant byte, the capability flags together with the supply type
        pub flags: u8 @ 24..=31,
    }
}

impl FixedSupply {
    pub fn voltage_mv(&self) -> u32 {
        u32::from(self.raw_voltage()) * 50
    }

    pub fn max_current_ma(&self) -> u32 {
        u32::from(self.raw_max_current()) * 10
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Battery(pub u32): Debug, FromStorage, IntoStorage {
        pub kind: u8 @ 30..=31,
        /// 50 mV
        pub raw_max_voltage: u16 @ 20..=29,
        /// 50 mV
        pub raw_min_voltage: u16 @ 10..=19,
        /// 250 mW
        pub raw_max_power: u16 @ 0..=9,
    }
}

impl Battery {
    pub fn max_voltage_mv(&self) -> u32 {
        u32::from(self.raw_max_voltage()) * 50
    }

    pub fn min_voltage_mv(&self) -> u32 {
        u32::from(self.raw_min_voltage()) * 50
    }

    pub fn max_power_mw(&self) -> u32 {
        u32::from(self.raw_max_power()) * 250
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VariableSupply(pub u32): Debug, FromStorage, IntoStorage {
        pub kind: u8 @ 30..=31,
        /// 50 mV
        pub raw_max_voltage: u16 @ 20..=29,
        /// 50 mV
        pub raw_min_voltage: u16 @ 10..=19,
        /// 10 mA
        pub raw_max_current: u16 @ 0..=9,
    }
}

impl VariableSupply {
    pub fn max_voltage_mv(&self) -> u32 {
        u32::from(self.raw_max_voltage()) * 50
    }

    pub fn min_voltage_mv(&self) -> u32 {
        u32::from(self.raw_min_voltage()) * 50
    }

    pub fn max_current_ma(&self) -> u32 {
        u32::from(self.raw_max_current()) * 10
    }
}

/// Programmable supply family, bits 28..=29 of an augmented object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AugmentedKind {
    Spr,
    Epr,
    Reserved(u8),
}

impl From<u8> for AugmentedKind {
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::Spr,
            0b01 => Self::Epr,
            other => Self::Reserved(other),
        }
    }
}

impl From<AugmentedKind> for u8 {
    fn from(kind: AugmentedKind) -> u8 {
        match kind {
            AugmentedKind::Spr => 0b00,
            AugmentedKind::Epr => 0b01,
            AugmentedKind::Reserved(raw) => raw,
        }
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct AugmentedPowerDataObject(pub u32): Debug, FromStorage, IntoStorage {
        pub kind: u8 @ 30..=31,
        /// SPR programmable, EPR adjustable or reserved
        pub supply: u8 [get AugmentedKind, set AugmentedKind] @ 28..=29,
        pub pps_power_limited: bool @ 27,
        /// 100 mV
        pub raw_max_voltage: u16 @ 17..=24,
        /// 100 mV
        pub raw_min_voltage: u8 @ 8..=15,
        /// 50 mA
        pub raw_max_current: u8 @ 0..=6,
    }
}

impl AugmentedPowerDataObject {
    pub fn max_voltage_mv(&self) -> u32 {
        u32::from(self.raw_max_voltage()) * 100
    }

    pub fn min_voltage_mv(&self) -> u32 {
        u32::from(self.raw_min_voltage()) * 100
    }

    pub fn max_current_ma(&self) -> u32 {
        u32::from(self.raw_max_current()) * 50
    }
}

/// Decodes one little-endian power data object.
pub fn parse_pdo(bytes: [u8; 4]) -> PowerDataObject {
    let raw = LittleEndian::read_u32(&bytes);
    match PowerDataObjectRaw(raw).kind() {
        PdoKind::Fixed => PowerDataObject::FixedSupply(FixedSupply(raw)),
        PdoKind::Battery => PowerDataObject::Battery(Battery(raw)),
        PdoKind::Variable => PowerDataObject::VariableSupply(VariableSupply(raw)),
        PdoKind::Pps => PowerDataObject::AugmentedPowerDataObject(AugmentedPowerDataObject(raw)),
    }
}

/// Encodes a fixed supply object.
///
/// Voltage is truncated to 50 mV steps, current to 10 mA steps. Both fields are 10 bits wide,
/// larger values saturate at 51150 mV and 10230 mA. `flags` becomes the most significant byte;
/// its two top bits are the supply type and are forced to fixed.
pub fn build_fixed_pdo(voltage_mv: u32, current_ma: u32, peak_current: u8, flags: u8) -> [u8; 4] {
    let pdo = FixedSupply(0)
        .with_raw_max_current((current_ma / 10).min(0x3ff) as u16)
        .with_raw_voltage((voltage_mv / 50).min(0x3ff) as u16)
        .with_peak_current(peak_current & 0b11)
        .with_flags(flags & 0b0011_1111)
        .with_kind(PdoKind::Fixed.into());

    let mut buf = [0; 4];
    LittleEndian::write_u32(&mut buf, pdo.0);
    buf
}

/// Encodes an object of the given kind. Only fixed supplies can be built.
pub fn build_pdo(
    kind: PdoKind,
    voltage_mv: u32,
    current_ma: u32,
    peak_current: u8,
    flags: u8,
) -> Result<[u8; 4], CodecError> {
    match kind {
        PdoKind::Fixed => Ok(build_fixed_pdo(voltage_mv, current_ma, peak_current, flags)),
        other => Err(CodecError::UnsupportedPdo(other)),
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct RawRequestDataObject(pub u32): Debug, FromStorage, IntoStorage {
        /// One based index into the offered capabilities, 0 is invalid
        pub object_position: u8 @ 28..=31,
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct FixedVariableRequestDataObject(pub u32): Debug, FromStorage, IntoStorage {
        pub object_position: u8 @ 28..=31,
        pub giveback_flag: bool @ 27,
        pub capability_mismatch: bool @ 26,
        pub usb_communications_capable: bool @ 25,
        pub no_usb_suspend: bool @ 24,
        pub unchunked_extended_messages_supported: bool @ 23,
        pub epr_mode_capable: bool @ 22,
        /// 10 mA
        pub operating_current: u16 @ 10..=19,
        /// 10 mA
        pub maximum_operating_current: u16 @ 0..=9,
    }
}

impl FixedVariableRequestDataObject {
    /// Request for the object at `index` (zero based) of the offered capabilities.
    pub fn new(index: usize, current_ma: u32, max_current_ma: u32) -> Self {
        FixedVariableRequestDataObject(0)
            .with_object_position(object_position(index))
            .with_operating_current((current_ma / 10).min(0x3ff) as u16)
            .with_maximum_operating_current((max_current_ma / 10).min(0x3ff) as u16)
            .with_no_usb_suspend(true)
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut buf = [0; 4];
        LittleEndian::write_u32(&mut buf, self.0);
        buf
    }
}

bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct PpsRequestDataObject(pub u32): Debug, FromStorage, IntoStorage {
        pub object_position: u8 @ 28..=31,
        pub capability_mismatch: bool @ 26,
        pub usb_communications_capable: bool @ 25,
        pub no_usb_suspend: bool @ 24,
        pub unchunked_extended_messages_supported: bool @ 23,
        pub epr_mode_capable: bool @ 22,
        /// 20 mV
        pub output_voltage: u16 @ 9..=20,
        /// 50 mA
        pub operating_current: u8 @ 0..=6,
    }
}

impl PpsRequestDataObject {
    pub fn new(index: usize, voltage_mv: u32, current_ma: u32) -> Self {
        PpsRequestDataObject(0)
            .with_object_position(object_position(index))
            .with_output_voltage((voltage_mv / 20).min(0xfff) as u16)
            .with_operating_current((current_ma / 50).min(0x7f) as u8)
            .with_no_usb_suspend(true)
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut buf = [0; 4];
        LittleEndian::write_u32(&mut buf, self.0);
        buf
    }
}

fn object_position(index: usize) -> u8 {
    (index + 1).min(0b1111) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(pdo: PowerDataObject) -> FixedSupply {
        match pdo {
            PowerDataObject::FixedSupply(fixed) => fixed,
            other => panic!("expected fixed supply, got {:?}", other),
        }
    }

    #[test]
    fn fixed_round_trip() {
        for (voltage, current, peak, flags) in [
            (0, 0, 0, 0),
            (5000, 1500, 0, 0x08),
            (9000, 3000, 1, 0x00),
            (19000, 5000, 2, 0x3f),
            (50 * 1023, 10 * 1023, 3, 0x27),
        ] {
            let pdo = fixed(parse_pdo(build_fixed_pdo(voltage, current, peak, flags)));

            assert_eq!(pdo.voltage_mv(), voltage);
            assert_eq!(pdo.max_current_ma(), current);
            assert_eq!(pdo.peak_current(), peak);
            assert_eq!(pdo.flags(), flags);
        }
    }

    #[test]
    fn fixed_round_trip_sweep() {
        for voltage in (0..=50 * 1023).step_by(50) {
            let pdo = fixed(parse_pdo(build_fixed_pdo(voltage, 1500, 0, 0)));
            assert_eq!(pdo.voltage_mv(), voltage);
            assert_eq!(pdo.max_current_ma(), 1500);
        }

        for current in (0..=10 * 1023).step_by(10) {
            let pdo = fixed(parse_pdo(build_fixed_pdo(5000, current, 0, 0)));
            assert_eq!(pdo.voltage_mv(), 5000);
            assert_eq!(pdo.max_current_ma(), current);
        }
    }

    #[test]
    fn fixed_fields_saturate_and_truncate() {
        let pdo = fixed(parse_pdo(build_fixed_pdo(50 * 1024, 10 * 1024, 0, 0)));
        assert_eq!(pdo.voltage_mv(), 51150);
        assert_eq!(pdo.max_current_ma(), 10230);

        let pdo = fixed(parse_pdo(build_fixed_pdo(u32::MAX, u32::MAX, 0, 0)));
        assert_eq!(pdo.voltage_mv(), 51150);
        assert_eq!(pdo.max_current_ma(), 10230);

        let pdo = fixed(parse_pdo(build_fixed_pdo(5049, 1509, 0, 0)));
        assert_eq!(pdo.voltage_mv(), 5000);
        assert_eq!(pdo.max_current_ma(), 1500);
    }

    #[test]
    fn fixed_layout_matches_captured_bytes() {
        assert_eq!(build_fixed_pdo(5000, 3000, 0, 0x08), [0x2c, 0x91, 0x01, 0x08]);
        assert_eq!(build_fixed_pdo(9000, 3000, 0, 0x00), [0x2c, 0xd1, 0x02, 0x00]);
    }

    #[test]
    fn decodes_pps() {
        let PowerDataObject::AugmentedPowerDataObject(pps) = parse_pdo([0x3c, 0x21, 0xa4, 0xc9])
        else {
            panic!("expected augmented object");
        };

        assert_eq!(pps.supply(), AugmentedKind::Spr);
        assert_eq!(pps.max_voltage_mv(), 21000);
        assert_eq!(pps.min_voltage_mv(), 3300);
        assert_eq!(pps.max_current_ma(), 3000);
        assert!(pps.pps_power_limited());
    }

    #[test]
    fn decodes_variable_and_battery() {
        // 5..12 V at 2 A, variable
        let raw: u32 = (0b10 << 30) | (240 << 20) | (100 << 10) | 200;
        let PowerDataObject::VariableSupply(variable) = parse_pdo(raw.to_le_bytes()) else {
            panic!("expected variable supply");
        };
        assert_eq!(variable.max_voltage_mv(), 12000);
        assert_eq!(variable.min_voltage_mv(), 5000);
        assert_eq!(variable.max_current_ma(), 2000);

        // 5..12 V at 15 W, battery
        let raw: u32 = (0b01 << 30) | (240 << 20) | (100 << 10) | 60;
        let PowerDataObject::Battery(battery) = parse_pdo(raw.to_le_bytes()) else {
            panic!("expected battery");
        };
        assert_eq!(battery.max_power_mw(), 15000);
    }

    #[test]
    fn only_fixed_objects_can_be_built() {
        assert!(build_pdo(PdoKind::Fixed, 5000, 1500, 0, 0).is_ok());

        for kind in [PdoKind::Battery, PdoKind::Variable, PdoKind::Pps] {
            assert_eq!(
                build_pdo(kind, 5000, 1500, 0, 0),
                Err(CodecError::UnsupportedPdo(kind))
            );
        }
    }

    #[test]
    fn fixed_request_layout() {
        // second object, 1.5 A operating and maximum
        let rdo = FixedVariableRequestDataObject::new(1, 1500, 1500).to_bytes();

        assert_eq!(rdo, [0x96, 0x58, 0x02, 0x21]);
    }

    #[test]
    fn pps_request_layout() {
        // first object, 9 V at 2 A
        let rdo = PpsRequestDataObject::new(0, 9000, 2000);

        assert_eq!(rdo.output_voltage(), 450);
        assert_eq!(rdo.operating_current(), 40);
        assert_eq!(rdo.to_bytes(), [0x28, 0x84, 0x03, 0x11]);
    }
}
