//! Transmit FIFO tokens.

/// Bytes with special meaning when written to the transmit FIFO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Token {
    TxOn = 0xa1,
    Sop1 = 0x12,
    Sop2 = 0x13,
    Sop3 = 0x1b,
    Reset1 = 0x15,
    Reset2 = 0x16,
    /// Followed by `len` packed bytes, the length goes into the low 5 bits
    PackSym = 0x80,
    JamCrc = 0xff,
    Eop = 0x14,
    TxOff = 0xfe,
}

impl From<Token> for u8 {
    fn from(token: Token) -> u8 {
        token as u8
    }
}

/// Ordered set announcing an SOP packet of `len` bytes.
pub fn sop_sequence(len: u8) -> [u8; 5] {
    [
        Token::Sop1.into(),
        Token::Sop1.into(),
        Token::Sop1.into(),
        Token::Sop2.into(),
        u8::from(Token::PackSym) | (len & 0x1f),
    ]
}

/// CRC, end of packet and transmitter control following the packed bytes.
pub const EOP_SEQUENCE: [u8; 4] = [
    Token::JamCrc as u8,
    Token::Eop as u8,
    Token::TxOff as u8,
    Token::TxOn as u8,
];
