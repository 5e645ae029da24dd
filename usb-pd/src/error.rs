use crate::pdo::PdoKind;

/// Failures while building wire data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Only fixed supply objects can be constructed.
    #[error("construction of {0:?} power data objects is not supported")]
    UnsupportedPdo(PdoKind),
    /// Only structured VDM headers can be constructed.
    #[error("unstructured VDM construction is not implemented")]
    UnstructuredVdm,
    /// Data objects are 4 bytes each.
    #[error("payload length {0} is not a multiple of 4")]
    PayloadLength(usize),
    /// A message carries at most 7 data objects.
    #[error("{0} data objects do not fit into one message")]
    TooManyObjects(usize),
}

/// Errors surfaced by the negotiation flows.
///
/// `E` is the transceiver driver's own error type, passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("transceiver driver failure")]
    Driver(E),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
