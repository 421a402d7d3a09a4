//! Non-blocking byte/line transports between the loop and the UARTs.

use core::fmt;

/// Pull side of a serial receiver. Returns `None` when nothing is buffered;
/// must never wait.
pub trait ByteSource {
    fn read_byte(&mut self) -> Option<u8>;
}

/// Push side of the downlink. Must never wait either: a full transmit queue
/// is reported as [`LinkError::Busy`].
pub trait LineSink {
    fn send_line(&mut self, line: &str) -> Result<(), LinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Transmit queue full, line dropped.
    Busy,
    /// Line does not fit the transport's frame.
    TooLong,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Busy => f.write_str("link busy"),
            LinkError::TooLong => f.write_str("line too long"),
        }
    }
}

/// Drains a byte slice front to back.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> Option<u8> {
        let (&b, rest) = self.split_first()?;
        *self = rest;
        Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::ByteSource;

    #[test]
    fn test_slice_source_drains_in_order() {
        let mut src: &[u8] = b"PA";
        assert_eq!(src.read_byte(), Some(b'P'));
        assert_eq!(src.read_byte(), Some(b'A'));
        assert_eq!(src.read_byte(), None);
        assert_eq!(src.read_byte(), None);
    }
}
