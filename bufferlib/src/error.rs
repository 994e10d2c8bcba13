//! The `error` module defines the [`BufferError`] enum that describes everything that can go
//! wrong when growing a [`ByteBuffer`](crate::ByteBuffer), or when moving its contents to and
//! from binary or Intel HEX files.
//!
//! Hex errors carry two pieces of information:
//! 1. What kind of problem was found in the record (via [`HexErrorKind`]).
//! 2. The 1-based line number of the offending record, when reading a hex file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BufferError {
    /// Allocation failed, or the requested extent does not fit in the address space
    #[error("Cannot allocate memory for buffer: {requested} bytes requested")]
    OutOfMemory { requested: usize },

    #[error("Cannot open file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot seek in file {}: {source}", .path.display())]
    Seek {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot determine length of file {}: {source}", .path.display())]
    Tell {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unexpectedly hit EOF after reading {read} of {expected} bytes")]
    UnexpectedEof { read: usize, expected: usize },

    /// Fewer bytes were read or written than expected
    #[error("I/O error: {0}")]
    ReadOrWrite(#[from] io::Error),

    /// Hex input held no lines at all
    #[error("Empty file")]
    EmptyFile,

    /// Requested range is not inside the buffer's logical extent
    #[error("Range 0x{offset:X}+0x{count:X} exceeds buffer length 0x{length:X}")]
    RangeOutOfBounds {
        offset: usize,
        count: usize,
        length: usize,
    },

    #[error("Error encountered during record parsing at line #{1} of the hex file:\n{0}")]
    HexParse(HexErrorKind, usize),

    #[error("Error encountered during writing of hex file:\n{0}")]
    HexWrite(HexErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HexErrorKind {
    /// Record does not begin with a ':'
    #[error("Junk start code")]
    JunkStartCode,
    #[error("Junk byte count")]
    JunkByteCount,
    #[error("Junk address MSB")]
    JunkAddrMsb,
    #[error("Junk address LSB")]
    JunkAddrLsb,
    #[error("Junk record type")]
    JunkRecType,
    /// Index of the data byte that could not be parsed
    #[error("Junk data byte {0}")]
    JunkDataByte(u8),
    #[error("Junk checksum")]
    JunkChecksum,
    /// Calculated and read checksum
    #[error("Read checksum 0x{1:02X} differs from calculated checksum 0x{0:02X}")]
    BadChecksum(u8, u8),
    /// Line holds something beyond the canonical record, e.g. trailing junk
    #[error("Some corruption detected - some junk at the end of the line perhaps?")]
    CorruptLine,
    #[error("Premature end of file - no EOF record found")]
    MissingEof,
    #[error("Record type 0x{0:02X} not supported")]
    BadRecType(u8),
    /// Malformed extended segment record, or segment beyond 0xFFFF when writing
    #[error("Extended segment address record must have address 0x0000 and 2 data bytes, and a segment no larger than 0xFFFF")]
    BadExtSeg,
    #[error("Line length must be at least one byte")]
    BadLineLength,
}

pub type Result<T, E = BufferError> = std::result::Result<T, E>;

impl BufferError {
    /// Returns the hex record problem, if this error came from the Intel HEX codec.
    #[must_use]
    pub const fn hex_kind(&self) -> Option<HexErrorKind> {
        match self {
            Self::HexParse(kind, _) | Self::HexWrite(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the line number at which hex parsing failed.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::HexParse(_, line) => Some(*line),
            _ => None,
        }
    }
}
