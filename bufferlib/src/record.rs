//! The `record` module defines the [`Record`] and [`RecordType`] used for parsing (and
//! generating) Intel HEX records, and the [`HexCodec`] that applies parsed records to a
//! [`ByteBuffer`].
//!
//! Only the I8HEX subset is supported: data, end-of-file and extended segment address
//! records. Everything else is rejected.

use crate::buffer::ByteBuffer;
use crate::conv::{hex_byte, push_hex_byte};
use crate::error::{BufferError, HexErrorKind, Result};
use std::fmt;

mod ranges {
    pub const RECORD_LEN_POS: usize = 1;
    pub const RECORD_ADDR_MSB_POS: usize = 3;
    pub const RECORD_ADDR_LSB_POS: usize = 5;
    pub const RECORD_TYPE_POS: usize = 7;
    pub const RECORD_DATA_POS: usize = 9;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x0,
    EndOfFile = 0x1,
    ExtendedSegmentAddress = 0x2,
}

impl RecordType {
    const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Self::Data),
            0x1 => Some(Self::EndOfFile),
            0x2 => Some(Self::ExtendedSegmentAddress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) address: u16,
    /// Raw type byte; may hold an unsupported type until the record is dispatched
    pub(crate) rtype: u8,
    pub(crate) data: Vec<u8>,
}

impl fmt::Display for Record {
    /// Canonical uppercase rendering of the record, without line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::with_capacity(ranges::RECORD_DATA_POS + 2 * self.data.len() + 2);
        line.push(':');
        for byte in self.header() {
            push_hex_byte(&mut line, byte);
        }
        for &byte in &self.data {
            push_hex_byte(&mut line, byte);
        }
        push_hex_byte(&mut line, self.checksum());
        f.write_str(&line)
    }
}

impl Record {
    /// Creates a record of the given type. The payload may hold at most 255 bytes.
    ///
    /// # Errors
    /// Returns [`HexErrorKind::BadLineLength`] if the payload does not fit in a record.
    pub(crate) fn new(address: u16, rtype: RecordType, data: &[u8]) -> Result<Self, HexErrorKind> {
        if data.len() > usize::from(u8::MAX) {
            return Err(HexErrorKind::BadLineLength);
        }
        Ok(Self {
            address,
            rtype: rtype as u8,
            data: data.to_vec(),
        })
    }

    /// The `:00000001FF` terminator.
    pub(crate) const fn end_of_file() -> Self {
        Self {
            address: 0,
            rtype: RecordType::EndOfFile as u8,
            data: Vec::new(),
        }
    }

    /// Byte count, address MSB, address LSB and record type.
    #[allow(clippy::cast_possible_truncation)]
    fn header(&self) -> [u8; 4] {
        [
            self.data.len() as u8,
            (self.address >> 8) as u8,
            (self.address & 0xFF) as u8,
            self.rtype,
        ]
    }

    /// Two's complement of the sum of every byte in the record.
    pub(crate) fn checksum(&self) -> u8 {
        let sum = self
            .header()
            .iter()
            .chain(&self.data)
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        0u8.wrapping_sub(sum)
    }

    /// Parses the record at the start of `line`, checking the checksum but not the record
    /// type. Anything after the checksum is left to the caller.
    fn parse(line: &[u8]) -> Result<Self, HexErrorKind> {
        let byte_at = |pos: usize| -> Option<u8> {
            hex_byte(*line.get(pos)?, *line.get(pos + 1)?)
        };

        // Check for start code
        if line.first() != Some(&b':') {
            return Err(HexErrorKind::JunkStartCode);
        }

        let length = byte_at(ranges::RECORD_LEN_POS).ok_or(HexErrorKind::JunkByteCount)?;
        let addr_msb = byte_at(ranges::RECORD_ADDR_MSB_POS).ok_or(HexErrorKind::JunkAddrMsb)?;
        let addr_lsb = byte_at(ranges::RECORD_ADDR_LSB_POS).ok_or(HexErrorKind::JunkAddrLsb)?;
        let rtype = byte_at(ranges::RECORD_TYPE_POS).ok_or(HexErrorKind::JunkRecType)?;

        let data = (0..length)
            .map(|i| {
                byte_at(ranges::RECORD_DATA_POS + 2 * usize::from(i))
                    .ok_or(HexErrorKind::JunkDataByte(i))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        let checksum_pos = ranges::RECORD_DATA_POS + 2 * data.len();
        let read_checksum = byte_at(checksum_pos).ok_or(HexErrorKind::JunkChecksum)?;

        let record = Self {
            address: u16::from_be_bytes([addr_msb, addr_lsb]),
            rtype,
            data,
        };

        let calculated_checksum = record.checksum();
        if calculated_checksum != read_checksum {
            return Err(HexErrorKind::BadChecksum(calculated_checksum, read_checksum));
        }

        Ok(record)
    }
}

/// Applies Intel HEX records, one line at a time, to a data buffer and an optional mask.
///
/// The codec remembers the current segment base set by extended segment address records,
/// so every line of one file must go through the same codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexCodec {
    segment: usize,
}

impl HexCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self { segment: 0 }
    }

    /// Base address added to data record addresses.
    #[must_use]
    pub const fn segment(&self) -> usize {
        self.segment
    }

    /// Forgets any segment base seen so far.
    pub const fn reset(&mut self) {
        self.segment = 0;
    }

    /// Parses a single Intel HEX line and applies it.
    ///
    /// A data record is written at `segment + address` into `data` (growing and gap-filling
    /// as needed) and, if a mask is given, the same range of the mask is set to `0x01`. An
    /// end-of-file record changes nothing. An extended segment address record updates the
    /// segment base. The line may end with CR and/or LF; anything else after the checksum
    /// is an error.
    ///
    /// # Errors
    /// - Returns [`BufferError::HexParse`] carrying `line_number` if the record is malformed
    ///   or of an unsupported type
    /// - Returns [`BufferError::OutOfMemory`] if a buffer cannot grow
    ///
    /// # Example
    /// ```
    /// use bufferlib::{ByteBuffer, HexCodec, RecordType};
    ///
    /// let mut data = ByteBuffer::new(1024, 0x00).unwrap();
    /// let mut codec = HexCodec::new();
    ///
    /// let rtype = codec.process_line(":040BE10075820022F7\n", 1, &mut data, None).unwrap();
    ///
    /// assert_eq!(rtype, RecordType::Data);
    /// assert_eq!(data.len(), 0x0BE5);
    /// assert_eq!(data.capacity(), 4096);
    /// ```
    pub fn process_line<L: AsRef<[u8]>>(
        &mut self,
        line: L,
        line_number: usize,
        data: &mut ByteBuffer,
        mask: Option<&mut ByteBuffer>,
    ) -> Result<RecordType> {
        let line = line.as_ref();
        let parse_err = |kind| BufferError::HexParse(kind, line_number);

        let record = Record::parse(line).map_err(parse_err)?;

        // The whole line up to its terminator or a NUL must be exactly the record
        let end = line
            .iter()
            .position(|&b| matches!(b, b'\r' | b'\n' | b'\0'))
            .unwrap_or(line.len());
        if !line[..end].eq_ignore_ascii_case(record.to_string().as_bytes()) {
            return Err(parse_err(HexErrorKind::CorruptLine));
        }

        let rtype = RecordType::from_u8(record.rtype)
            .ok_or_else(|| parse_err(HexErrorKind::BadRecType(record.rtype)))?;

        match rtype {
            RecordType::Data => {
                let offset = self.segment + usize::from(record.address);
                data.write_block(offset, &record.data)?;
                if let Some(mask) = mask {
                    mask.write_const(offset, 0x01, record.data.len())?;
                }
            }
            RecordType::EndOfFile => {}
            RecordType::ExtendedSegmentAddress => {
                if record.address != 0 || record.data.len() != 2 {
                    return Err(parse_err(HexErrorKind::BadExtSeg));
                }
                self.segment =
                    ((usize::from(record.data[0]) << 8) | usize::from(record.data[1])) << 4;
            }
        }

        Ok(rtype)
    }
}
