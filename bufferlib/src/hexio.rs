//! Intel HEX file I/O for [`ByteBuffer`].
//!
//! Reading fills a data buffer and, optionally, a mask buffer marking which bytes the file
//! actually covered (`0x01`) and which are holes (`0x00`). Writing takes the same kind of
//! mask to decide which bytes to emit; without one, a mask is made on the fly.

use crate::buffer::ByteBuffer;
use crate::error::{BufferError, HexErrorKind, Result};
use crate::record::{HexCodec, Record, RecordType};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Runs of at least this many fill bytes are treated as holes when deriving a mask.
pub const MASK_HOLE_THRESHOLD: usize = 8;

/// Size of the window addressable from one segment base.
const SEGMENT_WINDOW: usize = 0x10000;

/// Initial capacity of the mask made when the caller does not supply one.
const TEMP_MASK_CAPACITY: usize = 1024;

/// Initial capacity of the buffers made by `from_intel_hex_file`.
const INITIAL_CAPACITY: usize = 1024;

/// Settings for writing Intel HEX files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexWriteOptions {
    /// Maximum number of data bytes per record
    line_length: u8,
    /// Skip long runs of fill bytes when no mask is supplied
    compress: bool,
}

impl Default for HexWriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl HexWriteOptions {
    /// Options with 16 data bytes per record and no compression.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line_length: 16,
            compress: false,
        }
    }

    #[must_use]
    pub const fn line_length(&self) -> u8 {
        self.line_length
    }

    #[must_use]
    pub const fn compress(&self) -> bool {
        self.compress
    }

    /// Update the max number of data bytes per record. Default = 16.
    ///
    /// # Errors
    /// Returns an error if the provided line length is 0.
    ///
    /// # Example
    /// ```
    /// use bufferlib::HexWriteOptions;
    ///
    /// let mut options = HexWriteOptions::new();
    /// assert!(options.set_line_length(32).is_ok());
    /// assert!(options.set_line_length(0).is_err());
    /// assert_eq!(options.line_length(), 32);
    /// ```
    pub fn set_line_length(&mut self, line_length: u8) -> Result<()> {
        if line_length == 0 {
            return Err(BufferError::HexWrite(HexErrorKind::BadLineLength));
        }
        self.line_length = line_length;
        Ok(())
    }

    pub const fn set_compress(&mut self, compress: bool) {
        self.compress = compress;
    }
}

impl ByteBuffer {
    /// Reads an Intel HEX file into `self`, replacing its contents.
    ///
    /// Both `self` and `mask` (if given) are zero-length'd first. Every byte set by a data
    /// record is marked `0x01` in the mask; everything else keeps the mask's fill.
    ///
    /// # Errors
    /// - Returns [`BufferError::FileOpen`] if the file cannot be opened
    /// - Returns [`BufferError::EmptyFile`] if it holds no lines
    /// - Returns [`BufferError::HexParse`] for a bad record or a missing end-of-file record
    ///
    /// # Example
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("fw.hex");
    /// std::fs::write(&path, ":040BE10075820022F7\n:00000001FF\n").unwrap();
    ///
    /// let mut data = ByteBuffer::new(1024, 0xFF).unwrap();
    /// let mut mask = ByteBuffer::new(1024, 0x00).unwrap();
    /// data.read_intel_hex_file(&path, Some(&mut mask)).unwrap();
    ///
    /// assert_eq!(data.len(), 0x0BE5);
    /// assert_eq!(mask.get(0x0BE0), Some(0x00));
    /// assert_eq!(mask.get(0x0BE1), Some(0x01));
    /// ```
    pub fn read_intel_hex_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        mask: Option<&mut Self>,
    ) -> Result<()> {
        let path = path.as_ref();
        debug!("Reading Intel HEX file {:?}", path);

        let file = File::open(path).map_err(|source| BufferError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        self.read_intel_hex(BufReader::new(file), mask)?;

        debug!("Read {} bytes from {:?}", self.len(), path);
        Ok(())
    }

    /// Reads Intel HEX records from any buffered reader into `self`.
    ///
    /// Lines are processed until an end-of-file record; anything after it is ignored.
    ///
    /// # Errors
    /// - Returns [`BufferError::EmptyFile`] if the reader yields no lines
    /// - Returns [`BufferError::HexParse`] for a bad record or a missing end-of-file record
    /// - Returns [`BufferError::ReadOrWrite`] if reading fails
    pub fn read_intel_hex<R: BufRead>(
        &mut self,
        reader: R,
        mut mask: Option<&mut Self>,
    ) -> Result<()> {
        // Clear existing contents
        self.zero_length();
        if let Some(mask) = mask.as_deref_mut() {
            mask.zero_length();
        }

        let mut codec = HexCodec::new();
        let mut lines = reader.split(b'\n');
        let mut line = lines.next().ok_or(BufferError::EmptyFile)??;
        let mut line_number = 1;

        let last_type = loop {
            let rtype = codec.process_line(&line, line_number, self, mask.as_deref_mut())?;
            if rtype == RecordType::EndOfFile {
                break rtype;
            }
            match lines.next() {
                Some(next) => line = next?,
                None => break rtype,
            }
            line_number += 1;
        };

        if last_type != RecordType::EndOfFile {
            return Err(BufferError::HexParse(HexErrorKind::MissingEof, line_number));
        }

        debug!("Processed {} Intel HEX records", line_number);
        Ok(())
    }

    /// Builds a mask marking every byte of `self` as written, except runs of at least
    /// [`MASK_HOLE_THRESHOLD`] fill bytes, which are marked as holes.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the mask cannot grow.
    ///
    /// # Example
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let mut data = ByteBuffer::new(64, b'.').unwrap();
    /// data.append_block(b"Hello........World").unwrap();
    ///
    /// let mut mask = ByteBuffer::new(64, 0x00).unwrap();
    /// data.derive_mask(&mut mask).unwrap();
    ///
    /// assert_eq!(&mask.as_slice()[..6], &[1, 1, 1, 1, 1, 0]);
    /// ```
    pub fn derive_mask(&self, mask: &mut Self) -> Result<()> {
        mask.zero_length();
        mask.append_const(0x01, self.len())?;

        let data = self.as_slice();
        let flags = mask.as_mut_slice();
        let mut address = 0;

        while address < data.len() {
            if data[address] != self.fill() {
                address += 1;
                continue;
            }

            let run = data[address..]
                .iter()
                .take_while(|&&b| b == self.fill())
                .count();
            if run >= MASK_HOLE_THRESHOLD {
                flags[address..address + run].fill(0x00);
            }
            address += run;
        }

        Ok(())
    }

    /// Generates an Intel HEX file at the specified path.
    ///
    /// Bytes are emitted where `mask` is non-zero. Without a mask, every byte up to `len()`
    /// is emitted, or, if `options.compress()` is set, every byte outside runs of at least
    /// [`MASK_HOLE_THRESHOLD`] fill bytes.
    ///
    /// # Errors
    /// - Returns [`BufferError::FileOpen`] if the file cannot be created
    /// - Returns [`BufferError::HexWrite`] if an address needs a segment above 0xFFFF
    /// - Returns [`BufferError::ReadOrWrite`] if writing fails
    ///
    /// # Example
    /// ```
    /// use bufferlib::{ByteBuffer, HexWriteOptions};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("fw.hex");
    ///
    /// let mut data = ByteBuffer::new(16, 0x00).unwrap();
    /// data.write_block(0x0BE1, &[0x75, 0x82, 0x00, 0x22]).unwrap();
    ///
    /// let mut options = HexWriteOptions::new();
    /// options.set_compress(true);
    /// data.write_intel_hex_file(&path, None, &options).unwrap();
    ///
    /// let text = std::fs::read_to_string(&path).unwrap();
    /// assert_eq!(text, ":040BE10075820022F7\n:00000001FF\n");
    /// ```
    pub fn write_intel_hex_file<P: AsRef<Path>>(
        &self,
        path: P,
        mask: Option<&Self>,
        options: &HexWriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        debug!("Writing Intel HEX file {:?}", path);

        let file = File::create(path).map_err(|source| BufferError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        // Wrap in BufWriter for efficient line-by-line writing
        self.write_intel_hex(BufWriter::new(file), mask, options)
    }

    /// Writes Intel HEX records for `self` to any writer. See
    /// [`write_intel_hex_file`](Self::write_intel_hex_file).
    ///
    /// # Errors
    /// - Returns [`BufferError::HexWrite`] if an address needs a segment above 0xFFFF
    /// - Returns [`BufferError::ReadOrWrite`] if writing fails
    pub fn write_intel_hex<W: Write>(
        &self,
        mut writer: W,
        mask: Option<&Self>,
        options: &HexWriteOptions,
    ) -> Result<()> {
        let temp_mask;
        let mask = if let Some(mask) = mask {
            mask
        } else {
            let mut derived = Self::new(TEMP_MASK_CAPACITY, 0x00)?;
            if options.compress() {
                self.derive_mask(&mut derived)?;
            } else {
                derived.append_const(0x01, self.len())?;
            }
            temp_mask = derived;
            &temp_mask
        };

        let flags = mask.as_slice();
        let line_length = usize::from(options.line_length());
        let mut address = 0;
        let mut ceiling = 0;
        let mut records = 0usize;
        let mut chunk = Vec::with_capacity(line_length);

        loop {
            ceiling = (ceiling + SEGMENT_WINDOW).min(flags.len());

            while address < ceiling {
                // Skip holes
                address += flags[address..ceiling]
                    .iter()
                    .take_while(|&&f| f == 0x00)
                    .count();
                if address == ceiling {
                    break;
                }

                // Take up to a line of the current run, staying inside the window
                let max_count = line_length.min(ceiling - address);
                let count = flags[address..address + max_count]
                    .iter()
                    .take_while(|&&f| f != 0x00)
                    .count();

                chunk.clear();
                chunk.extend(
                    (address..address + count).map(|a| self.get(a).unwrap_or(self.fill())),
                );

                #[allow(clippy::cast_possible_truncation)]
                let record = Record::new((address & 0xFFFF) as u16, RecordType::Data, &chunk)
                    .map_err(BufferError::HexWrite)?;
                writeln!(writer, "{record}")?;
                records += 1;

                address += count;
            }

            if address >= flags.len() {
                break;
            }

            // Move the segment base up to the next window
            let segment = u16::try_from(address >> 4)
                .map_err(|_| BufferError::HexWrite(HexErrorKind::BadExtSeg))?;
            let record =
                Record::new(0, RecordType::ExtendedSegmentAddress, &segment.to_be_bytes())
                    .map_err(BufferError::HexWrite)?;
            writeln!(writer, "{record}")?;
        }

        // Write EOF record
        writeln!(writer, "{}", Record::end_of_file())?;
        writer.flush()?;

        debug!("Wrote {} data records", records);
        Ok(())
    }

    /// Creates a data buffer and its mask from the provided Intel HEX file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Example
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("fw.hex");
    /// std::fs::write(&path, ":0100CF00CF61\n:00000001FF\n").unwrap();
    ///
    /// let (data, mask) = ByteBuffer::from_intel_hex_file(&path, 0xFF).unwrap();
    ///
    /// assert_eq!(data.len(), 0xD0);
    /// assert_eq!(data.get(0x00), Some(0xFF));
    /// assert_eq!(data.get(0xCF), Some(0xCF));
    /// assert_eq!(mask.iter().filter(|&&b| b != 0).count(), 1);
    /// ```
    pub fn from_intel_hex_file<P: AsRef<Path>>(path: P, fill: u8) -> Result<(Self, Self)> {
        let mut data = Self::new(INITIAL_CAPACITY, fill)?;
        let mut mask = Self::new(INITIAL_CAPACITY, 0x00)?;
        data.read_intel_hex_file(path, Some(&mut mask))?;
        Ok((data, mask))
    }
}
