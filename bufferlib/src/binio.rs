//! Raw binary file I/O for [`ByteBuffer`].

use crate::buffer::ByteBuffer;
use crate::error::{BufferError, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

impl ByteBuffer {
    /// Appends the whole contents of a binary file to the end of the buffer.
    ///
    /// # Errors
    /// - Returns [`BufferError::FileOpen`], [`BufferError::Seek`] or [`BufferError::Tell`] if
    ///   the file cannot be opened or measured
    /// - Returns [`BufferError::UnexpectedEof`] if the file shrinks while being read
    /// - Returns [`BufferError::ReadOrWrite`] if reading fails
    ///
    /// # Example
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("blob.bin");
    /// std::fs::write(&path, b"abc").unwrap();
    ///
    /// let mut buf = ByteBuffer::new(4, 0x00).unwrap();
    /// buf.append_from_binary_file(&path).unwrap();
    /// buf.append_from_binary_file(&path).unwrap();
    ///
    /// assert_eq!(buf.as_slice(), b"abcabc");
    /// ```
    pub fn append_from_binary_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Appending binary file {:?}", path);

        let mut file = File::open(path).map_err(|source| BufferError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        // Measure the file
        file.seek(SeekFrom::End(0))
            .map_err(|source| BufferError::Seek {
                path: path.to_path_buf(),
                source,
            })?;
        let length = file.stream_position().map_err(|source| BufferError::Tell {
            path: path.to_path_buf(),
            source,
        })?;
        let length = usize::try_from(length).map_err(|_| BufferError::OutOfMemory {
            requested: usize::MAX,
        })?;
        file.rewind().map_err(|source| BufferError::Seek {
            path: path.to_path_buf(),
            source,
        })?;

        // Make room, then read over the padding
        let start = self.len();
        self.append_const(self.fill(), length)?;
        let dest = &mut self.as_mut_slice()[start..];

        let mut read = 0;
        while read < length {
            match file.read(&mut dest[read..]) {
                Ok(0) => {
                    return Err(BufferError::UnexpectedEof {
                        read,
                        expected: length,
                    });
                }
                Ok(n) => read += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(BufferError::ReadOrWrite(err)),
            }
        }

        debug!("Appended {} bytes from {:?}", length, path);
        Ok(())
    }

    /// Writes `count` bytes starting at `offset` to a binary file, replacing it.
    ///
    /// # Errors
    /// - Returns [`BufferError::RangeOutOfBounds`] if the range does not lie inside `len()`;
    ///   the file is left untouched in that case
    /// - Returns [`BufferError::FileOpen`] if the file cannot be created
    /// - Returns [`BufferError::ReadOrWrite`] if writing fails
    pub fn write_binary_file<P: AsRef<Path>>(
        &self,
        path: P,
        offset: usize,
        count: usize,
    ) -> Result<()> {
        let path = path.as_ref();
        let range_err = || BufferError::RangeOutOfBounds {
            offset,
            count,
            length: self.len(),
        };
        let end = offset.checked_add(count).ok_or_else(range_err)?;
        let bytes = self.as_slice().get(offset..end).ok_or_else(range_err)?;

        debug!("Writing {} bytes to binary file {:?}", count, path);

        let mut file = File::create(path).map_err(|source| BufferError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        file.write_all(bytes)?;
        file.flush()?;

        Ok(())
    }

    /// Creates a buffer holding the contents of a binary file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn from_binary_file<P: AsRef<Path>>(path: P, fill: u8) -> Result<Self> {
        let mut buf = Self::new(0, fill)?;
        buf.append_from_binary_file(path)?;
        Ok(buf)
    }
}
