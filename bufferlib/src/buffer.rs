//! The `buffer` module provides [`ByteBuffer`], a growable byte container with fill-byte
//! semantics.
//!
//! Every byte between the logical end of the buffer and the end of its allocation holds the
//! buffer's `fill` byte. Writes may land anywhere, even past the current capacity: the buffer
//! grows by repeated doubling and the gap between the old end and the write is padded with
//! `fill`. This makes the buffer a natural target for sparse formats such as Intel HEX.

use crate::error::{BufferError, Result};
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    /// Backing storage. Its length is the capacity; every byte is initialised.
    data: Vec<u8>,
    /// Logical extent of the buffer
    length: usize,
    /// Byte used to pad regions that are exposed but never written
    fill: u8,
}

impl<'a> IntoIterator for &'a ByteBuffer {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Allocates `size` bytes set to `fill`, reporting allocation failure instead of aborting.
fn alloc_filled(size: usize, fill: u8) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| BufferError::OutOfMemory { requested: size })?;
    data.resize(size, fill);
    Ok(data)
}

/// End offset of a block, or `OutOfMemory` if it does not fit in the address space.
fn block_end(offset: usize, count: usize) -> Result<usize> {
    offset
        .checked_add(count)
        .ok_or(BufferError::OutOfMemory {
            requested: usize::MAX,
        })
}

impl ByteBuffer {
    /// Creates an empty buffer with `initial_capacity` bytes allocated, all set to `fill`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the storage cannot be allocated.
    ///
    /// # Examples
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let buf = ByteBuffer::new(8, 0xFF).unwrap();
    /// assert_eq!(buf.len(), 0);
    /// assert_eq!(buf.capacity(), 8);
    /// assert_eq!(buf.storage(), &[0xFF; 8]);
    /// ```
    pub fn new(initial_capacity: usize, fill: u8) -> Result<Self> {
        Ok(Self {
            data: alloc_filled(initial_capacity, fill)?,
            length: 0,
            fill,
        })
    }

    /// Releases the storage and zeroes length, capacity and fill.
    ///
    /// The buffer stays usable: a later write simply grows it again from nothing.
    pub fn destroy(&mut self) {
        self.data = Vec::new();
        self.length = 0;
        self.fill = 0;
    }

    /// Deep copies `src` into `self`, including its fill byte.
    ///
    /// The existing allocation is reused when it is at least as large as `src`'s; otherwise
    /// it is released and a new one of `src`'s capacity is made. Bytes past the copied
    /// content are reset to the fill byte.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if a new allocation is needed and fails.
    pub fn copy_from(&mut self, src: &Self) -> Result<()> {
        if self.data.is_empty() || self.capacity() < src.capacity() {
            self.destroy();
            self.data = alloc_filled(src.capacity(), src.fill)?;
        }
        self.length = src.length;
        self.fill = src.fill;
        self.data[..src.length].copy_from_slice(src.as_slice());
        self.data[src.length..].fill(src.fill);
        Ok(())
    }

    /// Returns a deep copy of the buffer.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the copy cannot be allocated.
    pub fn try_clone(&self) -> Result<Self> {
        let mut dst = Self::default();
        dst.copy_from(self)?;
        Ok(dst)
    }

    /// Exchanges storage, length, capacity and fill with `other`. Nothing is copied.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Sets the length to zero and scrubs the whole allocation with the fill byte.
    pub fn zero_length(&mut self) {
        self.length = 0;
        self.data.fill(self.fill);
    }

    /// Logical length of the buffer in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of bytes currently allocated.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn fill(&self) -> u8 {
        self.fill
    }

    /// The logical contents, `[0, len)`.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Mutable view of the logical contents. The padding past `len` is not reachable here.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.length]
    }

    /// The whole allocation, `[0, capacity)`, padding included.
    #[must_use]
    pub fn storage(&self) -> &[u8] {
        &self.data
    }

    /// Byte at `offset`, if it lies inside the logical contents.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u8> {
        self.as_slice().get(offset).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.into_iter()
    }

    /// Grows the allocation by doubling until it holds `end` bytes.
    fn ensure_capacity(&mut self, end: usize) -> Result<()> {
        let old_capacity = self.data.len();
        if end <= old_capacity {
            return Ok(());
        }

        let mut new_capacity = old_capacity.max(1);
        while new_capacity < end {
            new_capacity = new_capacity
                .checked_mul(2)
                .ok_or(BufferError::OutOfMemory { requested: end })?;
        }

        self.data
            .try_reserve_exact(new_capacity - old_capacity)
            .map_err(|_| BufferError::OutOfMemory {
                requested: new_capacity,
            })?;
        self.data.resize(new_capacity, self.fill);

        trace!("Grew buffer from {} to {} bytes", old_capacity, new_capacity);
        Ok(())
    }

    /// Makes room for a `count`-byte write at `offset` and returns the end of the block.
    ///
    /// There are three possibilities:
    /// - the block starts at or after the current end: grow if needed and pad the gap
    /// - the block starts inside and ends outside: grow if needed
    /// - the block ends inside: nothing to do
    fn maybe_reallocate(&mut self, offset: usize, count: usize) -> Result<usize> {
        let end = block_end(offset, count)?;
        if offset >= self.length {
            self.ensure_capacity(end)?;
            self.data[self.length..offset].fill(self.fill);
            self.length = end;
        } else if end > self.length {
            self.ensure_capacity(end)?;
            self.length = end;
        }
        Ok(end)
    }

    /// Appends a single byte.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        self.append_block(&[byte])
    }

    /// Appends a 16-bit word, least significant byte first.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_word_le(&mut self, word: u16) -> Result<()> {
        self.append_block(&word.to_le_bytes())
    }

    /// Appends a 16-bit word, most significant byte first.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_word_be(&mut self, word: u16) -> Result<()> {
        self.append_block(&word.to_be_bytes())
    }

    /// Appends a 32-bit word, least significant byte first.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_long_le(&mut self, lword: u32) -> Result<()> {
        self.append_block(&lword.to_le_bytes())
    }

    /// Appends a 32-bit word, most significant byte first.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_long_be(&mut self, lword: u32) -> Result<()> {
        self.append_block(&lword.to_be_bytes())
    }

    /// Appends `count` copies of `value`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn append_const(&mut self, value: u8, count: usize) -> Result<()> {
        let end = block_end(self.length, count)?;
        self.ensure_capacity(end)?;
        self.data[self.length..end].fill(value);
        self.length = end;
        Ok(())
    }

    /// Appends a block of bytes.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    ///
    /// # Examples
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let mut buf = ByteBuffer::new(8, 0x00).unwrap();
    /// buf.append_block(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
    ///
    /// assert_eq!(buf.len(), 9);
    /// assert_eq!(buf.capacity(), 16);
    /// ```
    pub fn append_block(&mut self, bytes: &[u8]) -> Result<()> {
        let end = block_end(self.length, bytes.len())?;
        self.ensure_capacity(end)?;
        self.data[self.length..end].copy_from_slice(bytes);
        self.length = end;
        Ok(())
    }

    /// Writes a single byte at `offset`, which may be past the end (or the capacity).
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_byte(&mut self, offset: usize, byte: u8) -> Result<()> {
        self.write_block(offset, &[byte])
    }

    /// Writes a 16-bit little-endian word at `offset`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_word_le(&mut self, offset: usize, word: u16) -> Result<()> {
        self.write_block(offset, &word.to_le_bytes())
    }

    /// Writes a 16-bit big-endian word at `offset`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_word_be(&mut self, offset: usize, word: u16) -> Result<()> {
        self.write_block(offset, &word.to_be_bytes())
    }

    /// Writes a 32-bit little-endian word at `offset`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_long_le(&mut self, offset: usize, lword: u32) -> Result<()> {
        self.write_block(offset, &lword.to_le_bytes())
    }

    /// Writes a 32-bit big-endian word at `offset`.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_long_be(&mut self, offset: usize, lword: u32) -> Result<()> {
        self.write_block(offset, &lword.to_be_bytes())
    }

    /// Sets `count` bytes starting at `offset` to `value`. A zero count does nothing, whatever
    /// the offset.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    pub fn write_const(&mut self, offset: usize, value: u8, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let end = self.maybe_reallocate(offset, count)?;
        self.data[offset..end].fill(value);
        Ok(())
    }

    /// Copies `bytes` into the buffer at `offset`. Any gap between the current end and
    /// `offset` is padded with the fill byte. An empty block does nothing, whatever the
    /// offset.
    ///
    /// # Errors
    /// Returns [`BufferError::OutOfMemory`] if the buffer cannot grow.
    ///
    /// # Examples
    /// ```
    /// use bufferlib::ByteBuffer;
    ///
    /// let mut buf = ByteBuffer::new(4, 0xFF).unwrap();
    /// buf.write_block(6, &[0xAA, 0xBB]).unwrap();
    ///
    /// assert_eq!(buf.as_slice(), &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xAA, 0xBB]);
    /// assert_eq!(buf.capacity(), 8);
    /// ```
    pub fn write_block(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let end = self.maybe_reallocate(offset, bytes.len())?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_DATA: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    /// Buffer of capacity 8 holding `INIT_DATA`
    fn get_full_buffer(fill: u8) -> ByteBuffer {
        let mut buf = ByteBuffer::new(8, fill).unwrap();
        buf.append_block(&INIT_DATA).unwrap();
        buf
    }

    #[test]
    fn test_new_fills_whole_capacity() {
        for fill in [0x00, 0xFF] {
            // Act
            let buf = ByteBuffer::new(8, fill).unwrap();

            // Assert
            assert_eq!(buf.len(), 0);
            assert!(buf.is_empty());
            assert_eq!(buf.capacity(), 8);
            assert_eq!(buf.fill(), fill);
            assert_eq!(buf.storage(), &[fill; 8]);
        }
    }

    #[test]
    fn test_append_block_small() {
        // Arrange
        let mut buf = ByteBuffer::new(8, 0).unwrap();

        // Act
        buf.append_block(&[1, 2, 3, 4]).unwrap();

        // Assert
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.storage(), &[1, 2, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_append_block_exact_capacity() {
        // Arrange
        let mut buf = ByteBuffer::new(8, 0).unwrap();

        // Act
        buf.append_block(&INIT_DATA).unwrap();

        // Assert
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.len(), 8);
        assert_eq!(buf.storage(), &INIT_DATA);
    }

    #[test]
    fn test_append_block_grows_by_doubling() {
        for (initial, fill) in [(8, 0x00), (4, 0x00), (4, 0xFF)] {
            // Arrange
            let mut buf = ByteBuffer::new(initial, fill).unwrap();
            let mut expected = vec![1, 2, 3, 4, 5, 6, 7, 8, 9];
            expected.resize(16, fill);

            // Act
            buf.append_block(&expected[..9]).unwrap();

            // Assert
            assert_eq!(buf.capacity(), 16);
            assert_eq!(buf.len(), 9);
            assert_eq!(buf.storage(), expected.as_slice());
        }
    }

    #[test]
    fn test_append_byte() {
        // Arrange
        let mut buf = ByteBuffer::new(4, 0).unwrap();

        // Act
        for byte in 1..=9 {
            buf.append_byte(byte).unwrap();
        }

        // Assert
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.len(), 9);
        assert_eq!(
            buf.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_append_words() {
        // Arrange
        let words = [0xDEAD, 0xCAFE, 0xF00D, 0xBABE, 0x1234];
        let mut le = ByteBuffer::new(4, 0xAA).unwrap();
        let mut be = ByteBuffer::new(4, 0xAA).unwrap();

        // Act
        for word in words {
            le.append_word_le(word).unwrap();
            be.append_word_be(word).unwrap();
        }

        // Assert
        assert_eq!((le.capacity(), le.len()), (16, 10));
        assert_eq!((be.capacity(), be.len()), (16, 10));
        assert_eq!(
            le.storage(),
            &[
                0xAD, 0xDE, 0xFE, 0xCA, 0x0D, 0xF0, 0xBE, 0xBA, 0x34, 0x12, 0xAA, 0xAA, 0xAA,
                0xAA, 0xAA, 0xAA
            ]
        );
        assert_eq!(
            be.storage(),
            &[
                0xDE, 0xAD, 0xCA, 0xFE, 0xF0, 0x0D, 0xBA, 0xBE, 0x12, 0x34, 0xAA, 0xAA, 0xAA,
                0xAA, 0xAA, 0xAA
            ]
        );
    }

    #[test]
    fn test_append_longs() {
        // Arrange
        let lwords = [0xCAFE_BABE, 0xDEAD_F00D, 0x1234_5678];
        let mut le = ByteBuffer::new(4, 0xAA).unwrap();
        let mut be = ByteBuffer::new(4, 0xAA).unwrap();

        // Act
        for lword in lwords {
            le.append_long_le(lword).unwrap();
            be.append_long_be(lword).unwrap();
        }

        // Assert
        assert_eq!((le.capacity(), le.len()), (16, 12));
        assert_eq!(
            le.storage(),
            &[
                0xBE, 0xBA, 0xFE, 0xCA, 0x0D, 0xF0, 0xAD, 0xDE, 0x78, 0x56, 0x34, 0x12, 0xAA,
                0xAA, 0xAA, 0xAA
            ]
        );
        assert_eq!(
            be.storage(),
            &[
                0xCA, 0xFE, 0xBA, 0xBE, 0xDE, 0xAD, 0xF0, 0x0D, 0x12, 0x34, 0x56, 0x78, 0xAA,
                0xAA, 0xAA, 0xAA
            ]
        );
    }

    #[test]
    fn test_append_const() {
        // Each tuple = (initial capacity, count, expected capacity)
        let cases = [(8, 4, 8), (8, 6, 8), (8, 9, 16), (4, 14, 16)];

        for (initial, count, expected_capacity) in cases {
            // Arrange
            let mut buf = ByteBuffer::new(initial, 0).unwrap();

            // Act
            buf.append_const(0x09, count).unwrap();

            // Assert
            assert_eq!(buf.capacity(), expected_capacity);
            assert_eq!(buf.len(), count);
            assert!(buf.as_slice().iter().all(|&b| b == 0x09));
            assert!(buf.storage()[count..].iter().all(|&b| b == 0x00));
        }
    }

    #[test]
    fn test_append_const_huge() {
        // Arrange
        let mut buf = ByteBuffer::new(4, 0).unwrap();

        // Act
        buf.append_const(0x09, 0x18000).unwrap();

        // Assert
        assert_eq!(buf.capacity(), 0x20000);
        assert_eq!(buf.len(), 0x18000);
        assert!(buf.as_slice().iter().all(|&b| b == 0x09));
        assert!(buf.storage()[0x18000..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_write_block_inside() {
        // Arrange
        let mut buf = get_full_buffer(0);

        // Act
        buf.write_block(4, &[1, 2, 3, 4]).unwrap();

        // Assert
        assert_eq!((buf.capacity(), buf.len()), (8, 8));
        assert_eq!(buf.storage(), &[1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn test_write_block_outside() {
        // Arrange
        let mut buf = get_full_buffer(0);

        // Act
        buf.write_block(12, &[1, 2, 3, 4]).unwrap();

        // Assert
        assert_eq!((buf.capacity(), buf.len()), (16, 16));
        assert_eq!(
            buf.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_write_block_straddled() {
        // Arrange
        let mut buf = get_full_buffer(0);

        // Act
        buf.write_block(7, &[1, 2, 3, 4]).unwrap();

        // Assert
        assert_eq!((buf.capacity(), buf.len()), (16, 11));
        assert_eq!(
            buf.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 1, 2, 3, 4, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_write_const_inside_outside_straddled() {
        // Each tuple = (offset, expected length, expected capacity, expected storage)
        let cases: [(usize, usize, usize, &[u8]); 3] = [
            (4, 8, 8, &[1, 2, 3, 4, 9, 9, 9, 9]),
            (12, 16, 16, &[1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, 9, 9, 9, 9]),
            (7, 11, 16, &[1, 2, 3, 4, 5, 6, 7, 9, 9, 9, 9, 0, 0, 0, 0, 0]),
        ];

        for (offset, length, capacity, expected) in cases {
            // Arrange
            let mut buf = get_full_buffer(0);

            // Act
            buf.write_const(offset, 9, 4).unwrap();

            // Assert
            assert_eq!(buf.len(), length);
            assert_eq!(buf.capacity(), capacity);
            assert_eq!(buf.storage(), expected);
        }
    }

    #[test]
    fn test_write_words() {
        // Arrange
        let mut inside = get_full_buffer(9);
        let mut outside = get_full_buffer(9);
        let mut straddled = get_full_buffer(9);

        // Act
        inside.write_word_le(4, 0xDEAD).unwrap();
        outside.write_word_be(12, 0xDEAD).unwrap();
        straddled.write_word_le(7, 0xDEAD).unwrap();

        // Assert
        assert_eq!((inside.capacity(), inside.len()), (8, 8));
        assert_eq!(inside.storage(), &[1, 2, 3, 4, 0xAD, 0xDE, 7, 8]);

        assert_eq!((outside.capacity(), outside.len()), (16, 14));
        assert_eq!(
            outside.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 9, 0xDE, 0xAD, 9, 9]
        );

        assert_eq!((straddled.capacity(), straddled.len()), (16, 9));
        assert_eq!(
            straddled.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 0xAD, 0xDE, 9, 9, 9, 9, 9, 9, 9]
        );
    }

    #[test]
    fn test_write_longs() {
        // Arrange
        let mut inside = get_full_buffer(9);
        let mut outside = get_full_buffer(9);
        let mut straddled = get_full_buffer(9);

        // Act
        inside.write_long_be(4, 0xCAFE_BABE).unwrap();
        outside.write_long_le(12, 0xCAFE_BABE).unwrap();
        straddled.write_long_be(7, 0xCAFE_BABE).unwrap();

        // Assert
        assert_eq!((inside.capacity(), inside.len()), (8, 8));
        assert_eq!(inside.storage(), &[1, 2, 3, 4, 0xCA, 0xFE, 0xBA, 0xBE]);

        assert_eq!((outside.capacity(), outside.len()), (16, 16));
        assert_eq!(
            outside.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9, 9, 0xBE, 0xBA, 0xFE, 0xCA]
        );

        assert_eq!((straddled.capacity(), straddled.len()), (16, 11));
        assert_eq!(
            straddled.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 0xCA, 0xFE, 0xBA, 0xBE, 9, 9, 9, 9, 9]
        );
    }

    #[test]
    fn test_write_byte_far_past_capacity() {
        // Arrange
        let mut buf = ByteBuffer::new(1024, 0x00).unwrap();
        buf.append_block(&[0xAA; 3]).unwrap();

        // Act
        buf.write_byte(0x0BE1, 0x75).unwrap();

        // Assert
        assert_eq!(buf.capacity(), 4096);
        assert_eq!(buf.len(), 0x0BE2);
        assert_eq!(buf.get(0x0BE1), Some(0x75));
        assert!(buf.as_slice()[3..0x0BE1].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_zero_count_writes_are_noops() {
        // Arrange
        let mut buf = get_full_buffer(0);
        let before = buf.clone();

        // Act
        let res_block = buf.write_block(usize::MAX, &[]);
        let res_const = buf.write_const(usize::MAX, 0x55, 0);

        // Assert
        assert!(res_block.is_ok());
        assert!(res_const.is_ok());
        assert_eq!(buf, before);
    }

    #[test]
    fn test_write_overflowing_offset_is_out_of_memory() {
        // Arrange
        let mut buf = get_full_buffer(0);

        // Act
        let res = buf.write_long_le(usize::MAX - 1, 0);

        // Assert
        assert!(matches!(res, Err(BufferError::OutOfMemory { .. })));
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_zero_length_scrubs_whole_capacity() {
        // Arrange
        let mut buf = get_full_buffer(0);

        // Act
        buf.zero_length();

        // Assert
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.storage(), &[0; 8]);
    }

    #[test]
    fn test_copy_from_into_empty() {
        // Arrange
        let mut src = ByteBuffer::new(8, 23).unwrap();
        src.append_block(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        let mut dst = ByteBuffer::default();

        // Act
        dst.copy_from(&src).unwrap();

        // Assert
        assert_eq!(dst.capacity(), 16);
        assert_eq!(dst.len(), 9);
        assert_eq!(dst.fill(), 23);
        assert_eq!(
            dst.storage(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 23, 23, 23, 23, 23, 23, 23]
        );
    }

    #[test]
    fn test_copy_from_reallocates_small_destination() {
        // Arrange
        let mut src = ByteBuffer::new(8, 23).unwrap();
        src.append_block(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        let mut dst = ByteBuffer::new(8, 23).unwrap();

        // Act
        dst.copy_from(&src).unwrap();

        // Assert
        assert_eq!(dst.capacity(), 16);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_copy_from_reuses_large_destination() {
        // Arrange
        let mut src = ByteBuffer::new(4, 23).unwrap();
        src.append_block(&[1, 2, 3]).unwrap();
        let mut dst = ByteBuffer::new(16, 0x55).unwrap();
        dst.append_block(&[0xEE; 12]).unwrap();

        // Act
        dst.copy_from(&src).unwrap();

        // Assert
        assert_eq!(dst.capacity(), 16);
        assert_eq!(dst.len(), 3);
        assert_eq!(dst.fill(), 23);
        assert_eq!(&dst.storage()[..3], &[1, 2, 3]);
        assert!(dst.storage()[3..].iter().all(|&b| b == 23));
    }

    #[test]
    fn test_try_clone_is_independent() {
        // Arrange
        let src = get_full_buffer(0);

        // Act
        let mut copy = src.try_clone().unwrap();
        copy.write_byte(0, 0xFF).unwrap();

        // Assert
        assert_eq!(src.get(0), Some(1));
        assert_eq!(copy.get(0), Some(0xFF));
    }

    #[test]
    fn test_swap() {
        // Arrange
        let mut x = ByteBuffer::new(4, 9).unwrap();
        let mut y = ByteBuffer::new(4, 8).unwrap();
        for byte in [1, 2, 3] {
            x.append_byte(byte).unwrap();
        }
        for byte in [6, 5, 4, 3, 2, 1] {
            y.append_byte(byte).unwrap();
        }

        // Act
        x.swap(&mut y);

        // Assert
        assert_eq!((x.capacity(), x.len(), x.fill()), (8, 6, 8));
        assert_eq!(x.storage(), &[6, 5, 4, 3, 2, 1, 8, 8]);
        assert_eq!((y.capacity(), y.len(), y.fill()), (4, 3, 9));
        assert_eq!(y.storage(), &[1, 2, 3, 9]);

        // No aliasing after the swap
        x.write_byte(0, 0x00).unwrap();
        assert_eq!(y.get(0), Some(1));
    }

    #[test]
    fn test_destroy_then_reuse() {
        // Arrange
        let mut buf = get_full_buffer(0xFF);

        // Act
        buf.destroy();

        // Assert
        assert_eq!((buf.capacity(), buf.len(), buf.fill()), (0, 0, 0));

        // A destroyed buffer grows again from nothing
        buf.append_block(&[1, 2, 3]).unwrap();
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.storage(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_as_mut_slice_only_reaches_contents() {
        // Arrange
        let mut buf = ByteBuffer::new(8, 0xFF).unwrap();
        buf.append_block(&[1, 2]).unwrap();

        // Act
        buf.as_mut_slice().fill(0);

        // Assert
        assert_eq!(buf.storage(), &[0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(buf.iter().count(), 2);
    }
}
