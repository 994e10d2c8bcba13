//! # `bufferlib`
//!
//! `bufferlib` is a Rust library for building up byte images in memory and moving them to and
//! from binary and Intel HEX files.
//!
//! The library provides:
//! - A growable byte buffer with fill-byte gap filling (via [`ByteBuffer`] struct).
//! - Reading and writing of I8HEX files, with a mask telling written bytes from holes.
//! - Reading and writing of raw binary files.
//! - Error handling with [`BufferError`].
//!
//! ## Example
//!
//! ```
//! use bufferlib::{ByteBuffer, HexWriteOptions};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("image.hex");
//!
//! let mut image = ByteBuffer::new(1024, 0xFF).unwrap();
//! image.write_long_be(0x100, 0xDEAD_BEEF).unwrap();
//! image.write_intel_hex_file(&path, None, &HexWriteOptions::new()).unwrap();
//!
//! let (readback, _mask) = ByteBuffer::from_intel_hex_file(&path, 0xFF).unwrap();
//! assert_eq!(readback, image);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod binio;
mod buffer;
pub mod conv;
mod error;
mod hexio;
mod record;

// Public APIs
pub use buffer::ByteBuffer;
pub use error::{BufferError, HexErrorKind, Result};
pub use hexio::{HexWriteOptions, MASK_HOLE_THRESHOLD};
pub use record::{HexCodec, RecordType};
