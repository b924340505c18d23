//! This crate implements a big-endian (MSB-first) bitpacking convention over
//! byte-oriented transports.
//!
//! # Overview
//!
//! MSB-first bitpacking is a simple means of efficiently writing and reading
//! sequences of arbitrary-width integers in byte streams: the bits of each
//! integer are stored consecutively, starting at the most significant bit of
//! the first incomplete byte, without any padding or alignment between values.
//!
//! The convention adds no header or field delimiting overhead: a bitpacked
//! stream is a sequence of raw, unstructured bits without an intrinsic
//! interpretation, and any sequence of bits is a valid bitpacked stream. It is
//! the responsibility of writers and readers to agree on some protocol for
//! interpreting the data. This makes the convention a natural fit for
//! variable-length prefix codes, whose codewords carry their own boundaries.
//!
//! Integers of 0 to 64 bits are supported. Writing stores the `width` least
//! significant bits of a value, highest bit first; reading consumes bits in
//! the same order. Reading or writing a 0-bit wide integer is a no-op that
//! always succeeds.
//!
//! # `#![no_std]` compatibility
//!
//! By default, this crate depends on the Rust standard library, but it is
//! compatible with `#![no_std]` environments when the optional `no-std`
//! feature is enabled.
//!
//! # Example
//!
//! ```
//! # fn main() -> std::io::Result<()> {
//! use std::io::Cursor;
//! use msb_bitpack::{bit_width, MsbReader, MsbWriter};
//!
//! let mut buf = Vec::new();
//!
//! // Write bitpacked integers
//! let mut bitpacker = MsbWriter::new(&mut buf);
//! bitpacker.write_bits(0b1100, bit_width!(4))?;
//! bitpacker.write_bit(true)?;
//! bitpacker.write_bits(0x5A, bit_width!(7))?;
//! bitpacker.finalize()?; // Zero-pads and writes the incomplete last byte
//! drop(bitpacker);
//!
//! // The buffer should have all the integer bits concatenated together as
//! // tightly as possible, highest bits first
//! assert_eq!(buf, [0b1100_1101, 0b1010_0000]);
//!
//! // Read them back
//! let mut bitpacker = MsbReader::new(Cursor::new(&buf));
//! assert_eq!(bitpacker.read_bits(bit_width!(4))?, 0b1100);
//! assert!(bitpacker.read_bit()?);
//! assert_eq!(bitpacker.read_bits(bit_width!(7))?, 0x5A);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(feature = "no-std", no_std)]
#![forbid(unsafe_code)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![forbid(rustdoc::broken_intra_doc_links)]

use core::cmp;

#[cfg(not(feature = "no-std"))]
use std::io::{Read, Result, Write};

#[cfg(feature = "no-std")]
use acid_io::{Read, Result, Write};

#[cfg(test)]
mod test;

/// A newtype that holds the width of an integer that can be read or written in
/// the MSB-first bitpack format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BitWidth(u8);

impl BitWidth {
	/// Wraps `width` in this newtype, returning `None` if `width` exceeds the
	/// maximum value of 64.
	pub const fn new(width: u8) -> Option<Self> {
		if width <= 64 { Some(Self(width)) } else { None }
	}

	/// Unwraps the integer width contained by this newtype.
	pub const fn get(self) -> u8 {
		self.0
	}

	/// Creates a newtype that wraps the specified `width`, without checking
	/// that it is in the expected range.
	///
	/// **This function is a macro implementation detail and end-users will
	/// never need to invoke it directly**. It is not considered part of the
	/// public API, so any changes to it, including its removal, will not be
	/// considered breaking changes, and may not be mentioned in changelogs or
	/// other documentation.
	#[doc(hidden)]
	pub const fn __internal_unchecked_new(width: u8) -> Self {
		Self(width)
	}
}

/// Creates a [`BitWidth`] from a width that is statically checked at build
/// time to be valid.
#[macro_export]
macro_rules! bit_width {
	($width:expr) => {{
		const _: [(); 64 - $width as usize] = [(); 64 - $width as usize];
		$crate::BitWidth::__internal_unchecked_new($width)
	}};
}

/// Wraps a byte source to read variable-width integers from it, packed in
/// MSB-first order.
#[derive(Debug)]
pub struct MsbReader<R: Read> {
	current_byte: u8,
	remaining_bits: u8,
	source: R
}

impl<R: Read> MsbReader<R> {
	/// Constructs a MSB-first bitpack reader that will read variable-width
	/// integers from the specified byte source.
	///
	/// The bitpack reader may end up reading small amounts of bytes fairly
	/// frequently. Therefore, for top performance it is recommended to use
	/// buffered byte sources.
	pub fn new(source: R) -> Self {
		Self {
			current_byte: 0,
			remaining_bits: 0,
			source
		}
	}

	/// Reads a single bit from the source associated to this bitpack reader.
	///
	/// `true` is returned if that bit is equal to 1; `false` otherwise.
	pub fn read_bit(&mut self) -> Result<bool> {
		if self.remaining_bits == 0 {
			self.source
				.read_exact(core::slice::from_mut(&mut self.current_byte))?;
			self.remaining_bits = 8;
		}

		self.remaining_bits -= 1;
		Ok(self.current_byte >> self.remaining_bits & 1 != 0)
	}

	/// Reads a single bitpacked unsigned integer of the specified width from
	/// the source associated to this bitpack reader, most significant bit
	/// first.
	pub fn read_bits(&mut self, width: BitWidth) -> Result<u64> {
		let mut result = 0;
		let mut remaining_bits = width.get();

		while remaining_bits > 0 {
			if self.remaining_bits == 0 {
				// Reading bytes one by one lets buffered sources leverage
				// small-copy optimizations in the standard library, avoiding a
				// memcpy call per read. Unbuffered sources where every
				// read_exact call translates to a syscall will perform
				// significantly worse, but client code should not be using
				// such sources anyway
				self.source
					.read_exact(core::slice::from_mut(&mut self.current_byte))?;
				self.remaining_bits = 8;
			}

			let chunk_bits = cmp::min(remaining_bits, self.remaining_bits);
			self.remaining_bits -= chunk_bits;
			let chunk = self.current_byte >> self.remaining_bits & ones_mask(chunk_bits);
			result = result << chunk_bits | chunk as u64;
			remaining_bits -= chunk_bits;
		}

		Ok(result)
	}

	/// Consumes and tears down this bitpack reader, returning the underlying
	/// byte source.
	///
	/// This is an one-way operation: any information about what particular bit
	/// this bitpack reader is pointing to within the last byte read from the
	/// source will be lost. In other words, constructing another [`MsbReader`]
	/// with the returned byte source is not guaranteed to keep the bitstream
	/// sync.
	pub fn into_inner(self) -> R {
		self.source
	}
}

/// Wraps a byte sink to write variable-width integers to it, packed in
/// MSB-first order.
#[derive(Debug)]
pub struct MsbWriter<W: Write> {
	pending_byte: u8,
	pending_bits: u8,
	sink: W
}

impl<W: Write> MsbWriter<W> {
	/// Constructs a MSB-first bitpack writer that will write variable-width
	/// integers to the specified byte sink.
	///
	/// The bitpack writer may end up writing small amounts of bytes fairly
	/// frequently. Therefore, for top performance it is recommended to use
	/// buffered byte sinks.
	pub fn new(sink: W) -> Self {
		Self {
			pending_byte: 0,
			pending_bits: 0,
			sink
		}
	}

	/// Writes the `width` least significant bits of the specified integer to
	/// the sink associated to this bitpack writer, most significant of those
	/// bits first.
	///
	/// It may happen that the bitpacker does not immediately write every bit
	/// to the sink, in order to complete the last byte with further data. The
	/// [`finalize`](Self::finalize) method forces any pending bits to be
	/// written immediately, but beware that a reader will have to skip the
	/// padding bits in the potentially incomplete last byte to keep bitstream
	/// sync.
	pub fn write_bits(&mut self, value: u64, width: BitWidth) -> Result<()> {
		let mut remaining_bits = width.get();

		// First, top up the pending byte with the most significant of the
		// requested bits
		let free_bits = 8 - self.pending_bits;
		let head_bits = cmp::min(remaining_bits, free_bits);
		if head_bits > 0 {
			let head = (value >> (remaining_bits - head_bits)) as u8 & ones_mask(head_bits);
			self.pending_byte |= head << (free_bits - head_bits);
			self.pending_bits += head_bits;
			remaining_bits -= head_bits;
		}

		// If the pending byte is now complete, write it to the sink
		if self.pending_bits == 8 {
			self.sink.write_all(&[self.pending_byte])?;
			self.pending_byte = 0;
			self.pending_bits = 0;
		}

		// If all the bits made it to the pending byte, there is nothing else
		// to do
		if remaining_bits == 0 {
			return Ok(());
		}

		// The pending byte is empty at this point. Write whole bytes straight
		// to the sink, most significant chunk first. We write bytes one by one
		// because that generates more efficient machine code for the buffered
		// sinks we should be using; read the similar comment at
		// MsbReader::read_bits for more details
		while remaining_bits >= 8 {
			remaining_bits -= 8;
			self.sink.write_all(&[(value >> remaining_bits) as u8])?;
		}

		// Park the leftover low bits at the top of the pending byte
		if remaining_bits > 0 {
			self.pending_byte = (value as u8 & ones_mask(remaining_bits)) << (8 - remaining_bits);
			self.pending_bits = remaining_bits;
		}

		Ok(())
	}

	/// Writes a single bit to the sink associated to this bitpack writer.
	///
	/// `true` is converted to 1, and `false` to 0.
	pub fn write_bit(&mut self, bit: bool) -> Result<()> {
		self.write_bits(bit as u64, bit_width!(1))
	}

	/// Immediately writes any bits that did not yet complete a byte, padding
	/// that byte with zeroes in the least significant positions.
	///
	/// The bitpack writer is automatically finalized when it is dropped, so
	/// this method usually does not need to be called, unless you need to know
	/// whether the finalization is successful.
	///
	/// Note that finalizing the bitpack writer does not flush the wrapped byte
	/// sink. Any bytes written by this method are only guaranteed to have
	/// reached their destination after a call to [`flush`](Self::flush).
	pub fn finalize(&mut self) -> Result<()> {
		if self.pending_bits > 0 {
			let padded_byte = self.pending_byte;
			self.pending_byte = 0;
			self.pending_bits = 0;
			self.sink.write_all(&[padded_byte])
		} else {
			Ok(())
		}
	}

	/// Flushes the wrapped byte sink.
	///
	/// This method will not force writing out any bits that did not yet made
	/// it to a completed byte. To do that, use [`finalize`](Self::finalize).
	pub fn flush(&mut self) -> Result<()> {
		self.sink.flush()
	}
}

impl<W: Write> Drop for MsbWriter<W> {
	fn drop(&mut self) {
		self.finalize().ok();
	}
}

/// Returns an 8-bit binary mask that has its `width` least significant bits
/// set to 1, and the remaining bits set to 0.
///
/// # Preconditions
/// `width` is less than or equal to 8.
const fn ones_mask(width: u8) -> u8 {
	((1u16 << width) - 1) as u8
}
