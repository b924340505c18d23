#![allow(clippy::unusual_byte_groupings)]

use super::*;

#[test]
#[cfg(not(feature = "no-std"))]
fn writing_bitpacked_integers_works() {
	let mut bitpacked_data = Vec::with_capacity(2);
	let mut bitpacker = MsbWriter::new(&mut bitpacked_data);

	macro_rules! write_value {
		($method:ident($($arg:expr),+)) => {
			eprintln!(
				"Bitpacker state before calling {}: {:?}",
				stringify!($method),
				bitpacker
			);

			bitpacker.$method($($arg),+).expect("No I/O error expected");
		};
	}

	write_value!(write_bits(0b1100, bit_width!(4)));
	write_value!(write_bit(true));
	write_value!(write_bits(0x5A, bit_width!(7)));
	// Garbage above the requested width must be masked off
	write_value!(write_bits(u64::MAX, bit_width!(2)));

	drop(bitpacker);

	assert_eq!(
		bitpacked_data,
		&[0b1100_1101, 0b1010_11_00],
		"Unexpected bitpack write result"
	);
}

#[test]
fn reading_bitpacked_integers_works() {
	let mut bitpacked_data = &[0b1100_1101, 0b1010_11_00][..];
	let mut bitpacker = MsbReader::new(&mut bitpacked_data);

	assert_eq!(
		bitpacker.read_bits(bit_width!(4)).expect("No EOF expected"),
		0b1100
	);
	assert!(bitpacker.read_bit().expect("No EOF expected"));
	assert_eq!(
		bitpacker.read_bits(bit_width!(7)).expect("No EOF expected"),
		0x5A
	);
	assert_eq!(
		bitpacker.read_bits(bit_width!(2)).expect("No EOF expected"),
		0b11
	);
	assert_eq!(
		bitpacker.read_bits(bit_width!(2)).expect("No EOF expected"),
		0,
		"The padding bits should read back as zeroes"
	);
	assert!(
		bitpacked_data.is_empty(),
		"All the bytes should have been read"
	);
}

#[test]
fn bit_order_is_msb_first() {
	let mut bitpacker = MsbReader::new(&[0b1010_0101][..]);

	for expected_bit in [true, false, true, false, false, true, false, true] {
		assert_eq!(
			bitpacker.read_bit().expect("No EOF expected"),
			expected_bit
		);
	}
}

#[test]
fn reading_zero_width_integer_works() {
	// Initialize the bitpacker to a state where lots of non-zero
	// bits are available. This should help catching non-conformances
	let mut bitpacker = MsbReader {
		current_byte: 0xFF,
		remaining_bits: 8,
		source: {
			#[cfg(not(feature = "no-std"))]
			{
				std::io::empty()
			}
			#[cfg(feature = "no-std")]
			{
				acid_io::empty()
			}
		}
	};

	assert_eq!(
		bitpacker
			.read_bits(BitWidth(0))
			.expect("No I/O error expected"),
		0
	);

	// Also assert that the internal bitpacker state is the same
	assert_eq!(bitpacker.current_byte, 0xFF, "Unexpected internal state");
	assert_eq!(bitpacker.remaining_bits, 8, "Unexpected internal state");
}

#[test]
#[cfg(not(feature = "no-std"))]
fn writing_zero_width_integers_does_nothing() {
	let mut dummy = Vec::new();
	let mut bitpacker = MsbWriter::new(&mut dummy);

	bitpacker
		.write_bits(u64::MAX, bit_width!(0))
		.expect("No I/O error expected");

	drop(bitpacker);

	assert!(
		dummy.is_empty(),
		"Some bytes were written to the sink when packing zero width integers"
	);
}

#[test]
#[cfg(not(feature = "no-std"))]
fn finalize_pads_the_last_byte_with_zeroes() {
	let mut bitpacked_data = Vec::new();
	let mut bitpacker = MsbWriter::new(&mut bitpacked_data);

	bitpacker
		.write_bits(0b101, bit_width!(3))
		.expect("No I/O error expected");
	bitpacker.finalize().expect("No I/O error expected");

	// Finalizing twice must not write the pending byte again
	bitpacker.finalize().expect("No I/O error expected");

	drop(bitpacker);

	assert_eq!(bitpacked_data, &[0b101_00000]);
}

#[test]
#[cfg(not(feature = "no-std"))]
fn wide_integers_round_trip_across_byte_boundaries() {
	const WIDE_VALUE: u64 = 0x0123_4567_89AB_CDEF;

	let mut bitpacked_data = Vec::new();
	let mut bitpacker = MsbWriter::new(&mut bitpacked_data);

	bitpacker
		.write_bits(0b101, bit_width!(3))
		.expect("No I/O error expected");
	bitpacker
		.write_bits(WIDE_VALUE, bit_width!(64))
		.expect("No I/O error expected");

	drop(bitpacker);

	// 3 + 64 bits, zero-padded to 9 bytes. The first byte holds the 3-bit
	// value followed by the 5 most significant bits of the wide value
	assert_eq!(bitpacked_data.len(), 9);
	assert_eq!(bitpacked_data[0], 0b101_00000);

	let mut bitpacker = MsbReader::new(&bitpacked_data[..]);
	assert_eq!(
		bitpacker.read_bits(bit_width!(3)).expect("No EOF expected"),
		0b101
	);
	assert_eq!(
		bitpacker
			.read_bits(bit_width!(64))
			.expect("No EOF expected"),
		WIDE_VALUE
	);
}
