//! Contains the rank codebook abstractions and related entropy coding
//! functions.

use std::io;

use indexmap::IndexMap;
use log::debug;
use msb_bitpack::{BitWidth, MsbReader};

use super::BlockFrequencies;
use crate::rank::{COMBINATIONS_PER_SHAPE, ITERATIONS_PER_SHAPE, SHAPE_COUNT};
use huffman_tree::HuffmanTree;

mod huffman_tree;

/// A prefix codeword: up to 64 bits plus an explicit length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Codeword {
	/// The codeword bits, in the least significant positions, most
	/// significant bit of the codeword first.
	pub bits: u64,
	/// The codeword length, in bits.
	pub length: u8
}

impl Codeword {
	/// Returns the width of this codeword, for bitpacking purposes.
	pub fn width(self) -> BitWidth {
		// Unwrap is safe: a codeword longer than 64 bits would need a leaf
		// whose subtree counts grow slower than the Fibonacci sequence over
		// 64 merges, which no physically storable input can produce
		BitWidth::new(self.length).unwrap()
	}
}

/// A prefix codebook over one symbol alphabet, used for lossless entropy
/// coding of one component of a block rank.
///
/// A codebook is built from an observed symbol frequency map, restricted to
/// the codebook's declared alphabet. When fewer than two alphabet symbols
/// were observed no codebook is built and the codebook is said to be
/// *suppressed*: the codeword of a lone symbol would be zero bits long, so
/// writing nothing at all is bit-equivalent and both stream ends know it.
pub struct Codebook {
	codewords: Vec<Option<Codeword>>,
	huffman_tree: HuffmanTree
}

impl Codebook {
	/// Builds the codebook for the symbols of `frequencies` that fall within
	/// the alphabet `0..alphabet_size`, or `None` if fewer than two such
	/// symbols were observed.
	///
	/// Leaves enter the Huffman merge in ascending symbol order, stably
	/// sorted by ascending count, so equal-count symbols are assigned
	/// reproducible codewords on every build.
	pub fn from_frequencies(
		frequencies: &IndexMap<u16, u64>,
		alphabet_size: u16
	) -> Option<Self> {
		let mut leaves: Vec<(u16, u64)> = frequencies
			.iter()
			.filter(|(symbol, _)| **symbol < alphabet_size)
			.map(|(symbol, count)| (*symbol, *count))
			.collect();

		if leaves.len() < 2 {
			return None;
		}

		leaves.sort_unstable_by_key(|(symbol, _)| *symbol);
		// Stable, so the ascending symbol order above survives among ties
		leaves.sort_by_key(|(_, count)| *count);

		let huffman_tree = HuffmanTree::from_sorted_leaves(&leaves);

		let mut codewords = vec![None; alphabet_size as usize];
		huffman_tree.assign_codewords(&mut |symbol, codeword| {
			codewords[symbol as usize] = Some(codeword);
		});

		Some(Self {
			codewords,
			huffman_tree
		})
	}

	/// Returns the codeword assigned to the specified symbol, or `None` if
	/// the symbol is outside the alphabet or was never observed.
	pub fn codeword(&self, symbol: u16) -> Option<Codeword> {
		self.codewords.get(symbol as usize).copied().flatten()
	}

	/// Decodes a single symbol, reading bits from the specified bitpack
	/// reader until a codeword is complete.
	///
	/// This is the decoding primitive a paired decoder would be built upon;
	/// it assumes the reader is positioned at a codeword of this codebook.
	pub fn decode_symbol<R: io::Read>(
		&self,
		bitpack_reader: &mut MsbReader<R>
	) -> io::Result<u16> {
		let mut walker = self.huffman_tree.walker();

		// Codebooks are only built for fully specified trees with at least
		// two leaves, so this loop terminates: every bit sequence walks to a
		// leaf or the reader runs out of bytes
		loop {
			if let Some(symbol) = walker.walk(bitpack_reader.read_bit()?) {
				return Ok(symbol);
			}
		}
	}
}

/// The codebook set covering the three components of a block rank: one shape
/// codebook, plus per-shape combination and iteration codebooks.
///
/// Combination and iteration counts are pooled across shapes (they are keyed
/// by raw symbol value), so each per-shape codebook is the restriction of the
/// same pooled map to that shape's alphabet. Shapes that admit a single
/// combination or a single ordering never get the corresponding codebook:
/// there is nothing to encode for them.
pub struct RankCodebooks {
	shape_book: Option<Codebook>,
	combination_books: [Option<Codebook>; SHAPE_COUNT],
	iteration_books: [Option<Codebook>; SHAPE_COUNT]
}

impl RankCodebooks {
	/// Builds every codebook from the specified first-pass symbol
	/// frequencies, suppressing those with fewer than two observed symbols.
	pub fn from_frequencies(frequencies: &BlockFrequencies) -> Self {
		let shape_book = Codebook::from_frequencies(frequencies.shapes(), SHAPE_COUNT as u16);

		let combination_books = std::array::from_fn(|shape| {
			(COMBINATIONS_PER_SHAPE[shape] > 1)
				.then(|| {
					Codebook::from_frequencies(
						frequencies.combinations(),
						COMBINATIONS_PER_SHAPE[shape]
					)
				})
				.flatten()
		});

		let iteration_books = std::array::from_fn(|shape| {
			(ITERATIONS_PER_SHAPE[shape] > 1)
				.then(|| {
					Codebook::from_frequencies(frequencies.iterations(), ITERATIONS_PER_SHAPE[shape])
				})
				.flatten()
		});

		let codebooks = Self {
			shape_book,
			combination_books,
			iteration_books
		};

		debug!(
			"Built codebooks: shape book {}, {} combination book(s), {} iteration book(s)",
			if codebooks.shape_book.is_some() {
				"present"
			} else {
				"suppressed"
			},
			codebooks
				.combination_books
				.iter()
				.filter(|book| book.is_some())
				.count(),
			codebooks
				.iteration_books
				.iter()
				.filter(|book| book.is_some())
				.count()
		);

		codebooks
	}

	/// Returns the shape codebook, unless it is suppressed.
	pub fn shape_book(&self) -> Option<&Codebook> {
		self.shape_book.as_ref()
	}

	/// Returns the combination codebook of the specified shape, unless that
	/// shape admits a single combination or the codebook is suppressed.
	pub fn combination_book(&self, shape: u8) -> Option<&Codebook> {
		self.combination_books[shape as usize].as_ref()
	}

	/// Returns the iteration codebook of the specified shape, unless that
	/// shape admits a single ordering or the codebook is suppressed.
	pub fn iteration_book(&self, shape: u8) -> Option<&Codebook> {
		self.iteration_books[shape as usize].as_ref()
	}
}
