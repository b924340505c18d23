//! Contains the [`BlockEncoder`] struct, which is responsible for the
//! two-pass entropy encoding of byte streams as block rank symbols.

use std::{
	fmt,
	io::{self, ErrorKind, Read, Seek, SeekFrom, Write}
};

use indexmap::IndexMap;
use log::{info, trace};
use msb_bitpack::MsbWriter;
use thiserror::Error;

use codebook::{Codebook, RankCodebooks};
use crate::rank::{
	BlockRank, COMBINATIONS_PER_SHAPE, ITERATIONS_PER_SHAPE, table::RankTable
};

pub mod codebook;

/// The three symbol classes a block rank contributes to the bitstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolClass {
	/// The digit multiset shape of a block.
	Shape,
	/// The digit assignment within a shape.
	Combination,
	/// The digit ordering within a shape and combination.
	Iteration
}

impl fmt::Display for SymbolClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Shape => "shape",
			Self::Combination => "combination",
			Self::Iteration => "iteration"
		})
	}
}

/// Represents an error that may occur while encoding a byte stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlockEncoderError {
	/// A block seen in the encode pass maps to a symbol the count pass never
	/// saw, so no codeword exists for it.
	#[error(
		"Block {block:#08X} maps to {class} symbol {symbol}, which the count pass never saw. \
		Did the input change between passes?"
	)]
	UnstableInput {
		/// The offending block.
		block: u32,
		/// The class of the symbol that has no codeword.
		class: SymbolClass,
		/// The symbol value that has no codeword.
		symbol: u16
	},
	/// An I/O error happened while reading or writing a stream.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error)
}

/// The first-pass symbol frequencies: how many times each shape, combination
/// and iteration symbol was seen in the input.
///
/// Combination and iteration counts are keyed by raw symbol value, with no
/// conditioning on the shape they were seen under: shapes pool their counts,
/// and each per-shape codebook later restricts the pooled map to its own
/// alphabet. Pooling slightly skews every codebook towards the symbol
/// distribution of the other shapes, which costs some code length but keeps
/// the count state small and matches what the paired decoder expects.
#[derive(Default)]
pub struct BlockFrequencies {
	shapes: IndexMap<u16, u64>,
	combinations: IndexMap<u16, u64>,
	iterations: IndexMap<u16, u64>
}

impl BlockFrequencies {
	/// Tallies one block rank.
	///
	/// Shapes that admit a single combination contribute no combination
	/// symbol, and shapes that admit a single ordering contribute no
	/// iteration symbol. The encode pass elides the same symbols, so both
	/// passes stay in agreement.
	pub fn record(&mut self, rank: BlockRank) {
		let shape = rank.shape as usize;

		Self::tally(&mut self.shapes, rank.shape as u16);
		if COMBINATIONS_PER_SHAPE[shape] > 1 {
			Self::tally(&mut self.combinations, rank.combination);
		}
		if ITERATIONS_PER_SHAPE[shape] > 1 {
			Self::tally(&mut self.iterations, rank.iteration);
		}
	}

	fn tally(counts: &mut IndexMap<u16, u64>, symbol: u16) {
		let count = counts.entry(symbol).or_insert(0);
		*count = count.saturating_add(1);
	}

	/// Returns the shape symbol frequencies.
	pub fn shapes(&self) -> &IndexMap<u16, u64> {
		&self.shapes
	}

	/// Returns the pooled combination symbol frequencies.
	pub fn combinations(&self) -> &IndexMap<u16, u64> {
		&self.combinations
	}

	/// Returns the pooled iteration symbol frequencies.
	pub fn iterations(&self) -> &IndexMap<u16, u64> {
		&self.iterations
	}
}

/// Reads the next 24-bit block from the specified source, packing up to three
/// bytes big-endian.
///
/// A final partial block of one or two bytes is packed into the low bits of
/// the block value, without shifting it up to the most significant byte, so
/// the tail of a stream whose length is not a multiple of three becomes
/// indistinguishable from a zero-padded full block. Recovering such streams
/// exactly needs the original byte length from elsewhere.
fn read_block<R: Read>(source: &mut R) -> io::Result<Option<u32>> {
	let mut block_bytes = [0u8; 3];
	let mut read_bytes = 0;

	while read_bytes < block_bytes.len() {
		match source.read(&mut block_bytes[read_bytes..]) {
			Ok(0) => break,
			Ok(byte_count) => read_bytes += byte_count,
			Err(error) if error.kind() == ErrorKind::Interrupted => continue,
			Err(error) => return Err(error)
		}
	}

	Ok(match read_bytes {
		0 => None,
		1 => Some(block_bytes[0] as u32),
		2 => Some((block_bytes[0] as u32) << 8 | block_bytes[1] as u32),
		_ => Some(
			(block_bytes[0] as u32) << 16 | (block_bytes[1] as u32) << 8 | block_bytes[2] as u32
		)
	})
}

/// A two-pass entropy encoder of byte streams over block rank symbols.
///
/// The encoder streams the input twice. The first pass converts every 24-bit
/// block to its rank and tallies the symbol frequencies; codebooks optimal
/// for those frequencies are then built, and the second pass writes each
/// block as the concatenation of its shape, combination and iteration
/// codewords, in that order, with the elisions described in
/// [`RankCodebooks`]. The final byte is zero-padded.
///
/// The output is a headerless bitstream: it carries neither the codebooks
/// nor the input length, so a paired decoder must obtain both from elsewhere
/// (for example, by redoing the count pass over a shared input).
pub struct BlockEncoder<'table> {
	rank_table: &'table RankTable
}

impl<'table> BlockEncoder<'table> {
	/// Creates a block encoder that encodes against the specified rank
	/// tables.
	pub fn new(rank_table: &'table RankTable) -> Self {
		Self { rank_table }
	}

	/// Encodes the byte stream of `source` to `sink`, returning `sink` once
	/// the encoded bitstream is completely written and flushed.
	///
	/// `source` is required to have a fixed size (i.e., it must never return
	/// more data after EOF is reached), and is rewound between the passes to
	/// the stream position it had when this method was called, not to zero.
	pub fn encode<R: Read + Seek, W: Write>(
		&self,
		mut source: R,
		mut sink: W
	) -> Result<W, BlockEncoderError> {
		let initial_position = source.stream_position()?;

		// First pass: tally rank symbol frequencies
		let mut frequencies = BlockFrequencies::default();
		let mut block_count = 0u64;
		while let Some(block) = read_block(&mut source)? {
			frequencies.record(self.rank_table.rank_of(block));
			block_count += 1;
		}

		info!(
			"Count pass saw {block_count} block(s): {} shape, {} combination and {} iteration symbols",
			frequencies.shapes().len(),
			frequencies.combinations().len(),
			frequencies.iterations().len()
		);

		let codebooks = RankCodebooks::from_frequencies(&frequencies);

		// Second pass: rewind and entropy-code every block
		source.seek(SeekFrom::Start(initial_position))?;

		let mut bitpacker = MsbWriter::new(&mut sink);
		while let Some(block) = read_block(&mut source)? {
			let rank = self.rank_table.rank_of(block);

			trace!(
				"Encoding block {block:#08X} as rank ({}, {}, {})",
				rank.shape, rank.combination, rank.iteration
			);

			write_symbol(
				&mut bitpacker,
				codebooks.shape_book(),
				block,
				SymbolClass::Shape,
				rank.shape as u16
			)?;
			write_symbol(
				&mut bitpacker,
				codebooks.combination_book(rank.shape),
				block,
				SymbolClass::Combination,
				rank.combination
			)?;
			write_symbol(
				&mut bitpacker,
				codebooks.iteration_book(rank.shape),
				block,
				SymbolClass::Iteration,
				rank.iteration
			)?;
		}

		// Zero-pad and write out the last partial byte, then make sure every
		// byte reaches the sink before handing it back
		bitpacker.finalize()?;
		drop(bitpacker);
		sink.flush()?;

		Ok(sink)
	}
}

/// Writes one rank symbol using the specified codebook. Suppressed or
/// excluded codebooks write nothing: the symbol they would encode is already
/// implied by the shape and the codebook construction rules.
fn write_symbol<W: Write>(
	bitpacker: &mut MsbWriter<W>,
	codebook: Option<&Codebook>,
	block: u32,
	class: SymbolClass,
	symbol: u16
) -> Result<(), BlockEncoderError> {
	let Some(codebook) = codebook else {
		return Ok(());
	};

	let codeword = codebook
		.codeword(symbol)
		.ok_or(BlockEncoderError::UnstableInput {
			block,
			class,
			symbol
		})?;

	bitpacker.write_bits(codeword.bits, codeword.width())?;

	Ok(())
}
