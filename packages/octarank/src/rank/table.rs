//! Contains the [`RankTable`] definition: the precomputed, bidirectional
//! mapping between 24-bit blocks and their combinatorial ranks.

use log::info;
use thiserror::Error;

use super::{
	BLOCK_SPACE_SIZE, BlockRank, COMBINATIONS_PER_SHAPE, ITERATIONS_PER_SHAPE, RANK_OFFSETS,
	SHAPE_COUNT, classify_shape, log_shape_partition
};

/// Represents an error that may happen while building the rank tables.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RankTableError {
	/// A block did not match any of the canonical digit count profiles.
	/// Every 24-bit block must match exactly one.
	#[error("Block {block:#08X} does not match any digit count profile")]
	UnclassifiableBlock {
		/// The offending 24-bit block.
		block: u32
	},
	/// A block did not survive a round trip through the built tables.
	#[error("Rank round trip failed: block {block:#08X} came back as {actual:#08X}")]
	RoundTripMismatch {
		/// The block whose rank was computed.
		block: u32,
		/// The block that rank mapped back to.
		actual: u32
	}
}

/// The precomputed mapping between 24-bit blocks and their
/// [ranks](BlockRank), in both directions.
///
/// The table is built once per process, takes around 144 MiB of memory, and
/// is immutable afterwards, so encodes may freely share a reference to it
/// from several threads. Construction classifies every one of the 2^24
/// blocks and then validates the bijection over the whole block space, which
/// takes a few seconds; the cost is amortized across every encode done with
/// the same table.
pub struct RankTable {
	/// Shape of each block.
	shape_of: Vec<u8>,
	/// Combination index of each block within its shape.
	combination_of: Vec<u16>,
	/// Iteration index of each block within its shape and combination.
	iteration_of: Vec<u16>,
	/// The inverse mapping: block of each rank, laid out flat in shape order,
	/// strided by each shape's iteration count.
	block_of_rank: Vec<u32>
}

impl RankTable {
	/// Builds and validates the rank tables.
	///
	/// Every 24-bit block is classified into its shape; blocks of the same
	/// shape are ranked in ascending block order, combination first and
	/// iteration within it. After construction, the round-trip bijection is
	/// checked over the whole block space, and any mismatch fails the build.
	pub fn build() -> Result<Self, RankTableError> {
		log_shape_partition();

		let mut shape_of = vec![0u8; BLOCK_SPACE_SIZE];
		let mut combination_of = vec![0u16; BLOCK_SPACE_SIZE];
		let mut iteration_of = vec![0u16; BLOCK_SPACE_SIZE];

		// One growing bucket per shape. Within a bucket, blocks stay in
		// ascending order, which is what makes the quotient/remainder rank
		// assignment below reproducible on lookup
		let mut shape_buckets: [Vec<u32>; SHAPE_COUNT] = std::array::from_fn(|shape| {
			Vec::with_capacity(
				COMBINATIONS_PER_SHAPE[shape] as usize * ITERATIONS_PER_SHAPE[shape] as usize
			)
		});

		for block in 0..BLOCK_SPACE_SIZE as u32 {
			let shape =
				classify_shape(block).ok_or(RankTableError::UnclassifiableBlock { block })?;
			let bucket = &mut shape_buckets[shape as usize];

			// Each bucket is partitioned into runs of one iteration stride:
			// the combination advances every ITERATIONS_PER_SHAPE[shape]
			// insertions, and the iteration cycles within the run
			let iteration_stride = ITERATIONS_PER_SHAPE[shape as usize] as u32;
			let bucket_position = bucket.len() as u32;
			let combination = bucket_position / iteration_stride;
			let iteration = bucket_position % iteration_stride;

			debug_assert!(
				combination < COMBINATIONS_PER_SHAPE[shape as usize] as u32,
				"Shape {shape} bucket overflowed its combination count"
			);

			shape_of[block as usize] = shape;
			combination_of[block as usize] = combination as u16;
			iteration_of[block as usize] = iteration as u16;
			bucket.push(block);
		}

		// Concatenating the buckets in shape order lines the flat table up
		// with RANK_OFFSETS
		let mut block_of_rank = Vec::with_capacity(BLOCK_SPACE_SIZE);
		for bucket in &shape_buckets {
			block_of_rank.extend_from_slice(bucket);
		}

		let table = Self {
			shape_of,
			combination_of,
			iteration_of,
			block_of_rank
		};
		table.verify()?;

		info!("Rank tables built and validated over all {BLOCK_SPACE_SIZE} blocks");

		Ok(table)
	}

	/// Looks up the rank of the specified block. Three table reads.
	///
	/// # Panics
	/// If `block` is not a 24-bit value.
	pub fn rank_of(&self, block: u32) -> BlockRank {
		BlockRank {
			shape: self.shape_of[block as usize],
			combination: self.combination_of[block as usize],
			iteration: self.iteration_of[block as usize]
		}
	}

	/// Looks up the block the specified rank stands for. One table read.
	///
	/// # Panics
	/// If the rank's shape is not less than [`SHAPE_COUNT`], or its
	/// combination or iteration is out of range for that shape.
	pub fn block_of(&self, rank: BlockRank) -> u32 {
		let shape = rank.shape as usize;

		assert!(rank.combination < COMBINATIONS_PER_SHAPE[shape]);
		assert!(rank.iteration < ITERATIONS_PER_SHAPE[shape]);

		// Each shape's region starts at its offset and is strided by the
		// shape's iteration count
		self.block_of_rank[(RANK_OFFSETS[shape]
			+ rank.combination as u32 * ITERATIONS_PER_SHAPE[shape] as u32
			+ rank.iteration as u32) as usize]
	}

	/// Checks the block-to-rank-to-block bijection over the whole block
	/// space. Construction bugs surface here, before any stream can be
	/// encoded against bad tables.
	fn verify(&self) -> Result<(), RankTableError> {
		for block in 0..BLOCK_SPACE_SIZE as u32 {
			let actual = self.block_of(self.rank_of(block));
			if actual != block {
				return Err(RankTableError::RoundTripMismatch { block, actual });
			}
		}

		Ok(())
	}
}

#[cfg(test)]
pub(crate) mod test {
	use std::sync::OnceLock;

	use super::*;
	use crate::rank::digit_count_profile;

	/// The tests below share a single table build: constructing it means
	/// classifying and round-tripping all 2^24 blocks, which is too slow to
	/// repeat per test.
	pub(crate) fn shared_rank_table() -> &'static RankTable {
		static RANK_TABLE: OnceLock<RankTable> = OnceLock::new();

		RANK_TABLE
			.get_or_init(|| RankTable::build().expect("The rank tables were assumed to build"))
	}

	#[test]
	fn repeated_digit_blocks_rank_as_expected() {
		// The eight single-digit blocks are the whole of shape 0, in
		// ascending digit order, with a single iteration each
		assert_eq!(
			shared_rank_table().rank_of(0x000000),
			BlockRank {
				shape: 0,
				combination: 0,
				iteration: 0
			}
		);
		assert_eq!(
			shared_rank_table().rank_of(0xFFFFFF),
			BlockRank {
				shape: 0,
				combination: 7,
				iteration: 0
			}
		);
	}

	#[test]
	fn first_block_of_a_shape_gets_the_zero_rank() {
		// Block 1 is the smallest block whose digits are seven zeroes and a
		// one, so it opens shape 1
		let rank = shared_rank_table().rank_of(0x000001);

		assert_eq!((rank.shape, rank.combination, rank.iteration), (1, 0, 0));
	}

	#[test]
	fn ranks_round_trip_for_sampled_blocks() {
		let table = shared_rank_table();

		assert_eq!(table.block_of(table.rank_of(0x123456)), 0x123456);

		// A coprime stride samples every shape many times over
		for block in (0..BLOCK_SPACE_SIZE as u32).step_by(4099) {
			assert_eq!(table.block_of(table.rank_of(block)), block);
		}
	}

	#[test]
	fn ranks_stay_in_their_shape_ranges() {
		let table = shared_rank_table();

		for block in (0..BLOCK_SPACE_SIZE as u32).step_by(5003) {
			let rank = table.rank_of(block);

			assert!((rank.shape as usize) < SHAPE_COUNT);
			assert!(rank.combination < COMBINATIONS_PER_SHAPE[rank.shape as usize]);
			assert!(rank.iteration < ITERATIONS_PER_SHAPE[rank.shape as usize]);
		}
	}

	#[test]
	fn table_shapes_match_recomputed_profiles() {
		let table = shared_rank_table();

		for block in (0..BLOCK_SPACE_SIZE as u32).step_by(6007) {
			assert_eq!(
				classify_shape(block),
				Some(table.rank_of(block).shape),
				"Block {block:#08X} was stored under the wrong shape"
			);
		}
	}

	#[test]
	fn rank_regions_preserve_shapes() {
		let table = shared_rank_table();

		// Every block stored in a shape's region of the flat table must
		// classify back to that shape
		let first = table.block_of(BlockRank {
			shape: 2,
			combination: 0,
			iteration: 1
		});

		assert_eq!(classify_shape(first), Some(2));
		assert_eq!(digit_count_profile(first), [0, 0, 0, 0, 0, 0, 2, 6]);
	}
}
