//! octarank is a Rust library for experimental lossless entropy coding of
//! arbitrary byte streams, based on a combinatorial decomposition of 24-bit
//! blocks.
//!
//! # How it works
//!
//! Every three input bytes are packed big-endian into a 24-bit block and
//! viewed as eight octal digits. The block is then converted to its
//! [rank](BlockRank): the *shape* of its digit multiset (one of 22 count
//! profiles), the *combination* of digit values within that shape, and the
//! *iteration* ordering those digits over the eight positions. The triple is
//! an exact alternative coordinate system for the block (the conversion is a
//! [precomputed bijection](RankTable) over the whole 2^24 block space), but
//! its symbols are fewer and far more skewed than the raw block value, which
//! is what gives entropy coding leverage.
//!
//! [`BlockEncoder`] streams the input twice: a first pass tallies the rank
//! symbol frequencies, then Huffman codebooks optimal for those frequencies
//! are built (one for shapes, plus per-shape combination and iteration
//! codebooks), and a second pass writes each block as the MSB-first
//! concatenation of its codewords.
//!
//! # Known limitations
//!
//! This coder is an experiment in rank-based modeling, not a production
//! archiver, and the bitstream it emits reflects that:
//!
//! - The output is headerless. The codebooks and the input length are not
//!   persisted, so a paired decoder must obtain them from a side channel,
//!   for example by redoing the count pass over a shared input. Only the
//!   symbol-level decoding primitive is provided; see
//!   [`Codebook::decode_symbol`].
//! - Inputs whose length is not a multiple of three have their tail bytes
//!   collapsed into the low bits of the final block, indistinguishably from
//!   zero padding. Exact recovery needs the original length out-of-band.
//! - The rank conversion tables cost around 144 MiB of memory and a few
//!   seconds of construction time per process, amortized across encodes.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://crates.io/crates/log) crate for
//! logging status and diagnostic messages to any interested consumers.
//! Executables can customize the verbosity of this logging, and even compile
//! it out, as explained in the `log` crate documentation.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::io::Cursor;
//! use octarank::{BlockEncoder, RankTable};
//!
//! // Expensive; build once and share across encodes
//! let rank_table = RankTable::build()?;
//!
//! let input = b"Hello there";
//! let encoded = BlockEncoder::new(&rank_table).encode(Cursor::new(input), Vec::new())?;
//!
//! println!("Encoded {} bytes into {} bytes", input.len(), encoded.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![forbid(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]
#![deny(non_ascii_idents)]
#![deny(clippy::print_stdout)]
#![deny(clippy::unimplemented)]
#![warn(explicit_outlives_requirements)]
#![warn(noop_method_call)]
#![warn(unreachable_pub)]
#![warn(unused_import_braces)]
#![warn(unused_qualifications)]
#![warn(variant_size_differences)]
#![warn(clippy::empty_enum)]
#![warn(clippy::enum_glob_use)]
#![warn(clippy::multiple_inherent_impl)]
#![warn(clippy::use_self)]
#![warn(clippy::used_underscore_binding)]

#[doc(inline)]
pub use encoder::codebook::{Codebook, Codeword, RankCodebooks};
#[doc(inline)]
pub use encoder::{BlockEncoder, BlockEncoderError, BlockFrequencies, SymbolClass};
#[doc(inline)]
pub use rank::BlockRank;
#[doc(inline)]
pub use rank::table::{RankTable, RankTableError};

/// A text tag that precisely identifies this octarank build.
pub static OCTARANK_VERSION_TAG: &str = concat!("octarank ", env!("OCTARANK_VERSION"));

pub mod encoder;
pub mod rank;
