//! Text-to-markup alignment.
//!
//! [`AlignmentIndex`] flattens a rich rendering into a normalized character
//! stream once; [`ProgressiveAligner`] then maps an incrementally growing
//! reference text (a transcript arriving in pieces, say) onto the matching
//! part of the rendering.

mod aligner;
mod index;

pub use aligner::{Fragment, ProgressiveAligner, SEED_LENGTHS};
pub use index::{AlignmentIndex, RichPosition};
