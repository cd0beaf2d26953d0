//! String interpolation expander: rewrites `Str` literals
//! containing `${...}` into `Call("_operator", "+", ..)` concatenation
//! trees.
//!
//! Runs between the parser and scope resolution. `mcl_parse` decodes escape
//! sequences but leaves `${...}` untouched (interpolation is not treated
//! as a lexical concern here), so this crate owns the whole grammar:
//! splitting a literal into pieces, parsing each embedded expression with
//! `mcl_parse`, and rebuilding the tree.

mod rewrite;
mod split;

pub use rewrite::interpolate_prog;
pub use split::{split_interpolated, Segment};
