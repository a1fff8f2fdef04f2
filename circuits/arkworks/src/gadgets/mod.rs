//! Reusable R1CS gadgets
//!
//! - `range_check`: bit decomposition into a fixed width
//! - `comparison`: bounded `x <= y` for operands within a known bound
//! - `compare`: unbounded three-way compare for small business constants
//! - `select`: boolean mux, signed reading and absolute value

pub mod compare;
pub mod comparison;
pub mod range_check;
pub mod select;

pub use compare::{compare_bits, enforce_nonzero, CompareGadget};
pub use comparison::BoundedComparator;
pub use range_check::enforce_bit_length;
pub use select::{abs, abs_with_sign, assert_non_negative, is_negative, select, select_with_flag};
