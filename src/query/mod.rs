//! Filter evaluation and result ordering.

pub mod evaluate;
pub mod sort;

pub use evaluate::evaluate;
pub use sort::{SortOrder, compare_resources};
