//! A contiguous growable array with explicit capacity management.
//!
//! [`DynamicArray`] reserves [`SPARE_CAPACITY`] slots on construction and grows
//! to `2 * capacity + 1` whenever a push finds it full, which keeps appends
//! amortized O(1).

pub mod dynamic_array;
pub mod error;

pub use dynamic_array::{DynamicArray, IntoIter, SPARE_CAPACITY};
pub use error::{DynArrayError, Result};
