use thiserror::Error;

pub type Result<T> = core::result::Result<T, DynArrayError>;

/// Failures reported by the checked and fallible paths of [`DynamicArray`].
///
/// [`DynamicArray`]: crate::DynamicArray
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynArrayError {
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("the array is empty")]
    Empty,
    #[error("capacity overflow while reserving {requested} slots")]
    CapacityOverflow { requested: usize },
    #[error("allocation failed for capacity {capacity}")]
    AllocFailed { capacity: usize },
}
