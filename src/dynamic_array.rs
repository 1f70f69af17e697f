use std::alloc::{self, Layout, alloc, dealloc};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

use tracing::{debug, trace};

use crate::error::{DynArrayError, Result};

/// Number of slots reserved beyond the initial length on construction.
pub const SPARE_CAPACITY: usize = 16;

#[macro_export]
macro_rules! dynarray {
    ( $( $x:expr ),* $(,)? ) => {
        {
            let mut temp_arr = $crate::DynamicArray::new();
            $(
                temp_arr.push($x);
            )*
            temp_arr
        }
    };
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

/// Capacity to grow to once `n` slots no longer fit: `2n + 1`.
#[inline]
fn grown(n: usize) -> usize {
    n.checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .unwrap_or_else(|| capacity_overflow())
}

/// Sole owner of an allocation of `cap` uninitialized slots.
///
/// Releases the allocation exactly once when dropped and never touches the
/// elements; whoever holds the buffer is responsible for dropping them.
struct RawBuf<T> {
    ptr: NonNull<T>,
    cap: usize,
    marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for RawBuf<T> {}
unsafe impl<T: Sync> Sync for RawBuf<T> {}

impl<T> RawBuf<T> {
    /// A buffer that owns no memory. Zero-sized types never need any.
    fn unallocated(cap: usize) -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap,
            marker: PhantomData,
        }
    }

    #[inline]
    fn needs_alloc(cap: usize) -> bool {
        cap != 0 && mem::size_of::<T>() != 0
    }

    /// Allocates `cap` slots, aborting through `handle_alloc_error` if the
    /// allocator comes back empty.
    fn allocate(cap: usize) -> Self {
        if !Self::needs_alloc(cap) {
            return Self::unallocated(cap);
        }
        let layout = Layout::array::<T>(cap).unwrap_or_else(|_| capacity_overflow());
        let handle = unsafe { alloc(layout) };
        let ptr = NonNull::new(handle as *mut T).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Self {
            ptr,
            cap,
            marker: PhantomData,
        }
    }

    fn try_allocate(cap: usize) -> Result<Self> {
        if !Self::needs_alloc(cap) {
            return Ok(Self::unallocated(cap));
        }
        let layout = Layout::array::<T>(cap)
            .map_err(|_| DynArrayError::CapacityOverflow { requested: cap })?;
        let handle = unsafe { alloc(layout) };
        let ptr = NonNull::new(handle as *mut T)
            .ok_or(DynArrayError::AllocFailed { capacity: cap })?;
        Ok(Self {
            ptr,
            cap,
            marker: PhantomData,
        })
    }

    /// Pointer to slot `ix`. Does not check `ix <= cap`.
    #[inline]
    unsafe fn slot(&self, ix: usize) -> NonNull<T> {
        unsafe { self.ptr.add(ix) }
    }
}

impl<T> Drop for RawBuf<T> {
    fn drop(&mut self) {
        if !Self::needs_alloc(self.cap) {
            return;
        }
        // this layout cannot error because it was validated when the buffer was allocated
        let layout = unsafe { Layout::array::<T>(self.cap).unwrap_unchecked() };
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
    }
}

/// A contiguous, growable array that owns its elements.
///
/// Construction reserves [`SPARE_CAPACITY`] slots past the initial length.
/// When a push finds the array full the capacity grows to `2 * capacity + 1`,
/// so any sequence of `n` pushes moves O(n) elements in total. Capacity never
/// shrinks.
///
/// Slices, iterators and element references borrow the array, so they cannot
/// outlive an operation that may relocate the storage (`push`, `reserve`,
/// `resize`, ...).
///
/// There is no internal locking. Sharing one array between threads for
/// mutation requires external synchronization such as a `Mutex`.
pub struct DynamicArray<T> {
    buf: RawBuf<T>,
    len: usize,
}

impl<T> DynamicArray<T> {
    /// Constructs a new, empty `DynamicArray<T>` with room for
    /// [`SPARE_CAPACITY`] elements.
    pub fn new() -> Self {
        Self {
            buf: RawBuf::allocate(SPARE_CAPACITY),
            len: 0,
        }
    }

    /// Constructs an empty array with exactly `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: RawBuf::allocate(capacity),
            len: 0,
        }
    }

    /// Constructs an array of `len` default values with [`SPARE_CAPACITY`]
    /// slots to spare.
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        let capacity = len
            .checked_add(SPARE_CAPACITY)
            .unwrap_or_else(|| capacity_overflow());
        let mut arr = Self::with_capacity(capacity);
        arr.resize_with(len, T::default);
        arr
    }

    /// Returns the number of elements in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of allocated slots, used or not.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.cap
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.ptr.as_ptr(), self.len) }
    }

    /// Grows the storage to exactly `capacity` slots. Does nothing if the
    /// array already has at least that many.
    ///
    /// Aborts through [`std::alloc::handle_alloc_error`] if the allocation
    /// fails and panics if the size in bytes overflows `isize::MAX`.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        self.relocate(RawBuf::allocate(capacity));
    }

    /// Like [`reserve`](Self::reserve), but reports failure instead of
    /// panicking or aborting. The array is unchanged on error.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        let buf = RawBuf::try_allocate(capacity).inspect_err(|err| {
            debug!(%err, len = self.len, capacity = self.capacity(), "reservation failed");
        })?;
        self.relocate(buf);
        Ok(())
    }

    /// Moves the live elements into `buf` and releases the old storage.
    fn relocate(&mut self, buf: RawBuf<T>) {
        trace!(
            len = self.len,
            old_capacity = self.capacity(),
            new_capacity = buf.cap,
            "relocating storage"
        );
        unsafe { ptr::copy_nonoverlapping(self.buf.ptr.as_ptr(), buf.ptr.as_ptr(), self.len) };
        // the old buffer only holds moved-from bits now, dropping it just deallocates
        drop(mem::replace(&mut self.buf, buf));
    }

    /// Adds `val` to the end of the array, increasing its length by 1.
    pub fn push(&mut self, val: T) {
        if self.len == self.capacity() {
            self.reserve(grown(self.capacity()));
        }
        unsafe { self.buf.slot(self.len).write(val) };
        self.len += 1;
    }

    /// Removes the last value and returns it in an Option.
    /// If the array is empty, returns None.
    ///
    /// The slot stays allocated for the next push.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(unsafe { self.buf.slot(self.len).read() })
        }
    }

    /// Sets the length to `len`, filling new slots with values from `f` and
    /// dropping the ones past `len` when shrinking.
    ///
    /// Growing past the capacity reserves `2 * len + 1` slots first.
    pub fn resize_with<F>(&mut self, len: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        if len <= self.len {
            self.truncate(len);
            return;
        }
        if len > self.capacity() {
            self.reserve(grown(len));
        }
        while self.len < len {
            unsafe { self.buf.slot(self.len).write(f()) };
            self.len += 1;
        }
    }

    /// [`resize_with`](Self::resize_with) using `T::default()`.
    pub fn resize(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }

    /// Drops the elements past `len`. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            unsafe { self.buf.slot(len) }.as_ptr(),
            self.len - len,
        );
        // shorten first so a panicking drop cannot leave dropped values in range
        self.len = len;
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drops all elements, keeping the allocated storage.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Returns the element at `index`, or
    /// [`DynArrayError::IndexOutOfRange`] outside `0..len`.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.as_slice()
            .get(index)
            .ok_or(DynArrayError::IndexOutOfRange {
                index,
                len: self.len,
            })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(DynArrayError::IndexOutOfRange { index, len })
    }

    /// Returns the element at `index` without a bounds check.
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        unsafe { self.buf.slot(index).as_ref() }
    }

    /// Mutable counterpart of [`get_unchecked`](Self::get_unchecked).
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        unsafe { self.buf.slot(index).as_mut() }
    }

    /// Returns the last element, or [`DynArrayError::Empty`].
    pub fn last(&self) -> Result<&T> {
        self.as_slice().last().ok_or(DynArrayError::Empty)
    }

    pub fn last_mut(&mut self) -> Result<&mut T> {
        self.as_mut_slice().last_mut().ok_or(DynArrayError::Empty)
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // the buffer itself is released by RawBuf
        unsafe { ptr::drop_in_place(self.as_mut_slice() as *mut [T]) };
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DynamicArray<T> {
    /// Copies the elements into a fresh buffer of the same capacity.
    ///
    /// If cloning an element panics, the copies made so far are dropped and
    /// the new buffer is released.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.capacity());
        for item in self.iter() {
            unsafe { copy.buf.slot(copy.len).write(item.clone()) };
            copy.len += 1;
        }
        copy
    }

    /// Builds the complete copy before releasing the current contents, so a
    /// panicking element clone leaves `self` untouched.
    fn clone_from(&mut self, source: &Self) {
        *self = source.clone();
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for DynamicArray<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Index<usize> for DynamicArray<T> {
    type Output = T;

    fn index(&self, ix: usize) -> &Self::Output {
        assert!(ix < self.len, "index out of bounds: the len is {} but the index is {}", self.len, ix);
        unsafe { self.get_unchecked(ix) }
    }
}

impl<T> IndexMut<usize> for DynamicArray<T> {
    fn index_mut(&mut self, ix: usize) -> &mut Self::Output {
        assert!(ix < self.len, "index out of bounds: the len is {} but the index is {}", self.len, ix);
        unsafe { self.get_unchecked_mut(ix) }
    }
}

impl<T: Debug> Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynamicArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: PartialEq> PartialEq<Vec<T>> for DynamicArray<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq> PartialEq<DynamicArray<T>> for Vec<T> {
    fn eq(&self, other: &DynamicArray<T>) -> bool {
        other == self
    }
}

impl<T: PartialEq> PartialEq<[T]> for DynamicArray<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for DynamicArray<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut arr = Self::new();
        arr.extend(iter);
        arr
    }
}

impl<T> From<Vec<T>> for DynamicArray<T> {
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<T: Clone> From<&[T]> for DynamicArray<T> {
    fn from(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

/// Owning iterator over the elements of a [`DynamicArray`].
///
/// Elements that are never yielded are dropped along with the buffer.
pub struct IntoIter<T> {
    buf: RawBuf<T>,
    start: usize,
    end: usize,
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let mut this = ManuallyDrop::new(self);
        let buf = mem::replace(&mut this.buf, RawBuf::unallocated(0));
        IntoIter {
            buf,
            start: 0,
            end: this.len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        let out = unsafe { self.buf.slot(self.start).read() };
        self.start += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        Some(unsafe { self.buf.slot(self.end).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let rest = ptr::slice_from_raw_parts_mut(
            unsafe { self.buf.slot(self.start) }.as_ptr(),
            self.end - self.start,
        );
        unsafe { ptr::drop_in_place(rest) };
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
