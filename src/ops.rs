//! Operations run through the catalog's dispatch table.

use core::{fmt, marker::PhantomData};
use varicell_catalog::{Dispatch, Handle, Operation};

/// Clones the live alternative into the uninitialized storage behind the pointer.
pub struct CloneInto(pub(crate) *mut u8);

impl Operation for CloneInto {
    type Output = ();
}

impl<T: Clone> Handle<T> for CloneInto {
    unsafe fn handle(self, value: *mut T) {
        let copy = (*value).clone();
        self.0.cast::<T>().write(copy);
    }
}

/// Overwrites the live alternative with `clone_from` from a value of the same type.
pub struct CloneFrom(pub(crate) *const u8);

impl Operation for CloneFrom {
    type Output = ();
}

impl<T: Clone> Handle<T> for CloneFrom {
    unsafe fn handle(self, value: *mut T) {
        (*value).clone_from(&*self.0.cast::<T>())
    }
}

/// Formats the live alternative with its `Debug` impl.
pub struct Format<'f, 'a>(pub(crate) &'f mut fmt::Formatter<'a>);

impl Operation for Format<'_, '_> {
    type Output = fmt::Result;
}

impl<T: fmt::Debug> Handle<T> for Format<'_, '_> {
    unsafe fn handle(self, value: *mut T) -> fmt::Result {
        fmt::Debug::fmt(&*value, self.0)
    }
}

/// A borrowed live alternative, printed through [`Format`].
pub(crate) struct Live<'v, L> {
    index: usize,
    value: *const u8,
    _borrow: PhantomData<&'v L>,
}

impl<'v, L> Live<'v, L> {
    /// # Safety
    /// `value` must point to a live alternative at `index` for all of `'v`.
    pub(crate) unsafe fn new(index: usize, value: *const u8) -> Self {
        Live {
            index,
            value,
            _borrow: PhantomData,
        }
    }
}

impl<L> fmt::Debug for Live<'_, L>
where
    L: for<'f, 'a> Dispatch<Format<'f, 'a>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // # Safety
        // `Live::new` promises the pointer is live, and `Format` only reads
        unsafe { L::dispatch(self.index, self.value as *mut u8, Format(f)) }
    }
}
