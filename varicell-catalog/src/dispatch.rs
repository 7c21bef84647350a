use crate::{Cons, Nil};
use core::ptr;

/// Something that can be done to whichever alternative is live.
pub trait Operation {
    type Output;
}

/// How an [`Operation`] treats an alternative of type `T`.
pub trait Handle<T>: Operation {
    /// # Safety
    /// `value` points to a live, properly aligned `T`. Operations reached
    /// through a shared borrow must only read through it.
    unsafe fn handle(self, value: *mut T) -> Self::Output;
}

/// Routes an operation to the alternative at a runtime index.
///
/// This is the one place a discriminator is turned back into a type: walk the
/// list until the index runs out, then hand the storage to [`Handle`] for the
/// type found there.
///
/// # Safety
/// Implementors must call `Handle<T>` only for the `T` at `index`.
pub unsafe trait Dispatch<Op: Operation> {
    /// # Safety
    /// `index` is less than the catalog's length and `value` points to
    /// storage holding a live alternative at that index.
    unsafe fn dispatch(index: usize, value: *mut u8, op: Op) -> Op::Output;
}

unsafe impl<Op> Dispatch<Op> for Nil
where
    Op: Operation,
{
    unsafe fn dispatch(_: usize, _: *mut u8, _: Op) -> Op::Output {
        unreachable!("alternative index overran the catalog")
    }
}

unsafe impl<H, T, Op> Dispatch<Op> for Cons<H, T>
where
    Op: Handle<H>,
    T: Dispatch<Op>,
{
    #[inline]
    unsafe fn dispatch(index: usize, value: *mut u8, op: Op) -> Op::Output {
        match index {
            0 => op.handle(value.cast::<H>()),
            n => T::dispatch(n - 1, value, op),
        }
    }
}

/// Runs the destructor of the live alternative.
pub struct Destroy;

impl Operation for Destroy {
    type Output = ();
}

impl<T> Handle<T> for Destroy {
    unsafe fn handle(self, value: *mut T) {
        ptr::drop_in_place(value)
    }
}
