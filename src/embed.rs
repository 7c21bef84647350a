use varicell_catalog::{Catalog, Cons, Member, Nil};

/// Every alternative of `Self` is also an alternative of `Target`.
///
/// `Indices` is a list of positions, one per alternative of `Self`, and is
/// inferred the same way a single [`Member`] position is.
///
/// # Safety
/// `embed` must move the alternative at `index` into the storage of the
/// matching alternative of `Target` and return that alternative's tag.
pub unsafe trait Embed<Target, Indices>: Catalog
where
    Target: Catalog,
{
    /// # Safety
    /// `value` points to a live alternative at `index`, which the call moves
    /// out of. `dst` points to vacant `Target::Storage`.
    #[doc(hidden)]
    unsafe fn embed(index: usize, value: *mut u8, dst: *mut u8) -> usize;
}

unsafe impl<Target> Embed<Target, Nil> for Nil
where
    Target: Catalog,
{
    unsafe fn embed(_: usize, _: *mut u8, _: *mut u8) -> usize {
        unreachable!("alternative index overran the catalog")
    }
}

unsafe impl<H, T, Target, I, Is> Embed<Target, Cons<I, Is>> for Cons<H, T>
where
    Target: Member<H, I>,
    T: Embed<Target, Is>,
{
    unsafe fn embed(index: usize, value: *mut u8, dst: *mut u8) -> usize {
        match index {
            0 => {
                dst.cast::<H>().write(value.cast::<H>().read());
                <Target as Member<H, I>>::INDEX + 1
            }
            n => T::embed(n - 1, value, dst),
        }
    }
}
