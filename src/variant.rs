use core::{
    fmt,
    mem::{self, ManuallyDrop, MaybeUninit},
    ptr,
};
use varicell_catalog::{Catalog, Dispatch, Member};

use crate::{
    adapter::Alternative,
    cell::StorageCell,
    embed::Embed,
    ops::{CloneFrom, CloneInto, Format, Live},
    visit::{Accept, AcceptMut, AcceptOnce, Visitor},
    AccessError,
};

/// A value of exactly one of the types listed in `L`, or nothing at all.
///
/// The value lives inline in storage sized for the largest alternative; a
/// variant never allocates. Methods that name a type take it together with a
/// position that the compiler infers, so calls look like `v.get::<String, _>()`.
/// Naming a type that is not in `L` does not compile.
///
/// A variant is *empty* when it was created with [`Variant::empty`] or after
/// its value was taken out with [`Variant::take`], [`Variant::take_as`] or
/// [`Variant::discard`]. Typed reads of an empty variant return
/// [`AccessError::Empty`].
///
/// ```rust
/// use varicell::{catalog, AccessError, Variant};
///
/// let mut v: Variant<catalog![i32, f64, String]> = Variant::new(42i32);
/// assert!(v.is::<i32, _>());
/// assert_eq!(v.get::<i32, _>(), Ok(&42));
///
/// v.set(String::from("hi"));
/// assert_eq!(v.get::<String, _>().map(String::as_str), Ok("hi"));
/// assert!(matches!(v.get::<i32, _>(), Err(AccessError::WrongAlternative { .. })));
///
/// let moved = v.take();
/// assert!(v.is_empty());
/// assert_eq!(moved.get::<String, _>().map(String::as_str), Ok("hi"));
/// ```
///
/// Types outside the catalog are rejected when the program is compiled:
/// ```compile_fail
/// use varicell::{catalog, Variant};
///
/// let v: Variant<catalog![i32, f64]> = Variant::new(1i32);
/// let _ = v.get::<u8, _>();
/// ```
pub struct Variant<L: Catalog> {
    cell: StorageCell<L>,
}

impl<L> Variant<L>
where
    L: Catalog,
{
    /// Creates a variant holding `value`.
    pub fn new<T, I>(value: T) -> Self
    where
        L: Member<T, I>,
    {
        let mut cell = StorageCell::<L>::vacant();
        Alternative::<T, I>::construct(&mut cell, value);
        Variant { cell }
    }

    /// Creates a variant holding nothing.
    pub fn empty() -> Self {
        Variant {
            cell: StorageCell::vacant(),
        }
    }

    /// Returns whether the variant holds nothing.
    pub fn is_empty(&self) -> bool {
        self.cell.tag() == 0
    }

    /// The zero-based catalog position of the held value, or `None` when empty.
    pub fn index(&self) -> Option<usize> {
        self.cell.index()
    }

    /// The type name of the held value, or `None` when empty.
    pub fn type_name(&self) -> Option<&'static str> {
        L::name_of(self.cell.index()?)
    }

    /// Returns whether the variant currently holds a `T`.
    pub fn is<T, I>(&self) -> bool
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::is_active(&self.cell)
    }

    /// Borrows the held `T`.
    pub fn get<T, I>(&self) -> Result<&T, AccessError>
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::get(&self.cell)
    }

    /// Mutably borrows the held `T`.
    pub fn get_mut<T, I>(&mut self) -> Result<&mut T, AccessError>
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::get_mut(&mut self.cell)
    }

    /// Stores `value`, returning a reference to it.
    ///
    /// If the variant already holds a `T`, the new value is assigned over it in
    /// place: the alternative is unchanged and the old `T` is dropped by the
    /// assignment. Otherwise the current value (if any) is destroyed and `value`
    /// is moved in.
    pub fn set<T, I>(&mut self, value: T) -> &mut T
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::assign(&mut self.cell, value)
    }

    /// Stores a copy of `value`, returning a reference to it.
    ///
    /// If the variant already holds a `T` it is updated with
    /// [`Clone::clone_from`], with no value created or destroyed. Otherwise a
    /// clone is made first, then the current value is destroyed.
    pub fn set_cloned<T, I>(&mut self, value: &T) -> &mut T
    where
        L: Member<T, I>,
        T: Clone,
    {
        Alternative::<T, I>::assign_cloned(&mut self.cell, value)
    }

    /// Moves the held `T` out, leaving the variant empty.
    ///
    /// The variant is left untouched when it does not hold a `T`.
    pub fn take_as<T, I>(&mut self) -> Result<T, AccessError>
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::take(&mut self.cell)
    }

    /// Consumes the variant, returning the held `T`.
    pub fn into_inner<T, I>(mut self) -> Result<T, AccessError>
    where
        L: Member<T, I>,
    {
        self.take_as::<T, I>()
    }

    /// Drops the held value if it is a `T`. Returns whether it did.
    pub fn discard<T, I>(&mut self) -> bool
    where
        L: Member<T, I>,
    {
        Alternative::<T, I>::destroy_if_active(&mut self.cell)
    }

    /// Moves the whole variant out, leaving this one empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Variant::empty())
    }

    /// Drops the held value, if any.
    pub fn clear(&mut self) {
        self.cell.clear()
    }

    /// Runs `visitor` on the held value.
    ///
    /// A visitor missing an alternative is rejected when the program is compiled:
    /// ```compile_fail
    /// use varicell::{catalog, Variant, Visit, Visitor};
    ///
    /// struct OnlyInts;
    /// impl Visitor for OnlyInts {
    ///     type Output = i64;
    /// }
    /// impl Visit<i64> for OnlyInts {
    ///     fn visit(&mut self, value: &i64) -> i64 {
    ///         *value
    ///     }
    /// }
    ///
    /// let v: Variant<catalog![i64, String]> = Variant::new(3i64);
    /// let _ = v.visit(OnlyInts);
    /// ```
    pub fn visit<V>(&self, visitor: V) -> Result<V::Output, AccessError>
    where
        V: Visitor,
        L: Dispatch<Accept<V>>,
    {
        // # Safety
        // `Accept` only hands out a shared reference
        unsafe { self.cell.inspect(Accept(visitor)) }.ok_or(AccessError::Empty)
    }

    /// Runs `visitor` on the held value, allowing it to modify the value.
    pub fn visit_mut<V>(&mut self, visitor: V) -> Result<V::Output, AccessError>
    where
        V: Visitor,
        L: Dispatch<AcceptMut<V>>,
    {
        self.cell.modify(AcceptMut(visitor)).ok_or(AccessError::Empty)
    }

    /// Consumes the variant, handing the held value to `visitor` by value.
    pub fn into_visit<V>(mut self, visitor: V) -> Result<V::Output, AccessError>
    where
        V: Visitor,
        L: Dispatch<AcceptOnce<V>>,
    {
        let index = self.cell.forget().ok_or(AccessError::Empty)?;
        // # Safety
        // `forget` released the value at `index` without dropping it, and
        // `AcceptOnce` reads it out exactly once
        Ok(unsafe { L::dispatch(index, self.cell.as_mut_ptr(), AcceptOnce(visitor)) })
    }

    /// Moves the value into a variant over a catalog that lists every
    /// alternative of this one, in any order.
    ///
    /// ```rust
    /// use varicell::{catalog, Variant};
    ///
    /// let narrow: Variant<catalog![u8, char]> = Variant::new('x');
    /// let wide: Variant<catalog![bool, char, u8]> = narrow.embed();
    /// assert_eq!(wide.get::<char, _>(), Ok(&'x'));
    /// ```
    pub fn embed<M, Is>(mut self) -> Variant<M>
    where
        M: Catalog,
        L: Embed<M, Is>,
    {
        let mut cell = StorageCell::<M>::vacant();
        if let Some(index) = self.cell.forget() {
            // # Safety
            // `forget` released the value at `index` to us without dropping it,
            // and `cell` is vacant
            unsafe {
                let tag = L::embed(index, self.cell.as_mut_ptr(), cell.as_mut_ptr());
                cell = StorageCell::from_raw(tag, cell.into_raw().1);
            }
        }
        Variant { cell }
    }

    /// Splits the variant into its tag and storage without running any destructor.
    pub(crate) fn into_raw(self) -> (usize, MaybeUninit<L::Storage>) {
        let levitating = ManuallyDrop::new(self);
        // # Safety
        // We are reading from a reference,
        // we have wrapped self in ManuallyDrop to prevent a double-free
        unsafe { ptr::read(&levitating.cell) }.into_raw()
    }

    /// # Safety
    /// `tag` must describe what `buf` holds.
    pub(crate) unsafe fn from_raw(tag: usize, buf: MaybeUninit<L::Storage>) -> Self {
        Variant {
            cell: StorageCell::from_raw(tag, buf),
        }
    }
}

impl<L> Drop for Variant<L>
where
    L: Catalog,
{
    fn drop(&mut self) {
        self.cell.clear()
    }
}

impl<L> Default for Variant<L>
where
    L: Catalog,
{
    fn default() -> Self {
        Variant::empty()
    }
}

impl<L> Clone for Variant<L>
where
    L: Catalog + Dispatch<CloneInto> + Dispatch<CloneFrom>,
{
    fn clone(&self) -> Self {
        Variant {
            cell: self.cell.duplicate(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        match (self.cell.index(), source.cell.index()) {
            (Some(ours), Some(theirs)) if ours == theirs => {
                self.cell.modify(CloneFrom(source.cell.as_ptr()));
            }
            _ => {
                let copy = source.cell.duplicate();
                self.cell.clear();
                self.cell = copy;
            }
        }
    }
}

impl<L> fmt::Debug for Variant<L>
where
    L: Catalog + for<'f, 'a> Dispatch<Format<'f, 'a>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("Variant");
        if let Some(index) = self.cell.index() {
            // # Safety
            // The cell holds a live value at `index` for as long as we borrow it
            tuple.field(&unsafe { Live::<L>::new(index, self.cell.as_ptr()) });
        }
        tuple.finish()
    }
}
