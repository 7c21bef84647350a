use core::{mem::MaybeUninit, ptr};
use varicell_catalog::{Catalog, Destroy, Dispatch, Member, Operation};

use crate::ops::CloneInto;

/// Uninitialized storage for one alternative of `L`, labelled by a discriminator.
///
/// `tag == 0` means nothing is stored. `tag == k` means `buf` holds a live
/// value of the alternative at index `k - 1`. Every method keeps the two in
/// step, and the tag is always cleared before a destructor runs so a panic
/// inside one can never lead to a second drop.
pub(crate) struct StorageCell<L: Catalog> {
    tag: usize,
    buf: MaybeUninit<L::Storage>,
}

impl<L> StorageCell<L>
where
    L: Catalog,
{
    const INHABITED: () = assert!(L::LEN > 0, "a catalog needs at least one alternative");

    pub(crate) fn vacant() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::INHABITED;
        Self {
            tag: 0,
            buf: MaybeUninit::uninit(),
        }
    }

    /// # Safety
    /// `tag` must describe what `buf` holds.
    pub(crate) unsafe fn from_raw(tag: usize, buf: MaybeUninit<L::Storage>) -> Self {
        debug_assert!(tag <= L::LEN);
        Self { tag, buf }
    }

    /// Splits the cell into its discriminator and bytes. The caller becomes
    /// responsible for the live value, if any.
    pub(crate) fn into_raw(self) -> (usize, MaybeUninit<L::Storage>) {
        (self.tag, self.buf)
    }

    pub(crate) fn tag(&self) -> usize {
        self.tag
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.tag.checked_sub(1)
    }

    pub(crate) fn holds<T, I>(&self) -> bool
    where
        L: Member<T, I>,
    {
        self.tag == L::INDEX + 1
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr().cast()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr().cast()
    }

    /// # Safety
    /// The cell must be vacant.
    pub(crate) unsafe fn write_as<T, I>(&mut self, value: T)
    where
        L: Member<T, I>,
    {
        debug_assert_eq!(self.tag, 0, "writing over a live alternative");
        self.as_mut_ptr().cast::<T>().write(value);
        self.tag = L::INDEX + 1;
    }

    /// # Safety
    /// The cell must hold a `T`.
    pub(crate) unsafe fn read_as<T, I>(&self) -> &T
    where
        L: Member<T, I>,
    {
        debug_assert!(self.holds::<T, I>());
        &*self.as_ptr().cast::<T>()
    }

    /// # Safety
    /// The cell must hold a `T`.
    pub(crate) unsafe fn read_as_mut<T, I>(&mut self) -> &mut T
    where
        L: Member<T, I>,
    {
        debug_assert!(self.holds::<T, I>());
        &mut *self.as_mut_ptr().cast::<T>()
    }

    /// Moves the `T` out, leaving the cell vacant.
    ///
    /// # Safety
    /// The cell must hold a `T`.
    pub(crate) unsafe fn take_as<T, I>(&mut self) -> T
    where
        L: Member<T, I>,
    {
        debug_assert!(self.holds::<T, I>());
        self.tag = 0;
        ptr::read(self.as_ptr().cast::<T>())
    }

    /// # Safety
    /// The cell must hold a `T`.
    pub(crate) unsafe fn destroy_as<T, I>(&mut self)
    where
        L: Member<T, I>,
    {
        debug_assert!(self.holds::<T, I>());
        self.tag = 0;
        ptr::drop_in_place(self.as_mut_ptr().cast::<T>());
    }

    /// Destroys whatever is live. Vacant cells are left alone.
    pub(crate) fn clear(&mut self) {
        if let Some(index) = self.index() {
            self.tag = 0;
            // # Safety
            // The tag said `index` was live; it is now unreachable through the tag.
            unsafe { L::dispatch(index, self.as_mut_ptr(), Destroy) }
        }
    }

    /// Gives up the live value without dropping it and returns its index.
    /// The bytes stay in `buf` until overwritten.
    pub(crate) fn forget(&mut self) -> Option<usize> {
        let index = self.index();
        self.tag = 0;
        index
    }

    /// Runs `op` on the live alternative through a shared borrow.
    ///
    /// # Safety
    /// `op` must not write through the pointer it is handed.
    pub(crate) unsafe fn inspect<Op>(&self, op: Op) -> Option<Op::Output>
    where
        L: Dispatch<Op>,
        Op: Operation,
    {
        let index = self.index()?;
        Some(L::dispatch(index, self.as_ptr() as *mut u8, op))
    }

    /// Runs `op` on the live alternative.
    pub(crate) fn modify<Op>(&mut self, op: Op) -> Option<Op::Output>
    where
        L: Dispatch<Op>,
        Op: Operation,
    {
        let index = self.index()?;
        // # Safety
        // The tag names the live alternative and we hold the only borrow.
        Some(unsafe { L::dispatch(index, self.as_mut_ptr(), op) })
    }

    /// A new cell holding a clone of whatever `src` points at.
    ///
    /// # Safety
    /// `tag` must describe the storage behind `src`.
    pub(crate) unsafe fn duplicate_raw(tag: usize, src: *const u8) -> Self
    where
        L: Dispatch<CloneInto>,
    {
        let mut copy = Self::vacant();
        if let Some(index) = tag.checked_sub(1) {
            L::dispatch(index, src as *mut u8, CloneInto(copy.as_mut_ptr()));
            // Only label the bytes once the clone has finished
            copy.tag = tag;
        }
        copy
    }

    pub(crate) fn duplicate(&self) -> Self
    where
        L: Dispatch<CloneInto>,
    {
        // # Safety
        // Our own tag describes our own bytes.
        unsafe { Self::duplicate_raw(self.tag, self.as_ptr()) }
    }
}
