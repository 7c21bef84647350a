extern crate alloc;
use alloc::vec::Vec;
use bitvec::{field::BitField, prelude::*};
use core::{
    cmp,
    fmt::{self, Debug, Display},
    mem::{ManuallyDrop, MaybeUninit},
    ptr,
};
use varicell_catalog::{Catalog, Dispatch, Member};

use crate::{
    cell::StorageCell,
    ops::{CloneInto, Format, Live},
    visit::{Accept, AcceptMut, Visitor},
    AccessError, Variant,
};

// credit: https://veykril.github.io/tlborm/decl-macros/building-blocks/counting.html#bit-twiddling
#[doc(hidden)]
#[macro_export]
macro_rules! count_tts {
    () => { 0 };
    ($odd:tt $($a:tt $b:tt)*) => { ($crate::count_tts!($($a)*) << 1) | 1 };
    ($($a:tt $even:tt)*) => { $crate::count_tts!($($a)*) << 1 };
}

#[macro_export]
/// A nice way to generate a `VariantVec` from a list of values. If you're
/// familiar with the `vec![]` macro, this is `VariantVec`'s equivalent. Each
/// element is turned into a `Variant` with `Variant::new`.
/// ```rust
/// # use varicell::{catalog, varvec, Variant, VariantVec};
/// let mut fast: VariantVec<catalog![u8, char]> = varvec![1u8, 'b'];
///
/// // is the same as
///
/// let mut slow = VariantVec::<catalog![u8, char]>::with_capacity(2);
/// slow.push(Variant::new(1u8));
/// slow.push(Variant::new('b'));
/// # assert_eq!(fast.len(), slow.len());
/// ```
macro_rules! varvec {
    () => {
        $crate::VariantVec::new()
    };
    ($($elem:expr),+ $(,)?) => {
        {
            let count = $crate::count_tts!($($elem)*);
            let mut vv = $crate::VariantVec::with_capacity(count);
            $(vv.push($crate::Variant::new($elem));)*
            vv
        }
    };
}

/// A `vec`-like data structure for compactly storing [`Variant`]s.
///
/// Payloads are stored back to back without their discriminators, which are
/// packed into a bit vector using `L::BITS` bits each.
pub struct VariantVec<L: Catalog> {
    tags: BitVec,
    data: Vec<MaybeUninit<L::Storage>>,
}

impl<L> VariantVec<L>
where
    L: Catalog,
{
    /// Create a new `VariantVec` with 0 capacity and 0 length. This does not allocate.
    pub fn new() -> Self {
        VariantVec {
            tags: BitVec::new(),
            data: Vec::new(),
        }
    }

    /// Creates a new collection with enough space to add `capacity` elements
    /// without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tags: BitVec::with_capacity(capacity * L::BITS),
            data: Vec::with_capacity(capacity),
        }
    }

    // **Note**: index must be in range
    fn get_tag(&self, index: usize) -> usize {
        self.tags[index * L::BITS..(index + 1) * L::BITS].load()
    }

    // **Note**: index must be in range
    fn set_tag(&mut self, index: usize, tag: usize) {
        self.tags[index * L::BITS..(index + 1) * L::BITS].store::<usize>(tag);
    }

    fn push_raw(&mut self, tag: usize, data: MaybeUninit<L::Storage>) {
        let pos = self.data.len();

        // Naively pushing seems to be faster than something like
        // self.tags
        //     .extend_from_bitslice(&BitView::view_bits::<Lsb0>(&[tag])[0..L::BITS]);
        for _ in 0..L::BITS {
            self.tags.push(false)
        }

        // The data goes in second: if growing `tags` panics, `data` must not
        // end up with an untagged payload. Cruft left on the end of `tags` is
        // harmless as the length always comes from `data`.
        self.data.push(data);

        self.set_tag(pos, tag);
    }

    /// Append a new element to the end of the collection.
    ///
    /// ## Panics
    /// Panics if the underlying `bitvec` or `Vec` panics, i.e. when the
    /// allocation would exceed `isize::MAX` bytes or the maximum tag capacity
    /// of the bit vector.
    pub fn push(&mut self, variant: Variant<L>) {
        let (tag, data) = variant.into_raw();
        self.push_raw(tag, data);
    }

    /// Remove an element from the end of the collection.
    /// Returns `None` if the collection is empty.
    pub fn pop(&mut self) -> Option<Variant<L>> {
        let data = self.data.pop()?;

        // `len` is now the position of the element we removed
        let len = self.data.len();
        let tag = self.get_tag(len);

        // Remove the last tag
        self.tags.truncate(len * L::BITS);

        // # Safety
        // The tag matches the data
        unsafe { Some(Variant::from_raw(tag, data)) }
    }

    /// Returns the number of elements in the collection.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the collection is empty (it contains no elements).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserves room for at least `elements` more elements.
    pub fn reserve(&mut self, elements: usize) {
        self.data.reserve(elements);
        self.tags.reserve(elements * L::BITS);
    }

    /// Removes all elements from the collection.
    /// **Note**: this does not affect its allocated capacity.
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Shortens the collection so it only contains the first `len` elements,
    /// dropping the rest back to front.
    /// **Note**: this does not affect its allocated capacity.
    pub fn truncate(&mut self, len: usize) {
        while self.len() > len {
            self.pop();
        }
    }

    /// Returns the number of elements the collection can hold
    /// without reallocating.
    pub fn capacity(&self) -> usize {
        let tag_cap = self.tags.capacity() / L::BITS;
        let data_cap = self.data.capacity();
        cmp::min(tag_cap, data_cap)
    }

    /// Adds `other` to the end of `self`, so the new collection
    /// now contains all the elements of `self` followed by the elements
    /// of `other`.
    pub fn append(&mut self, other: VariantVec<L>) {
        self.extend(other);
    }

    /// The catalog position of the element at `index`; `Some(None)` for an
    /// empty variant, `None` when `index` is out of bounds.
    pub fn index_of(&self, index: usize) -> Option<Option<usize>> {
        (index < self.len()).then(|| self.get_tag(index).checked_sub(1))
    }

    /// Returns whether the element at `index` holds a `T`.
    pub fn is<T, I>(&self, index: usize) -> bool
    where
        L: Member<T, I>,
    {
        index < self.len() && self.get_tag(index) == L::INDEX + 1
    }

    fn checked<T, I>(&self, index: usize) -> Result<(), AccessError>
    where
        L: Member<T, I>,
    {
        if index >= self.len() {
            return Err(AccessError::OutOfBounds {
                index,
                len: self.len(),
            });
        }
        AccessError::check::<L, T, I>(self.get_tag(index))
    }

    /// Borrows the `T` held at `index`.
    pub fn get<T, I>(&self, index: usize) -> Result<&T, AccessError>
    where
        L: Member<T, I>,
    {
        self.checked::<T, I>(index)?;
        // # Safety
        // The tag at `index` says the storage holds a `T`
        Ok(unsafe { &*self.data[index].as_ptr().cast::<T>() })
    }

    /// Mutably borrows the `T` held at `index`.
    pub fn get_mut<T, I>(&mut self, index: usize) -> Result<&mut T, AccessError>
    where
        L: Member<T, I>,
    {
        self.checked::<T, I>(index)?;
        // # Safety
        // The tag at `index` says the storage holds a `T`
        Ok(unsafe { &mut *self.data[index].as_mut_ptr().cast::<T>() })
    }

    /// Runs `visitor` on the element at `index`.
    pub fn visit<V>(&self, index: usize, visitor: V) -> Result<V::Output, AccessError>
    where
        V: Visitor,
        L: Dispatch<Accept<V>>,
    {
        let alternative = self.live(index)?;
        // # Safety
        // The tag names the live alternative and `Accept` only reads
        Ok(unsafe {
            L::dispatch(
                alternative,
                self.data[index].as_ptr() as *mut u8,
                Accept(visitor),
            )
        })
    }

    /// Runs `visitor` on the element at `index`, allowing it to modify the value.
    pub fn visit_mut<V>(&mut self, index: usize, visitor: V) -> Result<V::Output, AccessError>
    where
        V: Visitor,
        L: Dispatch<AcceptMut<V>>,
    {
        let alternative = self.live(index)?;
        // # Safety
        // The tag names the live alternative and we hold the only borrow
        Ok(unsafe {
            L::dispatch(
                alternative,
                self.data[index].as_mut_ptr().cast(),
                AcceptMut(visitor),
            )
        })
    }

    // The alternative index of a non-empty element
    fn live(&self, index: usize) -> Result<usize, AccessError> {
        match self.index_of(index) {
            None => Err(AccessError::OutOfBounds {
                index,
                len: self.len(),
            }),
            Some(None) => Err(AccessError::Empty),
            Some(Some(alternative)) => Ok(alternative),
        }
    }

    fn cleave(self) -> (BitVec, Vec<MaybeUninit<L::Storage>>) {
        let levitating = ManuallyDrop::new(self);
        unsafe {
            (
                // # Safety
                // We are reading from a reference,
                // we have wrapped self in ManuallyDrop to prevent a double-free
                ptr::read(&levitating.tags),
                ptr::read(&levitating.data),
            )
        }
    }
}

impl<L> Drop for VariantVec<L>
where
    L: Catalog,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<L> From<VariantVec<L>> for Vec<Variant<L>>
where
    L: Catalog,
{
    fn from(vv: VariantVec<L>) -> Self {
        vv.into_iter().collect()
    }
}

impl<L> From<Vec<Variant<L>>> for VariantVec<L>
where
    L: Catalog,
{
    fn from(v: Vec<Variant<L>>) -> Self {
        let mut vv = VariantVec::with_capacity(v.len());
        vv.extend(v);
        vv
    }
}

impl<L> Default for VariantVec<L>
where
    L: Catalog,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<L> IntoIterator for VariantVec<L>
where
    L: Catalog,
{
    type Item = Variant<L>;

    type IntoIter = IntoIter<L>;

    fn into_iter(self) -> Self::IntoIter {
        let (tags, data) = self.cleave();
        let back = data.len();
        IntoIter {
            tags,
            data,
            front: 0,
            back,
        }
    }
}

/// An owning iterator over the elements of a [`VariantVec`].
pub struct IntoIter<L>
where
    L: Catalog,
{
    tags: BitVec,
    data: Vec<MaybeUninit<L::Storage>>,
    // Elements in front..back have not been yielded yet
    front: usize,
    back: usize,
}

impl<L> IntoIter<L>
where
    L: Catalog,
{
    // **Note**: `index` must be in front..back, and is never read again
    unsafe fn read(&self, index: usize) -> Variant<L> {
        let tag = self.tags[index * L::BITS..(index + 1) * L::BITS].load();
        // # Safety
        // The tag matches the data, and the caller moves past `index`
        Variant::from_raw(tag, ptr::read(&self.data[index]))
    }
}

impl<L> Iterator for IntoIter<L>
where
    L: Catalog,
{
    type Item = Variant<L>;

    fn next(&mut self) -> Option<Self::Item> {
        // Are we done iterating?
        if self.front == self.back {
            return None;
        }
        let elem = unsafe { self.read(self.front) };
        self.front += 1;
        Some(elem)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<L> DoubleEndedIterator for IntoIter<L>
where
    L: Catalog,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        // Are we done iterating?
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { self.read(self.back) })
    }
}

impl<L> ExactSizeIterator for IntoIter<L> where L: Catalog {}

impl<L> Drop for IntoIter<L>
where
    L: Catalog,
{
    fn drop(&mut self) {
        for _ in self {}
        // When the drop glue for self drops self.data,
        // nothing gets dropped as the elements are MaybeUninit,
        // so all the dropping happens when we iterate over self
    }
}

impl<L> Debug for VariantVec<L>
where
    L: Catalog + for<'f, 'a> Dispatch<Format<'f, 'a>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (index, data) in self.data.iter().enumerate() {
            match self.get_tag(index).checked_sub(1) {
                // # Safety
                // The tag names the live alternative, borrowed for the whole loop
                Some(alternative) => {
                    list.entry(&unsafe { Live::<L>::new(alternative, data.as_ptr().cast()) })
                }
                None => list.entry(&format_args!("<empty>")),
            };
        }
        list.finish()
    }
}

impl<L> Display for VariantVec<L>
where
    L: Catalog,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for i in 0..self.len() {
            let name = self
                .get_tag(i)
                .checked_sub(1)
                .and_then(L::name_of)
                .unwrap_or("<empty>");
            write!(f, " {{ tag: {}, data: {} }},", self.get_tag(i), name)?;
        }
        f.write_str(" ]")
    }
}

impl<L> Extend<Variant<L>> for VariantVec<L>
where
    L: Catalog,
{
    fn extend<A: IntoIterator<Item = Variant<L>>>(&mut self, iter: A) {
        // If we can, reserve space ahead of time
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for elem in iter {
            self.push(elem);
        }
    }
}

impl<L> FromIterator<Variant<L>> for VariantVec<L>
where
    L: Catalog,
{
    fn from_iter<A: IntoIterator<Item = Variant<L>>>(iter: A) -> Self {
        let mut vv = VariantVec::<L>::new();
        vv.extend(iter);
        vv
    }
}

impl<L> Clone for VariantVec<L>
where
    L: Catalog + Dispatch<CloneInto>,
{
    fn clone(&self) -> Self {
        let mut copy = VariantVec::with_capacity(self.len());
        for (index, data) in self.data.iter().enumerate() {
            // # Safety
            // The tag at `index` describes `data`
            let cell = unsafe {
                StorageCell::<L>::duplicate_raw(self.get_tag(index), data.as_ptr().cast())
            };
            let (tag, data) = cell.into_raw();
            copy.push_raw(tag, data);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, Visit};
    use std::rc::Rc;

    type TestData = catalog![u16, String, (u8, f64)];

    struct Width;

    impl Visitor for Width {
        type Output = usize;
    }

    impl Visit<u16> for Width {
        fn visit(&mut self, _: &u16) -> usize {
            2
        }
    }

    impl Visit<String> for Width {
        fn visit(&mut self, value: &String) -> usize {
            value.len()
        }
    }

    impl Visit<(u8, f64)> for Width {
        fn visit(&mut self, _: &(u8, f64)) -> usize {
            9
        }
    }

    fn sample() -> VariantVec<TestData> {
        varvec![
            1u16,
            String::from("two"),
            (3u8, 3.0f64),
            4u16,
            String::from("five"),
            (6u8, 6.0f64),
            7u16
        ]
    }

    #[test]
    fn exact_size_iterator() {
        let mut vv = sample().into_iter();
        assert_eq!(vv.len(), 7);
        assert_eq!(vv.size_hint(), (7, Some(7)));
        vv.next();
        assert_eq!(vv.len(), 6);
        assert_eq!(vv.size_hint(), (6, Some(6)));
        for _ in 0..10 {
            vv.next();
        }
        assert_eq!(vv.len(), 0);
        assert_eq!(vv.size_hint(), (0, Some(0)));
    }

    #[test]
    fn double_ended_iterator() {
        let mut vv = sample().into_iter();
        assert_eq!(vv.next_back().unwrap().get::<u16, _>(), Ok(&7));
        assert_eq!(vv.next().unwrap().get::<u16, _>(), Ok(&1));
        assert!(vv.next_back().unwrap().is::<(u8, f64), _>());
        assert_eq!(
            vv.next().unwrap().into_inner::<String, _>().as_deref(),
            Ok("two")
        );
        assert_eq!(vv.len(), 3);
        assert_eq!(vv.map(|v| v.index()).collect::<Vec<_>>(), [Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn new_is_empty() {
        let vv = VariantVec::<TestData>::new();
        assert_eq!(vv.len(), 0);
        assert!(vv.is_empty());
        assert_eq!(vv.capacity(), 0);
    }

    #[test]
    fn push_increases_len() {
        let mut vv = VariantVec::<TestData>::new();
        vv.push(Variant::new(1u16));
        vv.push(Variant::new(String::new()));
        vv.push(Variant::empty());
        assert_eq!(vv.len(), 3);
        assert_eq!(vv.index_of(1), Some(Some(1)));
        assert_eq!(vv.index_of(2), Some(None));
        assert_eq!(vv.index_of(3), None);
    }

    #[test]
    fn pop_works() {
        let mut vv = VariantVec::<TestData>::new();
        assert!(vv.pop().is_none());
        vv.push(Variant::new(String::from("back")));
        let v = vv.pop().unwrap();
        assert_eq!(v.get::<String, _>().map(String::as_str), Ok("back"));
        assert!(vv.is_empty());
    }

    #[test]
    fn typed_access_checks_tag_and_bounds() {
        let mut vv = sample();
        assert!(vv.is::<String, _>(1));
        assert!(!vv.is::<u16, _>(1));
        assert!(!vv.is::<u16, _>(100));
        assert_eq!(vv.get::<u16, _>(3), Ok(&4));
        assert!(matches!(
            vv.get::<u16, _>(1),
            Err(AccessError::WrongAlternative { expected: "u16", .. })
        ));
        assert_eq!(
            vv.get::<u16, _>(7),
            Err(AccessError::OutOfBounds { index: 7, len: 7 })
        );
        vv.get_mut::<String, _>(4).unwrap().push('!');
        assert_eq!(vv.get::<String, _>(4).map(String::as_str), Ok("five!"));
    }

    #[test]
    fn visit_reads_each_slot() {
        let mut vv = sample();
        vv.push(Variant::empty());
        assert_eq!(vv.visit(1, Width), Ok(3));
        assert_eq!(vv.visit(2, Width), Ok(9));
        assert_eq!(vv.visit(7, Width), Err(AccessError::Empty));
        assert_eq!(
            vv.visit(8, Width),
            Err(AccessError::OutOfBounds { index: 8, len: 8 })
        );
    }

    #[test]
    fn clear_and_truncate_drop_removed_elements() {
        type Shared = catalog![u8, Rc<()>];
        let marker = Rc::new(());
        let mut vv: VariantVec<Shared> = (0..6)
            .map(|_| Variant::new(Rc::clone(&marker)))
            .collect();
        assert_eq!(Rc::strong_count(&marker), 7);
        vv.truncate(2);
        assert_eq!(Rc::strong_count(&marker), 3);
        vv.clear();
        assert_eq!(vv.len(), 0);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn dropping_collections_and_iterators_releases_values() {
        type Shared = catalog![u8, Rc<()>];
        let marker = Rc::new(());
        let vv: VariantVec<Shared> = varvec![Rc::clone(&marker), 1u8, Rc::clone(&marker)];
        let copy = vv.clone();
        assert_eq!(Rc::strong_count(&marker), 5);
        drop(vv);
        assert_eq!(Rc::strong_count(&marker), 3);
        let mut iter = copy.into_iter();
        let first = iter.next().unwrap();
        drop(iter);
        assert_eq!(Rc::strong_count(&marker), 2);
        drop(first);
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn converts_to_and_from_vec() {
        let v: Vec<Variant<TestData>> = sample().into();
        assert_eq!(v.len(), 7);
        let vv = VariantVec::from(v);
        assert_eq!(vv.get::<String, _>(1).map(String::as_str), Ok("two"));
        let mut appended = varvec![9u16];
        appended.append(vv);
        assert_eq!(appended.len(), 8);
    }

    #[test]
    fn formatting() {
        let vv: VariantVec<TestData> = varvec![1u16, String::from("a")];
        assert_eq!(format!("{vv:?}"), "[1, \"a\"]");
        assert_eq!(
            format!("{vv}"),
            format!(
                "[ {{ tag: 1, data: u16 }}, {{ tag: 2, data: {} }}, ]",
                std::any::type_name::<String>()
            )
        );
    }
}
