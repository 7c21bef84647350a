//! Type-level lists of alternatives for the `varicell` crate.
//!
//! A catalog is an ordered cons list of types, `Cons<A, Cons<B, Nil>>`, usually
//! spelled with [`catalog!`]. The list answers the questions a tagged union
//! needs answered at compile time: where a type sits in the list, and how much
//! room the largest member needs.
#![no_std]

use core::{
    any,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
};

mod dispatch;

pub use dispatch::{Destroy, Dispatch, Handle, Operation};

/// The end of a catalog.
pub enum Nil {}

/// A catalog whose first alternative is `H`, followed by the alternatives of `T`.
pub struct Cons<H, T>(PhantomData<fn() -> (H, T)>, Nil);

/// Position marker for the head of a catalog.
pub enum Here {}

/// Position marker for the alternative one step further down the list than `I`.
pub struct There<I>(PhantomData<fn() -> I>, Nil);

/// Storage for a catalog: every alternative overlaid at offset 0.
#[repr(C)]
#[allow(dead_code)]
pub union Slot<H, S> {
    head: ManuallyDrop<H>,
    tail: ManuallyDrop<S>,
}

/// Builds a catalog type out of a list of alternatives.
/// ```rust
/// # use varicell_catalog::{catalog, Catalog, Cons, Nil};
/// type Numbers = catalog![u8, u32, f64];
/// assert_eq!(Numbers::LEN, 3);
/// let _: Option<Cons<u8, Cons<u32, Cons<f64, Nil>>>> = None::<Numbers>;
/// ```
#[macro_export]
macro_rules! catalog {
    () => { $crate::Nil };
    ($head:ty $(, $tail:ty)* $(,)?) => {
        $crate::Cons<$head, $crate::catalog!($($tail),*)>
    };
}

/// The behaviour of an ordered, fixed list of alternative types.
///
/// # Safety
/// `Storage` must be large and aligned enough to hold every alternative at
/// offset 0, and `name_of` must agree with the order `Member::INDEX` reports.
/// The only implementors are [`Cons`] and [`Nil`].
pub unsafe trait Catalog: Dispatch<Destroy> {
    /// The number of alternatives in the list.
    const LEN: usize;

    /// Size in bytes of the largest alternative, padded to `MAX_ALIGN`.
    const MAX_SIZE: usize = mem::size_of::<Self::Storage>();

    /// The strictest alignment among the alternatives.
    const MAX_ALIGN: usize = mem::align_of::<Self::Storage>();

    /// The number of bits needed to store a discriminator in `0..=LEN`.
    const BITS: usize = (usize::BITS - Self::LEN.leading_zeros()) as usize;

    /// Uninterpreted memory that can hold any one alternative.
    type Storage;

    /// The type name of the alternative at zero-based `index`.
    fn name_of(index: usize) -> Option<&'static str>;
}

unsafe impl Catalog for Nil {
    const LEN: usize = 0;

    type Storage = ();

    fn name_of(_: usize) -> Option<&'static str> {
        None
    }
}

unsafe impl<H, T> Catalog for Cons<H, T>
where
    T: Catalog,
{
    const LEN: usize = T::LEN + 1;

    type Storage = Slot<H, T::Storage>;

    fn name_of(index: usize) -> Option<&'static str> {
        match index {
            0 => Some(any::type_name::<H>()),
            n => T::name_of(n - 1),
        }
    }
}

/// `T` is one of the alternatives of this catalog, found at position `I`.
///
/// `I` is inferred: write `Member<T, _>` bounds through generic functions and
/// let the compiler find the position. A type listed twice has two positions
/// and fails inference, a type not listed has none.
///
/// # Safety
/// `INDEX` must be the zero-based position of `T` in the list.
pub unsafe trait Member<T, I>: Catalog {
    const INDEX: usize;
}

unsafe impl<H, T> Member<H, Here> for Cons<H, T>
where
    T: Catalog,
{
    const INDEX: usize = 0;
}

unsafe impl<H, X, T, I> Member<X, There<I>> for Cons<H, T>
where
    T: Member<X, I>,
{
    const INDEX: usize = T::INDEX + 1;
}

/// Zero-based position of `T` in `L`.
/// ```rust
/// # use varicell_catalog::{catalog, index_of};
/// assert_eq!(index_of::<catalog![u8, char, bool], char, _>(), 1);
/// ```
pub fn index_of<L, T, I>() -> usize
where
    L: Member<T, I>,
{
    L::INDEX
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::mem::{align_of, size_of};
    use std::string::String;

    type Mixed = catalog![u8, String, [u64; 3], u16];

    #[test]
    fn len_counts_alternatives() {
        assert_eq!(<catalog![] as Catalog>::LEN, 0);
        assert_eq!(<catalog![u8] as Catalog>::LEN, 1);
        assert_eq!(Mixed::LEN, 4);
    }

    #[test]
    fn indices_follow_declaration_order() {
        assert_eq!(index_of::<Mixed, u8, _>(), 0);
        assert_eq!(index_of::<Mixed, String, _>(), 1);
        assert_eq!(index_of::<Mixed, [u64; 3], _>(), 2);
        assert_eq!(index_of::<Mixed, u16, _>(), 3);
    }

    #[test]
    fn storage_fits_every_alternative() {
        assert!(Mixed::MAX_SIZE >= size_of::<u8>());
        assert!(Mixed::MAX_SIZE >= size_of::<String>());
        assert!(Mixed::MAX_SIZE >= size_of::<[u64; 3]>());
        assert_eq!(Mixed::MAX_ALIGN, align_of::<u64>().max(align_of::<String>()));
        assert_eq!(<catalog![u8, u16] as Catalog>::MAX_SIZE, 2);
        assert_eq!(<catalog![u8, u16] as Catalog>::MAX_ALIGN, 2);
    }

    #[test]
    fn bits_cover_the_empty_tag() {
        assert_eq!(<catalog![u8] as Catalog>::BITS, 1);
        assert_eq!(<catalog![u8, u16] as Catalog>::BITS, 2);
        assert_eq!(<catalog![u8, u16, u32] as Catalog>::BITS, 2);
        assert_eq!(Mixed::BITS, 3);
    }

    #[test]
    fn names_line_up_with_indices() {
        assert_eq!(Mixed::name_of(0), Some("u8"));
        assert_eq!(Mixed::name_of(3), Some("u16"));
        assert!(Mixed::name_of(1).unwrap().ends_with("String"));
        assert_eq!(Mixed::name_of(4), None);
    }
}
