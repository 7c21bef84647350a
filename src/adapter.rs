use core::marker::PhantomData;
use varicell_catalog::Member;

use crate::{cell::StorageCell, AccessError};

/// Everything a variant does to one alternative `T`, at position `I`.
///
/// The adapter is the only code that constructs, reassigns or destroys a `T`
/// inside a [`StorageCell`]; `Variant` picks the adapter from the static type
/// of its argument and never touches typed storage itself.
pub(crate) struct Alternative<T, I>(PhantomData<fn() -> (T, I)>);

impl<T, I> Alternative<T, I> {
    /// Places `value` in a vacant cell.
    pub(crate) fn construct<L>(cell: &mut StorageCell<L>, value: T)
    where
        L: Member<T, I>,
    {
        assert_eq!(cell.tag(), 0, "constructing into an occupied cell");
        // # Safety
        // Checked vacant just above
        unsafe { cell.write_as::<T, I>(value) }
    }

    pub(crate) fn is_active<L>(cell: &StorageCell<L>) -> bool
    where
        L: Member<T, I>,
    {
        cell.holds::<T, I>()
    }

    /// Drops the `T` if it is what the cell holds. Returns whether it did.
    pub(crate) fn destroy_if_active<L>(cell: &mut StorageCell<L>) -> bool
    where
        L: Member<T, I>,
    {
        if !Self::is_active(cell) {
            return false;
        }
        // # Safety
        // The cell holds a `T`
        unsafe { cell.destroy_as::<T, I>() };
        true
    }

    /// Moves `value` into the cell. A `T` already there is overwritten in
    /// place and the discriminator is untouched; any other occupant is
    /// destroyed first.
    pub(crate) fn assign<L>(cell: &mut StorageCell<L>, value: T) -> &mut T
    where
        L: Member<T, I>,
    {
        if Self::is_active(cell) {
            // # Safety
            // The cell holds a `T`
            let slot = unsafe { cell.read_as_mut::<T, I>() };
            *slot = value;
            slot
        } else {
            cell.clear();
            Self::construct(cell, value);
            // # Safety
            // We just constructed a `T`
            unsafe { cell.read_as_mut::<T, I>() }
        }
    }

    /// Copies `value` into the cell. A `T` already there is updated with
    /// `clone_from`, so no value is created or dropped by the cell. Otherwise
    /// the clone is made before the old occupant is destroyed, so a panicking
    /// `clone` leaves the cell as it was.
    pub(crate) fn assign_cloned<'c, L>(cell: &'c mut StorageCell<L>, value: &T) -> &'c mut T
    where
        L: Member<T, I>,
        T: Clone,
    {
        if Self::is_active(cell) {
            // # Safety
            // The cell holds a `T`
            let slot = unsafe { cell.read_as_mut::<T, I>() };
            slot.clone_from(value);
            slot
        } else {
            let fresh = value.clone();
            Self::assign(cell, fresh)
        }
    }

    pub(crate) fn get<L>(cell: &StorageCell<L>) -> Result<&T, AccessError>
    where
        L: Member<T, I>,
    {
        AccessError::check::<L, T, I>(cell.tag())?;
        // # Safety
        // The check confirmed the cell holds a `T`
        Ok(unsafe { cell.read_as::<T, I>() })
    }

    pub(crate) fn get_mut<L>(cell: &mut StorageCell<L>) -> Result<&mut T, AccessError>
    where
        L: Member<T, I>,
    {
        AccessError::check::<L, T, I>(cell.tag())?;
        // # Safety
        // The check confirmed the cell holds a `T`
        Ok(unsafe { cell.read_as_mut::<T, I>() })
    }

    /// Moves the `T` out, leaving the cell vacant.
    pub(crate) fn take<L>(cell: &mut StorageCell<L>) -> Result<T, AccessError>
    where
        L: Member<T, I>,
    {
        AccessError::check::<L, T, I>(cell.tag())?;
        // # Safety
        // The check confirmed the cell holds a `T`
        Ok(unsafe { cell.take_as::<T, I>() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use varicell_catalog::catalog;

    type L = catalog![u32, Rc<String>];

    #[test]
    fn destroy_if_active_ignores_other_alternatives() {
        let shared = Rc::new(String::from("kept"));
        let mut cell = StorageCell::<L>::vacant();
        Alternative::construct(&mut cell, Rc::clone(&shared));

        assert!(!Alternative::<u32, _>::destroy_if_active(&mut cell));
        assert_eq!(Rc::strong_count(&shared), 2);

        assert!(Alternative::<Rc<String>, _>::destroy_if_active(&mut cell));
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(cell.tag(), 0);
    }

    #[test]
    fn assign_switches_alternatives() {
        let shared = Rc::new(String::from("old"));
        let mut cell = StorageCell::<L>::vacant();
        Alternative::construct(&mut cell, Rc::clone(&shared));

        *Alternative::assign(&mut cell, 5u32) += 1;
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(Alternative::<u32, _>::get(&cell), Ok(&6));
        cell.clear();
    }

    #[test]
    fn assign_cloned_reuses_a_matching_slot() {
        let mut cell = StorageCell::<L>::vacant();
        Alternative::construct(&mut cell, 1u32);
        let tag = cell.tag();
        Alternative::assign_cloned(&mut cell, &9u32);
        assert_eq!(cell.tag(), tag);
        assert_eq!(Alternative::<u32, _>::take(&mut cell), Ok(9));
        assert_eq!(Alternative::<u32, _>::take(&mut cell), Err(AccessError::Empty));
    }

    #[test]
    #[should_panic(expected = "occupied cell")]
    fn construct_refuses_an_occupied_cell() {
        let mut cell = StorageCell::<L>::vacant();
        Alternative::construct(&mut cell, 1u32);
        Alternative::construct(&mut cell, 2u32);
    }
}
