//! Closed-set tagged unions over type lists.
//!
//! A [`Variant<L>`](Variant) holds one value of one of the types in the
//! catalog `L`, inline and without allocating. Catalogs are written with
//! [`catalog!`]:
//!
//! ```rust
//! use varicell::{catalog, Variant};
//!
//! type Setting = Variant<catalog![i64, f64, String]>;
//!
//! let mut timeout: Setting = Variant::new(30i64);
//! timeout.set(2.5f64);
//! assert_eq!(timeout.get::<f64, _>(), Ok(&2.5));
//! assert!(timeout.get::<i64, _>().is_err());
//! ```
//!
//! Reading a value runs through [`Variant::get`] and friends, or through a
//! [`Visitor`] implementing [`Visit`] for every alternative. Enums that wrap
//! one value per variant can be converted with `#[derive(Alternatives)]`, and
//! many variants can be packed densely in a [`VariantVec`].
//!
//! `Variant` itself never allocates. `VariantVec` is a heap-backed column
//! built on top of it, available behind the `vec` feature.

// Lets the derive's `::varicell` paths resolve inside this crate's own tests
extern crate self as varicell;

mod adapter;
mod alternatives;
mod cell;
mod embed;
mod error;
pub mod ops;
mod variant;
#[cfg(feature = "vec")]
mod vec;
mod visit;

pub use alternatives::Alternatives;
pub use embed::Embed;
pub use error::AccessError;
pub use variant::Variant;
#[cfg(feature = "vec")]
pub use vec::{IntoIter, VariantVec};
pub use visit::{Accept, AcceptMut, AcceptOnce, Visit, VisitMut, VisitOnce, Visitor};

pub use varicell_catalog::{
    catalog, index_of, Catalog, Cons, Destroy, Dispatch, Handle, Here, Member, Nil, Operation,
    There,
};
pub use varicell_macro::Alternatives;
