use core::ptr;
use varicell_catalog::{Handle, Operation};

/// A type that can be run against whichever alternative a variant holds.
///
/// The result type is declared once, here, and every [`Visit`] impl returns
/// it. A visitor has to implement [`Visit`] (or [`VisitMut`]) for every
/// alternative of the catalog it is used with; a missing one is a compile
/// error at the call to `visit`.
///
/// ```rust
/// use varicell::{catalog, Variant, Visit, Visitor};
///
/// struct Describe;
///
/// impl Visitor for Describe {
///     type Output = String;
/// }
///
/// impl Visit<i64> for Describe {
///     fn visit(&mut self, value: &i64) -> String {
///         format!("int {value}")
///     }
/// }
///
/// impl Visit<String> for Describe {
///     fn visit(&mut self, value: &String) -> String {
///         format!("text {value:?}")
///     }
/// }
///
/// let v: Variant<catalog![i64, String]> = Variant::new(String::from("hi"));
/// assert_eq!(v.visit(Describe).unwrap(), "text \"hi\"");
/// ```
pub trait Visitor {
    type Output;
}

/// How a [`Visitor`] reads an alternative of type `T`.
pub trait Visit<T>: Visitor {
    fn visit(&mut self, value: &T) -> Self::Output;
}

/// How a [`Visitor`] updates an alternative of type `T` in place.
pub trait VisitMut<T>: Visitor {
    fn visit_mut(&mut self, value: &mut T) -> Self::Output;
}

/// How a [`Visitor`] takes ownership of an alternative of type `T`.
pub trait VisitOnce<T>: Visitor {
    fn visit_once(self, value: T) -> Self::Output;
}

impl<V> Visitor for &mut V
where
    V: Visitor + ?Sized,
{
    type Output = V::Output;
}

impl<T, V> Visit<T> for &mut V
where
    V: Visit<T> + ?Sized,
{
    fn visit(&mut self, value: &T) -> Self::Output {
        (**self).visit(value)
    }
}

impl<T, V> VisitMut<T> for &mut V
where
    V: VisitMut<T> + ?Sized,
{
    fn visit_mut(&mut self, value: &mut T) -> Self::Output {
        (**self).visit_mut(value)
    }
}

/// Hands the live alternative to a visitor by shared reference.
pub struct Accept<V>(pub(crate) V);

impl<V: Visitor> Operation for Accept<V> {
    type Output = V::Output;
}

impl<T, V: Visit<T>> Handle<T> for Accept<V> {
    unsafe fn handle(mut self, value: *mut T) -> V::Output {
        self.0.visit(&*value)
    }
}

/// Hands the live alternative to a visitor by mutable reference.
pub struct AcceptMut<V>(pub(crate) V);

impl<V: Visitor> Operation for AcceptMut<V> {
    type Output = V::Output;
}

impl<T, V: VisitMut<T>> Handle<T> for AcceptMut<V> {
    unsafe fn handle(mut self, value: *mut T) -> V::Output {
        self.0.visit_mut(&mut *value)
    }
}

/// Moves the live alternative out and hands it to a visitor by value.
pub struct AcceptOnce<V>(pub(crate) V);

impl<V: Visitor> Operation for AcceptOnce<V> {
    type Output = V::Output;
}

impl<T, V: VisitOnce<T>> Handle<T> for AcceptOnce<V> {
    unsafe fn handle(self, value: *mut T) -> V::Output {
        self.0.visit_once(ptr::read(value))
    }
}
