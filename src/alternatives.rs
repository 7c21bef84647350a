use varicell_catalog::Catalog;

use crate::{AccessError, Variant};

/// An enum whose variants each wrap one value, viewed as a [`Variant`] over
/// the wrapped types.
///
/// **Note**: this should only be implemented with the `derive` macro.
/// ```rust
/// use varicell::Alternatives;
///
/// #[derive(Alternatives, Debug, PartialEq)]
/// enum Token {
///     Number(f64),
///     Word(String),
/// }
///
/// let v = Token::Word(String::from("let")).cleave();
/// assert_eq!(v.get::<String, _>().map(String::as_str), Ok("let"));
/// assert_eq!(Token::reknit(v), Ok(Token::Word(String::from("let"))));
/// ```
pub trait Alternatives: Sized {
    /// The payload types, in declaration order.
    type Catalog: Catalog;

    /// Splits the enum into a discriminator and the storage of its payload.
    fn cleave(self) -> Variant<Self::Catalog>;

    /// Rebuilds the enum from a variant. Fails only when the variant is empty.
    fn reknit(variant: Variant<Self::Catalog>) -> Result<Self, AccessError>;
}

#[cfg(test)]
mod tests {
    use crate::{AccessError, Alternatives, Variant};
    use std::rc::Rc;

    #[derive(Alternatives, Debug, PartialEq)]
    enum Shape {
        Circle(f32),
        Label(String),
        Points(Vec<(i32, i32)>),
    }

    #[derive(Alternatives, Debug, PartialEq)]
    enum Either<A, B> {
        Left(A),
        Right(B),
    }

    #[test]
    fn cleave_picks_the_declared_position() {
        assert_eq!(Shape::Circle(1.0).cleave().index(), Some(0));
        assert_eq!(Shape::Label(String::new()).cleave().index(), Some(1));
        assert_eq!(Shape::Points(vec![]).cleave().index(), Some(2));
    }

    #[test]
    fn reknit_restores_the_enum() {
        let shapes = vec![
            Shape::Circle(2.5),
            Shape::Label(String::from("origin")),
            Shape::Points(vec![(0, 0), (1, 2)]),
        ];
        for shape in shapes {
            let expected = format!("{shape:?}");
            let rebuilt = Shape::reknit(shape.cleave()).unwrap();
            assert_eq!(format!("{rebuilt:?}"), expected);
        }
    }

    #[test]
    fn reknit_rejects_empty() {
        assert_eq!(Shape::reknit(Variant::empty()), Err(AccessError::Empty));
    }

    #[test]
    fn into_variant_matches_cleave() {
        let v: Variant<<Shape as Alternatives>::Catalog> = Shape::Label(String::from("x")).into();
        assert!(v.is::<String, _>());
    }

    #[test]
    fn generic_enums_keep_their_payloads() {
        let shared = Rc::new(5u8);
        let left: Either<Rc<u8>, String> = Either::Left(Rc::clone(&shared));
        let v = left.cleave();
        assert_eq!(Rc::strong_count(&shared), 2);
        assert_eq!(v.get::<Rc<u8>, _>().map(|rc| **rc), Ok(5));
        let back = Either::<Rc<u8>, String>::reknit(v).unwrap();
        assert!(matches!(back, Either::Left(_)));
        drop(back);
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
