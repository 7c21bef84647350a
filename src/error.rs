use core::any;
use thiserror::Error;
use varicell_catalog::Member;

/// Why a typed read of a variant failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The variant holds a different alternative than the one asked for.
    #[error("expected alternative `{expected}` but the variant holds `{found}`")]
    WrongAlternative {
        expected: &'static str,
        found: &'static str,
    },

    /// The variant is valueless, e.g. after being taken from.
    #[error("the variant is empty")]
    Empty,

    /// A column position past the end was asked for.
    #[error("index {index} is out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl AccessError {
    /// Checks a raw discriminator against the one `T` would have in `L`.
    pub(crate) fn check<L, T, I>(tag: usize) -> Result<(), Self>
    where
        L: Member<T, I>,
    {
        match tag {
            0 => Err(AccessError::Empty),
            tag if tag == L::INDEX + 1 => Ok(()),
            tag => Err(AccessError::WrongAlternative {
                expected: any::type_name::<T>(),
                found: L::name_of(tag - 1).unwrap_or("<unknown>"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varicell_catalog::catalog;

    type L = catalog![i32, f64];

    #[test]
    fn check_accepts_matching_tag() {
        assert_eq!(AccessError::check::<L, i32, _>(1), Ok(()));
        assert_eq!(AccessError::check::<L, f64, _>(2), Ok(()));
    }

    #[test]
    fn check_names_both_alternatives() {
        let err = AccessError::check::<L, i32, _>(2).unwrap_err();
        assert_eq!(
            err,
            AccessError::WrongAlternative {
                expected: "i32",
                found: "f64"
            }
        );
        assert_eq!(
            err.to_string(),
            "expected alternative `i32` but the variant holds `f64`"
        );
    }

    #[test]
    fn check_reports_empty() {
        assert_eq!(AccessError::check::<L, f64, _>(0), Err(AccessError::Empty));
    }
}
