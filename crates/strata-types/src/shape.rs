use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimensions of an array, outermost first.
///
/// A 0-dimensional shape describes a scalar and holds exactly one element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// The 0-dimensional shape.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total element count (product of dimensions).
    pub fn len(&self) -> usize {
        self.0.iter().product()
    }

    /// Returns `true` if any dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn into_dims(self) -> Vec<usize> {
        self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [only] => write!(f, "({only},)"),
            dims => {
                write!(f, "(")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_holds_one_element() {
        let s = Shape::scalar();
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());
    }

    #[test]
    fn zero_dimension_empties_the_shape() {
        let s = Shape::from([3, 0, 2]);
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn display_matches_tuple_notation() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::from([4]).to_string(), "(4,)");
        assert_eq!(Shape::from([1, 0]).to_string(), "(1, 0)");
    }

    #[test]
    fn serde_roundtrip() {
        let s = Shape::from([2, 3]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[2,3]");
        let parsed: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
