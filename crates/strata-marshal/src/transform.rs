//! Shape and encoding rules for MATLAB-compatible storage.
//!
//! MATLAB has no arrays of fewer than two dimensions and stores strings as
//! `char` matrices with one row per string. These functions compute the
//! stored layout for a value and invert it on read.

use strata_store::{AttrValue, Attributes, Dataset, Dtype};
use strata_types::{ElementKind, Shape};

use crate::codec;
use crate::error::MarshalResult;
use crate::tags::{MATLAB_CLASS_ATTR, MATLAB_EMPTY_ATTR};

/// MATLAB class of a `char` matrix.
pub const CHAR_CLASS: &str = "char";
/// MATLAB class of a cell array.
pub const CELL_CLASS: &str = "cell";

/// Prepend unit dimensions until the shape has at least one axis.
pub fn atleast_1d(shape: &Shape) -> Shape {
    match shape.ndim() {
        0 => Shape::from([1]),
        _ => shape.clone(),
    }
}

/// Prepend unit dimensions until the shape has at least two axes.
///
/// ```
/// use strata_marshal::transform::promote_2d;
/// use strata_types::Shape;
///
/// assert_eq!(promote_2d(&Shape::scalar()), Shape::from([1, 1]));
/// assert_eq!(promote_2d(&Shape::from([4])), Shape::from([1, 4]));
/// assert_eq!(promote_2d(&Shape::from([2, 3, 4])), Shape::from([2, 3, 4]));
/// ```
pub fn promote_2d(shape: &Shape) -> Shape {
    match shape.dims() {
        [] => Shape::from([1, 1]),
        [n] => Shape::from([1, *n]),
        dims => Shape::from(dims),
    }
}

/// Stored shape of an array with no elements: at least two axes, every
/// leading axis at least 1, and the trailing axis 0.
pub fn promote_empty(shape: &Shape) -> Shape {
    let mut dims = promote_2d(shape).into_dims();
    let last = dims.len() - 1;
    for d in &mut dims[..last] {
        *d = (*d).max(1);
    }
    dims[last] = 0;
    Shape::new(dims)
}

/// Shape of the flattened codepoint (or octet) dataset for a fixed-width
/// string array: the trailing axis is widened by `width`.
pub fn flattened_string_shape(shape: &Shape, width: usize) -> Shape {
    let mut dims = atleast_1d(shape).into_dims();
    if let Some(last) = dims.last_mut() {
        *last *= width;
    }
    Shape::new(dims)
}

/// Stored shape of a `char` matrix for a fixed-width string array.
///
/// Strings along the trailing axis are joined into one row, then the
/// row-array is promoted to two dimensions and its trailing axis widened to
/// the row length.
pub fn char_rows_shape(shape: &Shape, width: usize) -> Shape {
    let dims = atleast_1d(shape).into_dims();
    let (lead, last) = dims.split_at(dims.len() - 1);
    let mut rows: Vec<usize> = lead.to_vec();
    rows.push(1);
    let mut stored = promote_2d(&Shape::new(rows)).into_dims();
    if let Some(trailing) = stored.last_mut() {
        *trailing = last[0] * width;
    }
    Shape::new(stored)
}

/// Inverse of [`char_rows_shape`]: the string-array shape and row width a
/// stored `char` matrix of `stored` shape decodes to.
pub fn rows_of(stored: &Shape) -> (Shape, usize) {
    let dims = atleast_1d(stored).into_dims();
    let (lead, last) = dims.split_at(dims.len() - 1);
    let mut shape = lead.to_vec();
    shape.push(1);
    (Shape::new(shape), last[0])
}

/// MATLAB class of a numeric element kind. `float16` has none.
pub fn matlab_class(kind: ElementKind) -> Option<&'static str> {
    match kind {
        ElementKind::Bool => Some("logical"),
        ElementKind::UInt8 => Some("uint8"),
        ElementKind::UInt16 => Some("uint16"),
        ElementKind::UInt32 => Some("uint32"),
        ElementKind::UInt64 => Some("uint64"),
        ElementKind::Int8 => Some("int8"),
        ElementKind::Int16 => Some("int16"),
        ElementKind::Int32 => Some("int32"),
        ElementKind::Int64 => Some("int64"),
        ElementKind::Float16 => None,
        ElementKind::Float32 | ElementKind::Complex64 => Some("single"),
        ElementKind::Float64 | ElementKind::Complex128 => Some("double"),
    }
}

/// A `char` matrix holding `codepoints` in `shape`.
///
/// Codes are stored as uint16 when they all fit, else uint32. A matrix with
/// no codepoints is always stored as an empty `(1, 0)` matrix.
pub fn char_matrix(
    shape: Shape,
    codepoints: &[u32],
    attrs: &mut Attributes,
) -> MarshalResult<Dataset> {
    attrs.insert(MATLAB_CLASS_ATTR.into(), CHAR_CLASS.into());
    if codepoints.is_empty() {
        attrs.insert(MATLAB_EMPTY_ATTR.into(), AttrValue::Int(1));
        return Ok(Dataset::new(Dtype::Numeric(ElementKind::UInt16), [1, 0], Vec::new())?);
    }
    if codepoints.iter().all(|c| *c <= u32::from(u16::MAX)) {
        Ok(Dataset::new(
            Dtype::Numeric(ElementKind::UInt16),
            shape,
            codec::u16_le(codepoints),
        )?)
    } else {
        codec::codepoint_dataset(shape, codepoints)
    }
}

/// Whether the attributes mark a MATLAB `char` matrix.
pub fn is_char_matrix(attrs: &Attributes) -> bool {
    attrs.get(MATLAB_CLASS_ATTR).and_then(AttrValue::as_str) == Some(CHAR_CLASS)
}

/// Mark an array with no elements.
pub fn mark_empty(attrs: &mut Attributes) {
    attrs.insert(MATLAB_EMPTY_ATTR.into(), AttrValue::Int(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::from(dims)
    }

    #[test]
    fn empty_promotion() {
        assert_eq!(promote_empty(&shape(&[0])), shape(&[1, 0]));
        assert_eq!(promote_empty(&shape(&[])), shape(&[1, 0]));
        assert_eq!(promote_empty(&shape(&[0, 3])), shape(&[1, 0]));
        assert_eq!(promote_empty(&shape(&[2, 0, 4])), shape(&[2, 1, 0]));
    }

    #[test]
    fn string_shapes() {
        assert_eq!(flattened_string_shape(&shape(&[]), 5), shape(&[5]));
        assert_eq!(flattened_string_shape(&shape(&[2, 3]), 4), shape(&[2, 12]));

        assert_eq!(char_rows_shape(&shape(&[]), 3), shape(&[1, 3]));
        assert_eq!(char_rows_shape(&shape(&[5]), 2), shape(&[1, 10]));
        assert_eq!(char_rows_shape(&shape(&[2, 3]), 4), shape(&[2, 12]));
        assert_eq!(char_rows_shape(&shape(&[2, 3, 4]), 1), shape(&[2, 3, 4]));
    }

    #[test]
    fn rows_invert_stored_shape() {
        assert_eq!(rows_of(&shape(&[1, 3])), (shape(&[1, 1]), 3));
        assert_eq!(rows_of(&shape(&[2, 12])), (shape(&[2, 1]), 12));
        assert_eq!(rows_of(&shape(&[2, 3, 4])), (shape(&[2, 3, 1]), 4));
    }

    #[test]
    fn matlab_classes() {
        assert_eq!(matlab_class(ElementKind::Bool), Some("logical"));
        assert_eq!(matlab_class(ElementKind::Complex64), Some("single"));
        assert_eq!(matlab_class(ElementKind::Float16), None);
    }

    #[test]
    fn char_matrix_picks_narrow_codes() {
        let mut attrs = Attributes::new();
        let ds = char_matrix(shape(&[1, 2]), &[0x68, 0x3a9], &mut attrs).unwrap();
        assert_eq!(ds.dtype(), Dtype::Numeric(ElementKind::UInt16));
        assert!(is_char_matrix(&attrs));

        let ds = char_matrix(shape(&[1, 1]), &[0x1f600], &mut Attributes::new()).unwrap();
        assert_eq!(ds.dtype(), Dtype::Numeric(ElementKind::UInt32));
    }

    #[test]
    fn empty_char_matrix_is_canonical() {
        let mut attrs = Attributes::new();
        let ds = char_matrix(shape(&[3, 0]), &[], &mut attrs).unwrap();
        assert_eq!(ds.shape(), &shape(&[1, 0]));
        assert_eq!(attrs.get(MATLAB_EMPTY_ATTR), Some(&AttrValue::Int(1)));
    }

    fn any_shape() -> impl Strategy<Value = Shape> {
        prop::collection::vec(0usize..6, 0..5).prop_map(Shape::new)
    }

    proptest! {
        #[test]
        fn promote_2d_is_idempotent(s in any_shape()) {
            let once = promote_2d(&s);
            prop_assert!(once.ndim() >= 2);
            prop_assert_eq!(once.len(), s.len());
            prop_assert_eq!(promote_2d(&once), once);
        }

        #[test]
        fn promote_empty_is_idempotent(s in any_shape()) {
            let once = promote_empty(&s);
            let dims = once.dims();
            prop_assert_eq!(dims[dims.len() - 1], 0);
            prop_assert!(dims[..dims.len() - 1].iter().all(|d| *d >= 1));
            prop_assert_eq!(promote_empty(&once), once);
        }

        #[test]
        fn char_rows_hold_every_codepoint(s in any_shape(), width in 0usize..5) {
            let stored = char_rows_shape(&s, width);
            prop_assert!(stored.ndim() >= 2);
            prop_assert_eq!(stored.len(), s.len() * width);
        }
    }
}
