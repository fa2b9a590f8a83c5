use crate::element::{Element, ElementKind};
use crate::error::{TypeError, TypeResult};
use crate::shape::Shape;
use crate::value::Value;

fn check_count(shape: &Shape, actual: usize) -> TypeResult<()> {
    if shape.len() != actual {
        return Err(TypeError::ElementCount {
            shape: shape.to_string(),
            expected: shape.len(),
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// NumericArray
// ---------------------------------------------------------------------------

/// A dense numeric array in row-major order.
///
/// Elements are held as raw little-endian bytes, so equality is bitwise:
/// NaN payloads and signed zeros compare exactly. A 0-dimensional array is a
/// numeric scalar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NumericArray {
    kind: ElementKind,
    shape: Shape,
    data: Vec<u8>,
}

impl NumericArray {
    /// Build from typed elements.
    pub fn from_vec<T: Element>(shape: impl Into<Shape>, elements: Vec<T>) -> TypeResult<Self> {
        let shape = shape.into();
        check_count(&shape, elements.len())?;
        let mut data = Vec::with_capacity(elements.len() * T::KIND.size());
        for element in &elements {
            element.write_le(&mut data);
        }
        Ok(Self {
            kind: T::KIND,
            shape,
            data,
        })
    }

    /// A 0-dimensional array holding `value`.
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut data = Vec::with_capacity(T::KIND.size());
        value.write_le(&mut data);
        Self {
            kind: T::KIND,
            shape: Shape::scalar(),
            data,
        }
    }

    /// Build from raw little-endian bytes.
    pub fn from_raw(kind: ElementKind, shape: impl Into<Shape>, data: Vec<u8>) -> TypeResult<Self> {
        let shape = shape.into();
        let expected = shape.len() * kind.size();
        if data.len() != expected {
            return Err(TypeError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        if kind == ElementKind::Bool {
            if let Some(bad) = data.iter().find(|b| **b > 1) {
                return Err(TypeError::InvalidBool(*bad));
            }
        }
        Ok(Self { kind, shape, data })
    }

    /// An all-zero array.
    pub fn zeros(kind: ElementKind, shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let data = vec![0u8; shape.len() * kind.size()];
        Self { kind, shape, data }
    }

    /// A one-dimensional array with no elements.
    pub fn empty(kind: ElementKind) -> Self {
        Self::zeros(kind, [0])
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.ndim() == 0
    }

    /// Decode the elements as `T`.
    pub fn to_vec<T: Element>(&self) -> TypeResult<Vec<T>> {
        if T::KIND != self.kind {
            return Err(TypeError::KindMismatch {
                actual: self.kind.to_string(),
                requested: T::KIND.to_string(),
            });
        }
        Ok(self
            .data
            .chunks_exact(self.kind.size())
            .map(T::read_le)
            .collect())
    }

    /// Same elements under a new shape with the same element count.
    pub fn reshape(self, shape: impl Into<Shape>) -> TypeResult<Self> {
        let shape = shape.into();
        check_count(&shape, self.shape.len())?;
        Ok(Self { shape, ..self })
    }

    /// Change the element kind of an array that holds no elements.
    pub fn retype_empty(self, kind: ElementKind) -> TypeResult<Self> {
        if !self.is_empty() {
            return Err(TypeError::ElementCount {
                shape: self.shape.to_string(),
                expected: 0,
                actual: self.shape.len(),
            });
        }
        Ok(Self { kind, ..self })
    }

    pub fn into_parts(self) -> (ElementKind, Shape, Vec<u8>) {
        (self.kind, self.shape, self.data)
    }
}

// ---------------------------------------------------------------------------
// Fixed-width string arrays
// ---------------------------------------------------------------------------

/// A fixed-width Unicode string array; `width` counts codepoints.
///
/// As with fixed-width storage generally, trailing NULs are not part of an
/// element and are stripped on construction. A 0-dimensional array is a
/// fixed-width string scalar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextArray {
    shape: Shape,
    width: usize,
    elements: Vec<String>,
}

impl TextArray {
    /// Width is the longest element.
    pub fn new(shape: impl Into<Shape>, elements: Vec<String>) -> TypeResult<Self> {
        let elements: Vec<String> = elements.into_iter().map(strip_text).collect();
        let width = elements.iter().map(|e| e.chars().count()).max().unwrap_or(0);
        Self::with_width(shape, width, elements)
    }

    pub fn with_width(
        shape: impl Into<Shape>,
        width: usize,
        elements: Vec<String>,
    ) -> TypeResult<Self> {
        let shape = shape.into();
        check_count(&shape, elements.len())?;
        let elements: Vec<String> = elements.into_iter().map(strip_text).collect();
        for element in &elements {
            let length = element.chars().count();
            if length > width {
                return Err(TypeError::WidthExceeded { width, length });
            }
        }
        Ok(Self {
            shape,
            width,
            elements,
        })
    }

    pub fn scalar(text: impl Into<String>) -> Self {
        let text = strip_text(text.into());
        Self {
            shape: Shape::scalar(),
            width: text.chars().count(),
            elements: vec![text],
        }
    }

    /// An array of the given shape with no elements and zero width.
    pub fn empty(shape: impl Into<Shape>) -> TypeResult<Self> {
        Self::with_width(shape, 0, Vec::new())
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }
}

fn strip_text(mut s: String) -> String {
    let trimmed = s.trim_end_matches('\0').len();
    s.truncate(trimmed);
    s
}

/// A fixed-width byte-string array; `width` counts octets.
///
/// Trailing NULs are stripped from elements on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BytesArray {
    shape: Shape,
    width: usize,
    elements: Vec<Vec<u8>>,
}

impl BytesArray {
    /// Width is the longest element.
    pub fn new(shape: impl Into<Shape>, elements: Vec<Vec<u8>>) -> TypeResult<Self> {
        let elements: Vec<Vec<u8>> = elements.into_iter().map(strip_bytes).collect();
        let width = elements.iter().map(Vec::len).max().unwrap_or(0);
        Self::with_width(shape, width, elements)
    }

    pub fn with_width(
        shape: impl Into<Shape>,
        width: usize,
        elements: Vec<Vec<u8>>,
    ) -> TypeResult<Self> {
        let shape = shape.into();
        check_count(&shape, elements.len())?;
        let elements: Vec<Vec<u8>> = elements.into_iter().map(strip_bytes).collect();
        if let Some(long) = elements.iter().find(|e| e.len() > width) {
            return Err(TypeError::WidthExceeded {
                width,
                length: long.len(),
            });
        }
        Ok(Self {
            shape,
            width,
            elements,
        })
    }

    pub fn scalar(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = strip_bytes(bytes.into());
        Self {
            shape: Shape::scalar(),
            width: bytes.len(),
            elements: vec![bytes],
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn elements(&self) -> &[Vec<u8>] {
        &self.elements
    }
}

fn strip_bytes(mut b: Vec<u8>) -> Vec<u8> {
    while b.last() == Some(&0) {
        b.pop();
    }
    b
}

// ---------------------------------------------------------------------------
// ObjectArray
// ---------------------------------------------------------------------------

/// An array whose elements are arbitrary values, in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectArray {
    shape: Shape,
    elements: Vec<Value>,
}

impl ObjectArray {
    pub fn new(shape: impl Into<Shape>, elements: Vec<Value>) -> TypeResult<Self> {
        let shape = shape.into();
        check_count(&shape, elements.len())?;
        Ok(Self { shape, elements })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Value> {
        self.elements
    }
}
