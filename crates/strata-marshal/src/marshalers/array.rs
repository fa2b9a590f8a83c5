use strata_store::{Attributes, Dataset, Dtype};
use strata_types::{BytesArray, ElementKind, NumericArray, Shape, TextArray, TypeKind, Value};

use super::{expect_leaf, wrong_kind, Context, Encoded, Marshaler, Stored};
use crate::codec;
use crate::error::{MarshalError, MarshalResult};
use crate::options::Layout;
use crate::tags::{StoredElementKind, TypeTag, ELEMENT_KIND_ATTR, SHAPE_ATTR};
use crate::transform::{self, CHAR_CLASS};

/// Stores numeric arrays and fixed-width string arrays.
#[derive(Debug, Default)]
pub struct ArrayMarshaler;

impl ArrayMarshaler {
    fn encode_numeric(&self, array: &NumericArray, ctx: &Context<'_>) -> MarshalResult<Dataset> {
        let kind = array.kind();
        match ctx.layout() {
            Layout::Natural => Ok(Dataset::new(
                Dtype::Numeric(kind),
                array.shape().clone(),
                array.data().to_vec(),
            )?),
            Layout::Matlab => {
                if kind == ElementKind::Float16 {
                    return Err(MarshalError::unsupported(
                        array_kind(array).name(),
                        "float16 cannot be stored in MATLAB-compatible files",
                    ));
                }
                if array.is_empty() {
                    let shape = transform::promote_empty(array.shape());
                    let real = Dtype::Numeric(kind.real_counterpart());
                    return Ok(Dataset::new(real, shape, Vec::new())?);
                }
                Ok(Dataset::new(
                    Dtype::Numeric(kind),
                    transform::promote_2d(array.shape()),
                    array.data().to_vec(),
                )?)
            }
        }
    }

    fn encode_text(
        &self,
        array: &TextArray,
        attrs: &mut Attributes,
        ctx: &Context<'_>,
    ) -> MarshalResult<Dataset> {
        let width = array.width();
        let elements = array.elements().iter().map(String::as_str);
        let codepoints = codec::padded_codepoints(elements, width);
        match ctx.layout() {
            Layout::Natural => {
                let shape = transform::flattened_string_shape(array.shape(), width);
                codec::codepoint_dataset(shape, &codepoints)
            }
            Layout::Matlab => {
                let shape = transform::char_rows_shape(array.shape(), width);
                transform::char_matrix(shape, &codepoints, attrs)
            }
        }
    }

    fn encode_bytes(
        &self,
        array: &BytesArray,
        attrs: &mut Attributes,
        ctx: &Context<'_>,
    ) -> MarshalResult<Dataset> {
        let width = array.width();
        let data = codec::padded_bytes(array.elements().iter().map(Vec::as_slice), width);
        match ctx.layout() {
            Layout::Natural => {
                Ok(Dataset::new(Dtype::FixedBytes(width), array.shape().clone(), data)?)
            }
            Layout::Matlab => {
                let codepoints: Vec<u32> = data.iter().map(|b| u32::from(*b)).collect();
                let shape = transform::char_rows_shape(array.shape(), width);
                transform::char_matrix(shape, &codepoints, attrs)
            }
        }
    }

    fn decode_numeric(
        &self,
        kind: ElementKind,
        dataset: Dataset,
        attrs: &Attributes,
        ctx: &Context<'_>,
    ) -> MarshalResult<NumericArray> {
        let (dtype, stored_shape, data) = dataset.into_parts();
        let stored_kind = match dtype {
            Dtype::Numeric(k) if k == kind => k,
            // Empty complex arrays are written with their real counterpart.
            Dtype::Numeric(k) if data.is_empty() && k == kind.real_counterpart() => k,
            _ => return Err(ctx.corrupt(format!("element kind {kind} stored as {dtype}"))),
        };
        let shape = ctx.shape_attr(attrs, SHAPE_ATTR)?.unwrap_or_else(|| stored_shape.clone());
        let mut array = NumericArray::from_raw(stored_kind, stored_shape, data)?.reshape(shape)?;
        if stored_kind != kind {
            array = array.retype_empty(kind)?;
        }
        Ok(array)
    }

    fn decode_bytes(
        &self,
        width: usize,
        dataset: Dataset,
        attrs: &Attributes,
        ctx: &Context<'_>,
    ) -> MarshalResult<BytesArray> {
        let shape = ctx.shape_attr(attrs, SHAPE_ATTR)?;
        if dataset.dtype() == Dtype::FixedBytes(width) {
            let (_, stored_shape, data) = dataset.into_parts();
            let shape = shape.unwrap_or(stored_shape);
            return fill_bytes(&data, width, shape, ctx);
        }
        // A char matrix of byte-widened codes.
        let codepoints = codec::read_codepoints(&dataset)
            .ok_or_else(|| ctx.corrupt(format!("bytes{width} stored as {}", dataset.dtype())))?;
        let shape = shape.ok_or_else(|| ctx.corrupt(format!("bytes array without {SHAPE_ATTR}")))?;
        let data = codec::bytes_from_codepoints(&codepoints, ctx.path)?;
        fill_bytes(&data, width, shape, ctx)
    }
}

fn array_kind(array: &NumericArray) -> TypeKind {
    if array.is_scalar() {
        TypeKind::NumericScalar
    } else {
        TypeKind::NumericArray
    }
}

impl Marshaler for ArrayMarshaler {
    fn name(&self) -> &str {
        "array"
    }

    fn kinds(&self) -> &[TypeKind] {
        &[
            TypeKind::NumericScalar,
            TypeKind::NumericArray,
            TypeKind::TextArray,
            TypeKind::BytesArray,
        ]
    }

    fn tags(&self) -> &[TypeTag] {
        &[TypeTag::NdArray]
    }

    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>> {
        let (attrs, dataset) = match value {
            Value::Numeric(array) => {
                let class = transform::matlab_class(array.kind());
                let mut attrs = ctx.base_attrs(TypeTag::NdArray, class);
                let element = StoredElementKind::Numeric(array.kind());
                ctx.describe(&mut attrs, ELEMENT_KIND_ATTR, element.to_string().into());
                ctx.describe(&mut attrs, SHAPE_ATTR, array.shape().into());
                let dataset = self.encode_numeric(array, ctx)?;
                if ctx.layout() == Layout::Matlab && dataset.is_empty() {
                    transform::mark_empty(&mut attrs);
                }
                (attrs, dataset)
            }
            Value::TextArray(array) => {
                let mut attrs = ctx.base_attrs(TypeTag::NdArray, Some(CHAR_CLASS));
                let element = StoredElementKind::Text(array.width());
                ctx.describe(&mut attrs, ELEMENT_KIND_ATTR, element.to_string().into());
                ctx.describe(&mut attrs, SHAPE_ATTR, array.shape().into());
                let dataset = self.encode_text(array, &mut attrs, ctx)?;
                (attrs, dataset)
            }
            Value::BytesArray(array) => {
                let mut attrs = ctx.base_attrs(TypeTag::NdArray, Some(CHAR_CLASS));
                let element = StoredElementKind::Bytes(array.width());
                ctx.describe(&mut attrs, ELEMENT_KIND_ATTR, element.to_string().into());
                ctx.describe(&mut attrs, SHAPE_ATTR, array.shape().into());
                let dataset = self.encode_bytes(array, &mut attrs, ctx)?;
                (attrs, dataset)
            }
            other => return Err(wrong_kind(self.name(), other)),
        };
        Ok(Encoded::Leaf { dataset, attrs })
    }

    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
        let (dataset, attrs) = expect_leaf(tag, stored, ctx)?;
        let element = ctx
            .str_attr(&attrs, ELEMENT_KIND_ATTR)?
            .ok_or_else(|| ctx.corrupt(format!("{tag} without {ELEMENT_KIND_ATTR}")))?;
        let element = StoredElementKind::parse(element)
            .ok_or_else(|| ctx.corrupt(format!("unrecognized element kind {element:?}")))?;

        match element {
            StoredElementKind::Numeric(kind) => {
                Ok(Value::Numeric(self.decode_numeric(kind, dataset, &attrs, ctx)?))
            }
            StoredElementKind::Text(width) => {
                let shape = ctx
                    .shape_attr(&attrs, SHAPE_ATTR)?
                    .ok_or_else(|| ctx.corrupt(format!("text array without {SHAPE_ATTR}")))?;
                let codepoints = codec::read_codepoints(&dataset).ok_or_else(|| {
                    ctx.corrupt(format!("text array stored as {}", dataset.dtype()))
                })?;
                let elements = codec::split_codepoints(&codepoints, width, shape.len(), ctx.path)?;
                Ok(Value::TextArray(TextArray::with_width(shape, width, elements)?))
            }
            StoredElementKind::Bytes(width) => {
                Ok(Value::BytesArray(self.decode_bytes(width, dataset, &attrs, ctx)?))
            }
            StoredElementKind::Object => Err(ctx.corrupt("object element kind on a dataset")),
        }
    }
}

fn fill_bytes(
    data: &[u8],
    width: usize,
    shape: Shape,
    ctx: &Context<'_>,
) -> MarshalResult<BytesArray> {
    let elements = codec::split_fixed(data, width, shape.len())
        .ok_or_else(|| ctx.corrupt(format!("{} bytes cannot fill shape {shape}", data.len())))?;
    Ok(BytesArray::with_width(shape, width, elements)?)
}

fn bytes_array(dataset: Dataset, ctx: &Context<'_>) -> MarshalResult<BytesArray> {
    let width = dataset.dtype().itemsize();
    let (_, shape, data) = dataset.into_parts();
    fill_bytes(&data, width, shape, ctx)
}

/// Reconstruct a dataset using only its dtype, shape and MATLAB class.
///
/// `char` matrices become text arrays with one string per row, fixed-width
/// byte strings become byte arrays, and everything else is a numeric array.
pub fn infer_leaf(
    dataset: Dataset,
    attrs: &Attributes,
    ctx: &Context<'_>,
) -> MarshalResult<Value> {
    if transform::is_char_matrix(attrs) {
        if let Some(codepoints) = codec::read_codepoints(&dataset) {
            return char_rows(&codepoints, dataset.shape(), ctx).map(Value::TextArray);
        }
    }
    match dataset.dtype() {
        Dtype::FixedBytes(_) => Ok(Value::BytesArray(bytes_array(dataset, ctx)?)),
        Dtype::Numeric(kind) => {
            let (_, shape, data) = dataset.into_parts();
            Ok(Value::Numeric(NumericArray::from_raw(kind, shape, data)?))
        }
    }
}

fn char_rows(codepoints: &[u32], stored: &Shape, ctx: &Context<'_>) -> MarshalResult<TextArray> {
    if codepoints.is_empty() {
        return Ok(TextArray::empty([1, 0])?);
    }
    let (shape, width) = transform::rows_of(stored);
    let rows = codec::split_codepoints(codepoints, width, shape.len(), ctx.path)?;
    Ok(TextArray::with_width(shape, width, rows)?)
}
