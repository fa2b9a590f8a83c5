use strata_store::{Dataset, Dtype};
use strata_types::{Shape, TypeKind, Value};

use super::{expect_leaf, wrong_kind, Context, Encoded, Marshaler, Stored};
use crate::codec;
use crate::error::MarshalResult;
use crate::options::Layout;
use crate::tags::TypeTag;
use crate::transform::{self, CHAR_CLASS};

/// Stores text and byte strings.
///
/// - Natural layout, tagged: text as a uint32 codepoint vector, bytes as a
///   0-d fixed-width byte string.
/// - Natural layout, untagged: both as a 0-d fixed-width byte string (text
///   is UTF-8 encoded).
/// - MATLAB layout: both as a `1 x n` char matrix; each byte becomes one
///   char. Tagged byte strings narrow back to octets on read.
#[derive(Debug, Default)]
pub struct StringMarshaler;

impl Marshaler for StringMarshaler {
    fn name(&self) -> &str {
        "string"
    }

    fn kinds(&self) -> &[TypeKind] {
        &[TypeKind::Text, TypeKind::Bytes, TypeKind::MutableBytes]
    }

    fn tags(&self) -> &[TypeTag] {
        &[TypeTag::Str, TypeTag::Bytes, TypeTag::ByteArray]
    }

    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>> {
        let tag = match value {
            Value::Text(_) => TypeTag::Str,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::MutableBytes(_) => TypeTag::ByteArray,
            other => return Err(wrong_kind(self.name(), other)),
        };
        let mut attrs = ctx.base_attrs(tag, Some(CHAR_CLASS));
        let dataset = match (value, ctx.layout()) {
            (Value::Text(text), Layout::Matlab) => {
                let codepoints: Vec<u32> = text.chars().map(u32::from).collect();
                let shape = Shape::from([1, codepoints.len()]);
                transform::char_matrix(shape, &codepoints, &mut attrs)?
            }
            (Value::Text(text), Layout::Natural) if ctx.tagged() => {
                let codepoints: Vec<u32> = text.chars().map(u32::from).collect();
                codec::codepoint_dataset(Shape::from([codepoints.len()]), &codepoints)?
            }
            (Value::Text(text), Layout::Natural) => fixed_bytes_scalar(text.as_bytes())?,
            (Value::Bytes(bytes) | Value::MutableBytes(bytes), Layout::Matlab) => {
                let codepoints: Vec<u32> = bytes.iter().map(|b| u32::from(*b)).collect();
                let shape = Shape::from([1, codepoints.len()]);
                transform::char_matrix(shape, &codepoints, &mut attrs)?
            }
            (Value::Bytes(bytes) | Value::MutableBytes(bytes), Layout::Natural) => {
                fixed_bytes_scalar(bytes)?
            }
            (other, _) => return Err(wrong_kind(self.name(), other)),
        };
        Ok(Encoded::Leaf { dataset, attrs })
    }

    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
        let (dataset, _) = expect_leaf(tag, stored, ctx)?;
        match tag {
            TypeTag::Str => {
                let codepoints = codec::read_codepoints(&dataset)
                    .ok_or_else(|| ctx.corrupt(format!("str stored as {}", dataset.dtype())))?;
                Ok(Value::Text(codec::string_from_codepoints(&codepoints, ctx.path)?))
            }
            TypeTag::Bytes | TypeTag::ByteArray => {
                let data = match codec::read_codepoints(&dataset) {
                    // A char matrix of byte-widened codes.
                    Some(codepoints) => codec::bytes_from_codepoints(&codepoints, ctx.path)?,
                    None => {
                        let (dtype, shape, data) = dataset.into_parts();
                        if !matches!(dtype, Dtype::FixedBytes(_)) || shape.len() != 1 {
                            return Err(ctx.corrupt(format!(
                                "{tag} stored as {dtype} with shape {shape}"
                            )));
                        }
                        data
                    }
                };
                Ok(match tag {
                    TypeTag::ByteArray => Value::MutableBytes(data),
                    _ => Value::Bytes(data),
                })
            }
            other => Err(ctx.corrupt(format!("string marshaler cannot read {other}"))),
        }
    }
}

fn fixed_bytes_scalar(bytes: &[u8]) -> MarshalResult<Dataset> {
    Ok(Dataset::new(
        Dtype::FixedBytes(bytes.len()),
        Shape::scalar(),
        bytes.to_vec(),
    )?)
}
