use strata_store::{Dataset, Dtype};
use strata_types::{ElementKind, Shape, TypeKind, Value};

use super::{expect_leaf, wrong_kind, Context, Encoded, Marshaler, Stored};
use crate::error::MarshalResult;
use crate::options::Layout;
use crate::tags::TypeTag;
use crate::transform;

/// Stores `Null` as an empty float64 array.
#[derive(Debug, Default)]
pub struct NullMarshaler;

impl Marshaler for NullMarshaler {
    fn name(&self) -> &str {
        "null"
    }

    fn kinds(&self) -> &[TypeKind] {
        &[TypeKind::Null]
    }

    fn tags(&self) -> &[TypeTag] {
        &[TypeTag::Null]
    }

    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>> {
        if !matches!(value, Value::Null) {
            return Err(wrong_kind(self.name(), value));
        }
        let mut attrs = ctx.base_attrs(TypeTag::Null, Some("double"));
        let shape = match ctx.layout() {
            Layout::Matlab => {
                transform::mark_empty(&mut attrs);
                Shape::from([1, 0])
            }
            Layout::Natural => Shape::from([0]),
        };
        let dataset = Dataset::new(Dtype::Numeric(ElementKind::Float64), shape, Vec::new())?;
        Ok(Encoded::Leaf { dataset, attrs })
    }

    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
        let (dataset, _) = expect_leaf(tag, stored, ctx)?;
        if !dataset.is_empty() {
            return Err(ctx.corrupt(format!("null stored with {} elements", dataset.len())));
        }
        Ok(Value::Null)
    }
}
