use strata_store::{Dataset, Dtype};
use strata_types::{Complex, Element, NumericArray, TypeKind, Value};

use super::{expect_leaf, wrong_kind, Context, Encoded, Marshaler, Stored};
use crate::error::MarshalResult;
use crate::options::Layout;
use crate::tags::TypeTag;
use crate::transform;

/// Stores `Bool`, `Int`, `Float` and `Complex` as single-element numeric
/// datasets (0-d, or `1 x 1` for MATLAB).
#[derive(Debug, Default)]
pub struct ScalarMarshaler;

impl ScalarMarshaler {
    fn unpack<T: Element>(
        &self,
        tag: TypeTag,
        dataset: Dataset,
        ctx: &Context<'_>,
    ) -> MarshalResult<T> {
        let (dtype, shape, data) = dataset.into_parts();
        if dtype != Dtype::Numeric(T::KIND) {
            return Err(ctx.corrupt(format!("{tag} stored as {dtype}")));
        }
        if shape.len() != 1 {
            return Err(ctx.corrupt(format!("{tag} stored with shape {shape}")));
        }
        let array = NumericArray::from_raw(T::KIND, shape, data)?;
        array
            .to_vec::<T>()?
            .first()
            .copied()
            .ok_or_else(|| ctx.corrupt(format!("{tag} stored without data")))
    }
}

impl Marshaler for ScalarMarshaler {
    fn name(&self) -> &str {
        "scalar"
    }

    fn kinds(&self) -> &[TypeKind] {
        &[TypeKind::Bool, TypeKind::Int, TypeKind::Float, TypeKind::Complex]
    }

    fn tags(&self) -> &[TypeTag] {
        &[TypeTag::Bool, TypeTag::Int, TypeTag::Float, TypeTag::Complex]
    }

    fn encode<'v>(&self, value: &'v Value, ctx: &Context<'_>) -> MarshalResult<Encoded<'v>> {
        let (tag, array) = match value {
            Value::Bool(b) => (TypeTag::Bool, NumericArray::scalar(*b)),
            Value::Int(i) => (TypeTag::Int, NumericArray::scalar(*i)),
            Value::Float(f) => (TypeTag::Float, NumericArray::scalar(*f)),
            Value::Complex(c) => (TypeTag::Complex, NumericArray::scalar(*c)),
            other => return Err(wrong_kind(self.name(), other)),
        };
        let (kind, shape, data) = array.into_parts();
        let attrs = ctx.base_attrs(tag, transform::matlab_class(kind));
        let shape = match ctx.layout() {
            Layout::Matlab => transform::promote_2d(&shape),
            Layout::Natural => shape,
        };
        let dataset = Dataset::new(Dtype::Numeric(kind), shape, data)?;
        Ok(Encoded::Leaf { dataset, attrs })
    }

    fn decode(&self, tag: TypeTag, stored: Stored, ctx: &Context<'_>) -> MarshalResult<Value> {
        let (dataset, _) = expect_leaf(tag, stored, ctx)?;
        match tag {
            TypeTag::Bool => self.unpack::<bool>(tag, dataset, ctx).map(Value::Bool),
            TypeTag::Int => self.unpack::<i64>(tag, dataset, ctx).map(Value::Int),
            TypeTag::Float => self.unpack::<f64>(tag, dataset, ctx).map(Value::Float),
            TypeTag::Complex => self
                .unpack::<Complex<f64>>(tag, dataset, ctx)
                .map(Value::Complex),
            other => Err(ctx.corrupt(format!("scalar marshaler cannot read {other}"))),
        }
    }
}
