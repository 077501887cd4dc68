use strum::{Display, EnumIs, EnumTryAs};

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ScalarKind {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "uint8")]
    Uint8,
    #[strum(serialize = "int8")]
    Int8,
    #[strum(serialize = "int16")]
    Int16,
    #[strum(serialize = "int32")]
    Int32,
    #[strum(serialize = "int64")]
    Int64,
    #[strum(serialize = "float16")]
    Half,
    #[strum(serialize = "bfloat16")]
    BFloat16,
    #[strum(serialize = "float32")]
    Float,
    #[strum(serialize = "float64")]
    Double,
    #[strum(serialize = "complex64")]
    ComplexFloat,
    #[strum(serialize = "complex128")]
    ComplexDouble,
}

/// A tensor type with optional refinements.
///
/// Every refinement is optional: `TensorType::default()` is the fully generic
/// tensor. Shape entries are themselves optional so that a known rank with
/// unknown extents can be represented (`[Some(3), None]` is a `3 x ?`
/// tensor).
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TensorType {
    pub scalar: Option<ScalarKind>,
    pub shape: Option<Box<[Option<u64>]>>,
    pub requires_grad: Option<bool>,
}

impl TensorType {
    /// Tensor of the given element type and no other refinement.
    pub fn of(scalar: ScalarKind) -> Self {
        Self {
            scalar: Some(scalar),
            ..Default::default()
        }
    }

    /// Builder-style helper to attach a fully known shape.
    pub fn with_shape(mut self, shape: impl IntoIterator<Item = u64>) -> Self {
        self.shape = Some(shape.into_iter().map(Some).collect());
        self
    }

    pub fn with_requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = Some(requires_grad);
        self
    }

    /// Returns the bare tensor type. Element type, shape and autograd
    /// refinements are all erased.
    pub fn unshaped(&self) -> Self {
        Self::default()
    }

    /// Number of dimensions, if known.
    pub fn rank(&self) -> Option<usize> {
        self.shape.as_ref().map(|s| s.len())
    }
}

impl std::fmt::Display for TensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scalar.is_none() && self.shape.is_none() && self.requires_grad.is_none() {
            return write!(f, "Tensor");
        }

        let mut parts = Vec::new();
        if let Some(scalar) = self.scalar {
            parts.push(format!("dtype={}", scalar));
        }
        if let Some(shape) = &self.shape {
            parts.push(format!(
                "shape=[{}]",
                shape
                    .iter()
                    .map(|d| d.map_or_else(|| "*".to_string(), |d| d.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if let Some(requires_grad) = self.requires_grad {
            parts.push(format!("requires_grad={}", requires_grad));
        }
        write!(f, "Tensor({})", parts.join(", "))
    }
}

/// Represents any non-composite type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
pub enum PrimaryType {
    Int,
    Float,
    Bool,
    Str,
    NoneType,
    Device,
    Tensor(TensorType),
}

impl From<TensorType> for PrimaryType {
    fn from(value: TensorType) -> Self {
        PrimaryType::Tensor(value)
    }
}

impl std::fmt::Display for PrimaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryType::Int => write!(f, "int"),
            PrimaryType::Float => write!(f, "float"),
            PrimaryType::Bool => write!(f, "bool"),
            PrimaryType::Str => write!(f, "str"),
            PrimaryType::NoneType => write!(f, "NoneType"),
            PrimaryType::Device => write!(f, "Device"),
            PrimaryType::Tensor(tensor) => write!(f, "{}", tensor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unshaped_erases_every_refinement() {
        let t = TensorType::of(ScalarKind::Float)
            .with_shape([2, 3])
            .with_requires_grad(true);
        assert_eq!(t.rank(), Some(2));

        let u = t.unshaped();
        assert_eq!(u, TensorType::default());
        assert_eq!(u.rank(), None);
        assert_eq!(TensorType::of(ScalarKind::Half).unshaped(), u);
    }

    #[test]
    fn tensor_display() {
        assert_eq!(TensorType::default().to_string(), "Tensor");
        let t = TensorType {
            scalar: Some(ScalarKind::Int64),
            shape: Some(vec![Some(4), None].into_boxed_slice()),
            requires_grad: None,
        };
        assert_eq!(t.to_string(), "Tensor(dtype=int64, shape=[4, *])");
    }
}
