/// The scalar kinds of the language.  `Nothing` may only appear as a
/// function return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Char,
    Nothing,
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Int => f.write_str("int"),
            ScalarKind::Char => f.write_str("char"),
            ScalarKind::Nothing => f.write_str("nothing"),
        }
    }
}

/// One dimension of an array type.  `Unspecified` is only legal as the
/// leading dimension of a reference parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Unspecified,
    Fixed(i64),
}

/// A variable or parameter type: a scalar, or an array of a scalar with an
/// ordered, non-empty dimension list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Scalar(ScalarKind),
    Array { elem: ScalarKind, dims: Vec<Dim> },
}

impl DataType {
    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array { .. })
    }

    /// The scalar this type bottoms out in.
    pub fn elem_kind(&self) -> ScalarKind {
        match self {
            DataType::Scalar(k) => *k,
            DataType::Array { elem, .. } => *elem,
        }
    }

    pub fn dims(&self) -> &[Dim] {
        match self {
            DataType::Scalar(_) => &[],
            DataType::Array { dims, .. } => dims,
        }
    }

    /// Whether the leading dimension is left unspecified (the `char[]`
    /// parameter form).
    pub fn has_unspecified_dim(&self) -> bool {
        matches!(self.dims().first(), Some(Dim::Unspecified))
    }

    /// The type obtained by indexing away the first `n` dimensions.
    pub fn index_by(&self, n: usize) -> DataType {
        match self {
            DataType::Scalar(k) => DataType::Scalar(*k),
            DataType::Array { elem, dims } => {
                if n >= dims.len() {
                    DataType::Scalar(*elem)
                } else {
                    DataType::Array {
                        elem: *elem,
                        dims: dims[n..].to_vec(),
                    }
                }
            }
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Scalar(k) => write!(f, "{}", k),
            DataType::Array { elem, dims } => {
                write!(f, "{}", elem)?;
                for d in dims {
                    match d {
                        Dim::Unspecified => f.write_str("[]")?,
                        Dim::Fixed(n) => write!(f, "[{}]", n)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// How a parameter receives its argument.  Arrays are always by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    ByValue,
    ByReference,
}

impl std::fmt::Display for PassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassMode::ByValue => f.write_str("by value"),
            PassMode::ByReference => f.write_str("by reference"),
        }
    }
}
