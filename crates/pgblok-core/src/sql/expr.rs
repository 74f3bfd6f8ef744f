use crate::value::Value;

///
/// ColumnRef
/// Column addressed through a FROM-item alias or table name.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ColumnRef {
    pub source: String,
    pub name: String,
}

impl ColumnRef {
    #[must_use]
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

///
/// Expr
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    /// Bound parameter; always rendered inline as a literal.
    Bind(Value),
    Null,
    Eq(Box<Self>, Box<Self>),
    IsNull(Box<Self>),
    IsNotNull(Box<Self>),
    And(Vec<Self>),
}

impl Expr {
    #[must_use]
    pub fn equals(self, other: impl Into<Self>) -> Self {
        Self::Eq(Box::new(self), Box::new(other.into()))
    }

    #[must_use]
    pub fn is_null(self) -> Self {
        Self::IsNull(Box::new(self))
    }

    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::IsNotNull(Box::new(self))
    }

    /// Conjoin two predicates, flattening nested `And`s.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut terms = match self {
            Self::And(terms) => terms,
            expr => vec![expr],
        };
        match other {
            Self::And(more) => terms.extend(more),
            expr => terms.push(expr),
        }

        Self::And(terms)
    }
}

impl From<ColumnRef> for Expr {
    fn from(col: ColumnRef) -> Self {
        Self::Column(col)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Bind(value)
    }
}

/// Reference `source.name`.
#[must_use]
pub fn col(source: &str, name: &str) -> Expr {
    Expr::Column(ColumnRef::new(source, name))
}

/// Bind a value; rendered inline since views carry no parameters.
#[must_use]
pub fn bind(value: impl Into<Value>) -> Expr {
    Expr::Bind(value.into())
}
