use serde::{Deserialize, Serialize};

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum ColumnKind {
    Boolean,
    Float,
    Integer,
    Jsonb,
    LargeObject,
    String,
}

///
/// ColumnDecl
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnDecl {
    pub name: String,
    pub kind: ColumnKind,

    #[serde(default)]
    pub primary_key: bool,

    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnDecl {
    #[must_use]
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            primary_key: false,
            nullable: true,
        }
    }

    /// Flag the column as (part of) the primary key; implies NOT NULL.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[must_use]
pub fn integer(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::Integer)
}

#[must_use]
pub fn string(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::String)
}

#[must_use]
pub fn boolean(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::Boolean)
}

#[must_use]
pub fn float(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::Float)
}

#[must_use]
pub fn jsonb(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::Jsonb)
}

#[must_use]
pub fn large_object(name: &str) -> ColumnDecl {
    ColumnDecl::new(name, ColumnKind::LargeObject)
}
