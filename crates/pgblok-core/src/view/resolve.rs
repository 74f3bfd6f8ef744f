use crate::{
    error::DeclarationError,
    model::{ModelDeclaration, ViewDeclarationFn},
    obs::ReuseKind,
    view::{ViewDescriptor, ViewRegistry},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

///
/// ViewResolution
/// Outcome of locating the view a model binds to.
///

#[derive(Clone)]
pub enum ViewResolution {
    New(ViewDeclarationFn),
    ReuseByName(Arc<ViewDescriptor>),
    ReuseByReference(Arc<ViewDescriptor>),
}

impl ViewResolution {
    /// Existing descriptor, if the model reuses one.
    #[must_use]
    pub const fn reused(&self) -> Option<&Arc<ViewDescriptor>> {
        match self {
            Self::New(_) => None,
            Self::ReuseByName(view) | Self::ReuseByReference(view) => Some(view),
        }
    }

    #[must_use]
    pub const fn reuse_kind(&self) -> Option<ReuseKind> {
        match self {
            Self::New(_) => None,
            Self::ReuseByName(_) => Some(ReuseKind::ByName),
            Self::ReuseByReference(_) => Some(ReuseKind::ByReference),
        }
    }
}

impl fmt::Debug for ViewResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New(_) => f.write_str("New"),
            Self::ReuseByName(view) => f.debug_tuple("ReuseByName").field(&view.name()).finish(),
            Self::ReuseByReference(view) => f
                .debug_tuple("ReuseByReference")
                .field(&view.name())
                .finish(),
        }
    }
}

/// Locate the view for `decl`, in fixed priority order:
/// explicit reference, bound parent, registered tablename, own declaration.
///
/// Pure: nothing is built or scheduled here.
pub fn resolve_view(
    decl: &ModelDeclaration,
    registry: &ViewRegistry,
    bound: &BTreeMap<String, Arc<ViewDescriptor>>,
) -> Result<ViewResolution, DeclarationError> {
    // 1. explicit reference must point at a bound model
    if let Some(target) = decl.get_view_of() {
        return bound.get(target).map_or_else(
            || {
                Err(DeclarationError::UnboundViewReference {
                    model: decl.name().to_string(),
                    target: target.to_string(),
                })
            },
            |view| Ok(ViewResolution::ReuseByReference(Arc::clone(view))),
        );
    }

    // 2. parent already bound to a view
    if let Some(view) = decl.get_inherits().and_then(|parent| bound.get(parent)) {
        return Ok(ViewResolution::ReuseByReference(Arc::clone(view)));
    }

    // 3. tablename already registered
    if let Some(view) = registry.get(&decl.resolved_tablename()) {
        return Ok(ViewResolution::ReuseByName(Arc::clone(view)));
    }

    // 4. build from the model's own declaration
    decl.get_view_declaration().map_or_else(
        || {
            Err(DeclarationError::MissingViewDeclaration {
                model: decl.name().to_string(),
            })
        },
        |f| Ok(ViewResolution::New(Arc::clone(f))),
    )
}
