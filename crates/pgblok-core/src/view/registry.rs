use crate::{
    obs::sink::{MetricsEvent, record},
    sql::{DdlPhase, DdlStatement, RefreshMaterializedView, Selectable},
    traits::DdlCatalog,
    view::ViewDescriptor,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// ViewRegistry
///
/// View name -> shared descriptor, scoped to one registry build. Each name
/// is materialized once; later lookups return the stored `Arc`.
///

#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: BTreeMap<String, Arc<ViewDescriptor>>,
}

impl ViewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ViewDescriptor>> {
        self.views.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ViewDescriptor>)> {
        self.views.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Forget every descriptor; the next build starts empty.
    pub fn clear(&mut self) {
        self.views.clear();
    }

    /// Return the descriptor for `name`, building it on first use.
    ///
    /// `build_fn` runs only when `name` is unknown. A new view schedules
    /// drop-before-create, create-after-create and drop-before-drop.
    pub fn resolve_or_create<D>(
        &mut self,
        name: &str,
        with_data: bool,
        build_fn: impl FnOnce() -> Selectable,
        ddl: &mut D,
    ) -> Arc<ViewDescriptor>
    where
        D: DdlCatalog + ?Sized,
    {
        if let Some(existing) = self.views.get(name) {
            return Arc::clone(existing);
        }

        self.commit(Self::prepare(name, with_data, build_fn()), ddl)
    }

    /// Build a descriptor without registering it or scheduling any DDL.
    #[must_use]
    pub fn prepare(name: &str, with_data: bool, selectable: Selectable) -> PreparedView {
        PreparedView {
            descriptor: Arc::new(ViewDescriptor::new(name, selectable, with_data)),
        }
    }

    /// Register a prepared view and schedule its lifecycle DDL.
    ///
    /// If the name was registered in the meantime the stored descriptor wins
    /// and nothing is scheduled.
    pub fn commit<D>(&mut self, prepared: PreparedView, ddl: &mut D) -> Arc<ViewDescriptor>
    where
        D: DdlCatalog + ?Sized,
    {
        let descriptor = prepared.descriptor;
        let name = descriptor.name();
        if let Some(existing) = self.views.get(name) {
            return Arc::clone(existing);
        }

        self.views
            .insert(name.to_string(), Arc::clone(&descriptor));

        let with_data = descriptor.with_data();
        schedule(ddl, name, DdlPhase::BeforeCreate, descriptor.drop_statement().into());
        schedule(ddl, name, DdlPhase::AfterCreate, descriptor.create_statement().into());
        if !with_data {
            schedule(
                ddl,
                name,
                DdlPhase::AfterCreate,
                RefreshMaterializedView::with_no_data(name).into(),
            );
        }
        schedule(ddl, name, DdlPhase::BeforeDrop, descriptor.drop_statement().into());

        record(MetricsEvent::ViewCreated { view: name });
        tracing::debug!(
            view = name,
            columns = descriptor.columns().len(),
            with_data,
            "materialized view registered"
        );

        descriptor
    }
}

///
/// PreparedView
///
/// A descriptor that is built but not yet registered. Dropping it leaves the
/// registry and the DDL catalog untouched.
///

#[derive(Debug)]
pub struct PreparedView {
    descriptor: Arc<ViewDescriptor>,
}

impl PreparedView {
    #[must_use]
    pub const fn descriptor(&self) -> &Arc<ViewDescriptor> {
        &self.descriptor
    }
}

pub(crate) fn schedule<D>(ddl: &mut D, view: &str, phase: DdlPhase, statement: DdlStatement)
where
    D: DdlCatalog + ?Sized,
{
    tracing::debug!(view, %phase, sql = %statement, "ddl scheduled");
    record(MetricsEvent::DdlScheduled { view, phase });
    ddl.schedule(phase, statement);
}
