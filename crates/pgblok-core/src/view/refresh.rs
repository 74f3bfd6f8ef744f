use crate::{
    obs::sink::{MetricsEvent, record},
    sql::{DdlStatement, RefreshMaterializedView},
    traits::Session,
    view::ViewDescriptor,
};
use pgblok_config::Config;
use std::sync::Arc;

///
/// Refreshable
///
/// Capability shared by every view-backed model. Implementors only expose
/// their view; the refresh itself is provided.
///

pub trait Refreshable {
    fn materialized_view(&self) -> &ViewDescriptor;

    /// Flush pending changes, then rebuild the view's snapshot.
    ///
    /// `concurrently` is forwarded as-is; without a unique index the engine
    /// rejects it and that error comes back unchanged.
    fn refresh_materialized_view<S>(&self, session: &mut S, concurrently: bool) -> Result<(), S::Error>
    where
        S: Session + ?Sized,
    {
        let view = self.materialized_view().name();

        session.flush()?;

        tracing::info!(view, concurrently, "refreshing materialized view");
        let statement: DdlStatement = RefreshMaterializedView::new(view, concurrently).into();
        session.execute(&statement)?;

        record(MetricsEvent::Refresh { view, concurrently });

        Ok(())
    }
}

///
/// ViewModel
///
/// A model bound to a materialized view: its registry name, the shared view
/// descriptor, the primary-key column names and the host's mapper.
///

#[derive(Debug)]
pub struct ViewModel<M> {
    name: String,
    view: Arc<ViewDescriptor>,
    primary_key: Vec<String>,
    mapper: M,
}

impl<M> ViewModel<M> {
    pub(crate) fn new(name: &str, view: Arc<ViewDescriptor>, primary_key: Vec<String>, mapper: M) -> Self {
        Self {
            name: name.to_string(),
            view,
            primary_key,
            mapper,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relation name the model reads from; always the view name.
    #[must_use]
    pub fn tablename(&self) -> &str {
        self.view.name()
    }

    #[must_use]
    pub const fn view(&self) -> &Arc<ViewDescriptor> {
        &self.view
    }

    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    #[must_use]
    pub fn into_mapper(self) -> M {
        self.mapper
    }

    /// True when both models read the very same descriptor.
    #[must_use]
    pub fn shares_view_with<N>(&self, other: &ViewModel<N>) -> bool {
        Arc::ptr_eq(&self.view, &other.view)
    }

    /// Refresh using the configured `CONCURRENTLY` default.
    pub fn refresh<S>(&self, session: &mut S, config: &Config) -> Result<(), S::Error>
    where
        S: Session + ?Sized,
    {
        self.refresh_materialized_view(session, config.view.refresh_concurrently)
    }
}

impl<M> Refreshable for ViewModel<M> {
    fn materialized_view(&self) -> &ViewDescriptor {
        &self.view
    }
}
