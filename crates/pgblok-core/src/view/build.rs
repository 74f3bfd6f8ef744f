use crate::{
    error::{DeclarationError, Error},
    mapper::{MapperRequest, Property, RelationProperty},
    model::{Many2One, ModelDeclaration},
    obs::{
        MetricsSink, ReuseKind, with_metrics_sink,
        sink::{MetricsEvent, record},
    },
    sql::{CreateUniqueIndex, DdlPhase},
    traits::{DdlCatalog, MapperBuilder},
    view::{
        PreparedView, ProjectedColumn, ViewDescriptor, ViewModel, ViewRegistry,
        registry::schedule,
        resolve::{ViewResolution, resolve_view},
    },
};
use pgblok_config::ViewConfig;
use std::{collections::BTreeMap, sync::Arc};

///
/// ModelInfo
/// What relations need to know about a registered target model.
///

#[derive(Clone, Debug, Eq, PartialEq)]
struct ModelInfo {
    tablename: String,
    primary_key: Vec<String>,
}

///
/// RegistryBuild
///
/// One model-registry build pass. Owns the view registry and the bound-model
/// map; the host supplies DDL scheduling and mapper construction. Dropping
/// the build (or calling `reset`) discards every descriptor.
///

pub struct RegistryBuild<'h, H>
where
    H: DdlCatalog + MapperBuilder + ?Sized,
{
    host: &'h mut H,
    views: ViewRegistry,
    bound: BTreeMap<String, Arc<ViewDescriptor>>,
    models: BTreeMap<String, ModelInfo>,
    config: ViewConfig,
    metrics: Option<&'static dyn MetricsSink>,
}

impl<'h, H> RegistryBuild<'h, H>
where
    H: DdlCatalog + MapperBuilder + ?Sized,
{
    pub fn new(host: &'h mut H) -> Self {
        Self::with_config(host, ViewConfig::default())
    }

    pub fn with_config(host: &'h mut H, config: ViewConfig) -> Self {
        Self {
            host,
            views: ViewRegistry::new(),
            bound: BTreeMap::new(),
            models: BTreeMap::new(),
            config,
            metrics: None,
        }
    }

    /// Route this build's metrics events to `sink` instead of the
    /// thread-local counters.
    #[must_use]
    pub fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// View bound to a registered model, if any.
    #[must_use]
    pub fn bound_view(&self, model: &str) -> Option<&Arc<ViewDescriptor>> {
        self.bound.get(model)
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut *self.host
    }

    /// Start over: the next model sees an empty registry.
    pub fn reset(&mut self) {
        self.views.clear();
        self.bound.clear();
        self.models.clear();
    }

    /// Register a plain table model so relations can target it.
    pub fn add_table_model(&mut self, decl: &ModelDeclaration) -> Result<(), Error> {
        self.ensure_unique(decl)?;

        let primary_key = decl.primary_key();
        if primary_key.is_empty() {
            return Err(DeclarationError::MissingPrimaryKey {
                model: decl.name().to_string(),
            }
            .into());
        }

        self.models.insert(
            decl.name().to_string(),
            ModelInfo {
                tablename: decl.resolved_tablename(),
                primary_key,
            },
        );

        Ok(())
    }

    /// Bind a view-backed model, creating its view on first use.
    pub fn add_view_model(
        &mut self,
        decl: &ModelDeclaration,
    ) -> Result<ViewModel<H::Mapper>, Error> {
        let sink = self.metrics;
        match sink {
            Some(sink) => with_metrics_sink(sink, || self.bind_view_model(decl)),
            None => self.bind_view_model(decl),
        }
    }

    fn bind_view_model(&mut self, decl: &ModelDeclaration) -> Result<ViewModel<H::Mapper>, Error> {
        self.ensure_unique(decl)?;

        let resolution = resolve_view(decl, &self.views, &self.bound)?;

        // fail before any DDL is scheduled
        let primary_key = decl.primary_key();
        if primary_key.is_empty() {
            return Err(DeclarationError::MissingPrimaryKey {
                model: decl.name().to_string(),
            }
            .into());
        }

        let pending = self.prepare_view(decl, resolution)?;
        let request = self.mapper_request(decl, pending.descriptor(), &primary_key)?;

        let mapper = self
            .host
            .build_mapper(request)
            .map_err(|err| Error::Mapper {
                model: decl.name().to_string(),
                source: err.into(),
            })?;

        // nothing is registered or scheduled until the mapper exists
        let view = self.commit_view(decl, pending);

        record(MetricsEvent::MapperBound {
            view: view.name(),
            model: decl.name(),
        });
        tracing::debug!(model = decl.name(), view = view.name(), "mapper bound");

        self.bound
            .insert(decl.name().to_string(), Arc::clone(&view));
        self.models.insert(
            decl.name().to_string(),
            ModelInfo {
                tablename: view.name().to_string(),
                primary_key: primary_key.clone(),
            },
        );

        Ok(ViewModel::new(decl.name(), view, primary_key, mapper))
    }

    fn ensure_unique(&self, decl: &ModelDeclaration) -> Result<(), DeclarationError> {
        if self.models.contains_key(decl.name()) {
            return Err(DeclarationError::DuplicateModel {
                model: decl.name().to_string(),
            });
        }

        Ok(())
    }

    // Build the view for a new declaration, or pick the shared one. Nothing
    // is registered yet.
    fn prepare_view(
        &self,
        decl: &ModelDeclaration,
        resolution: ViewResolution,
    ) -> Result<PendingView, DeclarationError> {
        let declaration = match resolution {
            ViewResolution::New(declaration) => declaration,
            ViewResolution::ReuseByName(view) => {
                return Ok(PendingView::Reused(view, ReuseKind::ByName));
            }
            ViewResolution::ReuseByReference(view) => {
                return Ok(PendingView::Reused(view, ReuseKind::ByReference));
            }
        };

        let tablename = decl.resolved_tablename();
        let with_data = decl.get_with_data().unwrap_or(self.config.with_data);
        let prepared = ViewRegistry::prepare(&tablename, with_data, declaration().into_selectable());

        let view = prepared.descriptor();
        if view.columns().is_empty() {
            return Err(DeclarationError::EmptyView {
                model: decl.name().to_string(),
                view: view.name().to_string(),
            });
        }
        for columns in decl.unique_indexes() {
            for column in columns {
                projected(decl, view, column)?;
            }
        }

        Ok(PendingView::New(prepared))
    }

    // Register a new view with its DDL and unique indexes, or record reuse.
    fn commit_view(&mut self, decl: &ModelDeclaration, pending: PendingView) -> Arc<ViewDescriptor> {
        let prepared = match pending {
            PendingView::New(prepared) => prepared,
            PendingView::Reused(view, kind) => return reuse(decl, view, kind),
        };

        let view = self.views.commit(prepared, &mut *self.host);
        for columns in decl.unique_indexes() {
            schedule(
                &mut *self.host,
                view.name(),
                DdlPhase::AfterCreate,
                CreateUniqueIndex::for_view(view.name(), columns).into(),
            );
        }

        view
    }

    fn mapper_request<'v>(
        &self,
        decl: &'v ModelDeclaration,
        view: &'v Arc<ViewDescriptor>,
        primary_key: &[String],
    ) -> Result<MapperRequest<'v>, DeclarationError> {
        let primary_key = primary_key
            .iter()
            .map(|name| projected(decl, view, name).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        let mut properties = BTreeMap::new();
        for column in decl.columns() {
            let proxy = projected(decl, view, &column.name)?;
            properties.insert(column.name.clone(), Property::Column(proxy.clone()));
        }
        for relation in decl.relations() {
            let property = self.relation_property(decl, view, relation)?;
            properties.insert(relation.name.clone(), Property::Relation(property));
        }

        Ok(MapperRequest {
            model: decl.name(),
            tablename: view.name(),
            view,
            primary_key,
            properties,
        })
    }

    fn relation_property(
        &self,
        decl: &ModelDeclaration,
        view: &ViewDescriptor,
        relation: &Many2One,
    ) -> Result<RelationProperty, DeclarationError> {
        // a view may reference itself before it is registered
        let target = if relation.target == decl.name() {
            ModelInfo {
                tablename: view.name().to_string(),
                primary_key: decl.primary_key(),
            }
        } else {
            self.models
                .get(&relation.target)
                .cloned()
                .ok_or_else(|| DeclarationError::UnknownRelationTarget {
                    model: decl.name().to_string(),
                    relation: relation.name.clone(),
                    target: relation.target.clone(),
                })?
        };

        let (local, remote) = relation.arity(&target.primary_key);
        if local != remote {
            return Err(DeclarationError::RelationArity {
                model: decl.name().to_string(),
                relation: relation.name.clone(),
                local,
                remote,
            });
        }

        let mut local_columns = Vec::new();
        let mut remote_columns = Vec::new();
        for (local, remote) in relation.column_pairs(&target.primary_key) {
            local_columns.push(projected(decl, view, &local)?.clone());
            remote_columns.push(remote);
        }

        Ok(RelationProperty {
            target: relation.target.clone(),
            target_tablename: target.tablename,
            local_columns,
            remote_columns,
        })
    }
}

///
/// PendingView
/// Outcome of view resolution before anything is committed.
///

enum PendingView {
    New(PreparedView),
    Reused(Arc<ViewDescriptor>, ReuseKind),
}

impl PendingView {
    const fn descriptor(&self) -> &Arc<ViewDescriptor> {
        match self {
            Self::New(prepared) => prepared.descriptor(),
            Self::Reused(view, _) => view,
        }
    }
}

fn reuse(decl: &ModelDeclaration, view: Arc<ViewDescriptor>, kind: ReuseKind) -> Arc<ViewDescriptor> {
    record(MetricsEvent::ViewReused {
        view: view.name(),
        model: decl.name(),
        kind,
    });
    tracing::debug!(model = decl.name(), view = view.name(), ?kind, "view reused");

    view
}

fn projected<'v>(
    decl: &ModelDeclaration,
    view: &'v ViewDescriptor,
    column: &str,
) -> Result<&'v ProjectedColumn, DeclarationError> {
    view.column(column)
        .ok_or_else(|| DeclarationError::UnknownViewColumn {
            model: decl.name().to_string(),
            view: view.name().to_string(),
            column: column.to_string(),
        })
}
