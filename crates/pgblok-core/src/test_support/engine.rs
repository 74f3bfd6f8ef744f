use crate::{
    mapper::{MapperRequest, Property},
    sql::{DdlPhase, DdlStatement, Selectable},
    test_support::{FIRST_LARGE_OBJECT_OID, eval::evaluate},
    traits::{DdlCatalog, MapperBuilder, Session},
    value::{Oid, Value},
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// One result or table row, keyed by column name.
pub type Row = BTreeMap<String, Value>;

///
/// EngineError
/// Failures worded the way PostgreSQL reports them.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EngineError {
    #[error("relation \"{name}\" does not exist")]
    UndefinedRelation { name: String },

    #[error("relation \"{name}\" already exists")]
    DuplicateRelation { name: String },

    #[error("column \"{column}\" does not exist")]
    UndefinedColumn { column: String },

    #[error("argument of WHERE must be type boolean")]
    NotBoolean,

    #[error("materialized view \"{view}\" has not been populated")]
    NotPopulated { view: String },

    #[error("cannot refresh materialized view \"{view}\" concurrently")]
    ConcurrentRefreshWithoutIndex { view: String },

    #[error("CONCURRENTLY cannot be used when the materialized view is not populated")]
    ConcurrentRefreshUnpopulated { view: String },

    #[error("\"{name}\" is not a materialized view")]
    NotMaterializedView { name: String },

    #[error("cannot change materialized view \"{name}\"")]
    ReadOnlyRelation { name: String },

    #[error("could not create unique index \"{index}\"")]
    UniqueViolation { index: String },

    #[error("large object {oid} does not exist")]
    UndefinedLargeObject { oid: Oid },

    #[error("{message}")]
    Injected { message: String },
}

///
/// MemoryRelation
///

#[derive(Clone, Debug)]
pub enum MemoryRelation {
    Table { next_id: i64 },
    MaterializedView { selectable: Selectable, populated: bool },
}

///
/// Relation
///

#[derive(Clone, Debug)]
pub(super) struct Relation {
    pub(super) kind: MemoryRelation,
    pub(super) columns: Vec<String>,
    pub(super) rows: Vec<Row>,
}

impl Relation {
    /// Rows visible to a reader; unpopulated views refuse to scan.
    pub(super) fn readable_rows(&self, name: &str) -> Result<&[Row], EngineError> {
        match &self.kind {
            MemoryRelation::MaterializedView {
                populated: false, ..
            } => Err(EngineError::NotPopulated {
                view: name.to_string(),
            }),
            _ => Ok(&self.rows),
        }
    }
}

///
/// UniqueIndex
///

#[derive(Clone, Debug)]
struct UniqueIndex {
    relation: String,
    columns: Vec<String>,
}

///
/// MemoryMapper
///
/// What the engine remembers about one bound model: the relation it reads,
/// its primary key and its relations as (local, remote) column pairs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryMapper {
    pub model: String,
    pub tablename: String,
    pub primary_key: Vec<String>,
    pub columns: Vec<String>,
    pub relations: BTreeMap<String, (String, Vec<(String, String)>)>,
}

///
/// MemoryEngine
///

#[derive(Debug, Default)]
pub struct MemoryEngine {
    relations: BTreeMap<String, Relation>,
    indexes: BTreeMap<String, UniqueIndex>,
    scheduled: Vec<(DdlPhase, DdlStatement)>,
    pending: Vec<(String, Row)>,
    executed: Vec<String>,
    mapper_failure: Option<String>,
    pub(super) large_objects: BTreeMap<Oid, Vec<u8>>,
    pub(super) next_oid: Option<u32>,
    pub(super) open_cursors: usize,
    pub(super) cursors_opened: usize,
    pub(super) large_object_write_failure: Option<String>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // tables and rows
    // ------------------------------------------------------------------

    /// Create a base table; an `id` column is filled from a sequence.
    pub fn create_table(&mut self, name: &str, columns: &[&str]) -> Result<(), EngineError> {
        if self.relations.contains_key(name) {
            return Err(EngineError::DuplicateRelation {
                name: name.to_string(),
            });
        }

        self.relations.insert(
            name.to_string(),
            Relation {
                kind: MemoryRelation::Table { next_id: 1 },
                columns: columns.iter().map(ToString::to_string).collect(),
                rows: Vec::new(),
            },
        );

        Ok(())
    }

    /// Stage a row in the unit of work; it becomes visible on `flush`.
    /// Returns the row as it will be stored.
    pub fn insert<'a>(
        &mut self,
        table: &str,
        values: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<Row, EngineError> {
        let relation = self
            .relations
            .get_mut(table)
            .ok_or_else(|| EngineError::UndefinedRelation {
                name: table.to_string(),
            })?;

        let MemoryRelation::Table { next_id } = &mut relation.kind else {
            return Err(EngineError::ReadOnlyRelation {
                name: table.to_string(),
            });
        };

        let mut row: Row = relation
            .columns
            .iter()
            .map(|c| (c.clone(), Value::Null))
            .collect();
        for (column, value) in values {
            let slot = row
                .get_mut(column)
                .ok_or_else(|| EngineError::UndefinedColumn {
                    column: column.to_string(),
                })?;
            *slot = value;
        }

        if let Some(id) = row.get_mut("id")
            && id.is_null()
        {
            *id = Value::Int(*next_id);
            *next_id += 1;
        }

        self.pending.push((table.to_string(), row.clone()));

        Ok(row)
    }

    /// Scan a table or view.
    pub fn select(&self, relation: &str) -> Result<Vec<Row>, EngineError> {
        self.relations
            .get(relation)
            .ok_or_else(|| EngineError::UndefinedRelation {
                name: relation.to_string(),
            })?
            .readable_rows(relation)
            .map(<[Row]>::to_vec)
    }

    /// Scan with a single equality filter.
    pub fn select_where(
        &self,
        relation: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<Row>, EngineError> {
        Ok(self
            .select(relation)?
            .into_iter()
            .filter(|row| row.get(column).and_then(|v| v.sql_eq(value)) == Some(true))
            .collect())
    }

    /// Follow relation `name` of a bound model from one of its rows.
    pub fn related(
        &self,
        mapper: &MemoryMapper,
        row: &Row,
        name: &str,
    ) -> Result<Option<Row>, EngineError> {
        let Some((target, pairs)) = mapper.relations.get(name) else {
            return Err(EngineError::UndefinedColumn {
                column: name.to_string(),
            });
        };

        let mut keys = Vec::with_capacity(pairs.len());
        for (local, remote) in pairs {
            match row.get(local) {
                None | Some(Value::Null) => return Ok(None),
                Some(v) => keys.push((remote, v)),
            }
        }

        Ok(self.select(target)?.into_iter().find(|candidate| {
            keys.iter()
                .all(|(remote, v)| candidate.get(*remote).and_then(|c| c.sql_eq(v)) == Some(true))
        }))
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&MemoryRelation> {
        self.relations.get(name).map(|r| &r.kind)
    }

    #[must_use]
    pub fn has_unique_index(&self, relation: &str) -> bool {
        self.indexes.values().any(|i| i.relation == relation)
    }

    // ------------------------------------------------------------------
    // ddl lifecycle
    // ------------------------------------------------------------------

    #[must_use]
    pub fn scheduled(&self) -> &[(DdlPhase, DdlStatement)] {
        &self.scheduled
    }

    /// Statements run so far, as SQL text.
    #[must_use]
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Run every before-create statement, then every after-create one.
    pub fn create_all(&mut self) -> Result<(), EngineError> {
        self.run_phase(DdlPhase::BeforeCreate)?;
        self.run_phase(DdlPhase::AfterCreate)
    }

    pub fn drop_all(&mut self) -> Result<(), EngineError> {
        self.run_phase(DdlPhase::BeforeDrop)
    }

    fn run_phase(&mut self, phase: DdlPhase) -> Result<(), EngineError> {
        let statements: Vec<DdlStatement> = self
            .scheduled
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, s)| s.clone())
            .collect();

        for statement in &statements {
            self.run(statement)?;
        }

        Ok(())
    }

    fn run(&mut self, statement: &DdlStatement) -> Result<(), EngineError> {
        self.executed.push(statement.to_sql());

        match statement {
            DdlStatement::CreateMaterializedView(create) => {
                if self.relations.contains_key(&create.name) {
                    return Err(EngineError::DuplicateRelation {
                        name: create.name.clone(),
                    });
                }
                let rows = evaluate(&self.relations, &create.selectable)?;
                self.relations.insert(
                    create.name.clone(),
                    Relation {
                        kind: MemoryRelation::MaterializedView {
                            selectable: create.selectable.clone(),
                            populated: true,
                        },
                        columns: create
                            .selectable
                            .column_names()
                            .into_iter()
                            .map(str::to_string)
                            .collect(),
                        rows,
                    },
                );
            }
            DdlStatement::DropMaterializedView(drop) => {
                if let Some(relation) = self.relations.get(&drop.name)
                    && matches!(relation.kind, MemoryRelation::MaterializedView { .. })
                {
                    self.relations.remove(&drop.name);
                    self.indexes.retain(|_, i| i.relation != drop.name);
                }
            }
            DdlStatement::RefreshMaterializedView(refresh) => {
                self.refresh(&refresh.name, refresh.concurrently, refresh.with_data)?;
            }
            DdlStatement::CreateUniqueIndex(index) => {
                let relation = self.relations.get(&index.view).ok_or_else(|| {
                    EngineError::UndefinedRelation {
                        name: index.view.clone(),
                    }
                })?;
                check_unique(&index.name, &index.columns, &relation.rows)?;
                self.indexes.insert(
                    index.name.clone(),
                    UniqueIndex {
                        relation: index.view.clone(),
                        columns: index.columns.clone(),
                    },
                );
            }
        }

        Ok(())
    }

    fn refresh(&mut self, name: &str, concurrently: bool, with_data: bool) -> Result<(), EngineError> {
        let Some(relation) = self.relations.get(name) else {
            return Err(EngineError::UndefinedRelation {
                name: name.to_string(),
            });
        };
        let MemoryRelation::MaterializedView {
            selectable,
            populated,
        } = &relation.kind
        else {
            return Err(EngineError::NotMaterializedView {
                name: name.to_string(),
            });
        };

        if concurrently {
            if !self.has_unique_index(name) {
                return Err(EngineError::ConcurrentRefreshWithoutIndex {
                    view: name.to_string(),
                });
            }
            if !*populated {
                return Err(EngineError::ConcurrentRefreshUnpopulated {
                    view: name.to_string(),
                });
            }
        }

        let rows = if with_data {
            evaluate(&self.relations, selectable)?
        } else {
            Vec::new()
        };
        for (index_name, index) in &self.indexes {
            if index.relation == name {
                check_unique(index_name, &index.columns, &rows)?;
            }
        }

        if let Some(relation) = self.relations.get_mut(name) {
            relation.rows = rows;
            if let MemoryRelation::MaterializedView { populated, .. } = &mut relation.kind {
                *populated = with_data;
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // failure injection
    // ------------------------------------------------------------------

    /// Make every subsequent mapper construction fail with `message`.
    pub fn fail_mappers_with(&mut self, message: &str) {
        self.mapper_failure = Some(message.to_string());
    }

    /// Make every subsequent large-object write fail with `message`.
    pub fn fail_large_object_writes_with(&mut self, message: &str) {
        self.large_object_write_failure = Some(message.to_string());
    }

    pub(super) fn allocate_oid(&mut self) -> Oid {
        let oid = self.next_oid.unwrap_or(FIRST_LARGE_OBJECT_OID);
        self.next_oid = Some(oid + 1);

        Oid(oid)
    }
}

fn check_unique(index: &str, columns: &[String], rows: &[Row]) -> Result<(), EngineError> {
    let mut seen: Vec<Vec<&Value>> = Vec::with_capacity(rows.len());
    for row in rows {
        let key: Vec<&Value> = columns.iter().filter_map(|c| row.get(c)).collect();
        // NULLs never collide in a unique index
        if key.iter().any(|v| v.is_null()) {
            continue;
        }
        if seen.contains(&key) {
            return Err(EngineError::UniqueViolation {
                index: index.to_string(),
            });
        }
        seen.push(key);
    }

    Ok(())
}

impl DdlCatalog for MemoryEngine {
    fn schedule(&mut self, phase: DdlPhase, statement: DdlStatement) {
        self.scheduled.push((phase, statement));
    }
}

impl MapperBuilder for MemoryEngine {
    type Mapper = MemoryMapper;
    type Error = EngineError;

    fn build_mapper(&mut self, request: MapperRequest<'_>) -> Result<Self::Mapper, Self::Error> {
        if let Some(message) = &self.mapper_failure {
            return Err(EngineError::Injected {
                message: message.clone(),
            });
        }

        let mut columns = Vec::new();
        let mut relations = BTreeMap::new();
        for (name, property) in &request.properties {
            match property {
                Property::Column(column) => columns.push(column.name.clone()),
                Property::Relation(relation) => {
                    let pairs: Vec<(String, String)> = relation
                        .local_columns
                        .iter()
                        .map(|c| c.name.clone())
                        .zip(relation.remote_columns.iter().cloned())
                        .collect();
                    relations.insert(name.clone(), (relation.target_tablename.clone(), pairs));
                }
            }
        }

        Ok(MemoryMapper {
            model: request.model.to_string(),
            tablename: request.tablename.to_string(),
            primary_key: request.primary_key.iter().map(|c| c.name.clone()).collect(),
            columns,
            relations,
        })
    }
}

impl Session for MemoryEngine {
    type Error = EngineError;

    fn flush(&mut self) -> Result<(), Self::Error> {
        for (table, row) in std::mem::take(&mut self.pending) {
            let relation =
                self.relations
                    .get_mut(&table)
                    .ok_or_else(|| EngineError::UndefinedRelation {
                        name: table.clone(),
                    })?;
            relation.rows.push(row);
        }

        Ok(())
    }

    fn execute(&mut self, statement: &DdlStatement) -> Result<(), Self::Error> {
        self.run(statement)
    }
}
