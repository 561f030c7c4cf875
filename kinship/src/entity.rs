//! Entity descriptors: the static schema of one table

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::relation::{RelationKind, RelationRegistry};

/// Produces `(source expression, output name)` for a virtual attribute,
/// given the table alias it is being selected under.
pub type VirtualAttributeFn = Arc<dyn Fn(&str) -> (String, String) + Send + Sync>;

/// Hook run once when the entity is registered in a catalog, used to
/// declare relations that could not be written at build time.
pub type DeferredRelationsFn = Arc<dyn Fn(&mut RelationRegistry) + Send + Sync>;

/// A physical column and the name it is exposed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub output: Option<String>,
}

impl ColumnDef {
    /// The output name, falling back to the column name
    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.name)
    }
}

/// Static description of one entity (table).
///
/// Descriptors are built once, registered in a
/// [`SchemaCatalog`](crate::SchemaCatalog), and never mutated afterwards.
#[derive(Clone)]
pub struct EntityDescriptor {
    name: String,
    primary_key: String,
    columns: Vec<ColumnDef>,
    virtual_attributes: HashMap<String, VirtualAttributeFn>,
    relations: RelationRegistry,
    deferred_relations: Option<DeferredRelationsFn>,
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut virtual_names: Vec<&String> = self.virtual_attributes.keys().collect();
        virtual_names.sort();
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("columns", &self.columns)
            .field("virtual_attributes", &virtual_names)
            .field("relations", &self.relations)
            .finish()
    }
}

impl EntityDescriptor {
    /// Start describing the entity stored in `name`
    pub fn builder(name: &str) -> EntityBuilder {
        EntityBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn virtual_attribute(&self, name: &str) -> Option<&VirtualAttributeFn> {
        self.virtual_attributes.get(name)
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    /// Run the deferred-relation hook, if any. Called by the catalog.
    pub(crate) fn finalize_relations(&mut self) {
        if let Some(hook) = self.deferred_relations.take() {
            hook(&mut self.relations);
        }
    }
}

/// Builder for [`EntityDescriptor`]
///
/// # Examples
///
/// ```
/// use kinship::EntityDescriptor;
///
/// let users = EntityDescriptor::builder("users")
///     .column("id")
///     .column_as("full_name", "name")
///     .has_many("posts", "user_id")
///     .build();
///
/// assert_eq!(users.primary_key(), "id");
/// assert_eq!(users.column("full_name").unwrap().output_name(), "name");
/// ```
pub struct EntityBuilder {
    descriptor: EntityDescriptor,
}

impl EntityBuilder {
    fn new(name: &str) -> Self {
        Self {
            descriptor: EntityDescriptor {
                name: name.to_string(),
                primary_key: "id".to_string(),
                columns: Vec::new(),
                virtual_attributes: HashMap::new(),
                relations: RelationRegistry::new(),
                deferred_relations: None,
            },
        }
    }

    /// Override the primary key (defaults to `id`)
    pub fn primary_key(mut self, column: &str) -> Self {
        self.descriptor.primary_key = column.to_string();
        self
    }

    /// A column exposed under its own name
    pub fn column(mut self, name: &str) -> Self {
        self.push_column(name, None);
        self
    }

    /// Several columns exposed under their own names
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.push_column(name.as_ref(), None);
        }
        self
    }

    /// A column exposed under a different output name
    pub fn column_as(mut self, name: &str, output: &str) -> Self {
        self.push_column(name, Some(output.to_string()));
        self
    }

    fn push_column(&mut self, name: &str, output: Option<String>) {
        let def = ColumnDef {
            name: name.to_string(),
            output,
        };
        match self.descriptor.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = def,
            None => self.descriptor.columns.push(def),
        }
    }

    /// A computed attribute; `f` receives the table alias and returns the
    /// source expression and the output name.
    pub fn virtual_attribute<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str) -> (String, String) + Send + Sync + 'static,
    {
        self.descriptor
            .virtual_attributes
            .insert(name.to_string(), Arc::new(f));
        self
    }

    pub fn has_one(self, target: &str, foreign_key: &str) -> Self {
        self.relation(RelationKind::HasOne, target, foreign_key, None)
    }

    pub fn has_one_as(self, target: &str, foreign_key: &str, alias: &str) -> Self {
        self.relation(RelationKind::HasOne, target, foreign_key, Some(alias))
    }

    pub fn belongs_to(self, target: &str, foreign_key: &str) -> Self {
        self.relation(RelationKind::BelongsTo, target, foreign_key, None)
    }

    pub fn belongs_to_as(self, target: &str, foreign_key: &str, alias: &str) -> Self {
        self.relation(RelationKind::BelongsTo, target, foreign_key, Some(alias))
    }

    pub fn has_many(self, target: &str, foreign_key: &str) -> Self {
        self.relation(RelationKind::HasMany, target, foreign_key, None)
    }

    pub fn has_many_as(self, target: &str, foreign_key: &str, alias: &str) -> Self {
        self.relation(RelationKind::HasMany, target, foreign_key, Some(alias))
    }

    /// Many-to-many through a join-table entity
    pub fn belongs_to_many(
        mut self,
        target: &str,
        foreign_key: &str,
        alias: Option<&str>,
        through: &str,
    ) -> Self {
        self.descriptor.relations.declare(
            RelationKind::BelongsToMany,
            target,
            foreign_key,
            alias,
            Some(through),
        );
        self
    }

    /// Declare a relation of any kind
    pub fn relation(
        mut self,
        kind: RelationKind,
        target: &str,
        foreign_key: &str,
        alias: Option<&str>,
    ) -> Self {
        self.descriptor
            .relations
            .declare(kind, target, foreign_key, alias, None);
        self
    }

    /// Relations to declare when the entity is registered
    pub fn deferred_relations<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RelationRegistry) + Send + Sync + 'static,
    {
        self.descriptor.deferred_relations = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> EntityDescriptor {
        self.descriptor
    }
}
