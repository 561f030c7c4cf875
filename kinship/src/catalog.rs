//! The registry of entity descriptors a query is composed against

use std::collections::HashMap;

use crate::entity::EntityDescriptor;
use crate::relation::Relation;
use crate::{Error, Result};

/// Entity descriptors keyed by table name.
///
/// Populate the catalog once, then share it by reference with every
/// [`QueryComposer`](crate::QueryComposer) built against it.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entities: HashMap<String, EntityDescriptor>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, running its deferred-relation hook.
    ///
    /// Registering a second entity under the same name replaces the first.
    pub fn register(&mut self, mut entity: EntityDescriptor) -> Result<&mut Self> {
        if entity.name().trim().is_empty() {
            return Err(Error::MissingTableName);
        }
        entity.finalize_relations();
        tracing::debug!(entity = entity.name(), "kinship.register");
        self.entities.insert(entity.name().to_string(), entity);
        Ok(self)
    }

    /// The descriptor registered under `name`
    pub fn entity(&self, name: &str) -> Result<&EntityDescriptor> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::unknown_entity(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Look up the relation from `source` to `target`
    pub fn relation(&self, source: &str, target: &str, alias: Option<&str>) -> Result<&Relation> {
        self.entity(source)?.relations().lookup(source, target, alias)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelationKind;

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = SchemaCatalog::new();
        catalog
            .register(EntityDescriptor::builder("users").column("id").build())
            .unwrap();

        assert!(catalog.contains("users"));
        assert_eq!(catalog.entity("users").unwrap().name(), "users");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut catalog = SchemaCatalog::new();
        let err = catalog
            .register(EntityDescriptor::builder("  ").build())
            .unwrap_err();
        assert!(matches!(err, Error::MissingTableName));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_unknown_entity() {
        let catalog = SchemaCatalog::new();
        let err = catalog.entity("ghosts").unwrap_err();
        assert_eq!(err.to_string(), "entity 'ghosts' is not registered");
    }

    #[test]
    fn test_register_runs_deferred_relations() {
        let mut catalog = SchemaCatalog::new();
        catalog
            .register(
                EntityDescriptor::builder("posts")
                    .deferred_relations(|relations| {
                        relations.declare(RelationKind::BelongsTo, "users", "user_id", None, None);
                    })
                    .build(),
            )
            .unwrap();

        let relation = catalog.relation("posts", "users", None).unwrap();
        assert_eq!(relation.kind, RelationKind::BelongsTo);
    }
}
