//! Declared relations between entities

use serde::Serialize;

use crate::{Error, Result};

/// Kind of a declared relation, seen from its source entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The target row holds the foreign key; at most one match
    HasOne,
    /// The source row holds the foreign key
    BelongsTo,
    /// The target rows hold the foreign key
    HasMany,
    /// Linked through a join-table entity
    BelongsToMany,
}

/// A directed edge from a source entity to a target entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub foreign_key: String,
    pub alias: String,
    pub through: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TargetRelations {
    target: String,
    relations: Vec<Relation>,
}

/// Relations declared on one entity, grouped by target and kept in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRegistry {
    targets: Vec<TargetRelations>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation to `target`. The alias defaults to the target
    /// name; redeclaring an existing `(target, alias)` replaces it in place.
    pub fn declare(
        &mut self,
        kind: RelationKind,
        target: &str,
        foreign_key: &str,
        alias: Option<&str>,
        through: Option<&str>,
    ) -> &mut Self {
        let relation = Relation {
            kind,
            foreign_key: foreign_key.to_string(),
            alias: alias.unwrap_or(target).to_string(),
            through: through.map(str::to_string),
        };

        let index = match self.targets.iter().position(|t| t.target == target) {
            Some(index) => index,
            None => {
                self.targets.push(TargetRelations {
                    target: target.to_string(),
                    relations: Vec::new(),
                });
                self.targets.len() - 1
            }
        };
        let relations = &mut self.targets[index].relations;

        match relations.iter_mut().find(|r| r.alias == relation.alias) {
            Some(existing) => *existing = relation,
            None => relations.push(relation),
        }
        self
    }

    /// Find the relation from `source` to `target` under `alias`, falling
    /// back to the relation keyed by the target name itself.
    ///
    /// `source` is only used to name the entity in the error.
    pub fn lookup(&self, source: &str, target: &str, alias: Option<&str>) -> Result<&Relation> {
        let relations = self
            .relations_to(target)
            .ok_or_else(|| Error::unassociated(source, target))?;

        alias
            .and_then(|alias| relations.iter().find(|r| r.alias == alias))
            .or_else(|| relations.iter().find(|r| r.alias == target))
            .ok_or_else(|| Error::unassociated(source, target))
    }

    /// Aliases registered for `target`, in declaration order
    pub fn aliases(&self, target: &str) -> Vec<&str> {
        self.relations_to(target)
            .map(|relations| relations.iter().map(|r| r.alias.as_str()).collect())
            .unwrap_or_default()
    }

    /// Every declared relation as `(target, relation)`, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.targets.iter().flat_map(|t| {
            t.relations
                .iter()
                .map(move |relation| (t.target.as_str(), relation))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn relations_to(&self, target: &str) -> Option<&[Relation]> {
        self.targets
            .iter()
            .find(|t| t.target == target)
            .map(|t| t.relations.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RelationRegistry {
        let mut registry = RelationRegistry::new();
        registry
            .declare(RelationKind::HasMany, "posts", "user_id", None, None)
            .declare(RelationKind::HasMany, "posts", "editor_id", Some("edited"), None)
            .declare(RelationKind::BelongsTo, "teams", "team_id", None, None);
        registry
    }

    #[test]
    fn test_alias_defaults_to_target() {
        let registry = registry();
        let relation = registry.lookup("users", "teams", None).unwrap();
        assert_eq!(relation.alias, "teams");
        assert_eq!(relation.kind, RelationKind::BelongsTo);
        assert_eq!(relation.foreign_key, "team_id");
    }

    #[test]
    fn test_lookup_by_alias() {
        let registry = registry();
        let relation = registry.lookup("users", "posts", Some("edited")).unwrap();
        assert_eq!(relation.foreign_key, "editor_id");
    }

    #[test]
    fn test_unknown_alias_falls_back_to_target() {
        let registry = registry();
        let relation = registry.lookup("users", "posts", Some("drafts")).unwrap();
        assert_eq!(relation.foreign_key, "user_id");
    }

    #[test]
    fn test_fallback_fails_without_default_alias() {
        let mut registry = RelationRegistry::new();
        registry.declare(RelationKind::BelongsTo, "users", "author_id", Some("author"), None);

        let err = registry.lookup("posts", "users", Some("editor")).unwrap_err();
        assert!(matches!(err, Error::UnassociatedRelation { .. }));
        assert!(registry.lookup("posts", "users", Some("author")).is_ok());
    }

    #[test]
    fn test_missing_target_names_both_entities() {
        let err = registry().lookup("users", "comments", None).unwrap_err();
        match err {
            Error::UnassociatedRelation { entity, target } => {
                assert_eq!(entity, "users");
                assert_eq!(target, "comments");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_aliases_in_declaration_order() {
        let registry = registry();
        assert_eq!(registry.aliases("posts"), vec!["posts", "edited"]);
        assert!(registry.aliases("comments").is_empty());
    }

    #[test]
    fn test_redeclaration_replaces_in_place() {
        let mut registry = registry();
        registry.declare(RelationKind::HasOne, "posts", "owner_id", None, None);

        assert_eq!(registry.aliases("posts"), vec!["posts", "edited"]);
        let relation = registry.lookup("users", "posts", None).unwrap();
        assert_eq!(relation.kind, RelationKind::HasOne);
        assert_eq!(relation.foreign_key, "owner_id");
    }

    #[test]
    fn test_through_is_recorded() {
        let mut registry = RelationRegistry::new();
        registry.declare(
            RelationKind::BelongsToMany,
            "tags",
            "post_id",
            None,
            Some("post_tags"),
        );
        let relation = registry.lookup("posts", "tags", None).unwrap();
        assert_eq!(relation.through.as_deref(), Some("post_tags"));
        assert_eq!(registry.iter().count(), 1);
    }
}
