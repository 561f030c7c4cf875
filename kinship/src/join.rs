//! Join argument resolution.
//!
//! A join names its target entity and then takes up to three optional
//! arguments: an alias, a column selection and a join condition. Callers may
//! leave any of them out, so the arguments are positional but typed
//! ([`JoinArg`]), and [`resolve`] decides which slot each one fills. The
//! result is always a canonical [`JoinSpec`].
//!
//! [`JoinOptions`] builds the same `JoinSpec` from named fields.

use std::fmt;
use std::sync::Arc;

use kinship_core::Value;
use serde_json::{Map, Value as JsonValue};

use crate::composer::QueryComposer;
use crate::{Error, Result};

pub use kinship_core::JoinType as JoinKind;

const INCLUDE: &str = "include";
const EXCLUDE: &str = "exclude";
const OR: &str = "$or";
const EVERY_ALIAS: &str = "*";

type NestedJoinFn =
    dyn for<'c> Fn(QueryComposer<'c>) -> Result<QueryComposer<'c>> + Send + Sync;

/// A callback that adds joins under a joined entity.
///
/// It receives a composer scoped to the joined entity and returns it once
/// done; everything it adds lands on the enclosing statement.
#[derive(Clone)]
pub struct NestedJoin(Arc<NestedJoinFn>);

impl NestedJoin {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'c> Fn(QueryComposer<'c>) -> Result<QueryComposer<'c>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call<'c>(&self, composer: QueryComposer<'c>) -> Result<QueryComposer<'c>> {
        (self.0)(composer)
    }
}

impl fmt::Debug for NestedJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NestedJoin(..)")
    }
}

/// One positional argument of a join call
#[derive(Debug, Clone)]
pub enum JoinArg {
    /// Alias for the joined entity, or `*` for every declared alias
    Alias(String),
    /// Explicit column list
    Columns(Vec<String>),
    /// Either an `include`/`exclude` column filter or equality conditions
    Object(Map<String, JsonValue>),
    /// Callback adding joins under the joined entity
    Nested(NestedJoin),
    /// A JSON value of no recognised shape; `null` counts as absent
    Other(JsonValue),
}

impl JoinArg {
    pub fn alias(alias: impl Into<String>) -> Self {
        Self::Alias(alias.into())
    }

    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Columns(columns.into_iter().map(Into::into).collect())
    }

    pub fn nested<F>(f: F) -> Self
    where
        F: for<'c> Fn(QueryComposer<'c>) -> Result<QueryComposer<'c>> + Send + Sync + 'static,
    {
        Self::Nested(NestedJoin::new(f))
    }

    fn is_absent(&self) -> bool {
        matches!(self, JoinArg::Other(JsonValue::Null))
    }
}

impl From<&str> for JoinArg {
    fn from(alias: &str) -> Self {
        JoinArg::Alias(alias.to_string())
    }
}

impl From<String> for JoinArg {
    fn from(alias: String) -> Self {
        JoinArg::Alias(alias)
    }
}

impl From<Vec<&str>> for JoinArg {
    fn from(columns: Vec<&str>) -> Self {
        JoinArg::columns(columns)
    }
}

impl From<Vec<String>> for JoinArg {
    fn from(columns: Vec<String>) -> Self {
        JoinArg::Columns(columns)
    }
}

impl From<Map<String, JsonValue>> for JoinArg {
    fn from(object: Map<String, JsonValue>) -> Self {
        JoinArg::Object(object)
    }
}

// `None` is an absent argument
impl<T: Into<JoinArg>> From<Option<T>> for JoinArg {
    fn from(arg: Option<T>) -> Self {
        arg.map(Into::into).unwrap_or(JoinArg::Other(JsonValue::Null))
    }
}

impl From<NestedJoin> for JoinArg {
    fn from(nested: NestedJoin) -> Self {
        JoinArg::Nested(nested)
    }
}

// json!("p"), json!(["id", "title"]) and json!({...}) map onto the typed
// variants; anything else is kept for the resolver to reject.
impl From<JsonValue> for JoinArg {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::String(alias) => JoinArg::Alias(alias),
            JsonValue::Object(object) => JoinArg::Object(object),
            JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => JoinArg::Columns(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        JsonValue::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => JoinArg::Other(other),
        }
    }
}

/// Which columns of a joined entity to select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Exactly these columns (virtual attributes allowed)
    List(Vec<String>),
    /// The declared columns plus `include`, minus `exclude`
    Filter {
        include: Vec<String>,
        exclude: Vec<String>,
    },
}

/// Equality conditions added to a join's ON clause.
///
/// `equals` terms are AND-ed; `any_of` terms form one OR-ed group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pub equals: Vec<(String, Value)>,
    pub any_of: Vec<(String, Value)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `joined.column = value`
    pub fn equal(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.equals.push((column.to_string(), value.into()));
        self
    }

    /// Add `joined.column = value` to the OR group
    pub fn any_of(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.any_of.push((column.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.any_of.is_empty()
    }

    /// Read a conditions object: `{"state": "draft", "$or": {"kind": "a"}}`
    fn from_object(position: usize, object: &Map<String, JsonValue>) -> Result<Self> {
        let mut conditions = Conditions::new();
        for (key, value) in object {
            if key == OR {
                let group = value.as_object().ok_or_else(|| {
                    Error::ambiguous(
                        position,
                        "the $or entry of a join condition must be an object",
                    )
                })?;
                for (column, value) in group {
                    conditions
                        .any_of
                        .push((column.clone(), Value::from_json(value)));
                }
            } else {
                conditions.equals.push((key.clone(), Value::from_json(value)));
            }
        }
        Ok(conditions)
    }
}

/// Extra restriction applied to a join
#[derive(Debug, Clone)]
pub enum JoinCondition {
    Equals(Conditions),
    Nested(NestedJoin),
}

/// A fully resolved join request
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub target: String,
    pub alias: String,
    pub columns: Option<ColumnSpec>,
    pub condition: Option<JoinCondition>,
}

/// What a join's alias refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinTarget<'a> {
    Alias(&'a str),
    /// `*`: one join per alias declared for the target
    EveryAlias,
}

impl JoinSpec {
    pub fn target(&self) -> JoinTarget<'_> {
        if self.alias == EVERY_ALIAS {
            JoinTarget::EveryAlias
        } else {
            JoinTarget::Alias(&self.alias)
        }
    }

    /// The same join under another alias
    pub(crate) fn with_alias(&self, alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            ..self.clone()
        }
    }
}

// Slots in the order they must appear
enum Slot {
    Alias(String),
    Columns(ColumnSpec),
    Condition(JoinCondition),
}

impl Slot {
    fn rank(&self) -> usize {
        match self {
            Slot::Alias(_) => 0,
            Slot::Columns(_) => 1,
            Slot::Condition(_) => 2,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Slot::Alias(_) => "an alias",
            Slot::Columns(_) => "a column selection",
            Slot::Condition(_) => "a join condition",
        }
    }
}

fn string_list(position: usize, key: &str, value: &JsonValue) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        Error::ambiguous(position, format!("'{}' must be an array of column names", key))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Error::ambiguous(position, format!("'{}' must be an array of column names", key))
            })
        })
        .collect()
}

fn classify_object(position: usize, object: &Map<String, JsonValue>) -> Result<Slot> {
    let has_filter = object.contains_key(INCLUDE) || object.contains_key(EXCLUDE);
    if !has_filter {
        return Ok(Slot::Condition(JoinCondition::Equals(
            Conditions::from_object(position, object)?,
        )));
    }

    if let Some(key) = object.keys().find(|k| *k != INCLUDE && *k != EXCLUDE) {
        return Err(Error::ambiguous(
            position,
            format!(
                "object mixes include/exclude with '{}'; \
                 it is neither a column selection nor a condition",
                key
            ),
        ));
    }

    let include = match object.get(INCLUDE) {
        Some(value) => string_list(position, INCLUDE, value)?,
        None => Vec::new(),
    };
    let exclude = match object.get(EXCLUDE) {
        Some(value) => string_list(position, EXCLUDE, value)?,
        None => Vec::new(),
    };
    Ok(Slot::Columns(ColumnSpec::Filter { include, exclude }))
}

fn classify(position: usize, arg: JoinArg) -> Result<Slot> {
    match arg {
        JoinArg::Alias(alias) => Ok(Slot::Alias(alias)),
        JoinArg::Columns(columns) => Ok(Slot::Columns(ColumnSpec::List(columns))),
        JoinArg::Object(object) => classify_object(position, &object),
        JoinArg::Nested(nested) => Ok(Slot::Condition(JoinCondition::Nested(nested))),
        JoinArg::Other(value) => Err(Error::ambiguous(
            position,
            format!("unrecognised join argument {}", value),
        )),
    }
}

/// Resolve the trailing arguments of a join call into a [`JoinSpec`].
///
/// Absent arguments (`None`, JSON `null`) are dropped first. What remains
/// must be one to three of: an alias, a column selection, a condition, in
/// that order. The alias defaults to `target`.
///
/// # Examples
///
/// ```
/// use kinship::join::{resolve, ColumnSpec, JoinArg, JoinKind};
/// use serde_json::json;
///
/// let spec = resolve(
///     JoinKind::Left,
///     "posts",
///     [JoinArg::from(json!({"exclude": ["body"]}))],
/// )
/// .unwrap();
///
/// assert_eq!(spec.alias, "posts");
/// assert_eq!(
///     spec.columns,
///     Some(ColumnSpec::Filter { include: vec![], exclude: vec!["body".into()] })
/// );
/// ```
pub fn resolve<I>(kind: JoinKind, target: &str, args: I) -> Result<JoinSpec>
where
    I: IntoIterator,
    I::Item: Into<JoinArg>,
{
    let args: Vec<JoinArg> = args
        .into_iter()
        .map(Into::<JoinArg>::into)
        .filter(|arg| !arg.is_absent())
        .collect();

    if args.is_empty() {
        return Err(Error::MissingTarget {
            target: target.to_string(),
        });
    }
    if args.len() > 3 {
        return Err(Error::ambiguous(
            3,
            format!("a join takes at most three arguments, got {}", args.len()),
        ));
    }

    let mut spec = JoinSpec {
        kind,
        target: target.to_string(),
        alias: target.to_string(),
        columns: None,
        condition: None,
    };

    let mut last_rank = None;
    for (position, arg) in args.into_iter().enumerate() {
        let slot = classify(position, arg)?;
        if let Some(last) = last_rank {
            if slot.rank() <= last {
                return Err(Error::ambiguous(
                    position,
                    format!("{} cannot follow the earlier arguments", slot.describe()),
                ));
            }
        }
        last_rank = Some(slot.rank());

        match slot {
            Slot::Alias(alias) => spec.alias = alias,
            Slot::Columns(columns) => spec.columns = Some(columns),
            Slot::Condition(condition) => spec.condition = Some(condition),
        }
    }

    Ok(spec)
}

/// Named-field form of a join's arguments
///
/// # Examples
///
/// ```
/// use kinship::join::{Conditions, JoinKind, JoinOptions};
///
/// let spec = JoinOptions::new()
///     .alias("drafts")
///     .exclude(["body"])
///     .conditions(Conditions::new().equal("state", "draft"))
///     .into_spec(JoinKind::Left, "posts")
///     .unwrap();
///
/// assert_eq!(spec.alias, "drafts");
/// assert!(spec.condition.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    alias: Option<String>,
    columns: Option<ColumnSpec>,
    conditions: Option<Conditions>,
    nested: Option<NestedJoin>,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Join under every alias declared for the target
    pub fn every_alias(self) -> Self {
        self.alias(EVERY_ALIAS)
    }

    /// Select exactly these columns
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(ColumnSpec::List(
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Select the declared columns plus these
    pub fn include<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into);
        self.columns = Some(match self.columns.take() {
            Some(ColumnSpec::Filter {
                mut include,
                exclude,
            }) => {
                include.extend(columns);
                ColumnSpec::Filter { include, exclude }
            }
            _ => ColumnSpec::Filter {
                include: columns.collect(),
                exclude: Vec::new(),
            },
        });
        self
    }

    /// Select the declared columns except these
    pub fn exclude<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into);
        self.columns = Some(match self.columns.take() {
            Some(ColumnSpec::Filter {
                include,
                mut exclude,
            }) => {
                exclude.extend(columns);
                ColumnSpec::Filter { include, exclude }
            }
            _ => ColumnSpec::Filter {
                include: Vec::new(),
                exclude: columns.collect(),
            },
        });
        self
    }

    pub fn conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Run `f` against the joined entity. A join carries either ON
    /// conditions or a nested callback, not both.
    pub fn nested<F>(mut self, f: F) -> Self
    where
        F: for<'c> Fn(QueryComposer<'c>) -> Result<QueryComposer<'c>> + Send + Sync + 'static,
    {
        self.nested = Some(NestedJoin::new(f));
        self
    }

    /// Build the join spec.
    ///
    /// Fails like a join call with no arguments when nothing was set, and
    /// like a conflicting third argument when both conditions and a nested
    /// callback were given.
    pub fn into_spec(self, kind: JoinKind, target: &str) -> Result<JoinSpec> {
        let condition = match (self.conditions, self.nested) {
            (Some(_), Some(_)) => {
                return Err(Error::ambiguous(
                    2,
                    "a join takes either ON conditions or a nested callback, not both",
                ));
            }
            (Some(conditions), None) => Some(JoinCondition::Equals(conditions)),
            (None, Some(nested)) => Some(JoinCondition::Nested(nested)),
            (None, None) => None,
        };
        if self.alias.is_none() && self.columns.is_none() && condition.is_none() {
            return Err(Error::MissingTarget {
                target: target.to_string(),
            });
        }
        Ok(JoinSpec {
            kind,
            target: target.to_string(),
            alias: self.alias.unwrap_or_else(|| target.to_string()),
            columns: self.columns,
            condition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve_args(args: Vec<JoinArg>) -> Result<JoinSpec> {
        resolve(JoinKind::Left, "posts", args)
    }

    fn noop() -> JoinArg {
        JoinArg::nested(|query| Ok(query))
    }

    #[test]
    fn test_no_arguments() {
        let err = resolve_args(vec![]).unwrap_err();
        assert!(matches!(err, Error::MissingTarget { ref target } if target == "posts"));
    }

    #[test]
    fn test_absent_arguments_are_dropped() {
        let spec = resolve(
            JoinKind::Inner,
            "posts",
            [None, Some(JoinArg::from("p")), None],
        )
        .unwrap();
        assert_eq!(spec.alias, "p");

        let err = resolve(JoinKind::Inner, "posts", [JoinArg::from(json!(null))]).unwrap_err();
        assert!(matches!(err, Error::MissingTarget { .. }));
    }

    #[test]
    fn test_one_argument_shapes() {
        let spec = resolve_args(vec!["p".into()]).unwrap();
        assert_eq!(spec.alias, "p");
        assert!(spec.columns.is_none() && spec.condition.is_none());

        let spec = resolve_args(vec![vec!["id", "title"].into()]).unwrap();
        assert_eq!(spec.alias, "posts");
        assert_eq!(
            spec.columns,
            Some(ColumnSpec::List(vec!["id".into(), "title".into()]))
        );

        let spec = resolve_args(vec![json!({"include": ["excerpt"]}).into()]).unwrap();
        assert_eq!(
            spec.columns,
            Some(ColumnSpec::Filter {
                include: vec!["excerpt".into()],
                exclude: vec![]
            })
        );

        let spec = resolve_args(vec![json!({"state": "draft"}).into()]).unwrap();
        assert!(spec.columns.is_none());
        match spec.condition {
            Some(JoinCondition::Equals(conditions)) => {
                assert_eq!(conditions.equals, vec![("state".into(), Value::from("draft"))]);
            }
            other => panic!("unexpected condition: {other:?}"),
        }

        let spec = resolve_args(vec![noop()]).unwrap();
        assert!(matches!(spec.condition, Some(JoinCondition::Nested(_))));
    }

    #[test]
    fn test_two_argument_shapes() {
        let spec = resolve_args(vec!["p".into(), vec!["title"].into()]).unwrap();
        assert_eq!(spec.alias, "p");
        assert!(matches!(spec.columns, Some(ColumnSpec::List(_))));

        let spec = resolve_args(vec!["p".into(), json!({"exclude": ["body"]}).into()]).unwrap();
        assert!(matches!(spec.columns, Some(ColumnSpec::Filter { .. })));

        let spec = resolve_args(vec!["p".into(), json!({"state": "draft"}).into()]).unwrap();
        assert!(spec.columns.is_none());
        assert!(matches!(spec.condition, Some(JoinCondition::Equals(_))));

        let spec = resolve_args(vec!["p".into(), noop()]).unwrap();
        assert!(matches!(spec.condition, Some(JoinCondition::Nested(_))));

        let spec = resolve_args(vec![vec!["title"].into(), noop()]).unwrap();
        assert_eq!(spec.alias, "posts");
        assert!(spec.columns.is_some() && spec.condition.is_some());

        let spec =
            resolve_args(vec![json!({"include": ["x"]}).into(), json!({"a": 1}).into()]).unwrap();
        assert!(spec.columns.is_some() && spec.condition.is_some());
    }

    #[test]
    fn test_three_arguments() {
        let spec = resolve_args(vec![
            "p".into(),
            json!({"exclude": ["body"]}).into(),
            json!({"state": "published"}).into(),
        ])
        .unwrap();
        assert_eq!(spec.alias, "p");
        assert!(spec.columns.is_some());
        assert!(spec.condition.is_some());
    }

    #[test]
    fn test_out_of_order_arguments() {
        let err = resolve_args(vec![vec!["title"].into(), "p".into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 1, .. }));

        let err = resolve_args(vec![noop(), vec!["title"].into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 1, .. }));

        let err = resolve_args(vec!["p".into(), "q".into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 1, .. }));

        let err = resolve_args(vec!["p".into(), noop(), vec!["title"].into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 2, .. }));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = resolve_args(vec![
            "p".into(),
            vec!["title"].into(),
            json!({"a": 1}).into(),
            noop(),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 3, .. }));
    }

    #[test]
    fn test_filter_object_with_extra_keys_is_ambiguous() {
        let err =
            resolve_args(vec![json!({"include": ["x"], "state": "draft"}).into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 0, .. }));
    }

    #[test]
    fn test_filter_lists_must_be_strings() {
        let err = resolve_args(vec!["p".into(), json!({"exclude": "body"}).into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 1, .. }));

        let err = resolve_args(vec![json!({"include": [1, 2]}).into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 0, .. }));
    }

    #[test]
    fn test_or_group_must_be_object() {
        let err = resolve_args(vec![json!({"$or": ["a", "b"]}).into()]).unwrap_err();
        assert!(err.to_string().contains("$or"));

        let spec = resolve_args(vec![
            json!({"user_id": 3, "$or": {"kind": "a", "state": "b"}}).into(),
        ])
        .unwrap();
        match spec.condition {
            Some(JoinCondition::Equals(conditions)) => {
                assert_eq!(conditions.equals.len(), 1);
                assert_eq!(
                    conditions.any_of,
                    vec![
                        ("kind".into(), Value::from("a")),
                        ("state".into(), Value::from("b"))
                    ]
                );
            }
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn test_unrecognised_value() {
        let err = resolve_args(vec![json!(42).into()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 0, .. }));
    }

    #[test]
    fn test_every_alias_target() {
        let spec = resolve_args(vec!["*".into()]).unwrap();
        assert_eq!(spec.target(), JoinTarget::EveryAlias);

        let spec = resolve_args(vec!["p".into()]).unwrap();
        assert_eq!(spec.target(), JoinTarget::Alias("p"));
        assert_eq!(spec.with_alias("q").target(), JoinTarget::Alias("q"));
    }

    #[test]
    fn test_options_match_positional_form() {
        let positional = resolve_args(vec![
            "p".into(),
            json!({"include": ["excerpt"], "exclude": ["body"]}).into(),
        ])
        .unwrap();
        let named = JoinOptions::new()
            .alias("p")
            .include(["excerpt"])
            .exclude(["body"])
            .into_spec(JoinKind::Left, "posts")
            .unwrap();

        assert_eq!(named.alias, positional.alias);
        assert_eq!(named.columns, positional.columns);
    }

    #[test]
    fn test_empty_options() {
        let err = JoinOptions::new()
            .into_spec(JoinKind::Inner, "posts")
            .unwrap_err();
        assert!(matches!(err, Error::MissingTarget { .. }));

        let spec = JoinOptions::new()
            .columns(["title"])
            .into_spec(JoinKind::Inner, "posts")
            .unwrap();
        assert_eq!(spec.alias, "posts");
    }

    #[test]
    fn test_options_conditions_and_nested_conflict() {
        let err = JoinOptions::new()
            .columns(["id"])
            .conditions(Conditions::new().equal("state", "published"))
            .nested(|query| Ok(query))
            .into_spec(JoinKind::Left, "posts")
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousJoinArguments { position: 2, .. }));

        let spec = JoinOptions::new()
            .conditions(Conditions::new().equal("state", "published"))
            .into_spec(JoinKind::Left, "posts")
            .unwrap();
        assert!(matches!(spec.condition, Some(JoinCondition::Equals(_))));

        let spec = JoinOptions::new()
            .nested(|query| Ok(query))
            .into_spec(JoinKind::Left, "posts")
            .unwrap();
        assert!(matches!(spec.condition, Some(JoinCondition::Nested(_))));
    }
}
