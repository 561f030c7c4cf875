//! Column alias planning: which columns a table contributes to the SELECT
//! list, and the output name each one is returned under.

use kinship_core::{ColumnSelector, Expr};

use crate::entity::EntityDescriptor;
use crate::join::ColumnSpec;
use crate::{Error, Result};

/// Where the planned table sits in the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The FROM table; outputs use their local names
    Root,
    /// A joined table; outputs are prefixed with the table alias
    Nested,
}

/// One SELECT list entry: `source AS "output"`
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedColumn {
    pub source: Expr,
    pub output: String,
}

impl PlannedColumn {
    pub fn into_selector(self) -> ColumnSelector {
        ColumnSelector::aliased(self.source, &self.output)
    }
}

fn requested_columns(columns: Option<&ColumnSpec>, entity: &EntityDescriptor) -> Vec<String> {
    let declared = || entity.column_names().map(str::to_string);
    match columns {
        None => declared().collect(),
        Some(ColumnSpec::List(list)) => list.clone(),
        Some(ColumnSpec::Filter { include, exclude }) => {
            let mut names: Vec<String> = declared().collect();
            for name in include {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            names.retain(|name| !exclude.contains(name));
            names
        }
    }
}

/// Plan the columns `entity` contributes when selected under `table_alias`.
///
/// Without a column spec every declared column is used, in declaration
/// order. Names that match a virtual attribute are expanded through it;
/// anything else becomes `"table_alias"."column"`.
pub fn plan(
    columns: Option<&ColumnSpec>,
    entity: &EntityDescriptor,
    table_alias: &str,
    scope: Scope,
) -> Result<Vec<PlannedColumn>> {
    let mut planned = Vec::new();

    for name in requested_columns(columns, entity) {
        let (source, local) = match entity.virtual_attribute(&name) {
            Some(attribute) => {
                let (source, output) = attribute(table_alias);
                if source.trim().is_empty() || output.trim().is_empty() {
                    return Err(Error::InvalidVirtualAttribute {
                        entity: entity.name().to_string(),
                        attribute: name,
                    });
                }
                (Expr::raw(source), output)
            }
            None => {
                let local = entity
                    .column(&name)
                    .map(|c| c.output_name().to_string())
                    .unwrap_or_else(|| name.clone());
                (Expr::column(table_alias, &name), local)
            }
        };

        let output = match scope {
            Scope::Root => local,
            Scope::Nested => format!("{}.{}", table_alias, local),
        };
        planned.push(PlannedColumn { source, output });
    }

    tracing::trace!(
        entity = entity.name(),
        alias = table_alias,
        columns = planned.len(),
        "kinship.plan"
    );
    Ok(planned)
}
