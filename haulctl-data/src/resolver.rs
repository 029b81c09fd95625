//! Foreign-key dropdown resolution.
//!
//! Best effort by design: a dropdown is an enhancement, and any failure
//! along the way (referenced table missing, query error) degrades the
//! field to free text instead of failing the form. The outcome is an
//! explicit three-state result so callers and tests can tell which path
//! was taken.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use haulctl_core::fk::{is_foreign_key, referenced_table};

use crate::engine::CrudEngine;

/// Options for one dropdown plus the mapping back to the primitive key.
#[derive(Debug, Clone, Default)]
pub struct FkChoices {
    /// Display strings in fetch order
    pub options: Vec<String>,
    reverse: HashMap<String, String>,
}

impl FkChoices {
    /// Map entered text back to the key to persist.
    ///
    /// Exact display-string matches win; otherwise a leading integer
    /// before the first `" - "` is taken as the key; otherwise the text
    /// passes through unchanged so an operator can type a bare ID when
    /// the dropdown failed to populate.
    pub fn reverse_key(&self, entered: &str) -> String {
        if let Some(key) = self.reverse.get(entered) {
            return key.clone();
        }
        if let Some(prefix) = entered.split(" - ").next() {
            if !prefix.is_empty() && prefix != entered && prefix.parse::<i64>().is_ok() {
                return prefix.to_owned();
            }
        }
        entered.to_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// How a foreign-key-shaped field ended up being presented.
#[derive(Debug, Clone)]
pub enum FkResolution {
    /// Key/display pairs formatted as `"{key} - {display}"`
    Resolved(FkChoices),
    /// The referenced table had no display field; options are bare keys
    BareKeys(FkChoices),
    /// Not a foreign key, or resolution failed; plain text entry
    FreeText,
}

impl FkResolution {
    pub fn choices(&self) -> Option<&FkChoices> {
        match self {
            FkResolution::Resolved(choices) | FkResolution::BareKeys(choices) => Some(choices),
            FkResolution::FreeText => None,
        }
    }
}

/// Resolves dropdown choices per form instance. Results are never cached
/// across forms; the referenced rows may have changed in between.
pub struct FkResolver {
    engine: Arc<CrudEngine>,
}

impl FkResolver {
    pub fn new(engine: Arc<CrudEngine>) -> Self {
        Self { engine }
    }

    /// Resolve choices for `column` on `table`.
    pub async fn resolve(&self, table: &str, column: &str) -> FkResolution {
        let identity = match self.engine.cache().schema(table).await {
            Ok(schema) => schema.identity_column().unwrap_or_default().to_owned(),
            Err(err) => {
                warn!(table, column, "owning table lookup failed: {err}");
                return FkResolution::FreeText;
            }
        };
        if !is_foreign_key(column, &identity) {
            return FkResolution::FreeText;
        }
        let referenced = referenced_table(column).expect("checked by is_foreign_key");

        // Referenced columns drive the display-field choice; a miss here
        // means the convention pointed at a table that does not exist.
        let ref_columns = self.engine.cache().columns(referenced).await;
        if ref_columns.is_empty() {
            warn!(table, column, referenced, "referenced table has no columns");
            return FkResolution::FreeText;
        }

        let display_field = ref_columns
            .iter()
            .find(|name| *name != "ID" && !name.ends_with("_ID"))
            .cloned();

        match self
            .engine
            .fk_pairs(referenced, column, display_field.as_deref())
            .await
        {
            Ok(pairs) if display_field.is_some() => {
                let mut options = Vec::with_capacity(pairs.len());
                let mut reverse = HashMap::with_capacity(pairs.len());
                for (key, display) in pairs {
                    let label = format!("{key} - {display}");
                    reverse.insert(label.clone(), key);
                    options.push(label);
                }
                FkResolution::Resolved(FkChoices { options, reverse })
            }
            Ok(pairs) => {
                let mut options = Vec::with_capacity(pairs.len());
                let mut reverse = HashMap::with_capacity(pairs.len());
                for (key, _) in pairs {
                    reverse.insert(key.clone(), key.clone());
                    options.push(key);
                }
                FkResolution::BareKeys(FkChoices { options, reverse })
            }
            Err(err) => {
                warn!(table, column, referenced, "dropdown resolution failed: {err}");
                FkResolution::FreeText
            }
        }
    }
}
