//! Qualified `App.Table` name parsing.
//!
//! Identifier limits count the terminator, so a component must be strictly
//! shorter than its limit. A name without a `.` yields an empty table part.

use crate::error::{NameComponent, NameTooLong};
use serde::{Deserialize, Serialize};

/// Application component of a qualified table name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Table component of a qualified table name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Platform identifier length limits, terminator included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameLimits {
    pub max_app_name_len: usize,
    pub max_table_name_len: usize,
}

impl Default for NameLimits {
    fn default() -> Self {
        Self {
            max_app_name_len: 20,
            max_table_name_len: 16,
        }
    }
}

/// Split `name` on its first `.` into application and table components.
pub fn parse_qualified_name(
    name: &str,
    limits: &NameLimits,
) -> Result<(AppName, TableName), NameTooLong> {
    let (app, table) = name.split_once('.').unwrap_or((name, ""));

    if app.chars().count() >= limits.max_app_name_len {
        return Err(NameTooLong {
            component: NameComponent::App,
            limit: limits.max_app_name_len,
        });
    }
    if table.chars().count() >= limits.max_table_name_len {
        return Err(NameTooLong {
            component: NameComponent::Table,
            limit: limits.max_table_name_len,
        });
    }

    Ok((AppName(app.to_string()), TableName(table.to_string())))
}
