//! Batch mutation executor
//!
//! Applies parameterized mutations one after another on the caller's
//! connection or transaction. The executor never opens or commits a
//! transaction itself; atomicity belongs to the caller's cycle.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::borrow::Cow;

use crate::errors::{persistence, Result};

/// One statement with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub sql: Cow<'static, str>,
    pub params: Vec<SqlValue>,
}

impl Mutation {
    pub fn new(sql: impl Into<Cow<'static, str>>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Execute `mutations` in order and return the number of affected rows.
///
/// Stops at the first failure; whatever ran before it is undone when the
/// enclosing transaction rolls back.
///
/// # Errors
///
/// `Persistence` if a statement fails to prepare or execute.
pub fn apply_all(conn: &Connection, mutations: &[Mutation]) -> Result<usize> {
    let mut affected = 0;
    for mutation in mutations {
        let mut stmt = conn
            .prepare_cached(&mutation.sql)
            .map_err(persistence("apply_all"))?;
        affected += stmt
            .execute(params_from_iter(mutation.params.iter()))
            .map_err(persistence("apply_all"))?;
    }
    Ok(affected)
}
