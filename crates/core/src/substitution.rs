// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The substitution contract: a lazy, context-dependent string producer.
//!
//! The substitution *language* (the tree of resolver objects a description
//! builder assembles) is out of scope for this core, which only consumes
//! the `resolve(context) -> string` contract. This module
//! defines that contract plus a couple of trivial, concrete substitutions
//! (`Literal`, `EnvVar`) that are useful for tests and for composing
//! `cmd`/`cwd`/`env` templates without pulling in a full substitution
//! language implementation.

use crate::context::LaunchContext;
use crate::error::SubstitutionError;
use std::fmt;
use std::sync::Arc;

/// A lazy string producer resolved against a [`LaunchContext`] at expansion
/// time. Concrete variants are tagged values, not an inheritance hierarchy.
pub trait Substitution: Send + Sync + fmt::Debug {
    /// Resolve this substitution to its final string value.
    fn resolve(&self, context: &LaunchContext) -> Result<String, SubstitutionError>;
}

/// A substitution that always resolves to a fixed string.
#[derive(Debug, Clone)]
pub struct Literal(pub String);

impl Literal {
    pub fn new(s: impl Into<String>) -> Arc<dyn Substitution> {
        Arc::new(Literal(s.into()))
    }
}

impl Substitution for Literal {
    fn resolve(&self, _context: &LaunchContext) -> Result<String, SubstitutionError> {
        Ok(self.0.clone())
    }
}

/// A substitution that resolves to the value of an environment variable,
/// falling back to `default` (or failing) when unset.
#[derive(Debug, Clone)]
pub struct EnvVar {
    pub name: String,
    pub default: Option<String>,
}

impl EnvVar {
    pub fn new(name: impl Into<String>) -> Arc<dyn Substitution> {
        Arc::new(EnvVar { name: name.into(), default: None })
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Arc<dyn Substitution> {
        Arc::new(EnvVar { name: name.into(), default: Some(default.into()) })
    }
}

impl Substitution for EnvVar {
    fn resolve(&self, _context: &LaunchContext) -> Result<String, SubstitutionError> {
        match (std::env::var(&self.name), &self.default) {
            (Ok(v), _) => Ok(v),
            (Err(_), Some(default)) => Ok(default.clone()),
            (Err(source), None) => Err(SubstitutionError::ResolutionFailed {
                reason: format!("environment variable '{}' unset: {source}", self.name),
            }),
        }
    }
}

/// Concatenate the resolutions of a sequence of substitutions into one
/// string: the result of performing each substitution in order, joined
/// with no separator.
pub fn resolve_concat(
    context: &LaunchContext,
    parts: &[Arc<dyn Substitution>],
) -> Result<String, SubstitutionError> {
    let mut out = String::new();
    for part in parts {
        out.push_str(&context.perform_substitution(part.as_ref())?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "substitution_tests.rs"]
mod tests;
