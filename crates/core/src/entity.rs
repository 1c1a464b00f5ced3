// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity and Action: the description-tree capability set.
//!
//! A description is a tree of entities; visiting an entity may enqueue
//! events, register handlers, or spawn children. `Action` is the concrete
//! sub-capability used by anything with observable intent (`ProcessAction`
//! chief among them) — its `visit` delegates to `execute`.

use crate::context::LaunchContext;
use crate::error::CoreError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A node in a launch description.
///
/// Entities are value-like; an entity may be visited multiple times only if
/// its underlying `execute` (for `Action`s) is idempotent. `ProcessAction` is
/// NOT idempotent — visiting it twice spawns twice.
///
/// `context` is an `Arc` rather than a bare reference so an `Action` whose
/// work outlives the dispatch turn (a spawned child's I/O pumps and exit
/// wait) can clone it into `'static` background tasks.
#[async_trait]
pub trait Entity: Send + Sync + fmt::Debug {
    /// Visit this entity, returning any child entities it produced. Child
    /// entities are visited in order by the caller, within the same dispatch
    /// turn.
    async fn visit(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError>;
}

/// An entity that represents a user intention to do something.
///
/// `Action::visit` always delegates to `Action::execute`; implement
/// `execute`, not `visit`, when building a new action type.
#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    async fn execute(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError>;
}

#[async_trait]
impl<A> Entity for A
where
    A: Action,
{
    async fn visit(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        self.execute(context).await
    }
}

/// A plain group of entities visited in sequence, with no behavior of its
/// own — the minimal stand-in for a description-builder's composite
/// entities produced by handlers.
#[derive(Debug, Default)]
pub struct LaunchDescription {
    pub entities: Vec<Arc<dyn Entity>>,
}

impl LaunchDescription {
    pub fn new(entities: Vec<Arc<dyn Entity>>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl Entity for LaunchDescription {
    async fn visit(&self, context: &Arc<LaunchContext>) -> Result<Vec<Arc<dyn Entity>>, CoreError> {
        for entity in &self.entities {
            visit_recursive(entity.as_ref(), context).await?;
        }
        Ok(Vec::new())
    }
}

/// Visit an entity and, in order, every entity it returns, recursively —
/// visiting an entity may itself produce more entities to visit.
///
/// Hand-rolled as a boxed future (rather than `#[async_recursion]`) since the
/// recursion is the only spot in the crate that needs it.
pub fn visit_recursive<'a>(
    entity: &'a (dyn Entity),
    context: &'a Arc<LaunchContext>,
) -> Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + 'a>> {
    Box::pin(async move {
        let children = entity.visit(context).await?;
        for child in &children {
            visit_recursive(child.as_ref(), context).await?;
        }
        Ok(())
    })
}
