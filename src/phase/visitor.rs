//! Dispatch tables from element kinds to phase callbacks.

use std::fmt;

use crate::diagnostics::{ElementKind, ElementPath};

use super::context::{Visit, VisitResult};

/// A phase callback for one element.
pub type VisitFn<P> = fn(&mut P, &mut Visit<'_>) -> VisitResult;

/// Further restricts which elements of a kind a callback sees.
#[derive(Clone, Copy, Debug)]
pub enum PathFilter {
    Any,
    /// The element's parent is of this kind, e.g. a declaration directly
    /// inside a template.
    ParentIs(ElementKind),
    /// The trailing kinds of the path are exactly these.
    Suffix(&'static [ElementKind]),
    Custom(fn(&ElementPath) -> bool),
}

impl PathFilter {
    pub fn matches(&self, path: &ElementPath) -> bool {
        match self {
            PathFilter::Any => true,
            PathFilter::ParentIs(kind) => path.parent_kind() == Some(*kind),
            PathFilter::Suffix(kinds) => path.ends_with(kinds),
            PathFilter::Custom(predicate) => predicate(path),
        }
    }
}

struct Entry<P> {
    kind: ElementKind,
    filter: PathFilter,
    callback: VisitFn<P>,
}

/// The callbacks a phase registers, in registration order.
pub struct VisitorTable<P> {
    entries: Vec<Entry<P>>,
}

impl<P> VisitorTable<P> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Call `callback` for every element of `kind`.
    pub fn on(self, kind: ElementKind, callback: VisitFn<P>) -> Self {
        self.on_filtered(kind, PathFilter::Any, callback)
    }

    /// Call `callback` for elements of `kind` whose path passes `filter`.
    pub fn on_filtered(mut self, kind: ElementKind, filter: PathFilter, callback: VisitFn<P>) -> Self {
        self.entries.push(Entry { kind, filter, callback });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callbacks registered for an element of `kind` at `path`.
    pub fn callbacks<'a>(&'a self, kind: ElementKind, path: &'a ElementPath) -> impl Iterator<Item = VisitFn<P>> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.kind == kind && entry.filter.matches(path))
            .map(|entry| entry.callback)
    }
}

impl<P> Default for VisitorTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for VisitorTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| (entry.kind, entry.filter)))
            .finish()
    }
}
