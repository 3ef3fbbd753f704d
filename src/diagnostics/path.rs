//! Element paths: stable addresses into the model document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a document element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// The document root.
    Nta,
    Declaration,
    Template,
    Name,
    Parameter,
    Location,
    Branchpoint,
    Boundarypoint,
    SubtemplateReference,
    Transition,
    Label,
    /// System configuration.
    System,
    /// Any element the walk does not visit.
    Other,
}

impl ElementKind {
    /// XML tag name of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Nta => "nta",
            ElementKind::Declaration => "declaration",
            ElementKind::Template => "template",
            ElementKind::Name => "name",
            ElementKind::Parameter => "parameter",
            ElementKind::Location => "location",
            ElementKind::Branchpoint => "branchpoint",
            ElementKind::Boundarypoint => "boundarypoint",
            ElementKind::SubtemplateReference => "subtemplate_reference",
            ElementKind::Transition => "transition",
            ElementKind::Label => "label",
            ElementKind::System => "system",
            ElementKind::Other => "other",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "nta" => ElementKind::Nta,
            "declaration" => ElementKind::Declaration,
            "template" => ElementKind::Template,
            "name" => ElementKind::Name,
            "parameter" => ElementKind::Parameter,
            "location" => ElementKind::Location,
            "branchpoint" => ElementKind::Branchpoint,
            "boundarypoint" => ElementKind::Boundarypoint,
            "subtemplate_reference" => ElementKind::SubtemplateReference,
            "transition" => ElementKind::Transition,
            "label" => ElementKind::Label,
            "system" => ElementKind::System,
            _ => ElementKind::Other,
        }
    }
}

/// One step of an [`ElementPath`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub kind: ElementKind,
    /// Position among siblings of the same kind, for kinds that repeat.
    pub index: Option<usize>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.kind.tag(), index),
            None => f.write_str(self.kind.tag()),
        }
    }
}

/// An immutable address of an element, e.g. `nta/template[2]/transition[0]/label[1]`.
///
/// The string form is the key under which a phase keeps the rewriter for that
/// element's text, and the path reported in diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ElementPath {
    segments: Vec<PathSegment>,
}

impl ElementPath {
    /// The path of the document root.
    pub fn root() -> Self {
        Self::default().append(ElementKind::Nta, None)
    }

    /// A new path with one more segment; `self` is left untouched.
    pub fn append(&self, kind: ElementKind, index: Option<usize>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(PathSegment { kind, index });
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.segments.last().map(|segment| segment.kind)
    }

    /// Kind of the enclosing element.
    pub fn parent_kind(&self) -> Option<ElementKind> {
        let len = self.segments.len();
        (len >= 2).then(|| self.segments[len - 2].kind)
    }

    /// Whether the trailing kinds of this path are exactly `kinds`.
    pub fn ends_with(&self, kinds: &[ElementKind]) -> bool {
        kinds.len() <= self.segments.len()
            && self.segments[self.segments.len() - kinds.len()..]
                .iter()
                .zip(kinds)
                .all(|(segment, kind)| segment.kind == *kind)
    }

    /// Canonical string form.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
