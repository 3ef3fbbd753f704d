//! Structured model document.
//!
//! The document schema belongs to the modeling tool; this module only knows
//! it as a generic element tree with the handful of element kinds the mapper
//! walks. Phases read and rewrite the text of those elements.
//!
//! Only the declaration, the doctype and the element tree survive a round
//! trip. Comments and processing instructions are dropped when a document is
//! parsed, so the translated model never contains them.
//!
//! ```text
//! nta
//! ├── declaration
//! ├── template*
//! │   ├── name, parameter, declaration
//! │   ├── location* (name, label*)
//! │   ├── branchpoint*, boundarypoint*, subtemplate_reference*
//! │   └── transition* (label*)
//! └── system
//! ```

mod error;
mod walk;
mod xml;

pub use error::DocumentError;
pub use walk::{WalkEntry, walk};

use indexmap::IndexMap;

use crate::diagnostics::ElementKind;

/// One XML element: tag, attributes in document order, text, children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    /// Character data directly inside the element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::from_tag(&self.tag)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Children of one kind, with their positions among all children.
    pub fn children_of(&self, kind: ElementKind) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter(move |(_, child)| child.kind() == kind)
    }

    /// First child of one kind.
    pub fn child(&self, kind: ElementKind) -> Option<&Element> {
        self.children_of(kind).next().map(|(_, child)| child)
    }

    /// Descendant reached by following child positions.
    pub fn at(&self, locator: &[usize]) -> Option<&Element> {
        locator
            .iter()
            .try_fold(self, |element, &index| element.children.get(index))
    }

    pub fn at_mut(&mut self, locator: &[usize]) -> Option<&mut Element> {
        locator
            .iter()
            .try_fold(self, |element, &index| element.children.get_mut(index))
    }
}

/// `<?xml ...?>` declaration fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// What precedes the root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prolog {
    pub declaration: Option<XmlDeclaration>,
    /// DOCTYPE body, without the `<!DOCTYPE` and `>` delimiters.
    pub doctype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub prolog: Prolog,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Prolog::default(),
            root,
        }
    }

    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let document = xml::read(input)?;
        if document.root.kind() != ElementKind::Nta {
            return Err(DocumentError::invalid(format!(
                "Expected <nta> root element, found <{}>",
                document.root.tag
            )));
        }
        Ok(document)
    }

    pub fn to_xml(&self) -> Result<String, DocumentError> {
        xml::write(self)
    }

    /// Elements the mapper visits, in visiting order.
    pub fn walk(&self) -> Vec<WalkEntry> {
        walk(&self.root)
    }
}
