//! Fixed pre-order walk over the elements phases can visit.

use crate::diagnostics::{ElementKind, ElementPath};

use super::Element;

/// One visited element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: ElementPath,
    pub kind: ElementKind,
    /// Child positions from the root down to the element.
    pub locator: Vec<usize>,
}

/// Walk `root` in visiting order: the root, global declaration, each template
/// with its parts, then the system configuration. Elements of other kinds are
/// not visited.
pub fn walk(root: &Element) -> Vec<WalkEntry> {
    let mut walker = Walker::default();
    let root_path = ElementPath::root();
    walker.visit(&root_path, Vec::new());

    walker.single(root, &root_path, &[], ElementKind::Declaration);
    for (index, (position, template)) in root.children_of(ElementKind::Template).enumerate() {
        let path = root_path.append(ElementKind::Template, Some(index));
        let locator = vec![position];
        walker.visit(&path, locator.clone());
        walker.template(template, &path, &locator);
    }
    walker.single(root, &root_path, &[], ElementKind::System);
    walker.entries
}

#[derive(Default)]
struct Walker {
    entries: Vec<WalkEntry>,
}

impl Walker {
    fn visit(&mut self, path: &ElementPath, locator: Vec<usize>) {
        if let Some(kind) = path.kind() {
            self.entries.push(WalkEntry {
                path: path.clone(),
                kind,
                locator,
            });
        }
    }

    fn template(&mut self, template: &Element, path: &ElementPath, locator: &[usize]) {
        for kind in [ElementKind::Name, ElementKind::Parameter, ElementKind::Declaration] {
            self.single(template, path, locator, kind);
        }
        self.indexed(template, path, locator, ElementKind::Location, true);
        self.indexed(template, path, locator, ElementKind::Branchpoint, false);
        self.indexed(template, path, locator, ElementKind::Boundarypoint, false);
        self.indexed(template, path, locator, ElementKind::SubtemplateReference, false);
        self.indexed(template, path, locator, ElementKind::Transition, true);
    }

    /// First child of `kind`, unindexed.
    fn single(&mut self, parent: &Element, path: &ElementPath, locator: &[usize], kind: ElementKind) {
        if let Some((position, _)) = parent.children_of(kind).next() {
            self.visit(&path.append(kind, None), child_locator(locator, position));
        }
    }

    /// Every child of `kind`, indexed among its own kind, optionally
    /// followed by its name and labels.
    fn indexed(&mut self, parent: &Element, path: &ElementPath, locator: &[usize], kind: ElementKind, nested: bool) {
        for (index, (position, child)) in parent.children_of(kind).enumerate() {
            let child_path = path.append(kind, Some(index));
            let own_locator = child_locator(locator, position);
            self.visit(&child_path, own_locator.clone());
            if nested {
                self.single(child, &child_path, &own_locator, ElementKind::Name);
                for (label_index, (label_position, _)) in child.children_of(ElementKind::Label).enumerate() {
                    self.visit(
                        &child_path.append(ElementKind::Label, Some(label_index)),
                        child_locator(&own_locator, label_position),
                    );
                }
            }
        }
    }
}

fn child_locator(locator: &[usize], position: usize) -> Vec<usize> {
    let mut child = Vec::with_capacity(locator.len() + 1);
    child.extend_from_slice(locator);
    child.push(position);
    child
}
