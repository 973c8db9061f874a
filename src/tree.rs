// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The hierarchical structure of typed cells: geometry, parent/child
//! relationships, and edge endpoints.  Top-level cells are view cells, one
//! per definition with visible internal structure.

use std::collections::BTreeMap;
use std::fmt;

use crate::common::Uri;
use crate::datamodel::{InteractionInfo, Rect, SEQUENCE_FEATURE_WIDTH};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Combined endpoint key for interaction endpoints: a definition URI
/// qualified by the instance cell it is attached to.
pub fn endpoint_key(uri: &Uri, cell: CellId) -> String {
    format!("{uri}_{cell}")
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ViewKind {
    Component,
    Module,
}

#[derive(Clone, PartialEq, Debug)]
pub enum CellKind {
    /// Root node of one definition's own diagram; its URI is the
    /// definition's identity.
    View { uri: Uri, kind: ViewKind },
    /// Holds a backbone plus an ordered sequence of feature glyphs.
    CircuitContainer { value: Uri },
    Backbone,
    SequenceFeature { value: Uri },
    MolecularSpecies { value: Uri },
    Module { value: Uri },
    Interaction {
        info: InteractionInfo,
        source: Option<CellId>,
        target: Option<CellId>,
    },
    TextBox { text: String },
}

impl CellKind {
    /// The definition URI this cell references, if it references one.
    pub fn value(&self) -> Option<&Uri> {
        match self {
            CellKind::CircuitContainer { value }
            | CellKind::SequenceFeature { value }
            | CellKind::MolecularSpecies { value }
            | CellKind::Module { value } => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Cell {
    pub id: CellId,
    pub kind: CellKind,
    pub geometry: Rect,
    pub style: String,
    pub parent: Option<CellId>,
    pub children: Vec<CellId>,
}

impl Cell {
    pub fn new(id: CellId, kind: CellKind, geometry: Rect, style: &str) -> Cell {
        Cell {
            id,
            kind,
            geometry,
            style: style.to_string(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn value(&self) -> Option<&Uri> {
        self.kind.value()
    }

    pub fn is_view(&self) -> bool {
        matches!(self.kind, CellKind::View { .. })
    }

    pub fn is_component_view(&self) -> bool {
        matches!(
            self.kind,
            CellKind::View {
                kind: ViewKind::Component,
                ..
            }
        )
    }

    pub fn is_module_view(&self) -> bool {
        matches!(
            self.kind,
            CellKind::View {
                kind: ViewKind::Module,
                ..
            }
        )
    }

    pub fn is_circuit_container(&self) -> bool {
        matches!(self.kind, CellKind::CircuitContainer { .. })
    }

    pub fn is_backbone(&self) -> bool {
        matches!(self.kind, CellKind::Backbone)
    }

    pub fn is_sequence_feature(&self) -> bool {
        matches!(self.kind, CellKind::SequenceFeature { .. })
    }

    pub fn is_molecular_species(&self) -> bool {
        matches!(self.kind, CellKind::MolecularSpecies { .. })
    }

    pub fn is_module(&self) -> bool {
        matches!(self.kind, CellKind::Module { .. })
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self.kind, CellKind::Interaction { .. })
    }

    pub fn is_text_box(&self) -> bool {
        matches!(self.kind, CellKind::TextBox { .. })
    }

    pub fn view_uri(&self) -> Option<&Uri> {
        match &self.kind {
            CellKind::View { uri, .. } => Some(uri),
            _ => None,
        }
    }

    pub fn interaction_info(&self) -> Option<&InteractionInfo> {
        match &self.kind {
            CellKind::Interaction { info, .. } => Some(info),
            _ => None,
        }
    }

    pub fn terminal(&self, source: bool) -> Option<CellId> {
        match &self.kind {
            CellKind::Interaction {
                source: src,
                target: tgt,
                ..
            } => {
                if source {
                    *src
                } else {
                    *tgt
                }
            }
            _ => None,
        }
    }
}

/// Every cell lives in exactly one tree, owned by its parent; top-level view
/// cells have no owner.  Iteration over `cells` is in `CellId` order, which
/// is creation order.
#[derive(Clone, Debug, Default)]
pub struct CellTree {
    cells: BTreeMap<CellId, Cell>,
    roots: Vec<CellId>,
    next_id: u32,
}

// next_id is bookkeeping, not structure: two trees that differ only in the
// ids they would hand out next are the same tree.
impl PartialEq for CellTree {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.roots == other.roots
    }
}

impl CellTree {
    pub fn new() -> CellTree {
        Default::default()
    }

    pub fn alloc_id(&mut self) -> CellId {
        let id = CellId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn bump_next_id(&mut self, floor: u32) {
        if self.next_id < floor {
            self.next_id = floor;
        }
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// The top-level view cells, in insertion order.
    pub fn roots(&self) -> &[CellId] {
        &self.roots
    }

    /// The view cell for a definition URI, if one exists.
    pub fn view_cell(&self, uri: &Uri) -> Option<CellId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.get(*id).and_then(|c| c.view_uri()) == Some(uri))
    }

    pub fn parent_of(&self, id: CellId) -> Option<CellId> {
        self.get(id).and_then(|c| c.parent)
    }

    pub fn children_of(&self, id: CellId) -> &[CellId] {
        self.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: CellId) -> Option<usize> {
        let siblings = match self.parent_of(id) {
            Some(parent) => self.children_of(parent),
            None => self.roots.as_slice(),
        };
        siblings.iter().position(|c| *c == id)
    }

    /// The id grouping cells for move processing: a feature groups under its
    /// strand, everything else under itself.
    pub fn container_root_id(&self, id: CellId) -> CellId {
        match self.get(id) {
            Some(cell) if cell.is_sequence_feature() => cell.parent.unwrap_or(id),
            _ => id,
        }
    }

    /// The backbone of a circuit container; `None` if the shape invariant is
    /// broken.
    pub fn backbone_of(&self, container: CellId) -> Option<CellId> {
        self.children_of(container)
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|c| c.is_backbone()))
    }

    pub fn feature_children(&self, container: CellId) -> Vec<CellId> {
        self.children_of(container)
            .iter()
            .copied()
            .filter(|id| self.get(*id).is_some_and(|c| c.is_sequence_feature()))
            .collect()
    }

    /// The non-negative sum of feature widths, with a one-glyph-width floor.
    pub fn backbone_width(&self, container: CellId) -> f64 {
        let mut width = 0.0;
        for id in self.feature_children(container) {
            if let Some(cell) = self.get(id) {
                width += cell.geometry.width;
            }
        }
        if width < SEQUENCE_FEATURE_WIDTH {
            width = SEQUENCE_FEATURE_WIDTH;
        }
        width
    }

    /// All sequence feature glyphs anywhere in the tree whose value is `uri`.
    pub fn coupled_features(&self, uri: &Uri) -> Vec<CellId> {
        self.iter()
            .filter(|c| c.is_sequence_feature() && c.value() == Some(uri))
            .map(|c| c.id)
            .collect()
    }

    /// Circuit containers directly under a view cell whose value is `uri`.
    /// With `only_module_views`, containers inside component views are
    /// skipped.
    pub fn coupled_containers(&self, uri: &Uri, only_module_views: bool) -> Vec<CellId> {
        let mut coupled = Vec::new();
        for root in &self.roots {
            let Some(view) = self.get(*root) else {
                continue;
            };
            if only_module_views && view.is_component_view() {
                continue;
            }
            for child in &view.children {
                if let Some(cell) = self.get(*child)
                    && cell.is_circuit_container()
                    && cell.value() == Some(uri)
                {
                    coupled.push(*child);
                }
            }
        }
        coupled
    }

    /// Molecular species glyphs in module views whose value is `uri`.
    pub fn coupled_species(&self, uri: &Uri) -> Vec<CellId> {
        self.module_view_children(|c| c.is_molecular_species() && c.value() == Some(uri))
    }

    /// Module glyphs in module views whose value is `uri`.
    pub fn coupled_modules(&self, uri: &Uri) -> Vec<CellId> {
        self.module_view_children(|c| c.is_module() && c.value() == Some(uri))
    }

    fn module_view_children<F>(&self, pred: F) -> Vec<CellId>
    where
        F: Fn(&Cell) -> bool,
    {
        let mut matched = Vec::new();
        for root in &self.roots {
            let Some(view) = self.get(*root) else {
                continue;
            };
            if view.is_component_view() {
                continue;
            }
            for child in &view.children {
                if let Some(cell) = self.get(*child)
                    && pred(cell)
                {
                    matched.push(*child);
                }
            }
        }
        matched
    }

    /// Interaction edges with a terminal resting on `cell`: `(edge, is_source)`.
    pub fn edges_attached(&self, cell: CellId) -> Vec<(CellId, bool)> {
        let mut attached = Vec::new();
        for c in self.iter() {
            if let CellKind::Interaction { source, target, .. } = &c.kind {
                if *source == Some(cell) {
                    attached.push((c.id, true));
                }
                if *target == Some(cell) {
                    attached.push((c.id, false));
                }
            }
        }
        attached
    }

    /// Preorder walk of the subtree rooted at `root`.
    pub fn descendants(&self, root: CellId) -> Vec<CellId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            let children = self.children_of(id);
            for child in children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Snapshot of a subtree, root first, suitable for re-insertion.
    pub fn subtree_snapshot(&self, root: CellId) -> Vec<Cell> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    pub(crate) fn insert_raw(&mut self, cell: Cell) {
        self.bump_next_id(cell.id.0 + 1);
        self.cells.insert(cell.id, cell);
    }

    pub(crate) fn remove_raw(&mut self, id: CellId) -> Option<Cell> {
        self.cells.remove(&id)
    }

    pub(crate) fn attach_child(&mut self, parent: Option<CellId>, child: CellId, index: usize) {
        match parent {
            Some(parent) => {
                if let Some(cell) = self.cells.get_mut(&parent) {
                    let index = index.min(cell.children.len());
                    cell.children.insert(index, child);
                }
            }
            None => {
                let index = index.min(self.roots.len());
                self.roots.insert(index, child);
            }
        }
        if let Some(cell) = self.cells.get_mut(&child) {
            cell.parent = parent;
        }
    }

    pub(crate) fn detach_child(&mut self, parent: Option<CellId>, child: CellId) -> Option<usize> {
        let siblings = match parent {
            Some(parent) => &mut self.cells.get_mut(&parent)?.children,
            None => &mut self.roots,
        };
        let index = siblings.iter().position(|c| *c == child)?;
        siblings.remove(index);
        Some(index)
    }

    /// Moves `child` to `index` among its siblings; returns the previous
    /// index.
    pub(crate) fn reorder_child(
        &mut self,
        parent: CellId,
        child: CellId,
        index: usize,
    ) -> Option<usize> {
        let children = &mut self.cells.get_mut(&parent)?.children;
        let prev = children.iter().position(|c| *c == child)?;
        children.remove(prev);
        let index = index.min(children.len());
        children.insert(index, child);
        Some(prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(tree: &mut CellTree, container: CellId, uri: &str, x: f64) -> CellId {
        let id = tree.alloc_id();
        let mut cell = Cell::new(
            id,
            CellKind::SequenceFeature {
                value: Uri::from(uri),
            },
            Rect::new(x, 0.0, SEQUENCE_FEATURE_WIDTH, 100.0),
            "sequenceFeatureGlyphpromoter",
        );
        cell.parent = Some(container);
        tree.insert_raw(cell);
        let index = tree.children_of(container).len();
        tree.attach_child(Some(container), id, index);
        id
    }

    fn container(tree: &mut CellTree, view: Option<CellId>, uri: &str) -> CellId {
        let id = tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::CircuitContainer {
                value: Uri::from(uri),
            },
            Rect::default(),
            "circuitContainer",
        );
        tree.insert_raw(cell);
        let index = match view {
            Some(v) => tree.children_of(v).len(),
            None => tree.roots().len(),
        };
        tree.attach_child(view, id, index);
        let backbone = tree.alloc_id();
        tree.insert_raw(Cell::new(
            backbone,
            CellKind::Backbone,
            Rect::default(),
            "backbone",
        ));
        tree.attach_child(Some(id), backbone, 0);
        id
    }

    fn module_view(tree: &mut CellTree, uri: &str) -> CellId {
        let id = tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::View {
                uri: Uri::from(uri),
                kind: ViewKind::Module,
            },
            Rect::default(),
            "moduleViewCell",
        );
        tree.insert_raw(cell);
        let index = tree.roots().len();
        tree.attach_child(None, id, index);
        id
    }

    #[test]
    fn backbone_width_has_one_glyph_floor() {
        let mut tree = CellTree::new();
        let view = module_view(&mut tree, "p/root");
        let strand = container(&mut tree, Some(view), "p/c1");
        assert_eq!(tree.backbone_width(strand), SEQUENCE_FEATURE_WIDTH);

        feature(&mut tree, strand, "p/f1", 0.0);
        feature(&mut tree, strand, "p/f2", 50.0);
        assert_eq!(tree.backbone_width(strand), 2.0 * SEQUENCE_FEATURE_WIDTH);
    }

    #[test]
    fn coupled_sets_group_by_value() {
        let mut tree = CellTree::new();
        let view = module_view(&mut tree, "p/root");
        let a = container(&mut tree, Some(view), "p/c1");
        let b = container(&mut tree, Some(view), "p/c1");
        let c = container(&mut tree, Some(view), "p/c2");
        feature(&mut tree, a, "p/f1", 0.0);
        feature(&mut tree, b, "p/f1", 0.0);
        feature(&mut tree, c, "p/f2", 0.0);

        let uri = Uri::from("p/c1");
        assert_eq!(tree.coupled_containers(&uri, true), vec![a, b]);
        let f1 = Uri::from("p/f1");
        assert_eq!(tree.coupled_features(&f1).len(), 2);
    }

    #[test]
    fn reorder_child_returns_previous_index() {
        let mut tree = CellTree::new();
        let view = module_view(&mut tree, "p/root");
        let strand = container(&mut tree, Some(view), "p/c1");
        let f1 = feature(&mut tree, strand, "p/f1", 0.0);
        let f2 = feature(&mut tree, strand, "p/f2", 50.0);

        // children: [backbone, f1, f2]
        assert_eq!(tree.reorder_child(strand, f2, 1), Some(2));
        let children = tree.children_of(strand);
        assert_eq!(children[1], f2);
        assert_eq!(children[2], f1);
    }

    #[test]
    fn tree_equality_ignores_id_watermark() {
        let mut a = CellTree::new();
        let mut b = CellTree::new();
        module_view(&mut a, "p/root");
        module_view(&mut b, "p/root");
        // burn an id in one tree only
        b.alloc_id();
        assert_eq!(a, b);
    }
}
