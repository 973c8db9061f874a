// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Invertible primitive mutations and the transaction log that groups them
//! into atomic, undoable units.
//!
//! Every mutation of the cell tree, the entity store, or the zoom stacks
//! flows through an [`Edit`], which records the prior value.  A
//! [`Transaction`] is undone by applying each edit's inverse in reverse
//! order, so an aborted operation can always be compensated with one full
//! inversion after its bracket closes.

use log::warn;

use crate::common::Uri;
use crate::datamodel::{Info, InteractionInfo, Rect};
use crate::store::EntityStore;
use crate::tree::{Cell, CellId, CellKind, CellTree};

/// The zoom state: `views` is the stack of entered view cells (the root view
/// at the bottom), `selections` the glyph/module cells zoomed through.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ViewStacks {
    pub views: Vec<CellId>,
    pub selections: Vec<CellId>,
}

/// How an operation that gathers user decisions ended: either its
/// transaction committed, or it was fully inverted (a declined or dismissed
/// prompt) and the tree and store are unchanged.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EditOutcome {
    Committed,
    RolledBack,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Edit {
    /// Store write; `info: None` removes the record.
    PutInfo {
        uri: Uri,
        info: Option<Info>,
        prev: Option<Info>,
    },
    SetValue {
        cell: CellId,
        value: Uri,
        prev: Uri,
    },
    SetViewUri {
        cell: CellId,
        uri: Uri,
        prev: Uri,
    },
    SetGeometry {
        cell: CellId,
        geometry: Rect,
        prev: Rect,
    },
    SetStyle {
        cell: CellId,
        style: String,
        prev: String,
    },
    SetText {
        cell: CellId,
        text: String,
        prev: String,
    },
    SetTerminal {
        edge: CellId,
        source: bool,
        terminal: Option<CellId>,
        prev: Option<CellId>,
    },
    SetInteractionInfo {
        edge: CellId,
        info: InteractionInfo,
        prev: InteractionInfo,
    },
    /// Insert a subtree snapshot (root first) under `parent` at `index`.
    AddCells {
        cells: Vec<Cell>,
        parent: Option<CellId>,
        index: usize,
    },
    RemoveCells {
        cells: Vec<Cell>,
        parent: Option<CellId>,
        index: usize,
    },
    ReorderChild {
        parent: CellId,
        child: CellId,
        index: usize,
        prev_index: usize,
    },
    SetStacks {
        views: Vec<CellId>,
        selections: Vec<CellId>,
        prev_views: Vec<CellId>,
        prev_selections: Vec<CellId>,
    },
}

impl Edit {
    pub(crate) fn apply(
        &self,
        tree: &mut CellTree,
        store: &mut EntityStore,
        stacks: &mut ViewStacks,
    ) {
        match self {
            Edit::PutInfo { uri, info, .. } => match info {
                Some(info) => {
                    store.put_raw(info.clone());
                }
                None => {
                    store.remove_raw(uri);
                }
            },
            Edit::SetValue { cell, value, .. } => {
                let Some(cell) = tree.get_mut(*cell) else {
                    warn!("SetValue on missing cell {cell}");
                    return;
                };
                match &mut cell.kind {
                    CellKind::CircuitContainer { value: v }
                    | CellKind::SequenceFeature { value: v }
                    | CellKind::MolecularSpecies { value: v }
                    | CellKind::Module { value: v } => *v = value.clone(),
                    _ => warn!("SetValue on a cell without a value"),
                }
            }
            Edit::SetViewUri { cell, uri, .. } => {
                let Some(cell) = tree.get_mut(*cell) else {
                    warn!("SetViewUri on missing cell {cell}");
                    return;
                };
                match &mut cell.kind {
                    CellKind::View { uri: u, .. } => *u = uri.clone(),
                    _ => warn!("SetViewUri on a non-view cell"),
                }
            }
            Edit::SetGeometry { cell, geometry, .. } => {
                if let Some(cell) = tree.get_mut(*cell) {
                    cell.geometry = geometry.clone();
                }
            }
            Edit::SetStyle { cell, style, .. } => {
                if let Some(cell) = tree.get_mut(*cell) {
                    cell.style = style.clone();
                }
            }
            Edit::SetText { cell, text, .. } => {
                if let Some(cell) = tree.get_mut(*cell) {
                    match &mut cell.kind {
                        CellKind::TextBox { text: t } => *t = text.clone(),
                        _ => warn!("SetText on a non-text cell"),
                    }
                }
            }
            Edit::SetTerminal {
                edge,
                source,
                terminal,
                ..
            } => {
                if let Some(cell) = tree.get_mut(*edge) {
                    match &mut cell.kind {
                        CellKind::Interaction {
                            source: src,
                            target: tgt,
                            ..
                        } => {
                            if *source {
                                *src = *terminal;
                            } else {
                                *tgt = *terminal;
                            }
                        }
                        _ => warn!("SetTerminal on a non-interaction cell"),
                    }
                }
            }
            Edit::SetInteractionInfo { edge, info, .. } => {
                if let Some(cell) = tree.get_mut(*edge) {
                    match &mut cell.kind {
                        CellKind::Interaction { info: i, .. } => *i = info.clone(),
                        _ => warn!("SetInteractionInfo on a non-interaction cell"),
                    }
                }
            }
            Edit::AddCells {
                cells,
                parent,
                index,
            } => {
                for cell in cells {
                    tree.insert_raw(cell.clone());
                }
                if let Some(root) = cells.first() {
                    tree.attach_child(*parent, root.id, *index);
                }
            }
            Edit::RemoveCells { cells, parent, .. } => {
                if let Some(root) = cells.first() {
                    tree.detach_child(*parent, root.id);
                }
                for cell in cells {
                    tree.remove_raw(cell.id);
                }
            }
            Edit::ReorderChild {
                parent,
                child,
                index,
                ..
            } => {
                tree.reorder_child(*parent, *child, *index);
            }
            Edit::SetStacks {
                views, selections, ..
            } => {
                stacks.views = views.clone();
                stacks.selections = selections.clone();
            }
        }
    }

    pub(crate) fn inverted(&self) -> Edit {
        match self {
            Edit::PutInfo { uri, info, prev } => Edit::PutInfo {
                uri: match prev {
                    Some(prev) => prev.full_uri(),
                    None => uri.clone(),
                },
                info: prev.clone(),
                prev: info.clone(),
            },
            Edit::SetValue { cell, value, prev } => Edit::SetValue {
                cell: *cell,
                value: prev.clone(),
                prev: value.clone(),
            },
            Edit::SetViewUri { cell, uri, prev } => Edit::SetViewUri {
                cell: *cell,
                uri: prev.clone(),
                prev: uri.clone(),
            },
            Edit::SetGeometry {
                cell,
                geometry,
                prev,
            } => Edit::SetGeometry {
                cell: *cell,
                geometry: prev.clone(),
                prev: geometry.clone(),
            },
            Edit::SetStyle { cell, style, prev } => Edit::SetStyle {
                cell: *cell,
                style: prev.clone(),
                prev: style.clone(),
            },
            Edit::SetText { cell, text, prev } => Edit::SetText {
                cell: *cell,
                text: prev.clone(),
                prev: text.clone(),
            },
            Edit::SetTerminal {
                edge,
                source,
                terminal,
                prev,
            } => Edit::SetTerminal {
                edge: *edge,
                source: *source,
                terminal: *prev,
                prev: *terminal,
            },
            Edit::SetInteractionInfo { edge, info, prev } => Edit::SetInteractionInfo {
                edge: *edge,
                info: prev.clone(),
                prev: info.clone(),
            },
            Edit::AddCells {
                cells,
                parent,
                index,
            } => Edit::RemoveCells {
                cells: cells.clone(),
                parent: *parent,
                index: *index,
            },
            Edit::RemoveCells {
                cells,
                parent,
                index,
            } => Edit::AddCells {
                cells: cells.clone(),
                parent: *parent,
                index: *index,
            },
            Edit::ReorderChild {
                parent,
                child,
                index,
                prev_index,
            } => Edit::ReorderChild {
                parent: *parent,
                child: *child,
                index: *prev_index,
                prev_index: *index,
            },
            Edit::SetStacks {
                views,
                selections,
                prev_views,
                prev_selections,
            } => Edit::SetStacks {
                views: prev_views.clone(),
                selections: prev_selections.clone(),
                prev_views: views.clone(),
                prev_selections: selections.clone(),
            },
        }
    }
}

/// One atomic, undoable unit of work.
#[derive(Clone, PartialEq, Debug)]
pub struct Transaction {
    pub edits: Vec<Edit>,
}

impl Transaction {
    pub(crate) fn undo(&self, tree: &mut CellTree, store: &mut EntityStore, stacks: &mut ViewStacks) {
        for edit in self.edits.iter().rev() {
            edit.inverted().apply(tree, store, stacks);
        }
    }

    pub(crate) fn redo(&self, tree: &mut CellTree, store: &mut EntityStore, stacks: &mut ViewStacks) {
        for edit in &self.edits {
            edit.apply(tree, store, stacks);
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct UndoLog {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
}

impl UndoLog {
    pub fn new() -> UndoLog {
        Default::default()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub(crate) fn push(&mut self, txn: Transaction) {
        self.undo_stack.push(txn);
        self.redo_stack.clear();
    }

    pub(crate) fn undo(
        &mut self,
        tree: &mut CellTree,
        store: &mut EntityStore,
        stacks: &mut ViewStacks,
    ) -> bool {
        match self.undo_stack.pop() {
            Some(txn) => {
                txn.undo(tree, store, stacks);
                self.redo_stack.push(txn);
                true
            }
            None => false,
        }
    }

    pub(crate) fn redo(
        &mut self,
        tree: &mut CellTree,
        store: &mut EntityStore,
        stacks: &mut ViewStacks,
    ) -> bool {
        match self.redo_stack.pop() {
            Some(txn) => {
                txn.redo(tree, store, stacks);
                self.undo_stack.push(txn);
                true
            }
            None => false,
        }
    }

    /// Drops anything redoable.  Called after the compensating undo of an
    /// aborted transaction so the abort cannot be redone back in.
    pub(crate) fn trim(&mut self) {
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::ComponentInfo;

    fn fixture() -> (CellTree, EntityStore, ViewStacks) {
        (CellTree::new(), EntityStore::new(), ViewStacks::default())
    }

    #[test]
    fn put_info_inverts_to_prior_value() {
        let (mut tree, mut store, mut stacks) = fixture();
        let info = Info::Component(ComponentInfo::new("p", "a"));
        let uri = info.full_uri();

        let put = Edit::PutInfo {
            uri: uri.clone(),
            info: Some(info.clone()),
            prev: None,
        };
        put.apply(&mut tree, &mut store, &mut stacks);
        assert!(store.get(&uri).is_some());

        put.inverted().apply(&mut tree, &mut store, &mut stacks);
        assert!(store.get(&uri).is_none());
    }

    #[test]
    fn add_cells_inverts_to_remove() {
        let (mut tree, mut store, mut stacks) = fixture();
        let id = tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::TextBox {
                text: "hi".to_string(),
            },
            Rect::default(),
            "textBox",
        );
        let add = Edit::AddCells {
            cells: vec![cell],
            parent: None,
            index: 0,
        };
        add.apply(&mut tree, &mut store, &mut stacks);
        assert!(tree.contains(id));
        assert_eq!(tree.roots(), &[id]);

        add.inverted().apply(&mut tree, &mut store, &mut stacks);
        assert!(!tree.contains(id));
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn transaction_undo_reverses_in_order()
    {
        let (mut tree, mut store, mut stacks) = fixture();
        let id = tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::TextBox {
                text: "a".to_string(),
            },
            Rect::default(),
            "textBox",
        );
        let txn = Transaction {
            edits: vec![
                Edit::AddCells {
                    cells: vec![cell],
                    parent: None,
                    index: 0,
                },
                Edit::SetText {
                    cell: id,
                    text: "b".to_string(),
                    prev: "a".to_string(),
                },
            ],
        };
        txn.redo(&mut tree, &mut store, &mut stacks);
        assert!(matches!(
            &tree.get(id).unwrap().kind,
            CellKind::TextBox { text } if text == "b"
        ));

        txn.undo(&mut tree, &mut store, &mut stacks);
        assert!(tree.is_empty());
    }

    #[test]
    fn undo_log_round_trips() {
        let (mut tree, mut store, mut stacks) = fixture();
        let mut log = UndoLog::new();
        let id = tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::TextBox {
                text: "x".to_string(),
            },
            Rect::default(),
            "textBox",
        );
        let txn = Transaction {
            edits: vec![Edit::AddCells {
                cells: vec![cell],
                parent: None,
                index: 0,
            }],
        };
        txn.redo(&mut tree, &mut store, &mut stacks);
        log.push(txn);

        assert!(log.undo(&mut tree, &mut store, &mut stacks));
        assert!(tree.is_empty());
        assert!(log.redo(&mut tree, &mut store, &mut stacks));
        assert!(tree.contains(id));
    }
}
