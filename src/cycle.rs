// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Read-only cycle detection over the reference graph.
//!
//! Definitions must not form circular reference chains through their
//! instances.  Both directions are breadth-first over an explicit FIFO of
//! URIs; each URI is visited at most once, so traversal always terminates.

use std::collections::{HashSet, VecDeque};

use crate::common::Uri;
use crate::edits::ViewStacks;
use crate::tree::{CellId, CellTree};

/// Would retargeting `cell` to `new_uri` close a loop through the
/// definitions that (transitively) contain `cell`?
pub fn would_create_cycle_up(
    tree: &CellTree,
    stacks: &ViewStacks,
    cell: CellId,
    new_uri: &Uri,
) -> bool {
    let mut to_check: VecDeque<Uri> = VecDeque::new();
    let mut checked: HashSet<Uri> = HashSet::new();

    // seed with the definition that contains the cell being retargeted
    let Some(c) = tree.get(cell) else {
        return false;
    };
    if (c.is_circuit_container() || c.is_view()) && !stacks.selections.is_empty() {
        // editing a zoomed definition: the containing definition is above
        // the instance we entered through
        let instance = *stacks.selections.last().expect("non-empty selections");
        if let Some(ic) = tree.get(instance) {
            if ic.is_module() {
                if let Some(uri) = ic
                    .parent
                    .and_then(|p| tree.get(p))
                    .and_then(|p| p.view_uri())
                {
                    to_check.push_back(uri.clone());
                }
            } else if ic.is_sequence_feature()
                && let Some(uri) = ic
                    .parent
                    .and_then(|p| tree.parent_of(p))
                    .and_then(|gp| tree.get(gp))
                    .and_then(|gp| gp.view_uri())
            {
                to_check.push_back(uri.clone());
            }
        }
    } else if c.is_module() {
        if let Some(uri) = c
            .parent
            .and_then(|p| tree.get(p))
            .and_then(|p| p.view_uri())
        {
            to_check.push_back(uri.clone());
        }
    } else if let Some(uri) = c.parent.and_then(|p| tree.get(p)).and_then(|p| p.value()) {
        to_check.push_back(uri.clone());
    }

    while let Some(checking) = to_check.pop_front() {
        if !checked.insert(checking.clone()) {
            continue;
        }
        if checking == *new_uri {
            return true;
        }

        // step from every instance referencing this definition to the
        // definition containing that instance
        for referencing in tree.iter() {
            if referencing.value() != Some(&checking) {
                continue;
            }
            let containing = if referencing.is_sequence_feature() {
                referencing
                    .parent
                    .and_then(|p| tree.get(p))
                    .and_then(|p| p.value())
                    .cloned()
            } else if referencing.is_module() {
                referencing
                    .parent
                    .and_then(|p| tree.get(p))
                    .and_then(|p| p.view_uri())
                    .cloned()
            } else {
                None
            };
            if let Some(uri) = containing
                && !checked.contains(&uri)
            {
                to_check.push_back(uri);
            }
        }
    }

    false
}

/// Would keeping `cell`'s current substructure under `new_uri` close a loop
/// through the definitions below it?
pub fn would_create_cycle_down(tree: &CellTree, cell: CellId, new_uri: &Uri) -> bool {
    let mut to_check: VecDeque<Uri> = VecDeque::new();
    let mut checked: HashSet<Uri> = HashSet::new();

    let Some(c) = tree.get(cell) else {
        return false;
    };
    if c.is_circuit_container() {
        for glyph in tree.feature_children(cell) {
            if let Some(uri) = tree.get(glyph).and_then(|g| g.value()) {
                to_check.push_back(uri.clone());
            }
        }
    } else {
        let view = if c.is_view() {
            Some(cell)
        } else {
            c.value().and_then(|uri| tree.view_cell(uri))
        };
        if let Some(view) = view {
            push_view_children(tree, view, &mut to_check, &checked);
        }
    }

    while let Some(checking) = to_check.pop_front() {
        if !checked.insert(checking.clone()) {
            continue;
        }
        if checking == *new_uri {
            return true;
        }
        if let Some(view) = tree.view_cell(&checking) {
            push_view_children(tree, view, &mut to_check, &checked);
        }
    }

    false
}

fn push_view_children(
    tree: &CellTree,
    view: CellId,
    to_check: &mut VecDeque<Uri>,
    checked: &HashSet<Uri>,
) {
    for child in tree.children_of(view) {
        let Some(c) = tree.get(*child) else {
            continue;
        };
        if c.is_module() {
            if let Some(uri) = c.value()
                && !checked.contains(uri)
            {
                to_check.push_back(uri.clone());
            }
        } else if c.is_circuit_container() {
            for glyph in tree.feature_children(*child) {
                if let Some(uri) = tree.get(glyph).and_then(|g| g.value())
                    && !checked.contains(uri)
                {
                    to_check.push_back(uri.clone());
                }
            }
        }
    }
}
