// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Structural synchronization of coupled circuit containers.
//!
//! Visual instances of a definition are independent trees; after an edit to
//! one, every other container sharing its value is replaced wholesale with a
//! structural clone.  Clone children correspond to the replaced container's
//! children by position, which the reflow sort invariant keeps meaningful.

use log::warn;

use crate::canvas::Canvas;
use crate::tree::{CellId, endpoint_key};

impl Canvas {
    /// Replaces every other member of `container`'s coupled set with a clone
    /// of `container`, keeping each replaced container's geometry and
    /// re-pointing interaction terminals to the positional twin inside the
    /// clone.
    pub fn sync_container(&mut self, container: CellId) {
        let Some(cell) = self.tree.get(container) else {
            warn!("sync_container: missing cell {container}");
            return;
        };
        if !cell.is_circuit_container() {
            warn!("sync_container: called on an invalid cell");
            return;
        }
        let Some(value) = cell.value().cloned() else {
            return;
        };

        let to_replace: Vec<CellId> = self
            .tree
            .coupled_containers(&value, false)
            .into_iter()
            .filter(|id| *id != container)
            .collect();

        self.begin_update();
        for old in to_replace {
            let Some(old_cell) = self.tree.get(old) else {
                continue;
            };
            let old_parent = old_cell.parent;
            let old_geometry = old_cell.geometry.clone();
            let Some(old_index) = self.tree.index_in_parent(old) else {
                continue;
            };

            // which terminals rest on which positional child of the old
            // container
            let mut moved_terminals: Vec<(CellId, bool, usize)> = Vec::new();
            for (position, child) in self.tree.children_of(old).to_vec().into_iter().enumerate() {
                for (edge, is_source) in self.tree.edges_attached(child) {
                    moved_terminals.push((edge, is_source, position));
                }
            }

            let clone = self.clone_subtree(container);
            let clone_root = clone[0].id;
            self.remove_subtree(old);
            self.add_subtree(clone, old_parent, Some(old_index));
            self.set_geometry(clone_root, old_geometry);

            let clone_children = self.tree.children_of(clone_root).to_vec();
            for (edge, is_source, position) in moved_terminals {
                let terminal = clone_children.get(position).copied();
                if terminal.is_none() {
                    warn!("sync_container: no positional twin for terminal at {position}");
                }
                self.set_terminal(edge, is_source, terminal);
                // the endpoint key embeds the instance cell, so it follows
                // the positional twin
                if let Some(t) = terminal
                    && let Some(key) = self
                        .tree
                        .get(t)
                        .and_then(|c| c.value())
                        .map(|v| endpoint_key(v, t))
                    && let Some(info) =
                        self.tree.get(edge).and_then(|c| c.interaction_info()).cloned()
                {
                    let mut updated = info;
                    if is_source {
                        updated.from_uri = Some(key);
                    } else {
                        updated.to_uri = Some(key);
                    }
                    self.set_edge_info(edge, updated);
                }
            }

            self.refresh_container(clone_root);
        }
        self.end_update();
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils::TestCanvas;

    #[test]
    fn sync_replicates_structure_to_coupled_containers() {
        let mut t = TestCanvas::new();
        let a = t.strand(&["promoter", "cds"]);
        let b = t.alias(a);
        let value = t.value_of(a);

        // a third glyph dropped on a; sync propagates it to the alias
        t.canvas.drop_feature(a, "terminator").unwrap().unwrap();

        let others = t.coupled_others(&value, a);
        assert_eq!(others.len(), 1);
        let b_now = others[0];
        assert_ne!(b, b_now, "the coupled container is replaced by a clone");
        assert_eq!(t.feature_values(a).len(), 3);
        assert_eq!(t.feature_values(a), t.feature_values(b_now));
    }

    #[test]
    fn sync_repoints_terminals_positionally() {
        let mut t = TestCanvas::new();
        let a = t.strand(&["promoter", "cds"]);
        let b = t.alias(a);
        let value = t.value_of(a);

        let b_features = t.canvas.tree().feature_children(b);
        let species = t.canvas.add_species(300.0, 300.0, "Protein").unwrap();
        let edge = t
            .canvas
            .add_interaction(
                crate::datamodel::InteractionKind::Stimulation,
                Some(b_features[1]),
                Some(species),
            )
            .unwrap()
            .unwrap();

        // editing a triggers a sync that replaces b wholesale
        t.canvas.drop_feature(a, "terminator").unwrap().unwrap();

        let b_now = t.coupled_others(&value, a)[0];
        assert_ne!(b, b_now);
        let edge_cell = t.canvas.tree().get(edge).unwrap();
        let source = edge_cell.terminal(true).unwrap();
        // position 2 was the second feature (backbone is position 0)
        assert_eq!(t.canvas.tree().children_of(b_now)[2], source);
    }
}
