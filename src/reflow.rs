// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reflow of strand glyphs after a batch move.
//!
//! The pipeline keeps a strand's glyph sequence contiguous and ordered: the
//! moved set is sorted, gated on ownership, checked for promotion onto empty
//! canvas, merged into contiguous streaks, re-sorted horizontally, and then
//! synchronized.  Any abort leaves the tree exactly as before the move.

use std::collections::BTreeSet;

use float_cmp::approx_eq;

use crate::canvas::Canvas;
use crate::common::{Result, Uri};
use crate::datamodel::{MOVE_OVERLAP_PADDING, Rect};
use crate::edits::EditOutcome;
use crate::tree::CellId;

impl Canvas {
    /// Moves `cells` by `(dx, dy)` and reflows every affected strand, inside
    /// one transaction.  Returns `RolledBack` when an ownership prompt is
    /// declined.
    pub fn move_cells(&mut self, cells: &[CellId], dx: f64, dy: f64) -> Result<EditOutcome> {
        // sort the moved set: group by strand, then by sibling order
        let mut moved: Vec<CellId> = cells
            .iter()
            .copied()
            .filter(|id| {
                self.tree
                    .get(*id)
                    .is_some_and(|c| !c.is_backbone() && !c.is_view())
            })
            .collect();
        if moved.is_empty() {
            return Ok(EditOutcome::Committed);
        }
        moved.sort_by(|a, b| {
            let root_a = self.tree.container_root_id(*a);
            let root_b = self.tree.container_root_id(*b);
            if root_a != root_b {
                root_a.cmp(&root_b)
            } else {
                self.tree
                    .index_in_parent(*a)
                    .cmp(&self.tree.index_in_parent(*b))
            }
        });

        // ownership gate: moving a feature restructures its strand's
        // definition, which we must own
        let gate_uris = self.ownership_gate_uris(&moved);
        for uri in &gate_uris {
            if let Some(info) = self.store.get(uri).cloned()
                && info.uri_prefix() != self.local_prefix()
                && !self.prompts.confirm_ownership_copy(info.display_id())
            {
                return Ok(EditOutcome::RolledBack);
            }
        }

        self.begin_update();
        let result = self.apply_move(&moved, dx, dy, &gate_uris);
        self.end_update();
        match result {
            Ok(()) => Ok(EditOutcome::Committed),
            Err(err) => {
                // partially reflowed state is never left behind
                self.rollback_last();
                Err(err)
            }
        }
    }

    fn ownership_gate_uris(&self, moved: &[CellId]) -> Vec<Uri> {
        let mut containers: BTreeSet<Uri> = BTreeSet::new();
        let mut any_feature = false;
        for id in moved {
            if let Some(cell) = self.tree.get(*id)
                && cell.is_sequence_feature()
            {
                any_feature = true;
                if let Some(value) = cell
                    .parent
                    .and_then(|p| self.tree.get(p))
                    .and_then(|p| p.value())
                {
                    containers.insert(value.clone());
                }
            }
        }
        if !any_feature {
            return vec![];
        }
        // inside a zoomed definition the definition being restructured is
        // the view's own
        let root = self.current_root();
        if let Some(root_cell) = self.tree.get(root)
            && root_cell.is_component_view()
            && let Some(uri) = root_cell.view_uri()
        {
            return vec![uri.clone()];
        }
        containers.into_iter().collect()
    }

    fn apply_move(&mut self, moved: &[CellId], dx: f64, dy: f64, gate_uris: &[Uri]) -> Result<()> {
        for id in moved {
            let Some(geom) = self.tree.get(*id).map(|c| c.geometry.clone()) else {
                continue;
            };
            self.set_geometry(*id, geom.translate(dx, dy));
        }

        let promoted = self.promote_orphans(moved)?;
        self.merge_streaks(moved);

        // horizontal sort over every strand on the current view
        let root = self.current_root();
        let containers: Vec<CellId> = self
            .tree
            .children_of(root)
            .iter()
            .copied()
            .filter(|id| self.tree.get(*id).is_some_and(|c| c.is_circuit_container()))
            .collect();
        for container in &containers {
            self.horizontal_sort(*container);
        }

        // a lone feature's strand visually tracks it
        if !promoted {
            for id in moved {
                let Some(cell) = self.tree.get(*id) else {
                    continue;
                };
                if !cell.is_sequence_feature() {
                    continue;
                }
                let Some(parent) = cell.parent else {
                    continue;
                };
                if self.tree.children_of(parent).len() == 2 {
                    let Some(geom) = self.tree.get(parent).map(|c| c.geometry.clone()) else {
                        continue;
                    };
                    self.set_geometry(parent, geom.translate(dx, dy));
                }
            }
        }

        // replicate each touched strand into its coupled set
        let mut touched: BTreeSet<CellId> = BTreeSet::new();
        for id in moved {
            if let Some(cell) = self.tree.get(*id)
                && cell.is_sequence_feature()
                && let Some(parent) = cell.parent
            {
                touched.insert(parent);
            }
        }
        for container in touched {
            self.sync_container(container);
        }

        for uri in gate_uris {
            self.take_ownership(uri, false);
        }
        Ok(())
    }

    /// If every moved cell is a feature of one strand and all of them landed
    /// clear of that strand's bounds, pull them out into a freshly created
    /// strand at the drop location.
    fn promote_orphans(&mut self, moved: &[CellId]) -> Result<bool> {
        let first_root = self.tree.container_root_id(moved[0]);
        for id in moved {
            let Some(cell) = self.tree.get(*id) else {
                return Ok(false);
            };
            if !cell.is_sequence_feature() || self.tree.container_root_id(*id) != first_root {
                return Ok(false);
            }
            let Some(container_geom) = cell
                .parent
                .and_then(|p| self.tree.get(p))
                .map(|p| p.geometry.clone())
            else {
                return Ok(false);
            };
            // glyph coordinates are relative to the strand
            let absolute = Rect {
                x: cell.geometry.x + container_geom.x,
                y: cell.geometry.y + container_geom.y,
                ..cell.geometry.clone()
            };
            if container_geom.overlaps(&absolute, MOVE_OVERLAP_PADDING) {
                return Ok(false);
            }
        }

        let (x, y) = {
            let first = self
                .tree
                .get(moved[0])
                .expect("moved cells were just validated");
            let parent_geom = first
                .parent
                .and_then(|p| self.tree.get(p))
                .map(|p| p.geometry.clone())
                .unwrap_or_default();
            (
                parent_geom.x + first.geometry.x,
                parent_geom.y + first.geometry.y,
            )
        };

        let old_container = first_root;
        let new_container = self.add_backbone_inner(x, y)?;
        for id in moved {
            // detach from the old strand and append, preserving order
            let snapshot = self.tree.subtree_snapshot(*id);
            self.remove_subtree(*id);
            self.add_subtree(snapshot, Some(new_container), None);
        }
        if self.tree.contains(old_container) {
            self.refresh_container(old_container);
        }
        self.refresh_container(new_container);
        Ok(true)
    }

    /// Within the sorted moved set, a maximal run of same-strand features at
    /// contiguous offsets snaps to the first glyph's offset so nothing can
    /// be interleaved between them by rounding.
    fn merge_streaks(&mut self, moved: &[CellId]) {
        let mut i = 0;
        while i < moved.len() {
            let mut streak = 1;
            let Some(first) = self.tree.get(moved[i]) else {
                i += 1;
                continue;
            };
            if !first.is_sequence_feature() {
                i += 1;
                continue;
            }
            let base_x = first.geometry.x;
            let root_id = self.tree.container_root_id(moved[i]);
            let mut streak_width = first.geometry.width;

            while i + streak < moved.len() {
                let next_id = moved[i + streak];
                let Some(next) = self.tree.get(next_id) else {
                    break;
                };
                if !next.is_sequence_feature() || self.tree.container_root_id(next_id) != root_id {
                    break;
                }
                let x_to_continue = base_x + streak_width;
                if approx_eq!(f64, x_to_continue, next.geometry.x, epsilon = 1e-6) {
                    let geom = next.geometry.clone();
                    let width = geom.width;
                    self.set_geometry(next_id, Rect { x: base_x, ..geom });
                    streak_width += width;
                    streak += 1;
                } else {
                    break;
                }
            }
            i += streak;
        }
    }

    /// Reorders a strand's children by x offset (stable, so equal offsets
    /// keep their previous relative order), then refreshes its geometry.
    pub(crate) fn horizontal_sort(&mut self, container: CellId) {
        let features = self.tree.feature_children(container);
        let mut ordered = features.clone();
        ordered.sort_by(|a, b| {
            let ax = self.tree.get(*a).map(|c| c.geometry.x).unwrap_or(0.0);
            let bx = self.tree.get(*b).map(|c| c.geometry.x).unwrap_or(0.0);
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        });
        // backbone holds index 0
        for (i, id) in ordered.iter().enumerate() {
            self.reorder_child(container, *id, i + 1);
        }
        self.refresh_container(container);
    }

    /// `add_backbone` without the transaction bracket, for use inside the
    /// move transaction.
    fn add_backbone_inner(&mut self, x: f64, y: f64) -> Result<CellId> {
        use crate::datamodel::{
            BACKBONE_HEIGHT, ComponentInfo, Info, SEQUENCE_FEATURE_HEIGHT, SEQUENCE_FEATURE_WIDTH,
        };
        use crate::stencil::{STYLE_BACKBONE, STYLE_CIRCUIT_CONTAINER};
        use crate::tree::{Cell, CellKind};

        let display_id = self.fresh_display_id("id");
        let info = ComponentInfo::new(&self.local_prefix().to_string(), &display_id);
        let uri = info.full_uri();
        let parent = self.current_root();

        self.put_info(Info::Component(info));
        let container_id = self.tree.alloc_id();
        let backbone_id = self.tree.alloc_id();
        let mut container = Cell::new(
            container_id,
            CellKind::CircuitContainer { value: uri },
            Rect::new(x, y, SEQUENCE_FEATURE_WIDTH, SEQUENCE_FEATURE_HEIGHT),
            STYLE_CIRCUIT_CONTAINER,
        );
        container.children.push(backbone_id);
        let mut backbone = Cell::new(
            backbone_id,
            CellKind::Backbone,
            Rect::new(
                0.0,
                SEQUENCE_FEATURE_HEIGHT / 2.0,
                SEQUENCE_FEATURE_WIDTH,
                BACKBONE_HEIGHT,
            ),
            STYLE_BACKBONE,
        );
        backbone.parent = Some(container_id);
        self.add_subtree(vec![container, backbone], Some(parent), None);
        Ok(container_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils::TestCanvas;

    #[test]
    fn adjacent_moved_glyphs_stay_adjacent() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter", "cds", "terminator"]);
        let features = t.canvas.tree().feature_children(strand);

        // drag the first two glyphs together to the right
        t.canvas
            .move_cells(&[features[0], features[1]], 10.0, 0.0)
            .unwrap();

        let features = t.canvas.tree().feature_children(strand);
        let mut expected_x = 0.0;
        for f in features {
            let geom = &t.canvas.tree().get(f).unwrap().geometry;
            assert_eq!(geom.x, expected_x, "glyphs reflow to contiguous offsets");
            expected_x += geom.width;
        }
    }

    #[test]
    fn lone_feature_moves_its_strand() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter"]);
        let feature = t.canvas.tree().feature_children(strand)[0];
        let before = t.canvas.tree().get(strand).unwrap().geometry.clone();

        t.canvas.move_cells(&[feature], 15.0, 25.0).unwrap();

        let after = &t.canvas.tree().get(strand).unwrap().geometry;
        assert_eq!(after.x, before.x + 15.0);
        assert_eq!(after.y, before.y + 25.0);
    }

    #[test]
    fn features_dropped_far_away_spawn_a_new_strand() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter", "cds"]);
        let features = t.canvas.tree().feature_children(strand);
        let values: Vec<_> = features
            .iter()
            .map(|f| t.canvas.tree().get(*f).unwrap().value().cloned().unwrap())
            .collect();

        t.canvas.move_cells(&features, 500.0, 500.0).unwrap();

        // the old strand is empty, a new strand holds both glyphs in order
        assert!(t.canvas.tree().feature_children(strand).is_empty());
        let root = t.canvas.current_root();
        let new_strand = t
            .canvas
            .tree()
            .children_of(root)
            .iter()
            .copied()
            .find(|id| {
                *id != strand
                    && t.canvas
                        .tree()
                        .get(*id)
                        .is_some_and(|c| c.is_circuit_container())
            })
            .expect("a promoted strand exists");
        let new_values: Vec<_> = t
            .canvas
            .tree()
            .feature_children(new_strand)
            .iter()
            .map(|f| t.canvas.tree().get(*f).unwrap().value().cloned().unwrap())
            .collect();
        assert_eq!(values, new_values);
    }

    #[test]
    fn declined_ownership_gate_aborts_the_move() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter", "cds"]);
        t.make_external(strand);
        let features = t.canvas.tree().feature_children(strand);

        let tree_before = t.canvas.tree().clone();
        let store_before = t.canvas.store().clone();

        t.prompts.expect_ownership(false);
        let outcome = t.canvas.move_cells(&[features[0]], 10.0, 0.0).unwrap();
        assert_eq!(outcome, crate::edits::EditOutcome::RolledBack);
        assert_eq!(t.canvas.tree(), &tree_before);
        assert_eq!(t.canvas.store(), &store_before);
    }
}
