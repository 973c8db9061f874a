// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Ownership propagation.
//!
//! Editing an entity whose owner prefix is not the local authority must not
//! silently mutate a third party's design: the entity is cloned under the
//! local prefix, and the clone propagates upward through every definition
//! that (transitively) instantiates it, all the way to the root view.

use std::collections::{BTreeMap, HashSet, VecDeque};

use log::{debug, warn};

use crate::canvas::Canvas;
use crate::common::Uri;
use crate::tree::{CellId, endpoint_key};

impl Canvas {
    /// Re-prefixes the entity at `uri` (and, walking upward, every entity
    /// that contains it) to the local authority.  With `full_check`, the
    /// walk continues through already-local entities instead of stopping at
    /// them.
    ///
    /// Each URI is visited at most once, so the walk terminates; calling
    /// this twice in a row is a no-op the second time.
    pub fn take_ownership(&mut self, uri: &Uri, full_check: bool) {
        let Some(info) = self.store.get(uri) else {
            debug!("take_ownership: no record for {uri}");
            return;
        };
        // already ours, nothing to do
        if info.uri_prefix().is_empty()
            || (info.uri_prefix() == self.local_prefix() && !full_check)
        {
            return;
        }

        let local_prefix = self.local_prefix().to_string();
        self.begin_update();

        // the active zoom may be into a definition that gets re-keyed below,
        // so unwind the whole stack first and re-enter by URI afterwards
        let zoom_path = self.zoom_out_capture();

        let mut rewrites: BTreeMap<Uri, Uri> = BTreeMap::new();
        let mut to_check: VecDeque<Uri> = VecDeque::new();
        let mut checked: HashSet<Uri> = HashSet::new();
        to_check.push_back(uri.clone());

        while let Some(checking) = to_check.pop_front() {
            if !checked.insert(checking.clone()) {
                continue;
            }
            if checking.has_prefix(&local_prefix) && !full_check {
                continue;
            }
            let Some(info) = self.store.get(&checking) else {
                debug!("take_ownership: no record for {checking}");
                continue;
            };

            let mut new_info = info.clone();
            new_info.set_uri_prefix(&local_prefix);
            let new_uri = new_info.full_uri();
            let rekeyed = new_uri != checking;

            if rekeyed {
                self.remove_info(&checking);
                self.put_info(new_info);
                if let Some(view) = self.tree.view_cell(&checking) {
                    self.update_view_cell(view, new_uri.clone());
                }
            }

            // rewrite every referencing cell, then keep walking upward from
            // feature glyphs to their enclosing definitions
            let referencing: Vec<CellId> = self
                .tree
                .iter()
                .filter(|c| c.value() == Some(&checking))
                .map(|c| c.id)
                .collect();
            for cell in referencing {
                if rekeyed {
                    let old_key = endpoint_key(&checking, cell);
                    self.set_cell_value(cell, new_uri.clone());
                    self.rewrite_interactions(&old_key, Some(&endpoint_key(&new_uri, cell)));
                }
                let Some(c) = self.tree.get(cell) else {
                    continue;
                };
                if !c.is_sequence_feature() {
                    continue;
                }
                let Some(parent) = c.parent else {
                    warn!("take_ownership: feature {cell} has no parent");
                    continue;
                };
                let enclosing = match self.tree.parent_of(parent).and_then(|gp| self.tree.get(gp))
                {
                    Some(gp) if gp.is_component_view() => gp.view_uri().cloned(),
                    Some(gp) if gp.is_module_view() => {
                        self.tree.get(parent).and_then(|p| p.value()).cloned()
                    }
                    _ => None,
                };
                if let Some(enclosing) = enclosing
                    && !checked.contains(&enclosing)
                {
                    to_check.push_back(enclosing);
                }
            }

            if rekeyed {
                rewrites.insert(checking, new_uri);
            }
        }

        self.zoom_reenter(&zoom_path, &rewrites);
        self.end_update();
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils::TestCanvas;

    #[test]
    fn take_ownership_is_idempotent() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter"]);
        let feature = t.canvas.tree().feature_children(strand)[0];
        let ext_uri = t.make_external(feature);

        t.canvas.take_ownership(&ext_uri, false);

        let local_uri = t.value_of(feature);
        assert!(local_uri.has_prefix(t.canvas.local_prefix()));
        assert!(t.canvas.store().get(&local_uri).is_some());
        assert!(t.canvas.store().get(&ext_uri).is_none());

        let tree_before = t.canvas.tree().clone();
        let store_before = t.canvas.store().clone();
        t.canvas.take_ownership(&local_uri, false);
        assert_eq!(t.canvas.tree(), &tree_before);
        assert_eq!(t.canvas.store(), &store_before);
    }

    #[test]
    fn ownership_propagates_to_enclosing_definition() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter"]);
        let strand_uri = t.value_of(strand);
        let feature = t.canvas.tree().feature_children(strand)[0];
        // both the feature and its enclosing strand start externally owned
        let ext_feature = t.make_external(feature);
        let ext_strand = t.make_external(strand);

        t.canvas.take_ownership(&ext_feature, false);

        // the strand that contains the re-keyed feature is re-keyed too
        let strand_value = t.value_of(strand);
        assert!(strand_value.has_prefix(t.canvas.local_prefix()));
        assert_eq!(strand_value, strand_uri);
        assert!(t.canvas.store().get(&ext_strand).is_none());
    }
}
