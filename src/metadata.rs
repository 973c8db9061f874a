// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Projection of the current selection into entity metadata for the UI
//! layer.  At most one of the three info copies is populated; multi-selection
//! and no-match both read as "nothing selected".

use std::collections::BTreeSet;

use crate::canvas::Canvas;
use crate::datamodel::{ComponentInfo, Info, InteractionInfo, ModuleInfo};
use crate::tree::CellId;

/// Which style keys the selection spans; empty when nothing is selected.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct StyleSummary {
    pub styles: BTreeSet<String>,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct SelectionMetadata {
    pub component: Option<ComponentInfo>,
    pub module: Option<ModuleInfo>,
    pub interaction: Option<InteractionInfo>,
    pub style: StyleSummary,
}

impl Canvas {
    /// Builds the metadata projection for the given selection against the
    /// current view root.  The returned infos are copies; mutating them does
    /// not touch the store.
    pub fn selection_metadata(&self, selection: &[CellId]) -> SelectionMetadata {
        let mut meta = SelectionMetadata::default();

        for id in selection {
            if let Some(cell) = self.tree.get(*id) {
                meta.style.styles.insert(cell.style.clone());
            }
        }

        if selection.len() > 1 {
            // multiple selections can't display entity data
            return meta;
        }

        let cell = selection.first().and_then(|id| self.tree.get(*id));
        let root = self.tree.get(self.current_root());

        match cell {
            None => {
                // no selection: the current view's own definition
                let Some(root) = root else {
                    return meta;
                };
                let Some(uri) = root.view_uri() else {
                    return meta;
                };
                match self.store.get(uri) {
                    Some(Info::Component(info)) if root.is_component_view() => {
                        meta.component = Some(info.clone());
                    }
                    Some(Info::Module(info)) if root.is_module_view() => {
                        meta.module = Some(info.clone());
                    }
                    _ => {}
                }
            }
            Some(cell) if cell.is_module() => {
                if let Some(uri) = cell.value()
                    && let Some(Info::Module(info)) = self.store.get(uri)
                {
                    meta.module = Some(info.clone());
                }
            }
            Some(cell)
                if cell.is_sequence_feature()
                    || cell.is_molecular_species()
                    || cell.is_circuit_container() =>
            {
                if let Some(uri) = cell.value()
                    && let Some(Info::Component(info)) = self.store.get(uri)
                {
                    meta.component = Some(info.clone());
                }
            }
            Some(cell) if cell.is_interaction() => {
                meta.interaction = cell.interaction_info().cloned();
            }
            Some(_) => {}
        }

        meta
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils::TestCanvas;

    #[test]
    fn single_selection_projects_one_info() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter"]);
        let feature = t.canvas.tree().feature_children(strand)[0];

        let meta = t.canvas.selection_metadata(&[feature]);
        assert!(meta.component.is_some());
        assert!(meta.module.is_none());
        assert!(meta.interaction.is_none());
        assert_eq!(meta.style.styles.len(), 1);
    }

    #[test]
    fn multi_selection_clears_info() {
        let mut t = TestCanvas::new();
        let strand = t.strand(&["promoter", "cds"]);
        let features = t.canvas.tree().feature_children(strand);

        let meta = t.canvas.selection_metadata(&features);
        assert!(meta.component.is_none());
        assert!(meta.module.is_none());
        assert!(meta.interaction.is_none());
        assert!(!meta.style.styles.is_empty());
    }

    #[test]
    fn empty_selection_projects_the_current_view() {
        let t = TestCanvas::new();
        let meta = t.canvas.selection_metadata(&[]);
        assert!(meta.module.is_some(), "the root design is a module view");
        assert!(meta.component.is_none());
    }
}
