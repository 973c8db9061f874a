// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The `Canvas` is the explicit context every consistency operation runs
//! against: the cell tree, the entity store, the undo log, and the zoom
//! stacks.  There are no ambient globals; the UI layer constructs one and
//! calls into it.

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::common::{Result, Uri};
use crate::datamodel::{
    BACKBONE_HEIGHT, ComponentInfo, DEFAULT_MODULE_HEIGHT, DEFAULT_MODULE_WIDTH,
    DEFAULT_TEXT_HEIGHT, DEFAULT_TEXT_WIDTH, Info, InteractionInfo, InteractionKind,
    MOLECULAR_SPECIES_HEIGHT, MOLECULAR_SPECIES_WIDTH, ModuleInfo, Rect, SEQUENCE_FEATURE_HEIGHT,
    SEQUENCE_FEATURE_WIDTH,
};
use crate::edits::{Edit, EditOutcome, Transaction, UndoLog, ViewStacks};
use crate::prompts::{EndpointOption, PromptPort};
use crate::stencil::{
    self, STYLE_BACKBONE, STYLE_CIRCUIT_CONTAINER, STYLE_COMPONENT_VIEW, STYLE_MODULE,
    STYLE_MODULE_VIEW, STYLE_TEXTBOX, Stencils,
};
use crate::store::EntityStore;
use crate::tree::{Cell, CellId, CellKind, CellTree, ViewKind, endpoint_key};
use crate::canvas_err;

pub struct Canvas {
    pub(crate) tree: CellTree,
    pub(crate) store: EntityStore,
    pub(crate) stacks: ViewStacks,
    pub(crate) undo_log: UndoLog,
    pending: Vec<Edit>,
    depth: u32,
    local_prefix: String,
    pub(crate) prompts: Box<dyn PromptPort>,
    stencils: Stencils,
    next_display: u32,
}

impl Canvas {
    /// Creates a canvas holding an empty root design (a module view).  The
    /// setup is not on the undo stack.
    pub fn new(local_prefix: &str, prompts: Box<dyn PromptPort>) -> Canvas {
        let mut tree = CellTree::new();
        let mut store = EntityStore::new();

        let root_info = ModuleInfo::new(local_prefix, "design");
        let root_uri = root_info.full_uri();
        store.put_raw(Info::Module(root_info));

        let root = tree.alloc_id();
        tree.insert_raw(Cell::new(
            root,
            CellKind::View {
                uri: root_uri,
                kind: ViewKind::Module,
            },
            Rect::default(),
            STYLE_MODULE_VIEW,
        ));
        tree.attach_child(None, root, 0);

        Canvas {
            tree,
            store,
            stacks: ViewStacks {
                views: vec![root],
                selections: vec![],
            },
            undo_log: UndoLog::new(),
            pending: Vec::new(),
            depth: 0,
            local_prefix: local_prefix.to_string(),
            prompts,
            stencils: Stencils::builtin(),
            next_display: 0,
        }
    }

    /// Assembles a canvas from decoded parts; used by the XML decoder.
    pub(crate) fn from_parts(
        tree: CellTree,
        store: EntityStore,
        root_view: CellId,
        local_prefix: &str,
        prompts: Box<dyn PromptPort>,
    ) -> Canvas {
        Canvas {
            tree,
            store,
            stacks: ViewStacks {
                views: vec![root_view],
                selections: vec![],
            },
            undo_log: UndoLog::new(),
            pending: Vec::new(),
            depth: 0,
            local_prefix: local_prefix.to_string(),
            prompts,
            stencils: Stencils::builtin(),
            next_display: 0,
        }
    }

    pub fn tree(&self) -> &CellTree {
        &self.tree
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn local_prefix(&self) -> &str {
        &self.local_prefix
    }

    pub fn view_stack(&self) -> &[CellId] {
        &self.stacks.views
    }

    pub fn selection_stack(&self) -> &[CellId] {
        &self.stacks.selections
    }

    /// The view cell currently being edited.
    pub fn current_root(&self) -> CellId {
        *self
            .stacks
            .views
            .last()
            .expect("view stack always holds the root view")
    }

    pub fn stencils(&self) -> &Stencils {
        &self.stencils
    }

    pub fn stencils_mut(&mut self) -> &mut Stencils {
        &mut self.stencils
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_log.depth()
    }

    // --- transaction bracket ------------------------------------------------

    pub(crate) fn begin_update(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn end_update(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 && !self.pending.is_empty() {
            let edits = std::mem::take(&mut self.pending);
            self.undo_log.push(Transaction { edits });
        }
    }

    /// Applies one primitive mutation and records it for undo.  Only valid
    /// inside a begin/end bracket.
    pub(crate) fn apply(&mut self, edit: Edit) {
        if self.depth == 0 {
            warn!("edit applied outside a transaction bracket");
        }
        edit.apply(&mut self.tree, &mut self.store, &mut self.stacks);
        self.pending.push(edit);
    }

    /// Compensating inversion of the most recently committed transaction.
    /// The rolled-back transaction is not redoable.
    pub(crate) fn rollback_last(&mut self) {
        self.undo_log
            .undo(&mut self.tree, &mut self.store, &mut self.stacks);
        self.undo_log.trim();
    }

    pub fn undo(&mut self) -> bool {
        if self.depth > 0 {
            warn!("undo requested inside an open transaction");
            return false;
        }
        self.undo_log
            .undo(&mut self.tree, &mut self.store, &mut self.stacks)
    }

    pub fn redo(&mut self) -> bool {
        if self.depth > 0 {
            warn!("redo requested inside an open transaction");
            return false;
        }
        self.undo_log
            .redo(&mut self.tree, &mut self.store, &mut self.stacks)
    }

    // --- primitive undoable mutations --------------------------------------

    pub(crate) fn put_info(&mut self, info: Info) {
        let uri = info.full_uri();
        let prev = self.store.get(&uri).cloned();
        self.apply(Edit::PutInfo {
            uri,
            info: Some(info),
            prev,
        });
    }

    pub(crate) fn remove_info(&mut self, uri: &Uri) {
        let prev = self.store.get(uri).cloned();
        if prev.is_none() {
            return;
        }
        self.apply(Edit::PutInfo {
            uri: uri.clone(),
            info: None,
            prev,
        });
    }

    pub(crate) fn set_cell_value(&mut self, cell: CellId, value: Uri) {
        let Some(prev) = self.tree.get(cell).and_then(|c| c.value()).cloned() else {
            warn!("set_cell_value: cell {cell} has no value");
            return;
        };
        if prev == value {
            return;
        }
        self.apply(Edit::SetValue { cell, value, prev });
    }

    /// Re-keys a view cell.  For a component view the contained strand's
    /// value is the same definition and is re-pointed too.
    pub(crate) fn update_view_cell(&mut self, view: CellId, uri: Uri) {
        let Some(cell) = self.tree.get(view) else {
            warn!("update_view_cell: missing cell {view}");
            return;
        };
        if !cell.is_view() {
            warn!("update_view_cell called on a non-view cell");
            return;
        }
        let prev = cell.view_uri().cloned().unwrap_or_else(|| Uri::from(""));
        if cell.is_component_view() {
            let containers: Vec<CellId> = cell
                .children
                .iter()
                .copied()
                .filter(|id| self.tree.get(*id).is_some_and(|c| c.is_circuit_container()))
                .collect();
            for container in containers {
                self.set_cell_value(container, uri.clone());
            }
        }
        if prev != uri {
            self.apply(Edit::SetViewUri {
                cell: view,
                uri,
                prev,
            });
        }
    }

    /// Skips the edit when nothing changes, to save entries on the undo
    /// stack.
    pub(crate) fn set_geometry(&mut self, cell: CellId, geometry: Rect) {
        let Some(prev) = self.tree.get(cell).map(|c| c.geometry.clone()) else {
            warn!("set_geometry: missing cell {cell}");
            return;
        };
        if prev == geometry {
            return;
        }
        self.apply(Edit::SetGeometry {
            cell,
            geometry,
            prev,
        });
    }

    pub(crate) fn set_style(&mut self, cell: CellId, style: String) {
        let Some(prev) = self.tree.get(cell).map(|c| c.style.clone()) else {
            return;
        };
        if prev == style {
            return;
        }
        self.apply(Edit::SetStyle { cell, style, prev });
    }

    pub(crate) fn set_terminal(&mut self, edge: CellId, source: bool, terminal: Option<CellId>) {
        let Some(prev) = self.tree.get(edge).map(|c| c.terminal(source)) else {
            return;
        };
        if prev == terminal {
            return;
        }
        self.apply(Edit::SetTerminal {
            edge,
            source,
            terminal,
            prev,
        });
    }

    /// Updates an edge's interaction record, mirroring it into the store.
    pub(crate) fn set_edge_info(&mut self, edge: CellId, info: InteractionInfo) {
        let Some(prev) = self.tree.get(edge).and_then(|c| c.interaction_info()).cloned() else {
            warn!("set_edge_info: {edge} is not an interaction");
            return;
        };
        if prev == info {
            return;
        }
        let uri = info.full_uri();
        if self.store.contains(&uri) {
            self.put_info(Info::Interaction(info.clone()));
        }
        self.apply(Edit::SetInteractionInfo { edge, info, prev });
    }

    pub(crate) fn add_subtree(
        &mut self,
        mut cells: Vec<Cell>,
        parent: Option<CellId>,
        index: Option<usize>,
    ) -> CellId {
        let index = index.unwrap_or_else(|| match parent {
            Some(p) => self.tree.children_of(p).len(),
            None => self.tree.roots().len(),
        });
        if let Some(root) = cells.first_mut() {
            root.parent = parent;
        }
        let root_id = cells[0].id;
        self.apply(Edit::AddCells {
            cells,
            parent,
            index,
        });
        root_id
    }

    pub(crate) fn add_cell(
        &mut self,
        cell: Cell,
        parent: Option<CellId>,
        index: Option<usize>,
    ) -> CellId {
        self.add_subtree(vec![cell], parent, index)
    }

    pub(crate) fn remove_subtree(&mut self, root: CellId) {
        let Some(cell) = self.tree.get(root) else {
            debug!("remove_subtree: {root} already gone");
            return;
        };
        let parent = cell.parent;
        let Some(index) = self.tree.index_in_parent(root) else {
            warn!("remove_subtree: {root} detached from its parent");
            return;
        };
        let cells = self.tree.subtree_snapshot(root);
        self.apply(Edit::RemoveCells {
            cells,
            parent,
            index,
        });
    }

    pub(crate) fn reorder_child(&mut self, parent: CellId, child: CellId, index: usize) {
        let Some(prev_index) = self
            .tree
            .children_of(parent)
            .iter()
            .position(|c| *c == child)
        else {
            warn!("reorder_child: {child} is not a child of {parent}");
            return;
        };
        if prev_index == index {
            return;
        }
        self.apply(Edit::ReorderChild {
            parent,
            child,
            index,
            prev_index,
        });
    }

    pub(crate) fn set_stacks(&mut self, views: Vec<CellId>, selections: Vec<CellId>) {
        if views == self.stacks.views && selections == self.stacks.selections {
            return;
        }
        self.apply(Edit::SetStacks {
            prev_views: self.stacks.views.clone(),
            prev_selections: self.stacks.selections.clone(),
            views,
            selections,
        });
    }

    /// Clones a subtree with fresh ids, preserving structure, order, and
    /// geometry.  The returned snapshot is ready for `add_subtree`.
    pub(crate) fn clone_subtree(&mut self, root: CellId) -> Vec<Cell> {
        let snapshot = self.tree.subtree_snapshot(root);
        let mut mapping = std::collections::BTreeMap::new();
        for cell in &snapshot {
            mapping.insert(cell.id, self.tree.alloc_id());
        }
        snapshot
            .into_iter()
            .map(|mut cell| {
                cell.id = mapping[&cell.id];
                cell.parent = cell.parent.and_then(|p| mapping.get(&p).copied());
                cell.children = cell
                    .children
                    .iter()
                    .map(|c| mapping.get(c).copied().unwrap_or(*c))
                    .collect();
                if let CellKind::Interaction { source, target, .. } = &mut cell.kind {
                    *source = source.map(|s| mapping.get(&s).copied().unwrap_or(s));
                    *target = target.map(|t| mapping.get(&t).copied().unwrap_or(t));
                }
                cell
            })
            .collect()
    }

    // --- ids ----------------------------------------------------------------

    pub(crate) fn fresh_display_id(&mut self, base: &str) -> String {
        loop {
            let candidate = format!("{base}{}", self.next_display);
            self.next_display += 1;
            let uri = Uri::new(&self.local_prefix, &candidate);
            if !self.store.contains(&uri) && self.tree.view_cell(&uri).is_none() {
                return candidate;
            }
        }
    }

    // --- zoom ---------------------------------------------------------------

    /// Zooms into a sequence feature or module, entering its definition's
    /// view.
    pub fn enter_cell(&mut self, cell: CellId) -> Result<()> {
        let Some(c) = self.tree.get(cell) else {
            return canvas_err!(DoesNotExist, format!("{cell}"));
        };
        if !c.is_sequence_feature() && !c.is_module() {
            return canvas_err!(InvalidCell, "only features and modules can be entered".to_string());
        }
        let value = c.value().cloned().unwrap_or_else(|| Uri::from(""));
        let Some(view) = self.tree.view_cell(&value) else {
            return canvas_err!(DoesNotExist, format!("no view cell for {value}"));
        };

        let mut views = self.stacks.views.clone();
        let mut selections = self.stacks.selections.clone();
        views.push(view);
        selections.push(cell);
        self.begin_update();
        self.set_stacks(views, selections);
        self.end_update();
        Ok(())
    }

    /// Zooms out one level; a no-op at the root view.
    pub fn exit_view(&mut self) {
        if self.stacks.views.len() <= 1 {
            return;
        }
        let mut views = self.stacks.views.clone();
        let mut selections = self.stacks.selections.clone();
        views.pop();
        selections.pop();
        self.begin_update();
        self.set_stacks(views, selections);
        self.end_update();
    }

    /// Unwinds the zoom stacks to the root view, returning the value path of
    /// the instances zoomed through so the stack can be re-entered by URI.
    pub(crate) fn zoom_out_capture(&mut self) -> Vec<Uri> {
        let path: Vec<Uri> = self
            .stacks
            .selections
            .iter()
            .filter_map(|id| self.tree.get(*id).and_then(|c| c.value()).cloned())
            .collect();
        let base = self.stacks.views[0];
        self.set_stacks(vec![base], vec![]);
        path
    }

    /// Re-enters a previously captured zoom path, resolving each step by URI
    /// against the tree as it now stands.  Steps that no longer resolve stop
    /// the descent.
    pub(crate) fn zoom_reenter(
        &mut self,
        path: &[Uri],
        rewrites: &std::collections::BTreeMap<Uri, Uri>,
    ) {
        let mut views = vec![self.stacks.views[0]];
        let mut selections = Vec::new();
        for uri in path {
            let uri = rewrites.get(uri).unwrap_or(uri);
            let current = *views.last().expect("non-empty view path");
            let Some(instance) = self
                .tree
                .children_of(current)
                .iter()
                .copied()
                .flat_map(|child| {
                    // strand features are one level deeper than modules
                    let mut candidates = vec![child];
                    candidates.extend(self.tree.children_of(child).iter().copied());
                    candidates
                })
                .find(|id| {
                    self.tree.get(*id).is_some_and(|c| {
                        (c.is_sequence_feature() || c.is_module()) && c.value() == Some(uri)
                    })
                })
            else {
                debug!("zoom_reenter: no instance of {uri} under the current view");
                break;
            };
            let Some(view) = self.tree.view_cell(uri) else {
                debug!("zoom_reenter: no view cell for {uri}");
                break;
            };
            views.push(view);
            selections.push(instance);
        }
        self.set_stacks(views, selections);
    }

    // --- shared helpers -----------------------------------------------------

    /// Rewrites interaction endpoint keys across every module view.  A
    /// `None` replacement removes the interaction outright.
    pub(crate) fn rewrite_interactions(&mut self, old_ref: &str, new_ref: Option<&str>) {
        let mut edges: Vec<CellId> = Vec::new();
        for root in self.tree.roots().to_vec() {
            let Some(view) = self.tree.get(root) else {
                continue;
            };
            if view.is_component_view() {
                continue;
            }
            for child in view.children.clone() {
                if self.tree.get(child).is_some_and(|c| c.is_interaction()) {
                    edges.push(child);
                }
            }
        }

        for edge in edges {
            let Some(info) = self.tree.get(edge).and_then(|c| c.interaction_info()).cloned()
            else {
                continue;
            };
            let touches = info.from_uri.as_deref() == Some(old_ref)
                || info.to_uri.as_deref() == Some(old_ref);
            if !touches {
                continue;
            }
            match new_ref {
                None => {
                    self.remove_info(&info.full_uri());
                    self.remove_subtree(edge);
                }
                Some(new_ref) => {
                    let mut updated = info.clone();
                    if updated.from_uri.as_deref() == Some(old_ref) {
                        updated.from_uri = Some(new_ref.to_string());
                    }
                    if updated.to_uri.as_deref() == Some(old_ref) {
                        updated.to_uri = Some(new_ref.to_string());
                    }
                    self.set_edge_info(edge, updated);
                }
            }
        }
    }

    /// Re-derives the stencil style for a set of feature glyphs after a role
    /// change.
    pub(crate) fn mutate_feature_styles(&mut self, role: &str, cells: &[CellId]) {
        let new_key = self.stencils.sequence_feature_style(role);
        for cell in cells {
            let Some(c) = self.tree.get(*cell) else {
                continue;
            };
            if !c.is_sequence_feature() {
                continue;
            }
            let style =
                stencil::replace_keyed_style(&c.style, stencil::STYLE_SEQUENCE_FEATURE, &new_key);
            self.set_style(*cell, style);
        }
    }

    /// Re-positions a strand's glyphs into a contiguous horizontal line and
    /// refreshes its backbone geometry.
    pub(crate) fn refresh_container(&mut self, container: CellId) {
        let Some(cell) = self.tree.get(container) else {
            warn!("refresh_container: missing cell {container}");
            return;
        };
        if !cell.is_circuit_container() {
            warn!("refresh_container: called on an invalid cell");
            return;
        }
        let Some(backbone) = self.tree.backbone_of(container) else {
            warn!("refresh_container: no backbone found in circuit container");
            return;
        };

        // backbone stays first so it draws behind the glyphs
        if self.tree.children_of(container).first() != Some(&backbone) {
            self.reorder_child(container, backbone, 0);
        }

        let mut x = 0.0;
        for feature in self.tree.feature_children(container) {
            let Some(geom) = self.tree.get(feature).map(|c| c.geometry.clone()) else {
                continue;
            };
            self.set_geometry(feature, Rect::new(x, 0.0, geom.width, geom.height));
            x += geom.width;
        }

        let width = self.tree.backbone_width(container);
        self.set_geometry(
            backbone,
            Rect::new(0.0, SEQUENCE_FEATURE_HEIGHT / 2.0, width, BACKBONE_HEIGHT),
        );
        let geom = self
            .tree
            .get(container)
            .map(|c| c.geometry.clone())
            .unwrap_or_default();
        self.set_geometry(
            container,
            Rect::new(geom.x, geom.y, width, SEQUENCE_FEATURE_HEIGHT),
        );
    }

    /// Builds the view cell for a definition: an empty module view, or a
    /// component view holding the definition's own strand and backbone.
    pub(crate) fn create_view_cell(&mut self, uri: &Uri, module: bool) -> CellId {
        if module {
            let id = self.tree.alloc_id();
            let cell = Cell::new(
                id,
                CellKind::View {
                    uri: uri.clone(),
                    kind: ViewKind::Module,
                },
                Rect::default(),
                STYLE_MODULE_VIEW,
            );
            return self.add_cell(cell, None, None);
        }

        let view_id = self.tree.alloc_id();
        let container_id = self.tree.alloc_id();
        let backbone_id = self.tree.alloc_id();

        let mut view = Cell::new(
            view_id,
            CellKind::View {
                uri: uri.clone(),
                kind: ViewKind::Component,
            },
            Rect::default(),
            STYLE_COMPONENT_VIEW,
        );
        view.children.push(container_id);

        let mut container = Cell::new(
            container_id,
            CellKind::CircuitContainer { value: uri.clone() },
            Rect::new(0.0, 0.0, SEQUENCE_FEATURE_WIDTH, SEQUENCE_FEATURE_HEIGHT),
            STYLE_CIRCUIT_CONTAINER,
        );
        container.parent = Some(view_id);
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

        self.add_subtree(vec![view, container, backbone], None, None)
    }

    // --- insertion operations -----------------------------------------------

    /// Drops a fresh strand (circuit container + backbone) onto the current
    /// view, with a new locally owned definition.
    pub fn add_backbone(&mut self, x: f64, y: f64) -> Result<CellId> {
        let display_id = self.fresh_display_id("id");
        let info = ComponentInfo::new(&self.local_prefix, &display_id);
        let uri = info.full_uri();
        let parent = self.current_root();

        self.begin_update();
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

        let added = self.add_subtree(vec![container, backbone], Some(parent), None);
        self.end_update();
        Ok(added)
    }

    /// Drops a new feature glyph onto a strand.  If the strand's enclosing
    /// definition is externally owned, the user must agree to an editable
    /// copy first; `Ok(None)` means they declined.
    pub fn drop_feature(&mut self, container: CellId, role: &str) -> Result<Option<CellId>> {
        let Some(c) = self.tree.get(container) else {
            return canvas_err!(DoesNotExist, format!("{container}"));
        };
        if !c.is_circuit_container() {
            return canvas_err!(InvalidCell, "features can only be dropped on a strand".to_string());
        }

        // the definition that gains a subcomponent
        let owner_uri = {
            let root = self.current_root();
            let root_cell = self.tree.get(root);
            if root_cell.is_some_and(|c| c.is_component_view()) {
                root_cell.and_then(|c| c.view_uri()).cloned()
            } else {
                c.value().cloned()
            }
        };
        if let Some(owner_uri) = &owner_uri
            && let Some(info) = self.store.get(owner_uri)
            && info.uri_prefix() != self.local_prefix
            && !self.prompts.confirm_ownership_copy(info.display_id())
        {
            return Ok(None);
        }

        let display_id = self.fresh_display_id("id");
        let mut info = ComponentInfo::new(&self.local_prefix, &display_id);
        role.clone_into(&mut info.part_role);
        let uri = info.full_uri();
        let style = self.stencils.sequence_feature_style(role);

        self.begin_update();
        self.put_info(Info::Component(info));

        let glyph_id = self.tree.alloc_id();
        let glyph = Cell::new(
            glyph_id,
            CellKind::SequenceFeature { value: uri.clone() },
            Rect::new(
                self.tree.backbone_width(container),
                0.0,
                SEQUENCE_FEATURE_WIDTH,
                SEQUENCE_FEATURE_HEIGHT,
            ),
            &style,
        );
        self.add_cell(glyph, Some(container), None);
        self.create_view_cell(&uri, false);
        self.refresh_container(container);
        self.sync_container(container);
        if let Some(owner_uri) = &owner_uri {
            self.take_ownership(owner_uri, false);
        }
        self.end_update();
        Ok(Some(glyph_id))
    }

    /// Adds a molecular species glyph to the current module view.
    pub fn add_species(&mut self, x: f64, y: f64, part_type: &str) -> Result<CellId> {
        let display_id = self.fresh_display_id("id");
        let mut info = ComponentInfo::new(&self.local_prefix, &display_id);
        part_type.clone_into(&mut info.part_type);
        let uri = info.full_uri();
        let style = self
            .stencils
            .molecular_species_style(stencil::molecule_type_to_shape(part_type));
        let parent = self.current_root();

        self.begin_update();
        self.put_info(Info::Component(info));
        let id = self.tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::MolecularSpecies { value: uri },
            Rect::new(x, y, MOLECULAR_SPECIES_WIDTH, MOLECULAR_SPECIES_HEIGHT),
            &style,
        );
        self.add_cell(cell, Some(parent), None);
        self.end_update();
        Ok(id)
    }

    /// Adds a module glyph (with its own, initially empty, module view).
    pub fn add_module(&mut self, x: f64, y: f64) -> Result<CellId> {
        let display_id = self.fresh_display_id("module");
        let info = ModuleInfo::new(&self.local_prefix, &display_id);
        let uri = info.full_uri();
        let parent = self.current_root();

        self.begin_update();
        self.put_info(Info::Module(info));
        let id = self.tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::Module { value: uri.clone() },
            Rect::new(x, y, DEFAULT_MODULE_WIDTH, DEFAULT_MODULE_HEIGHT),
            STYLE_MODULE,
        );
        self.add_cell(cell, Some(parent), None);
        self.create_view_cell(&uri, true);
        self.end_update();
        Ok(id)
    }

    pub fn add_textbox(&mut self, x: f64, y: f64, text: &str) -> CellId {
        let parent = self.current_root();
        self.begin_update();
        let id = self.tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::TextBox {
                text: text.to_string(),
            },
            Rect::new(x, y, DEFAULT_TEXT_WIDTH, DEFAULT_TEXT_HEIGHT),
            STYLE_TEXTBOX,
        );
        self.add_cell(cell, Some(parent), None);
        self.end_update();
        id
    }

    /// Resolves a terminal cell to an interaction endpoint key.  Returns
    /// `Ok(None)` when the user cancelled an endpoint choice.
    fn resolve_endpoint(&mut self, terminal: Option<CellId>) -> Option<Option<String>> {
        let Some(t) = terminal else {
            return Some(None);
        };
        let Some(cell) = self.tree.get(t) else {
            return Some(None);
        };
        if cell.is_module() {
            let Some(value) = cell.value().cloned() else {
                return Some(None);
            };
            let Some(view) = self.tree.view_cell(&value) else {
                warn!("module {t} has no view cell");
                return Some(None);
            };
            let mut options = Vec::new();
            for child in self.tree.children_of(view).to_vec() {
                let Some(c) = self.tree.get(child) else {
                    continue;
                };
                if !c.is_circuit_container() && !c.is_molecular_species() {
                    continue;
                }
                if let Some(uri) = c.value()
                    && let Some(Info::Component(info)) = self.store.get(uri)
                {
                    options.push(EndpointOption {
                        cell: child,
                        info: info.clone(),
                    });
                }
            }
            return match self.prompts.choose_endpoint(&options) {
                None => None,
                Some(idx) => {
                    let chosen = &options[idx];
                    Some(Some(endpoint_key(&chosen.info.full_uri(), chosen.cell)))
                }
            };
        }
        match cell.value() {
            Some(uri) => Some(Some(endpoint_key(uri, t))),
            None => Some(None),
        }
    }

    /// Draws a new interaction edge in the current module view.  `Ok(None)`
    /// means an endpoint prompt was cancelled.
    pub fn add_interaction(
        &mut self,
        kind: InteractionKind,
        source: Option<CellId>,
        target: Option<CellId>,
    ) -> Result<Option<CellId>> {
        let parent = self.current_root();
        if !self.tree.get(parent).is_some_and(|c| c.is_module_view()) {
            return canvas_err!(
                InvalidCell,
                "interactions can only be drawn in a module view".to_string()
            );
        }

        let Some(from_uri) = self.resolve_endpoint(source) else {
            return Ok(None);
        };
        let Some(to_uri) = self.resolve_endpoint(target) else {
            return Ok(None);
        };

        let display_id = self.fresh_display_id("interaction");
        let mut info = InteractionInfo::new(&self.local_prefix, &display_id, kind);
        info.from_uri = from_uri;
        info.to_uri = to_uri;
        let style = stencil::interaction_style(kind);

        self.begin_update();
        self.put_info(Info::Interaction(info.clone()));
        let id = self.tree.alloc_id();
        let cell = Cell::new(
            id,
            CellKind::Interaction {
                info,
                source,
                target,
            },
            Rect::default(),
            &style,
        );
        self.add_cell(cell, Some(parent), None);
        self.end_update();
        Ok(Some(id))
    }

    /// Re-terminals an interaction edge.  When the new terminal is a module
    /// the endpoint is chosen from the module definition's strands and
    /// species; cancelling rolls the operation back with no net effect.
    pub fn connect_interaction(
        &mut self,
        edge: CellId,
        terminal: Option<CellId>,
        is_source: bool,
    ) -> Result<EditOutcome> {
        let Some(info) = self.tree.get(edge).and_then(|c| c.interaction_info()).cloned() else {
            return canvas_err!(InvalidCell, format!("{edge} is not an interaction"));
        };

        let Some(endpoint) = self.resolve_endpoint(terminal) else {
            return Ok(EditOutcome::RolledBack);
        };

        let mut updated = info;
        if is_source {
            updated.from_uri = endpoint;
        } else {
            updated.to_uri = endpoint;
        }

        self.begin_update();
        self.set_terminal(edge, is_source, terminal);
        self.set_edge_info(edge, updated);
        self.end_update();
        Ok(EditOutcome::Committed)
    }

    // --- deletion -----------------------------------------------------------

    /// Deletes the given cells, their attached interactions, and any view
    /// cells and store records that become unreferenced.
    pub fn delete_cells(&mut self, cells: &[CellId]) -> Result<()> {
        let requested: BTreeSet<CellId> = cells.iter().copied().collect();
        // drop cells whose ancestor is also being removed, and never delete
        // a bare backbone
        let mut targets: Vec<CellId> = Vec::new();
        for id in cells {
            let Some(cell) = self.tree.get(*id) else {
                continue;
            };
            if cell.is_backbone() || cell.is_view() {
                continue;
            }
            let mut ancestor = cell.parent;
            let mut covered = false;
            while let Some(a) = ancestor {
                if requested.contains(&a) {
                    covered = true;
                    break;
                }
                ancestor = self.tree.parent_of(a);
            }
            if !covered {
                targets.push(*id);
            }
        }

        self.begin_update();

        let mut removed_values: Vec<Uri> = Vec::new();
        let mut touched_containers: BTreeSet<CellId> = BTreeSet::new();
        for target in &targets {
            let Some(cell) = self.tree.get(*target) else {
                continue;
            };
            if let Some(parent) = cell.parent
                && self.tree.get(parent).is_some_and(|c| c.is_circuit_container())
                && !targets.contains(&parent)
            {
                touched_containers.insert(parent);
            }
            for desc in self.tree.descendants(*target) {
                if let Some(c) = self.tree.get(desc)
                    && (c.is_sequence_feature() || c.is_module())
                    && let Some(v) = c.value()
                {
                    removed_values.push(v.clone());
                }
                // interactions resting on removed glyphs go too
                for (edge, _) in self.tree.edges_attached(desc) {
                    if !targets.contains(&edge) && self.tree.contains(edge) {
                        if let Some(info) = self.tree.get(edge).and_then(|c| c.interaction_info())
                        {
                            let uri = info.full_uri();
                            self.remove_info(&uri);
                        }
                        self.remove_subtree(edge);
                    }
                }
            }
            if let Some(info) = self.tree.get(*target).and_then(|c| c.interaction_info()) {
                let uri = info.full_uri();
                self.remove_info(&uri);
            }
            self.remove_subtree(*target);
        }

        // view cells whose definitions lost their last instance
        for value in removed_values {
            if self.tree.coupled_features(&value).is_empty()
                && self.tree.coupled_modules(&value).is_empty()
                && self.tree.coupled_containers(&value, true).is_empty()
                && let Some(view) = self.tree.view_cell(&value)
            {
                self.remove_view_cell(view);
            }
        }

        for container in touched_containers {
            if self.tree.contains(container) {
                self.refresh_container(container);
                self.sync_container(container);
            }
        }

        self.trim_unreferenced_inner();
        self.purge_orphan_infos();
        self.end_update();
        Ok(())
    }

    /// Removes a view cell, then recursively removes view cells of child
    /// definitions that no longer have any instance anywhere.
    pub(crate) fn remove_view_cell(&mut self, view: CellId) {
        let Some(cell) = self.tree.get(view) else {
            return;
        };
        if !cell.is_view() {
            debug!("tried to remove a view cell that isn't a view cell");
            return;
        }

        let mut child_values: Vec<Uri> = Vec::new();
        for child in self.tree.children_of(view).to_vec() {
            let Some(c) = self.tree.get(child) else {
                continue;
            };
            if c.is_module() {
                if let Some(v) = c.value() {
                    child_values.push(v.clone());
                }
            } else if c.is_circuit_container() {
                for gc in self.tree.feature_children(child) {
                    if let Some(v) = self.tree.get(gc).and_then(|g| g.value()) {
                        child_values.push(v.clone());
                    }
                }
            }
        }

        self.remove_subtree(view);

        for value in child_values {
            if self.tree.coupled_modules(&value).is_empty()
                && self.tree.coupled_features(&value).is_empty()
                && let Some(child_view) = self.tree.view_cell(&value)
            {
                self.remove_view_cell(child_view);
            }
        }
    }

    /// Removes any view cell unreachable from the root view by following
    /// value references.
    pub fn trim_unreferenced_cells(&mut self) {
        self.begin_update();
        self.trim_unreferenced_inner();
        self.end_update();
    }

    fn trim_unreferenced_inner(&mut self) {
        use std::collections::{HashSet, VecDeque};

        let root = self.stacks.views[0];
        let Some(root_uri) = self.tree.get(root).and_then(|c| c.view_uri()).cloned() else {
            warn!("trim: root view is missing");
            return;
        };

        let mut reached: HashSet<Uri> = HashSet::new();
        let mut to_expand: VecDeque<Uri> = VecDeque::new();
        to_expand.push_back(root_uri);

        while let Some(uri) = to_expand.pop_front() {
            if !reached.insert(uri.clone()) {
                continue;
            }
            let Some(view) = self.tree.view_cell(&uri) else {
                continue;
            };
            for child in self.tree.children_of(view).to_vec() {
                let Some(c) = self.tree.get(child) else {
                    continue;
                };
                if c.is_module() {
                    if let Some(v) = c.value()
                        && !reached.contains(v)
                    {
                        to_expand.push_back(v.clone());
                    }
                } else if c.is_circuit_container() {
                    for glyph in self.tree.feature_children(child) {
                        if let Some(v) = self.tree.get(glyph).and_then(|g| g.value())
                            && !reached.contains(v)
                        {
                            to_expand.push_back(v.clone());
                        }
                    }
                }
            }
        }

        let to_remove: Vec<CellId> = self
            .tree
            .roots()
            .iter()
            .copied()
            .filter(|id| {
                self.tree
                    .get(*id)
                    .and_then(|c| c.view_uri())
                    .is_some_and(|uri| !reached.contains(uri))
            })
            .collect();
        for view in to_remove {
            self.remove_subtree(view);
        }
    }

    /// Drops store records whose last referencing cell is gone.
    pub(crate) fn purge_orphan_infos(&mut self) {
        let mut referenced: BTreeSet<Uri> = BTreeSet::new();
        for cell in self.tree.iter() {
            if let Some(v) = cell.value() {
                referenced.insert(v.clone());
            }
            if let Some(u) = cell.view_uri() {
                referenced.insert(u.clone());
            }
            if let Some(info) = cell.interaction_info() {
                referenced.insert(info.full_uri());
            }
        }
        let orphans: Vec<Uri> = self
            .store
            .uris()
            .filter(|uri| !referenced.contains(*uri))
            .cloned()
            .collect();
        for uri in orphans {
            self.remove_info(&uri);
        }
    }

    // --- geometry helpers ---------------------------------------------------

    /// The strand on the current view closest to the given point.
    pub fn closest_container_to_point(&self, x: f64, y: f64) -> Option<CellId> {
        let root = self.current_root();
        let mut best: Option<(CellId, f64)> = None;
        for child in self.tree.children_of(root) {
            let Some(cell) = self.tree.get(*child) else {
                continue;
            };
            if !cell.is_circuit_container() {
                continue;
            }
            let g = &cell.geometry;
            let x_dist = if x < g.x {
                g.x - x
            } else if x > g.x + g.width {
                x - (g.x + g.width)
            } else {
                0.0
            };
            let y_dist = if y < g.y {
                g.y - y
            } else if y > g.y + g.height {
                y - (g.y + g.height)
            } else {
                0.0
            };
            let dist = (x_dist * x_dist + y_dist * y_dist).sqrt();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((*child, dist));
            }
        }
        best.map(|(id, _)| id)
    }
}
