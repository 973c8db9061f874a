// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Retargeting a cell's definition reference.
//!
//! The protocol, in order: ownership confirmation, decouple decision,
//! couple/conflict decision, cycle checks, then the store/value/interaction
//! rewrites, container synchronization, and ownership propagation.  All user
//! decisions are gathered before the first mutation; a dismissed prompt
//! aborts with zero net effect.

use log::warn;

use crate::canvas::Canvas;
use crate::common::{Result, Uri};
use crate::cycle::{would_create_cycle_down, would_create_cycle_up};
use crate::datamodel::{ComponentInfo, Info, ModuleInfo};
use crate::edits::EditOutcome;
use crate::prompts::{CoupleChoice, DecoupleChoice};
use crate::stencil;
use crate::tree::{CellId, endpoint_key};
use crate::{canvas_err, entity_err};

impl Canvas {
    /// Applies `info` to the entity referenced by `cell`.  When the new
    /// record's URI differs from the old one this is a retarget, with the
    /// full coupling/decoupling protocol; otherwise it is a plain metadata
    /// edit.
    pub fn retarget(&mut self, cell: CellId, info: Info) -> Result<EditOutcome> {
        let Some(c) = self.tree.get(cell) else {
            return canvas_err!(DoesNotExist, format!("{cell}"));
        };
        match info {
            Info::Component(info) => {
                if c.is_molecular_species() {
                    self.retarget_species(cell, info)
                } else if c.is_sequence_feature() || c.is_circuit_container() || c.is_component_view()
                {
                    self.retarget_component(cell, info)
                } else {
                    canvas_err!(
                        InvalidCell,
                        "component records apply to glyphs, strands, and component views"
                            .to_string()
                    )
                }
            }
            Info::Module(info) => {
                if c.is_module() || c.is_module_view() {
                    self.retarget_module(cell, info)
                } else {
                    canvas_err!(
                        InvalidCell,
                        "module records apply to module glyphs and module views".to_string()
                    )
                }
            }
            Info::Interaction(_) => canvas_err!(
                InvalidCell,
                "interaction records are edited through their edge".to_string()
            ),
        }
    }

    fn retarget_component(&mut self, cell: CellId, mut info: ComponentInfo) -> Result<EditOutcome> {
        let local_prefix = self.local_prefix().to_string();
        let (is_feature, is_container, is_view, old_uri) = {
            let c = self.tree.get(cell).expect("checked by retarget");
            let old_uri = match c.view_uri().or_else(|| c.value()) {
                Some(uri) => uri.clone(),
                None => {
                    warn!("retarget_component: cell {cell} has no reference");
                    return Ok(EditOutcome::RolledBack);
                }
            };
            (
                c.is_sequence_feature(),
                c.is_circuit_container(),
                c.is_view(),
                old_uri,
            )
        };
        local_prefix.clone_into(&mut info.uri_prefix);
        let new_uri = info.full_uri();

        let Some(old_info) = self.store.get(&old_uri).cloned() else {
            warn!("retarget_component: no record for {old_uri}");
            return Ok(EditOutcome::RolledBack);
        };
        if old_info.uri_prefix() != local_prefix
            && !self.prompts.confirm_ownership_copy(old_info.display_id())
        {
            return Ok(EditOutcome::RolledBack);
        }

        if old_uri == new_uri {
            let role = info.part_role.clone();
            self.begin_update();
            self.put_info(Info::Component(info));
            let coupled = self.tree.coupled_features(&old_uri);
            self.mutate_feature_styles(&role, &coupled);
            self.take_ownership(&old_uri, false);
            self.end_update();
            return Ok(EditOutcome::Committed);
        }

        if let Some(conflict) = self.store.get(&new_uri)
            && conflict.as_component().is_none()
        {
            return entity_err!(
                EntityKindConflict,
                format!(
                    "the part {new_uri} already exists as a {}",
                    conflict.kind_name()
                )
            );
        }

        if would_create_cycle_up(&self.tree, &self.stacks, cell, &new_uri) {
            return canvas_err!(
                CircularReference,
                "component instances must not form circular reference chains through their \
                 definitions"
                    .to_string()
            );
        }

        // decouple decision
        let coupled_glyphs = self.tree.coupled_features(&old_uri);
        let coupled_containers = self.tree.coupled_containers(&old_uri, true);
        let selection_parent = self.stacks.selections.last().copied();
        let mut prompt_decouple = false;
        for g in &coupled_glyphs {
            if *g != cell
                && (is_feature
                    || ((is_container || is_view)
                        && selection_parent.is_some()
                        && Some(*g) != selection_parent))
            {
                prompt_decouple = true;
                break;
            }
        }
        let mut silent_decouple = false;
        if !prompt_decouple {
            // a lone aliased strand keeps its identity rather than being
            // dragged along by a rename of one instance
            let others = coupled_containers.iter().filter(|cc| **cc != cell).count();
            if others > 1 {
                prompt_decouple = true;
            } else if others == 1 {
                silent_decouple = true;
            }
        }
        let should_decouple = if prompt_decouple {
            match self.prompts.choose_decouple() {
                Some(DecoupleChoice::KeepCoupled) => false,
                Some(DecoupleChoice::Decouple) => true,
                None => return Ok(EditOutcome::RolledBack),
            }
        } else {
            silent_decouple
        };

        // couple decision
        let conflict_view = self.tree.view_cell(&new_uri);
        let conflict_containers = self.tree.coupled_containers(&new_uri, true);
        let (should_couple, keep_substructure) =
            if conflict_view.is_some() || !conflict_containers.is_empty() {
                match self.prompts.choose_couple() {
                    Some(CoupleChoice::Keep) => (true, true),
                    Some(CoupleChoice::Update) => (true, false),
                    None => return Ok(EditOutcome::RolledBack),
                }
            } else {
                (false, false)
            };

        if should_couple
            && keep_substructure
            && would_create_cycle_down(&self.tree, cell, &new_uri)
        {
            return canvas_err!(
                CircularReference,
                "component instances must not form circular reference chains through their \
                 definitions"
                    .to_string()
            );
        }

        // all decisions are in; mutate
        self.begin_update();

        let zoomed = (is_container || is_view)
            && self
                .tree
                .get(self.current_root())
                .is_some_and(|c| c.is_component_view());
        let retained_instance = if zoomed { selection_parent } else { Some(cell) };
        let zoom_path = if zoomed {
            Some(self.zoom_out_capture())
        } else {
            None
        };

        if !should_decouple {
            self.remove_info(&old_uri);
        }
        if should_couple && keep_substructure {
            self.remove_info(&new_uri);
        }
        if !should_couple || keep_substructure {
            self.put_info(Info::Component(info));
        }

        let old_view = self.tree.view_cell(&old_uri);
        let working_view = if should_decouple {
            old_view.map(|v| {
                let clone = self.clone_subtree(v);
                self.add_subtree(clone, None, None)
            })
        } else {
            old_view
        };
        if should_couple {
            if keep_substructure {
                if let Some(v) = working_view {
                    if let Some(cv) = conflict_view {
                        self.remove_subtree(cv);
                    }
                    self.update_view_cell(v, new_uri.clone());
                }
            } else if let Some(v) = working_view {
                self.remove_subtree(v);
            }
        } else if let Some(v) = working_view {
            self.update_view_cell(v, new_uri.clone());
        }

        let mut rewritten: Vec<CellId> = Vec::new();
        if !should_decouple {
            for g in &coupled_glyphs {
                self.set_cell_value(*g, new_uri.clone());
                rewritten.push(*g);
            }
            for cc in &coupled_containers {
                self.set_cell_value(*cc, new_uri.clone());
                rewritten.push(*cc);
            }
        } else if let Some(instance) = retained_instance
            && self.tree.get(instance).is_some_and(|c| c.value().is_some())
        {
            self.set_cell_value(instance, new_uri.clone());
            rewritten.push(instance);
        }

        // glyph graphics follow the (possibly adopted) record's role
        let role = self
            .store
            .get(&new_uri)
            .and_then(|i| i.as_component())
            .map(|c| c.part_role.clone())
            .unwrap_or_default();
        let new_coupled = self.tree.coupled_features(&new_uri);
        self.mutate_feature_styles(&role, &new_coupled);

        // structural synchronization
        if is_container && !zoomed {
            if !should_couple || keep_substructure {
                self.sync_container(cell);
            } else {
                self.sync_from_conflict(&new_uri, conflict_containers.first().copied());
            }
        } else {
            let view = match self.tree.view_cell(&new_uri) {
                Some(view) => view,
                None => self.create_view_cell(&new_uri, false),
            };
            if !should_couple || keep_substructure {
                for container in self.container_children(view) {
                    self.sync_container(container);
                }
            } else {
                self.sync_from_conflict(&new_uri, None);
            }
        }

        // endpoint keys embed the instance cell, so each rewritten cell's
        // key moves with it
        for id in &rewritten {
            self.rewrite_interactions(
                &endpoint_key(&old_uri, *id),
                Some(&endpoint_key(&new_uri, *id)),
            );
        }

        self.take_ownership(&new_uri, true);

        if let Some(path) = zoom_path {
            let mut rewrites = std::collections::BTreeMap::new();
            rewrites.insert(old_uri.clone(), new_uri.clone());
            self.zoom_reenter(&path, &rewrites);
        }

        self.end_update();
        Ok(EditOutcome::Committed)
    }

    fn retarget_species(&mut self, cell: CellId, mut info: ComponentInfo) -> Result<EditOutcome> {
        let local_prefix = self.local_prefix().to_string();
        let Some(old_uri) = self.tree.get(cell).and_then(|c| c.value()).cloned() else {
            warn!("retarget_species: cell {cell} has no reference");
            return Ok(EditOutcome::RolledBack);
        };
        local_prefix.clone_into(&mut info.uri_prefix);
        let new_uri = info.full_uri();

        let Some(old_info) = self.store.get(&old_uri).cloned() else {
            warn!("retarget_species: no record for {old_uri}");
            return Ok(EditOutcome::RolledBack);
        };
        if old_info.uri_prefix() != local_prefix
            && !self.prompts.confirm_ownership_copy(old_info.display_id())
        {
            return Ok(EditOutcome::RolledBack);
        }

        if old_uri == new_uri {
            self.begin_update();
            self.put_info(Info::Component(info));
            self.end_update();
            return Ok(EditOutcome::Committed);
        }

        if let Some(conflict) = self.store.get(&new_uri)
            && conflict.as_component().is_none()
        {
            return entity_err!(
                EntityKindConflict,
                format!(
                    "the part {new_uri} already exists as a {}",
                    conflict.kind_name()
                )
            );
        }

        let coupled = self.tree.coupled_species(&old_uri);
        let should_decouple = if coupled.len() > 1 {
            match self.prompts.choose_decouple() {
                Some(DecoupleChoice::KeepCoupled) => false,
                Some(DecoupleChoice::Decouple) => true,
                None => return Ok(EditOutcome::RolledBack),
            }
        } else {
            false
        };

        let conflict_species = self.tree.coupled_species(&new_uri);
        let (should_couple, keep_substructure) = if !conflict_species.is_empty() {
            match self.prompts.choose_couple() {
                Some(CoupleChoice::Keep) => (true, true),
                Some(CoupleChoice::Update) => (true, false),
                None => return Ok(EditOutcome::RolledBack),
            }
        } else {
            (false, false)
        };

        self.begin_update();
        if !should_decouple {
            self.remove_info(&old_uri);
        }
        if should_couple && keep_substructure {
            self.remove_info(&new_uri);
        }
        if !should_couple || keep_substructure {
            self.put_info(Info::Component(info));
        }

        let rewritten: Vec<CellId> = if should_decouple {
            self.set_cell_value(cell, new_uri.clone());
            vec![cell]
        } else {
            for s in &coupled {
                self.set_cell_value(*s, new_uri.clone());
            }
            coupled.clone()
        };

        // shape follows the record's molecule type
        if let Some(record) = self
            .store
            .get(&new_uri)
            .and_then(|i| i.as_component())
            .cloned()
        {
            let style = self
                .stencils()
                .molecular_species_style(stencil::molecule_type_to_shape(&record.part_type));
            for s in self.tree.coupled_species(&new_uri) {
                let current = self
                    .tree
                    .get(s)
                    .map(|c| c.style.clone())
                    .unwrap_or_default();
                let updated = stencil::replace_keyed_style(
                    &current,
                    stencil::STYLE_MOLECULAR_SPECIES,
                    &style,
                );
                self.set_style(s, updated);
            }
        }

        for id in &rewritten {
            self.rewrite_interactions(
                &endpoint_key(&old_uri, *id),
                Some(&endpoint_key(&new_uri, *id)),
            );
        }
        self.end_update();
        Ok(EditOutcome::Committed)
    }

    fn retarget_module(&mut self, cell: CellId, mut info: ModuleInfo) -> Result<EditOutcome> {
        let local_prefix = self.local_prefix().to_string();
        let (is_view, old_uri) = {
            let c = self.tree.get(cell).expect("checked by retarget");
            let old_uri = match c.view_uri().or_else(|| c.value()) {
                Some(uri) => uri.clone(),
                None => {
                    warn!("retarget_module: cell {cell} has no reference");
                    return Ok(EditOutcome::RolledBack);
                }
            };
            (c.is_view(), old_uri)
        };
        local_prefix.clone_into(&mut info.uri_prefix);
        let new_uri = info.full_uri();

        let Some(old_info) = self.store.get(&old_uri).cloned() else {
            warn!("retarget_module: no record for {old_uri}");
            return Ok(EditOutcome::RolledBack);
        };
        if old_info.uri_prefix() != local_prefix
            && !self.prompts.confirm_ownership_copy(old_info.display_id())
        {
            return Ok(EditOutcome::RolledBack);
        }

        if old_uri == new_uri {
            self.begin_update();
            self.put_info(Info::Module(info));
            self.take_ownership(&old_uri, false);
            self.end_update();
            return Ok(EditOutcome::Committed);
        }

        if would_create_cycle_up(&self.tree, &self.stacks, cell, &new_uri) {
            return canvas_err!(
                CircularReference,
                "module instances must not form circular reference chains through their \
                 definitions"
                    .to_string()
            );
        }

        if let Some(conflict) = self.store.get(&new_uri)
            && conflict.as_module().is_none()
        {
            return entity_err!(
                EntityKindConflict,
                format!(
                    "the part {new_uri} already exists as a {}",
                    conflict.kind_name()
                )
            );
        }

        let coupled = self.tree.coupled_modules(&old_uri);
        let selection_parent = self.stacks.selections.last().copied();
        let mut prompt_decouple = false;
        for m in &coupled {
            if *m != cell
                && (!is_view
                    || (selection_parent.is_some() && Some(*m) != selection_parent))
            {
                prompt_decouple = true;
                break;
            }
        }
        let should_decouple = if prompt_decouple {
            match self.prompts.choose_decouple() {
                Some(DecoupleChoice::KeepCoupled) => false,
                Some(DecoupleChoice::Decouple) => true,
                None => return Ok(EditOutcome::RolledBack),
            }
        } else {
            false
        };

        let conflict_view = self.tree.view_cell(&new_uri);
        let (should_couple, keep_substructure) = if conflict_view.is_some() {
            match self.prompts.choose_couple() {
                Some(CoupleChoice::Keep) => (true, true),
                Some(CoupleChoice::Update) => (true, false),
                None => return Ok(EditOutcome::RolledBack),
            }
        } else {
            (false, false)
        };

        if should_couple
            && keep_substructure
            && would_create_cycle_down(&self.tree, cell, &new_uri)
        {
            return canvas_err!(
                CircularReference,
                "module instances must not form circular reference chains through their \
                 definitions"
                    .to_string()
            );
        }

        self.begin_update();

        let retained_instance = if is_view { selection_parent } else { Some(cell) };
        let zoom_path = if is_view {
            Some(self.zoom_out_capture())
        } else {
            None
        };

        if !should_decouple {
            self.remove_info(&old_uri);
        }
        if should_couple && keep_substructure {
            self.remove_info(&new_uri);
        }
        if !should_couple || keep_substructure {
            self.put_info(Info::Module(info));
        }

        let old_view = self.tree.view_cell(&old_uri);
        let working_view = if should_decouple {
            old_view.map(|v| {
                let clone = self.clone_subtree(v);
                self.add_subtree(clone, None, None)
            })
        } else {
            old_view
        };
        if should_couple {
            if keep_substructure {
                if let Some(v) = working_view {
                    if let Some(cv) = conflict_view {
                        self.remove_subtree(cv);
                    }
                    self.update_view_cell(v, new_uri.clone());
                }
            } else if let Some(v) = working_view {
                self.remove_subtree(v);
            }
        } else if let Some(v) = working_view {
            self.update_view_cell(v, new_uri.clone());
        }

        if !should_decouple {
            for m in &coupled {
                self.set_cell_value(*m, new_uri.clone());
            }
        } else if let Some(instance) = retained_instance
            && self.tree.get(instance).is_some_and(|c| c.value().is_some())
        {
            self.set_cell_value(instance, new_uri.clone());
        }

        if is_view {
            self.take_ownership(&new_uri, false);
        } else {
            self.take_ownership(&new_uri, true);
        }

        if let Some(path) = zoom_path {
            let mut rewrites = std::collections::BTreeMap::new();
            rewrites.insert(old_uri.clone(), new_uri.clone());
            self.zoom_reenter(&path, &rewrites);
        }

        self.end_update();
        Ok(EditOutcome::Committed)
    }

    fn container_children(&self, view: CellId) -> Vec<CellId> {
        self.tree
            .children_of(view)
            .iter()
            .copied()
            .filter(|id| self.tree.get(*id).is_some_and(|c| c.is_circuit_container()))
            .collect()
    }

    /// After adopting a conflicting definition's substructure, push that
    /// structure out from one of the conflict's own containers.
    fn sync_from_conflict(&mut self, new_uri: &Uri, hint: Option<CellId>) {
        let source = hint.or_else(|| {
            let view = self.tree.view_cell(new_uri);
            self.tree
                .coupled_containers(new_uri, false)
                .into_iter()
                .find(|id| {
                    // prefer a container that lives outside the definition's
                    // own view cell
                    match view {
                        Some(view) => self.tree.parent_of(*id) != Some(view),
                        None => true,
                    }
                })
        });
        match source {
            Some(source) => self.sync_container(source),
            None => warn!("sync_from_conflict: no container references {new_uri}"),
        }
    }
}
