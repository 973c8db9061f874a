// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Test support: a canned prompt source and a canvas builder.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::canvas::Canvas;
use crate::common::Uri;
use crate::datamodel::Rect;
use crate::prompts::{CoupleChoice, DecoupleChoice, EndpointOption, PromptPort};
use crate::tree::{CellId, CellKind};

#[derive(Default)]
struct Script {
    decouple: VecDeque<Option<DecoupleChoice>>,
    couple: VecDeque<Option<CoupleChoice>>,
    ownership: VecDeque<bool>,
    endpoint: VecDeque<Option<usize>>,
}

/// A prompt port that answers from queues of scripted answers.  Panics on a
/// prompt it was not told to expect, so tests catch unexpected dialogs.
#[derive(Clone, Default)]
pub struct ScriptedPrompts {
    script: Rc<RefCell<Script>>,
}

impl ScriptedPrompts {
    pub fn new() -> ScriptedPrompts {
        Default::default()
    }

    pub fn expect_decouple(&self, answer: Option<DecoupleChoice>) {
        self.script.borrow_mut().decouple.push_back(answer);
    }

    pub fn expect_couple(&self, answer: Option<CoupleChoice>) {
        self.script.borrow_mut().couple.push_back(answer);
    }

    pub fn expect_ownership(&self, confirm: bool) {
        self.script.borrow_mut().ownership.push_back(confirm);
    }

    pub fn expect_endpoint(&self, choice: Option<usize>) {
        self.script.borrow_mut().endpoint.push_back(choice);
    }
}

impl PromptPort for ScriptedPrompts {
    fn choose_decouple(&mut self) -> Option<DecoupleChoice> {
        self.script
            .borrow_mut()
            .decouple
            .pop_front()
            .expect("unexpected decouple prompt")
    }

    fn choose_couple(&mut self) -> Option<CoupleChoice> {
        self.script
            .borrow_mut()
            .couple
            .pop_front()
            .expect("unexpected couple prompt")
    }

    fn confirm_ownership_copy(&mut self, _label: &str) -> bool {
        self.script
            .borrow_mut()
            .ownership
            .pop_front()
            .expect("unexpected ownership prompt")
    }

    fn choose_endpoint(&mut self, _options: &[EndpointOption]) -> Option<usize> {
        self.script
            .borrow_mut()
            .endpoint
            .pop_front()
            .expect("unexpected endpoint prompt")
    }
}

pub const TEST_PREFIX: &str = "https://biocanvas.test/user";
pub const EXTERNAL_PREFIX: &str = "https://external.example/registry";

/// A canvas with scripted prompts and shortcuts for building fixtures.
pub struct TestCanvas {
    pub canvas: Canvas,
    pub prompts: ScriptedPrompts,
}

impl TestCanvas {
    pub fn new() -> TestCanvas {
        let prompts = ScriptedPrompts::new();
        let canvas = Canvas::new(TEST_PREFIX, Box::new(prompts.clone()));
        TestCanvas { canvas, prompts }
    }

    /// A strand in the current view with one feature per role.
    pub fn strand(&mut self, roles: &[&str]) -> CellId {
        let container = self
            .canvas
            .add_backbone(0.0, 0.0)
            .expect("add_backbone succeeds");
        for role in roles {
            self.canvas
                .drop_feature(container, role)
                .expect("drop_feature succeeds")
                .expect("no prompt expected");
        }
        container
    }

    /// A second instance of the same definition (shared values) next to the
    /// original, offset so the two don't overlap.
    pub fn alias(&mut self, cell: CellId) -> CellId {
        let parent = self.canvas.tree().parent_of(cell);
        let cells = self.canvas.clone_subtree(cell);
        self.canvas.begin_update();
        let alias = self.canvas.add_subtree(cells, parent, None);
        let geometry = self
            .canvas
            .tree()
            .get(alias)
            .map(|c| c.geometry.clone())
            .unwrap_or_default();
        self.canvas.set_geometry(
            alias,
            Rect {
                y: geometry.y + 200.0,
                ..geometry
            },
        );
        self.canvas.end_update();
        alias
    }

    /// The definition URI a cell references (or is, for view cells).
    pub fn value_of(&self, cell: CellId) -> Uri {
        let c = self.canvas.tree().get(cell).expect("cell exists");
        c.view_uri()
            .or_else(|| c.value())
            .cloned()
            .expect("cell references a definition")
    }

    /// The definition sequence of a strand's glyphs.
    pub fn feature_values(&self, container: CellId) -> Vec<Uri> {
        self.canvas
            .tree()
            .feature_children(container)
            .iter()
            .filter_map(|id| self.canvas.tree().get(*id).and_then(|c| c.value()).cloned())
            .collect()
    }

    /// Rewrites the definition referenced by `cell` to an external owner
    /// prefix, as if it had been imported from a registry.  Test setup only;
    /// not undoable.
    pub fn make_external(&mut self, cell: CellId) -> Uri {
        let uri = self.value_of(cell);
        let mut info = self
            .canvas
            .store
            .get(&uri)
            .expect("definition exists")
            .clone();
        info.set_uri_prefix(EXTERNAL_PREFIX);
        let new_uri = info.full_uri();

        self.canvas.store.remove_raw(&uri);
        self.canvas.store.put_raw(info);

        let referencing: Vec<CellId> = self
            .canvas
            .tree
            .iter()
            .filter(|c| c.value() == Some(&uri))
            .map(|c| c.id)
            .collect();
        for id in referencing {
            if let Some(c) = self.canvas.tree.get_mut(id) {
                match &mut c.kind {
                    CellKind::CircuitContainer { value }
                    | CellKind::SequenceFeature { value }
                    | CellKind::MolecularSpecies { value }
                    | CellKind::Module { value } => *value = new_uri.clone(),
                    _ => {}
                }
            }
        }
        if let Some(view) = self.canvas.tree.view_cell(&uri)
            && let Some(c) = self.canvas.tree.get_mut(view)
            && let CellKind::View { uri: u, .. } = &mut c.kind
        {
            *u = new_uri.clone();
        }

        // endpoint keys embed the definition URI
        let old_key_prefix = format!("{uri}_");
        let new_key_prefix = format!("{new_uri}_");
        let edges: Vec<CellId> = self
            .canvas
            .tree
            .iter()
            .filter(|c| c.is_interaction())
            .map(|c| c.id)
            .collect();
        for edge in edges {
            if let Some(c) = self.canvas.tree.get_mut(edge)
                && let CellKind::Interaction { info, .. } = &mut c.kind
            {
                for endpoint in [&mut info.from_uri, &mut info.to_uri] {
                    if let Some(key) = endpoint
                        && let Some(rest) = key.strip_prefix(&old_key_prefix)
                    {
                        *key = format!("{new_key_prefix}{rest}");
                    }
                }
            }
        }
        new_uri
    }

    /// The other members of a container's coupled set.
    pub fn coupled_others(&self, value: &Uri, exclude: CellId) -> Vec<CellId> {
        self.canvas
            .tree()
            .coupled_containers(value, false)
            .into_iter()
            .filter(|id| *id != exclude)
            .collect()
    }
}

impl Default for TestCanvas {
    fn default() -> Self {
        Self::new()
    }
}
