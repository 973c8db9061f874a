// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! End-to-end properties of the consistency subsystem: acyclicity,
//! coupling/decoupling, ownership, and rollback completeness.

use biocanvas_engine::datamodel::{ComponentInfo, Info};
use biocanvas_engine::edits::EditOutcome;
use biocanvas_engine::prompts::{CoupleChoice, DecoupleChoice};
use biocanvas_engine::testutils::{TEST_PREFIX, TestCanvas};
use biocanvas_engine::{CellTree, EntityStore, ErrorCode};

use proptest::prelude::*;

fn snapshot(t: &TestCanvas) -> (CellTree, EntityStore) {
    (t.canvas.tree().clone(), t.canvas.store().clone())
}

fn component(display_id: &str) -> ComponentInfo {
    ComponentInfo::new(TEST_PREFIX, display_id)
}

#[test]
fn self_reference_is_rejected_upward() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter"]);
    let f = t.canvas.tree().feature_children(a)[0];
    let f_uri = t.value_of(f);

    // inside f's definition, a nested feature g
    t.canvas.enter_cell(f).unwrap();
    let view = t.canvas.current_root();
    let inner = t.canvas.tree().children_of(view)[0];
    let g = t.canvas.drop_feature(inner, "cds").unwrap().unwrap();

    let before = snapshot(&t);
    // pointing g at its own enclosing definition would close a loop
    let err = t
        .canvas
        .retarget(g, Info::Component(component(f_uri.display_id())))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CircularReference);
    assert_eq!(snapshot(&t), before, "a rejected retarget mutates nothing");
}

#[test]
fn substructure_cycle_is_rejected_downward() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter"]);
    let f = t.canvas.tree().feature_children(a)[0];

    t.canvas.enter_cell(f).unwrap();
    let view = t.canvas.current_root();
    let inner = t.canvas.tree().children_of(view)[0];
    let g = t.canvas.drop_feature(inner, "cds").unwrap().unwrap();
    let g_uri = t.value_of(g);

    let before = snapshot(&t);
    // retargeting f's own definition onto g, keeping f's substructure,
    // would put g's definition inside itself
    t.prompts.expect_couple(Some(CoupleChoice::Keep));
    let err = t
        .canvas
        .retarget(inner, Info::Component(component(g_uri.display_id())))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CircularReference);
    assert_eq!(snapshot(&t), before);
}

#[test]
fn entity_kind_conflict_aborts() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter"]);
    let f = t.canvas.tree().feature_children(a)[0];
    let module = t.canvas.add_module(200.0, 200.0).unwrap();
    let module_uri = t.value_of(module);

    let before = snapshot(&t);
    let err = t
        .canvas
        .retarget(f, Info::Component(component(module_uri.display_id())))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EntityKindConflict);
    assert_eq!(snapshot(&t), before);
}

#[test]
fn name_only_edit_leaves_coupled_instances_alone() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter", "cds"]);
    let _b = t.alias(a);
    let u1 = t.value_of(a);

    let mut info = t
        .canvas
        .store()
        .get(&u1)
        .unwrap()
        .as_component()
        .unwrap()
        .clone();
    info.name = "renamed".to_string();

    let outcome = t.canvas.retarget(a, Info::Component(info)).unwrap();
    assert_eq!(outcome, EditOutcome::Committed);

    // both instances still reference u1, record updated in place
    assert_eq!(t.canvas.tree().coupled_containers(&u1, false).len(), 2);
    let record = t.canvas.store().get(&u1).unwrap().as_component().unwrap();
    assert_eq!(record.name, "renamed");
}

#[test]
fn lone_alias_keeps_its_identity_on_retarget() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter", "cds"]);
    let b = t.alias(a);
    let u1 = t.value_of(a);
    let b_values = t.feature_values(b);

    // u2 is unused: no conflict, and with a single other coupled member no
    // prompt fires
    let outcome = t
        .canvas
        .retarget(a, Info::Component(component("u2part")))
        .unwrap();
    assert_eq!(outcome, EditOutcome::Committed);

    let u2 = t.value_of(a);
    assert_ne!(u2, u1);
    assert!(t.canvas.store().get(&u2).is_some(), "fresh record for u2");
    assert!(t.canvas.store().get(&u1).is_some(), "u1 still in use by b");
    assert_eq!(t.value_of(b), u1);
    assert_eq!(t.feature_values(b), b_values);
}

#[test]
fn declined_decouple_prompt_rolls_back() {
    let mut t = TestCanvas::new();
    let c = t.canvas.add_species(0.0, 0.0, "Protein").unwrap();
    let _d = t.alias(c);

    let before = snapshot(&t);
    t.prompts.expect_decouple(None);
    let outcome = t
        .canvas
        .retarget(c, Info::Component(component("fresh")))
        .unwrap();
    assert_eq!(outcome, EditOutcome::RolledBack);
    assert_eq!(snapshot(&t), before, "a dismissed prompt has zero net effect");
}

#[test]
fn decouple_leaves_the_other_instance_untouched() {
    let mut t = TestCanvas::new();
    let c = t.canvas.add_species(0.0, 0.0, "Protein").unwrap();
    let d = t.alias(c);
    let u = t.value_of(c);

    t.prompts.expect_decouple(Some(DecoupleChoice::Decouple));
    let outcome = t
        .canvas
        .retarget(c, Info::Component(component("fresh")))
        .unwrap();
    assert_eq!(outcome, EditOutcome::Committed);

    assert_ne!(t.value_of(c), u);
    assert_eq!(t.value_of(d), u, "d keeps the shared identity");
    assert!(t.canvas.store().get(&u).is_some());
    assert!(t.canvas.store().get(&t.value_of(c)).is_some());
}

#[test]
fn keeping_coupled_rewrites_every_instance() {
    let mut t = TestCanvas::new();
    let c = t.canvas.add_species(0.0, 0.0, "Protein").unwrap();
    let d = t.alias(c);
    let u = t.value_of(c);

    t.prompts.expect_decouple(Some(DecoupleChoice::KeepCoupled));
    let outcome = t
        .canvas
        .retarget(c, Info::Component(component("fresh")))
        .unwrap();
    assert_eq!(outcome, EditOutcome::Committed);

    assert_eq!(t.value_of(c), t.value_of(d));
    assert_ne!(t.value_of(c), u);
    assert!(t.canvas.store().get(&u).is_none(), "the old record is retired");
}

#[test]
fn coupled_instances_keep_their_interaction_keys_on_retarget() {
    let mut t = TestCanvas::new();
    let c = t.canvas.add_species(0.0, 0.0, "Protein").unwrap();
    let d = t.alias(c);
    let u = t.value_of(c);
    let other = t.canvas.add_species(200.0, 0.0, "Protein").unwrap();
    let edge = t
        .canvas
        .add_interaction(
            biocanvas_engine::InteractionKind::Control,
            Some(d),
            Some(other),
        )
        .unwrap()
        .unwrap();

    t.prompts.expect_decouple(Some(DecoupleChoice::KeepCoupled));
    t.canvas
        .retarget(c, Info::Component(component("fresh")))
        .unwrap();

    // d was rewritten along with c, and the edge key embedding d follows
    let new_uri = t.value_of(d);
    assert!(t.canvas.store().get(&u).is_none());
    let info = t
        .canvas
        .tree()
        .get(edge)
        .unwrap()
        .interaction_info()
        .unwrap()
        .clone();
    assert_eq!(info.from_uri.unwrap(), format!("{new_uri}_{d}"));
}

#[test]
fn module_endpoints_resolve_through_a_chosen_inner_part() {
    let mut t = TestCanvas::new();
    let species = t.canvas.add_species(0.0, 0.0, "Protein").unwrap();
    let module = t.canvas.add_module(200.0, 0.0).unwrap();
    t.canvas.enter_cell(module).unwrap();
    let inner = t.canvas.add_species(10.0, 10.0, "Protein").unwrap();
    let inner_uri = t.value_of(inner);
    t.canvas.exit_view();

    // a cancelled endpoint choice draws nothing
    let before = snapshot(&t);
    t.prompts.expect_endpoint(None);
    let cancelled = t
        .canvas
        .add_interaction(
            biocanvas_engine::InteractionKind::Stimulation,
            Some(species),
            Some(module),
        )
        .unwrap();
    assert!(cancelled.is_none());
    assert_eq!(snapshot(&t), before);

    t.prompts.expect_endpoint(Some(0));
    let edge = t
        .canvas
        .add_interaction(
            biocanvas_engine::InteractionKind::Stimulation,
            Some(species),
            Some(module),
        )
        .unwrap()
        .unwrap();
    let info = t
        .canvas
        .tree()
        .get(edge)
        .unwrap()
        .interaction_info()
        .unwrap()
        .clone();
    assert_eq!(info.to_uri.unwrap(), format!("{inner_uri}_{inner}"));
}

#[test]
fn retarget_is_atomically_undoable() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter"]);
    let f = t.canvas.tree().feature_children(a)[0];

    let before = snapshot(&t);
    t.canvas
        .retarget(f, Info::Component(component("renamed_part")))
        .unwrap();
    let after = snapshot(&t);
    assert_ne!(before, after);

    assert!(t.canvas.undo());
    assert_eq!(snapshot(&t), before);
    assert!(t.canvas.redo());
    assert_eq!(snapshot(&t), after);
}

#[test]
fn delete_drops_unreferenced_definitions() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter", "cds"]);
    let features = t.canvas.tree().feature_children(a);
    let f_uri = t.value_of(features[0]);

    t.canvas.delete_cells(&[features[0]]).unwrap();

    assert_eq!(t.canvas.tree().feature_children(a).len(), 1);
    assert!(
        t.canvas.store().get(&f_uri).is_none(),
        "the deleted glyph's definition is gone with its last instance"
    );
    assert!(t.canvas.tree().view_cell(&f_uri).is_none());
}

#[test]
fn interaction_endpoints_follow_ownership_rekeying() {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter"]);
    let f = t.canvas.tree().feature_children(a)[0];
    let species = t.canvas.add_species(300.0, 0.0, "Protein").unwrap();
    let edge = t
        .canvas
        .add_interaction(
            biocanvas_engine::InteractionKind::Inhibition,
            Some(f),
            Some(species),
        )
        .unwrap()
        .unwrap();

    let ext_uri = t.make_external(f);
    t.canvas.take_ownership(&ext_uri, false);

    let new_uri = t.value_of(f);
    assert!(new_uri.has_prefix(TEST_PREFIX));
    let info = t
        .canvas
        .tree()
        .get(edge)
        .unwrap()
        .interaction_info()
        .unwrap()
        .clone();
    assert_eq!(info.from_uri.unwrap(), format!("{new_uri}_{f}"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // every committed transaction inverts exactly: unwinding the whole undo
    // stack restores the freshly created canvas
    #[test]
    fn undo_unwinds_any_edit_sequence(ops in proptest::collection::vec(0u8..3u8, 1..10)) {
        let mut t = TestCanvas::new();
        let baseline = snapshot(&t);

        for (i, op) in ops.iter().enumerate() {
            match op {
                0 => {
                    t.canvas.add_backbone(50.0 * i as f64, 120.0 * i as f64).unwrap();
                }
                1 => {
                    let root = t.canvas.current_root();
                    let container = t
                        .canvas
                        .tree()
                        .children_of(root)
                        .iter()
                        .copied()
                        .find(|id| {
                            t.canvas.tree().get(*id).is_some_and(|c| c.is_circuit_container())
                        });
                    if let Some(container) = container {
                        t.canvas.drop_feature(container, "promoter").unwrap().unwrap();
                    }
                }
                _ => {
                    let root = t.canvas.current_root();
                    let feature = t
                        .canvas
                        .tree()
                        .children_of(root)
                        .iter()
                        .flat_map(|id| t.canvas.tree().feature_children(*id))
                        .next();
                    if let Some(feature) = feature {
                        t.canvas.move_cells(&[feature], 10.0, 0.0).unwrap();
                    }
                }
            }
        }

        while t.canvas.undo() {}
        prop_assert_eq!(snapshot(&t), baseline);
    }
}
