// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! XML round-trip and decode-repair behavior.

use biocanvas_engine::Canvas;
use biocanvas_engine::InteractionKind;
use biocanvas_engine::stencil::STYLE_CIRCUIT_CONTAINER;
use biocanvas_engine::testutils::{ScriptedPrompts, TEST_PREFIX, TestCanvas};

fn build_sample() -> TestCanvas {
    let mut t = TestCanvas::new();
    let a = t.strand(&["promoter", "cds"]);
    let _b = t.alias(a);
    let species = t.canvas.add_species(300.0, 100.0, "Protein").unwrap();
    t.canvas.add_module(400.0, 200.0).unwrap();
    let f = t.canvas.tree().feature_children(a)[0];
    t.canvas
        .add_interaction(InteractionKind::Stimulation, Some(f), Some(species))
        .unwrap()
        .unwrap();
    t.canvas.add_textbox(10.0, 10.0, "notes & things");
    t
}

#[test]
fn encode_decode_reproduces_tree_and_store() {
    let t = build_sample();
    let xml = t.canvas.to_xml().unwrap();
    let decoded = Canvas::from_xml(&xml, TEST_PREFIX, Box::new(ScriptedPrompts::new())).unwrap();

    assert_eq!(decoded.tree(), t.canvas.tree());
    assert_eq!(decoded.store(), t.canvas.store());
    assert_eq!(decoded.view_stack(), t.canvas.view_stack());
}

#[test]
fn repair_is_idempotent_and_only_fires_on_malformed_input() {
    // a legacy document: no backbone, zero-sized geometry, empty container
    // style, and a feature style carrying a stale role
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<biocanvas version="1.0" root="{p}/design">
  <entities>
    <component uri_prefix="{p}" display_id="c1" name="" part_role="" part_type="DNA region"/>
    <component uri_prefix="{p}" display_id="p1" name="" part_role="cds" part_type="DNA region"/>
    <module uri_prefix="{p}" display_id="design" name=""/>
  </entities>
  <view id="0" uri="{p}/design" kind="module">
    <container id="1" value="{p}/c1" x="20" y="30" width="0" height="0" style="">
      <feature id="2" value="{p}/p1" x="0" y="0" width="0" height="0" style="sequenceFeatureGlyphpromoter"/>
    </container>
  </view>
</biocanvas>"#,
        p = TEST_PREFIX
    );

    let decoded = Canvas::from_xml(&xml, TEST_PREFIX, Box::new(ScriptedPrompts::new())).unwrap();

    let root = decoded.view_stack()[0];
    let container = decoded.tree().children_of(root)[0];
    let container_cell = decoded.tree().get(container).unwrap();
    assert_eq!(container_cell.style, STYLE_CIRCUIT_CONTAINER);
    assert_eq!(container_cell.geometry.height, 100.0);
    assert_eq!(container_cell.geometry.x, 20.0, "placement survives repair");

    let backbone = decoded
        .tree()
        .backbone_of(container)
        .expect("the missing backbone is restored");
    assert_eq!(decoded.tree().children_of(container)[0], backbone);

    let feature = decoded.tree().feature_children(container)[0];
    let feature_cell = decoded.tree().get(feature).unwrap();
    assert_eq!(
        feature_cell.style, "sequenceFeatureGlyphcds",
        "style is re-derived from the record's role"
    );
    assert_eq!(feature_cell.geometry.width, 50.0);
    assert_eq!(feature_cell.geometry.height, 100.0);

    // decoding the repaired document again changes nothing further
    let xml2 = decoded.to_xml().unwrap();
    let decoded2 = Canvas::from_xml(&xml2, TEST_PREFIX, Box::new(ScriptedPrompts::new())).unwrap();
    assert_eq!(decoded2.tree(), decoded.tree());
    assert_eq!(decoded2.store(), decoded.store());
}

#[test]
fn well_formed_documents_are_untouched_by_repair() {
    let t = build_sample();
    let xml = t.canvas.to_xml().unwrap();
    let once = Canvas::from_xml(&xml, TEST_PREFIX, Box::new(ScriptedPrompts::new())).unwrap();
    let twice = Canvas::from_xml(
        &once.to_xml().unwrap(),
        TEST_PREFIX,
        Box::new(ScriptedPrompts::new()),
    )
    .unwrap();
    assert_eq!(twice.tree(), once.tree());
    assert_eq!(twice.store(), once.store());
}
