// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! XML round-trip for the cell tree and entity store.
//!
//! Decoding runs a compatibility pass that repairs missing or zero-sized
//! geometry and re-derives a cell's style from its referenced entity when
//! the stored style disagrees.  The repair is idempotent and only activates
//! on detectably malformed input; legacy documents with no geometry at all
//! decode to something usable.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Deserialize;

use crate::canvas::Canvas;
use crate::common::{Error, ErrorCode, ErrorKind, Result, Uri};
use crate::datamodel::{
    ComponentInfo, DEFAULT_MODULE_HEIGHT, DEFAULT_MODULE_WIDTH, DEFAULT_TEXT_HEIGHT,
    DEFAULT_TEXT_WIDTH, Info, InteractionInfo, InteractionKind, MOLECULAR_SPECIES_HEIGHT,
    MOLECULAR_SPECIES_WIDTH, ModuleInfo, Rect, SEQUENCE_FEATURE_HEIGHT, SEQUENCE_FEATURE_WIDTH,
};
use crate::prompts::PromptPort;
use crate::stencil::{
    self, STYLE_BACKBONE, STYLE_CIRCUIT_CONTAINER, STYLE_MODULE, STYLE_MOLECULAR_SPECIES,
    STYLE_SEQUENCE_FEATURE, STYLE_TEXTBOX, Stencils,
};
use crate::store::EntityStore;
use crate::tree::{Cell, CellId, CellKind, CellTree, ViewKind};

const FORMAT_VERSION: &str = "1.0";

type XmlWriter = Cursor<Vec<u8>>;

fn xml_err(err: impl std::fmt::Display) -> Error {
    Error::new(
        ErrorKind::Serialization,
        ErrorCode::XmlDeserialization,
        Some(format!("{err}")),
    )
}

fn write_err(err: impl std::fmt::Display) -> Error {
    Error::new(
        ErrorKind::Serialization,
        ErrorCode::Generic,
        Some(format!("{err}")),
    )
}

// --- document model (decode side) -------------------------------------------

#[derive(Deserialize)]
struct XFile {
    #[serde(rename = "@version", default)]
    #[allow(dead_code)]
    version: String,
    #[serde(rename = "@root", default)]
    root: String,
    #[serde(default)]
    entities: XEntities,
    #[serde(rename = "view", default)]
    views: Vec<XView>,
}

#[derive(Deserialize, Default)]
struct XEntities {
    #[serde(rename = "component", default)]
    components: Vec<XComponent>,
    #[serde(rename = "module", default)]
    modules: Vec<XModule>,
}

#[derive(Deserialize)]
struct XComponent {
    #[serde(rename = "@uri_prefix", default)]
    uri_prefix: String,
    #[serde(rename = "@display_id", default)]
    display_id: String,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@part_role", default)]
    part_role: String,
    #[serde(rename = "@part_type", default)]
    part_type: String,
}

#[derive(Deserialize)]
struct XModule {
    #[serde(rename = "@uri_prefix", default)]
    uri_prefix: String,
    #[serde(rename = "@display_id", default)]
    display_id: String,
    #[serde(rename = "@name", default)]
    name: String,
}

#[derive(Deserialize)]
struct XView {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@uri", default)]
    uri: String,
    #[serde(rename = "@kind", default)]
    kind: String,
    // document order of heterogeneous children is significant: it is the
    // tree's child order
    #[serde(rename = "$value", default)]
    children: Vec<XViewChild>,
}

#[derive(Deserialize)]
enum XViewChild {
    #[serde(rename = "container")]
    Container(XContainer),
    #[serde(rename = "species")]
    Species(XGlyph),
    #[serde(rename = "module")]
    Module(XGlyph),
    #[serde(rename = "interaction")]
    Interaction(XInteraction),
    #[serde(rename = "text")]
    Text(XText),
}

#[derive(Deserialize)]
struct XContainer {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@value", default)]
    value: String,
    #[serde(rename = "@x", default)]
    x: f64,
    #[serde(rename = "@y", default)]
    y: f64,
    #[serde(rename = "@width", default)]
    width: f64,
    #[serde(rename = "@height", default)]
    height: f64,
    #[serde(rename = "@style", default)]
    style: String,
    #[serde(rename = "$value", default)]
    children: Vec<XContainerChild>,
}

#[derive(Deserialize)]
enum XContainerChild {
    #[serde(rename = "backbone")]
    Backbone(XGlyph),
    #[serde(rename = "feature")]
    Feature(XGlyph),
    #[serde(rename = "species")]
    Species(XGlyph),
}

#[derive(Deserialize)]
struct XGlyph {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@value", default)]
    value: String,
    #[serde(rename = "@x", default)]
    x: f64,
    #[serde(rename = "@y", default)]
    y: f64,
    #[serde(rename = "@width", default)]
    width: f64,
    #[serde(rename = "@height", default)]
    height: f64,
    #[serde(rename = "@style", default)]
    style: String,
}

#[derive(Deserialize)]
struct XInteraction {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@display_id", default)]
    display_id: String,
    #[serde(rename = "@uri_prefix", default)]
    uri_prefix: String,
    #[serde(rename = "@kind", default)]
    kind: String,
    #[serde(rename = "@from")]
    from: Option<String>,
    #[serde(rename = "@to")]
    to: Option<String>,
    #[serde(rename = "@source")]
    source: Option<u32>,
    #[serde(rename = "@target")]
    target: Option<u32>,
    #[serde(rename = "@style", default)]
    style: String,
}

#[derive(Deserialize)]
struct XText {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@x", default)]
    x: f64,
    #[serde(rename = "@y", default)]
    y: f64,
    #[serde(rename = "@width", default)]
    width: f64,
    #[serde(rename = "@height", default)]
    height: f64,
    #[serde(rename = "@style", default)]
    style: String,
    #[serde(rename = "$text", default)]
    content: String,
}

// --- writer helpers (encode side) -------------------------------------------

fn write_start(writer: &mut Writer<XmlWriter>, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    for (name, value) in attrs {
        elem.push_attribute((*name, *value));
    }
    writer
        .write_event(Event::Start(elem))
        .map_err(write_err)
}

fn write_empty(writer: &mut Writer<XmlWriter>, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    for (name, value) in attrs {
        elem.push_attribute((*name, *value));
    }
    writer
        .write_event(Event::Empty(elem))
        .map_err(write_err)
}

fn write_end(writer: &mut Writer<XmlWriter>, tag: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(write_err)
}

fn fmt_f64(value: f64) -> String {
    format!("{value}")
}

fn geometry_attrs(geometry: &Rect) -> [(String, String); 4] {
    [
        ("x".to_string(), fmt_f64(geometry.x)),
        ("y".to_string(), fmt_f64(geometry.y)),
        ("width".to_string(), fmt_f64(geometry.width)),
        ("height".to_string(), fmt_f64(geometry.height)),
    ]
}

fn glyph_attrs(cell: &Cell) -> Vec<(String, String)> {
    let mut attrs = vec![("id".to_string(), cell.id.to_string())];
    if let Some(value) = cell.value() {
        attrs.push(("value".to_string(), value.to_string()));
    }
    attrs.extend(geometry_attrs(&cell.geometry));
    attrs.push(("style".to_string(), cell.style.clone()));
    attrs
}

fn write_owned(writer: &mut Writer<XmlWriter>, tag: &str, attrs: &[(String, String)]) -> Result<()> {
    let borrowed: Vec<(&str, &str)> = attrs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    write_empty(writer, tag, &borrowed)
}

impl Canvas {
    /// Encodes the tree and store to the XML document format.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_err)?;

        let root_uri = self
            .tree()
            .get(self.view_stack()[0])
            .and_then(|c| c.view_uri())
            .map(|u| u.to_string())
            .unwrap_or_default();
        write_start(
            &mut writer,
            "biocanvas",
            &[("version", FORMAT_VERSION), ("root", root_uri.as_str())],
        )?;

        write_start(&mut writer, "entities", &[])?;
        for (_, info) in self.store().iter() {
            match info {
                Info::Component(info) => write_empty(
                    &mut writer,
                    "component",
                    &[
                        ("uri_prefix", info.uri_prefix.as_str()),
                        ("display_id", info.display_id.as_str()),
                        ("name", info.name.as_str()),
                        ("part_role", info.part_role.as_str()),
                        ("part_type", info.part_type.as_str()),
                    ],
                )?,
                Info::Module(info) => write_empty(
                    &mut writer,
                    "module",
                    &[
                        ("uri_prefix", info.uri_prefix.as_str()),
                        ("display_id", info.display_id.as_str()),
                        ("name", info.name.as_str()),
                    ],
                )?,
                // interaction records ride along on their edges
                Info::Interaction(_) => {}
            }
        }
        write_end(&mut writer, "entities")?;

        for root in self.tree().roots() {
            let Some(view) = self.tree().get(*root) else {
                continue;
            };
            let kind = if view.is_component_view() {
                "component"
            } else {
                "module"
            };
            let uri = view
                .view_uri()
                .map(|u| u.to_string())
                .unwrap_or_default();
            let id = view.id.to_string();
            write_start(
                &mut writer,
                "view",
                &[("id", id.as_str()), ("uri", uri.as_str()), ("kind", kind)],
            )?;
            self.write_view_children(&mut writer, *root)?;
            write_end(&mut writer, "view")?;
        }

        write_end(&mut writer, "biocanvas")?;
        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(write_err)
    }

    fn write_view_children(&self, writer: &mut Writer<XmlWriter>, view: CellId) -> Result<()> {
        for child in self.tree().children_of(view) {
            let Some(cell) = self.tree().get(*child) else {
                continue;
            };
            match &cell.kind {
                CellKind::CircuitContainer { .. } => {
                    let attrs = glyph_attrs(cell);
                    let borrowed: Vec<(&str, &str)> = attrs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect();
                    write_start(writer, "container", &borrowed)?;
                    for gc in self.tree().children_of(*child) {
                        let Some(grandchild) = self.tree().get(*gc) else {
                            continue;
                        };
                        match &grandchild.kind {
                            CellKind::Backbone => {
                                write_owned(writer, "backbone", &glyph_attrs(grandchild))?
                            }
                            CellKind::SequenceFeature { .. } => {
                                write_owned(writer, "feature", &glyph_attrs(grandchild))?
                            }
                            CellKind::MolecularSpecies { .. } => {
                                write_owned(writer, "species", &glyph_attrs(grandchild))?
                            }
                            _ => {}
                        }
                    }
                    write_end(writer, "container")?;
                }
                CellKind::MolecularSpecies { .. } => {
                    write_owned(writer, "species", &glyph_attrs(cell))?
                }
                CellKind::Module { .. } => write_owned(writer, "module", &glyph_attrs(cell))?,
                CellKind::Interaction {
                    info,
                    source,
                    target,
                } => {
                    let mut attrs = vec![
                        ("id".to_string(), cell.id.to_string()),
                        ("display_id".to_string(), info.display_id.clone()),
                        ("uri_prefix".to_string(), info.uri_prefix.clone()),
                        ("kind".to_string(), info.kind.as_str().to_string()),
                    ];
                    if let Some(from) = &info.from_uri {
                        attrs.push(("from".to_string(), from.clone()));
                    }
                    if let Some(to) = &info.to_uri {
                        attrs.push(("to".to_string(), to.clone()));
                    }
                    if let Some(source) = source {
                        attrs.push(("source".to_string(), source.to_string()));
                    }
                    if let Some(target) = target {
                        attrs.push(("target".to_string(), target.to_string()));
                    }
                    attrs.push(("style".to_string(), cell.style.clone()));
                    write_owned(writer, "interaction", &attrs)?;
                }
                CellKind::TextBox { text } => {
                    let mut attrs = vec![("id".to_string(), cell.id.to_string())];
                    attrs.extend(geometry_attrs(&cell.geometry));
                    attrs.push(("style".to_string(), cell.style.clone()));
                    let borrowed: Vec<(&str, &str)> = attrs
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect();
                    write_start(writer, "text", &borrowed)?;
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(write_err)?;
                    write_end(writer, "text")?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Decodes a document, rebuilding the tree and store, then runs the
    /// compatibility repair pass.
    pub fn from_xml(
        xml: &str,
        local_prefix: &str,
        prompts: Box<dyn PromptPort>,
    ) -> Result<Canvas> {
        let file: XFile = quick_xml::de::from_str(xml).map_err(xml_err)?;

        let mut tree = CellTree::new();
        let mut store = EntityStore::new();

        for c in &file.entities.components {
            store.put_raw(Info::Component(ComponentInfo {
                display_id: c.display_id.clone(),
                name: c.name.clone(),
                part_role: c.part_role.clone(),
                part_type: c.part_type.clone(),
                uri_prefix: c.uri_prefix.clone(),
            }));
        }
        for m in &file.entities.modules {
            store.put_raw(Info::Module(ModuleInfo {
                display_id: m.display_id.clone(),
                name: m.name.clone(),
                uri_prefix: m.uri_prefix.clone(),
            }));
        }

        // pass 1: every cell, in document order; edge terminals stay
        // unresolved until all vertices exist
        let mut terminal_fixups: Vec<(CellId, Option<u32>, Option<u32>)> = Vec::new();
        for view in &file.views {
            let view_id = CellId(view.id);
            let view_kind = if view.kind == "component" {
                ViewKind::Component
            } else {
                ViewKind::Module
            };
            let style = if view_kind == ViewKind::Component {
                stencil::STYLE_COMPONENT_VIEW
            } else {
                stencil::STYLE_MODULE_VIEW
            };
            tree.insert_raw(Cell::new(
                view_id,
                CellKind::View {
                    uri: Uri::from(view.uri.clone()),
                    kind: view_kind,
                },
                Rect::default(),
                style,
            ));
            tree.attach_child(None, view_id, usize::MAX);

            for child in &view.children {
                match child {
                    XViewChild::Container(container) => {
                        let container_id = CellId(container.id);
                        tree.insert_raw(Cell::new(
                            container_id,
                            CellKind::CircuitContainer {
                                value: Uri::from(container.value.clone()),
                            },
                            Rect::new(container.x, container.y, container.width, container.height),
                            &container.style,
                        ));
                        tree.attach_child(Some(view_id), container_id, usize::MAX);

                        for grandchild in &container.children {
                            let (glyph, kind) = match grandchild {
                                XContainerChild::Backbone(glyph) => (glyph, CellKind::Backbone),
                                XContainerChild::Feature(glyph) => (
                                    glyph,
                                    CellKind::SequenceFeature {
                                        value: Uri::from(glyph.value.clone()),
                                    },
                                ),
                                XContainerChild::Species(glyph) => (
                                    glyph,
                                    CellKind::MolecularSpecies {
                                        value: Uri::from(glyph.value.clone()),
                                    },
                                ),
                            };
                            let id = CellId(glyph.id);
                            tree.insert_raw(Cell::new(
                                id,
                                kind,
                                Rect::new(glyph.x, glyph.y, glyph.width, glyph.height),
                                &glyph.style,
                            ));
                            tree.attach_child(Some(container_id), id, usize::MAX);
                        }
                    }
                    XViewChild::Species(glyph) => {
                        let id = CellId(glyph.id);
                        tree.insert_raw(Cell::new(
                            id,
                            CellKind::MolecularSpecies {
                                value: Uri::from(glyph.value.clone()),
                            },
                            Rect::new(glyph.x, glyph.y, glyph.width, glyph.height),
                            &glyph.style,
                        ));
                        tree.attach_child(Some(view_id), id, usize::MAX);
                    }
                    XViewChild::Module(glyph) => {
                        let id = CellId(glyph.id);
                        tree.insert_raw(Cell::new(
                            id,
                            CellKind::Module {
                                value: Uri::from(glyph.value.clone()),
                            },
                            Rect::new(glyph.x, glyph.y, glyph.width, glyph.height),
                            &glyph.style,
                        ));
                        tree.attach_child(Some(view_id), id, usize::MAX);
                    }
                    XViewChild::Interaction(interaction) => {
                        let id = CellId(interaction.id);
                        let kind = InteractionKind::parse(&interaction.kind)
                            .unwrap_or(InteractionKind::Process);
                        let mut info = InteractionInfo::new(
                            &interaction.uri_prefix,
                            &interaction.display_id,
                            kind,
                        );
                        info.from_uri = interaction.from.clone();
                        info.to_uri = interaction.to.clone();
                        store.put_raw(Info::Interaction(info.clone()));

                        tree.insert_raw(Cell::new(
                            id,
                            CellKind::Interaction {
                                info,
                                source: None,
                                target: None,
                            },
                            Rect::default(),
                            &interaction.style,
                        ));
                        tree.attach_child(Some(view_id), id, usize::MAX);
                        terminal_fixups.push((id, interaction.source, interaction.target));
                    }
                    XViewChild::Text(text) => {
                        let id = CellId(text.id);
                        tree.insert_raw(Cell::new(
                            id,
                            CellKind::TextBox {
                                text: text.content.clone(),
                            },
                            Rect::new(text.x, text.y, text.width, text.height),
                            &text.style,
                        ));
                        tree.attach_child(Some(view_id), id, usize::MAX);
                    }
                }
            }
        }

        // pass 2: terminals, now that every id resolves
        for (edge, source, target) in terminal_fixups {
            let source = source.map(CellId).filter(|t| tree.contains(*t));
            let target = target.map(CellId).filter(|t| tree.contains(*t));
            if let Some(cell) = tree.get_mut(edge)
                && let CellKind::Interaction {
                    source: src,
                    target: tgt,
                    ..
                } = &mut cell.kind
            {
                *src = source;
                *tgt = target;
            }
        }

        let stencils = Stencils::builtin();
        repair(&mut tree, &store, &stencils);

        let root_view = tree
            .view_cell(&Uri::from(file.root.clone()))
            .or_else(|| tree.roots().first().copied())
            .ok_or_else(|| xml_err("document has no views"))?;

        Ok(Canvas::from_parts(
            tree,
            store,
            root_view,
            local_prefix,
            prompts,
        ))
    }
}

/// The decode-time compatibility pass.  Running it twice yields no further
/// change.
pub(crate) fn repair(tree: &mut CellTree, store: &EntityStore, stencils: &Stencils) {
    let ids: Vec<CellId> = tree.iter().map(|c| c.id).collect();
    for id in ids {
        let (geometry_fix, style_fix) = {
            let Some(cell) = tree.get(id) else {
                continue;
            };
            repair_for(cell, store, stencils)
        };
        if let Some(cell) = tree.get_mut(id) {
            if let Some(geometry) = geometry_fix {
                cell.geometry = geometry;
            }
            if let Some(style) = style_fix {
                cell.style = style;
            }
        }
    }

    // a decoded strand without its backbone gets one back
    let containers: Vec<CellId> = tree
        .iter()
        .filter(|c| c.is_circuit_container())
        .map(|c| c.id)
        .collect();
    for container in containers {
        if tree.backbone_of(container).is_none() {
            let id = tree.alloc_id();
            let mut backbone = Cell::new(
                id,
                CellKind::Backbone,
                Rect::new(
                    0.0,
                    SEQUENCE_FEATURE_HEIGHT / 2.0,
                    SEQUENCE_FEATURE_WIDTH,
                    crate::datamodel::BACKBONE_HEIGHT,
                ),
                STYLE_BACKBONE,
            );
            backbone.parent = Some(container);
            tree.insert_raw(backbone);
            tree.attach_child(Some(container), id, 0);
        }
    }

    // a strand's glyph order must match its geometry order, and its backbone
    // must come first
    let containers: Vec<CellId> = tree
        .iter()
        .filter(|c| c.is_circuit_container())
        .map(|c| c.id)
        .collect();
    for container in containers {
        let mut features = tree.feature_children(container);
        features.sort_by(|a, b| {
            let ax = tree.get(*a).map(|c| c.geometry.x).unwrap_or(0.0);
            let bx = tree.get(*b).map(|c| c.geometry.x).unwrap_or(0.0);
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        });
        for (i, id) in features.iter().enumerate() {
            tree.reorder_child(container, *id, i + 1);
        }
        if let Some(backbone) = tree.backbone_of(container) {
            tree.reorder_child(container, backbone, 0);
        }
    }
}

fn repair_for(
    cell: &Cell,
    store: &EntityStore,
    stencils: &Stencils,
) -> (Option<Rect>, Option<String>) {
    let mut geometry = None;
    let mut style = None;

    match &cell.kind {
        CellKind::SequenceFeature { value } => {
            let record = store.get(value).and_then(|i| i.as_component());
            let role = record.map(|r| r.part_role.as_str()).unwrap_or("");
            let malformed = cell.style.is_empty()
                || cell.geometry.height == 0.0
                || (cell.style.contains(STYLE_SEQUENCE_FEATURE)
                    && !role.is_empty()
                    && !cell.style.contains(role));
            if malformed {
                let mut g = cell.geometry.clone();
                if g.width == 0.0 {
                    g.width = SEQUENCE_FEATURE_WIDTH;
                }
                if g.height == 0.0 {
                    g.height = SEQUENCE_FEATURE_HEIGHT;
                }
                geometry = Some(g);
                style = Some(stencils.sequence_feature_style(role));
            }
        }
        CellKind::MolecularSpecies { value } => {
            let record = store.get(value).and_then(|i| i.as_component());
            let bare = cell.style == STYLE_MOLECULAR_SPECIES
                || cell.style.starts_with(&format!("{STYLE_MOLECULAR_SPECIES};"));
            let malformed = cell.style.is_empty() || cell.geometry.height == 0.0 || bare;
            if malformed {
                let shape = record
                    .map(|r| stencil::molecule_type_to_shape(&r.part_type))
                    .unwrap_or(stencil::NO_GLYPH_ASSIGNED_SPECIES);
                geometry = Some(Rect {
                    width: MOLECULAR_SPECIES_WIDTH,
                    height: MOLECULAR_SPECIES_HEIGHT,
                    ..cell.geometry.clone()
                });
                style = Some(stencils.molecular_species_style(shape));
            }
        }
        CellKind::Interaction { info, .. } => {
            if cell.style.is_empty() {
                style = Some(stencil::interaction_style(info.kind));
            }
        }
        CellKind::Module { .. } => {
            if cell.geometry.height == 0.0 {
                geometry = Some(Rect {
                    width: DEFAULT_MODULE_WIDTH,
                    height: DEFAULT_MODULE_HEIGHT,
                    ..cell.geometry.clone()
                });
            }
            if cell.style.is_empty() {
                style = Some(STYLE_MODULE.to_string());
            }
        }
        CellKind::CircuitContainer { .. } => {
            if cell.geometry.height == 0.0 {
                geometry = Some(Rect {
                    height: SEQUENCE_FEATURE_HEIGHT,
                    ..cell.geometry.clone()
                });
            }
            if cell.style.is_empty() {
                style = Some(STYLE_CIRCUIT_CONTAINER.to_string());
            }
        }
        CellKind::Backbone => {
            if cell.style.is_empty() {
                style = Some(STYLE_BACKBONE.to_string());
            }
        }
        CellKind::TextBox { .. } => {
            if cell.geometry.height == 0.0 {
                geometry = Some(Rect {
                    width: DEFAULT_TEXT_WIDTH,
                    height: DEFAULT_TEXT_HEIGHT,
                    ..cell.geometry.clone()
                });
            }
            if cell.style.is_empty() {
                style = Some(STYLE_TEXTBOX.to_string());
            }
        }
        CellKind::View { .. } => {}
    }

    (geometry, style)
}
