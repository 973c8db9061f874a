// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::common::Uri;

pub const SEQUENCE_FEATURE_WIDTH: f64 = 50.0;
pub const SEQUENCE_FEATURE_HEIGHT: f64 = 100.0;

pub const MOLECULAR_SPECIES_WIDTH: f64 = 50.0;
pub const MOLECULAR_SPECIES_HEIGHT: f64 = 50.0;

pub const DEFAULT_TEXT_WIDTH: f64 = 120.0;
pub const DEFAULT_TEXT_HEIGHT: f64 = 80.0;

pub const DEFAULT_MODULE_WIDTH: f64 = 120.0;
pub const DEFAULT_MODULE_HEIGHT: f64 = 50.0;

/// The backbone is drawn as a line; any non-zero height works.
pub const BACKBONE_HEIGHT: f64 = 1.0;

/// How far a dragged feature may stray from its strand before it is
/// considered pulled off onto empty canvas.
pub const MOVE_OVERLAP_PADDING: f64 = 30.0;

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }

    /// Whether `other` overlaps this rect grown by `padding` on every side.
    pub fn overlaps(&self, other: &Rect, padding: f64) -> bool {
        let xmin1 = self.x - padding;
        let ymin1 = self.y - padding;
        let xmax1 = self.x + self.width + padding;
        let ymax1 = self.y + self.height + padding;
        let xmin2 = other.x;
        let ymin2 = other.y;
        let xmax2 = other.x + other.width;
        let ymax2 = other.y + other.height;

        xmax1 >= xmin2 && xmax2 >= xmin1 && ymax1 >= ymin2 && ymax2 >= ymin1
    }
}

/// Definition record for a sequence feature or molecular species.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub display_id: String,
    pub name: String,
    /// Sequence role, e.g. `promoter` or `cds`; picks the stencil.
    pub part_role: String,
    /// `DNA region` for strand features; a molecule type otherwise.
    pub part_type: String,
    pub uri_prefix: String,
}

impl ComponentInfo {
    pub fn new(uri_prefix: &str, display_id: &str) -> ComponentInfo {
        ComponentInfo {
            display_id: display_id.to_string(),
            name: String::new(),
            part_role: String::new(),
            part_type: "DNA region".to_string(),
            uri_prefix: uri_prefix.to_string(),
        }
    }

    pub fn full_uri(&self) -> Uri {
        Uri::new(&self.uri_prefix, &self.display_id)
    }

    pub fn is_dna_region(&self) -> bool {
        self.part_type == "DNA region"
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub display_id: String,
    pub name: String,
    pub uri_prefix: String,
}

impl ModuleInfo {
    pub fn new(uri_prefix: &str, display_id: &str) -> ModuleInfo {
        ModuleInfo {
            display_id: display_id.to_string(),
            name: String::new(),
            uri_prefix: uri_prefix.to_string(),
        }
    }

    pub fn full_uri(&self) -> Uri {
        Uri::new(&self.uri_prefix, &self.display_id)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InteractionKind {
    Control,
    Inhibition,
    Stimulation,
    Process,
    Degradation,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Control => "Control",
            InteractionKind::Inhibition => "Inhibition",
            InteractionKind::Stimulation => "Stimulation",
            InteractionKind::Process => "Process",
            InteractionKind::Degradation => "Degradation",
        }
    }

    /// Parses an interaction name.  Biochemical Reaction, Non-Covalent
    /// Binding, and Genetic Production all collapse to `Process`.
    pub fn parse(name: &str) -> Option<InteractionKind> {
        match name {
            "Control" => Some(InteractionKind::Control),
            "Inhibition" => Some(InteractionKind::Inhibition),
            "Stimulation" => Some(InteractionKind::Stimulation),
            "Process" | "Biochemical Reaction" | "Non-Covalent Binding" | "Genetic Production" => {
                Some(InteractionKind::Process)
            }
            "Degradation" => Some(InteractionKind::Degradation),
            _ => None,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record for an interaction edge.  `from_uri`/`to_uri` hold combined
/// endpoint keys (`full_uri + "_" + cell id` of the glyph the terminal rests
/// on); `None` means the endpoint is dangling.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InteractionInfo {
    pub display_id: String,
    pub kind: InteractionKind,
    pub from_uri: Option<String>,
    pub to_uri: Option<String>,
    pub uri_prefix: String,
}

impl InteractionInfo {
    pub fn new(uri_prefix: &str, display_id: &str, kind: InteractionKind) -> InteractionInfo {
        InteractionInfo {
            display_id: display_id.to_string(),
            kind,
            from_uri: None,
            to_uri: None,
            uri_prefix: uri_prefix.to_string(),
        }
    }

    pub fn full_uri(&self) -> Uri {
        Uri::new(&self.uri_prefix, &self.display_id)
    }
}

/// One entity record.  All three variants share the identity / copy /
/// full-URI / owner-prefix capability set.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Info {
    Component(ComponentInfo),
    Module(ModuleInfo),
    Interaction(InteractionInfo),
}

impl Info {
    pub fn full_uri(&self) -> Uri {
        match self {
            Info::Component(info) => info.full_uri(),
            Info::Module(info) => info.full_uri(),
            Info::Interaction(info) => info.full_uri(),
        }
    }

    pub fn display_id(&self) -> &str {
        match self {
            Info::Component(info) => info.display_id.as_str(),
            Info::Module(info) => info.display_id.as_str(),
            Info::Interaction(info) => info.display_id.as_str(),
        }
    }

    pub fn uri_prefix(&self) -> &str {
        match self {
            Info::Component(info) => info.uri_prefix.as_str(),
            Info::Module(info) => info.uri_prefix.as_str(),
            Info::Interaction(info) => info.uri_prefix.as_str(),
        }
    }

    pub fn set_uri_prefix(&mut self, prefix: &str) {
        match self {
            Info::Component(info) => prefix.clone_into(&mut info.uri_prefix),
            Info::Module(info) => prefix.clone_into(&mut info.uri_prefix),
            Info::Interaction(info) => prefix.clone_into(&mut info.uri_prefix),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Info::Component(_) => "ComponentDefinition",
            Info::Module(_) => "ModuleDefinition",
            Info::Interaction(_) => "Interaction",
        }
    }

    pub fn same_kind(&self, other: &Info) -> bool {
        matches!(
            (self, other),
            (Info::Component(_), Info::Component(_))
                | (Info::Module(_), Info::Module(_))
                | (Info::Interaction(_), Info::Interaction(_))
        )
    }

    pub fn as_component(&self) -> Option<&ComponentInfo> {
        match self {
            Info::Component(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleInfo> {
        match self {
            Info::Module(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_uri_joins_prefix_and_display_id() {
        let info = ComponentInfo::new("https://example.org/a", "prom1");
        assert_eq!(info.full_uri().as_str(), "https://example.org/a/prom1");
    }

    #[test]
    fn interaction_kind_normalizes_process_synonyms() {
        assert_eq!(
            InteractionKind::parse("Biochemical Reaction"),
            Some(InteractionKind::Process)
        );
        assert_eq!(
            InteractionKind::parse("Genetic Production"),
            Some(InteractionKind::Process)
        );
        assert_eq!(
            InteractionKind::parse("Inhibition"),
            Some(InteractionKind::Inhibition)
        );
        assert_eq!(InteractionKind::parse("bogus"), None);
    }

    #[test]
    fn rect_overlap_respects_padding() {
        let container = Rect::new(0.0, 0.0, 100.0, 100.0);
        let near = Rect::new(120.0, 0.0, 50.0, 100.0);
        let far = Rect::new(200.0, 0.0, 50.0, 100.0);
        assert!(container.overlaps(&near, 30.0));
        assert!(!container.overlaps(&far, 30.0));
    }

    #[test]
    fn info_kind_mismatch() {
        let comp = Info::Component(ComponentInfo::new("p", "a"));
        let module = Info::Module(ModuleInfo::new("p", "a"));
        assert!(!comp.same_kind(&module));
        assert!(comp.same_kind(&comp.clone()));
    }
}
