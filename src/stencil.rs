// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Style-key construction over a name → shape registry.
//!
//! The engine never looks at shape geometry; it only reads registered names
//! to build the style key a renderer resolves later.

use std::collections::BTreeSet;

use lazy_static::lazy_static;

use crate::datamodel::InteractionKind;

pub const STYLE_CIRCUIT_CONTAINER: &str = "circuitContainer";
pub const STYLE_BACKBONE: &str = "backbone";
pub const STYLE_TEXTBOX: &str = "textBox";
pub const STYLE_MODULE: &str = "moduleGlyph";
pub const STYLE_MOLECULAR_SPECIES: &str = "molecularSpeciesGlyph";
pub const STYLE_SEQUENCE_FEATURE: &str = "sequenceFeatureGlyph";
pub const STYLE_INTERACTION: &str = "interactionGlyph";
pub const STYLE_MODULE_VIEW: &str = "moduleViewCell";
pub const STYLE_COMPONENT_VIEW: &str = "componentViewCell";

pub const NO_GLYPH_ASSIGNED: &str = "NGA (No Glyph Assigned)";
pub const NO_GLYPH_ASSIGNED_SPECIES: &str = "NGA (No Glyph Assigned Molecular Species)";

const BUILTIN_SEQUENCE_FEATURES: &[&str] = &[
    "promoter",
    "cds",
    "terminator",
    "ribosome-entry-site",
    "operator",
    "insulator",
    "origin-of-replication",
    "primer-binding-site",
    "engineered-region",
    NO_GLYPH_ASSIGNED,
];

const BUILTIN_MOLECULAR_SPECIES: &[&str] = &[
    "macromolecule",
    "dsNA",
    "ssNA",
    "small-molecule",
    "complex",
    "replacement-glyph",
    NO_GLYPH_ASSIGNED_SPECIES,
];

lazy_static! {
    static ref SEQUENCE_FEATURE_NAMES: BTreeSet<&'static str> =
        BUILTIN_SEQUENCE_FEATURES.iter().copied().collect();
    static ref MOLECULAR_SPECIES_NAMES: BTreeSet<&'static str> =
        BUILTIN_MOLECULAR_SPECIES.iter().copied().collect();
}

/// Maps a component's molecule type to its registered species shape name.
pub fn molecule_type_to_shape(part_type: &str) -> &'static str {
    match part_type {
        "DNA molecule" => "dsNA",
        "Protein" => "macromolecule",
        "RNA molecule" => "ssNA",
        "Small molecule" => "small-molecule",
        "All_types" => "replacement-glyph",
        _ => NO_GLYPH_ASSIGNED_SPECIES,
    }
}

pub fn shape_to_molecule_type(shape: &str) -> &'static str {
    match shape {
        "dsNA" => "DNA molecule",
        "macromolecule" => "Protein",
        "ssNA" => "RNA molecule",
        "small-molecule" => "Small molecule",
        "replacement-glyph" => "All_types",
        _ => "Protein",
    }
}

/// The registry of stencil names known to the renderer.
#[derive(Clone, PartialEq, Debug)]
pub struct Stencils {
    sequence_features: BTreeSet<String>,
    molecular_species: BTreeSet<String>,
}

impl Stencils {
    pub fn builtin() -> Stencils {
        Stencils {
            sequence_features: SEQUENCE_FEATURE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            molecular_species: MOLECULAR_SPECIES_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Registers an externally loaded stencil name.
    pub fn register_sequence_feature(&mut self, name: &str) {
        self.sequence_features.insert(name.to_string());
    }

    pub fn register_molecular_species(&mut self, name: &str) {
        self.molecular_species.insert(name.to_string());
    }

    pub fn has_sequence_feature(&self, name: &str) -> bool {
        self.sequence_features.contains(name)
    }

    /// Style key for a sequence feature with the given role; unknown roles
    /// fall back to the no-glyph-assigned stencil.
    pub fn sequence_feature_style(&self, role: &str) -> String {
        if self.sequence_features.contains(role) {
            format!("{STYLE_SEQUENCE_FEATURE}{role}")
        } else {
            format!("{STYLE_SEQUENCE_FEATURE}{NO_GLYPH_ASSIGNED}")
        }
    }

    pub fn molecular_species_style(&self, shape: &str) -> String {
        if self.molecular_species.contains(shape) {
            format!("{STYLE_MOLECULAR_SPECIES}{shape}")
        } else {
            format!("{STYLE_MOLECULAR_SPECIES}{NO_GLYPH_ASSIGNED_SPECIES}")
        }
    }
}

pub fn interaction_style(kind: InteractionKind) -> String {
    format!("{STYLE_INTERACTION}{}", kind.as_str())
}

/// Replaces the keyed segment of a style string in place, leaving any other
/// `;`-separated parameters untouched.  If the style is just the bare key,
/// the whole string is replaced.
pub fn replace_keyed_style(style: &str, key_prefix: &str, new_key: &str) -> String {
    if !style.contains(';') {
        return new_key.to_string();
    }
    let Some(start) = style.find(key_prefix) else {
        return style.to_string();
    };
    let end = style[start..]
        .find(';')
        .map(|idx| start + idx)
        .unwrap_or(style.len());
    let mut out = String::with_capacity(style.len());
    out.push_str(&style[..start]);
    out.push_str(new_key);
    out.push_str(&style[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_falls_back_to_nga() {
        let stencils = Stencils::builtin();
        assert_eq!(
            stencils.sequence_feature_style("promoter"),
            "sequenceFeatureGlyphpromoter"
        );
        assert_eq!(
            stencils.sequence_feature_style("mystery-role"),
            format!("sequenceFeatureGlyph{NO_GLYPH_ASSIGNED}")
        );
    }

    #[test]
    fn keyed_style_replacement_preserves_params() {
        let style = "strokeColor=#000000;sequenceFeatureGlyphpromoter;fillColor=#ffffff;";
        let out = replace_keyed_style(style, STYLE_SEQUENCE_FEATURE, "sequenceFeatureGlyphcds");
        assert_eq!(
            out,
            "strokeColor=#000000;sequenceFeatureGlyphcds;fillColor=#ffffff;"
        );

        let bare = "sequenceFeatureGlyphpromoter";
        assert_eq!(
            replace_keyed_style(bare, STYLE_SEQUENCE_FEATURE, "sequenceFeatureGlyphcds"),
            "sequenceFeatureGlyphcds"
        );
    }

    #[test]
    fn molecule_type_round_trip() {
        assert_eq!(molecule_type_to_shape("Protein"), "macromolecule");
        assert_eq!(shape_to_molecule_type("macromolecule"), "Protein");
        assert_eq!(
            molecule_type_to_shape("unknown thing"),
            NO_GLYPH_ASSIGNED_SPECIES
        );
    }
}
