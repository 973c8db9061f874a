// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON projection of entity metadata for the UI layer.

use serde::{Deserialize, Serialize};

use crate::datamodel::{ComponentInfo, Info, InteractionInfo, ModuleInfo};
use crate::metadata::SelectionMetadata;

fn is_empty_string(val: &str) -> bool {
    val.is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub display_id: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub name: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub part_role: String,
    pub part_type: String,
    pub uri_prefix: String,
    pub uri: String,
}

impl From<&ComponentInfo> for Component {
    fn from(info: &ComponentInfo) -> Self {
        Component {
            display_id: info.display_id.clone(),
            name: info.name.clone(),
            part_role: info.part_role.clone(),
            part_type: info.part_type.clone(),
            uri_prefix: info.uri_prefix.clone(),
            uri: info.full_uri().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub display_id: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub name: String,
    pub uri_prefix: String,
    pub uri: String,
}

impl From<&ModuleInfo> for Module {
    fn from(info: &ModuleInfo) -> Self {
        Module {
            display_id: info.display_id.clone(),
            name: info.name.clone(),
            uri_prefix: info.uri_prefix.clone(),
            uri: info.full_uri().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub display_id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to_uri: Option<String>,
    pub uri: String,
}

impl From<&InteractionInfo> for Interaction {
    fn from(info: &InteractionInfo) -> Self {
        Interaction {
            display_id: info.display_id.clone(),
            kind: info.kind.as_str().to_string(),
            from_uri: info.from_uri.clone(),
            to_uri: info.to_uri.clone(),
            uri: info.full_uri().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub component: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub module: Option<Module>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interaction: Option<Interaction>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub styles: Vec<String>,
}

impl From<&SelectionMetadata> for Selection {
    fn from(meta: &SelectionMetadata) -> Self {
        Selection {
            component: meta.component.as_ref().map(Component::from),
            module: meta.module.as_ref().map(Module::from),
            interaction: meta.interaction.as_ref().map(Interaction::from),
            styles: meta.style.styles.iter().cloned().collect(),
        }
    }
}

pub fn entity_to_json(info: &Info) -> serde_json::Value {
    match info {
        Info::Component(info) => serde_json::json!({ "component": Component::from(info) }),
        Info::Module(info) => serde_json::json!({ "module": Module::from(info) }),
        Info::Interaction(info) => serde_json::json!({ "interaction": Interaction::from(info) }),
    }
}

pub fn selection_to_json(meta: &SelectionMetadata) -> String {
    serde_json::to_string(&Selection::from(meta)).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::ComponentInfo;

    #[test]
    fn component_projection_includes_full_uri() {
        let mut info = ComponentInfo::new("https://example.org/me", "p1");
        info.part_role = "promoter".to_string();
        let value = entity_to_json(&Info::Component(info));
        assert_eq!(
            value["component"]["uri"],
            serde_json::json!("https://example.org/me/p1")
        );
        assert_eq!(value["component"]["part_role"], serde_json::json!("promoter"));
    }

    #[test]
    fn empty_selection_serializes_to_empty_object() {
        let meta = crate::metadata::SelectionMetadata::default();
        assert_eq!(selection_to_json(&meta), "{}");
    }
}
