// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;

use crate::common::Uri;
use crate::datamodel::Info;

/// The entity store: URI → metadata record.  Pure key/value state; the
/// undo-aware mutation path runs through [`crate::edits::Edit::PutInfo`],
/// which records the prior value so a transaction can be inverted.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EntityStore {
    infos: BTreeMap<Uri, Info>,
}

impl EntityStore {
    pub fn new() -> EntityStore {
        Default::default()
    }

    /// Returns `None` for an absent URI; callers must check before
    /// dereferencing.
    pub fn get(&self, uri: &Uri) -> Option<&Info> {
        self.infos.get(uri)
    }

    pub fn contains(&self, uri: &Uri) -> bool {
        self.infos.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uri, &Info)> {
        self.infos.iter()
    }

    pub fn uris(&self) -> impl Iterator<Item = &Uri> {
        self.infos.keys()
    }

    pub(crate) fn put_raw(&mut self, info: Info) -> Option<Info> {
        self.infos.insert(info.full_uri(), info)
    }

    pub(crate) fn remove_raw(&mut self, uri: &Uri) -> Option<Info> {
        self.infos.remove(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::ComponentInfo;

    #[test]
    fn get_on_absent_uri_is_none() {
        let mut store = EntityStore::new();
        let info = ComponentInfo::new("https://example.org/me", "p1");
        let uri = info.full_uri();
        assert!(store.get(&uri).is_none());

        store.put_raw(Info::Component(info));
        assert!(store.get(&uri).is_some());

        store.remove_raw(&uri);
        assert!(store.get(&uri).is_none());
    }
}
