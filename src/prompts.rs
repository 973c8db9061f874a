// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Confirmation-prompt contracts consumed by the consistency operations.
//!
//! Every method returns `None` (or `false` for the plain confirmation) when
//! the user dismissed the dialog; a dismissed prompt aborts the enclosing
//! operation with zero net effect.

use crate::datamodel::ComponentInfo;
use crate::tree::CellId;

/// Answer to "other instances are coupled with this one; keep them coupled?"
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DecoupleChoice {
    KeepCoupled,
    Decouple,
}

/// Answer to "an entity with the target URI already exists; keep the
/// current substructure, or update to the target's?"
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CoupleChoice {
    Keep,
    Update,
}

/// A candidate endpoint when connecting an interaction to a module: one of
/// the module definition's strands or species.
#[derive(Clone, PartialEq, Debug)]
pub struct EndpointOption {
    pub cell: CellId,
    pub info: ComponentInfo,
}

pub trait PromptPort {
    fn choose_decouple(&mut self) -> Option<DecoupleChoice>;

    fn choose_couple(&mut self) -> Option<CoupleChoice>;

    /// "This part is not owned by you; create an editable copy?"
    /// Returns `false` on cancel.
    fn confirm_ownership_copy(&mut self, label: &str) -> bool;

    /// Pick an endpoint out of `options`; returns an index into the slice.
    fn choose_endpoint(&mut self, options: &[EndpointOption]) -> Option<usize>;
}
