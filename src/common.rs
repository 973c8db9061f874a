// Copyright 2026 The Biocanvas Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError, // will never be produced
    DoesNotExist,
    CircularReference,
    EntityKindConflict,
    InvalidCell,
    MissingBackbone,
    XmlDeserialization,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            DoesNotExist => "does_not_exist",
            CircularReference => "circular_reference",
            EntityKindConflict => "entity_kind_conflict",
            InvalidCell => "invalid_cell",
            MissingBackbone => "missing_backbone",
            XmlDeserialization => "xml_deserialization",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Canvas,
    Entity,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Canvas => "CanvasError",
            ErrorKind::Entity => "EntityError",
            ErrorKind::Serialization => "SerializationError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! canvas_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Canvas, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Canvas, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! entity_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Entity, ErrorCode::$code, Some($str)))
    }};
}

/// Opaque identifier of one logical entity: a component definition, a module
/// definition, or an interaction.  Two cells holding equal `Uri`s denote the
/// same logical entity.
///
/// The textual form is `prefix/display_id`; the prefix names the authority
/// that owns the definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn new(prefix: &str, display_id: &str) -> Uri {
        Uri(format!("{prefix}/{display_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The authority prefix: everything before the final `/`.  A `Uri` with
    /// no separator has an empty prefix.
    pub fn prefix(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    pub fn display_id(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix() == prefix
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Uri {
        Uri(s)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Uri {
        Uri(s.to_string())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_prefix_and_display_id() {
        let uri = Uri::new("https://example.org/user", "prom1");
        assert_eq!(uri.as_str(), "https://example.org/user/prom1");
        assert_eq!(uri.prefix(), "https://example.org/user");
        assert_eq!(uri.display_id(), "prom1");
        assert!(uri.has_prefix("https://example.org/user"));
        assert!(!uri.has_prefix("https://example.org/other"));
    }

    #[test]
    fn uri_without_separator() {
        let uri = Uri::from("bare");
        assert_eq!(uri.prefix(), "");
        assert_eq!(uri.display_id(), "bare");
    }

    #[test]
    fn error_display() {
        let err = Error::new(
            ErrorKind::Canvas,
            ErrorCode::CircularReference,
            Some("u1".to_string()),
        );
        assert_eq!(format!("{err}"), "CanvasError{circular_reference: u1}");

        let err = Error::new(ErrorKind::Entity, ErrorCode::EntityKindConflict, None);
        assert_eq!(format!("{err}"), "EntityError{entity_kind_conflict}");
    }
}
