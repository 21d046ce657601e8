//! Structured error codes
//!
//! Error code ranges:
//! - SCH0001-SCH0099: Filter syntax errors
//! - SCH0100-SCH0199: Type graph construction errors
//! - SCH0200-SCH0299: Validation errors (codecs)
//! - SCH0400-SCH0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a filter syntax error (0001-0099)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a type graph construction error (0100-0199)
    pub const fn is_build_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a validation error (0200-0299)
    pub const fn is_validation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SCH{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Filter syntax (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(5, ErrorInfo::new("Invalid string escape sequence"));
    map.insert(6, ErrorInfo::new("Unterminated string literal"));
    map.insert(7, ErrorInfo::new("Invalid number format"));
    map.insert(8, ErrorInfo::new("Invalid date/time format")
        .with_help("Use YYYY-MM-DD, hh:mm[:ss[.fff]] or YYYY-MM-DDThh:mm[:ss][Z|+hh:mm]"));
    map.insert(10, ErrorInfo::new("Missing closing delimiter"));
    map.insert(12, ErrorInfo::new("Expected expression"));
    map.insert(13, ErrorInfo::new("Expected identifier"));
    map.insert(15, ErrorInfo::new("Invalid operator"));
    map.insert(16, ErrorInfo::new("Sign not allowed in field path"));

    // Type graph construction (0100-0199)
    map.insert(100, ErrorInfo::new("Unresolved type reference")
        .with_help("Check that the type is declared in this document or a referenced one"));
    map.insert(109, ErrorInfo::new("Duplicate type name"));
    map.insert(110, ErrorInfo::new("Invalid type declaration"));
    map.insert(114, ErrorInfo::new("Circular reference")
        .with_help("Base, mixin, union and mapped-type chains must be acyclic"));

    // Validation (0200-0299)
    map.insert(200, ErrorInfo::new("Validation failed"));
    map.insert(201, ErrorInfo::new("Required field missing"));
    map.insert(202, ErrorInfo::new("Unknown field"));
    map.insert(203, ErrorInfo::new("Type mismatch"));
    map.insert(204, ErrorInfo::new("Value out of range"));
    map.insert(205, ErrorInfo::new("Invalid length"));
    map.insert(206, ErrorInfo::new("Pattern mismatch"));
    map.insert(207, ErrorInfo::new("Value not in enumeration"));
    map.insert(208, ErrorInfo::new("Invalid date/time value"));
    map.insert(209, ErrorInfo::new("No union member matched"));
    map.insert(210, ErrorInfo::new("Fixed value mismatch"));
    map.insert(211, ErrorInfo::new("Invalid array size"));

    // System (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));
    map.insert(406, ErrorInfo::new("Invalid format"));

    map
});

// Filter syntax
pub const SCH0001: ErrorCode = ErrorCode::new(1);
pub const SCH0002: ErrorCode = ErrorCode::new(2);
pub const SCH0005: ErrorCode = ErrorCode::new(5);
pub const SCH0006: ErrorCode = ErrorCode::new(6);
pub const SCH0007: ErrorCode = ErrorCode::new(7);
pub const SCH0008: ErrorCode = ErrorCode::new(8);
pub const SCH0010: ErrorCode = ErrorCode::new(10);
pub const SCH0012: ErrorCode = ErrorCode::new(12);
pub const SCH0013: ErrorCode = ErrorCode::new(13);
pub const SCH0015: ErrorCode = ErrorCode::new(15);
pub const SCH0016: ErrorCode = ErrorCode::new(16);

// Type graph construction
pub const SCH0100: ErrorCode = ErrorCode::new(100);
pub const SCH0109: ErrorCode = ErrorCode::new(109);
pub const SCH0110: ErrorCode = ErrorCode::new(110);
pub const SCH0114: ErrorCode = ErrorCode::new(114);

// Validation
pub const SCH0200: ErrorCode = ErrorCode::new(200);
pub const SCH0201: ErrorCode = ErrorCode::new(201);
pub const SCH0202: ErrorCode = ErrorCode::new(202);
pub const SCH0203: ErrorCode = ErrorCode::new(203);
pub const SCH0204: ErrorCode = ErrorCode::new(204);
pub const SCH0205: ErrorCode = ErrorCode::new(205);
pub const SCH0206: ErrorCode = ErrorCode::new(206);
pub const SCH0207: ErrorCode = ErrorCode::new(207);
pub const SCH0208: ErrorCode = ErrorCode::new(208);
pub const SCH0209: ErrorCode = ErrorCode::new(209);
pub const SCH0210: ErrorCode = ErrorCode::new(210);
pub const SCH0211: ErrorCode = ErrorCode::new(211);

// System
pub const SCH0400: ErrorCode = ErrorCode::new(400);
pub const SCH0401: ErrorCode = ErrorCode::new(401);
pub const SCH0402: ErrorCode = ErrorCode::new(402);
pub const SCH0406: ErrorCode = ErrorCode::new(406);
