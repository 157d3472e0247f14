//! Production names.

use std::fmt;
use std::sync::Arc;

use unicode_xid::UnicodeXID;

use crate::error::NameError;

/// The name of a grammar production, e.g. `Tag` or `Css.Props`.
///
/// Always a dotted identifier: one or more segments separated by `.`, each
/// starting with an XID-start character, `_` or `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProdName(Arc<str>);

impl ProdName {
    pub fn new(text: &str) -> Result<Self, NameError> {
        if is_identifier(text) {
            Ok(ProdName(Arc::from(text)))
        } else {
            Err(NameError::InvalidIdentifier(text.to_owned()))
        }
    }

    /// `prefix.self`
    pub fn with_prefix(&self, prefix: &ProdName) -> ProdName {
        ProdName(Arc::from(format!("{}.{}", prefix.0, self.0)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True for valid production and variable names.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_segment)
}

fn is_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_xid_start() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_xid_continue() || c == '$')
}
