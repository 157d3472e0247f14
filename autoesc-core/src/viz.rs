//! Text rendering for diagnostics.
//!
//! Rendering is presentational only. Nothing in the core reads a rendering
//! back. [`DetailLevel::Long`] is what `Display` uses and what tree dumps
//! are made of.

use std::fmt;

/// The amount of detail about an object in a rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DetailLevel {
    /// For limited space; variables drop their type.
    Brief,
    /// Enough to tell kinds apart.
    Short,
    /// Full detail.
    #[default]
    Long,
}

/// Something that can describe itself at a chosen level of detail.
pub trait Render {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result;

    /// Convenience for getting the text of a rendering.
    fn render_to_string(&self, lvl: DetailLevel) -> String {
        let mut s = String::new();
        match self.render(lvl, &mut s) {
            Ok(()) => s,
            Err(e) => format!("<{}>", e),
        }
    }
}

/// Implements `Display` as the long rendering.
macro_rules! display_via_render {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    $crate::viz::Render::render(self, $crate::viz::DetailLevel::Long, f)
                }
            }
        )+
    };
}
pub(crate) use display_via_render;

/// Writes `s` as a C-style double-quoted string.
pub fn write_quoted(s: &str, out: &mut dyn fmt::Write) -> fmt::Result {
    out.write_char('"')?;
    let mut plain_from = 0;
    for (i, ch) in s.char_indices() {
        let escape = match ch {
            '\0' => "\\u0000",
            '\u{8}' => "\\b",
            '\t' => "\\t",
            '\n' => "\\n",
            '\u{c}' => "\\f",
            '\r' => "\\r",
            '"' => "\\\"",
            '\\' => "\\\\",
            '\u{201C}' => "\\u201C",
            '\u{201D}' => "\\u201D",
            '\u{2028}' => "\\u2028",
            '\u{2029}' => "\\u2029",
            _ => continue,
        };
        out.write_str(&s[plain_from..i])?;
        out.write_str(escape)?;
        plain_from = i + ch.len_utf8();
    }
    out.write_str(&s[plain_from..])?;
    out.write_char('"')
}

/// Appends `2 * n` spaces.
pub(crate) fn write_indent(n: usize, out: &mut dyn fmt::Write) -> fmt::Result {
    for _ in 0..n {
        out.write_str("  ")?;
    }
    Ok(())
}
