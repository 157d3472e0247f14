//! String transforms at sub-language boundaries.
//!
//! An embedded language (CSS in a `style` attribute, a URL in `href`) sees
//! decoded text while the outer language sees the encoded form. The
//! transform is recorded on both sides of an embed region so the two
//! views can be related.

use std::fmt;
use std::str::FromStr;

use phf::phf_map;

use crate::error::NameError;
use crate::viz::{DetailLevel, Render};

/// A transformation that allows a string in one language to be embedded
/// within a substring of a string in another language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transform {
    /// HTML character references.
    Html,
    /// Percent-encoding as in a URL path.
    UriPath,
    /// Percent-encoding where `+` means space, as in a URL query.
    UriQuery,
}

static BY_NAME: phf::Map<&'static str, Transform> = phf_map! {
    "html" => Transform::Html,
    "pct" => Transform::UriPath,
    "pctPlus" => Transform::UriQuery,
};

impl Transform {
    /// Short name used in renderings and fixtures.
    pub fn name(self) -> &'static str {
        match self {
            Transform::Html => "html",
            Transform::UriPath => "pct",
            Transform::UriQuery => "pctPlus",
        }
    }

    pub fn from_name(name: &str) -> Option<Transform> {
        BY_NAME.get(name).copied()
    }

    /// The raw form of decoded text `s`.
    pub fn encode(self, s: &str) -> String {
        match self {
            Transform::Html => encode_html(s),
            Transform::UriPath => encode_percent(s, false),
            Transform::UriQuery => encode_percent(s, true),
        }
    }
}

fn encode_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push_str("&#0;"),
            _ => out.push(ch),
        }
    }
    out
}

fn encode_percent(s: &str, plus_means_space: bool) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            b' ' if plus_means_space => out.push('+'),
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0xf) as usize] as char);
            }
        }
    }
    out
}

impl FromStr for Transform {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transform::from_name(s).ok_or_else(|| NameError::UnknownTransform(s.to_owned()))
    }
}

impl Render for Transform {
    fn render(&self, _lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(self.name())
    }
}

crate::viz::display_via_render!(Transform);
