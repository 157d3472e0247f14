//! Output events.
//!
//! The closed set of things a parse appends to its log:
//!
//! - region markers ([`BinaryOutput`]), which come in matched Left/Right
//!   pairs and bracket a production, a variable scope, an embedded
//!   sub-language or a limited span;
//! - string chunks ([`StringOutput`]) recording matched input;
//! - variable values ([`Value`]);
//! - ephemeral [`Marker`]s that bracket speculative work and never outlive
//!   it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::name::ProdName;
use crate::transform::Transform;
use crate::var::{VarKey, Value};
use crate::viz::{write_quoted, DetailLevel, Render};

// ============================================================================
// Region markers
// ============================================================================

/// Which half of a region a [`BinaryOutput`] marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The pattern a limited region must not match the start of.
///
/// Opaque here: the matcher that enforces it lives with the combinators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LimitPattern(Arc<str>);

impl LimitPattern {
    pub fn new(description: &str) -> Self {
        LimitPattern(Arc::from(description))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a region delimits. Two region markers pair up only when their
/// regions are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    /// The span matched by a grammar production.
    Boundary(ProdName),
    /// The extent over which a variable has a value.
    Scope(VarKey),
    /// A sub-language whose input is decoded by a transform.
    Embed(Transform),
    /// A span that must not itself start a match of the pattern.
    LimitCheck(LimitPattern),
}

/// One side of a region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryOutput {
    side: Side,
    region: Region,
}

impl BinaryOutput {
    pub fn new(side: Side, region: Region) -> Self {
        BinaryOutput { side, region }
    }

    pub fn boundary(side: Side, name: ProdName) -> Self {
        BinaryOutput::new(side, Region::Boundary(name))
    }

    pub fn scope(side: Side, var: VarKey) -> Self {
        BinaryOutput::new(side, Region::Scope(var))
    }

    pub fn embed(side: Side, transform: Transform) -> Self {
        BinaryOutput::new(side, Region::Embed(transform))
    }

    pub fn limit_check(side: Side, pattern: LimitPattern) -> Self {
        BinaryOutput::new(side, Region::LimitCheck(pattern))
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// True iff `b` is the same in every detail but has the opposite side.
    pub fn is_other_side(&self, b: &BinaryOutput) -> bool {
        self.side != b.side && self.region == b.region
    }

    /// The marker that closes (or opens) the same region.
    pub fn other_side(&self) -> BinaryOutput {
        BinaryOutput::new(self.side.opposite(), self.region.clone())
    }

    /// True if this is either side of `var`'s scope.
    pub fn is_scope_of(&self, var: &VarKey) -> bool {
        matches!(&self.region, Region::Scope(v) if v == var)
    }
}

impl Render for BinaryOutput {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        let left = self.side == Side::Left;
        match &self.region {
            Region::Boundary(name) => {
                out.write_str(if left { "<" } else { "</" })?;
                out.write_str(name.as_str())?;
                out.write_char('>')
            }
            Region::Scope(var) => {
                if left {
                    out.write_str("var ")?;
                    var.render(lvl, out)
                } else {
                    out.write_str("/var")
                }
            }
            Region::Embed(transform) => transform.render(lvl, out),
            Region::LimitCheck(pattern) => {
                out.write_str(if left { "{until " } else { "{/until " })?;
                out.write_str(pattern.as_str())?;
                out.write_char('}')
            }
        }
    }
}

// ============================================================================
// Unary outputs
// ============================================================================

/// A chunk of matched input.
///
/// `decoded` is what the grammar saw, `raw` is the text as it appeared in
/// the input before any embedding transform decoded it. Identity is the
/// decoded text alone.
#[derive(Debug, Clone, Eq)]
pub struct StringOutput {
    decoded: Arc<str>,
    raw: Arc<str>,
}

impl StringOutput {
    pub fn new(decoded: &str, raw: &str) -> Self {
        StringOutput {
            decoded: Arc::from(decoded),
            raw: Arc::from(raw),
        }
    }

    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `self` followed by `next` as one chunk.
    pub fn concat(&self, next: &StringOutput) -> StringOutput {
        StringOutput {
            decoded: Arc::from(format!("{}{}", self.decoded, next.decoded)),
            raw: Arc::from(format!("{}{}", self.raw, next.raw)),
        }
    }
}

impl PartialEq for StringOutput {
    fn eq(&self, other: &Self) -> bool {
        self.decoded == other.decoded
    }
}

impl Hash for StringOutput {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.decoded.hash(state);
    }
}

/// Bookkeeping pushed before speculative work and removed by rollback or
/// commit before the parse finishes.
///
/// Occurrences of the same kind are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    /// One alternative of an ordered choice.
    Branch,
    /// A zero-width assertion; always rolled back.
    Lookahead,
    /// One iteration of a loop.
    Loop,
}

impl Render for Marker {
    fn render(&self, _lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(match self {
            Marker::Branch => "{/}",
            Marker::Lookahead => "{=}",
            Marker::Loop => "{+}",
        })
    }
}

// ============================================================================
// Output
// ============================================================================

/// An event on an [`OutputLog`](crate::OutputLog).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Output {
    Binary(BinaryOutput),
    String(StringOutput),
    Value(Value),
    Marker(Marker),
}

impl Output {
    /// A chunk whose raw and decoded forms agree.
    pub fn text(s: &str) -> Output {
        Output::String(StringOutput::new(s, s))
    }

    pub fn string(decoded: &str, raw: &str) -> Output {
        Output::String(StringOutput::new(decoded, raw))
    }

    pub fn as_binary(&self) -> Option<&BinaryOutput> {
        match self {
            Output::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&StringOutput> {
        match self {
            Output::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Output::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_marker(&self, marker: Marker) -> bool {
        matches!(self, Output::Marker(m) if *m == marker)
    }

    /// True for a value of `var`.
    pub fn is_set_of(&self, var: &VarKey) -> bool {
        matches!(self, Output::Value(v) if v.is_of(var))
    }

    /// Collapses `self` and the event right after it into one equivalent
    /// event, if their kinds allow it.
    pub fn coalesce_with_follower(&self, next: &Output) -> Option<Output> {
        match (self, next) {
            (Output::String(a), Output::String(b)) => Some(Output::String(a.concat(b))),
            (Output::Value(a), Output::Value(b)) if a.var() == b.var() => Some(next.clone()),
            _ => None,
        }
    }

    /// True if the event may be moved past other reorderable events
    /// without changing meaning.
    pub fn can_reorder(&self) -> bool {
        matches!(self, Output::Value(_))
    }

    /// The order in which reorderable runs are sorted. `None` for region
    /// markers, which are never reordered.
    pub fn cmp_unary(&self, other: &Output) -> Option<Ordering> {
        let ord = self.unary_rank()?.cmp(&other.unary_rank()?).then_with(|| match (self, other) {
            (Output::Marker(a), Output::Marker(b)) => a.cmp(b),
            (Output::String(a), Output::String(b)) => a.raw.cmp(&b.raw),
            (Output::Value(a), Output::Value(b)) => a.var().name().cmp(b.var().name()),
            _ => Ordering::Equal,
        });
        Some(ord)
    }

    fn unary_rank(&self) -> Option<u8> {
        match self {
            Output::Binary(_) => None,
            Output::Marker(_) => Some(0),
            Output::String(_) => Some(1),
            Output::Value(_) => Some(2),
        }
    }
}

impl From<BinaryOutput> for Output {
    fn from(b: BinaryOutput) -> Self {
        Output::Binary(b)
    }
}

impl From<StringOutput> for Output {
    fn from(s: StringOutput) -> Self {
        Output::String(s)
    }
}

impl From<Value> for Output {
    fn from(v: Value) -> Self {
        Output::Value(v)
    }
}

impl From<Marker> for Output {
    fn from(m: Marker) -> Self {
        Output::Marker(m)
    }
}

impl Render for Output {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Output::Binary(b) => b.render(lvl, out),
            Output::String(s) => write_quoted(&s.decoded, out),
            Output::Value(v) => v.render(lvl, out),
            Output::Marker(m) => m.render(lvl, out),
        }
    }
}

crate::viz::display_via_render!(BinaryOutput, Marker, Output);
