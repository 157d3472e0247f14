//! Variables, scopes and values.
//!
//! A variable is a typed key, never a container. Its current value lives in
//! the log as a [`Value`] event, and its lifetime is bounded by a pair of
//! `Scope` region markers. One part of a grammar records a fact ("a `/`
//! here starts a regex") and another part reads it back with
//! [`OutputLog::value_of`](crate::OutputLog::value_of).
//!
//! Values are stored as a closed [`Datum`] so that outputs stay a plain
//! enum. The declared type of a variable is a [`TypeGuard`] which is checked
//! where a value is written and again where it is read.
//!
//! ```
//! use autoesc_core::{symbols, OutputLog, Side, Variable};
//!
//! symbols! {
//!     pub enum SlashIs { Regex, DivOp, DontCare }
//! }
//!
//! let slash_is = Variable::<SlashIs>::new("SlashIs").unwrap();
//! let log = OutputLog::new()
//!     .append(slash_is.scope(Side::Left))
//!     .append(slash_is.value(SlashIs::Regex));
//! assert_eq!(log.value_of(&slash_is).unwrap(), Some(SlashIs::Regex));
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{InvariantViolation, NameError, Result};
use crate::name::is_identifier;
use crate::output::{BinaryOutput, Output, Region, Side};
use crate::viz::{DetailLevel, Render};

// ============================================================================
// Runtime representation
// ============================================================================

/// A closed set of named members, the runtime face of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain {
    pub name: &'static str,
    /// Where the enum was declared; tells apart same-named enums.
    pub module: &'static str,
    pub members: &'static [&'static str],
}

impl Domain {
    /// The member called `name`, if any.
    pub fn member(&'static self, name: &str) -> Option<Symbol> {
        let index = self.members.iter().position(|m| *m == name)?;
        Some(Symbol::new(self, index as u16, self.members[index]))
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        sym.domain == self && self.members.get(sym.index as usize) == Some(&sym.name)
    }
}

/// One member of a [`Domain`].
///
/// Ordered by domain, then declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    domain: &'static Domain,
    index: u16,
    name: &'static str,
}

impl Symbol {
    pub const fn new(domain: &'static Domain, index: u16, name: &'static str) -> Self {
        Symbol { domain, index, name }
    }

    pub fn domain(&self) -> &'static Domain {
        self.domain
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The value a variable holds, as stored on the log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datum {
    Unit,
    Bool(bool),
    Int(i64),
    Text(Arc<str>),
    Symbol(Symbol),
    Symbols(BTreeSet<Symbol>),
}

impl Render for Datum {
    fn render(&self, _lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Datum::Unit => out.write_str("()"),
            Datum::Bool(b) => write!(out, "{}", b),
            Datum::Int(i) => write!(out, "{}", i),
            Datum::Text(s) => out.write_str(s),
            Datum::Symbol(sym) => out.write_str(sym.name),
            Datum::Symbols(syms) => {
                out.write_char('(')?;
                for (i, sym) in syms.iter().enumerate() {
                    if i != 0 {
                        out.write_str(", ")?;
                    }
                    out.write_str(sym.name)?;
                }
                out.write_char(')')
            }
        }
    }
}

/// The declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeGuard {
    Unit,
    Bool,
    Int,
    Text,
    Symbol(&'static Domain),
    /// A set of members of one domain.
    SymbolSet(&'static Domain),
}

impl TypeGuard {
    /// True when `datum` is of this type.
    pub fn check(&self, datum: &Datum) -> bool {
        match (self, datum) {
            (TypeGuard::Unit, Datum::Unit)
            | (TypeGuard::Bool, Datum::Bool(_))
            | (TypeGuard::Int, Datum::Int(_))
            | (TypeGuard::Text, Datum::Text(_)) => true,
            (TypeGuard::Symbol(domain), Datum::Symbol(sym)) => domain.contains(*sym),
            (TypeGuard::SymbolSet(domain), Datum::Symbols(syms)) => {
                syms.iter().all(|sym| domain.contains(*sym))
            }
            _ => false,
        }
    }

    /// A diagnostic description of the type.
    pub fn type_name(&self) -> String {
        match self {
            TypeGuard::Unit => "Unit".to_owned(),
            TypeGuard::Bool => "bool".to_owned(),
            TypeGuard::Int => "int".to_owned(),
            TypeGuard::Text => "String".to_owned(),
            TypeGuard::Symbol(domain) => domain.name.to_owned(),
            TypeGuard::SymbolSet(domain) => format!("{}*", domain.name),
        }
    }
}

// ============================================================================
// Variable keys and values
// ============================================================================

/// The untyped identity of a variable: name, declared type, and whether
/// branches reconcile it by intersection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarKey {
    name: Arc<str>,
    guard: TypeGuard,
    multi: bool,
}

impl VarKey {
    pub fn new(name: &str, guard: TypeGuard) -> Result<Self, NameError> {
        if !is_identifier(name) {
            return Err(NameError::InvalidIdentifier(name.to_owned()));
        }
        Ok(VarKey {
            name: Arc::from(name),
            guard,
            multi: false,
        })
    }

    /// A variable holding a set of `domain` members, intersected on join.
    pub fn new_multi(name: &str, domain: &'static Domain) -> Result<Self, NameError> {
        let mut key = VarKey::new(name, TypeGuard::SymbolSet(domain))?;
        key.multi = true;
        Ok(key)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guard(&self) -> TypeGuard {
        self.guard
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// The variable bound to the empty set, for multi-variables.
    pub fn empty_value(&self) -> Option<Value> {
        self.multi.then(|| Value {
            var: self.clone(),
            datum: Datum::Symbols(BTreeSet::new()),
        })
    }

    /// A `Scope` region marker for this variable.
    pub fn scope(&self, side: Side) -> Output {
        Output::Binary(BinaryOutput::new(side, Region::Scope(self.clone())))
    }

    fn mismatch(&self, datum: &Datum) -> InvariantViolation {
        InvariantViolation::TypeMismatch {
            variable: self.name.to_string(),
            expected: self.guard.type_name(),
            found: datum.render_to_string(DetailLevel::Long),
        }
    }
}

impl Render for VarKey {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(&self.name)?;
        if lvl == DetailLevel::Long {
            out.write_str(" : ")?;
            out.write_str(&self.guard.type_name())?;
        }
        Ok(())
    }
}

/// Records that a variable currently holds a value.
///
/// Valid from its position until the nearest enclosing `Scope` of the same
/// variable closes or a later `Value` of the same variable in that scope
/// replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    var: VarKey,
    datum: Datum,
}

impl Value {
    /// Checks `datum` against the variable's declared type.
    pub fn new(var: VarKey, datum: Datum) -> Result<Value> {
        if !var.guard.check(&datum) {
            return Err(var.mismatch(&datum));
        }
        Ok(Value { var, datum })
    }

    pub fn var(&self) -> &VarKey {
        &self.var
    }

    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn is_of(&self, var: &VarKey) -> bool {
        self.var == *var
    }

    /// Re-checks the stored datum; used where a value is read back.
    pub fn checked_datum(&self) -> Result<&Datum> {
        if self.var.guard.check(&self.datum) {
            Ok(&self.datum)
        } else {
            Err(self.var.mismatch(&self.datum))
        }
    }

    /// A value of the same multi-variable holding only the members common
    /// to both.
    pub fn intersection(&self, other: &Value) -> Result<Value> {
        let (Datum::Symbols(a), Datum::Symbols(b)) = (&self.datum, &other.datum) else {
            let culprit = if matches!(self.datum, Datum::Symbols(_)) { other } else { self };
            return Err(self.var.mismatch(&culprit.datum));
        };
        if !self.var.multi || self.var != other.var {
            return Err(InvariantViolation::TypeMismatch {
                variable: self.var.name.to_string(),
                expected: self.var.render_to_string(DetailLevel::Long),
                found: other.var.render_to_string(DetailLevel::Long),
            });
        }
        let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let common = smaller.iter().filter(|sym| larger.contains(sym)).copied().collect();
        Ok(Value {
            var: self.var.clone(),
            datum: Datum::Symbols(common),
        })
    }
}

impl Render for Value {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        self.var.render(DetailLevel::Brief, out)?;
        out.write_str(" = ")?;
        self.datum.render(lvl, out)
    }
}

crate::viz::display_via_render!(Datum, VarKey, Value);

// ============================================================================
// Typed variables
// ============================================================================

/// A Rust type that can be held by a variable.
pub trait VarType: Sized + 'static {
    fn guard() -> TypeGuard;
    fn to_datum(&self) -> Datum;
    fn from_datum(datum: &Datum) -> Option<Self>;
}

/// An enum usable as a variable type; implemented by [`symbols!`](crate::symbols).
pub trait SymbolType: VarType + Copy + Ord {
    const DOMAIN: &'static Domain;
    fn symbol(self) -> Symbol;
    fn from_symbol(sym: Symbol) -> Option<Self>;
}

impl VarType for () {
    fn guard() -> TypeGuard {
        TypeGuard::Unit
    }
    fn to_datum(&self) -> Datum {
        Datum::Unit
    }
    fn from_datum(datum: &Datum) -> Option<Self> {
        matches!(datum, Datum::Unit).then_some(())
    }
}

impl VarType for bool {
    fn guard() -> TypeGuard {
        TypeGuard::Bool
    }
    fn to_datum(&self) -> Datum {
        Datum::Bool(*self)
    }
    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl VarType for i64 {
    fn guard() -> TypeGuard {
        TypeGuard::Int
    }
    fn to_datum(&self) -> Datum {
        Datum::Int(*self)
    }
    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl VarType for String {
    fn guard() -> TypeGuard {
        TypeGuard::Text
    }
    fn to_datum(&self) -> Datum {
        Datum::Text(Arc::from(self.as_str()))
    }
    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Text(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl<E: SymbolType> VarType for BTreeSet<E> {
    fn guard() -> TypeGuard {
        TypeGuard::SymbolSet(E::DOMAIN)
    }
    fn to_datum(&self) -> Datum {
        Datum::Symbols(self.iter().map(|e| e.symbol()).collect())
    }
    fn from_datum(datum: &Datum) -> Option<Self> {
        match datum {
            Datum::Symbols(syms) => syms.iter().map(|sym| E::from_symbol(*sym)).collect(),
            _ => None,
        }
    }
}

/// A typed key naming a piece of contextual state.
pub struct Variable<T> {
    key: VarKey,
    _type: PhantomData<fn() -> T>,
}

impl<T: VarType> Variable<T> {
    pub fn new(name: &str) -> Result<Self, NameError> {
        Ok(Variable {
            key: VarKey::new(name, T::guard())?,
            _type: PhantomData,
        })
    }
}

impl<T> Variable<T> {
    pub fn key(&self) -> &VarKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// A `Scope` region marker for this variable.
    pub fn scope(&self, side: Side) -> Output {
        self.key.scope(side)
    }
}

impl<T: VarType> Variable<T> {
    /// Records that this variable holds `v`.
    pub fn value(&self, v: T) -> Value {
        Value {
            var: self.key.clone(),
            datum: v.to_datum(),
        }
    }

    /// Reads a value of this variable back as `T`.
    pub fn read(&self, value: &Value) -> Result<T> {
        let datum = value.checked_datum()?;
        T::from_datum(datum).ok_or_else(|| self.key.mismatch(datum))
    }
}

impl<T> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Variable {
            key: self.key.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Variable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Variable<T> {}

impl<T> fmt::Debug for Variable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Variable").field(&self.key).finish()
    }
}

impl<T> AsRef<VarKey> for Variable<T> {
    fn as_ref(&self) -> &VarKey {
        &self.key
    }
}

/// A variable whose value is a set of enum members.
///
/// When branches are joined, a fact holds afterwards only if it held on
/// every branch, so the values are intersected.
pub struct MultiVariable<E> {
    var: Variable<BTreeSet<E>>,
}

impl<E: SymbolType> MultiVariable<E> {
    pub fn new(name: &str) -> Result<Self, NameError> {
        Ok(MultiVariable {
            var: Variable {
                key: VarKey::new_multi(name, E::DOMAIN)?,
                _type: PhantomData,
            },
        })
    }

    pub fn variable(&self) -> &Variable<BTreeSet<E>> {
        &self.var
    }

    pub fn key(&self) -> &VarKey {
        &self.var.key
    }

    pub fn scope(&self, side: Side) -> Output {
        self.var.scope(side)
    }

    /// Records that this variable holds exactly `members`.
    pub fn value(&self, members: impl IntoIterator<Item = E>) -> Value {
        self.var.value(members.into_iter().collect())
    }

    pub fn read(&self, value: &Value) -> Result<BTreeSet<E>> {
        self.var.read(value)
    }

    /// The members common to `a` and `b`, both values of this variable.
    pub fn intersection(&self, a: &Value, b: &Value) -> Result<Value> {
        if !a.is_of(self.key()) {
            return Err(self.key().mismatch(a.datum()));
        }
        a.intersection(b)
    }

    /// This variable bound to the empty set.
    pub fn empty_value(&self) -> Value {
        self.var.value(BTreeSet::new())
    }
}

impl<E> Clone for MultiVariable<E> {
    fn clone(&self) -> Self {
        MultiVariable { var: self.var.clone() }
    }
}

impl<E> fmt::Debug for MultiVariable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MultiVariable").field(&self.var.key).finish()
    }
}

impl<E> AsRef<VarKey> for MultiVariable<E> {
    fn as_ref(&self) -> &VarKey {
        &self.var.key
    }
}

/// Declares an enum usable as a variable type.
///
/// ```
/// autoesc_core::symbols! {
///     /// What an HTML attribute value contains.
///     pub enum AttrT { Script, Style, Url, Other }
/// }
/// ```
#[macro_export]
macro_rules! symbols {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every member in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl $crate::var::SymbolType for $name {
            const DOMAIN: &'static $crate::var::Domain = &$crate::var::Domain {
                name: stringify!($name),
                module: module_path!(),
                members: &[$(stringify!($variant)),+],
            };

            fn symbol(self) -> $crate::var::Symbol {
                let index = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
                $crate::var::Symbol::new(
                    <Self as $crate::var::SymbolType>::DOMAIN,
                    index as u16,
                    <Self as $crate::var::SymbolType>::DOMAIN.members[index],
                )
            }

            fn from_symbol(sym: $crate::var::Symbol) -> Option<Self> {
                if !<Self as $crate::var::SymbolType>::DOMAIN.contains(sym) {
                    return None;
                }
                Self::ALL.get(sym.index() as usize).copied()
            }
        }

        impl $crate::var::VarType for $name {
            fn guard() -> $crate::var::TypeGuard {
                $crate::var::TypeGuard::Symbol(<Self as $crate::var::SymbolType>::DOMAIN)
            }

            fn to_datum(&self) -> $crate::var::Datum {
                $crate::var::Datum::Symbol($crate::var::SymbolType::symbol(*self))
            }

            fn from_datum(datum: &$crate::var::Datum) -> Option<Self> {
                match datum {
                    $crate::var::Datum::Symbol(sym) => {
                        <Self as $crate::var::SymbolType>::from_symbol(*sym)
                    }
                    _ => None,
                }
            }
        }
    };
}
