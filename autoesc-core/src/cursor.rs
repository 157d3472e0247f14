//! Input cursors.
//!
//! Character matching lives with the combinators. The log only needs to
//! hand consumed text back to the input when a branch is rolled back.

use std::fmt;

/// An immutable position in the input.
pub trait InputCursor: Sized {
    /// A cursor whose upcoming text is `raw` followed by this cursor's.
    fn insert_before(&self, raw: &str) -> Self;
}

/// A cursor over raw, undecoded characters.
///
/// `complete` is false while more input may still arrive, as when a
/// template is parsed chunk by chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCursor {
    buf: String,
    pos: usize,
    complete: bool,
}

impl RawCursor {
    /// A cursor over all of `text` with no more input to come.
    pub fn new(text: &str) -> Self {
        RawCursor {
            buf: text.to_owned(),
            pos: 0,
            complete: true,
        }
    }

    /// A cursor over `text` that may be extended later.
    pub fn partial(text: &str) -> Self {
        RawCursor {
            complete: false,
            ..RawCursor::new(text)
        }
    }

    pub fn remaining(&self) -> &str {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Moves past `n` bytes of upcoming text, clamped to the end and to a
    /// character boundary.
    pub fn advance(&self, n: usize) -> RawCursor {
        let mut pos = (self.pos + n).min(self.buf.len());
        while !self.buf.is_char_boundary(pos) {
            pos += 1;
        }
        RawCursor {
            buf: self.buf.clone(),
            pos,
            complete: self.complete,
        }
    }

    /// Moves past `prefix` if the upcoming text starts with it.
    pub fn consume_prefix(&self, prefix: &str) -> Option<RawCursor> {
        self.remaining()
            .starts_with(prefix)
            .then(|| self.advance(prefix.len()))
    }

    /// Appends more input.
    pub fn extend(&self, more: &str) -> RawCursor {
        let mut next = self.clone();
        next.buf.push_str(more);
        next
    }

    /// Marks that no more input will arrive.
    pub fn finish(&self) -> RawCursor {
        RawCursor {
            complete: true,
            ..self.clone()
        }
    }
}

impl InputCursor for RawCursor {
    fn insert_before(&self, raw: &str) -> Self {
        let mut buf = String::with_capacity(raw.len() + self.buf.len() - self.pos);
        buf.push_str(raw);
        buf.push_str(self.remaining());
        RawCursor {
            buf,
            pos: 0,
            complete: self.complete,
        }
    }
}

impl fmt::Display for RawCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::viz::write_quoted(self.remaining(), f)?;
        if !self.complete {
            f.write_str("...")?;
        }
        Ok(())
    }
}
