//! Safe SQL identifier handling.
//!
//! Identifiers can never be bound as parameters, so table and column names are
//! always emitted through [`Ident`], which backtick-quotes every part and
//! doubles embedded backticks.
//!
//! - Any character is allowed inside a part except NUL and `?`
//!   (placeholders must stay unambiguous in the rendered text)
//! - Dotted notation (`db.table`) is split into separately quoted parts
//!
//! # Example
//! ```ignore
//! use myorm::Ident;
//!
//! assert_eq!(Ident::parse("shop.users")?.to_sql(), "`shop`.`users`");
//! # Ok::<(), myorm::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<String>,
}

fn check_part(part: &str, whole: &str) -> OrmResult<()> {
    if part.is_empty() {
        return Err(OrmError::validation(format!(
            "Empty identifier segment in '{whole}'"
        )));
    }
    if part.contains('\0') {
        return Err(OrmError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    if part.contains('?') {
        return Err(OrmError::validation(format!(
            "Identifier cannot contain '?': '{whole}'"
        )));
    }
    Ok(())
}

impl Ident {
    /// A single-part identifier; dots are kept as part of the name.
    pub fn quoted(name: &str) -> OrmResult<Self> {
        check_part(name, name)?;
        Ok(Self {
            parts: vec![name.to_string()],
        })
    }

    /// Parse an identifier string, splitting on `.`.
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        let parts = s
            .split('.')
            .map(|part| check_part(part, s).map(|()| part.to_string()))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('`');
            for ch in part.chars() {
                if ch == '`' {
                    out.push_str("``");
                } else {
                    out.push(ch);
                }
            }
            out.push('`');
        }
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> OrmResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(&self)
    }
}
