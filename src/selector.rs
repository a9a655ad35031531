//! The selector forms a report page needs: `tag`, `#id` and `.class`
//! compounds joined by descendant (space) or child (`>`) relations.
//!
//! A backslash escapes the next character inside a name, so `#v4\.1` selects
//! `id="v4.1"`.

use super::*;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relation {
    Descendant,
    Child,
}

/// A compound and how it relates to the compound on its left; the leftmost
/// step has no relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) relation: Option<Relation>,
    pub(crate) compound: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    pub(crate) steps: Vec<Step>,
}

impl Selector {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        let unsupported = || Error::UnsupportedSelector(source.to_string());
        let mut chars = source.trim().chars().peekable();
        let mut steps: Vec<Step> = Vec::new();
        let mut pending: Option<Relation> = None;

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.peek() {
                None => break,
                Some('>') => {
                    if steps.is_empty() || pending.is_some() {
                        return Err(unsupported());
                    }
                    chars.next();
                    pending = Some(Relation::Child);
                }
                Some(_) => {
                    let compound = Compound::parse(&mut chars).ok_or_else(unsupported)?;
                    let relation = if steps.is_empty() {
                        None
                    } else {
                        Some(pending.take().unwrap_or(Relation::Descendant))
                    };
                    steps.push(Step { relation, compound });
                }
            }
        }

        if steps.is_empty() || pending.is_some() {
            return Err(unsupported());
        }
        Ok(Self { steps })
    }

    /// The id when the whole selector is a bare `#id`.
    pub(crate) fn id_only(&self) -> Option<&str> {
        match self.steps.as_slice() {
            [
                Step {
                    compound: Compound { tag: None, id: Some(id), classes },
                    ..
                },
            ] if classes.is_empty() => Some(id.as_str()),
            _ => None,
        }
    }
}

impl Compound {
    /// Reads one compound; `None` on anything outside the supported forms.
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Option<Self> {
        let mut compound = Self::default();
        if chars.peek().is_some_and(|c| *c == '\\' || is_name_char(*c)) {
            compound.tag = Some(read_name(chars)?.to_ascii_lowercase());
        }
        loop {
            match chars.peek() {
                Some('#') => {
                    chars.next();
                    if compound.id.replace(read_name(chars)?).is_some() {
                        return None;
                    }
                }
                Some('.') => {
                    chars.next();
                    compound.classes.push(read_name(chars)?);
                }
                Some(c) if c.is_whitespace() || *c == '>' => break,
                None => break,
                Some(_) => return None,
            }
        }
        Some(compound)
    }
}

fn read_name(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '\\' {
            chars.next();
            name.push(chars.next()?);
        } else if is_name_char(c) {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    (!name.is_empty()).then_some(name)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
