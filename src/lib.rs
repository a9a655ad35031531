use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fmt;

mod config;
mod core_dom_utils;
mod dom;
mod events;
mod html;
mod page;
mod selector;
mod tree;

use core_dom_utils::*;
use dom::{Dom, Element};
use events::{EventState, Listener, ListenerStore};
use html::parse_html;
use selector::*;
use tree::{FoldId, FoldNode, FoldTree, element_label};

pub use config::TreeConfig;
pub use page::ReportPage;
pub use tree::{Direction, FoldState, FoldSummary, InertReason, NodeKind};

// Recursive walks grow the stack on demand so deeply nested reports cannot
// overflow it.
pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;
pub(crate) const STACK_GROWTH: usize = 2 * 1024 * 1024;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    UnknownNode(String),
    InvalidConfig(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::UnknownNode(id) => write!(f, "no collapsible node with id: {id}"),
            Self::InvalidConfig(msg) => write!(f, "invalid tree config: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

#[cfg(test)]
mod tests;
