//! Capability interfaces and the built-in stage implementations.
//!
//! Each trait is one pipeline capability. A manager holds at most one
//! implementation per capability; which one is decided by configuration.
use crate::data::{Context, Mapping};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub mod filters;
pub mod json_mapping;
pub mod json_tree;
pub mod matcher;
pub mod plain_mapping;
pub mod preprocess;
pub mod tab_tree;
pub mod word_list;

pub trait ContextLoader {
    fn load(&self, locator: &Path) -> Result<Context>;

    /// Whether loaded contexts keep the full tree shape of the input.
    ///
    /// Recipes that preprocess, match, or relate two contexts need this.
    fn is_structured(&self) -> bool;
}

pub trait ContextRenderer {
    fn render(&self, context: &Context, locator: &Path) -> Result<()>;

    /// Whether the output preserves tree shape and concepts.
    fn is_structured(&self) -> bool;
}

pub trait MappingLoader {
    fn load(&self, source: Arc<Context>, target: Arc<Context>, locator: &Path) -> Result<Mapping>;
}

pub trait MappingRenderer {
    fn render(&self, mapping: &Mapping, locator: &Path) -> Result<()>;
}

pub trait Preprocessor {
    /// Annotate every node with its concept, in place.
    fn preprocess(&self, context: &mut Context) -> Result<()>;
}

pub trait Matcher {
    fn compute(&self, source: Arc<Context>, target: Arc<Context>) -> Result<Mapping>;
}

pub trait MappingFilter {
    /// Return a mapping whose elements are a subset of `mapping`'s.
    fn filter(&self, mapping: &Mapping) -> Result<Mapping>;
}

/// Separator between node names in textual node paths.
pub const PATH_SEPARATOR: char = '\\';

/// Characters written as `%XX` inside a node name in a textual path.
const ESCAPED: [char; 5] = ['%', PATH_SEPARATOR, '\t', '\n', '\r'];

pub(crate) fn join_path(names: &[&str]) -> String {
    names
        .iter()
        .map(|&name| escape_name(name))
        .collect::<Vec<_>>()
        .join(&PATH_SEPARATOR.to_string())
}

/// Split a textual path and unescape each name. A `%` that does not start a
/// known escape is kept literally.
pub(crate) fn split_path(text: &str) -> Vec<String> {
    text.split(PATH_SEPARATOR).map(unescape_name).collect()
}

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ESCAPED.contains(&ch) {
            out.push_str(&format!("%{:02X}", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
    out
}

fn unescape_name(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let escaped = rest
            .get(at + 1..at + 3)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .map(char::from)
            .filter(|ch| ESCAPED.contains(ch));
        match escaped {
            Some(ch) => {
                out.push(ch);
                rest = &rest[at + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[at + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
