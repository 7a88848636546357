//! Flat word lists: one label per line, gathered under a synthetic root.
//!
//! Neither side of this format is structured; it can only be converted, not
//! matched.
use super::{ContextLoader, ContextRenderer};
use crate::config::ComponentParams;
use crate::data::Context;
use crate::output;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

const DEFAULT_ROOT_NAME: &str = "Top";

#[derive(Debug)]
pub struct WordListLoader {
    root_name: String,
}

impl WordListLoader {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&["root_name"])?;
        let root_name = params
            .string("root_name")?
            .unwrap_or_else(|| DEFAULT_ROOT_NAME.to_string());
        Ok(WordListLoader { root_name })
    }
}

impl ContextLoader for WordListLoader {
    fn load(&self, locator: &Path) -> Result<Context> {
        let text = fs::read_to_string(locator)
            .with_context(|| format!("read {}", locator.display()))?;
        let mut context = Context::new();
        let root = context.create_root(&self.root_name);
        for line in text.lines() {
            let label = line.trim();
            if !label.is_empty() {
                context.create_child(root, label);
            }
        }
        Ok(context)
    }

    fn is_structured(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct WordListRenderer;

impl WordListRenderer {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(WordListRenderer)
    }
}

impl ContextRenderer for WordListRenderer {
    fn render(&self, context: &Context, locator: &Path) -> Result<()> {
        let mut out = String::new();
        for id in context.preorder().into_iter().skip(1) {
            out.push_str(&context.node(id).name);
            out.push('\n');
        }
        output::write_text(locator, &out)
    }

    fn is_structured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_hang_off_a_synthetic_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("words.txt");
        std::fs::write(&input, "apple\n\n  pear \n").expect("write");

        let loader = WordListLoader::from_params(&ComponentParams::default()).expect("loader");
        let context = loader.load(&input).expect("load");
        assert_eq!(context.len(), 3);
        assert!(context.find_by_path(&["Top", "pear"]).is_some());

        let output = dir.path().join("out.txt");
        WordListRenderer.render(&context, &output).expect("render");
        assert_eq!(
            std::fs::read_to_string(&output).expect("read"),
            "apple\npear\n"
        );
    }
}
