//! WordNet cache builder behind the `wntoflat` command.
//!
//! Reads tab-separated relation dumps from a dictionary directory and writes one
//! lookup cache per relation kind. Pair caches are sorted and deduplicated so a
//! reader can binary-search them; the multiword cache indexes expressions by
//! their first word.
use crate::error::SmatchError;
use crate::output::write_json;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheKind {
    AdjectiveSynonyms,
    AdjectiveAntonyms,
    NounHypernyms,
    NounAntonyms,
    AdverbAntonyms,
    VerbHypernyms,
    Nominalizations,
    Multiwords,
}

impl CacheKind {
    /// Positional order of the cache paths on the command line.
    pub const ALL: [CacheKind; 8] = [
        CacheKind::AdjectiveSynonyms,
        CacheKind::AdjectiveAntonyms,
        CacheKind::NounHypernyms,
        CacheKind::NounAntonyms,
        CacheKind::AdverbAntonyms,
        CacheKind::VerbHypernyms,
        CacheKind::Nominalizations,
        CacheKind::Multiwords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::AdjectiveSynonyms => "adjective_synonyms",
            CacheKind::AdjectiveAntonyms => "adjective_antonyms",
            CacheKind::NounHypernyms => "noun_hypernyms",
            CacheKind::NounAntonyms => "noun_antonyms",
            CacheKind::AdverbAntonyms => "adverb_antonyms",
            CacheKind::VerbHypernyms => "verb_hypernyms",
            CacheKind::Nominalizations => "nominalizations",
            CacheKind::Multiwords => "multiwords",
        }
    }

    /// Default source file name inside the dictionary directory.
    pub fn source_name(&self) -> &'static str {
        match self {
            CacheKind::AdjectiveSynonyms => "adj.syn",
            CacheKind::AdjectiveAntonyms => "adj.ant",
            CacheKind::NounHypernyms => "noun.hyp",
            CacheKind::NounAntonyms => "noun.ant",
            CacheKind::AdverbAntonyms => "adv.ant",
            CacheKind::VerbHypernyms => "verb.hyp",
            CacheKind::Nominalizations => "nominalizations",
            CacheKind::Multiwords => "multiwords",
        }
    }

    /// Synonymy and antonymy hold in both directions.
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            CacheKind::AdjectiveSynonyms
                | CacheKind::AdjectiveAntonyms
                | CacheKind::NounAntonyms
                | CacheKind::AdverbAntonyms
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        CacheKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `wntoflat` invocation: the properties file and an output per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub properties: PathBuf,
    pub outputs: Vec<(CacheKind, PathBuf)>,
}

impl CacheRequest {
    /// Pair the positional paths with [`CacheKind::ALL`]; `None` unless all
    /// nine paths are present.
    pub fn from_args(args: &[String]) -> Option<Self> {
        let (properties, rest) = args.split_first()?;
        if rest.len() < CacheKind::ALL.len() {
            return None;
        }
        let outputs = CacheKind::ALL
            .into_iter()
            .zip(rest.iter().map(PathBuf::from))
            .collect();
        Some(CacheRequest {
            properties: PathBuf::from(properties),
            outputs,
        })
    }
}

/// Entry point the dispatcher calls for `wntoflat`.
pub trait CacheBuilder {
    fn build(&self, request: &CacheRequest) -> Result<(), SmatchError>;
}

#[derive(Debug, Default)]
pub struct WordNetCacheBuilder;

impl CacheBuilder for WordNetCacheBuilder {
    fn build(&self, request: &CacheRequest) -> Result<(), SmatchError> {
        build_caches(request).map_err(|cause| SmatchError::Cache { cause })
    }
}

fn build_caches(request: &CacheRequest) -> Result<()> {
    let start = Instant::now();
    let properties = CacheProperties::read(&request.properties)?;
    for (kind, output) in &request.outputs {
        let source = properties.source(*kind);
        let text = fs::read_to_string(&source)
            .with_context(|| format!("read {kind} source {}", source.display()))?;
        let entries = if *kind == CacheKind::Multiwords {
            let cache = MultiwordCache::parse(&text, &source)?;
            write_json(output, &cache)?;
            cache.len()
        } else {
            let cache = PairCache::parse(*kind, &text, &source)?;
            write_json(output, &cache)?;
            cache.len()
        };
        tracing::info!(kind = %kind, entries, path = %output.display(), "wrote cache");
    }
    tracing::info!(
        caches = request.outputs.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "wordnet caches complete"
    );
    Ok(())
}

/// Settings read from the `key=value` properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheProperties {
    pub dictionary: PathBuf,
    pub sources: BTreeMap<CacheKind, String>,
}

impl CacheProperties {
    pub fn read(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read properties {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, path, base)
    }

    /// Parse properties; a relative `dictionary_path` is resolved against `base`.
    pub fn parse(text: &str, origin: &Path, base: &Path) -> Result<Self> {
        let mut dictionary = None;
        let mut sources = BTreeMap::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                anyhow!("{}:{}: expected key=value", origin.display(), index + 1)
            })?;
            let (key, value) = (key.trim(), value.trim());
            if key == "dictionary_path" {
                dictionary = Some(base.join(value));
            } else if let Some(name) = key.strip_prefix("source.") {
                let kind = CacheKind::from_name(name).ok_or_else(|| {
                    anyhow!(
                        "{}:{}: unknown cache kind {name:?}",
                        origin.display(),
                        index + 1
                    )
                })?;
                sources.insert(kind, value.to_string());
            } else {
                tracing::debug!(key, "ignoring unrelated property");
            }
        }
        let dictionary = dictionary
            .ok_or_else(|| anyhow!("{}: dictionary_path is not set", origin.display()))?;
        Ok(CacheProperties {
            dictionary,
            sources,
        })
    }

    pub fn source(&self, kind: CacheKind) -> PathBuf {
        let name = self
            .sources
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(kind.source_name());
        self.dictionary.join(name)
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Sorted, deduplicated word pairs for one relation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCache {
    pub kind: String,
    pub symmetric: bool,
    pub pairs: Vec<(String, String)>,
}

impl PairCache {
    pub fn parse(kind: CacheKind, text: &str, origin: &Path) -> Result<Self> {
        let mut pairs = BTreeSet::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<String> = line.split('\t').map(normalize).collect();
            let [left, right] = fields.as_slice() else {
                return Err(anyhow!(
                    "{}:{}: expected two tab-separated words",
                    origin.display(),
                    index + 1
                ));
            };
            if left.is_empty() || right.is_empty() {
                return Err(anyhow!("{}:{}: empty word", origin.display(), index + 1));
            }
            if kind.is_symmetric() && left > right {
                pairs.insert((right.clone(), left.clone()));
            } else {
                pairs.insert((left.clone(), right.clone()));
            }
        }
        Ok(PairCache {
            kind: kind.as_str().to_string(),
            symmetric: kind.is_symmetric(),
            pairs: pairs.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, left: &str, right: &str) -> bool {
        let (left, right) = (normalize(left), normalize(right));
        let (left, right) = if self.symmetric && left > right {
            (right, left)
        } else {
            (left, right)
        };
        let needle = (left.as_str(), right.as_str());
        self.pairs
            .binary_search_by(|(a, b)| (a.as_str(), b.as_str()).cmp(&needle))
            .is_ok()
    }
}

/// Multiword expressions keyed by their first word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiwordCache {
    pub expressions: BTreeMap<String, BTreeSet<String>>,
}

impl MultiwordCache {
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut cache = MultiwordCache::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let words: Vec<String> = line
                .split(|c: char| c.is_whitespace() || c == '_')
                .filter(|word| !word.is_empty())
                .map(normalize)
                .collect();
            if words.len() < 2 {
                return Err(anyhow!(
                    "{}:{}: a multiword needs at least two words",
                    origin.display(),
                    index + 1
                ));
            }
            cache
                .expressions
                .entry(words[0].clone())
                .or_default()
                .insert(words.join(" "));
        }
        Ok(cache)
    }

    pub fn len(&self) -> usize {
        self.expressions.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn starting_with(&self, word: &str) -> impl Iterator<Item = &str> + '_ {
        self.expressions
            .get(&normalize(word))
            .into_iter()
            .flat_map(|expressions| expressions.iter().map(String::as_str))
    }
}

#[cfg(test)]
#[path = "wordnet_tests.rs"]
mod tests;
