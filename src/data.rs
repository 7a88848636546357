//! Labeled trees and the correspondences computed between them.
pub mod context;
pub mod mapping;

pub use context::{Concept, Context, Node, NodeId};
pub use mapping::{Mapping, MappingElement, Relation};
