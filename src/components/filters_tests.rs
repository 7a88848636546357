use super::{RedundancyFilter, RetainRelationsFilter, RootAnchoredFilter};
use crate::components::tab_tree::parse_tab_tree;
use crate::components::MappingFilter;
use crate::config::ComponentParams;
use crate::data::{Context, Mapping, NodeId, Relation};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    mapping: Mapping,
}

impl Fixture {
    fn new(source: &str, target: &str) -> Self {
        let source = Arc::new(parse_tab_tree(source).expect("source"));
        let target = Arc::new(parse_tab_tree(target).expect("target"));
        Fixture {
            mapping: Mapping::new(source, target),
        }
    }

    fn node(context: &Context, path: &str) -> NodeId {
        let names: Vec<&str> = path.split('/').collect();
        context
            .find_by_path(&names)
            .unwrap_or_else(|| panic!("missing node {path}"))
    }

    fn relate(&mut self, source: &str, relation: Relation, target: &str) -> &mut Self {
        let s = Self::node(self.mapping.source(), source);
        let t = Self::node(self.mapping.target(), target);
        self.mapping.insert(s, t, relation);
        self
    }

    fn has(&self, mapping: &Mapping, source: &str, target: &str) -> bool {
        let s = Self::node(self.mapping.source(), source);
        let t = Self::node(self.mapping.target(), target);
        mapping.relation(s, t).is_some()
    }
}

const SOURCE: &str = "Top\n\tCars\n\t\tRed\n";
const TARGET: &str = "Top\n\tAutos\n\t\tCrimson\n";

#[test]
fn redundancy_keeps_the_minimal_mapping() {
    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture
        .relate("Top", Relation::Equivalent, "Top")
        .relate("Top/Cars", Relation::LessGeneral, "Top")
        .relate("Top/Cars/Red", Relation::LessGeneral, "Top")
        .relate("Top/Cars", Relation::Equivalent, "Top/Autos")
        .relate("Top/Cars/Red", Relation::LessGeneral, "Top/Autos")
        .relate("Top", Relation::MoreGeneral, "Top/Autos/Crimson");

    let filtered = RedundancyFilter.filter(&fixture.mapping).expect("filter");

    assert!(filtered.is_subset_of(&fixture.mapping));
    assert!(fixture.has(&filtered, "Top", "Top"));
    assert!(fixture.has(&filtered, "Top/Cars", "Top/Autos"));
    // implied by Top = Top
    assert!(!fixture.has(&filtered, "Top/Cars", "Top"));
    assert!(!fixture.has(&filtered, "Top/Cars/Red", "Top"));
    // implied by Cars = Autos
    assert!(!fixture.has(&filtered, "Top/Cars/Red", "Top/Autos"));
    // implied by Top = Top through the ancestors of Crimson
    assert!(!fixture.has(&filtered, "Top", "Top/Autos/Crimson"));
    assert_eq!(filtered.len(), 2);
}

#[test]
fn redundancy_keeps_generalizations_without_an_entailing_element() {
    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture
        .relate("Top/Cars", Relation::MoreGeneral, "Top/Autos/Crimson")
        .relate("Top/Cars/Red", Relation::MoreGeneral, "Top/Autos/Crimson");

    let filtered = RedundancyFilter.filter(&fixture.mapping).expect("filter");
    // Cars > Crimson follows from Red > Crimson, since Red is below Cars
    assert_eq!(filtered.len(), 1);
    assert!(fixture.has(&filtered, "Top/Cars/Red", "Top/Autos/Crimson"));
}

#[test]
fn redundancy_drops_disjointness_below_a_disjoint_pair() {
    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture
        .relate("Top/Cars", Relation::Disjoint, "Top/Autos")
        .relate("Top/Cars/Red", Relation::Disjoint, "Top/Autos/Crimson")
        .relate("Top/Cars/Red", Relation::Disjoint, "Top/Autos");

    let filtered = RedundancyFilter.filter(&fixture.mapping).expect("filter");
    assert_eq!(filtered.len(), 1);
    assert!(fixture.has(&filtered, "Top/Cars", "Top/Autos"));
}

fn chains(depth: usize) -> Mapping {
    let chain = |prefix: &str| {
        let mut context = Context::new();
        let mut node = context.create_root(format!("{prefix}0"));
        for level in 1..depth {
            node = context.create_child(node, format!("{prefix}{level}"));
        }
        Arc::new(context)
    };
    Mapping::new(chain("s"), chain("t"))
}

#[test]
fn redundancy_scales_to_dense_mappings() {
    let depth = 200;
    let mut mapping = chains(depth);
    for s in 0..depth {
        for t in 0..depth {
            let relation = match s.cmp(&t) {
                std::cmp::Ordering::Equal => Relation::Equivalent,
                std::cmp::Ordering::Greater => Relation::LessGeneral,
                std::cmp::Ordering::Less => Relation::MoreGeneral,
            };
            mapping.insert(s, t, relation);
        }
    }

    let start = std::time::Instant::now();
    let filtered = RedundancyFilter.filter(&mapping).expect("filter");
    assert!(start.elapsed().as_secs() < 5, "took {:?}", start.elapsed());
    assert_eq!(filtered.len(), depth);
    assert!(filtered
        .elements()
        .all(|element| element.source == element.target && mapping.contains(&element)));
}

#[test]
fn redundancy_keeps_only_the_closest_generalizations() {
    let depth = 150;
    let mut mapping = chains(depth);
    for s in 0..depth {
        for t in s + 1..depth {
            mapping.insert(s, t, Relation::MoreGeneral);
        }
    }

    let filtered = RedundancyFilter.filter(&mapping).expect("filter");
    let kept: Vec<(NodeId, NodeId)> = filtered
        .elements()
        .map(|element| (element.source, element.target))
        .collect();
    let expected: Vec<(NodeId, NodeId)> = (0..depth - 1).map(|s| (s, s + 1)).collect();
    assert_eq!(kept, expected);
}

#[test]
fn root_anchored_follows_structure_from_the_roots() {
    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture
        .relate("Top", Relation::Equivalent, "Top")
        .relate("Top/Cars", Relation::Equivalent, "Top/Autos")
        .relate("Top/Cars/Red", Relation::LessGeneral, "Top/Autos/Crimson")
        .relate("Top/Cars/Red", Relation::LessGeneral, "Top/Autos");

    let filtered = RootAnchoredFilter.filter(&fixture.mapping).expect("filter");
    assert_eq!(filtered.len(), 4);

    let mut detached = Fixture::new(SOURCE, TARGET);
    detached
        .relate("Top", Relation::Equivalent, "Top")
        .relate("Top/Cars/Red", Relation::LessGeneral, "Top/Autos/Crimson");
    let filtered = RootAnchoredFilter.filter(&detached.mapping).expect("filter");
    assert_eq!(filtered.len(), 1);
    assert!(detached.has(&filtered, "Top", "Top"));
}

#[test]
fn root_anchored_fails_without_related_roots() {
    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture.relate("Top/Cars", Relation::Equivalent, "Top/Autos");
    let err = RootAnchoredFilter
        .filter(&fixture.mapping)
        .expect_err("roots unrelated");
    assert!(err.to_string().contains("unrelated"), "{err}");
}

#[test]
fn retain_relations_keeps_named_relations_only() {
    let mut params = ComponentParams::default();
    params.insert("relations", json!(["="]));
    let filter = RetainRelationsFilter::from_params(&params).expect("filter");

    let mut fixture = Fixture::new(SOURCE, TARGET);
    fixture
        .relate("Top", Relation::Equivalent, "Top")
        .relate("Top/Cars", Relation::LessGeneral, "Top");
    let filtered = filter.filter(&fixture.mapping).expect("filter");
    assert_eq!(filtered.len(), 1);
    assert!(fixture.has(&filtered, "Top", "Top"));
}

#[test]
fn retain_relations_validates_params() {
    assert!(RetainRelationsFilter::from_params(&ComponentParams::default()).is_err());

    let mut params = ComponentParams::default();
    params.insert("relations", json!([]));
    assert!(RetainRelationsFilter::from_params(&params).is_err());

    let mut params = ComponentParams::default();
    params.insert("relations", json!(["=", "~"]));
    assert!(RetainRelationsFilter::from_params(&params).is_err());
}
