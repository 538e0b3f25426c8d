//! Skill progression trees.
//!
//! Each tree is an arena of nodes indexed by id. Forward edges
//! (`next_nodes`) and prerequisites are id references resolved through the
//! arena, so a tree stays serializable and can be checked for cycles.

use crate::catalog::Catalog;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

/// Cached default tree store
static DEFAULT_TREES: Lazy<TreeStore> = Lazy::new(build_default_trees);

/// Get a reference to the cached default progression trees
pub fn default_trees() -> &'static TreeStore {
    &DEFAULT_TREES
}

/// Progression DAG for one skill
#[derive(Clone, Debug)]
pub struct ProgressionTree {
    skill: Skill,
    nodes: Vec<ProgressionNode>,
    index: HashMap<String, usize>,
    root: Option<String>,
}

impl ProgressionTree {
    /// An empty tree with no root
    pub fn new(skill: Skill) -> Self {
        Self {
            skill,
            nodes: Vec::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    pub fn skill(&self) -> Skill {
        self.skill
    }

    /// Add a node; the first node added becomes the root unless one is set
    pub fn add_node(&mut self, node: ProgressionNode) {
        if self.root.is_none() {
            self.root = Some(node.id.clone());
        }
        if let Some(&idx) = self.index.get(&node.id) {
            tracing::warn!(
                "Node '{}' added twice to {} tree; keeping the later one",
                node.id,
                self.skill
            );
            self.nodes[idx] = node;
            return;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn set_root(&mut self, id: &str) {
        self.root = Some(id.to_string());
    }

    /// Add a forward edge `from -> to`; ignored if `from` is unknown
    pub fn link(&mut self, from: &str, to: &str) {
        match self.index.get(from) {
            Some(&idx) => {
                let next = &mut self.nodes[idx].next_nodes;
                if !next.iter().any(|n| n == to) {
                    next.push(to.to_string());
                }
            }
            None => tracing::warn!("Cannot link from unknown node '{}'", from),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProgressionNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Entry node, absent for skills without a defined tree
    pub fn root(&self) -> Option<&ProgressionNode> {
        self.root.as_deref().and_then(|id| self.get(id))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &ProgressionNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolved forward neighbours of a node, skipping dangling edges
    pub fn next_nodes<'a>(&'a self, node: &'a ProgressionNode) -> impl Iterator<Item = &'a ProgressionNode> {
        node.next_nodes.iter().filter_map(move |id| self.get(id))
    }

    /// Catalog entries associated with a node; unknown ids are dropped
    pub fn exercises_for<'c>(&self, node: &ProgressionNode, catalog: &'c Catalog) -> Vec<&'c Exercise> {
        node.exercise_ids
            .iter()
            .filter_map(|id| catalog.get_exercise(id))
            .collect()
    }

    /// Structural checks: dangling root/edges, level decreases, cycles
    ///
    /// Unresolved prerequisites are legal (the node is simply never
    /// reachable) and only produce a warning.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(root) = &self.root {
            if !self.index.contains_key(root) {
                errors.push(format!("{} tree root '{}' is not a node", self.skill, root));
            }
        }

        for node in &self.nodes {
            if node.skill != self.skill {
                errors.push(format!(
                    "Node '{}' belongs to {} but sits in the {} tree",
                    node.id, node.skill, self.skill
                ));
            }
            for next in &node.next_nodes {
                match self.get(next) {
                    None => errors.push(format!(
                        "Node '{}' links to unknown node '{}'",
                        node.id, next
                    )),
                    Some(n) if n.level < node.level => errors.push(format!(
                        "Level decreases along '{}' ({}) -> '{}' ({})",
                        node.id, node.level, n.id, n.level
                    )),
                    Some(_) => {}
                }
            }
            for req in &node.prerequisites {
                if !self.index.contains_key(req) {
                    tracing::warn!(
                        "Node '{}' requires unknown node '{}'; it will stay locked",
                        node.id,
                        req
                    );
                }
            }
        }

        if let Some(id) = self.find_cycle() {
            errors.push(format!("{} tree has a cycle through '{}'", self.skill, id));
        }

        errors
    }

    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(tree: &ProgressionTree, idx: usize, marks: &mut [Mark]) -> Option<String> {
            marks[idx] = Mark::Active;
            for next in &tree.nodes[idx].next_nodes {
                let Some(&n) = tree.index.get(next) else {
                    continue;
                };
                match marks[n] {
                    Mark::Active => return Some(tree.nodes[n].id.clone()),
                    Mark::New => {
                        if let Some(id) = visit(tree, n, marks) {
                            return Some(id);
                        }
                    }
                    Mark::Done => {}
                }
            }
            marks[idx] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        for idx in 0..self.nodes.len() {
            if marks[idx] == Mark::New {
                if let Some(id) = visit(self, idx, &mut marks) {
                    return Some(id);
                }
            }
        }
        None
    }
}

/// Read-only store of progression trees keyed by skill
#[derive(Clone, Debug, Default)]
pub struct TreeStore {
    trees: BTreeMap<Skill, ProgressionTree>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tree: ProgressionTree) {
        self.trees.insert(tree.skill(), tree);
    }

    pub fn get_tree(&self, skill: Skill) -> Option<&ProgressionTree> {
        self.trees.get(&skill)
    }

    /// Skills with a tree entry (possibly empty), in `Skill` order
    pub fn skills(&self) -> Vec<Skill> {
        self.trees.keys().copied().collect()
    }

    pub fn validate(&self) -> Vec<String> {
        self.trees.values().flat_map(|t| t.validate()).collect()
    }
}

fn build_tree(skill: Skill, nodes: Vec<ProgressionNode>, edges: &[(&str, &str)]) -> ProgressionTree {
    let mut tree = ProgressionTree::new(skill);
    for node in nodes {
        tree.add_node(node);
    }
    for (from, to) in edges {
        tree.link(from, to);
    }
    tree
}

fn handstand_tree() -> ProgressionTree {
    use MasteryCriteria as C;
    let s = Skill::Handstand;

    build_tree(
        s,
        vec![
            ProgressionNode::new("hs-wall-plank", "Wall Plank", 1, s)
                .exercises(&["wu-plank"])
                .criteria(C::hold(60)),
            ProgressionNode::new("hs-pike-pushup", "Pike Push-up", 2, s)
                .exercises(&["st-pushup"])
                .requires(&["hs-wall-plank"])
                .criteria(C::reps(10)),
            ProgressionNode::new("hs-wall-walk", "Wall Walk", 3, s)
                .requires(&["hs-wall-plank"])
                .criteria(C::reps(5)),
            ProgressionNode::new("hs-wall-handstand", "Wall Handstand", 4, s)
                .exercises(&["hs-wall-hold"])
                .requires(&["hs-pike-pushup", "hs-wall-walk"])
                .criteria(C::hold(60)),
            ProgressionNode::new("hs-chest-to-wall", "Chest-to-Wall Handstand", 5, s)
                .exercises(&["hs-chest-to-wall"])
                .requires(&["hs-wall-handstand"])
                .criteria(C::hold(60)),
            ProgressionNode::new("hs-toe-pulls", "Handstand Toe Pulls", 6, s)
                .exercises(&["hs-toe-pulls"])
                .requires(&["hs-chest-to-wall"])
                .criteria(C::reps(10).with_consecutive(3)),
            ProgressionNode::new("hs-heel-pulls", "Handstand Heel Pulls", 7, s)
                .exercises(&["hs-heel-pulls"])
                .requires(&["hs-toe-pulls"])
                .criteria(C::reps(10).with_consecutive(3)),
            ProgressionNode::new("hs-freestanding", "Freestanding Handstand", 8, s)
                .exercises(&["hs-freestanding"])
                .requires(&["hs-heel-pulls"])
                .criteria(C::hold(30).with_consecutive(3)),
            ProgressionNode::new("hs-freestanding-pushup", "Handstand Push-up", 9, s)
                .requires(&["hs-freestanding"])
                .criteria(C::reps(3).with_consecutive(3)),
        ],
        &[
            ("hs-wall-plank", "hs-pike-pushup"),
            ("hs-wall-plank", "hs-wall-walk"),
            ("hs-pike-pushup", "hs-wall-handstand"),
            ("hs-wall-walk", "hs-wall-handstand"),
            ("hs-wall-handstand", "hs-chest-to-wall"),
            ("hs-chest-to-wall", "hs-toe-pulls"),
            ("hs-toe-pulls", "hs-heel-pulls"),
            ("hs-heel-pulls", "hs-freestanding"),
            ("hs-freestanding", "hs-freestanding-pushup"),
        ],
    )
}

fn planche_tree() -> ProgressionTree {
    use MasteryCriteria as C;
    let s = Skill::Planche;

    build_tree(
        s,
        vec![
            ProgressionNode::new("pl-plank", "Plank", 1, s)
                .exercises(&["pl-plank"])
                .criteria(C::hold(60)),
            ProgressionNode::new("pl-elevated-plank", "Elevated Plank", 2, s)
                .exercises(&["pl-elevated-plank"])
                .requires(&["pl-plank"])
                .criteria(C::hold(45)),
            ProgressionNode::new("pl-pseudo-planche", "Pseudo Planche", 3, s)
                .exercises(&["pl-pseudo-planche"])
                .requires(&["pl-elevated-plank"])
                .criteria(C::hold(30)),
            ProgressionNode::new("pl-planche-leans", "Planche Leans", 4, s)
                .requires(&["pl-pseudo-planche"])
                .criteria(C::hold(30)),
            ProgressionNode::new("pl-tuck-planche", "Tuck Planche", 5, s)
                .exercises(&["pl-tuck-planche"])
                .requires(&["pl-planche-leans"])
                .criteria(C::hold(15).with_consecutive(3)),
            ProgressionNode::new("pl-adv-tuck-planche", "Advanced Tuck Planche", 6, s)
                .exercises(&["pl-adv-tuck-planche"])
                .requires(&["pl-tuck-planche"])
                .criteria(C::hold(10).with_consecutive(3)),
            ProgressionNode::new("pl-straddle-planche", "Straddle Planche", 8, s)
                .requires(&["pl-adv-tuck-planche"])
                .criteria(C::hold(5).with_consecutive(3)),
            ProgressionNode::new("pl-full-planche", "Full Planche", 10, s)
                .requires(&["pl-straddle-planche"])
                .criteria(C::hold(3).with_consecutive(3)),
        ],
        &[
            ("pl-plank", "pl-elevated-plank"),
            ("pl-elevated-plank", "pl-pseudo-planche"),
            ("pl-pseudo-planche", "pl-planche-leans"),
            ("pl-planche-leans", "pl-tuck-planche"),
            ("pl-tuck-planche", "pl-adv-tuck-planche"),
            ("pl-adv-tuck-planche", "pl-straddle-planche"),
            ("pl-straddle-planche", "pl-full-planche"),
        ],
    )
}

fn lsit_tree() -> ProgressionTree {
    use MasteryCriteria as C;
    let s = Skill::Lsit;

    build_tree(
        s,
        vec![
            ProgressionNode::new("ls-foot-supported", "Foot Supported L-Sit", 1, s)
                .criteria(C::hold(30)),
            ProgressionNode::new("ls-one-foot", "One-Foot Supported L-Sit", 2, s)
                .requires(&["ls-foot-supported"])
                .criteria(C::hold(30)),
            ProgressionNode::new("ls-tuck", "Tuck L-Sit", 3, s)
                .exercises(&["ls-supported-tuck"])
                .requires(&["ls-one-foot"])
                .criteria(C::hold(15).with_consecutive(3)),
            ProgressionNode::new("ls-one-leg", "One-Leg L-Sit", 4, s)
                .exercises(&["ls-one-leg-ext"])
                .requires(&["ls-tuck"])
                .criteria(C::hold(15).with_consecutive(3)),
            ProgressionNode::new("ls-full", "Full L-Sit", 5, s)
                .exercises(&["ls-full-lsit"])
                .requires(&["ls-one-leg"])
                .criteria(C::hold(30).with_consecutive(3)),
            ProgressionNode::new("ls-v-sit", "V-Sit", 7, s)
                .requires(&["ls-full"])
                .criteria(C::hold(10).with_consecutive(3)),
        ],
        &[
            ("ls-foot-supported", "ls-one-foot"),
            ("ls-one-foot", "ls-tuck"),
            ("ls-tuck", "ls-one-leg"),
            ("ls-one-leg", "ls-full"),
            ("ls-full", "ls-v-sit"),
        ],
    )
}

/// Builds the default progression trees
///
/// Front and back lever ship as empty trees without a root.
pub fn build_default_trees() -> TreeStore {
    let mut store = TreeStore::new();
    store.insert(handstand_tree());
    store.insert(planche_tree());
    store.insert(lsit_tree());
    store.insert(ProgressionTree::new(Skill::FrontLever));
    store.insert(ProgressionTree::new(Skill::BackLever));
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;

    #[test]
    fn test_default_trees_validate() {
        let store = build_default_trees();
        let errors = store.validate();
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(store.skills(), Skill::ALL.to_vec());
    }

    #[test]
    fn test_handstand_root_and_edges() {
        let store = build_default_trees();
        let tree = store.get_tree(Skill::Handstand).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.id, "hs-wall-plank");

        let next: Vec<_> = tree.next_nodes(root).map(|n| n.id.as_str()).collect();
        assert_eq!(next, vec!["hs-pike-pushup", "hs-wall-walk"]);
    }

    #[test]
    fn test_lever_trees_are_empty() {
        let store = build_default_trees();
        for skill in [Skill::FrontLever, Skill::BackLever] {
            let tree = store.get_tree(skill).unwrap();
            assert!(tree.is_empty());
            assert!(tree.root().is_none());
        }
    }

    #[test]
    fn test_cycle_detected() {
        let s = Skill::FrontLever;
        let mut tree = ProgressionTree::new(s);
        tree.add_node(ProgressionNode::new("a", "A", 1, s));
        tree.add_node(ProgressionNode::new("b", "B", 1, s));
        tree.link("a", "b");
        tree.link("b", "a");

        let errors = tree.validate();
        assert!(errors.iter().any(|e| e.contains("cycle")), "{:?}", errors);
    }

    #[test]
    fn test_level_decrease_and_dangling_edge() {
        let s = Skill::BackLever;
        let mut tree = ProgressionTree::new(s);
        tree.add_node(ProgressionNode::new("hard", "Hard", 5, s));
        tree.add_node(ProgressionNode::new("easy", "Easy", 2, s));
        tree.link("hard", "easy");
        tree.link("hard", "ghost");

        let errors = tree.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_exercises_for_drops_unknown_ids() {
        let catalog = build_default_catalog();
        let store = build_default_trees();
        let tree = store.get_tree(Skill::Handstand).unwrap();
        let node = tree.get("hs-wall-handstand").unwrap();

        // "hs-wall-hold" is not in the catalog
        assert!(tree.exercises_for(node, &catalog).is_empty());

        let plank = tree.get("hs-wall-plank").unwrap();
        let ids: Vec<_> = tree
            .exercises_for(plank, &catalog)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["wu-plank"]);
    }
}
