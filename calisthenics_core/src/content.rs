//! External content packs.
//!
//! A content pack is a JSON document that replaces the built-in exercises
//! and progression trees:
//!
//! ```json
//! {
//!   "exercises": [ { "id": "...", "name": "...", "category": "skill", ... } ],
//!   "trees": [
//!     { "skill": "handstand", "root": "hs-wall-plank",
//!       "nodes": [ { "id": "hs-wall-plank", "name": "Wall Plank", "level": 1,
//!                    "criteria": { "hold_time": 60 }, "next": ["hs-pike-pushup"] } ] }
//!   ]
//! }
//! ```

use crate::catalog::Catalog;
use crate::tree::{ProgressionTree, TreeStore};
use crate::types::{Exercise, MasteryCriteria, ProgressionNode, Skill};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    trees: Vec<TreeFile>,
}

#[derive(Debug, Deserialize)]
struct TreeFile {
    skill: Skill,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeFile>,
}

#[derive(Debug, Deserialize)]
struct NodeFile {
    id: String,
    name: String,
    level: u32,
    #[serde(default, alias = "exercise_ids")]
    exercises: Vec<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    criteria: MasteryCriteria,
    #[serde(default, alias = "next_nodes")]
    next: Vec<String>,
}

impl TreeFile {
    fn into_tree(self) -> ProgressionTree {
        let mut tree = ProgressionTree::new(self.skill);
        let mut edges = Vec::new();

        for node in self.nodes {
            edges.extend(node.next.iter().map(|to| (node.id.clone(), to.clone())));
            tree.add_node(ProgressionNode {
                id: node.id,
                name: node.name,
                level: node.level,
                skill: self.skill,
                exercise_ids: node.exercises,
                prerequisites: node.prerequisites,
                criteria: node.criteria,
                next_nodes: Vec::new(),
            });
        }
        for (from, to) in &edges {
            tree.link(from, to);
        }
        if let Some(root) = &self.root {
            tree.set_root(root);
        }
        tree
    }
}

/// Parse a content pack from a JSON string and validate it
pub fn parse_content_pack(json: &str) -> Result<(Catalog, TreeStore)> {
    let file: ContentFile = serde_json::from_str(json)?;

    let catalog = Catalog::from_exercises(file.exercises);
    let errors = catalog.validate();
    if !errors.is_empty() {
        return Err(Error::CatalogValidation(errors.join("; ")));
    }

    let mut trees = TreeStore::new();
    for tree in file.trees {
        if trees.get_tree(tree.skill).is_some() {
            return Err(Error::Content(format!("{} tree defined twice", tree.skill)));
        }
        trees.insert(tree.into_tree());
    }
    let errors = trees.validate();
    if !errors.is_empty() {
        return Err(Error::Content(errors.join("; ")));
    }

    for category in catalog.missing_categories() {
        tracing::warn!("Content pack has no {} exercises; that section will be empty", category);
    }
    Ok((catalog, trees))
}

/// Load a content pack file
pub fn load_content_pack(path: &Path) -> Result<(Catalog, TreeStore)> {
    let contents = std::fs::read_to_string(path)?;
    let content = parse_content_pack(&contents)?;
    tracing::info!(
        "Loaded {} exercises and {} trees from {:?}",
        content.0.len(),
        content.1.skills().len(),
        path
    );
    Ok(content)
}
