//! Workflow content tree
//!
//! Stages contain steps, steps contain nodes, nodes carry tags. The tree is
//! built once at startup and only ever changes through tag edits and tag
//! generation.

mod provider;
mod seed;

pub use provider::{provider_from_config, ContentProvider};
pub use seed::default_tree;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Empty {0} id")]
    EmptyId(&'static str),
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{kind} {id} has number {found}, expected {expected}")]
    OrdinalMismatch {
        kind: &'static str,
        id: String,
        expected: u32,
        found: u32,
    },
    #[error("Failed to read content file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse content file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Kind of work a node performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Analysis,
    Validation,
    Enrichment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Tag {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Node {
    pub fn tag(&self, tag_id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == tag_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub name: String,
    pub description: String,
    pub step_number: u32,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Step {
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub description: String,
    pub stage_number: u32,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }
}

/// Fully qualified address of a node. Node ids are only unique within
/// their step, so mutations always go through a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    pub stage_id: String,
    pub step_id: String,
    pub node_id: String,
}

impl NodePath {
    pub fn new(
        stage_id: impl Into<String>,
        step_id: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            step_id: step_id.into(),
            node_id: node_id.into(),
        }
    }
}

/// Ordered sequence of stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTree {
    stages: Vec<Stage>,
}

impl ContentTree {
    /// Build a tree, checking id uniqueness and ordinal contiguity
    pub fn new(stages: Vec<Stage>) -> Result<Self, ContentError> {
        let tree = Self { stages };
        tree.validate()?;
        Ok(tree)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// Resolve a path to its node, or None if any level is missing
    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        self.stage(&path.stage_id)?
            .step(&path.step_id)?
            .node(&path.node_id)
    }

    fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        self.stages
            .iter_mut()
            .find(|s| s.id == path.stage_id)?
            .steps
            .iter_mut()
            .find(|s| s.id == path.step_id)?
            .nodes
            .iter_mut()
            .find(|n| n.id == path.node_id)
    }

    /// Overwrite a tag's description in place. Returns false if the node or
    /// tag does not exist.
    pub fn set_tag_description(&mut self, path: &NodePath, tag_id: &str, description: &str) -> bool {
        let Some(tag) = self
            .node_at_mut(path)
            .and_then(|node| node.tags.iter_mut().find(|t| t.id == tag_id))
        else {
            return false;
        };
        description.clone_into(&mut tag.description);
        true
    }

    /// Append tags to a node. Tags whose id already exists on the node are
    /// skipped. Returns the number appended, or None if the node is unknown.
    pub fn append_tags(&mut self, path: &NodePath, tags: &[Tag]) -> Option<usize> {
        let node = self.node_at_mut(path)?;
        let mut appended = 0;
        for tag in tags {
            if node.tags.iter().any(|t| t.id == tag.id) {
                tracing::warn!(node_id = %path.node_id, tag_id = %tag.id, "Skipping duplicate tag id");
                continue;
            }
            node.tags.push(tag.clone());
            appended += 1;
        }
        Some(appended)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        let mut stage_ids = HashSet::new();
        for (stage_idx, stage) in self.stages.iter().enumerate() {
            check_id("stage", &stage.id, &mut stage_ids)?;
            check_ordinal("stage", &stage.id, stage_idx, stage.stage_number)?;

            let mut step_ids = HashSet::new();
            for (step_idx, step) in stage.steps.iter().enumerate() {
                check_id("step", &step.id, &mut step_ids)?;
                check_ordinal("step", &step.id, step_idx, step.step_number)?;

                let mut node_ids = HashSet::new();
                for node in &step.nodes {
                    check_id("node", &node.id, &mut node_ids)?;

                    let mut tag_ids = HashSet::new();
                    for tag in &node.tags {
                        check_id("tag", &tag.id, &mut tag_ids)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_id<'a>(
    kind: &'static str,
    id: &'a str,
    seen: &mut HashSet<&'a str>,
) -> Result<(), ContentError> {
    if id.trim().is_empty() {
        return Err(ContentError::EmptyId(kind));
    }
    if !seen.insert(id) {
        return Err(ContentError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    Ok(())
}

fn check_ordinal(
    kind: &'static str,
    id: &str,
    index: usize,
    found: u32,
) -> Result<(), ContentError> {
    let expected = u32::try_from(index + 1).unwrap_or(u32::MAX);
    if found == expected {
        Ok(())
    } else {
        Err(ContentError::OrdinalMismatch {
            kind,
            id: id.to_string(),
            expected,
            found,
        })
    }
}
