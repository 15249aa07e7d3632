//! Built-in workflow used when no content file is configured

use super::{ContentTree, Node, NodeType, Stage, Step, Tag};

/// The review pipeline shipped with the dashboard: collection and validation
/// of G2 enterprise reviews, then metadata enrichment.
pub fn default_tree() -> ContentTree {
    ContentTree {
        stages: vec![
            Stage {
                id: "input-processing".into(),
                name: "Data Collection & Validation".into(),
                description: "Gather and validate enterprise review data from multiple sources"
                    .into(),
                stage_number: 1,
                steps: vec![
                    Step {
                        id: "data-collection".into(),
                        name: "Data Collection".into(),
                        description: "Collect raw data from various sources".into(),
                        step_number: 1,
                        nodes: vec![Node {
                            id: "g2-api".into(),
                            name: "G2 API Integration".into(),
                            node_type: NodeType::Analysis,
                            description: "Connect to G2 Enterprise API endpoint".into(),
                            prompt: Some(
                                "I need to fetch customer reviews from G2 and validate the data structure"
                                    .into(),
                            ),
                            tags: vec![
                                Tag::new(
                                    "api-1",
                                    "API Integration",
                                    "Connects to G2 Enterprise API to fetch review data securely",
                                ),
                                Tag::new(
                                    "input-1",
                                    "Data Input",
                                    "Handles incoming review data from G2 platform",
                                ),
                            ],
                        }],
                    },
                    Step {
                        id: "data-validation".into(),
                        name: "Data Validation".into(),
                        description: "Validate and clean collected data".into(),
                        step_number: 2,
                        nodes: vec![Node {
                            id: "validator".into(),
                            name: "Data Validator".into(),
                            node_type: NodeType::Validation,
                            description: "Validate incoming data structure".into(),
                            prompt: Some(
                                "Check if the incoming data matches our required schema and clean it"
                                    .into(),
                            ),
                            tags: vec![
                                Tag::new(
                                    "validation-1",
                                    "Data Validation",
                                    "Ensures data quality and consistency",
                                ),
                                Tag::new(
                                    "quality-1",
                                    "Quality Check",
                                    "Performs automated quality assurance on review data",
                                ),
                            ],
                        }],
                    },
                ],
            },
            Stage {
                id: "enrichment".into(),
                name: "Enrichment Group".into(),
                description: "Enhance data with additional information".into(),
                stage_number: 2,
                steps: vec![Step {
                    id: "metadata-enrichment".into(),
                    name: "Metadata Enhancement".into(),
                    description: "Add metadata to reviews".into(),
                    step_number: 1,
                    nodes: vec![Node {
                        id: "metadata".into(),
                        name: "Metadata Enrichment".into(),
                        node_type: NodeType::Enrichment,
                        description: "Add company size and industry data".into(),
                        prompt: Some(
                            "Add additional company information like size and industry to each review"
                                .into(),
                        ),
                        tags: vec![
                            Tag::new(
                                "enrichment-1",
                                "Data Enrichment",
                                "Adds valuable context to review data",
                            ),
                            Tag::new(
                                "metadata-1",
                                "Metadata",
                                "Manages additional data attributes for each review",
                            ),
                        ],
                    }],
                }],
            },
        ],
    }
}
