//! Input loading for the `infmax` binary: edge-list graphs and JSON
//! selection configs.

use std::path::Path;

use infmax_core::{GraphBuilder, ImError, InfluenceGraph, NodeId, SelectionConfig};
use thiserror::Error;

/// Activation probability for edge-list lines without a third column.
pub const DEFAULT_EDGE_PROBABILITY: f64 = 0.1;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: ImError,
    },

    #[error("invalid config file: {0}")]
    Config(#[from] serde_json::Error),
}

/// How edge-list lines are turned into edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeListOptions {
    /// Insert every edge in both directions.
    pub undirected: bool,
    /// Probability for lines that carry none.
    pub default_prob: f64,
}

impl Default for EdgeListOptions {
    fn default() -> Self {
        Self {
            undirected: false,
            default_prob: DEFAULT_EDGE_PROBABILITY,
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    what: &str,
    line: usize,
) -> Result<T, LoadError> {
    let raw = field.ok_or_else(|| LoadError::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    raw.parse().map_err(|_| LoadError::Parse {
        line,
        message: format!("invalid {what} '{raw}'"),
    })
}

/// Parses `src dst [prob]` lines separated by whitespace or commas.
///
/// Blank lines and `#` comments are skipped. Node ids are dense: the graph
/// holds every id up to the largest one seen.
pub fn parse_edge_list(source: &str, options: &EdgeListOptions) -> Result<InfluenceGraph, LoadError> {
    let mut builder = GraphBuilder::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let mut fields = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let src: u32 = parse_field(fields.next(), "source node", line)?;
        let dst: u32 = parse_field(fields.next(), "target node", line)?;
        let prob = match fields.next() {
            Some(p) => parse_field(Some(p), "probability", line)?,
            None => options.default_prob,
        };
        if let Some(extra) = fields.next() {
            return Err(LoadError::Parse {
                line,
                message: format!("unexpected trailing field '{extra}'"),
            });
        }

        let added = if options.undirected {
            builder
                .add_undirected_edge(NodeId(src), NodeId(dst), prob)
                .map(|_| ())
        } else {
            builder.add_edge(NodeId(src), NodeId(dst), prob).map(|_| ())
        };
        added.map_err(|source| LoadError::Graph { line, source })?;
    }
    Ok(builder.build())
}

pub fn load_edge_list(path: &Path, options: &EdgeListOptions) -> Result<InfluenceGraph, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_edge_list(&source, options)
}

/// Reads a [`SelectionConfig`] from JSON; missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<SelectionConfig, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use infmax_core::DiffusionModel;
    use proptest::prelude::*;

    #[test]
    fn parses_mixed_separators_and_comments() {
        let src = "# header\n0 1 0.5\n1,2\n\n2\t3 , 0.25 # trailing\n";
        let g = parse_edge_list(src, &EdgeListOptions::default()).unwrap();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.out_edges(NodeId(1)).probs, &[DEFAULT_EDGE_PROBABILITY]);
        assert_eq!(g.out_edges(NodeId(2)).probs, &[0.25]);
    }

    #[test]
    fn undirected_doubles_edges() {
        let opts = EdgeListOptions {
            undirected: true,
            default_prob: 0.3,
        };
        let g = parse_edge_list("0 1\n1 2\n", &opts).unwrap();
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.in_degree(NodeId(1)), 2);
    }

    #[test]
    fn reports_the_offending_line() {
        let opts = EdgeListOptions::default();
        let err = parse_edge_list("0 1\nx 2\n", &opts).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 2, .. }), "{err}");
        let err = parse_edge_list("0 1 0.2\n1 2 1.7\n", &opts).unwrap_err();
        assert!(
            matches!(err, LoadError::Graph { line: 2, source: ImError::InvalidProbability { .. } }),
            "{err}"
        );
        let err = parse_edge_list("0 1 0.2 9\n", &opts).unwrap_err();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));
        let err = parse_edge_list("4\n", &opts).unwrap_err();
        assert!(err.to_string().contains("missing target node"), "{err}");
    }

    #[test]
    fn config_fields_default_when_missing() {
        let cfg: SelectionConfig =
            serde_json::from_str(r#"{"budget": 3, "model": {"kind": "linear_threshold", "max_rounds": 4}}"#)
                .unwrap();
        assert_eq!(cfg.budget, 3);
        assert_eq!(cfg.model, DiffusionModel::LinearThreshold { max_rounds: 4 });
        assert_eq!(cfg.trials, SelectionConfig::default().trials);
    }

    proptest! {
        #[test]
        fn parser_never_panics(input in "[0-9 ,.#a-z\n\t-]{0,200}") {
            let _ = parse_edge_list(&input, &EdgeListOptions::default());
        }

        #[test]
        fn well_formed_lists_keep_every_edge(
            edges in prop::collection::vec((0u32..50, 0u32..50, 0.0f64..=1.0), 1..40)
        ) {
            let text: String = edges
                .iter()
                .map(|(s, d, p)| format!("{s} {d} {p}\n"))
                .collect();
            let g = parse_edge_list(&text, &EdgeListOptions::default()).unwrap();
            let max_id = edges.iter().map(|(s, d, _)| *s.max(d)).max().unwrap();
            prop_assert_eq!(g.edge_count(), edges.len());
            prop_assert_eq!(g.node_count(), max_id as usize + 1);
        }
    }
}
