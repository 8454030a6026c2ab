//! Reading and writing chain descriptions.
//!
//! Two formats are supported:
//!
//! - **text**: the first line holds the dimension, each following non-empty
//!   line one comma-separated matrix row (a trailing comma is allowed).
//! - **JSON**: `{"dimension": n, "matrix": [[..], ..], "initial_state": .., "my_seed": ..}`
//!   where `initial_state` is `null`, a state index or a probability vector
//!   and `my_seed` is `null` or an integer. Both are optional, and `matrix`
//!   may be `null` for a description that has none yet.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::description::ChainDescription;
use crate::error::ChainError;
use crate::initial::InitialState;
use crate::matrix::TransitionMatrix;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChainFile {
    dimension: usize,
    #[serde(default)]
    matrix: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    initial_state: InitialState,
    #[serde(default)]
    my_seed: Option<u64>,
}

impl ChainFile {
    fn into_description(self) -> Result<ChainDescription, ChainError> {
        let mut description = ChainDescription::new(self.dimension)?;
        if let Some(rows) = self.matrix {
            description.set_matrix(TransitionMatrix::from_rows(&rows)?)?;
        }
        description.set_initial_state(self.initial_state)?;
        description.set_my_seed(self.my_seed);
        Ok(description)
    }
}

/// Parses a description from the text format.
///
/// The result is unseeded with a uniform initial state.
///
/// # Errors
///
/// Returns [`ChainError::Parse`] for malformed numbers or a missing
/// dimension line, [`ChainError::DimensionMismatch`] if the row count differs
/// from the stated dimension, and the usual matrix validation errors.
pub fn parse_txt(text: &str) -> Result<ChainDescription, ChainError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let Some((line_no, first)) = lines.next() else {
        return Err(ChainError::Parse {
            reason: "missing dimension line".to_string(),
        });
    };
    let dimension: usize = first.parse().map_err(|e| ChainError::Parse {
        reason: format!("line {line_no}: bad dimension '{first}': {e}"),
    })?;

    let mut rows = Vec::with_capacity(dimension);
    for (line_no, line) in lines {
        let row = line
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<f64>().map_err(|e| ChainError::Parse {
                    reason: format!("line {line_no}: bad weight '{field}': {e}"),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    if rows.len() != dimension {
        return Err(ChainError::DimensionMismatch {
            expected: dimension,
            got: rows.len(),
        });
    }
    ChainDescription::new(dimension)?.with_matrix(TransitionMatrix::from_rows(&rows)?)
}

/// Reads a text-format description from `path`.
pub fn read_txt(path: &Path) -> Result<ChainDescription, ChainError> {
    let text = read_to_string(path)?;
    let description = parse_txt(&text)?;
    debug!(path = %path.display(), dimension = description.dimension(), "read text chain");
    Ok(description)
}

/// Parses a description from JSON.
///
/// # Errors
///
/// Returns [`ChainError::Parse`] for malformed JSON or unknown fields, and
/// the usual validation errors for the decoded fields.
pub fn parse_json(text: &str) -> Result<ChainDescription, ChainError> {
    let file: ChainFile = serde_json::from_str(text).map_err(|e| ChainError::Parse {
        reason: e.to_string(),
    })?;
    file.into_description()
}

/// Reads a JSON description from `path`.
pub fn read_json(path: &Path) -> Result<ChainDescription, ChainError> {
    let text = read_to_string(path)?;
    let description = parse_json(&text)?;
    debug!(path = %path.display(), dimension = description.dimension(), "read JSON chain");
    Ok(description)
}

/// Serializes a description to pretty-printed JSON.
pub fn to_json(description: &ChainDescription) -> Result<String, ChainError> {
    let file = ChainFile {
        dimension: description.dimension(),
        matrix: description.matrix().map(TransitionMatrix::to_rows),
        initial_state: description.initial_state().clone(),
        my_seed: description.my_seed(),
    };
    serde_json::to_string_pretty(&file).map_err(|e| ChainError::Parse {
        reason: e.to_string(),
    })
}

/// Writes a description to `path` as pretty-printed JSON.
pub fn write_json(description: &ChainDescription, path: &Path) -> Result<(), ChainError> {
    let json = to_json(description)?;
    std::fs::write(path, json).map_err(|e| io_error(path, &e))?;
    debug!(path = %path.display(), "wrote JSON chain");
    Ok(())
}

fn read_to_string(path: &Path) -> Result<String, ChainError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, &e))
}

fn io_error(path: &Path, e: &std::io::Error) -> ChainError {
    ChainError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_with_trailing_commas() {
        let text = "3\n0.1, 0.2, 0.7,\n0.5, 0.5, 0.0,\n\n1.0, 0.0, 0.0,\n";
        let d = parse_txt(text).unwrap();
        assert_eq!(d.dimension(), 3);
        assert_eq!(d.matrix().unwrap().row(0), &[0.1, 0.2, 0.7]);
        assert_eq!(d.my_seed(), None);
        assert_eq!(d.initial_state(), &InitialState::Uniform);
    }

    #[test]
    fn txt_row_count_must_match() {
        let result = parse_txt("3\n0.5,0.5\n0.5,0.5\n");
        assert_eq!(
            result,
            Err(ChainError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn txt_bad_numbers() {
        assert!(matches!(parse_txt(""), Err(ChainError::Parse { .. })));
        assert!(matches!(parse_txt("two\n"), Err(ChainError::Parse { .. })));
        let result = parse_txt("2\n0.5, x\n0.5, 0.5\n");
        match result {
            Err(ChainError::Parse { reason }) => assert!(reason.contains("line 2")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn txt_non_stochastic_rejected() {
        let result = parse_txt("2\n0.5, 0.6\n0.5, 0.5\n");
        assert!(matches!(result, Err(ChainError::InvalidMatrix { .. })));
    }

    #[test]
    fn json_minimal() {
        let d = parse_json(r#"{"dimension": 2, "matrix": [[1.0, 0.0], [0.3, 0.7]]}"#).unwrap();
        assert_eq!(d.my_seed(), None);
        assert_eq!(d.initial_state(), &InitialState::Uniform);
        assert_eq!(d.matrix().unwrap().prob(1, 1), 0.7);
    }

    #[test]
    fn json_full() {
        let text = r#"{
            "dimension": 2,
            "matrix": [[0.5, 0.5], [0.3, 0.7]],
            "initial_state": [0.25, 0.75],
            "my_seed": 42
        }"#;
        let d = parse_json(text).unwrap();
        assert_eq!(d.my_seed(), Some(42));
        assert_eq!(d.initial_state(), &InitialState::Distribution(vec![0.25, 0.75]));
    }

    #[test]
    fn json_without_matrix() {
        let d = parse_json(r#"{"dimension": 4, "matrix": null, "initial_state": 3}"#).unwrap();
        assert!(d.matrix().is_none());
        assert_eq!(d.initial_state(), &InitialState::Fixed(3));
    }

    #[test]
    fn json_dimension_must_match_matrix() {
        let result = parse_json(r#"{"dimension": 3, "matrix": [[1.0, 0.0], [0.0, 1.0]]}"#);
        assert_eq!(
            result,
            Err(ChainError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn json_rejects_unknown_fields_and_bad_state() {
        let unknown = parse_json(r#"{"dimension": 1, "matrix": [[1.0]], "seed": 1}"#);
        assert!(matches!(unknown, Err(ChainError::Parse { .. })));
        let bad_state = parse_json(r#"{"dimension": 1, "matrix": [[1.0]], "initial_state": 1}"#);
        assert!(matches!(bad_state, Err(ChainError::InvalidState { .. })));
    }

    #[test]
    fn json_round_trip() {
        let d = ChainDescription::random(3, Some(9))
            .unwrap()
            .with_initial_state(InitialState::Fixed(2))
            .unwrap();
        let back = parse_json(&to_json(&d).unwrap()).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("chain.txt");
        std::fs::write(&txt, "2\n0.9, 0.1\n0.2, 0.8\n").unwrap();
        let d = read_txt(&txt).unwrap().with_seed(Some(1));

        let json = dir.path().join("chain.json");
        write_json(&d, &json).unwrap();
        assert_eq!(read_json(&json).unwrap(), d);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_json(&dir.path().join("absent.json"));
        match result {
            Err(ChainError::Io { path, .. }) => assert!(path.ends_with("absent.json")),
            other => panic!("expected i/o error, got {other:?}"),
        }
    }
}
