//! Simulate command: walk a chain, branch it and report distinct trajectories.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span};

use markovtool_chain::{ChainDescription, Collector, Endless, InitialState, read_json, read_txt};

use crate::cli::SimulateArgs;
use crate::config::{ChainToml, SimulateConfig};

#[derive(Debug, Serialize)]
struct Report {
    dimension: usize,
    seed: Option<u64>,
    instances: usize,
    distinct: usize,
    trajectories: Vec<TrajectoryReport>,
}

#[derive(Debug, Serialize)]
struct TrajectoryReport {
    members: Vec<u64>,
    states: Vec<usize>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> Result<()> {
    let _cmd = info_span!("simulate").entered();
    let config = SimulateConfig::load(&args.config)?;
    let seed = args.seed.or(config.seed);

    let description = build_description(&config.chain, seed)?;
    info!(
        dimension = description.dimension(),
        seed = ?description.my_seed(),
        "chain ready"
    );

    let collector = Collector::new();
    let mut root = Endless::new(description);
    collector.register(&mut root);
    root.skip(config.run.prefix)
        .context("failed to walk the chain")?;

    let mut walks = Vec::with_capacity(1 + config.run.branches + config.run.branch_states.len());
    for _ in 0..config.run.branches {
        walks.push(root.branch(None)?);
    }
    for &state in &config.run.branch_states {
        walks.push(
            root.branch(Some(state))
                .with_context(|| format!("failed to branch into state {state}"))?,
        );
    }
    walks.insert(0, root);

    for walk in &mut walks {
        walk.skip(config.run.steps)?;
    }

    let trajectories = collector.trajectories();
    info!(
        instances = collector.len(),
        distinct = trajectories.len(),
        "simulation complete"
    );

    let report = Report {
        dimension: walks[0].description().dimension(),
        seed: walks[0].description().my_seed(),
        instances: collector.len(),
        distinct: trajectories.len(),
        trajectories: trajectories
            .iter()
            .map(|t| TrajectoryReport {
                members: t.members().iter().map(|id| id.get()).collect(),
                states: t.states().to_vec(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;

    match args.output.as_ref().or(config.output.as_ref()) {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Load or draw the chain described by `[chain]`, then apply the seed and
/// initial-state overrides.
fn build_description(chain: &ChainToml, seed: Option<u64>) -> Result<ChainDescription> {
    let mut description = match &chain.source {
        Some(path) => {
            let loaded = load_source(path)?;
            match seed {
                Some(s) => loaded.with_seed(Some(s)),
                None => loaded,
            }
        }
        None => ChainDescription::random(chain.dimension, seed)
            .context("failed to draw a random chain")?,
    };
    if let Some(state) = chain.initial_state {
        description
            .set_initial_state(InitialState::Fixed(state))
            .context("invalid [chain].initial_state")?;
    }
    Ok(description)
}

fn load_source(path: &Path) -> Result<ChainDescription> {
    info!(path = %path.display(), "reading chain");
    let is_txt = path.extension().is_some_and(|ext| ext == "txt");
    let loaded = if is_txt { read_txt(path) } else { read_json(path) };
    loaded.with_context(|| format!("failed to load chain: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_chain_takes_seed_and_initial() {
        let chain = ChainToml {
            source: None,
            dimension: 3,
            initial_state: Some(2),
        };
        let d = build_description(&chain, Some(5)).unwrap();
        assert_eq!(d.dimension(), 3);
        assert_eq!(d.my_seed(), Some(5));
        assert_eq!(d.initial_state(), &InitialState::Fixed(2));
    }

    #[test]
    fn loaded_chain_keeps_its_seed_unless_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(
            &path,
            r#"{"dimension": 2, "matrix": [[0.5, 0.5], [0.5, 0.5]], "my_seed": 3}"#,
        )
        .unwrap();
        let chain = ChainToml {
            source: Some(path),
            dimension: 99,
            initial_state: None,
        };
        assert_eq!(build_description(&chain, None).unwrap().my_seed(), Some(3));
        assert_eq!(build_description(&chain, Some(8)).unwrap().my_seed(), Some(8));
    }

    #[test]
    fn bad_initial_state_is_reported() {
        let chain = ChainToml {
            source: None,
            dimension: 2,
            initial_state: Some(5),
        };
        let err = build_description(&chain, Some(0)).unwrap_err();
        assert!(format!("{err:#}").contains("initial_state"));
    }
}
