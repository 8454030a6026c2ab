//! Fit command: estimate a chain from observed states.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use markovtool_chain::{ChainDescription, FitConfig, write_json};

use crate::cli::FitArgs;

/// Run the fit command.
pub fn run(args: FitArgs) -> Result<()> {
    let _cmd = info_span!("fit").entered();

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read states: {}", args.input.display()))?;
    let states = parse_states(&text)?;
    info!(n = states.len(), "observations loaded");

    let config = FitConfig::new()
        .with_dirichlet_alpha(args.alpha)
        .with_seed(args.seed)
        .with_initial_from_data(args.initial_from_data);
    let description =
        ChainDescription::fit(&states, args.dimension, &config).context("failed to fit chain")?;

    write_json(&description, &args.output)
        .with_context(|| format!("failed to write chain: {}", args.output.display()))?;
    info!(path = %args.output.display(), "chain written");
    Ok(())
}

fn parse_states(text: &str) -> Result<Vec<usize>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<usize>()
                .with_context(|| format!("bad state index '{token}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators() {
        assert_eq!(parse_states("0 1,2\n1, 0\n").unwrap(), vec![0, 1, 2, 1, 0]);
        assert!(parse_states("").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_indices() {
        let err = parse_states("0 1 -1").unwrap_err();
        assert!(err.to_string().contains("'-1'"));
    }
}
