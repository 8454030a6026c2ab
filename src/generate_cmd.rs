//! Generate command: draw a random chain and persist it.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use markovtool_chain::{ChainDescription, InitialState, write_json};

use crate::cli::GenerateArgs;

/// Run the generate command.
pub fn run(args: GenerateArgs) -> Result<()> {
    let _cmd = info_span!("generate").entered();

    let mut description = ChainDescription::random(args.dimension, args.seed)
        .context("failed to draw a random chain")?;
    if let Some(state) = args.initial {
        description
            .set_initial_state(InitialState::Fixed(state))
            .context("invalid --initial")?;
    }

    write_json(&description, &args.output)
        .with_context(|| format!("failed to write chain: {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        dimension = args.dimension,
        "chain written"
    );
    Ok(())
}
