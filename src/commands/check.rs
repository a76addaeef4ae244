use anyhow::{Result, bail};
use tracing::{error, info};

use super::pipeline::{DocumentPipeline, discover_inputs};
use crate::cli::CheckArgs;

pub fn run(args: CheckArgs) -> Result<()> {
    let sources = discover_inputs(&args.inputs)?;
    let pipeline = DocumentPipeline::new(&args.pipeline, true)?;

    info!(documents = sources.len(), "starting check");

    let mut failed = 0_usize;
    for source in &sources {
        match pipeline.run(source) {
            Ok(document) => {
                let counts = document.counts();
                info!(
                    source = %source.display(),
                    units = counts.units,
                    modules = counts.modules,
                    questions = counts.questions,
                    clusters = counts.clusters,
                    "document passed"
                );
            }
            Err(err) => {
                failed += 1;
                error!(
                    source = %source.display(),
                    kind = err.kind(),
                    error = %err,
                    "document failed"
                );
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} documents failed checks", sources.len());
    }

    info!(documents = sources.len(), "check completed");
    Ok(())
}
