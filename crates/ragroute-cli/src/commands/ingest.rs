//! Ingest command

use crate::app::{IngestArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use ragroute_core::{CollectionKey, Config, IngestSource, RagWorkflow};

pub async fn run(args: IngestArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let collection: CollectionKey = args.collection.parse()?;
    let sources: Vec<IngestSource> = args.paths.into_iter().map(IngestSource::Path).collect();

    let workflow = RagWorkflow::from_config(config).await?;
    let report = workflow.add_documents(collection, &sources).await?;

    print!("{}", output::format_ingest(&report, format));
    Ok(())
}
