//! Route command

use crate::app::{OutputFormat, RouteArgs};
use crate::output;
use anyhow::Result;
use ragroute_core::{Config, RagWorkflow};

pub async fn run(args: RouteArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let question = args.question.join(" ");
    let workflow = RagWorkflow::from_config(config).await?;
    let decision = workflow.route(&question).await?;

    print!("{}", output::format_decision(&question, &decision, format));
    Ok(())
}
