//! Ask command

use crate::app::{AskArgs, OutputFormat};
use crate::output::{self, AnswerOptions};
use anyhow::Result;
use ragroute_core::{CollectionKey, Config, QaAgent, RagWorkflow};

pub async fn run(args: AskArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let question = args.question.join(" ");

    if let Some(collection) = &args.collection {
        let collection: CollectionKey = collection.parse()?;
        let agent = QaAgent::from_config(config).await?;
        let answer = agent
            .detailed_answer(&question, Some(collection), !args.no_sources)
            .await;
        print!("{}", output::format_detailed(&answer, format));
        return Ok(());
    }

    let workflow = RagWorkflow::from_config(config).await?;
    let outcome = workflow.process_question(&question).await;

    let options = AnswerOptions {
        show_routing: !args.no_routing,
        show_sources: !args.no_sources,
    };
    print!("{}", output::format_outcome(&outcome, format, &options));
    Ok(())
}
