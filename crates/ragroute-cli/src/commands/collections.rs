//! Collections command

use crate::app::OutputFormat;
use anyhow::Result;
use ragroute_core::COLLECTIONS;

pub async fn run(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&COLLECTIONS)?);
        }
        OutputFormat::Cli => {
            for c in COLLECTIONS.iter() {
                println!("{:<10} {} ({})", c.key.as_str(), c.name, c.collection_name);
                println!("           {}", c.description);
            }
        }
    }
    Ok(())
}
