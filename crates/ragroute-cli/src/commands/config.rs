//! Config command

use crate::app::OutputFormat;
use anyhow::Result;
use ragroute_core::Config;

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let masked = config.masked();
    let verdict = config.validate();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "config": masked,
                "valid": verdict.is_ok(),
                "error": verdict.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(unset)".to_string());

            println!("Chat:");
            println!("  Base URL:        {}", masked.chat.base_url);
            println!("  Model:           {}", masked.chat.model);
            println!("  API key:         {}", show(&masked.chat.api_key));
            println!();
            println!("Embedding:");
            println!("  Model:           {}", masked.embedding.model);
            println!("  Doubao model:    {}", show(&masked.embedding.doubao_model));
            println!("  ARK API key:     {}", show(&masked.embedding.ark_api_key));
            println!();
            println!("Vector store:");
            println!("  Qdrant URL:      {}", show(&masked.vector_store.qdrant_url));
            println!("  Qdrant API key:  {}", show(&masked.vector_store.qdrant_api_key));
            println!(
                "  SQLite path:     {}",
                masked
                    .vector_store
                    .sqlite_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(unset)".to_string())
            );
            println!("  Vector size:     {}", masked.vector_store.vector_size);
            println!();
            println!("Routing threshold: {}", masked.routing.similarity_threshold);
            println!(
                "Chunking:          {} / {}",
                masked.chunking.chunk_size, masked.chunking.chunk_overlap
            );
            println!(
                "Web search:        {:?} (Tavily key: {})",
                masked.web_search.provider,
                show(&masked.web_search.tavily_api_key)
            );
            println!("Timeout:           {}s", masked.timeout_secs);
            println!();
            match verdict {
                Ok(()) => println!("Configuration is valid"),
                Err(e) => println!("Configuration is invalid: {}", e),
            }
        }
    }
    Ok(())
}
