use anyhow::Context;
use docqa_core::document::{DocumentSummary, ElementParser};
use docqa_core::embeddings::{ChunkStats, SectionChunker};
use docqa_core::Settings;
use std::path::Path;

pub fn run(input: &Path, json: bool, settings: &Settings) -> anyhow::Result<()> {
    let parser = ElementParser::new(settings.parser.clone())?;
    let elements = parser
        .parse_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    log::debug!("Parsed {} elements from {}", elements.len(), input.display());
    let chunks = SectionChunker::new(settings.chunking.clone()).create_chunks(&elements);

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    let summary = DocumentSummary::from_elements(&elements);
    let stats = ChunkStats::from_chunks(&chunks);

    println!("Document: {}", input.display());
    println!();
    println!("Elements: {}", summary.total_elements);
    for (element_type, count) in &summary.type_counts {
        println!("  {:<16} {}", element_type, count);
    }
    println!("Sections: {}", summary.sections.join(", "));
    println!();
    println!("Chunks:      {}", stats.total_chunks);
    println!("Words:       {}", stats.total_words);
    println!("Mean size:   {:.1}", stats.mean_words);
    println!("Structured:  {}", stats.structured_chunks);
    println!(
        "Sizes:       {} small, {} medium, {} large",
        stats.small, stats.medium, stats.large
    );

    Ok(())
}
