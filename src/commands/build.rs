use anyhow::Context;
use docqa_core::document::ElementParser;
use docqa_core::embeddings::build_embedder;
use docqa_core::pipeline::ParallelIndexBuilder;
use docqa_core::{SectionChunker, Settings};
use std::path::Path;

pub fn run(
    input: &Path,
    index_dir: &Path,
    fallback_dir: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    log::info!("Building index from {}", input.display());
    let parser = ElementParser::new(settings.parser.clone())?;
    let elements = parser
        .parse_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let chunks = SectionChunker::new(settings.chunking.clone()).create_chunks(&elements);
    if chunks.is_empty() {
        anyhow::bail!(
            "No chunks produced from {} ({} elements); try a lower chunking.min_words",
            input.display(),
            elements.len()
        );
    }
    println!("Parsed {} elements into {} chunks", elements.len(), chunks.len());

    let embedder = build_embedder(&settings.embedding)?;
    let index = ParallelIndexBuilder::new(settings.pipeline.clone()).build(&chunks, embedder)?;

    let written = index.save_with_fallback(index_dir, fallback_dir)?;
    if written != index_dir {
        log::warn!("Index saved to fallback {}", written.display());
        println!("Could not write {}, used fallback", index_dir.display());
    }
    println!(
        "Indexed {} chunks ({} dimensions) into {}",
        index.len(),
        index.dimension(),
        written.display()
    );

    Ok(())
}
