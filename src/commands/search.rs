use docqa_core::embeddings::build_embedder;
use docqa_core::{RetrievalResult, Retriever, Settings, VectorIndex};
use std::path::Path;

pub fn run(
    query: &str,
    top_k: usize,
    min_score: f32,
    json: bool,
    index_dir: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    let index = VectorIndex::load(index_dir)?;
    let embedder = build_embedder(&settings.embedding)?;
    let retriever = Retriever::new(index, embedder, settings.retrieval.clone());

    let results = retriever.retrieve(query, top_k, min_score)?;
    log::info!("Retrieved {} chunks from {}", results.len(), index_dir.display());

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("Searching for: {}\n", query);

    if results.is_empty() {
        println!("No results found above score {:.2}.", min_score);
        return Ok(());
    }

    println!("Found {} results:\n", results.len());
    for result in &results {
        print_result(result);
    }

    Ok(())
}

fn print_result(result: &RetrievalResult) {
    println!(
        "[{}] {} (score: {:.3})",
        result.chunk_id,
        result.section_labels.join(" / "),
        result.score
    );
    println!("   {}", truncate(&result.text.replace('\n', " "), 120));
    println!();
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Уставный капитал", 8), "Устав...");
    }
}
