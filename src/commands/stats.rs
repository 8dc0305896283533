use docqa_core::VectorIndex;
use std::path::Path;

pub fn run(index_dir: &Path) -> anyhow::Result<()> {
    let manifest = VectorIndex::read_manifest(index_dir)?;
    let index = VectorIndex::load(index_dir)?;
    let stats = index.stats();

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Location:   {}", index_dir.display());
    println!("Records:    {}", stats.record_count);
    println!("Dimension:  {}", stats.dimension);
    println!("Model:      {}", stats.model_id);
    println!("Words:      {}", stats.total_words);
    println!("Sections:   {}", stats.distinct_sections);

    match manifest {
        Some(manifest) => {
            println!("Format:     v{}", manifest.format_version);
            println!("Created:    {}", manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("Manifest:   missing"),
    }

    Ok(())
}
