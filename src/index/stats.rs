use crate::index::reader::{read_cache, read_cache_header};
use crate::utils::cache_file_path;
use anyhow::{Context, Result};
use std::path::Path;

/// Display statistics for the cache in a profile directory
pub fn show_stats(profile_dir: &Path) -> Result<()> {
    let cache_path = cache_file_path(profile_dir);
    if !cache_path.exists() {
        println!("No history cache at {}", cache_path.display());
        return Ok(());
    }

    let header = read_cache_header(&cache_path).context("Failed to read cache header")?;
    let store = read_cache(&cache_path).context("Failed to load history cache")?;
    let stats = store.stats();

    println!("History Index Statistics");
    println!("========================");
    println!();
    println!("Profile:          {}", profile_dir.display());
    println!("Cache file:       {}", cache_path.display());
    println!("Cache version:    {}", header.version);
    println!("Rows:             {}", stats.rows);
    println!("Distinct words:   {}", stats.words);
    println!("Free word slots:  {}", stats.free_word_slots);
    println!("Characters:       {}", stats.chars);

    let mut schemes = std::collections::BTreeMap::new();
    for (_, row) in store.rows() {
        let scheme = crate::utils::url_scheme(&row.url).unwrap_or("(none)");
        *schemes.entry(scheme.to_ascii_lowercase()).or_insert(0usize) += 1;
    }
    if !schemes.is_empty() {
        println!();
        println!("Rows by scheme:");
        let mut sorted: Vec<_> = schemes.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (scheme, count) in sorted.iter().take(10) {
            println!("  {:15} {}", scheme, count);
        }
    }

    if let Ok(meta) = std::fs::metadata(&cache_path) {
        println!();
        println!("Cache size:       {}", format_size(meta.len()));
    }
    println!("Written:          {}", format_timestamp(header.created_at));

    Ok(())
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format unix timestamp
fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}
