use crate::error::Result;
use crate::index::store::Store;
use crate::utils::{encode_id_set, encode_str, encode_varint, encode_varint_u64, write_u32_le, write_u64_le};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Magic bytes at the start of every cache file
pub const CACHE_MAGIC: &[u8; 4] = b"UIXC";

/// Current cache format version
pub const CACHE_VERSION: u32 = 1;

/// Serialize the whole store into one blob.
///
/// Layout: magic, version (u32 LE), creation time (u64 LE), then the word
/// list (freed slots as empty strings), word map, char map, the two
/// word/row maps and the row table. Map entries are written in key order,
/// never in hash order.
pub fn encode_store(store: &Store) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + store.word_list.len() * 16);
    buf.extend_from_slice(CACHE_MAGIC);
    // Writes into a Vec cannot fail
    let _ = write_u32_le(&mut buf, CACHE_VERSION);
    let _ = write_u64_le(&mut buf, now_secs());

    encode_varint(store.word_list.len() as u32, &mut buf);
    for word in &store.word_list {
        encode_str(word, &mut buf);
    }

    let mut words: Vec<(&String, &u32)> = store.word_map.iter().collect();
    words.sort();
    encode_varint(words.len() as u32, &mut buf);
    for (word, &id) in words {
        encode_str(word, &mut buf);
        encode_varint(id, &mut buf);
    }

    let mut chars: Vec<_> = store.char_word_map.iter().collect();
    chars.sort_by_key(|(c, _)| **c);
    encode_varint(chars.len() as u32, &mut buf);
    for (&c, word_ids) in chars {
        encode_varint(c as u32, &mut buf);
        encode_id_set(word_ids, &mut buf);
    }

    for map in [&store.word_id_history_map, &store.history_id_word_map] {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        encode_varint(entries.len() as u32, &mut buf);
        for (&id, ids) in entries {
            encode_varint(id, &mut buf);
            encode_id_set(ids, &mut buf);
        }
    }

    let mut rows: Vec<_> = store.history_info_map.iter().collect();
    rows.sort_by_key(|(id, _)| **id);
    encode_varint(rows.len() as u32, &mut buf);
    for (&id, row) in rows {
        encode_varint(id, &mut buf);
        encode_str(&row.url, &mut buf);
        encode_str(&row.title, &mut buf);
        encode_varint(row.visit_count, &mut buf);
        encode_varint(row.typed_count, &mut buf);
        encode_varint_u64(row.last_visit, &mut buf);
    }

    buf
}

/// Write the store to `path` atomically: a sibling temp file is written,
/// flushed and then renamed over the target.
pub fn write_cache(store: &Store, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let blob = encode_store(store);
    let tmp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(&blob)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), bytes = blob.len(), "wrote history cache");
    info!(rows = store.len(), words = store.word_map.len(), "history cache saved");
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
