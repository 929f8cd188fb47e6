use crate::error::{CacheError, Result};
use crate::index::store::Store;
use crate::index::types::{Row, WordId};
use crate::index::writer::{CACHE_MAGIC, CACHE_VERSION};
use crate::utils::BlobCursor;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Fixed-size prefix of a cache blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeader {
    pub version: u32,
    /// Unix timestamp of when the blob was written
    pub created_at: u64,
}

fn decode_header(cursor: &mut BlobCursor<'_>) -> std::result::Result<CacheHeader, CacheError> {
    if cursor.bytes(CACHE_MAGIC.len()).map_err(|_| CacheError::BadMagic)? != CACHE_MAGIC {
        return Err(CacheError::BadMagic);
    }
    let version = cursor.u32_le()?;
    if version != CACHE_VERSION {
        return Err(CacheError::UnsupportedVersion {
            expected: CACHE_VERSION,
            actual: version,
        });
    }
    let created_at = cursor.u64_le()?;
    Ok(CacheHeader {
        version,
        created_at,
    })
}

/// Rebuild a store from a blob produced by [`encode_store`](crate::index::writer::encode_store).
/// Any structural inconsistency rejects the whole blob.
pub fn decode_store(bytes: &[u8]) -> std::result::Result<Store, CacheError> {
    let mut cursor = BlobCursor::new(bytes);
    decode_header(&mut cursor)?;

    let mut store = Store::new();

    let word_count = cursor.count()?;
    store.word_list.reserve(word_count);
    for id in 0..word_count {
        let word = cursor.string()?;
        if word.is_empty() {
            store.available_words.push(id as WordId);
        }
        store.word_list.push(word);
    }
    // Freed slots are reused lowest id first
    store.available_words.reverse();

    for _ in 0..cursor.count()? {
        let word = cursor.string()?;
        let id = cursor.varint()?;
        if store.word_map.insert(word, id).is_some() {
            return Err(CacheError::Shape("duplicate word map entry".to_string()));
        }
    }

    for _ in 0..cursor.count()? {
        let code = cursor.varint()?;
        let c = char::from_u32(code).ok_or(CacheError::InvalidChar(code))?;
        let ids = cursor.id_set()?;
        if store.char_word_map.insert(c, ids).is_some() {
            return Err(CacheError::Shape(format!("duplicate character {c:?}")));
        }
    }

    for map in [&mut store.word_id_history_map, &mut store.history_id_word_map] {
        for _ in 0..cursor.count()? {
            let id = cursor.varint()?;
            let ids = cursor.id_set()?;
            if map.insert(id, ids).is_some() {
                return Err(CacheError::Shape(format!("duplicate map key {id}")));
            }
        }
    }

    for _ in 0..cursor.count()? {
        let id = cursor.varint()?;
        let row = Row {
            url: cursor.string()?,
            title: cursor.string()?,
            visit_count: cursor.varint()?,
            typed_count: cursor.varint()?,
            last_visit: cursor.varint_u64()?,
        };
        if store.history_info_map.insert(id, row).is_some() {
            return Err(CacheError::Shape(format!("duplicate row {id}")));
        }
    }

    if cursor.remaining() > 0 {
        return Err(CacheError::TrailingBytes(cursor.remaining()));
    }

    store.validate()?;
    Ok(store)
}

/// Load a store from a cache file
pub fn read_cache(path: &Path) -> Result<Store> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(CacheError::Truncated(0).into());
    }
    // SAFETY: the cache is only replaced by rename, never modified in place
    let mmap = unsafe { Mmap::map(&file)? };

    match decode_store(&mmap) {
        Ok(store) => {
            debug!(path = %path.display(), rows = store.len(), "restored history cache");
            Ok(store)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "rejecting history cache");
            Err(err.into())
        }
    }
}

/// Read only the header of a cache file
pub fn read_cache_header(path: &Path) -> Result<CacheHeader> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(CacheError::Truncated(0).into());
    }
    // SAFETY: see read_cache
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(decode_header(&mut BlobCursor::new(&mmap))?)
}
