//! Endpoint paths of the cache service.
//!
//! Namespaces, ids, hashes and storage paths are inserted verbatim; the
//! service addresses storage files by their raw path.

pub const HEALTH: &str = "/info/health";
pub const SERVER_INFO: &str = "/info/server";
pub const STATUS: &str = "/info/status";
pub const VERSIONS: &str = "/info/versions";
pub const STORAGE_INFO: &str = "/server/storage/info";
pub const NAMESPACES: &str = "/namespaces/list";
pub const BUCKET_NAME: &str = "/admin/storage/bucket-name";

pub fn stats(namespace: &str) -> String {
    format!("/{namespace}/stats")
}

pub fn file_ids(namespace: &str) -> String {
    format!("/{namespace}/file-ids")
}

pub fn file_hashes(namespace: &str) -> String {
    format!("/{namespace}/file-hashes")
}

// by cache id

pub fn retrieve(namespace: &str, cache_id: &str) -> String {
    format!("/{namespace}/retrieve/{cache_id}")
}

pub fn retrieve_as(namespace: &str, cache_id: &str, kind: &str) -> String {
    format!("/{namespace}/retrieve/{cache_id}/{kind}")
}

pub fn retrieve_metadata(namespace: &str, cache_id: &str) -> String {
    retrieve_as(namespace, cache_id, "metadata")
}

pub fn retrieve_refs(namespace: &str, cache_id: &str) -> String {
    retrieve_as(namespace, cache_id, "refs")
}

pub fn retrieve_refs_all(namespace: &str, cache_id: &str) -> String {
    retrieve_as(namespace, cache_id, "refs/all")
}

pub fn retrieve_config(namespace: &str, cache_id: &str) -> String {
    retrieve_as(namespace, cache_id, "config")
}

// by content hash

pub fn retrieve_by_hash(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/retrieve/hash/{hash}")
}

pub fn retrieve_hash_metadata(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/retrieve/hash/{hash}/metadata")
}

pub fn retrieve_hash_refs(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/retrieve/hash/{hash}/refs-hash")
}

pub fn retrieve_hash_cache_id(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/retrieve/hash/{hash}/cache-id")
}

pub fn retrieve_hash_json(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/retrieve/hash/{hash}/json")
}

pub fn exists_by_hash(namespace: &str, hash: &str) -> String {
    format!("/{namespace}/exists/hash/{hash}")
}

// admin storage

pub fn file_exists(path: &str) -> String {
    format!("/admin/storage/file/exists/{path}")
}

pub fn file_json(path: &str) -> String {
    format!("/admin/storage/file/json/{path}")
}

pub fn all_files(path: &str) -> String {
    format!("/admin/storage/files/all/{path}")
}

fn listing_query(full_path: bool, recursive: bool) -> String {
    let mut params = Vec::new();
    if full_path {
        params.push("return_full_path=true");
    }
    if recursive {
        params.push("recursive=true");
    }
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

pub fn files_in(path: &str, full_path: bool, recursive: bool) -> String {
    format!("/admin/storage/files/in/{path}{}", listing_query(full_path, recursive))
}

pub fn folders(path: &str, full_path: bool, recursive: bool) -> String {
    format!("/admin/storage/folders/{path}{}", listing_query(full_path, recursive))
}

/// Browser link to a storage file rendered as JSON.
pub fn file_json_link(base_url: &str, path: &str) -> String {
    storage_link(base_url, "json", path)
}

/// Browser link to a storage file's raw content.
pub fn file_content_link(base_url: &str, path: &str) -> String {
    storage_link(base_url, "content", path)
}

fn storage_link(base_url: &str, view: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    format!(
        "{}/admin/storage/file/{view}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(path)
    )
}
