use std::collections::HashMap;
use std::io::{Cursor, Read};

use percent_encoding::percent_decode_str;
use tracing::debug;
use zip::ZipArchive;

use crate::error::Result;
use crate::util::strip_bom;

/// Every entry of a ZIP container, inflated up front.
#[derive(Debug, Default)]
pub struct Archive {
    entries: HashMap<String, Vec<u8>>,
    /// Lower-cased name -> actual name.
    folded: HashMap<String, String>,
}

impl Archive {
    /// Inflate every file entry of `bytes`.
    pub fn inflate(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Archive::default();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            // The declared size comes from the archive itself; don't reserve by it.
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            archive.insert(name, data);
        }

        debug!(entries = archive.len(), "inflated archive");
        Ok(archive)
    }

    fn insert(&mut self, name: String, data: Vec<u8>) {
        self.folded.entry(name.to_lowercase()).or_insert_with(|| name.clone());
        self.entries.insert(name, data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry: exact name, then case-insensitively, then percent-decoded.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        let path = path.trim_start_matches('/');
        if let Some(data) = self.lookup(path) {
            return Some(data);
        }

        let decoded = percent_decode_str(path).decode_utf8().ok()?;
        if decoded != path {
            return self.lookup(&decoded);
        }
        None
    }

    fn lookup(&self, path: &str) -> Option<&[u8]> {
        if let Some(data) = self.entries.get(path) {
            return Some(data.as_slice());
        }
        let actual = self.folded.get(&path.to_lowercase())?;
        self.entries.get(actual).map(Vec::as_slice)
    }

    /// Entry decoded as UTF-8 text, BOM stripped.
    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|data| String::from_utf8_lossy(strip_bom(data)).into_owned())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }
}
