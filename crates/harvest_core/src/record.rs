use std::collections::HashSet;
use std::fmt;

/// Longest row preview (in characters) folded into a media record's key.
pub const MEDIA_PREVIEW_CHARS: usize = 80;

/// One harvested inner item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub owner_label: String,
    pub meta: String,
    pub text: String,
}

/// Classification of rows that carry no recoverable literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Attachment,
}

impl MediaKind {
    /// Tag stored in [`Record::text`] for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            MediaKind::Audio => "[AUDIO]",
            MediaKind::Attachment => "[ATTACHMENT]",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Dedup key of a literal item: `meta||text`.
pub fn literal_key(meta: &str, text: &str) -> String {
    format!("{meta}||{text}")
}

/// Dedup key of a media item: `meta||TAG||preview`.
///
/// Media rows usually share an empty meta, so the preview keeps distinct rows apart.
pub fn media_key(meta: &str, kind: MediaKind, preview: &str) -> String {
    format!("{meta}||{}||{preview}", kind.tag())
}

/// Single-line, trimmed, length-capped rendering of a row's visible text.
pub fn row_preview(raw: &str) -> String {
    raw.trim()
        .replace(['\r', '\n'], " ")
        .chars()
        .take(MEDIA_PREVIEW_CHARS)
        .collect()
}

/// Records of one inner-item harvest, keyed by their dedup key and kept in
/// first-observation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    owner_label: String,
    keys: HashSet<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(owner_label: impl Into<String>) -> Self {
        Self {
            owner_label: owner_label.into(),
            keys: HashSet::new(),
            records: Vec::new(),
        }
    }

    pub fn owner_label(&self) -> &str {
        &self.owner_label
    }

    /// Inserts a literal item. Returns `false` when both fields are empty or the
    /// key was already present.
    pub fn insert_literal(&mut self, meta: &str, text: &str) -> bool {
        let meta = meta.trim();
        let text = text.trim();
        if meta.is_empty() && text.is_empty() {
            return false;
        }
        self.insert(literal_key(meta, text), meta, text)
    }

    /// Inserts a media item tagged with `kind`. Returns `false` on a repeat.
    pub fn insert_media(&mut self, meta: &str, kind: MediaKind, preview: &str) -> bool {
        let meta = meta.trim();
        self.insert(media_key(meta, kind, preview), meta, kind.tag())
    }

    fn insert(&mut self, key: String, meta: &str, text: &str) -> bool {
        if !self.keys.insert(key) {
            return false;
        }
        self.records.push(Record {
            owner_label: self.owner_label.clone(),
            meta: meta.to_string(),
            text: text.to_string(),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
