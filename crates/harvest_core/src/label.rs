use std::collections::HashSet;

/// Canonical form of an outer-list label: whitespace runs collapsed to one space,
/// trimmed, lowercased. Idempotent.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Read-only set of normalized labels that must never be opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionSet {
    normalized: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = labels
            .into_iter()
            .map(|label| normalize_label(label.as_ref()))
            .filter(|label| !label.is_empty())
            .collect();
        Self { normalized }
    }

    /// Membership check for an already-normalized label.
    pub fn contains_normalized(&self, canonical: &str) -> bool {
        self.normalized.contains(canonical)
    }

    /// Normalizes `label` and checks membership.
    pub fn is_excluded(&self, label: &str) -> bool {
        self.contains_normalized(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Structural rules that separate conversation titles from other titled noise in
/// the outer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRules {
    pub max_chars: usize,
    pub reserved: Vec<String>,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            max_chars: 60,
            reserved: vec!["Archivados".to_string(), "WhatsApp".to_string()],
        }
    }
}

impl LabelRules {
    /// Returns the trimmed label when it looks like a conversation title.
    pub fn accept<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let label = raw.trim();
        if label.is_empty() || label.contains(['\n', '\r']) {
            return None;
        }
        if label.chars().count() > self.max_chars {
            return None;
        }
        if self.reserved.iter().any(|reserved| reserved == label) {
            return None;
        }
        Some(label)
    }

    /// Applies [`LabelRules::accept`] to raw titles in rendering order, keeping the
    /// first rendering of each normalized label.
    pub fn filter_visible<I, S>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut labels = Vec::new();
        for title in raw {
            if let Some(label) = self.accept(title.as_ref()) {
                if seen.insert(normalize_label(label)) {
                    labels.push(label.to_string());
                }
            }
        }
        labels
    }
}
