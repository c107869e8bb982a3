//! Message catalog - Localizer backed by key/template maps
//!
//! Templates use positional placeholders `{0}`, `{1}`, ... A doubled
//! apostrophe `''` renders as a single one. Unknown keys resolve to the key
//! itself so a missing translation is visible rather than fatal.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ports::Localizer;

/// Description template for outgoing transactions: (address, label)
pub const DEBIT_DESCRIPTION_WITH_LABEL: &str = "transaction.debitDescriptionWithLabel";
/// Description template for incoming transactions: (address, label)
pub const CREDIT_DESCRIPTION_WITH_LABEL: &str = "transaction.creditDescriptionWithLabel";
/// Date placeholder for transactions without a block time
pub const UNCONFIRMED: &str = "transaction.unconfirmed";

const ENGLISH: &[(&str, &str)] = &[
    (DEBIT_DESCRIPTION_WITH_LABEL, "Sent to \"{1}\" ({0})"),
    (CREDIT_DESCRIPTION_WITH_LABEL, "Received with \"{1}\" ({0})"),
    (UNCONFIRMED, "Unconfirmed"),
];

/// In-memory message catalog
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: String,
    messages: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog {
    /// Built-in English catalog
    pub fn english() -> Self {
        Self {
            locale: "en".to_string(),
            messages: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// English catalog overlaid with entries from a flat JSON object
    ///
    /// The locale is taken from a `messages.<locale>.json` file name when
    /// present.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message catalog {}", path.display()))?;
        let overlay: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid message catalog {}", path.display()))?;

        let locale = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix("messages."))
            .unwrap_or("en")
            .to_string();

        let mut catalog = Self::english();
        catalog.locale = locale;
        catalog.messages.extend(overlay);
        Ok(catalog)
    }

    /// Add or replace one template
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.messages.insert(key.into(), template.into());
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

impl Localizer for MessageCatalog {
    fn resolve(&self, key: &str, args: &[&str]) -> String {
        match self.messages.get(key) {
            Some(template) => format_template(template, args),
            None => key.to_string(),
        }
    }
}

/// Substitute `{n}` placeholders; out-of-range or malformed placeholders are
/// left as written
fn format_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(pos) = rest.find(&['{', '\''][..]) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("''") {
            out.push('\'');
            rest = after;
            continue;
        }
        if tail.starts_with('\'') {
            out.push('\'');
            rest = &tail[1..];
            continue;
        }

        // tail starts with '{'
        let arg = tail[1..].find('}').and_then(|end| {
            let index: usize = tail[1..1 + end].parse().ok()?;
            args.get(index).map(|value| (*value, end + 2))
        });
        match arg {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
