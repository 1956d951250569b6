//! Identifier and location extraction from raw profile HTML.
//!
//! Each field is recovered by an ordered chain of [`Rule`]s. Rules are tried
//! in priority order and the first one producing a usable value wins. Location
//! values that are purely numeric are discarded before composition, which
//! guards against numeric IDs captured in place of a place name.

use std::sync::LazyLock;

use coenrich_core::ExtractedFields;
use regex::Regex;
use serde_json::Value;

static ORGANIZATION_URN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-semaphore-content-urn="urn:li:organization:(\d+)""#).expect("valid regex")
});
static CURRENT_COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"currentCompany=%5B%22(\d+)%22%5D").expect("valid regex"));
static ADDRESS_FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""addressLocality":"([^"]*)"(?:,"addressRegion":"([^"]*)")?"#)
        .expect("valid regex")
});
static JSONLD_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// Raw locality/region pair captured by a location rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub locality: String,
    pub region: String,
}

impl AddressParts {
    /// Trims both parts and blanks any part that is purely numeric.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = |s: String| {
            let trimmed = s.trim();
            if is_numeric(trimmed) {
                String::new()
            } else {
                trimmed.to_string()
            }
        };
        Self {
            locality: clean(self.locality),
            region: clean(self.region),
        }
    }

    /// `"locality, region"` when both are present, whichever one is present
    /// otherwise, else empty.
    #[must_use]
    pub fn compose(&self) -> String {
        match (self.locality.is_empty(), self.region.is_empty()) {
            (false, false) => format!("{}, {}", self.locality, self.region),
            (false, true) => self.locality.clone(),
            (true, false) => self.region.clone(),
            (true, true) => String::new(),
        }
    }
}

/// A named extraction step.
pub struct Rule<T> {
    pub name: &'static str,
    capture: fn(&str) -> Option<T>,
}

impl<T> Rule<T> {
    #[must_use]
    pub const fn new(name: &'static str, capture: fn(&str) -> Option<T>) -> Self {
        Self { name, capture }
    }

    pub fn apply(&self, html: &str) -> Option<T> {
        (self.capture)(html)
    }
}

/// Identifier rules in priority order.
#[must_use]
pub fn identifier_rules() -> Vec<Rule<String>> {
    vec![
        Rule::new("organization_urn", capture_organization_urn),
        Rule::new("current_company_param", capture_current_company),
    ]
}

/// Location rules in priority order.
#[must_use]
pub fn location_rules() -> Vec<Rule<AddressParts>> {
    vec![
        Rule::new("address_fragment", capture_address_fragment),
        Rule::new("jsonld_address", capture_jsonld_address),
    ]
}

/// Runs the identifier and location rule chains over a page.
pub struct FieldExtractor {
    identifier_rules: Vec<Rule<String>>,
    location_rules: Vec<Rule<AddressParts>>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::with_rules(identifier_rules(), location_rules())
    }
}

impl FieldExtractor {
    #[must_use]
    pub fn with_rules(
        identifier_rules: Vec<Rule<String>>,
        location_rules: Vec<Rule<AddressParts>>,
    ) -> Self {
        Self {
            identifier_rules,
            location_rules,
        }
    }

    /// Extracts both fields. Input that matches nothing, including empty or
    /// binary content, yields empty strings.
    #[must_use]
    pub fn extract(&self, html: &str) -> ExtractedFields {
        ExtractedFields {
            identifier: self.identifier(html),
            location: self.location(html),
        }
    }

    #[must_use]
    pub fn identifier(&self, html: &str) -> String {
        self.identifier_rules
            .iter()
            .find_map(|rule| {
                let value = rule.apply(html)?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                tracing::trace!(rule = rule.name, "identifier matched");
                Some(value.to_string())
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn location(&self, html: &str) -> String {
        self.location_rules
            .iter()
            .find_map(|rule| {
                let composed = rule.apply(html)?.sanitized().compose();
                if composed.is_empty() {
                    return None;
                }
                tracing::trace!(rule = rule.name, "location matched");
                Some(composed)
            })
            .unwrap_or_default()
    }
}

fn capture_organization_urn(html: &str) -> Option<String> {
    first_group(&ORGANIZATION_URN_RE, html)
}

fn capture_current_company(html: &str) -> Option<String> {
    first_group(&CURRENT_COMPANY_RE, html)
}

fn first_group(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn capture_address_fragment(html: &str) -> Option<AddressParts> {
    let caps = ADDRESS_FRAGMENT_RE.captures(html)?;
    let group = |i: usize| {
        caps.get(i)
            .map(|m| unescape_json_string(m.as_str()))
            .unwrap_or_default()
    };
    Some(AddressParts {
        locality: group(1),
        region: group(2),
    })
}

/// Walks `<script type="application/ld+json">` blocks for the first
/// `address` object carrying a locality or region.
fn capture_jsonld_address(html: &str) -> Option<AddressParts> {
    JSONLD_SCRIPT_RE.captures_iter(html).find_map(|cap| {
        let value: Value = serde_json::from_str(cap.get(1)?.as_str().trim()).ok()?;
        jsonld_candidates(value)
            .iter()
            .find_map(|item| address_of(item.get("address")?))
    })
}

/// Flattens a JSON-LD document into its top-level nodes, expanding arrays
/// and `@graph` containers.
fn jsonld_candidates(value: Value) -> Vec<Value> {
    let mut candidates = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let graphs: Vec<Value> = candidates
        .iter()
        .filter_map(|item| item.get("@graph").and_then(Value::as_array))
        .flatten()
        .cloned()
        .collect();
    candidates.extend(graphs);
    candidates
}

fn address_of(address: &Value) -> Option<AddressParts> {
    if let Some(list) = address.as_array() {
        return list.iter().find_map(address_of);
    }
    let field = |key: &str| {
        address
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    let parts = AddressParts {
        locality: field("addressLocality"),
        region: field("addressRegion"),
    };
    if parts.locality.is_empty() && parts.region.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Decodes JSON string escapes (`\u00e3`, `\/`) in a raw captured value,
/// returning the input unchanged when it is not a valid JSON string body.
fn unescape_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}

/// True when `s` parses as a finite number, e.g. `"94105"` or `"12.5"`.
fn is_numeric(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
