use serde_json::json;

/// Which per-issue version field a run operates on. Fixed set, chosen once
/// per run and applied to every issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VersionField {
    /// `fixVersions`
    Fix,
    /// `affectedVersions`
    Affected,
}

impl VersionField {
    pub fn api_name(self) -> &'static str {
        match self {
            VersionField::Fix => "fixVersions",
            VersionField::Affected => "affectedVersions",
        }
    }
}

/// The target version, addressed either by its stable id or by name.
/// An opaque equality key; never parsed or validated beyond comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    Id(String),
    Name(String),
}

impl VersionRef {
    pub fn value(&self) -> &str {
        match self {
            VersionRef::Id(v) | VersionRef::Name(v) => v,
        }
    }

    /// Does `entry` refer to this version? Id refs compare entry ids,
    /// name refs compare entry names, exact equality only.
    pub fn matches(&self, entry: &VersionEntry) -> bool {
        match self {
            VersionRef::Id(id) => entry.id.as_deref() == Some(id.as_str()),
            VersionRef::Name(name) => entry.name.as_deref() == Some(name.as_str()),
        }
    }

    /// The idempotency check: is this version already present?
    pub fn present_in(&self, entries: &[VersionEntry]) -> bool {
        entries.iter().any(|entry| self.matches(entry))
    }

    /// The `add` object for the update payload.
    pub fn add_payload(&self) -> serde_json::Value {
        match self {
            VersionRef::Id(id) => json!({ "id": id }),
            VersionRef::Name(name) => json!({ "name": name }),
        }
    }
}

/// One entry of a version field as the server reports it. Both fields are
/// optional because bodies are parsed loosely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Extract the version entries for `field` from a GET response body.
///
/// Any deviation from the expected shape — unparseable JSON, missing
/// `fields`, absent field, non-array value, entries without usable id/name —
/// degrades to an empty list. The conservative default is to attempt the
/// update rather than fail the issue over a malformed body.
pub fn parse_versions(body: &str, field: VersionField) -> Vec<VersionEntry> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let entries = value
        .get("fields")
        .and_then(|fields| fields.get(field.api_name()))
        .and_then(|field| field.as_array());

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| VersionEntry {
            id: entry.get("id").and_then(|v| v.as_str()).map(str::to_string),
            name: entry.get("name").and_then(|v| v.as_str()).map(str::to_string),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Option<&str>, name: Option<&str>) -> VersionEntry {
        VersionEntry {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn id_ref_matches_by_id_only() {
        let target = VersionRef::Id("10001".to_string());
        assert!(target.matches(&entry(Some("10001"), Some("2.0"))));
        assert!(!target.matches(&entry(Some("10002"), Some("10001"))));
        assert!(!target.matches(&entry(None, Some("10001"))));
    }

    #[test]
    fn name_ref_matches_by_name_only() {
        let target = VersionRef::Name("2.0".to_string());
        assert!(target.matches(&entry(Some("1"), Some("2.0"))));
        assert!(!target.matches(&entry(Some("2.0"), Some("2.1"))));
    }

    #[test]
    fn present_in_empty_slice_is_false() {
        let target = VersionRef::Name("2.0".to_string());
        assert!(!target.present_in(&[]));
    }

    #[test]
    fn parse_extracts_the_selected_field() {
        let body = r#"{"fields":{"fixVersions":[{"id":"1","name":"1.0"},{"name":"2.0"}]}}"#;
        let versions = parse_versions(body, VersionField::Fix);
        assert_eq!(
            versions,
            vec![entry(Some("1"), Some("1.0")), entry(None, Some("2.0"))]
        );
    }

    #[test]
    fn parse_ignores_the_other_field() {
        let body = r#"{"fields":{"fixVersions":[{"name":"1.0"}]}}"#;
        assert!(parse_versions(body, VersionField::Affected).is_empty());
    }

    #[test]
    fn malformed_body_yields_empty() {
        assert!(parse_versions("not json at all", VersionField::Fix).is_empty());
        assert!(parse_versions("", VersionField::Fix).is_empty());
    }

    #[test]
    fn absent_or_null_field_yields_empty() {
        assert!(parse_versions(r#"{"fields":{}}"#, VersionField::Fix).is_empty());
        assert!(parse_versions(r#"{"fields":{"fixVersions":null}}"#, VersionField::Fix).is_empty());
        assert!(parse_versions(r#"{"key":"X-1"}"#, VersionField::Fix).is_empty());
    }

    #[test]
    fn non_string_ids_are_dropped_not_fatal() {
        let body = r#"{"fields":{"fixVersions":[{"id":10001,"name":"2.0"}]}}"#;
        let versions = parse_versions(body, VersionField::Fix);
        assert_eq!(versions, vec![entry(None, Some("2.0"))]);
    }

    #[test]
    fn add_payload_shape() {
        assert_eq!(
            VersionRef::Id("7".to_string()).add_payload(),
            json!({"id": "7"})
        );
        assert_eq!(
            VersionRef::Name("2.0".to_string()).add_payload(),
            json!({"name": "2.0"})
        );
    }
}
