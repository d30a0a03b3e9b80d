use serde::Serialize;
use serde_json::Value;

/// A cross-reference distilled from a timeline event: either another
/// issue/PR pointing at this item, or a commit referencing it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event")]
pub enum Xref {
    #[serde(rename = "cross-referenced")]
    CrossReferenced {
        from: u64,
        #[serde(rename = "type")]
        source_type: String,
        actor: Option<String>,
        date: Option<String>,
    },
    #[serde(rename = "referenced")]
    Referenced {
        commit: String,
        actor: Option<String>,
        date: Option<String>,
    },
}

/// Pull cross-references and commit references out of a raw timeline.
/// Malformed events are skipped, not errors.
pub fn extract_xrefs(timeline: &[Value]) -> Vec<Xref> {
    let mut xrefs = Vec::new();

    for event in timeline {
        let Some(obj) = event.as_object() else {
            continue;
        };
        let actor = obj
            .get("actor")
            .and_then(|a| a.get("login"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let date = obj
            .get("created_at")
            .and_then(Value::as_str)
            .map(str::to_string);

        match obj.get("event").and_then(Value::as_str) {
            Some("cross-referenced") => {
                let source = obj.get("source").cloned().unwrap_or(Value::Null);
                let Some(from) = source
                    .get("issue")
                    .and_then(|i| i.get("number"))
                    .and_then(Value::as_u64)
                else {
                    continue;
                };
                let source_type = source
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("issue")
                    .to_string();
                xrefs.push(Xref::CrossReferenced {
                    from,
                    source_type,
                    actor,
                    date,
                });
            }
            Some("referenced") => {
                let Some(commit) = obj.get("commit_id").and_then(Value::as_str) else {
                    continue;
                };
                xrefs.push(Xref::Referenced {
                    commit: commit.to_string(),
                    actor,
                    date,
                });
            }
            _ => {}
        }
    }

    xrefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_cross_reference() {
        let timeline = vec![json!({
            "event": "cross-referenced",
            "actor": {"login": "alice"},
            "created_at": "2015-03-01T00:00:00Z",
            "source": {"type": "pull_request", "issue": {"number": 42}},
        })];

        let xrefs = extract_xrefs(&timeline);
        assert_eq!(
            xrefs,
            vec![Xref::CrossReferenced {
                from: 42,
                source_type: "pull_request".to_string(),
                actor: Some("alice".to_string()),
                date: Some("2015-03-01T00:00:00Z".to_string()),
            }]
        );
    }

    #[test]
    fn test_extract_commit_reference() {
        let timeline = vec![json!({
            "event": "referenced",
            "commit_id": "abc123",
            "actor": null,
        })];

        let xrefs = extract_xrefs(&timeline);
        assert_eq!(
            xrefs,
            vec![Xref::Referenced {
                commit: "abc123".to_string(),
                actor: None,
                date: None,
            }]
        );
    }

    #[test]
    fn test_malformed_events_are_skipped() {
        let timeline = vec![
            json!("not an object"),
            json!({"event": "labeled"}),
            json!({"event": "cross-referenced", "source": {}}),
            json!({"event": "referenced"}),
        ];
        assert!(extract_xrefs(&timeline).is_empty());
    }

    #[test]
    fn test_xref_serializes_with_event_tag() {
        let xref = Xref::Referenced {
            commit: "abc".to_string(),
            actor: Some("bob".to_string()),
            date: None,
        };
        let value = serde_json::to_value(&xref).unwrap();
        assert_eq!(value["event"], "referenced");
        assert_eq!(value["commit"], "abc");
    }
}
