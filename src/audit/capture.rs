//! Pure derivation and sanitization helpers for the audit recorder.

use serde_json::Value;
use uuid::Uuid;

/// Replacement value for redacted fields.
pub const REDACTED: &str = "[REDACTED]";

/// Key-name fragments (lowercase) that mark a field as sensitive.
const SENSITIVE_KEY_FRAGMENTS: [&str; 5] =
    ["password", "token", "secret", "apikey", "creditcard"];

/// Shallow redaction of a request body snapshot.
///
/// Top-level keys whose name case-insensitively contains a sensitive
/// fragment are replaced with [`REDACTED`]. Nested objects pass through
/// unmodified. Non-object bodies are returned as-is.
pub fn sanitize_snapshot(body: &Value) -> Value {
    let Value::Object(map) = body else {
        return body.clone();
    };

    let sanitized = map
        .iter()
        .map(|(key, value)| {
            let lowered = key.to_lowercase();
            if SENSITIVE_KEY_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
                (key.clone(), Value::String(REDACTED.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect();

    Value::Object(sanitized)
}

/// Derive the entity type from a request path: the first meaningful
/// segment (skipping `api`/`internal` and version prefixes like `v1`),
/// capitalized, with dashes stripped.
///
/// `/api/v1/training-programs/123` → `Trainingprograms`
pub fn entity_type_from_path(path: &str) -> String {
    let entity = path
        .split('/')
        .filter(|p| !p.is_empty())
        .find(|p| !is_prefix_segment(p));

    match entity {
        Some(entity) => {
            let mut chars = entity.chars();
            match chars.next() {
                Some(first) => {
                    let capitalized: String = first.to_uppercase().chain(chars).collect();
                    capitalized.replace('-', "")
                }
                None => "Unknown".to_string(),
            }
        }
        None => "Unknown".to_string(),
    }
}

fn is_prefix_segment(segment: &str) -> bool {
    segment.eq_ignore_ascii_case("api")
        || segment.eq_ignore_ascii_case("internal")
        || is_version_segment(segment)
}

fn is_version_segment(segment: &str) -> bool {
    let mut bytes = segment.bytes();
    matches!(bytes.next(), Some(b'v') | Some(b'V'))
        && segment.len() > 1
        && bytes.all(|b| b.is_ascii_digit())
}

/// Derive the entity id for a request.
///
/// Preference order: an id-shaped trailing path segment (integer or
/// UUID), a top-level `id` field in the body, any UUID-shaped path
/// segment. Returns None when nothing id-shaped is found.
pub fn entity_id_from_request(path: &str, body: Option<&Value>) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    if let Some(last) = segments.last() {
        if is_id_shaped(last) {
            return Some((*last).to_string());
        }
    }

    if let Some(Value::Object(map)) = body {
        match map.get("id") {
            Some(Value::String(id)) => return Some(id.clone()),
            Some(Value::Number(id)) => return Some(id.to_string()),
            _ => {}
        }
    }

    segments
        .iter()
        .find(|s| is_uuid_shaped(s))
        .map(|s| (*s).to_string())
}

fn is_id_shaped(segment: &str) -> bool {
    (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        || is_uuid_shaped(segment)
}

fn is_uuid_shaped(segment: &str) -> bool {
    segment.len() == 36 && Uuid::try_parse(segment).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_redacts_top_level_sensitive_keys() {
        let body = json!({
            "firstName": "Jane",
            "password": "secret"
        });

        let sanitized = sanitize_snapshot(&body);
        assert_eq!(
            sanitized,
            json!({
                "firstName": "Jane",
                "password": "[REDACTED]"
            })
        );
    }

    #[test]
    fn test_sanitize_matches_key_fragments_case_insensitively() {
        let body = json!({
            "ApiKey": "k",
            "refreshToken": "t",
            "creditCardNumber": "4111",
            "clientSecret": "s",
            "name": "ok"
        });

        let sanitized = sanitize_snapshot(&body);
        assert_eq!(sanitized["ApiKey"], "[REDACTED]");
        assert_eq!(sanitized["refreshToken"], "[REDACTED]");
        assert_eq!(sanitized["creditCardNumber"], "[REDACTED]");
        assert_eq!(sanitized["clientSecret"], "[REDACTED]");
        assert_eq!(sanitized["name"], "ok");
    }

    #[test]
    fn test_sanitize_is_shallow() {
        let body = json!({
            "profile": { "password": "nested-stays" }
        });

        let sanitized = sanitize_snapshot(&body);
        assert_eq!(sanitized["profile"]["password"], "nested-stays");
    }

    #[test]
    fn test_sanitize_non_object_passthrough() {
        assert_eq!(sanitize_snapshot(&json!([1, 2])), json!([1, 2]));
        assert_eq!(sanitize_snapshot(&json!("text")), json!("text"));
    }

    #[test]
    fn test_entity_type_derivation() {
        assert_eq!(entity_type_from_path("/api/donations/123"), "Donations");
        assert_eq!(entity_type_from_path("/api/v1/users"), "Users");
        assert_eq!(
            entity_type_from_path("/api/v1/training-programs"),
            "Trainingprograms"
        );
        assert_eq!(
            entity_type_from_path("/internal/v1/notifications/dispatch"),
            "Notifications"
        );
        assert_eq!(entity_type_from_path("/health"), "Health");
        assert_eq!(entity_type_from_path("/"), "Unknown");
        assert_eq!(entity_type_from_path("/api/v1"), "Unknown");
    }

    #[test]
    fn test_entity_id_prefers_trailing_path_segment() {
        assert_eq!(
            entity_id_from_request("/api/donations/123", None),
            Some("123".to_string())
        );

        let uuid = "0191d8a2-67a2-7e58-b8f0-2f4c55a1a111";
        assert_eq!(
            entity_id_from_request(&format!("/api/donations/{uuid}"), None),
            Some(uuid.to_string())
        );
    }

    #[test]
    fn test_entity_id_falls_back_to_body() {
        let body = json!({"id": "abc-1"});
        assert_eq!(
            entity_id_from_request("/api/donations", Some(&body)),
            Some("abc-1".to_string())
        );

        let numeric = json!({"id": 7});
        assert_eq!(
            entity_id_from_request("/api/donations", Some(&numeric)),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_entity_id_scans_for_uuid_segment() {
        let uuid = "0191d8a2-67a2-7e58-b8f0-2f4c55a1a111";
        assert_eq!(
            entity_id_from_request(&format!("/api/donations/{uuid}/allocations"), None),
            Some(uuid.to_string())
        );
    }

    #[test]
    fn test_entity_id_none_when_nothing_id_shaped() {
        assert_eq!(entity_id_from_request("/api/donations", None), None);
        assert_eq!(
            entity_id_from_request("/api/notifications/unread-count", None),
            None
        );
    }
}
