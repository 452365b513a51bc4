use serde_json::Value;

/// Tri-state reading of a nullable PATCH field.
#[derive(Debug, PartialEq, Eq)]
pub enum NullableValue {
    Omitted,
    Null,
    String(String),
}

impl NullableValue {
    /// `None` leaves the column alone, `Some(None)` clears it.
    pub fn into_patch(self) -> Option<Option<String>> {
        match self {
            NullableValue::Omitted => None,
            NullableValue::Null => Some(None),
            NullableValue::String(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Some(None)
                } else {
                    Some(Some(trimmed.to_string()))
                }
            }
        }
    }
}

pub fn classify_nullable(optional_value: Option<&Value>) -> Result<NullableValue, String> {
    match optional_value {
        None => Ok(NullableValue::Omitted),
        Some(Value::Null) => Ok(NullableValue::Null),
        Some(Value::String(s)) => Ok(NullableValue::String(s.to_owned())),
        Some(other) => Err(format!("expected string or null, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_patch_fields() {
        let body = json!({ "notes": null, "due_date": "2026-02-20", "count": 3 });
        assert_eq!(
            classify_nullable(body.get("missing")).unwrap(),
            NullableValue::Omitted
        );
        assert_eq!(
            classify_nullable(body.get("notes")).unwrap(),
            NullableValue::Null
        );
        assert_eq!(
            classify_nullable(body.get("due_date")).unwrap(),
            NullableValue::String("2026-02-20".into())
        );
        assert!(classify_nullable(body.get("count")).is_err());
    }

    #[test]
    fn blank_strings_clear_the_field() {
        assert_eq!(NullableValue::String("  ".into()).into_patch(), Some(None));
        assert_eq!(NullableValue::Omitted.into_patch(), None);
        assert_eq!(
            NullableValue::String(" x ".into()).into_patch(),
            Some(Some("x".into()))
        );
    }
}
