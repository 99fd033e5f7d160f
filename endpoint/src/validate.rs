use crate::errors::{Error, Result};
use crate::model::WriteRequest;
use serde_json::Value;
use std::sync::Arc;

/// Checks the shared secret and extracts the temperature from a write request.
#[derive(Clone)]
pub struct RequestValidator {
    secret: Arc<str>,
}

impl RequestValidator {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Validates a raw request body and returns the temperature to store.
    pub fn validate(&self, body: &[u8]) -> Result<f64> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("request body is not valid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Validation(
                "request body must be a JSON object".to_string(),
            ));
        }
        let request: WriteRequest = serde_json::from_value(value)
            .map_err(|e| Error::Validation(format!("malformed request body: {}", e)))?;

        // Anything other than a matching string, including a missing secret, is a mismatch.
        let authorized = match &request.secret {
            Some(Value::String(supplied)) => {
                secrets_match(self.secret.as_bytes(), supplied.as_bytes())
            }
            _ => false,
        };
        if !authorized {
            return Err(Error::Auth);
        }

        parse_temperature(request.temperature.as_ref())
    }
}

/// Accepts a JSON number or a numeric string; rejects anything non-finite.
pub fn parse_temperature(value: Option<&Value>) -> Result<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(t) if t.is_finite() => Ok(t),
        _ => Err(Error::Validation(
            "temperature must be a finite number".to_string(),
        )),
    }
}

// Runs in time independent of where the first mismatch is.
fn secrets_match(expected: &[u8], supplied: &[u8]) -> bool {
    if expected.len() != supplied.len() {
        return false;
    }
    expected
        .iter()
        .zip(supplied)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> RequestValidator {
        RequestValidator::new("s3cr3t")
    }

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_valid_number() {
        let t = validator()
            .validate(&body(json!({"secret": "s3cr3t", "temperature": 21.5})))
            .unwrap();
        assert_eq!(t, 21.5);
    }

    #[test]
    fn test_valid_numeric_string_and_integer() {
        let v = validator();
        assert_eq!(
            v.validate(&body(json!({"secret": "s3cr3t", "temperature": " -4.25 "})))
                .unwrap(),
            -4.25
        );
        assert_eq!(
            v.validate(&body(json!({"secret": "s3cr3t", "temperature": 19})))
                .unwrap(),
            19.0
        );
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let t = validator()
            .validate(&body(
                json!({"secret": "s3cr3t", "temperature": 3, "sensor": "attic"}),
            ))
            .unwrap();
        assert_eq!(t, 3.0);
    }

    #[test]
    fn test_wrong_secret() {
        let result = validator().validate(&body(json!({"secret": "wrong", "temperature": 21.5})));
        assert!(matches!(result, Err(Error::Auth)));
    }

    #[test]
    fn test_missing_secret() {
        let result = validator().validate(&body(json!({"temperature": 21.5})));
        assert!(matches!(result, Err(Error::Auth)));
    }

    #[test]
    fn test_secret_checked_before_temperature() {
        let result = validator().validate(&body(json!({"secret": "nope", "temperature": "hot"})));
        assert!(matches!(result, Err(Error::Auth)));
    }

    #[test]
    fn test_invalid_temperatures() {
        let v = validator();
        for bad in [
            json!({"secret": "s3cr3t", "temperature": "hot"}),
            json!({"secret": "s3cr3t", "temperature": ""}),
            json!({"secret": "s3cr3t", "temperature": "NaN"}),
            json!({"secret": "s3cr3t", "temperature": "Infinity"}),
            json!({"secret": "s3cr3t", "temperature": null}),
            json!({"secret": "s3cr3t", "temperature": true}),
            json!({"secret": "s3cr3t", "temperature": [21.5]}),
            json!({"secret": "s3cr3t"}),
        ] {
            let result = v.validate(&body(bad.clone()));
            assert!(
                matches!(result, Err(Error::Validation(_))),
                "expected validation error for {}",
                bad
            );
        }
    }

    #[test]
    fn test_malformed_bodies() {
        let v = validator();
        assert!(matches!(v.validate(b"not json"), Err(Error::Validation(_))));
        assert!(matches!(v.validate(b""), Err(Error::Validation(_))));
        assert!(matches!(
            v.validate(&body(json!(["s3cr3t", 21.5]))),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_non_string_secret_is_auth_failure() {
        let v = validator();
        for secret in [
            json!(42),
            json!(null),
            json!(true),
            json!(["s3cr3t"]),
            json!({"value": "s3cr3t"}),
        ] {
            let result = v.validate(&body(json!({"secret": secret.clone(), "temperature": 21.5})));
            assert!(
                matches!(result, Err(Error::Auth)),
                "expected auth error for secret {}",
                secret
            );
        }
        assert!(matches!(
            v.validate(br#"{"secret": 42, "temperature": 21.5}"#),
            Err(Error::Auth)
        ));
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match(b"abc", b"abc"));
        assert!(!secrets_match(b"abc", b"abd"));
        assert!(!secrets_match(b"abc", b"ab"));
        assert!(!secrets_match(b"abc", b""));
    }
}
