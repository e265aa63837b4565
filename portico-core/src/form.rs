//! URL-encoded form parsing

use crate::Error;
use serde::de::DeserializeOwned;

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        email: String,
        #[serde(default)]
        password: String,
    }

    #[test]
    fn test_parse_form_struct() {
        let form: Login = parse_form(b"email=a%40example.com&password=hunter2").unwrap();
        assert_eq!(form.email, "a@example.com");
        assert_eq!(form.password, "hunter2");
    }

    #[test]
    fn test_parse_form_defaults() {
        let form: Login = parse_form(b"email=").unwrap();
        assert_eq!(form.email, "");
        assert_eq!(form.password, "");
    }

    #[test]
    fn test_parse_form_missing_required_field() {
        let result: Result<Login, Error> = parse_form(b"password=hunter2");
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
