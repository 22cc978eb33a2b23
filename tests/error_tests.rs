#[cfg(test)]
mod error_tests {
    use rock_analyzer::{Result, RockError};
    use serde_json::json;

    #[test]
    fn test_configuration_error() {
        let err = RockError::Configuration("OpenAI API key not found".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: OpenAI API key not found"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unsupported_media_error() {
        let err = RockError::UnsupportedMedia("'gif' is not a supported image type".to_string());
        assert_eq!(
            format!("{}", err),
            "Unsupported media: 'gif' is not a supported image type"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_extraction_error() {
        let err = RockError::Extraction("Request to OpenAI timed out".to_string());
        assert_eq!(
            format!("{}", err),
            "Extraction error: Request to OpenAI timed out"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_message_drops_prefix() {
        let cases = [
            RockError::Configuration("a".to_string()),
            RockError::UnsupportedMedia("a".to_string()),
            RockError::Extraction("a".to_string()),
            RockError::FileRead("a".to_string()),
            RockError::InvalidState("a".to_string()),
        ];
        for err in cases {
            assert_eq!(err.user_message(), "a");
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_value::<String>(json!(42)).unwrap_err();
        let err: RockError = json_err.into();

        match err {
            RockError::Extraction(msg) => {
                assert!(msg.starts_with("Failed to parse model response"))
            }
            other => panic!("Expected Extraction, got {:?}", other),
        }
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert_eq!(ok_result, Ok(42));

        let err_result: Result<i32> = Err(RockError::InvalidState("busy".to_string()));
        assert!(err_result.is_err());
    }
}
