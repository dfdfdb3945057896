use proptest::prelude::*;
use sdk::errors::{EngineError, SolverErrorExt};

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::FileTypeNotAllowed(error_str.clone()),
            EngineError::InvalidUpload(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::Network(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());

            // Hints are static and never echo the raw detail back
            if error_str.len() > 8 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}
