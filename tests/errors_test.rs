#[cfg(test)]
mod error_tests {
    use std::error::Error;
    use webcam_recorder::errors::WebcamError;

    #[test]
    fn test_device_access_denied() {
        let error = WebcamError::DeviceAccessDenied("permission dismissed".to_string());
        assert_eq!(error.to_string(), "Device access denied: permission dismissed");
        assert_eq!(error.kind(), "device_access_denied");
    }

    #[test]
    fn test_empty_buffer() {
        let error = WebcamError::EmptyBuffer;
        assert_eq!(error.to_string(), "No recorded data available");
        assert_eq!(error.kind(), "empty_buffer");
    }

    #[test]
    fn test_error_debug_format() {
        let error = WebcamError::Finalize("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Finalize"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_error_implements_error_trait() {
        let error = WebcamError::Recorder("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            (WebcamError::DeviceAccessDenied("a".to_string()), "Device access denied: a"),
            (WebcamError::EmptyBuffer, "No recorded data available"),
            (WebcamError::Finalize("b".to_string()), "Finalize error: b"),
            (WebcamError::Recorder("c".to_string()), "Recorder error: c"),
            (WebcamError::Save("d".to_string()), "Save error: d"),
            (WebcamError::Config("e".to_string()), "Configuration error: e"),
        ];

        let mut kinds: Vec<&str> = errors.iter().map(|(e, _)| e.kind()).collect();
        for (error, expected) in &errors {
            assert_eq!(&error.to_string(), expected);
        }

        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_io_error_maps_to_save() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let error: WebcamError = io.into();
        assert!(matches!(error, WebcamError::Save(_)));
        assert!(error.to_string().contains("read-only volume"));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let error = WebcamError::Save("disk full".to_string());
        assert_eq!(error.clone(), error);
        assert_ne!(error, WebcamError::EmptyBuffer);
    }
}
