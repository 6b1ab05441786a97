#![cfg(feature = "tauri-plugin")]

mod commands_recording_tests {
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use bytes::Bytes;
    use webcam_recorder::commands::{
        mount, webcam_dimensions, webcam_download, webcam_finalize, webcam_indicator,
        webcam_layout, webcam_start, webcam_state, webcam_stop, webcam_unmount,
    };
    use webcam_recorder::layout::DisplayMode;
    use webcam_recorder::platform::{DirectorySaver, SyntheticDevices, SyntheticFeed};
    use webcam_recorder::{
        AspectRatio, CaptureOptions, DimensionSpec, Dimensions, RecordingState, WebcamController,
    };

    // The plugin keeps one mounted controller per process.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn synthetic_controller(
        options: CaptureOptions,
        dir: &std::path::Path,
    ) -> (Arc<WebcamController>, SyntheticFeed) {
        let devices = SyntheticDevices::new();
        let feed = devices.feed();
        let controller = WebcamController::builder(Arc::new(devices))
            .options(options)
            .file_saver(Arc::new(DirectorySaver::new(dir)))
            .build();
        (Arc::new(controller), feed)
    }

    #[tokio::test]
    async fn test_commands_without_mount_fail() {
        let _serial = serial();
        webcam_unmount().await.unwrap();

        let error = webcam_start().await.unwrap_err();
        assert!(error.contains("No webcam component is mounted"));
        assert!(webcam_stop().await.is_err());
        assert!(webcam_state().await.is_err());
        assert!(webcam_finalize().await.is_err());
        assert!(webcam_download(None).await.is_err());
        assert!(webcam_layout().await.is_err());
        assert!(webcam_indicator().await.is_err());
    }

    #[tokio::test]
    async fn test_record_finalize_and_download() {
        let _serial = serial();
        let dir = tempfile::tempdir().unwrap();
        let (controller, feed) = synthetic_controller(CaptureOptions::default(), dir.path());

        let layout = mount(controller).await.unwrap();
        assert_eq!(layout.mode, DisplayMode::Inline);
        assert_eq!(webcam_state().await.unwrap(), RecordingState::Idle);

        assert_eq!(webcam_start().await.unwrap(), RecordingState::Recording);
        feed.push(Bytes::from_static(b"frame-1 "));
        feed.push(Bytes::new());
        feed.push(Bytes::from_static(b"frame-2"));
        assert_eq!(webcam_stop().await.unwrap(), RecordingState::Stopped);

        let bytes = webcam_finalize().await.unwrap();
        assert_eq!(bytes, b"frame-1 frame-2".to_vec());

        let summary = webcam_download(Some("session".to_string())).await.unwrap();
        assert_eq!(summary.size_bytes, bytes.len());
        assert_eq!(summary.chunk_count, 2);
        let saved = std::fs::read(dir.path().join("session.webm")).unwrap();
        assert_eq!(saved, bytes);

        webcam_unmount().await.unwrap();
    }

    #[tokio::test]
    async fn test_download_uses_default_file_name() {
        let _serial = serial();
        let dir = tempfile::tempdir().unwrap();
        let (controller, feed) = synthetic_controller(CaptureOptions::default(), dir.path());
        mount(controller).await.unwrap();

        webcam_start().await.unwrap();
        feed.push(Bytes::from_static(b"clip"));
        webcam_stop().await.unwrap();

        webcam_download(None).await.unwrap();
        assert!(dir.path().join("recording.webm").exists());

        webcam_unmount().await.unwrap();
    }

    #[tokio::test]
    async fn test_finalize_empty_reports_error() {
        let _serial = serial();
        let dir = tempfile::tempdir().unwrap();
        let (controller, _feed) = synthetic_controller(CaptureOptions::default(), dir.path());
        mount(controller).await.unwrap();

        let error = webcam_finalize().await.unwrap_err();
        assert_eq!(error, "No recorded data available");

        webcam_unmount().await.unwrap();
    }

    #[tokio::test]
    async fn test_remount_releases_previous_controller() {
        let _serial = serial();
        let dir = tempfile::tempdir().unwrap();

        let (first, first_feed) = synthetic_controller(CaptureOptions::default(), dir.path());
        mount(first.clone()).await.unwrap();
        webcam_start().await.unwrap();
        assert_eq!(first_feed.live_streams(), 1);

        let (second, second_feed) = synthetic_controller(
            CaptureOptions::default().with_fullscreen(true),
            dir.path(),
        );
        let layout = mount(second).await.unwrap();

        assert_eq!(layout.mode, DisplayMode::Fullscreen);
        assert_eq!(first.current_state(), RecordingState::Stopped);
        assert_eq!(first_feed.live_streams(), 0);
        assert_eq!(second_feed.live_streams(), 1);
        assert_eq!(webcam_state().await.unwrap(), RecordingState::Idle);

        webcam_unmount().await.unwrap();
        assert_eq!(second_feed.live_streams(), 0);
        assert!(webcam_state().await.is_err());
    }

    #[tokio::test]
    async fn test_mount_denied_reports_error() {
        let _serial = serial();
        let devices = SyntheticDevices::denying("permission dismissed");
        let controller = Arc::new(WebcamController::new(
            Arc::new(devices),
            CaptureOptions::default(),
        ));

        let error = mount(controller).await.unwrap_err();
        assert!(error.contains("Device access denied"));

        webcam_unmount().await.unwrap();
    }

    #[tokio::test]
    async fn test_indicator_command_follows_option() {
        let _serial = serial();
        let dir = tempfile::tempdir().unwrap();
        let (controller, _feed) =
            synthetic_controller(CaptureOptions::default().with_indicator(true), dir.path());
        let layout = mount(controller).await.unwrap();
        assert!(layout.show_indicator);

        assert_eq!(webcam_indicator().await.unwrap(), None);
        webcam_start().await.unwrap();
        let frame = webcam_indicator().await.unwrap().expect("overlay while recording");
        assert_eq!(frame.label, "REC");
        webcam_stop().await.unwrap();
        assert_eq!(webcam_indicator().await.unwrap(), None);

        webcam_unmount().await.unwrap();
    }

    #[tokio::test]
    async fn test_dimensions_command() {
        let spec = DimensionSpec::new()
            .with_height(720)
            .with_aspect_ratio(AspectRatio::Widescreen);
        assert_eq!(
            webcam_dimensions(spec).await.unwrap(),
            Dimensions::new(1280, 720)
        );

        let from_host: DimensionSpec =
            serde_json::from_str(r#"{"width":1024,"aspect_ratio":"4:3"}"#).unwrap();
        assert_eq!(
            webcam_dimensions(from_host).await.unwrap(),
            Dimensions::new(1024, 768)
        );
    }
}
