// Capture workflow: acquire one image, preview it, submit it, show the
// result. The session owns every state transition; the terminal UI only
// renders the current state and forwards the user's choices.

use std::path::Path;

use thiserror::Error;

use crate::api::{ApiClient, SubmitError};
use crate::camera::Camera;
use crate::results::{results_location, EmotionResult};
use crate::selection::{ImageSource, SelectedImage, SubmissionPayload};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a supported image file")]
    UnsupportedImage(String),
    #[error("Camera error: {0}")]
    Camera(String),
    #[error("Cannot change the image while it is being submitted")]
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// Waiting for an image from the selected source tab.
    Acquiring { tab: ImageSource },
    /// An image is selected. `error` holds the last failed submission.
    Previewing {
        image: SelectedImage,
        error: Option<String>,
    },
    /// The image is with the relay.
    Submitting { image: SelectedImage },
    /// Terminal state: the relay answered.
    Result {
        result: EmotionResult,
        location: String,
    },
}

#[derive(Debug, Clone)]
pub struct CaptureSession {
    state: CaptureState,
    tab: ImageSource,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Acquiring {
                tab: ImageSource::default(),
            },
            tab: ImageSource::default(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn selected_image(&self) -> Option<&SelectedImage> {
        match &self.state {
            CaptureState::Previewing { image, .. } | CaptureState::Submitting { image } => {
                Some(image)
            }
            _ => None,
        }
    }

    /// Switch source tab. Only has an effect while acquiring.
    pub fn select_tab(&mut self, tab: ImageSource) {
        if let CaptureState::Acquiring { tab: current } = &mut self.state {
            *current = tab;
            self.tab = tab;
        }
    }

    /// Read an image file from disk and preview it.
    pub fn load_upload(&mut self, path: &Path) -> Result<(), CaptureError> {
        self.ensure_not_submitting()?;
        let bytes = std::fs::read(path).map_err(|source| CaptureError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        self.accept_upload(bytes, file_name)
    }

    /// Preview an uploaded file already read into memory.
    pub fn accept_upload(&mut self, bytes: Vec<u8>, file_name: String) -> Result<(), CaptureError> {
        self.ensure_not_submitting()?;
        let image = SelectedImage::from_upload(bytes, file_name.clone())
            .ok_or(CaptureError::UnsupportedImage(file_name))?;
        self.preview(image);
        Ok(())
    }

    /// Take a frame from `camera`. Returns `false` and leaves the session
    /// untouched when no frame was available.
    pub fn capture(&mut self, camera: &dyn Camera) -> Result<bool, CaptureError> {
        self.ensure_not_submitting()?;
        let frame = camera
            .capture_frame()
            .map_err(|e| CaptureError::Camera(format!("{:#}", e)))?;
        match frame {
            Some(frame) => {
                self.preview(SelectedImage::from_capture(&frame.bytes, &frame.mime));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the selected image (or result) and go back to acquiring.
    pub fn reset(&mut self) {
        self.state = CaptureState::Acquiring { tab: self.tab };
    }

    /// Move to `Submitting` and hand out the payload to send.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SubmitError> {
        let image = match &self.state {
            CaptureState::Previewing { image, .. } => image,
            CaptureState::Submitting { .. } => return Err(SubmitError::AlreadySubmitting),
            _ => return Err(SubmitError::NoImageSelected),
        };
        let payload = match image.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                let err = SubmitError::from(e);
                self.state = CaptureState::Previewing {
                    image: image.clone(),
                    error: Some(err.to_string()),
                };
                return Err(err);
            }
        };
        self.state = CaptureState::Submitting {
            image: image.clone(),
        };
        Ok(payload)
    }

    /// Apply the outcome of a submission. Failures go back to previewing
    /// with the same image so the user can retry; the error is handed back.
    pub fn finish_submit(
        &mut self,
        outcome: Result<EmotionResult, SubmitError>,
    ) -> Result<(), SubmitError> {
        let CaptureState::Submitting { image } = &self.state else {
            tracing::warn!("submission finished outside of the submitting state");
            return outcome.map(|_| ());
        };
        match outcome {
            Ok(result) => {
                let location = results_location(&result);
                self.state = CaptureState::Result { result, location };
                Ok(())
            }
            Err(e) => {
                tracing::debug!("submission failed: {:?}", e);
                self.state = CaptureState::Previewing {
                    image: image.clone(),
                    error: Some(e.to_string()),
                };
                Err(e)
            }
        }
    }

    /// Submit the selected image to the relay and apply the outcome.
    pub fn submit(&mut self, api: &ApiClient) -> Result<(), SubmitError> {
        let payload = self.begin_submit()?;
        let outcome = api.detect_emotion(&payload);
        self.finish_submit(outcome)
    }

    fn preview(&mut self, image: SelectedImage) {
        self.tab = image.source();
        self.state = CaptureState::Previewing { image, error: None };
    }

    fn ensure_not_submitting(&self) -> Result<(), CaptureError> {
        match self.state {
            CaptureState::Submitting { .. } => Err(CaptureError::Busy),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CapturedFrame;
    use serde_json::json;

    struct FixedCamera(Option<CapturedFrame>);

    impl Camera for FixedCamera {
        fn capture_frame(&self) -> anyhow::Result<Option<CapturedFrame>> {
            Ok(self.0.clone())
        }
    }

    fn jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4]
    }

    fn previewing() -> CaptureSession {
        let mut session = CaptureSession::new();
        session.accept_upload(jpeg(), "face.jpg".into()).unwrap();
        session
    }

    #[test]
    fn test_starts_acquiring_upload() {
        let session = CaptureSession::new();
        assert_eq!(
            session.state(),
            &CaptureState::Acquiring {
                tab: ImageSource::Upload
            }
        );
        assert!(session.selected_image().is_none());
    }

    #[test]
    fn test_tab_switching_keeps_image_cleared() {
        let mut session = CaptureSession::new();
        for tab in [ImageSource::Camera, ImageSource::Upload, ImageSource::Camera] {
            session.select_tab(tab);
            assert_eq!(session.state(), &CaptureState::Acquiring { tab });
            assert!(session.selected_image().is_none());
        }
    }

    #[test]
    fn test_tab_switch_ignored_while_previewing() {
        let mut session = previewing();
        let before = session.state().clone();
        session.select_tab(ImageSource::Camera);
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_upload_moves_to_preview() {
        let session = previewing();
        let image = session.selected_image().unwrap();
        assert!(image.preview().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_non_image_upload_stays_acquiring() {
        let mut session = CaptureSession::new();
        let err = session
            .accept_upload(b"plain text".to_vec(), "notes.txt".into())
            .unwrap_err();
        assert!(matches!(err, CaptureError::UnsupportedImage(_)));
        assert!(matches!(session.state(), CaptureState::Acquiring { .. }));
    }

    #[test]
    fn test_reupload_replaces_image() {
        let mut session = previewing();
        let png = b"\x89PNG\r\n\x1a\n".to_vec();
        session.accept_upload(png, "other.png".into()).unwrap();
        assert_eq!(session.selected_image().unwrap().mime(), "image/png");
    }

    #[test]
    fn test_capture_without_frame_stays_acquiring() {
        let mut session = CaptureSession::new();
        session.select_tab(ImageSource::Camera);
        assert!(!session.capture(&FixedCamera(None)).unwrap());
        assert_eq!(
            session.state(),
            &CaptureState::Acquiring {
                tab: ImageSource::Camera
            }
        );
    }

    #[test]
    fn test_capture_with_frame_previews() {
        let mut session = CaptureSession::new();
        session.select_tab(ImageSource::Camera);
        let frame = CapturedFrame {
            bytes: jpeg(),
            mime: "image/jpeg".into(),
        };
        assert!(session.capture(&FixedCamera(Some(frame))).unwrap());
        let image = session.selected_image().unwrap();
        assert_eq!(image.source(), ImageSource::Camera);
        assert_eq!(image.to_payload().unwrap().bytes, jpeg());
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut acquiring = CaptureSession::new();
        acquiring.reset();

        let mut preview = previewing();
        preview.reset();

        let mut submitting = previewing();
        submitting.begin_submit().unwrap();
        submitting.reset();

        let mut done = previewing();
        done.begin_submit().unwrap();
        done.finish_submit(Ok(EmotionResult(json!([])))).unwrap();
        done.reset();

        for session in [acquiring, preview, submitting, done] {
            assert!(matches!(session.state(), CaptureState::Acquiring { .. }));
            assert!(session.selected_image().is_none());
        }
    }

    #[test]
    fn test_reset_keeps_last_tab() {
        let mut session = CaptureSession::new();
        session.select_tab(ImageSource::Camera);
        let frame = CapturedFrame {
            bytes: jpeg(),
            mime: "image/jpeg".into(),
        };
        session.capture(&FixedCamera(Some(frame))).unwrap();
        session.reset();
        assert_eq!(
            session.state(),
            &CaptureState::Acquiring {
                tab: ImageSource::Camera
            }
        );
    }

    #[test]
    fn test_submit_without_image() {
        let mut session = CaptureSession::new();
        let err = session.begin_submit().unwrap_err();
        assert!(matches!(err, SubmitError::NoImageSelected));
        assert_eq!(err.to_string(), "Please upload or capture an image.");
    }

    #[test]
    fn test_undecodable_capture_reports_error() {
        let mut session = CaptureSession::new();
        let frame = CapturedFrame {
            bytes: b"farbfeld\0\0\0\x01\0\0\0\x01".to_vec(),
            mime: "application/octet-stream".into(),
        };
        session.capture(&FixedCamera(Some(frame))).unwrap();

        let err = session.begin_submit().unwrap_err();
        assert!(matches!(err, SubmitError::Payload(_)));
        match session.state() {
            CaptureState::Previewing { error, .. } => {
                assert_eq!(error.as_deref(), Some(err.to_string().as_str()))
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut session = previewing();
        let payload = session.begin_submit().unwrap();
        assert_eq!(payload.field, "image");
        assert!(matches!(
            session.begin_submit(),
            Err(SubmitError::AlreadySubmitting)
        ));
        assert!(matches!(
            session.accept_upload(jpeg(), "again.jpg".into()),
            Err(CaptureError::Busy)
        ));
    }

    #[test]
    fn test_failed_submit_keeps_image() {
        let mut session = previewing();
        let image = session.selected_image().unwrap().clone();
        session.begin_submit().unwrap();
        let err = session
            .finish_submit(Err(SubmitError::Relay {
                status: 500,
                message: "upstream down".into(),
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
        assert_eq!(
            session.state(),
            &CaptureState::Previewing {
                image,
                error: Some("upstream down".into())
            }
        );
        // retry without re-acquiring
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn test_successful_submit_carries_location() {
        let mut session = previewing();
        session.begin_submit().unwrap();
        let result = EmotionResult(json!({"label": "happy", "score": 0.92}));
        session.finish_submit(Ok(result.clone())).unwrap();
        match session.state() {
            CaptureState::Result {
                result: got,
                location,
            } => {
                assert_eq!(got, &result);
                assert_eq!(location, &results_location(&result));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }
}
