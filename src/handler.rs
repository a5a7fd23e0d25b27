use crate::detector::Detector;
use crate::display::Screen;
use crate::selection::SelectedFile;

pub const SELECT_IMAGE: &str = "Please select an image";
pub const ALREADY_DETECTING: &str = "Detection already in progress";
pub const DETECTING: &str = "Detecting plate...";
pub const DONE: &str = "Done ✅";
pub const SERVER_ERROR: &str = "Server error ❌";

/// What happens when a detection is triggered while another one is still
/// waiting on the service.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Both run; whichever response arrives last owns the display.
    #[default]
    Race,
    /// The new trigger is refused with a notice.
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    NoSelection,
    Unreadable,
    Busy,
    Done,
    Failed,
}

pub struct Handler {
    detector: Box<dyn Detector + Send + Sync>,
    screen: std::sync::Arc<dyn Screen>,
    format: crate::display::Format,
    overlap: OverlapPolicy,
    in_flight: tokio::sync::Mutex<()>,
}

impl Handler {
    pub fn new(
        detector: Box<dyn Detector + Send + Sync>,
        screen: std::sync::Arc<dyn Screen>,
        format: crate::display::Format,
        overlap: OverlapPolicy,
    ) -> Self {
        Self {
            detector,
            screen,
            format,
            overlap,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Reads the selected path, if any, and runs a detection on it.
    pub async fn trigger_path(&self, path: Option<&std::path::Path>) -> Outcome {
        let path = if let Some(path) = path {
            path
        } else {
            return self.trigger(None).await;
        };

        match SelectedFile::open(path).await {
            Ok(file) => self.trigger(Some(file)).await,
            Err(e) => {
                self.screen.alert(&format!("Could not read {}: {}", path.display(), e));
                Outcome::Unreadable
            }
        }
    }

    pub async fn trigger(&self, selection: Option<SelectedFile>) -> Outcome {
        let file = if let Some(file) = selection {
            file
        } else {
            self.screen.alert(SELECT_IMAGE);
            return Outcome::NoSelection;
        };

        let _guard = match self.overlap {
            OverlapPolicy::Race => None,
            OverlapPolicy::Reject => match self.in_flight.try_lock() {
                Ok(guard) => Some(guard),
                Err(_) => {
                    log::info!("refusing {}: a detection is in flight", file.name);
                    self.screen.alert(ALREADY_DETECTING);
                    return Outcome::Busy;
                }
            },
        };

        self.screen.set_status(DETECTING);
        self.screen.set_result("");

        match self.detector.detect(&file).await {
            Ok(resp) => {
                if let Some(error) = resp.error() {
                    log::warn!("detector reported: {}", error);
                }
                log::info!("{}: count = {:?}", file.name, resp.count());
                self.screen.set_result(&self.format.render(&resp));
                self.screen.set_status(DONE);
                Outcome::Done
            }
            Err(e) => {
                self.screen.set_status(SERVER_ERROR);
                log::error!("detection of {} failed: {:?}", file.name, e);
                Outcome::Failed
            }
        }
    }
}
