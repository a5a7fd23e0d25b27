//! Where the handler's output goes: a status line, a result area and
//! blocking notices.

pub const NO_PLATE: &str = "No plate detected";

pub trait Screen: Send + Sync {
    fn alert(&self, message: &str);
    fn set_status(&self, status: &str);
    fn set_result(&self, result: &str);
}

#[derive(serde::Deserialize, clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Json,
    Plates,
}

impl Format {
    pub fn render(&self, resp: &crate::detector::Response) -> String {
        if resp.is_empty() {
            return NO_PLATE.to_owned();
        }
        match self {
            Format::Json => resp.to_pretty(),
            Format::Plates => match resp.plates() {
                Some(plates) if !plates.is_empty() => plates
                    .iter()
                    .map(|p| format!("{} {},{},{},{}", p.plate, p.bbox[0], p.bbox[1], p.bbox[2], p.bbox[3]))
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => resp.to_pretty(),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub status: String,
    pub result: String,
    pub alerts: Vec<String>,
}

/// The shared display slots. Every write replaces a slot whole, so with
/// overlapping detections the last writer wins.
#[derive(Default)]
pub struct Slots {
    state: parking_lot::Mutex<Snapshot>,
}

impl Slots {
    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().clone()
    }
}

impl Screen for Slots {
    fn alert(&self, message: &str) {
        self.state.lock().alerts.push(message.to_owned());
    }

    fn set_status(&self, status: &str) {
        self.state.lock().status = status.to_owned();
    }

    fn set_result(&self, result: &str) {
        self.state.lock().result = result.to_owned();
    }
}

/// Status and notices on stderr, results on stdout. The slots keep the
/// current status and result; notices are only printed.
#[derive(Default)]
pub struct Terminal {
    slots: Slots,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.slots.snapshot()
    }
}

impl Screen for Terminal {
    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }

    fn set_status(&self, status: &str) {
        self.slots.set_status(status);
        eprintln!("{}", status);
    }

    fn set_result(&self, result: &str) {
        self.slots.set_result(result);
        if !result.is_empty() {
            println!("{}", result);
        }
    }
}
