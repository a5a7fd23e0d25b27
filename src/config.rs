pub const DEFAULT_PATH: &str = "platedetect.toml";

fn endpoint_default() -> String {
    crate::detector::DEFAULT_ENDPOINT.to_owned()
}

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "endpoint_default")]
    pub endpoint: String,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub overlap: crate::handler::OverlapPolicy,
    #[serde(default)]
    pub format: crate::display::Format,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: endpoint_default(),
            request_timeout_secs: None,
            overlap: Default::default(),
            format: Default::default(),
        }
    }
}

impl std::str::FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Config {
    /// Loads `path`. A missing file is only an error if it was asked for
    /// explicitly; otherwise the defaults apply.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, anyhow::Error> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (std::path::Path::new(DEFAULT_PATH), false),
        };

        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(anyhow::format_err!("reading {}: {}", path.display(), e)),
        };

        std::str::from_utf8(&raw)?.parse()
    }

    /// Command-line and environment values win over the file.
    pub fn apply_overrides(&mut self, endpoint: Option<String>, format: Option<crate::display::Format>) {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(format) = format {
            self.format = format;
        }
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout_secs.map(std::time::Duration::from_secs)
    }
}
