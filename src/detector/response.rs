#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, PartialEq)]
pub struct Plate {
    pub plate: String,
    #[serde(rename = "box")]
    pub bbox: [i64; 4],
}

/// A detection result as returned by the service. Only `count` has meaning
/// to us, everything else is carried along untouched for display.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    body: serde_json::Value,
}

impl Response {
    pub fn new(body: serde_json::Value) -> Self {
        Self { body }
    }

    pub fn count(&self) -> Option<f64> {
        self.body.get("count").and_then(|v| v.as_f64())
    }

    /// True only when `count` is present and numerically zero.
    pub fn is_empty(&self) -> bool {
        self.count() == Some(0.0)
    }

    pub fn plates(&self) -> Option<Vec<Plate>> {
        serde_json::from_value(self.body.get("plates")?.clone()).ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(|v| v.as_str())
    }

    pub fn to_pretty(&self) -> String {
        // Serializing a Value cannot fail.
        serde_json::to_string_pretty(&self.body).unwrap_or_default()
    }
}
