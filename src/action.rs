use serde::{Deserialize, Serialize};

/// A single action instance produced by a policy for one environment step.
///
/// Only `action_type` is always present. The other fields are carried when
/// the selected kind needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Index into the configuration's `action_types`.
    pub action_type: usize,
    /// Pixel coordinates, or bin indices when the configuration bins them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<[f64; 2]>,
    /// Element reference.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<u32>,
    /// Index into the configuration's `allowed_keys`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Utterance field index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<usize>,
}

impl Action {
    pub fn new(action_type: usize) -> Self {
        Self {
            action_type,
            ..Default::default()
        }
    }

    pub fn with_coords(mut self, x: f64, y: f64) -> Self {
        self.coords = Some([x, y]);
        self
    }

    pub fn with_ref(mut self, reference: u32) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_key(mut self, key: usize) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_field(mut self, field: usize) -> Self {
        self.field = Some(field);
        self
    }
}
