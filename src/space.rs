//! Generic space descriptors and the field-keyed action schema built from them.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::action::Action;
use crate::constants::ASCII_CHARS;

/// Names of the fields an action instance may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionField {
    ActionType,
    Coords,
    Ref,
    Key,
    Text,
    Field,
}

impl ActionField {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionField::ActionType => "action_type",
            ActionField::Coords => "coords",
            ActionField::Ref => "ref",
            ActionField::Key => "key",
            ActionField::Text => "text",
            ActionField::Field => "field",
        }
    }
}

impl fmt::Display for ActionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Characters permitted in typed text.
///
/// Deserializes from `"ascii"`, `{"chars": [..]}`, or a bare string listing
/// the allowed characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "CharsetRepr")]
pub enum Charset {
    /// Printable ASCII.
    #[default]
    Ascii,
    Chars(BTreeSet<char>),
}

impl Charset {
    pub fn contains(&self, c: char) -> bool {
        match self {
            Charset::Ascii => ASCII_CHARS.contains(&c),
            Charset::Chars(chars) => chars.contains(&c),
        }
    }
}

impl From<&str> for Charset {
    fn from(chars: &str) -> Self {
        Charset::Chars(chars.chars().collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CharsetRepr {
    Bare(String),
    Tagged(TaggedCharset),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedCharset {
    Chars(BTreeSet<char>),
}

impl From<CharsetRepr> for Charset {
    fn from(repr: CharsetRepr) -> Self {
        match repr {
            CharsetRepr::Bare(name) if name == "ascii" => Charset::Ascii,
            CharsetRepr::Bare(chars) => Charset::from(chars.as_str()),
            CharsetRepr::Tagged(TaggedCharset::Chars(chars)) => Charset::Chars(chars),
        }
    }
}

/// A typed, bounded value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Space {
    /// Integers in `0..n`.
    Discrete { n: usize },
    /// A continuous 2-vector bounded per component.
    #[serde(rename = "box")]
    Continuous { low: [f64; 2], high: [f64; 2] },
    /// A pair of integers, component `i` in `0..nvec[i]`.
    MultiDiscrete { nvec: [u32; 2] },
    Text {
        min_length: usize,
        max_length: usize,
        charset: Charset,
    },
}

impl Space {
    pub fn contains_index(&self, index: usize) -> bool {
        match self {
            Space::Discrete { n } => index < *n,
            _ => false,
        }
    }

    pub fn contains_coords(&self, coords: [f64; 2]) -> bool {
        match self {
            Space::Continuous { low, high } => coords
                .iter()
                .zip(low.iter().zip(high))
                .all(|(v, (lo, hi))| v.is_finite() && lo <= v && v <= hi),
            Space::MultiDiscrete { nvec } => coords
                .iter()
                .zip(nvec)
                .all(|(v, n)| v.fract() == 0.0 && *v >= 0.0 && *v < f64::from(*n)),
            _ => false,
        }
    }

    pub fn contains_text(&self, text: &str) -> bool {
        match self {
            Space::Text {
                min_length,
                max_length,
                charset,
            } => {
                let len = text.chars().count();
                len >= *min_length && len <= *max_length && text.chars().all(|c| charset.contains(c))
            }
            _ => false,
        }
    }
}

/// Structural description of a valid action instance.
///
/// Serializes as a JSON object from field name to domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionSpace {
    fields: BTreeMap<ActionField, Space>,
}

impl ActionSpace {
    pub(crate) fn new(fields: BTreeMap<ActionField, Space>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: ActionField) -> Option<&Space> {
        self.fields.get(&field)
    }

    pub fn has(&self, field: ActionField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = ActionField> + '_ {
        self.fields.keys().copied()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ActionField, Space> {
        self.fields.iter()
    }

    /// Whether every field the instance supplies exists in the schema and
    /// lies inside its domain. Fields the instance leaves out are not
    /// required here: which ones a kind needs depends on the configuration.
    pub fn contains(&self, action: &Action) -> bool {
        if !self.check(ActionField::ActionType, |s| s.contains_index(action.action_type)) {
            return false;
        }
        if let Some(coords) = action.coords {
            if !self.check(ActionField::Coords, |s| s.contains_coords(coords)) {
                return false;
            }
        }
        if let Some(reference) = action.reference {
            if !self.check(ActionField::Ref, |s| s.contains_index(reference as usize)) {
                return false;
            }
        }
        if let Some(key) = action.key {
            if !self.check(ActionField::Key, |s| s.contains_index(key)) {
                return false;
            }
        }
        if let Some(text) = action.text.as_deref() {
            if !self.check(ActionField::Text, |s| s.contains_text(text)) {
                return false;
            }
        }
        if let Some(field) = action.field {
            if !self.check(ActionField::Field, |s| s.contains_index(field)) {
                return false;
            }
        }
        true
    }

    fn check(&self, field: ActionField, pred: impl FnOnce(&Space) -> bool) -> bool {
        self.get(field).is_some_and(pred)
    }
}
