//! Action space configuration: which kinds are enabled, what an action
//! instance must carry for them, and how coordinates map to pixels.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroU32;
use std::sync::OnceLock;
use tracing::warn;

use crate::action::Action;
use crate::constants::{DEFAULT_ALLOWED_KEYS, MAX_FIELDS, MAX_REF, TYPING_MAX_LENGTH};
use crate::error::{ActionError, ConfigurationError};
use crate::kinds::{ActionKind, CapabilityGroup};
use crate::space::{ActionField, ActionSpace, Charset, Space};

pub const PRESET_ALL_SUPPORTED: &str = "all_supported";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Configuration of the action space.
///
/// `action_types` order is the encoding of the `action_type` selector, and
/// `allowed_keys` order is the encoding of `key`. Both are fixed for the
/// lifetime of the value. Screen geometry may be supplied up front or set
/// exactly once later through [`ActionSpaceConfig::set_screen_size`], once
/// the owning environment knows its viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigRepr", into = "ConfigRepr")]
pub struct ActionSpaceConfig {
    action_types: Vec<ActionKind>,
    screen: OnceLock<ScreenSize>,
    coord_bins: Option<[NonZeroU32; 2]>,
    allowed_keys: Vec<String>,
    text_max_len: usize,
    text_charset: Charset,
}

impl ActionSpaceConfig {
    pub fn new(action_types: impl IntoIterator<Item = ActionKind>) -> Self {
        let config = Self {
            action_types: action_types.into_iter().collect(),
            screen: OnceLock::new(),
            coord_bins: None,
            allowed_keys: DEFAULT_ALLOWED_KEYS.iter().map(|k| k.to_string()).collect(),
            text_max_len: TYPING_MAX_LENGTH,
            text_charset: Charset::default(),
        };

        let unsupported = config.unsupported_kinds();
        if !unsupported.is_empty() {
            warn!(
                kinds = ?unsupported,
                "action space includes kinds with no dispatch handler; executing them will fail"
            );
        }

        config
    }

    /// Canonical configuration registered under `name`.
    pub fn preset(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            PRESET_ALL_SUPPORTED => Ok(Self::new([
                ActionKind::None,
                ActionKind::ClickCoords,
                ActionKind::ClickElement,
                ActionKind::TypeText,
                ActionKind::FocusElementAndTypeText,
            ])),
            _ => Err(ConfigurationError::UnknownPreset(name.to_string())),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Supply screen geometry up front. A zero, negative or non-finite size
    /// counts as unset and leaves the one-time fixup available.
    pub fn with_screen_size(mut self, width: f64, height: f64) -> Self {
        let size = ScreenSize { width, height };
        if size.is_valid() {
            self.screen = OnceLock::from(size);
        } else {
            warn!(width, height, "ignoring invalid screen size");
            self.screen = OnceLock::new();
        }
        self
    }

    /// Discretize coordinates into `x_bins` by `y_bins` cells.
    pub fn with_coord_bins(mut self, x_bins: NonZeroU32, y_bins: NonZeroU32) -> Self {
        self.coord_bins = Some([x_bins, y_bins]);
        self
    }

    pub fn with_allowed_keys<K: Into<String>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.allowed_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_text_max_len(mut self, text_max_len: usize) -> Self {
        self.text_max_len = text_max_len;
        self
    }

    pub fn with_text_charset(mut self, charset: Charset) -> Self {
        self.text_charset = charset;
        self
    }

    pub fn action_types(&self) -> &[ActionKind] {
        &self.action_types
    }

    pub fn screen_size(&self) -> Option<ScreenSize> {
        self.screen.get().copied()
    }

    /// Whether usable screen geometry is known.
    pub fn has_screen_geometry(&self) -> bool {
        self.screen_size().is_some_and(ScreenSize::is_valid)
    }

    pub fn coord_bins(&self) -> Option<[NonZeroU32; 2]> {
        self.coord_bins
    }

    pub fn allowed_keys(&self) -> &[String] {
        &self.allowed_keys
    }

    pub fn text_max_len(&self) -> usize {
        self.text_max_len
    }

    pub fn text_charset(&self) -> &Charset {
        &self.text_charset
    }

    /// One-time geometry fixup. Must happen before the first coordinate
    /// action; the geometry is frozen afterwards.
    pub fn set_screen_size(&self, width: f64, height: f64) -> Result<(), ConfigurationError> {
        let size = ScreenSize { width, height };
        if !size.is_valid() {
            return Err(ConfigurationError::InvalidScreenSize { width, height });
        }
        self.screen
            .set(size)
            .map_err(|_| ConfigurationError::GeometryAlreadySet)
    }

    pub fn uses(&self, group: CapabilityGroup) -> bool {
        self.action_types.iter().any(|kind| group.contains(*kind))
    }

    /// Configured kinds the dispatcher will reject.
    pub fn unsupported_kinds(&self) -> Vec<ActionKind> {
        self.action_types
            .iter()
            .copied()
            .filter(|kind| !kind.is_dispatchable())
            .collect()
    }

    /// Build the schema an action instance must satisfy.
    ///
    /// A field appears only when some configured kind needs it.
    pub fn action_space(&self) -> Result<ActionSpace, ConfigurationError> {
        self.check_encodings()?;

        let mut fields = BTreeMap::new();
        fields.insert(
            ActionField::ActionType,
            Space::Discrete {
                n: self.action_types.len(),
            },
        );

        if self.uses(CapabilityGroup::Coords) {
            let screen = self.require_screen()?;
            let coords = match self.coord_bins {
                Some([x_bins, y_bins]) => Space::MultiDiscrete {
                    nvec: [x_bins.get(), y_bins.get()],
                },
                None => Space::Continuous {
                    low: [0.0, 0.0],
                    high: [screen.width, screen.height],
                },
            };
            fields.insert(ActionField::Coords, coords);
        }
        if self.uses(CapabilityGroup::Element) {
            fields.insert(ActionField::Ref, Space::Discrete { n: MAX_REF });
        }
        if self.action_types.contains(&ActionKind::PressKey) {
            fields.insert(
                ActionField::Key,
                Space::Discrete {
                    n: self.allowed_keys.len(),
                },
            );
        }
        if self.uses(CapabilityGroup::Text) {
            fields.insert(
                ActionField::Text,
                Space::Text {
                    min_length: 1,
                    max_length: self.text_max_len,
                    charset: self.text_charset.clone(),
                },
            );
        }
        if self.uses(CapabilityGroup::Field) {
            fields.insert(ActionField::Field, Space::Discrete { n: MAX_FIELDS });
        }

        Ok(ActionSpace::new(fields))
    }

    pub fn resolve_kind(&self, action: &Action) -> Result<ActionKind, ActionError> {
        self.action_types
            .get(action.action_type)
            .copied()
            .ok_or(ActionError::IndexOutOfRange {
                field: ActionField::ActionType,
                index: action.action_type,
                len: self.action_types.len(),
            })
    }

    /// Label of the key selected by `action.key`.
    pub fn resolve_key(&self, action: &Action) -> Result<&str, ActionError> {
        let Some(index) = action.key else {
            return Err(ActionError::MissingField {
                kind: self.resolve_kind(action)?,
                field: ActionField::Key,
            });
        };
        self.allowed_keys
            .get(index)
            .map(String::as_str)
            .ok_or(ActionError::IndexOutOfRange {
                field: ActionField::Key,
                index,
                len: self.allowed_keys.len(),
            })
    }

    /// Pixel `(left, top)` for the instance's `coords`.
    ///
    /// Binned coordinates land on the center of their cell. Bin indices are
    /// truncated to integers but not range-checked.
    pub fn compute_raw_coords(&self, action: &Action) -> Result<(f64, f64), ActionError> {
        let Some([x, y]) = action.coords else {
            return Err(ActionError::MissingField {
                kind: self.resolve_kind(action)?,
                field: ActionField::Coords,
            });
        };
        let screen = self.require_screen()?;

        match self.coord_bins {
            Some([x_bins, y_bins]) => Ok((
                bin_center(x, x_bins, screen.width),
                bin_center(y, y_bins, screen.height),
            )),
            None => Ok((x, y)),
        }
    }

    fn require_screen(&self) -> Result<ScreenSize, ConfigurationError> {
        self.screen_size()
            .filter(|size| size.is_valid())
            .ok_or(ConfigurationError::MissingScreenGeometry)
    }

    fn check_encodings(&self) -> Result<(), ConfigurationError> {
        if self.action_types.is_empty() {
            return Err(ConfigurationError::EmptyActionTypes);
        }
        let mut seen = HashSet::new();
        for kind in &self.action_types {
            if !seen.insert(*kind) {
                return Err(ConfigurationError::DuplicateActionType(*kind));
            }
        }
        let mut seen = HashSet::new();
        for key in &self.allowed_keys {
            if !seen.insert(key.as_str()) {
                return Err(ConfigurationError::DuplicateKey(key.clone()));
            }
        }
        Ok(())
    }
}

fn bin_center(index: f64, bins: NonZeroU32, extent: f64) -> f64 {
    (index.trunc() + 0.5) * (extent / f64::from(bins.get()))
}

#[derive(Serialize, Deserialize)]
struct ConfigRepr {
    action_types: Vec<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    screen_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    screen_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coord_bins: Option<[NonZeroU32; 2]>,
    #[serde(default = "default_allowed_keys")]
    allowed_keys: Vec<String>,
    #[serde(default = "default_text_max_len")]
    text_max_len: usize,
    #[serde(default)]
    text_charset: Charset,
}

fn default_allowed_keys() -> Vec<String> {
    DEFAULT_ALLOWED_KEYS.iter().map(|k| k.to_string()).collect()
}

fn default_text_max_len() -> usize {
    TYPING_MAX_LENGTH
}

impl From<ConfigRepr> for ActionSpaceConfig {
    fn from(repr: ConfigRepr) -> Self {
        let mut config = ActionSpaceConfig::new(repr.action_types)
            .with_allowed_keys(repr.allowed_keys)
            .with_text_max_len(repr.text_max_len)
            .with_text_charset(repr.text_charset);
        if let (Some(width), Some(height)) = (repr.screen_width, repr.screen_height) {
            config = config.with_screen_size(width, height);
        }
        if let Some([x_bins, y_bins]) = repr.coord_bins {
            config = config.with_coord_bins(x_bins, y_bins);
        }
        config
    }
}

impl From<ActionSpaceConfig> for ConfigRepr {
    fn from(config: ActionSpaceConfig) -> Self {
        let screen = config.screen_size();
        ConfigRepr {
            action_types: config.action_types,
            screen_width: screen.map(|s| s.width),
            screen_height: screen.map(|s| s.height),
            coord_bins: config.coord_bins,
            allowed_keys: config.allowed_keys,
            text_max_len: config.text_max_len,
            text_charset: config.text_charset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins(x: u32, y: u32) -> (NonZeroU32, NonZeroU32) {
        (NonZeroU32::new(x).unwrap(), NonZeroU32::new(y).unwrap())
    }

    #[test]
    fn test_all_supported_preset() {
        let config = ActionSpaceConfig::preset("all_supported").unwrap();
        assert_eq!(
            config.action_types(),
            &[
                ActionKind::None,
                ActionKind::ClickCoords,
                ActionKind::ClickElement,
                ActionKind::TypeText,
                ActionKind::FocusElementAndTypeText,
            ]
        );
        assert!(config.screen_size().is_none());
        assert!(config.unsupported_kinds().is_empty());
    }

    #[test]
    fn test_unknown_preset() {
        let err = ActionSpaceConfig::preset("nonexistent").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPreset(name) if name == "nonexistent"));
    }

    #[test]
    fn test_field_presence_follows_groups() {
        for kind in ActionKind::ALL {
            let kinds = if kind == ActionKind::None {
                vec![kind]
            } else {
                vec![ActionKind::None, kind]
            };
            let space = ActionSpaceConfig::new(kinds)
                .with_screen_size(160.0, 210.0)
                .action_space()
                .unwrap();
            assert!(space.has(ActionField::ActionType));
            assert_eq!(
                space.has(ActionField::Coords),
                kind.in_group(CapabilityGroup::Coords),
                "{kind}"
            );
            assert_eq!(
                space.has(ActionField::Ref),
                kind.in_group(CapabilityGroup::Element),
                "{kind}"
            );
            assert_eq!(
                space.has(ActionField::Text),
                kind.in_group(CapabilityGroup::Text),
                "{kind}"
            );
            assert_eq!(
                space.has(ActionField::Field),
                kind.in_group(CapabilityGroup::Field),
                "{kind}"
            );
            assert_eq!(
                space.has(ActionField::Key),
                kind == ActionKind::PressKey,
                "{kind}"
            );
        }
    }

    #[test]
    fn test_field_presence_ignores_position() {
        let front = ActionSpaceConfig::new([ActionKind::TypeField, ActionKind::None]);
        let back = ActionSpaceConfig::new([ActionKind::None, ActionKind::TypeField]);
        assert_eq!(front.action_space().unwrap(), back.action_space().unwrap());
    }

    #[test]
    fn test_schema_bounds() {
        let config = ActionSpaceConfig::new([
            ActionKind::None,
            ActionKind::ClickCoords,
            ActionKind::PressKey,
            ActionKind::FocusElementAndTypeText,
        ])
        .with_screen_size(160.0, 210.0)
        .with_allowed_keys(["<Enter>", "<Tab>"])
        .with_text_max_len(5);
        let space = config.action_space().unwrap();

        assert_eq!(space.get(ActionField::ActionType), Some(&Space::Discrete { n: 4 }));
        assert_eq!(
            space.get(ActionField::Coords),
            Some(&Space::Continuous {
                low: [0.0, 0.0],
                high: [160.0, 210.0]
            })
        );
        assert_eq!(space.get(ActionField::Ref), Some(&Space::Discrete { n: MAX_REF }));
        assert_eq!(space.get(ActionField::Key), Some(&Space::Discrete { n: 2 }));
        assert_eq!(
            space.get(ActionField::Text),
            Some(&Space::Text {
                min_length: 1,
                max_length: 5,
                charset: Charset::Ascii
            })
        );
        assert!(!space.has(ActionField::Field));
    }

    #[test]
    fn test_binned_schema() {
        let (x, y) = bins(4, 2);
        let config = ActionSpaceConfig::new([ActionKind::ClickCoords])
            .with_screen_size(800.0, 600.0)
            .with_coord_bins(x, y);
        let space = config.action_space().unwrap();
        assert_eq!(
            space.get(ActionField::Coords),
            Some(&Space::MultiDiscrete { nvec: [4, 2] })
        );
    }

    #[test]
    fn test_schema_is_stable() {
        let config = ActionSpaceConfig::preset("all_supported")
            .unwrap()
            .with_screen_size(160.0, 210.0);
        assert_eq!(config.action_space().unwrap(), config.action_space().unwrap());
    }

    #[test]
    fn test_coordinate_schema_requires_geometry() {
        let config = ActionSpaceConfig::preset("all_supported").unwrap();
        assert!(matches!(
            config.action_space(),
            Err(ConfigurationError::MissingScreenGeometry)
        ));

        let config = ActionSpaceConfig::new([ActionKind::MoveCoords]).with_screen_size(0.0, 210.0);
        assert!(matches!(
            config.action_space(),
            Err(ConfigurationError::MissingScreenGeometry)
        ));
    }

    #[test]
    fn test_schema_without_coordinates_needs_no_geometry() {
        let config = ActionSpaceConfig::new([ActionKind::None, ActionKind::ClickElement]);
        let space = config.action_space().unwrap();
        assert!(!space.has(ActionField::Coords));
    }

    #[test]
    fn test_empty_and_duplicate_action_types() {
        assert!(matches!(
            ActionSpaceConfig::new(Vec::new()).action_space(),
            Err(ConfigurationError::EmptyActionTypes)
        ));
        assert!(matches!(
            ActionSpaceConfig::new([ActionKind::TypeText, ActionKind::TypeText]).action_space(),
            Err(ConfigurationError::DuplicateActionType(ActionKind::TypeText))
        ));
    }

    #[test]
    fn test_raw_coords_pass_through() {
        let config = ActionSpaceConfig::new([ActionKind::ClickCoords]).with_screen_size(300.0, 200.0);
        for (x, y) in [(0.0, 0.0), (10.0, 20.0), (123.25, 199.5), (300.0, 200.0)] {
            let action = Action::new(0).with_coords(x, y);
            assert_eq!(config.compute_raw_coords(&action).unwrap(), (x, y));
        }
    }

    #[test]
    fn test_binned_coords_hit_cell_centers() {
        let (x, y) = bins(4, 2);
        let config = ActionSpaceConfig::new([ActionKind::ClickCoords])
            .with_screen_size(800.0, 600.0)
            .with_coord_bins(x, y);

        let raw = |bx, by| {
            config
                .compute_raw_coords(&Action::new(0).with_coords(bx, by))
                .unwrap()
        };
        assert_eq!(raw(0.0, 0.0), (100.0, 150.0));
        assert_eq!(raw(3.0, 1.0), (700.0, 450.0));
        assert_eq!(raw(2.0, 0.0), (500.0, 150.0));
    }

    #[test]
    fn test_coordinate_computation_requires_geometry() {
        let (x, y) = bins(4, 2);
        let action = Action::new(0).with_coords(1.0, 1.0);

        let binned = ActionSpaceConfig::new([ActionKind::ClickCoords]).with_coord_bins(x, y);
        assert!(matches!(
            binned.compute_raw_coords(&action),
            Err(ActionError::Configuration(ConfigurationError::MissingScreenGeometry))
        ));

        let continuous = ActionSpaceConfig::new([ActionKind::ClickCoords]);
        assert!(matches!(
            continuous.compute_raw_coords(&action),
            Err(ActionError::Configuration(ConfigurationError::MissingScreenGeometry))
        ));
    }

    #[test]
    fn test_missing_coords_field() {
        let config = ActionSpaceConfig::new([ActionKind::MoveCoords]).with_screen_size(10.0, 10.0);
        assert!(matches!(
            config.compute_raw_coords(&Action::new(0)),
            Err(ActionError::MissingField {
                kind: ActionKind::MoveCoords,
                field: ActionField::Coords
            })
        ));
    }

    #[test]
    fn test_set_screen_size_once() {
        let config = ActionSpaceConfig::preset("all_supported").unwrap();
        assert!(matches!(
            config.set_screen_size(-1.0, 210.0),
            Err(ConfigurationError::InvalidScreenSize { .. })
        ));
        config.set_screen_size(160.0, 210.0).unwrap();
        assert!(matches!(
            config.set_screen_size(320.0, 420.0),
            Err(ConfigurationError::GeometryAlreadySet)
        ));
        assert_eq!(
            config.screen_size(),
            Some(ScreenSize {
                width: 160.0,
                height: 210.0
            })
        );
        assert!(config.action_space().is_ok());
    }

    #[test]
    fn test_invalid_initial_geometry_leaves_fixup_available() {
        let config = ActionSpaceConfig::from_json_str(
            r#"{ "action_types": ["CLICK_COORDS"], "screen_width": 0, "screen_height": 0 }"#,
        )
        .unwrap();
        assert!(config.screen_size().is_none());
        assert!(!config.has_screen_geometry());

        config.set_screen_size(160.0, 210.0).unwrap();
        assert!(config.has_screen_geometry());
        assert!(config.action_space().is_ok());

        let config =
            ActionSpaceConfig::new([ActionKind::ClickCoords]).with_screen_size(f64::NAN, 210.0);
        assert!(config.set_screen_size(160.0, 210.0).is_ok());
    }

    #[test]
    fn test_duplicate_allowed_keys() {
        let config = ActionSpaceConfig::new([ActionKind::PressKey])
            .with_allowed_keys(["<Enter>", "<Tab>", "<Enter>"]);
        assert!(matches!(
            config.action_space(),
            Err(ConfigurationError::DuplicateKey(key)) if key == "<Enter>"
        ));
    }

    #[test]
    fn test_resolve_key() {
        let config = ActionSpaceConfig::new([ActionKind::PressKey]).with_allowed_keys(["<Enter>", "<C-a>"]);
        assert_eq!(config.resolve_key(&Action::new(0).with_key(1)).unwrap(), "<C-a>");
        assert!(matches!(
            config.resolve_key(&Action::new(0).with_key(2)),
            Err(ActionError::IndexOutOfRange {
                field: ActionField::Key,
                index: 2,
                len: 2
            })
        ));
        assert!(matches!(
            config.resolve_key(&Action::new(0)),
            Err(ActionError::MissingField {
                kind: ActionKind::PressKey,
                field: ActionField::Key
            })
        ));
    }

    #[test]
    fn test_json_config() {
        let config = ActionSpaceConfig::from_json_str(
            r#"{
                "action_types": ["NONE", "CLICK_COORDS", "TYPE_TEXT"],
                "screen_width": 160,
                "screen_height": 210,
                "coord_bins": [32, 42],
                "text_charset": { "chars": ["a", "b"] }
            }"#,
        )
        .unwrap();
        assert_eq!(config.action_types().len(), 3);
        assert_eq!(config.screen_size().map(|s| s.width), Some(160.0));
        assert_eq!(config.coord_bins().map(|b| b[1].get()), Some(42));
        assert_eq!(config.text_max_len(), TYPING_MAX_LENGTH);
        assert_eq!(config.allowed_keys().len(), DEFAULT_ALLOWED_KEYS.len());
        assert!(config.text_charset().contains('a'));
        assert!(!config.text_charset().contains('c'));

        let round_trip: ActionSpaceConfig =
            serde_json::from_value(serde_json::to_value(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn test_json_config_accepts_bare_charset_string() {
        let config = ActionSpaceConfig::from_json_str(
            r#"{ "action_types": ["TYPE_TEXT"], "text_charset": "abc" }"#,
        )
        .unwrap();
        assert!(config.text_charset().contains('b'));
        assert!(!config.text_charset().contains('d'));

        let config = ActionSpaceConfig::from_json_str(
            r#"{ "action_types": ["TYPE_TEXT"], "text_charset": "ascii" }"#,
        )
        .unwrap();
        assert_eq!(config.text_charset(), &Charset::Ascii);
    }

    #[test]
    fn test_json_config_rejects_zero_bins() {
        let err = ActionSpaceConfig::from_json_str(
            r#"{ "action_types": ["CLICK_COORDS"], "coord_bins": [0, 4] }"#,
        );
        assert!(matches!(err, Err(ConfigurationError::Parse(_))));
    }

    #[test]
    fn test_unsupported_kinds_are_flagged() {
        let config = ActionSpaceConfig::new([
            ActionKind::None,
            ActionKind::ScrollUp,
            ActionKind::ClickElement,
            ActionKind::PressKey,
        ]);
        assert_eq!(
            config.unsupported_kinds(),
            vec![ActionKind::ScrollUp, ActionKind::PressKey]
        );
    }
}
