use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::space::ActionField;

/// One browser-automation primitive an agent may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    None,
    MoveCoords,
    ClickCoords,
    DblclickCoords,
    MousedownCoords,
    MouseupCoords,
    ClickElement,
    ScrollUp,
    ScrollDown,
    PressKey,
    TypeText,
    TypeField,
    FocusElementAndTypeText,
    FocusElementAndTypeField,
}

impl ActionKind {
    pub const ALL: [ActionKind; 14] = [
        ActionKind::None,
        ActionKind::MoveCoords,
        ActionKind::ClickCoords,
        ActionKind::DblclickCoords,
        ActionKind::MousedownCoords,
        ActionKind::MouseupCoords,
        ActionKind::ClickElement,
        ActionKind::ScrollUp,
        ActionKind::ScrollDown,
        ActionKind::PressKey,
        ActionKind::TypeText,
        ActionKind::TypeField,
        ActionKind::FocusElementAndTypeText,
        ActionKind::FocusElementAndTypeField,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::None => "NONE",
            ActionKind::MoveCoords => "MOVE_COORDS",
            ActionKind::ClickCoords => "CLICK_COORDS",
            ActionKind::DblclickCoords => "DBLCLICK_COORDS",
            ActionKind::MousedownCoords => "MOUSEDOWN_COORDS",
            ActionKind::MouseupCoords => "MOUSEUP_COORDS",
            ActionKind::ClickElement => "CLICK_ELEMENT",
            ActionKind::ScrollUp => "SCROLL_UP",
            ActionKind::ScrollDown => "SCROLL_DOWN",
            ActionKind::PressKey => "PRESS_KEY",
            ActionKind::TypeText => "TYPE_TEXT",
            ActionKind::TypeField => "TYPE_FIELD",
            ActionKind::FocusElementAndTypeText => "FOCUS_ELEMENT_AND_TYPE_TEXT",
            ActionKind::FocusElementAndTypeField => "FOCUS_ELEMENT_AND_TYPE_FIELD",
        }
    }

    pub fn in_group(self, group: CapabilityGroup) -> bool {
        group.contains(self)
    }

    /// Capability groups this kind belongs to. May be empty.
    pub fn groups(self) -> Vec<CapabilityGroup> {
        CapabilityGroup::ALL
            .into_iter()
            .filter(|group| group.contains(self))
            .collect()
    }

    /// The driver primitive wired to this kind.
    ///
    /// This is a partial table: `None` has nothing to run, and scrolling,
    /// key presses and the field-typing kinds have no primitive yet, so the
    /// dispatcher rejects them.
    pub const fn primitive(self) -> Option<Primitive> {
        match self {
            ActionKind::MoveCoords => Some(Primitive::MoveCoords),
            ActionKind::ClickCoords => Some(Primitive::ClickCoords),
            ActionKind::DblclickCoords => Some(Primitive::DblclickCoords),
            ActionKind::MousedownCoords => Some(Primitive::MousedownCoords),
            ActionKind::MouseupCoords => Some(Primitive::MouseupCoords),
            ActionKind::ClickElement => Some(Primitive::ClickElement),
            ActionKind::TypeText => Some(Primitive::TypeText),
            ActionKind::FocusElementAndTypeText => Some(Primitive::FocusElementAndTypeText),
            ActionKind::None
            | ActionKind::ScrollUp
            | ActionKind::ScrollDown
            | ActionKind::PressKey
            | ActionKind::TypeField
            | ActionKind::FocusElementAndTypeField => None,
        }
    }

    /// Whether dispatching this kind can succeed.
    pub const fn is_dispatchable(self) -> bool {
        matches!(self, ActionKind::None) || self.primitive().is_some()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action kind: {0}")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownActionKind(s.to_string()))
    }
}

/// Kinds sharing a structural field requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityGroup {
    Coords,
    Element,
    Text,
    Field,
}

impl CapabilityGroup {
    pub const ALL: [CapabilityGroup; 4] = [
        CapabilityGroup::Coords,
        CapabilityGroup::Element,
        CapabilityGroup::Text,
        CapabilityGroup::Field,
    ];

    pub const fn contains(self, kind: ActionKind) -> bool {
        match self {
            CapabilityGroup::Coords => matches!(
                kind,
                ActionKind::MoveCoords
                    | ActionKind::ClickCoords
                    | ActionKind::DblclickCoords
                    | ActionKind::MousedownCoords
                    | ActionKind::MouseupCoords
            ),
            CapabilityGroup::Element => matches!(
                kind,
                ActionKind::ClickElement
                    | ActionKind::FocusElementAndTypeText
                    | ActionKind::FocusElementAndTypeField
            ),
            CapabilityGroup::Text => matches!(
                kind,
                ActionKind::TypeText | ActionKind::FocusElementAndTypeText
            ),
            CapabilityGroup::Field => matches!(
                kind,
                ActionKind::TypeField | ActionKind::FocusElementAndTypeField
            ),
        }
    }

    pub fn members(self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Schema field an instance of a member kind must carry.
    pub const fn field(self) -> ActionField {
        match self {
            CapabilityGroup::Coords => ActionField::Coords,
            CapabilityGroup::Element => ActionField::Ref,
            CapabilityGroup::Text => ActionField::Text,
            CapabilityGroup::Field => ActionField::Field,
        }
    }
}

/// Low-level driver operations the dispatcher can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    MoveCoords,
    ClickCoords,
    DblclickCoords,
    MousedownCoords,
    MouseupCoords,
    ClickElement,
    TypeText,
    FocusElementAndTypeText,
}
