//! Translate one action instance into a single driver call.

use anyhow::Result;
use tracing::debug;

use crate::action::Action;
use crate::config::ActionSpaceConfig;
use crate::error::ActionError;
use crate::kinds::{ActionKind, Primitive};
use crate::space::ActionField;

/// Browser automation primitives the dispatcher can invoke.
///
/// Calls are synchronous and block until the browser has acted. A handle is
/// driven by one caller at a time.
pub trait Driver {
    fn move_coords(&mut self, left: f64, top: f64) -> Result<()>;
    fn click_coords(&mut self, left: f64, top: f64) -> Result<()>;
    fn dblclick_coords(&mut self, left: f64, top: f64) -> Result<()>;
    fn mousedown_coords(&mut self, left: f64, top: f64) -> Result<()>;
    fn mouseup_coords(&mut self, left: f64, top: f64) -> Result<()>;
    fn click_element(&mut self, reference: u32) -> Result<()>;
    fn type_text(&mut self, text: &str) -> Result<()>;
    fn focus_element_and_type_text(&mut self, reference: u32, text: &str) -> Result<()>;
}

/// Execute `action` against `driver` under `config`.
///
/// Performs at most one driver call. Driver failures are returned as
/// [`ActionError::Driver`] without retry.
pub fn execute_action<D>(
    action: &Action,
    config: &ActionSpaceConfig,
    driver: &mut D,
) -> Result<(), ActionError>
where
    D: Driver + ?Sized,
{
    let kind = config.resolve_kind(action)?;
    if kind == ActionKind::None {
        debug!("no-op action");
        return Ok(());
    }
    let primitive = kind
        .primitive()
        .ok_or(ActionError::UnsupportedAction(kind))?;

    match primitive {
        Primitive::MoveCoords => at_coords(kind, action, config, driver, D::move_coords)?,
        Primitive::ClickCoords => at_coords(kind, action, config, driver, D::click_coords)?,
        Primitive::DblclickCoords => at_coords(kind, action, config, driver, D::dblclick_coords)?,
        Primitive::MousedownCoords => {
            at_coords(kind, action, config, driver, D::mousedown_coords)?
        }
        Primitive::MouseupCoords => at_coords(kind, action, config, driver, D::mouseup_coords)?,
        Primitive::ClickElement => {
            let reference = require_ref(kind, action)?;
            debug!(%kind, reference, "dispatching element click");
            driver.click_element(reference)?;
        }
        Primitive::TypeText => {
            let text = require_text(kind, action)?;
            debug!(%kind, len = text.chars().count(), "dispatching text entry");
            driver.type_text(text)?;
        }
        Primitive::FocusElementAndTypeText => {
            let reference = require_ref(kind, action)?;
            let text = require_text(kind, action)?;
            debug!(%kind, reference, len = text.chars().count(), "dispatching focused text entry");
            driver.focus_element_and_type_text(reference, text)?;
        }
    }

    Ok(())
}

fn at_coords<D>(
    kind: ActionKind,
    action: &Action,
    config: &ActionSpaceConfig,
    driver: &mut D,
    primitive: fn(&mut D, f64, f64) -> Result<()>,
) -> Result<(), ActionError>
where
    D: Driver + ?Sized,
{
    let (left, top) = config.compute_raw_coords(action)?;
    debug!(%kind, left, top, "dispatching coordinate action");
    primitive(driver, left, top)?;
    Ok(())
}

fn require_ref(kind: ActionKind, action: &Action) -> Result<u32, ActionError> {
    action.reference.ok_or(ActionError::MissingField {
        kind,
        field: ActionField::Ref,
    })
}

fn require_text(kind: ActionKind, action: &Action) -> Result<&str, ActionError> {
    action.text.as_deref().ok_or(ActionError::MissingField {
        kind,
        field: ActionField::Text,
    })
}
