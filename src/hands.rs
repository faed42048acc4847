use anyhow::{Context, Result, anyhow};
use headless_chrome::browser::tab::point::Point;
use headless_chrome::protocol::cdp::Input;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::REF_ATTRIBUTE;
use crate::dispatch::Driver;

/// Where to get a browser from.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Websocket debugger URL of an already running Chrome.
    pub debug_url: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub window_size: Option<(u32, u32)>,
}

/// Browser session driving one tab.
pub struct BrowserSession {
    _browser: Browser,
    pub tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn launch(options: &SessionOptions) -> Result<Self> {
        if let Some(url) = &options.debug_url {
            info!(%url, "attaching to existing Chrome");
            match Browser::connect(url.clone()) {
                Ok(browser) => {
                    let existing = {
                        let tabs = browser.get_tabs();
                        let tabs = tabs
                            .lock()
                            .map_err(|_| anyhow!("browser tab list lock poisoned"))?;
                        tabs.first().cloned()
                    };
                    let tab = match existing {
                        Some(tab) => {
                            debug!("using existing tab");
                            tab
                        }
                        None => browser.new_tab()?,
                    };
                    return Ok(Self {
                        _browser: browser,
                        tab,
                    });
                }
                Err(err) => warn!(%err, "could not attach, launching a new browser"),
            }
        }

        let launch = LaunchOptions {
            headless: options.headless,
            path: options.chrome_path.clone(),
            window_size: options.window_size,
            args: vec![
                std::ffi::OsStr::new("--no-first-run"),
                std::ffi::OsStr::new("--no-default-browser-check"),
                std::ffi::OsStr::new("--disable-infobars"),
            ],
            idle_browser_timeout: Duration::from_secs(60),
            ..Default::default()
        };

        info!(headless = options.headless, "starting Chrome");
        let browser = Browser::new(launch).context("browser launch failed")?;
        let tab = browser.new_tab()?;
        info!("Chrome ready");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Navigate to a task page and wait for its body.
    pub fn open(&self, url: &str) -> Result<()> {
        info!(%url, "opening task page");
        self.tab.navigate_to(url)?;
        self.tab.wait_for_element("body")?;
        Ok(())
    }

    /// Viewport size in CSS pixels.
    pub fn viewport_size(&self) -> Result<(f64, f64)> {
        let result = self
            .tab
            .evaluate("[window.innerWidth, window.innerHeight]", false)?;
        let value = result
            .value
            .ok_or_else(|| anyhow!("viewport query returned nothing"))?;
        let dims = value
            .as_array()
            .map(|dims| dims.iter().filter_map(|v| v.as_f64()).collect::<Vec<_>>())
            .unwrap_or_default();
        match dims.as_slice() {
            [width, height] => Ok((*width, *height)),
            _ => Err(anyhow!("unexpected viewport value: {}", value)),
        }
    }

    fn ref_selector(reference: u32) -> String {
        format!("[{REF_ATTRIBUTE}=\"{reference}\"]")
    }

    /// Move to a point, then send left-button presses and releases there.
    fn mouse_sequence(&self, left: f64, top: f64, steps: &[MouseStep]) -> Result<()> {
        self.tab.move_mouse_to_point(Point { x: left, y: top })?;
        for step in steps {
            use Input::DispatchMouseEventTypeOption::{MousePressed, MouseReleased};
            let (kind, click_count) = match *step {
                MouseStep::Press(count) => (MousePressed, count),
                MouseStep::Release(count) => (MouseReleased, count),
            };
            self.tab.call_method(Input::DispatchMouseEvent {
                Type: kind,
                x: left,
                y: top,
                modifiers: None,
                timestamp: None,
                button: Some(Input::MouseButton::Left),
                buttons: None,
                click_count: Some(click_count),
                force: None,
                tangential_pressure: None,
                tilt_x: None,
                tilt_y: None,
                twist: None,
                delta_x: None,
                delta_y: None,
                pointer_Type: None,
            })?;
        }
        debug!(left, top, ?steps, "mouse sequence sent");
        Ok(())
    }
}

/// One trusted input event, carrying its click count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MouseStep {
    Press(u32),
    Release(u32),
}

/// Chrome derives `dblclick` from the second press/release pair.
const DOUBLE_CLICK: [MouseStep; 4] = [
    MouseStep::Press(1),
    MouseStep::Release(1),
    MouseStep::Press(2),
    MouseStep::Release(2),
];

impl Driver for BrowserSession {
    fn move_coords(&mut self, left: f64, top: f64) -> Result<()> {
        self.tab.move_mouse_to_point(Point { x: left, y: top })?;
        Ok(())
    }

    fn click_coords(&mut self, left: f64, top: f64) -> Result<()> {
        self.tab.click_point(Point { x: left, y: top })?;
        Ok(())
    }

    fn dblclick_coords(&mut self, left: f64, top: f64) -> Result<()> {
        self.mouse_sequence(left, top, &DOUBLE_CLICK)
    }

    fn mousedown_coords(&mut self, left: f64, top: f64) -> Result<()> {
        self.mouse_sequence(left, top, &[MouseStep::Press(1)])
    }

    fn mouseup_coords(&mut self, left: f64, top: f64) -> Result<()> {
        self.mouse_sequence(left, top, &[MouseStep::Release(1)])
    }

    fn click_element(&mut self, reference: u32) -> Result<()> {
        let selector = Self::ref_selector(reference);
        self.tab.find_element(&selector)?.click()?;
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        self.tab.type_str(text)?;
        Ok(())
    }

    fn focus_element_and_type_text(&mut self, reference: u32, text: &str) -> Result<()> {
        let selector = Self::ref_selector(reference);
        self.tab.find_element(&selector)?.click()?;
        self.tab.type_str(text)?;
        Ok(())
    }
}
