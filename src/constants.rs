/// Number of element references the `ref` field can address.
pub const MAX_REF: usize = 1000;
/// Number of utterance fields the `field` field can address.
pub const MAX_FIELDS: usize = 20;
/// Default upper bound on typed text length.
pub const TYPING_MAX_LENGTH: usize = 10;

/// Printable ASCII, space through tilde.
pub const ASCII_CHARS: std::ops::RangeInclusive<char> = ' '..='~';

pub const DEFAULT_ALLOWED_KEYS: &[&str] = &[
    "<Enter>",
    "<Backspace>",
    "<Tab>",
    "<Escape>",
    "<Delete>",
    "<Up>",
    "<Down>",
    "<Left>",
    "<Right>",
    "<Home>",
    "<End>",
    "<PageUp>",
    "<PageDown>",
    "<C-a>",
    "<C-c>",
    "<C-x>",
    "<C-v>",
];

/// Attribute MiniWoB task pages stamp on every referable element.
pub const REF_ATTRIBUTE: &str = "data-wob_ref";
