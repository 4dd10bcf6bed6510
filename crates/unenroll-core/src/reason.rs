use std::fmt;

pub const CUSTOM_REASON_KEY: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReasonKey(String);

impl ReasonKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn custom() -> Self {
        Self(CUSTOM_REASON_KEY.to_string())
    }

    pub fn is_custom(&self) -> bool {
        self.0 == CUSTOM_REASON_KEY
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReasonKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reason selection for one modal session.
///
/// `is_submitted` is recomputed on every read from the submitted value and
/// the skip flag. All operations are total: submitting without a selection
/// leaves the submitted value empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasonCapture {
    selected: Option<ReasonKey>,
    custom_option: String,
    skipped: bool,
    submitted: Option<String>,
}

impl ReasonCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&ReasonKey> {
        self.selected.as_ref()
    }

    /// Keys are not checked against any catalog here.
    pub fn select_option(&mut self, key: ReasonKey) {
        self.selected = Some(key);
    }

    pub fn custom_option(&self) -> &str {
        &self.custom_option
    }

    pub fn set_custom_option(&mut self, text: impl Into<String>) {
        self.custom_option = text.into();
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn value(&self) -> Option<&str> {
        self.submitted.as_deref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some() || self.skipped
    }

    pub fn submit(&mut self) {
        self.submitted = match &self.selected {
            Some(key) if key.is_custom() => Some(self.custom_option.clone()),
            Some(key) => Some(key.as_str().to_string()),
            None => None,
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
