use crate::config::UnenrollConfig;
use crate::reason::ReasonKey;

const DEFAULT_REASONS: &[(&str, &str)] = &[
    (
        "prereqs",
        "I don't have the academic or language prerequisites",
    ),
    ("difficulty", "The course material was too hard"),
    ("goals", "This won't help me reach my goals"),
    ("broken", "Something was broken"),
    ("time", "I don't have the time"),
    ("browse", "I just wanted to browse the material"),
    ("support", "I don't have enough support"),
    ("quality", "I am not happy with the quality of the content"),
    ("easy", "The course material was too easy"),
];

const CUSTOM_REASON_LABEL: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonOption {
    pub key: ReasonKey,
    pub label: String,
}

/// Reason options offered in the reason step. The free-text option is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCatalog {
    options: Vec<ReasonOption>,
}

impl Default for ReasonCatalog {
    fn default() -> Self {
        Self::with_options(
            DEFAULT_REASONS
                .iter()
                .map(|(key, label)| ReasonOption {
                    key: ReasonKey::new(*key),
                    label: (*label).to_string(),
                })
                .collect(),
        )
    }
}

impl ReasonCatalog {
    pub fn from_config(config: &UnenrollConfig) -> Self {
        if config.reasons.is_empty() {
            return Self::default();
        }

        Self::with_options(
            config
                .reasons
                .iter()
                .map(|spec| ReasonOption {
                    key: ReasonKey::new(spec.key.trim()),
                    label: spec.label.trim().to_string(),
                })
                .collect(),
        )
    }

    fn with_options(mut options: Vec<ReasonOption>) -> Self {
        options.retain(|option| !option.key.is_custom());
        options.push(ReasonOption {
            key: ReasonKey::custom(),
            label: CUSTOM_REASON_LABEL.to_string(),
        });
        Self { options }
    }

    pub fn options(&self) -> &[ReasonOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReasonOption> {
        self.options.get(index)
    }

    pub fn find(&self, key: &ReasonKey) -> Option<&ReasonOption> {
        self.options.iter().find(|option| &option.key == key)
    }

    pub fn position(&self, key: &ReasonKey) -> Option<usize> {
        self.options.iter().position(|option| &option.key == key)
    }

    /// Labels a submitted value; free text and unknown keys are returned as-is.
    pub fn label_for<'a>(&'a self, value: &'a str) -> &'a str {
        self.options
            .iter()
            .find(|option| !option.key.is_custom() && option.key.as_str() == value)
            .map(|option| option.label.as_str())
            .unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::ReasonCatalog;
    use crate::config::{ReasonSpec, UnenrollConfig};
    use crate::reason::ReasonKey;

    #[test]
    fn default_catalog_ends_with_custom_option() {
        let catalog = ReasonCatalog::default();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.options()[0].key.as_str(), "prereqs");
        assert!(catalog.options()[9].key.is_custom());
        assert_eq!(catalog.options()[9].label, "Other");
    }

    #[test]
    fn configured_reasons_replace_defaults_but_keep_custom() {
        let config = UnenrollConfig {
            reasons: vec![ReasonSpec {
                key: " cost ".to_string(),
                label: "Too expensive".to_string(),
            }],
            ..UnenrollConfig::default()
        };

        let catalog = ReasonCatalog::from_config(&config);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.options()[0].key.as_str(), "cost");
        assert!(catalog.options()[1].key.is_custom());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let catalog = ReasonCatalog::from_config(&UnenrollConfig::default());
        assert_eq!(catalog, ReasonCatalog::default());
    }

    #[test]
    fn label_for_maps_known_keys_and_passes_free_text_through() {
        let catalog = ReasonCatalog::default();
        assert_eq!(catalog.label_for("time"), "I don't have the time");
        assert_eq!(catalog.label_for("too expensive"), "too expensive");
        assert_eq!(catalog.label_for("custom"), "custom");
    }

    #[test]
    fn find_and_position_locate_options() {
        let catalog = ReasonCatalog::default();
        let key = ReasonKey::from("broken");
        assert_eq!(catalog.position(&key), Some(3));
        assert_eq!(
            catalog.find(&key).map(|option| option.label.as_str()),
            Some("Something was broken")
        );
        assert!(catalog.find(&ReasonKey::from("missing")).is_none());
    }
}
