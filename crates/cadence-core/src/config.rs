use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::event::types::FieldKind;
use crate::model::Phase;

/// Full engine configuration: phase classes, tracker field identifiers,
/// and outlier thresholds.
///
/// One value of this type is passed explicitly into every constructor that
/// needs it; there is no process-wide configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    #[serde(default)]
    pub classes: PhaseClasses,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub thresholds: OutlierThresholds,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            classes: PhaseClasses::default(),
            fields: FieldMap::default(),
            thresholds: OutlierThresholds::default(),
        }
    }
}

impl PhaseConfig {
    /// Validate the configuration.
    ///
    /// Phase classes are configuration, not derived data; an empty class
    /// would make whole phases silently unreachable, so it is fatal to the
    /// run rather than warned about.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first empty phase class.
    pub fn validate(&self) -> Result<()> {
        self.classes.validate()
    }
}

/// Named sets of workflow-status values treated as equivalent for cycle-time
/// and activity purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseClasses {
    /// Statuses that open the discovery phase.
    #[serde(default = "default_discovery_statuses")]
    pub discovery: Vec<String>,
    /// Statuses that open the build phase (and close discovery).
    #[serde(default = "default_build_statuses")]
    pub build: Vec<String>,
    /// Statuses that close the build phase.
    #[serde(default = "default_completion_statuses")]
    pub completion: Vec<String>,
    /// Statuses representing a hold: time in them is excluded from active
    /// cycle time.
    #[serde(default = "default_hold_statuses")]
    pub hold: Vec<String>,
    /// Statuses after which an item no longer counts as active.
    #[serde(default = "default_terminal_statuses")]
    pub terminal: Vec<String>,
}

impl Default for PhaseClasses {
    fn default() -> Self {
        Self {
            discovery: default_discovery_statuses(),
            build: default_build_statuses(),
            completion: default_completion_statuses(),
            hold: default_hold_statuses(),
            terminal: default_terminal_statuses(),
        }
    }
}

impl PhaseClasses {
    /// The status class whose first entry opens the given phase.
    #[must_use]
    pub fn start_class(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Discovery => &self.discovery,
            Phase::Build => &self.build,
        }
    }

    /// The status class whose first entry after the start closes the phase.
    #[must_use]
    pub fn end_class(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Discovery => &self.build,
            Phase::Build => &self.completion,
        }
    }

    /// Returns true when `status` is in the hold class.
    #[must_use]
    pub fn is_hold(&self, status: &str) -> bool {
        class_contains(&self.hold, status)
    }

    /// Returns true when `status` is in the terminal class.
    #[must_use]
    pub fn is_terminal(&self, status: &str) -> bool {
        class_contains(&self.terminal, status)
    }

    fn validate(&self) -> Result<()> {
        let named: [(&str, &[String]); 5] = [
            ("discovery", &self.discovery),
            ("build", &self.build),
            ("completion", &self.completion),
            ("hold", &self.hold),
            ("terminal", &self.terminal),
        ];
        for (name, class) in named {
            anyhow::ensure!(
                !class.is_empty(),
                "phase class '{name}' is empty; every class needs at least one status value"
            );
        }
        Ok(())
    }
}

/// Returns true when `status` matches a class member (trimmed, exact).
#[must_use]
pub fn class_contains(class: &[String], status: &str) -> bool {
    let status = status.trim();
    class.iter().any(|member| member.as_str() == status)
}

/// Mapping from tracker field identifiers to the field kinds replay
/// understands.
///
/// Custom fields arrive under opaque identifiers (e.g. `customfield_10238`);
/// listing them here is what makes them typed instead of probed for at
/// runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "default_status_fields")]
    pub status: Vec<String>,
    #[serde(default = "default_assignee_fields")]
    pub assignee: Vec<String>,
    #[serde(default = "default_health_fields")]
    pub health: Vec<String>,
    #[serde(default = "default_archived_fields")]
    pub archived: Vec<String>,
    /// Values coerced to `true` for the archival flag (case-insensitive).
    #[serde(default = "default_truthy_values")]
    pub truthy_values: Vec<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            status: default_status_fields(),
            assignee: default_assignee_fields(),
            health: default_health_fields(),
            archived: default_archived_fields(),
            truthy_values: default_truthy_values(),
        }
    }
}

impl FieldMap {
    /// Resolve a raw field identifier to a [`FieldKind`].
    ///
    /// Unknown identifiers map to [`FieldKind::Other`]: they are carried
    /// through parsing but ignored by replay.
    #[must_use]
    pub fn kind_of(&self, raw: &str) -> FieldKind {
        let raw = raw.trim();
        if matches_id(&self.status, raw) {
            FieldKind::Status
        } else if matches_id(&self.assignee, raw) {
            FieldKind::Assignee
        } else if matches_id(&self.health, raw) {
            FieldKind::Health
        } else if matches_id(&self.archived, raw) {
            FieldKind::Archived
        } else {
            FieldKind::Other(raw.to_string())
        }
    }

    /// Coerce an archival-flag value to a bool via the truthy set.
    #[must_use]
    pub fn is_truthy(&self, value: &str) -> bool {
        self.truthy_values
            .iter()
            .any(|t| t.eq_ignore_ascii_case(value.trim()))
    }
}

fn matches_id(ids: &[String], raw: &str) -> bool {
    ids.iter().any(|id| id.eq_ignore_ascii_case(raw))
}

/// Duration bounds outside which a cycle record is excluded from
/// distributional statistics (but still counted).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutlierThresholds {
    /// Minimum plausible phase duration, in weeks. Guards against
    /// back-to-back status flips.
    #[serde(default = "default_min_weeks")]
    pub min_weeks: f64,
    /// Maximum plausible phase duration, in weeks. Guards against items
    /// abandoned and later revived.
    #[serde(default = "default_max_weeks")]
    pub max_weeks: f64,
}

impl Default for OutlierThresholds {
    fn default() -> Self {
        Self {
            min_weeks: default_min_weeks(),
            max_weeks: default_max_weeks(),
        }
    }
}

/// Load a [`PhaseConfig`] from an optional TOML path.
///
/// `None` yields the built-in defaults. A given path must exist and parse;
/// configuration errors are the one class of failure that is fatal to the
/// whole run.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not valid TOML, or
/// fails [`PhaseConfig::validate`].
pub fn load_config(path: Option<&Path>) -> Result<PhaseConfig> {
    let Some(path) = path else {
        return Ok(PhaseConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: PhaseConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;

    Ok(config)
}

fn default_discovery_statuses() -> Vec<String> {
    vec![
        "02 Generative Discovery".to_string(),
        "04 Problem Discovery".to_string(),
        "05 Solution Discovery".to_string(),
    ]
}

fn default_build_statuses() -> Vec<String> {
    vec!["06 Build".to_string()]
}

fn default_completion_statuses() -> Vec<String> {
    vec!["07 Beta".to_string(), "08 Live".to_string()]
}

fn default_hold_statuses() -> Vec<String> {
    vec!["01 Inbox".to_string(), "03 Committed".to_string()]
}

fn default_terminal_statuses() -> Vec<String> {
    vec!["08 Live".to_string(), "Won't Do".to_string()]
}

fn default_status_fields() -> Vec<String> {
    vec!["status".to_string()]
}

fn default_assignee_fields() -> Vec<String> {
    vec!["assignee".to_string()]
}

fn default_health_fields() -> Vec<String> {
    vec!["customfield_10238".to_string(), "health".to_string()]
}

fn default_archived_fields() -> Vec<String> {
    vec!["customfield_10454".to_string(), "archived".to_string()]
}

fn default_truthy_values() -> Vec<String> {
    vec!["true".to_string(), "yes".to_string(), "1".to_string()]
}

const fn default_min_weeks() -> f64 {
    1.0 / 7.0
}

const fn default_max_weeks() -> f64 {
    180.0 / 7.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_classes_cover_the_stock_workflow() {
        let cfg = PhaseConfig::default();
        assert_eq!(cfg.classes.discovery.len(), 3);
        assert_eq!(cfg.classes.build, vec!["06 Build"]);
        assert!(cfg.classes.is_hold("01 Inbox"));
        assert!(cfg.classes.is_hold("03 Committed"));
        assert!(cfg.classes.is_terminal("08 Live"));
        assert!(cfg.classes.is_terminal("Won't Do"));
        assert!(!cfg.classes.is_terminal("06 Build"));
    }

    #[test]
    fn start_and_end_classes_pair_adjacent_phases() {
        let classes = PhaseClasses::default();
        assert_eq!(classes.start_class(Phase::Discovery), &classes.discovery[..]);
        assert_eq!(classes.end_class(Phase::Discovery), &classes.build[..]);
        assert_eq!(classes.start_class(Phase::Build), &classes.build[..]);
        assert_eq!(classes.end_class(Phase::Build), &classes.completion[..]);
    }

    #[test]
    fn class_membership_trims_but_is_exact() {
        let classes = PhaseClasses::default();
        assert!(class_contains(&classes.build, " 06 Build "));
        assert!(!class_contains(&classes.build, "Build"));
    }

    #[test]
    fn field_map_resolves_known_identifiers() {
        let fields = FieldMap::default();
        assert_eq!(fields.kind_of("status"), FieldKind::Status);
        assert_eq!(fields.kind_of("Assignee"), FieldKind::Assignee);
        assert_eq!(fields.kind_of("customfield_10238"), FieldKind::Health);
        assert_eq!(fields.kind_of("customfield_10454"), FieldKind::Archived);
    }

    #[test]
    fn field_map_unknown_identifier_becomes_other() {
        let fields = FieldMap::default();
        assert_eq!(
            fields.kind_of("customfield_99999"),
            FieldKind::Other("customfield_99999".to_string())
        );
    }

    #[test]
    fn truthy_set_is_case_insensitive() {
        let fields = FieldMap::default();
        assert!(fields.is_truthy("true"));
        assert!(fields.is_truthy("YES"));
        assert!(fields.is_truthy(" 1 "));
        assert!(!fields.is_truthy("false"));
        assert!(!fields.is_truthy("0"));
        assert!(!fields.is_truthy(""));
    }

    #[test]
    fn default_thresholds_are_one_day_to_180_days() {
        let thresholds = OutlierThresholds::default();
        assert!((thresholds.min_weeks - 1.0 / 7.0).abs() < 1e-9);
        assert!((thresholds.max_weeks - 180.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn load_config_none_uses_defaults() {
        let cfg = load_config(None).expect("defaults should load");
        assert_eq!(cfg.classes.build, vec!["06 Build"]);
    }

    #[test]
    fn load_config_missing_file_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing)).expect_err("should fail");
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn load_config_parses_overrides() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cadence.toml");
        std::fs::write(
            &path,
            r#"
[classes]
discovery = ["Research"]
build = ["In Progress"]
completion = ["Done"]
hold = ["Blocked"]
terminal = ["Done", "Cancelled"]

[fields]
health = ["customfield_777"]

[thresholds]
min_weeks = 0.5
"#,
        )
        .expect("write config");

        let cfg = load_config(Some(&path)).expect("should load");
        assert_eq!(cfg.classes.discovery, vec!["Research"]);
        assert!(cfg.classes.is_hold("Blocked"));
        assert_eq!(cfg.fields.kind_of("customfield_777"), FieldKind::Health);
        // Unspecified field groups keep their defaults.
        assert_eq!(cfg.fields.kind_of("status"), FieldKind::Status);
        assert!((cfg.thresholds.min_weeks - 0.5).abs() < 1e-9);
        assert!((cfg.thresholds.max_weeks - 180.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn load_config_rejects_empty_class() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cadence.toml");
        std::fs::write(
            &path,
            r#"
[classes]
hold = []
"#,
        )
        .expect("write config");

        let err = load_config(Some(&path)).expect_err("should fail validation");
        let chain = format!("{err:#}");
        assert!(chain.contains("hold"), "error should name the class: {chain}");
    }
}
