//! Plan Registry - Store and reuse conversion plans
//!
//! Saves named [`ConversionPlan`]s as JSON files so recurring conversions
//! (e.g. "monthly turnover to quarterly sums") can be replayed by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};
use crate::transform::plan::ConversionPlan;
use crate::validation::validate_conversion_plan;

/// A stored plan with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPlan {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// The conversion plan
    pub plan: ConversionPlan,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last time this plan was used
    pub last_used: Option<String>,
    /// Number of times used
    pub use_count: u32,
}

/// Registry for managing conversion plans
pub struct PlanRegistry {
    /// Directory where plans are stored
    registry_dir: PathBuf,
    /// Loaded plans (id -> plan)
    plans: HashMap<String, StoredPlan>,
}

impl PlanRegistry {
    /// Open the registry in `dir`, loading existing plans
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut registry = Self {
            registry_dir: PathBuf::from(dir.as_ref()),
            plans: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    pub fn dir(&self) -> &Path {
        &self.registry_dir
    }

    /// Load all plans from the registry directory; unreadable files are skipped.
    /// A plan's id is its file stem, whatever the file's `id` field says.
    fn load_all(&mut self) {
        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(mut plan) = serde_json::from_str::<StoredPlan>(&content) {
                    plan.id = stem.to_string();
                    self.plans.insert(plan.id.clone(), plan);
                }
            }
        }
    }

    /// All stored plans, sorted by name
    pub fn list(&self) -> Vec<&StoredPlan> {
        let mut plans: Vec<_> = self.plans.values().collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        plans
    }

    /// Get a plan by id, falling back to an exact name match
    pub fn get(&self, id_or_name: &str) -> Option<&StoredPlan> {
        self.plans
            .get(id_or_name)
            .or_else(|| self.list().into_iter().find(|p| p.name == id_or_name))
    }

    /// Save a new plan to the registry
    pub fn save(&mut self, plan: ConversionPlan, name: &str) -> RegistryResult<String> {
        fs::create_dir_all(&self.registry_dir)?;

        let id = self.generate_id(name);
        let stored = StoredPlan {
            id: id.clone(),
            name: name.to_string(),
            plan,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            use_count: 0,
        };

        self.write(&stored)?;
        self.plans.insert(id.clone(), stored);
        Ok(id)
    }

    /// Import a plan from a JSON file (validated against the plan schema)
    pub fn import(&mut self, path: &Path, name: Option<&str>) -> RegistryResult<String> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        validate_conversion_plan(&value).map_err(RegistryError::InvalidPlan)?;
        let plan: ConversionPlan = serde_json::from_value(value)?;

        let plan_name = name.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("imported")
        });

        self.save(plan, plan_name)
    }

    /// Bump usage statistics after running a plan
    pub fn record_use(&mut self, id: &str) -> RegistryResult<()> {
        let stored = self
            .plans
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        stored.last_used = Some(chrono::Utc::now().to_rfc3339());
        stored.use_count += 1;

        let stored = stored.clone();
        self.write(&stored)
    }

    /// Delete a plan from the registry
    pub fn delete(&mut self, id: &str) -> RegistryResult<()> {
        if self.plans.remove(id).is_none() {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        fs::remove_file(self.path_for(id))?;
        Ok(())
    }

    fn write(&self, stored: &StoredPlan) -> RegistryResult<()> {
        let content = serde_json::to_string_pretty(stored)?;
        fs::write(self.path_for(&stored.id), content)?;
        Ok(())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.registry_dir.join(format!("{}.json", id))
    }

    /// Generate a unique ID from a name
    fn generate_id(&self, name: &str) -> String {
        let slug: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        let slug = if slug.is_empty() { "plan".to_string() } else { slug };

        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut id = format!("{}-{}", slug, timestamp);
        let mut suffix = 1;
        while self.plans.contains_key(&id) {
            id = format!("{}-{}-{}", slug, timestamp, suffix);
            suffix += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregationMethod, Frequency};
    use tempfile::tempdir;

    fn quarterly_sum() -> ConversionPlan {
        ConversionPlan::Aggregate {
            to: Frequency::Quarter,
            method: AggregationMethod::Sum,
            ignore_incomplete: true,
        }
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let id = {
            let mut registry = PlanRegistry::with_dir(dir.path());
            registry.save(quarterly_sum(), "Monthly turnover").unwrap()
        };
        assert!(id.starts_with("monthly-turnover-"));

        let registry = PlanRegistry::with_dir(dir.path());
        assert_eq!(registry.dir(), dir.path());
        let stored = registry.get(&id).unwrap();
        assert_eq!(stored.plan, quarterly_sum());
        assert_eq!(stored.use_count, 0);
        assert_eq!(registry.get("Monthly turnover").unwrap().id, id);
    }

    #[test]
    fn test_ids_are_unique() {
        let dir = tempdir().unwrap();
        let mut registry = PlanRegistry::with_dir(dir.path());
        let a = registry.save(quarterly_sum(), "same").unwrap();
        let b = registry.save(quarterly_sum(), "same").unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_record_use_persists() {
        let dir = tempdir().unwrap();
        let mut registry = PlanRegistry::with_dir(dir.path());
        let id = registry.save(quarterly_sum(), "q").unwrap();
        registry.record_use(&id).unwrap();
        registry.record_use(&id).unwrap();

        let reloaded = PlanRegistry::with_dir(dir.path());
        let stored = reloaded.get(&id).unwrap();
        assert_eq!(stored.use_count, 2);
        assert!(stored.last_used.is_some());
    }

    #[test]
    fn test_import_validates_schema() {
        let dir = tempdir().unwrap();
        let mut registry = PlanRegistry::with_dir(dir.path().join("plans"));

        let good = dir.path().join("to-year.json");
        fs::write(&good, r#"{"operation":"aggregate","to":"Y","method":"mean"}"#).unwrap();
        let id = registry.import(&good, None).unwrap();
        assert_eq!(registry.get(&id).unwrap().name, "to-year");

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"operation":"aggregate","to":"Y","method":"max"}"#).unwrap();
        let err = registry.import(&bad, None).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPlan(_)));
    }

    #[test]
    fn test_ids_come_from_file_names() {
        let root = tempdir().unwrap();
        let plans_dir = root.path().join("plans");
        fs::create_dir_all(&plans_dir).unwrap();
        let outside = root.path().join("outside.json");
        fs::write(&outside, "{}").unwrap();

        let stored = StoredPlan {
            id: "../outside".to_string(),
            name: "edited".to_string(),
            plan: quarterly_sum(),
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            use_count: 0,
        };
        fs::write(
            plans_dir.join("edited.json"),
            serde_json::to_string(&stored).unwrap(),
        )
        .unwrap();

        let mut registry = PlanRegistry::with_dir(&plans_dir);
        assert_eq!(registry.get("edited").unwrap().id, "edited");
        assert!(matches!(
            registry.delete("../outside"),
            Err(RegistryError::NotFound(_))
        ));

        registry.delete("edited").unwrap();
        assert!(outside.exists());
        assert!(!plans_dir.join("edited.json").exists());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let mut registry = PlanRegistry::with_dir(dir.path());
        let id = registry.save(quarterly_sum(), "q").unwrap();

        registry.delete(&id).unwrap();
        assert!(registry.get(&id).is_none());
        assert!(matches!(registry.delete(&id), Err(RegistryError::NotFound(_))));
        assert!(PlanRegistry::with_dir(dir.path()).list().is_empty());
    }
}
