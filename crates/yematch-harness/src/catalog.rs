//! Activity catalog
//!
//! Builds every runnable activity from the year-end step table and the
//! configuration, and resolves names across all of them:
//! - `R..` Legacy and `S..` New lists, built independently then aligned
//! - `P..` pairs zipped from the two lists
//! - arrange commands from `[[arrange]]`
//! - `Parity..` asserts comparing fetched Legacy reports with New output
//!
//! Construction either yields a complete catalog or fails; nothing is
//! registered globally.

use crate::activity::{base_name, SharedActivity};
use crate::client::NewSystemApi;
use crate::command::CommandActivity;
use crate::config::HarnessConfig;
use crate::legacy::LegacyActivity;
use crate::new_system::{NewActivity, SKIPPED_CRITERIA};
use crate::parallel::ParallelActivity;
use crate::parity::{NewSource, ParityActivity};
use crate::steps::{self, Body, Step};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use yematch_connector::RemoteTransport;
use yematch_reports::{ExtractorRegistry, PAY426N_CRITERIA, PAY426_ALL};

/// Catalog construction errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The Legacy and New lists differ in length
    #[error("legacy list has {legacy} activities but new list has {new}")]
    LengthMismatch { legacy: usize, new: usize },

    /// Entries at `index` are not the same step
    #[error("activity {index} is misaligned: legacy '{legacy}' vs new '{new}'")]
    Misaligned { index: usize, legacy: String, new: String },

    /// Two activities share a name
    #[error("activity name '{0}' is used twice")]
    DuplicateName(String),
}

/// Result type for catalog construction
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Everything activities need from the outside world
#[derive(Clone)]
pub struct CatalogContext {
    /// Loaded harness configuration
    pub config: HarnessConfig,
    /// Session to the Legacy host, shared by every `R..` activity
    pub transport: Arc<dyn RemoteTransport>,
    /// New-system client shared by every `S..` activity and parity assert
    pub api: Arc<dyn NewSystemApi>,
    /// Checks fetched reports and backs the parity asserts
    pub extractors: Arc<ExtractorRegistry>,
}

impl CatalogContext {
    /// Bundle the shared handles
    #[must_use]
    pub fn new(
        config: HarnessConfig,
        transport: Arc<dyn RemoteTransport>,
        api: Arc<dyn NewSystemApi>,
        extractors: Arc<ExtractorRegistry>,
    ) -> Self {
        Self {
            config,
            transport,
            api,
            extractors,
        }
    }

    fn legacy_activity(&self, step: &Step) -> SharedActivity {
        let year = self.config.profit_year.to_string();
        let custom = self.config.steps.get(step.id);
        let job = custom
            .and_then(|c| c.legacy_job.as_deref())
            .unwrap_or(step.legacy_job);
        let args = custom
            .and_then(|c| c.legacy_args.as_deref())
            .unwrap_or(step.legacy_args)
            .replace("{year}", &year);

        Arc::new(
            LegacyActivity::new(step.legacy_name(), step.name, job, Arc::clone(&self.transport))
                .with_args(args)
                .with_reports(step.reports)
                .with_extractors(Arc::clone(&self.extractors))
                .with_output(&self.config.data_directory, self.config.report_dir()),
        )
    }

    fn new_activity(&self, step: &Step) -> SharedActivity {
        Arc::new(
            NewActivity::new(
                step.new_name(),
                step.name,
                step.new_call,
                Arc::clone(&self.api),
                self.config.profit_year,
            )
            .with_profit_share(self.config.profit_share.clone()),
        )
    }

    fn parity_activities(&self) -> Vec<SharedActivity> {
        let mut asserts: Vec<(&str, &str, NewSource)> = PAY426N_CRITERIA
            .iter()
            .filter(|c| !SKIPPED_CRITERIA.contains(&c.report_id))
            .map(|c| ("17", c.report_id, NewSource::Criteria(c)))
            .collect();
        asserts.push(("18", PAY426_ALL.report_id, NewSource::Criteria(&PAY426_ALL)));
        asserts.push((
            "03",
            "QPAY066",
            NewSource::Post {
                path: "api/yearend/terminated-employees",
                body: Body::DateRange,
            },
        ));

        asserts
            .into_iter()
            .filter_map(|(step_id, report, source)| {
                let step = steps::find(step_id)?;
                let file = legacy_report_file(&self.config.data_directory, step, report)?;
                let extractor = self.extractors.get(report)?;
                Some(Arc::new(ParityActivity::new(
                    format!("Parity{report}"),
                    file,
                    source,
                    extractor,
                    Arc::clone(&self.api),
                    self.config.profit_year,
                )) as SharedActivity)
            })
            .collect()
    }
}

/// All activities under one namespace, in registration order
pub struct Catalog {
    activities: IndexMap<String, SharedActivity>,
    parallel: Vec<String>,
}

impl Catalog {
    /// Build the full catalog from the step table
    ///
    /// # Errors
    /// Misaligned lists or a name collision, for instance an arrange entry
    /// called `R03`.
    pub fn build(context: &CatalogContext) -> CatalogResult<Self> {
        let legacy = steps::STEPS.iter().map(|s| context.legacy_activity(s)).collect();
        let new = steps::STEPS.iter().map(|s| context.new_activity(s)).collect();
        let mut extra: Vec<SharedActivity> = context
            .config
            .arrange
            .iter()
            .map(|c| Arc::new(CommandActivity::from_config(c)) as SharedActivity)
            .collect();
        extra.extend(context.parity_activities());
        Self::from_lists(legacy, new, extra)
    }

    /// Align `legacy` with `new`, pair them and add `extra` activities
    ///
    /// # Errors
    /// [`CatalogError::LengthMismatch`], [`CatalogError::Misaligned`] or
    /// [`CatalogError::DuplicateName`].
    pub fn from_lists(
        legacy: Vec<SharedActivity>,
        new: Vec<SharedActivity>,
        extra: Vec<SharedActivity>,
    ) -> CatalogResult<Self> {
        if legacy.len() != new.len() {
            return Err(CatalogError::LengthMismatch {
                legacy: legacy.len(),
                new: new.len(),
            });
        }
        for (index, (l, n)) in legacy.iter().zip(&new).enumerate() {
            if base_name(l.name()) != base_name(n.name()) {
                return Err(CatalogError::Misaligned {
                    index,
                    legacy: l.name().to_string(),
                    new: n.name().to_string(),
                });
            }
        }

        let pairs: Vec<SharedActivity> = legacy
            .iter()
            .zip(&new)
            .map(|(l, n)| {
                let name = format!("P{}", base_name(l.name()));
                Arc::new(ParallelActivity::new(name, Arc::clone(l), Arc::clone(n))) as SharedActivity
            })
            .collect();
        let parallel = pairs.iter().map(|p| p.name().to_string()).collect();

        let mut catalog = Self {
            activities: IndexMap::new(),
            parallel,
        };
        for activity in legacy.into_iter().chain(new).chain(pairs).chain(extra) {
            catalog.insert(activity)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, activity: SharedActivity) -> CatalogResult<()> {
        let name = activity.name().to_string();
        if self.activities.contains_key(&name) {
            return Err(CatalogError::DuplicateName(name));
        }
        self.activities.insert(name, activity);
        Ok(())
    }

    /// Look up any activity by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SharedActivity> {
        self.activities.get(name).cloned()
    }

    /// Every name in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activities.keys().map(String::as_str)
    }

    /// The `P..` pairs in step order
    #[must_use]
    pub fn parallel(&self) -> Vec<SharedActivity> {
        self.parallel.iter().filter_map(|n| self.get(n)).collect()
    }

    /// Number of activities
    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether the catalog holds no activities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Local file a Legacy step leaves for `report`, if the step produces it
#[must_use]
pub fn legacy_report_file(data_directory: &Path, step: &Step, report: &str) -> Option<PathBuf> {
    step.reports
        .iter()
        .find(|a| a.report_id == report)
        .map(|a| data_directory.join(a.local_name(&step.legacy_name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::client::MockNewSystemApi;
    use crate::config::{ArrangeCommand, StepOverride};
    use crate::outcome::{Outcome, Status};
    use pretty_assertions::assert_eq;
    use yematch_connector::{PathMap, RemoteConfig};
    use yematch_test_utils::FakeTransport;

    struct Named(&'static str);

    #[async_trait::async_trait]
    impl Activity for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self) -> Outcome {
            Outcome::ok(self.0, self.0, "")
        }
    }

    fn named(names: &[&'static str]) -> Vec<SharedActivity> {
        names.iter().map(|n| Arc::new(Named(n)) as SharedActivity).collect()
    }

    fn config() -> HarnessConfig {
        HarnessConfig {
            data_directory: "/tmp/yematch-catalog".into(),
            remote: RemoteConfig {
                path_map: PathMap::new(3).with_path("REPORT_DIR", "/data/reports"),
                ..RemoteConfig::new("legacy-host")
            },
            ..HarnessConfig::default()
        }
    }

    fn context(config: HarnessConfig, transport: Arc<FakeTransport>) -> CatalogContext {
        CatalogContext::new(
            config,
            transport,
            Arc::new(MockNewSystemApi::new()),
            Arc::new(yematch_reports::default_extractors()),
        )
    }

    #[test]
    fn aligned_lists_are_paired() {
        let catalog = Catalog::from_lists(named(&["R01", "R13A"]), named(&["S01", "S13A"]), Vec::new()).unwrap();
        let parallel: Vec<String> = catalog.parallel().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(parallel, vec!["P01", "P13A"]);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["R01", "R13A", "S01", "S13A", "P01", "P13A"]
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = Catalog::from_lists(named(&["R01", "R02"]), named(&["S01"]), Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::LengthMismatch { legacy: 2, new: 1 }));
    }

    #[test]
    fn misaligned_lists_are_rejected() {
        let err = Catalog::from_lists(named(&["R01", "R02"]), named(&["S01", "S03"]), Vec::new())
            .err()
            .unwrap();
        match err {
            CatalogError::Misaligned { index, legacy, new } => {
                assert_eq!(index, 1);
                assert_eq!(legacy, "R02");
                assert_eq!(new, "S03");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Catalog::from_lists(named(&["R01"]), named(&["S01"]), named(&["R01"]))
            .err()
            .unwrap();
        assert!(matches!(err, CatalogError::DuplicateName(name) if name == "R01"));
    }

    #[test]
    fn full_catalog_covers_every_step() {
        let mut config = config();
        config.arrange.push(ArrangeCommand {
            name: "ImportReadyDbToSmartDb".to_string(),
            program: "dotnet".to_string(),
            args: vec!["run".to_string()],
            working_dir: None,
        });
        let catalog = Catalog::build(&context(config, Arc::new(FakeTransport::new()))).unwrap();

        let steps = steps::STEPS.len();
        assert_eq!(catalog.parallel().len(), steps);
        for name in ["R00", "S13B", "P24B", "P29", "ImportReadyDbToSmartDb", "ParityPAY426N-01", "ParityPAY426", "ParityQPAY066"] {
            assert!(catalog.get(name).is_some(), "{name} missing");
        }
        assert!(catalog.get("ParityPAY426N-10").is_none());
        // 3 lists, 1 arrange, 8 PAY426N asserts plus PAY426 and QPAY066
        assert_eq!(catalog.len(), steps * 3 + 1 + 10);
    }

    #[tokio::test]
    async fn legacy_args_carry_the_profit_year() {
        let transport = Arc::new(FakeTransport::new().succeed("PROF-TERM", "done"));
        let catalog = Catalog::build(&context(config(), Arc::clone(&transport))).unwrap();
        catalog.get("R03").unwrap().execute().await;
        let calls = transport.invocations();
        assert_eq!(calls[0].script, "PROF-TERM");
        assert_eq!(calls[0].args, "YEAR=2024");
    }

    #[tokio::test]
    async fn step_override_can_disable_a_job() {
        let mut config = config();
        config.steps.insert(
            "17".to_string(),
            StepOverride {
                legacy_job: Some("!PROF-SHARE".to_string()),
                legacy_args: None,
            },
        );
        let transport = Arc::new(FakeTransport::new());
        let catalog = Catalog::build(&context(config, Arc::clone(&transport))).unwrap();
        let outcome = catalog.get("R17").unwrap().execute().await;
        assert_eq!(outcome.status, Status::NoOperation);
        assert!(transport.invocations().is_empty());
    }

    #[test]
    fn legacy_report_file_uses_the_step_name() {
        let step = steps::find("17").unwrap();
        let path = legacy_report_file(Path::new("/data"), step, "PAY426N-04").unwrap();
        assert_eq!(path, Path::new("/data/R17-PAY426N-04.txt"));
        assert!(legacy_report_file(Path::new("/data"), step, "QPAY066").is_none());
    }
}
