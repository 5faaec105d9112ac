//! The in-memory view the popup renders from.
//!
//! [UsageLedger] holds three independent pieces of state: today's usage map, the block list and
//! the tracking flag. The cached weekly reports sit next to them in a [reports::ReportCache].
//! Mutations are written through the [SettingsStore] immediately. When the store refuses a write
//! the in-memory change is rolled back, so the ledger never shows something that wasn't saved.

pub mod entities;
pub mod reports;

use std::mem;

use entities::{Mutation, UsageMap, WeeklyReport};
use reports::ReportCache;
use tracing::{debug, info, warn};

use crate::{
    error::PopupError,
    storage::settings::{SettingsStore, StoredSettings},
};

pub use crate::utils::time::format_duration;

pub struct UsageLedger<S: SettingsStore> {
    usage: UsageMap,
    blocked_sites: Vec<String>,
    tracking: bool,
    reports: ReportCache,
    store: S,
}

impl<S: SettingsStore> UsageLedger<S> {
    /// Empty ledger with tracking enabled, which is what the popup shows before anything loads.
    pub fn new(store: S) -> Self {
        Self {
            usage: UsageMap::new(),
            blocked_sites: vec![],
            tracking: true,
            reports: ReportCache::default(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn usage(&self) -> &UsageMap {
        &self.usage
    }

    pub fn blocked_sites(&self) -> &[String] {
        &self.blocked_sites
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn reports(&self) -> &ReportCache {
        &self.reports
    }

    pub fn reports_mut(&mut self) -> &mut ReportCache {
        &mut self.reports
    }

    pub fn replace_usage(&mut self, usage: UsageMap) {
        debug!("Loaded usage for {} sites", usage.len());
        self.usage = usage;
    }

    /// Takes the block list and the tracking flag from stored settings. Tracking stays on unless
    /// it was explicitly switched off.
    pub fn apply_settings(&mut self, settings: &StoredSettings) {
        self.blocked_sites.clear();
        for site in settings.blocked_sites.iter().flatten() {
            if !self.blocked_sites.contains(site) {
                self.blocked_sites.push(site.clone());
            }
        }
        self.tracking = settings.is_tracking != Some(false);
    }

    /// Sum of all time tracked today.
    pub fn total_time(&self) -> u64 {
        self.usage.iter().map(|v| v.time_ms).sum()
    }

    /// The `n` sites with the most time, most used first. Sites with equal time keep the order
    /// they were first seen in.
    pub fn top_sites(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries = self
            .usage
            .iter()
            .map(|v| (v.site.as_str(), v.time_ms))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }

    /// Appends a site to the block list. Blank names and sites that are already blocked are
    /// ignored without touching the store.
    pub async fn add_blocked_site(&mut self, site: &str) -> Result<Mutation, PopupError> {
        let site = site.trim();
        if site.is_empty() || self.blocked_sites.iter().any(|v| v == site) {
            debug!("Ignoring block request for {site:?}");
            return Ok(Mutation::Unchanged);
        }
        let mut updated = self.blocked_sites.clone();
        updated.push(site.to_owned());
        self.commit_blocked_sites(updated).await?;
        info!("Blocked {site}");
        Ok(Mutation::Applied)
    }

    /// Removes every entry equal to `site`. The list is written back even if nothing matched.
    pub async fn remove_blocked_site(&mut self, site: &str) -> Result<Mutation, PopupError> {
        let updated = self
            .blocked_sites
            .iter()
            .filter(|v| *v != site)
            .cloned()
            .collect::<Vec<_>>();
        let mutation = if updated.len() == self.blocked_sites.len() {
            Mutation::Unchanged
        } else {
            Mutation::Applied
        };
        self.commit_blocked_sites(updated).await?;
        if mutation == Mutation::Applied {
            info!("Unblocked {site}");
        }
        Ok(mutation)
    }

    async fn commit_blocked_sites(&mut self, updated: Vec<String>) -> Result<(), PopupError> {
        let previous = mem::replace(&mut self.blocked_sites, updated);
        if let Err(e) = self.store.set_blocked_sites(self.blocked_sites.clone()).await {
            warn!("Failed to store blocked sites, rolling back: {e:?}");
            self.blocked_sites = previous;
            return Err(PopupError::Storage(e));
        }
        Ok(())
    }

    /// Flips the tracking flag and returns the new value.
    pub async fn toggle_tracking(&mut self) -> Result<bool, PopupError> {
        self.tracking = !self.tracking;
        if let Err(e) = self.store.set_tracking(self.tracking).await {
            warn!("Failed to store tracking flag, rolling back: {e:?}");
            self.tracking = !self.tracking;
            return Err(PopupError::Storage(e));
        }
        info!("Tracking is now {}", self.tracking);
        Ok(self.tracking)
    }

    /// Replaces the cached reports wholesale.
    pub fn ingest_reports(&mut self, reports: Vec<WeeklyReport>) {
        self.reports.ingest(reports);
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;

    use crate::{
        error::PopupError,
        storage::settings::{MockSettingsStore, StoredSettings},
        utils::logging::TEST_LOGGING,
    };

    use super::{
        entities::{Mutation, UsageMap, WeeklyReport},
        format_duration, UsageLedger,
    };

    fn accepting_store() -> MockSettingsStore {
        let mut store = MockSettingsStore::new();
        store.expect_set_blocked_sites().returning(|_| Ok(()));
        store.expect_set_tracking().returning(|_| Ok(()));
        store
    }

    fn failing_store() -> MockSettingsStore {
        let mut store = MockSettingsStore::new();
        store
            .expect_set_blocked_sites()
            .returning(|_| Err(anyhow!("quota exceeded")));
        store
            .expect_set_tracking()
            .returning(|_| Err(anyhow!("quota exceeded")));
        store
    }

    fn ledger_with(
        store: MockSettingsStore,
        usage: &[(&str, u64)],
    ) -> UsageLedger<MockSettingsStore> {
        let mut ledger = UsageLedger::new(store);
        ledger.replace_usage(usage.iter().map(|(s, t)| (*s, *t)).collect::<UsageMap>());
        ledger
    }

    #[test]
    fn test_total_time() {
        assert_eq!(ledger_with(MockSettingsStore::new(), &[]).total_time(), 0);
        assert_eq!(
            ledger_with(MockSettingsStore::new(), &[("a", 1000), ("b", 2000)]).total_time(),
            3000
        );
    }

    #[test]
    fn test_top_sites_ranks_by_time() {
        let ledger = ledger_with(MockSettingsStore::new(), &[("a", 5), ("b", 10), ("c", 1)]);
        assert_eq!(ledger.top_sites(2), vec![("b", 10), ("a", 5)]);
        assert_eq!(ledger.top_sites(10).len(), 3);
        assert!(ledger.top_sites(0).is_empty());
    }

    #[test]
    fn test_top_sites_ties_keep_insertion_order() {
        let ledger = ledger_with(
            MockSettingsStore::new(),
            &[("first", 7), ("big", 20), ("second", 7), ("third", 7)],
        );
        assert_eq!(
            ledger.top_sites(4),
            vec![("big", 20), ("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_seeded_ledger_end_to_end() {
        let ledger = ledger_with(
            MockSettingsStore::new(),
            &[("a.com", 120_000), ("b.com", 30_000)],
        );
        let top = ledger.top_sites(1);
        assert_eq!(top, vec![("a.com", 120_000)]);
        assert_eq!(format_duration(top[0].1), "2m");
        assert_eq!(format_duration(ledger.total_time()), "2m");
    }

    #[tokio::test]
    async fn test_add_blocked_site_deduplicates() -> Result<()> {
        *TEST_LOGGING;
        let mut store = MockSettingsStore::new();
        store
            .expect_set_blocked_sites()
            .withf(|sites| sites == &vec!["x.com".to_string()])
            .times(1)
            .returning(|_| Ok(()));
        let mut ledger = UsageLedger::new(store);

        assert_eq!(ledger.add_blocked_site("x.com").await?, Mutation::Applied);
        assert_eq!(ledger.add_blocked_site(" x.com ").await?, Mutation::Unchanged);
        assert_eq!(ledger.add_blocked_site("   ").await?, Mutation::Unchanged);
        assert_eq!(ledger.blocked_sites(), &["x.com".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_block_list_is_case_sensitive() -> Result<()> {
        let mut ledger = UsageLedger::new(accepting_store());
        ledger.add_blocked_site("X.com").await?;
        ledger.add_blocked_site("x.com").await?;
        assert_eq!(ledger.blocked_sites().len(), 2);

        ledger.remove_blocked_site("x.com").await?;
        assert_eq!(ledger.blocked_sites(), &["X.com".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_site_is_noop() -> Result<()> {
        let mut ledger = UsageLedger::new(accepting_store());
        assert_eq!(
            ledger.remove_blocked_site("missing.com").await?,
            Mutation::Unchanged
        );
        assert!(ledger.blocked_sites().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_drops_every_match() -> Result<()> {
        let mut ledger = UsageLedger::new(accepting_store());
        ledger.apply_settings(&StoredSettings {
            blocked_sites: Some(vec!["a.com".into(), "b.com".into(), "a.com".into()]),
            ..Default::default()
        });
        assert_eq!(ledger.blocked_sites().len(), 2);

        assert_eq!(ledger.remove_blocked_site("a.com").await?, Mutation::Applied);
        assert_eq!(ledger.blocked_sites(), &["b.com".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_flag() -> Result<()> {
        let mut ledger = UsageLedger::new(accepting_store());
        let initial = ledger.is_tracking();
        assert_eq!(ledger.toggle_tracking().await?, !initial);
        assert_eq!(ledger.toggle_tracking().await?, initial);
        assert_eq!(ledger.is_tracking(), initial);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_persistence_rolls_back() -> Result<()> {
        *TEST_LOGGING;
        let mut ledger = UsageLedger::new(failing_store());
        ledger.apply_settings(&StoredSettings {
            blocked_sites: Some(vec!["kept.com".into()]),
            is_tracking: Some(true),
            ..Default::default()
        });

        let added = ledger.add_blocked_site("new.com").await;
        assert!(matches!(added, Err(PopupError::Storage(_))));
        let removed = ledger.remove_blocked_site("kept.com").await;
        assert!(matches!(removed, Err(PopupError::Storage(_))));
        assert_eq!(ledger.blocked_sites(), &["kept.com".to_string()]);

        let toggled = ledger.toggle_tracking().await;
        assert!(matches!(toggled, Err(PopupError::Storage(_))));
        assert!(ledger.is_tracking());
        Ok(())
    }

    #[test]
    fn test_tracking_defaults_to_enabled() {
        let mut ledger = UsageLedger::new(MockSettingsStore::new());
        ledger.apply_settings(&StoredSettings::default());
        assert!(ledger.is_tracking());

        ledger.apply_settings(&StoredSettings {
            is_tracking: Some(false),
            ..Default::default()
        });
        assert!(!ledger.is_tracking());
    }

    #[test]
    fn test_ingest_replaces_reports() {
        let mut ledger = UsageLedger::new(MockSettingsStore::new());
        let report = |day, site: &str| WeeklyReport {
            week_start: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
            total_time: 60_000,
            top_site: site.into(),
        };
        ledger.ingest_reports(vec![report(7, "a"), report(14, "b")]);
        assert_eq!(ledger.reports().reports().len(), 2);

        ledger.ingest_reports(vec![report(21, "c")]);
        assert_eq!(ledger.reports().reports(), &[report(21, "c")]);
    }
}
