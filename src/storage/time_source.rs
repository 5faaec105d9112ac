use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    fs::operations::{read_locked_json, update_locked_json},
    ledger::entities::UsageMap,
    utils::{clock::Clock, time::date_to_record_name},
};

/// The background tracker feeding the ledger. It owns the per-day usage map and stops accruing
/// time once tracking is switched off.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Usage accumulated today.
    async fn get_time_data(&self) -> Result<UsageMap>;

    async fn set_tracking(&self, enabled: bool) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackerState {
    enabled: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Tracker that keeps one usage file per UTC day under `records/`, next to a small state file
/// holding the tracking flag.
pub struct FileTimeSource {
    record_dir: PathBuf,
    state_path: PathBuf,
    clock: Box<dyn Clock>,
}

impl FileTimeSource {
    pub fn new(app_dir: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self {
            record_dir: app_dir.join("records"),
            state_path: app_dir.join("tracker.json"),
            clock,
        }
    }

    fn today_path(&self) -> PathBuf {
        self.record_dir
            .join(date_to_record_name(self.clock.today()))
    }

    pub async fn is_tracking(&self) -> Result<bool> {
        let state = read_locked_json::<TrackerState>(&self.state_path)
            .await?
            .unwrap_or_default();
        Ok(state.enabled)
    }

    /// Adds active time to a site for today. Returns the site's new total, or `None` when nothing
    /// was recorded because tracking is off or the site is empty.
    pub async fn record(&self, site: &str, time_ms: u64) -> Result<Option<u64>> {
        if !self.is_tracking().await? {
            debug!("Tracking is disabled, dropping {time_ms}ms for {site}");
            return Ok(None);
        }
        let total = update_locked_json(&self.today_path(), |map: &mut UsageMap| {
            map.accrue(site, time_ms)
        })
        .await?;
        if let Some(total) = total {
            info!("Recorded {time_ms}ms for {site}, {total}ms today");
        }
        Ok(total)
    }
}

#[async_trait]
impl TimeSource for FileTimeSource {
    async fn get_time_data(&self) -> Result<UsageMap> {
        let path = self.today_path();
        debug!("Reading usage from {path:?}");
        Ok(read_locked_json(&path).await?.unwrap_or_default())
    }

    async fn set_tracking(&self, enabled: bool) -> Result<()> {
        info!("Tracking set to {enabled}");
        update_locked_json(&self.state_path, |state: &mut TrackerState| {
            state.enabled = enabled
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::utils::clock::Clock;

    use super::{FileTimeSource, TimeSource};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    struct TestClock;

    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            Utc.from_utc_datetime(&TEST_START_DATE)
        }
    }

    #[tokio::test]
    async fn test_record_accrues_into_daily_file() -> Result<()> {
        let dir = tempdir()?;
        let source = FileTimeSource::new(dir.path().to_path_buf(), Box::new(TestClock));

        assert_eq!(source.record("a.com", 60_000).await?, Some(60_000));
        assert_eq!(source.record("b.com", 1_000).await?, Some(1_000));
        assert_eq!(source.record("a.com", 60_000).await?, Some(120_000));

        let files = fs::read_dir(dir.path().join("records"))?
            .map(|v| v.map(|v| v.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(files, vec!["2018-07-04.json".to_string()]);

        let data = source.get_time_data().await?;
        let entries = data
            .iter()
            .map(|v| (v.site.as_str(), v.time_ms))
            .collect::<Vec<_>>();
        assert_eq!(entries, vec![("a.com", 120_000), ("b.com", 1_000)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_tracker_does_not_accrue() -> Result<()> {
        let dir = tempdir()?;
        let source = FileTimeSource::new(dir.path().to_path_buf(), Box::new(TestClock));
        assert!(source.is_tracking().await?);

        source.set_tracking(false).await?;
        assert_eq!(source.record("a.com", 60_000).await?, None);
        assert!(source.get_time_data().await?.is_empty());

        source.set_tracking(true).await?;
        assert_eq!(source.record("a.com", 60_000).await?, Some(60_000));
        Ok(())
    }
}
