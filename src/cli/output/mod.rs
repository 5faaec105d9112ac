//! Plain text rendering of the popup tabs.

use std::fmt::Write;

use ansi_term::Colour;

use crate::{
    ledger::{reports::ReportState, UsageLedger},
    session::tab::Tab,
    storage::settings::SettingsStore,
    utils::time::{format_duration, format_report_total},
};

/// The today tab never lists more sites than this.
pub const TODAY_SITE_LIMIT: usize = 10;

pub fn render_tab<S: SettingsStore>(tab: Tab, ledger: &UsageLedger<S>, limit: usize) -> String {
    match tab {
        Tab::Today => render_today(ledger, limit),
        Tab::Blocked => render_blocked(ledger.blocked_sites()),
        Tab::Reports => render_reports(ledger.reports().state()),
    }
}

/// One line naming every tab, with the active one in brackets.
pub fn render_tab_bar(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let label = tab.descriptor().label;
            if *tab == active {
                format!("[{}]", Colour::Cyan.bold().paint(label))
            } else {
                label.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_today<S: SettingsStore>(ledger: &UsageLedger<S>, limit: usize) -> String {
    let descriptor = Tab::Today.descriptor();
    let mut out = format!(
        "{} ({})\n",
        descriptor.heading,
        format_duration(ledger.total_time())
    );
    let top = ledger.top_sites(limit);
    if top.is_empty() {
        let _ = writeln!(out, "{}", descriptor.empty_message);
    }
    for (site, time_ms) in top {
        let _ = writeln!(out, "{}\t{site}", format_duration(time_ms));
    }
    out
}

pub fn render_blocked(sites: &[String]) -> String {
    let descriptor = Tab::Blocked.descriptor();
    let mut out = format!("{}\n", descriptor.heading);
    if sites.is_empty() {
        let _ = writeln!(out, "{}", descriptor.empty_message);
    }
    for site in sites {
        let _ = writeln!(out, "{site}");
    }
    out
}

pub fn render_reports(state: &ReportState) -> String {
    let descriptor = Tab::Reports.descriptor();
    let mut out = format!("{}\n", descriptor.heading);
    match state {
        ReportState::NotLoaded | ReportState::Loading => {
            let _ = writeln!(out, "Loading reports...");
        }
        ReportState::Failed(message) => {
            let _ = writeln!(out, "{}", Colour::Red.paint(message.as_str()));
        }
        ReportState::Loaded(reports) if reports.is_empty() => {
            let _ = writeln!(out, "{}", descriptor.empty_message);
        }
        ReportState::Loaded(reports) => {
            for report in reports {
                let _ = writeln!(
                    out,
                    "Week of {}\n  Total time: {}\n  Most visited: {}",
                    report.week_start.format("%x"),
                    format_report_total(report.total_time),
                    report.top_site
                );
            }
        }
    }
    out
}

pub fn render_tracking(enabled: bool) -> String {
    if enabled {
        format!("Tracking: {}", Colour::Green.paint("ON"))
    } else {
        format!("Tracking: {}", Colour::Fixed(248).paint("OFF"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        ledger::{
            entities::{UsageMap, WeeklyReport},
            reports::ReportState,
            UsageLedger,
        },
        session::tab::Tab,
        storage::settings::MockSettingsStore,
    };

    use super::{render_blocked, render_reports, render_tab_bar, render_today, TODAY_SITE_LIMIT};

    #[test]
    fn test_today_lists_top_sites() {
        let mut ledger = UsageLedger::new(MockSettingsStore::new());
        ledger.replace_usage(UsageMap::from_iter([
            ("b.com", 30_000),
            ("a.com", 3_720_000),
        ]));
        assert_eq!(
            render_today(&ledger, TODAY_SITE_LIMIT),
            "Today's Activity (1h 2m)\n1h 2m\ta.com\n0m\tb.com\n"
        );
    }

    #[test]
    fn test_today_is_limited() {
        let mut ledger = UsageLedger::new(MockSettingsStore::new());
        ledger.replace_usage(
            (0..15u64)
                .map(|v| (format!("site{v}.com"), v * 60_000))
                .collect::<UsageMap>(),
        );
        let rendered = render_today(&ledger, TODAY_SITE_LIMIT);
        assert_eq!(rendered.lines().count(), 1 + TODAY_SITE_LIMIT);
        assert!(rendered.contains("14m\tsite14.com"));
        assert!(!rendered.contains("site4.com"));
    }

    #[test]
    fn test_empty_views() {
        let ledger = UsageLedger::new(MockSettingsStore::new());
        assert_eq!(
            render_today(&ledger, TODAY_SITE_LIMIT),
            "Today's Activity (0m)\nNo activity tracked today\n"
        );
        assert_eq!(render_blocked(&[]), "Blocked Sites\nNo blocked sites\n");
        assert_eq!(
            render_reports(&ReportState::Loaded(vec![])),
            "Weekly Reports\nNo reports available\n"
        );
        assert_eq!(
            render_reports(&ReportState::Loading),
            "Weekly Reports\nLoading reports...\n"
        );
    }

    #[test]
    fn test_reports_show_hours_and_minutes() {
        let rendered = render_reports(&ReportState::Loaded(vec![WeeklyReport {
            week_start: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            total_time: 120_000,
            top_site: "docs.rs".into(),
        }]));
        assert!(rendered.contains("Total time: 0h 2m"));
        assert!(rendered.contains("Most visited: docs.rs"));
    }

    #[test]
    fn test_tab_bar_marks_active_tab() {
        let bar = render_tab_bar(Tab::Blocked);
        assert!(bar.starts_with("Today  ["));
        assert!(bar.contains("Blocked"));
        assert!(bar.ends_with("]  Reports"));
    }
}
