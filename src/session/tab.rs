use std::{convert::Infallible, fmt::Display, str::FromStr};

/// Views of the popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Today,
    Blocked,
    Reports,
}

/// What the presentation layer needs to draw a tab without knowing anything about the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabDescriptor {
    pub label: &'static str,
    pub heading: &'static str,
    pub empty_message: &'static str,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Today, Tab::Blocked, Tab::Reports];

    pub fn descriptor(self) -> TabDescriptor {
        match self {
            Tab::Today => TabDescriptor {
                label: "Today",
                heading: "Today's Activity",
                empty_message: "No activity tracked today",
            },
            Tab::Blocked => TabDescriptor {
                label: "Blocked",
                heading: "Blocked Sites",
                empty_message: "No blocked sites",
            },
            Tab::Reports => TabDescriptor {
                label: "Reports",
                heading: "Weekly Reports",
                empty_message: "No reports available",
            },
        }
    }
}

impl Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Today => write!(f, "today"),
            Tab::Blocked => write!(f, "blocked"),
            Tab::Reports => write!(f, "reports"),
        }
    }
}

/// Unknown names fall back to [Tab::Today].
impl FromStr for Tab {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "blocked" => Tab::Blocked,
            "reports" => Tab::Reports,
            _ => Tab::Today,
        })
    }
}
