use std::fmt;

use chrono::NaiveDate;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Active time accumulated for a single site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUsage {
    /// Domain, for example `github.com`. Case-sensitive and never empty.
    pub site: String,
    pub time_ms: u64,
}

/// Mapping from site to accumulated time. Entries keep the order they were first seen in, which
/// is what makes ranking ties stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageMap(Vec<SiteUsage>);

impl UsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time of a site, replacing any previous value. Empty site names are ignored.
    pub fn insert(&mut self, site: impl Into<String>, time_ms: u64) {
        let site = site.into();
        if site.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|v| v.site == site) {
            Some(entry) => entry.time_ms = time_ms,
            None => self.0.push(SiteUsage { site, time_ms }),
        }
    }

    /// Adds time to a site. Returns the new total, or `None` if the site name is empty.
    pub fn accrue(&mut self, site: &str, time_ms: u64) -> Option<u64> {
        if site.is_empty() {
            return None;
        }
        match self.0.iter_mut().find(|v| v.site == site) {
            Some(entry) => {
                entry.time_ms = entry.time_ms.saturating_add(time_ms);
                Some(entry.time_ms)
            }
            None => {
                self.0.push(SiteUsage {
                    site: site.to_owned(),
                    time_ms,
                });
                Some(time_ms)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteUsage> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for UsageMap {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut map = UsageMap::new();
        for (site, time_ms) in iter {
            map.insert(site, time_ms);
        }
        map
    }
}

// The map is stored as a plain json object `{"site": ms}`. Serde maps would lose the order, so
// the object is walked by hand.
impl Serialize for UsageMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.site, &entry.time_ms)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UsageMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UsageMapVisitor;

        impl<'de> Visitor<'de> for UsageMapVisitor {
            type Value = UsageMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping sites to milliseconds")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = UsageMap::new();
                while let Some((site, time_ms)) = access.next_entry::<String, u64>()? {
                    map.insert(site, time_ms);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(UsageMapVisitor)
    }
}

/// Summary of a single week as produced by the reports service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    #[serde(deserialize_with = "week_start_ser::deserialize")]
    pub week_start: NaiveDate,
    pub total_time: u64,
    pub top_site: String,
}

/// The backend sends `weekStart` either as a plain date or as a full timestamp.
mod week_start_ser {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(&s)
            .map(|v| v.date_naive())
            .map_err(|e| D::Error::custom(format!("invalid weekStart {s}: {e}")))
    }
}

/// The account returned by the auth service. Fields the popup doesn't look at are kept as is so
/// they survive being stored and read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Reply of `POST /api/auth/login`. Anything without a non-empty token counts as a rejection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LoginReply")]
pub enum LoginResponse {
    Accepted { token: String, user: User },
    Rejected { message: Option<String> },
}

#[derive(Deserialize)]
struct LoginReply {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    message: Option<String>,
}

impl From<LoginReply> for LoginResponse {
    fn from(value: LoginReply) -> Self {
        match value.token {
            Some(token) if !token.is_empty() => LoginResponse::Accepted {
                token,
                user: value.user.unwrap_or_default(),
            },
            _ => LoginResponse::Rejected {
                message: value.message,
            },
        }
    }
}

/// Result of a ledger mutation that succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Unchanged,
}
