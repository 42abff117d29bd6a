//! Organizers, sponsors and partners attached to an event
//!
//! All three live in one list distinguished by `role`. An entry is
//! identified by its trimmed, case-folded name together with its role:
//! the same name may appear once per role, never twice in one role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerRole {
    Organizer,
    Sponsor,
    #[default]
    Partner,
}

impl fmt::Display for PartnerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerRole::Organizer => write!(f, "organizer"),
            PartnerRole::Sponsor => write!(f, "sponsor"),
            PartnerRole::Partner => write!(f, "partner"),
        }
    }
}

impl FromStr for PartnerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "organizer" | "organiser" => Ok(PartnerRole::Organizer),
            "sponsor" => Ok(PartnerRole::Sponsor),
            "partner" => Ok(PartnerRole::Partner),
            _ => Err(format!("Unknown partner role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub name: String,

    #[serde(default)]
    pub role: PartnerRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Partner {
    pub fn new(name: impl Into<String>, role: PartnerRole) -> Self {
        Self {
            name: name.into(),
            role,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    fn key(&self) -> (String, PartnerRole) {
        (self.name.trim().to_lowercase(), self.role)
    }

    /// Parse `name[:role[:url]]`, as typed at a prompt or in a CSV cell
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let mut parts = spec.splitn(3, ':');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let role = match parts.next() {
            Some(r) if !r.trim().is_empty() => r.parse().ok()?,
            _ => PartnerRole::default(),
        };
        let url = parts
            .next()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from);
        Some(Self {
            name: name.to_string(),
            role,
            url,
        })
    }
}

/// Role-tagged partner list without duplicates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Partners(Vec<Partner>);

impl Partners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partner; returns false if the same name already holds that role
    pub fn add(&mut self, partner: Partner) -> bool {
        let key = partner.key();
        if self.0.iter().any(|p| p.key() == key) {
            return false;
        }
        self.0.push(partner);
        true
    }

    /// Remove by name and role; returns whether anything was removed
    pub fn remove(&mut self, name: &str, role: PartnerRole) -> bool {
        let key = (name.trim().to_lowercase(), role);
        let before = self.0.len();
        self.0.retain(|p| p.key() != key);
        self.0.len() != before
    }

    pub fn with_role(&self, role: PartnerRole) -> impl Iterator<Item = &Partner> {
        self.0.iter().filter(move |p| p.role == role)
    }

    pub fn organizers(&self) -> impl Iterator<Item = &Partner> {
        self.with_role(PartnerRole::Organizer)
    }

    pub fn sponsors(&self) -> impl Iterator<Item = &Partner> {
        self.with_role(PartnerRole::Sponsor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partner> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Partner> for Partners {
    /// Collapse duplicates, keeping the first occurrence
    fn from_iter<I: IntoIterator<Item = Partner>>(iter: I) -> Self {
        let mut partners = Partners::new();
        for p in iter {
            partners.add(p);
        }
        partners
    }
}

impl<'de> Deserialize<'de> for Partners {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let list = Vec::<Partner>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}
