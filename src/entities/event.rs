//! Event entity type

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::core::form::FormData;
use crate::core::identity::EventId;
use crate::entities::partner::Partners;

/// Kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Concert,
    Exhibition,
    Theatre,
    Festival,
    Workshop,
    Screening,
    Talk,
    Other,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Concert,
            Category::Exhibition,
            Category::Theatre,
            Category::Festival,
            Category::Workshop,
            Category::Screening,
            Category::Talk,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Concert => "concert",
            Category::Exhibition => "exhibition",
            Category::Theatre => "theatre",
            Category::Festival => "festival",
            Category::Workshop => "workshop",
            Category::Screening => "screening",
            Category::Talk => "talk",
            Category::Other => "other",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::all()
            .iter()
            .find(|c| c.to_string() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ticketing {
    #[default]
    Free,
    Paid,
}

impl fmt::Display for Ticketing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ticketing::Free => write!(f, "free"),
            Ticketing::Paid => write!(f, "paid"),
        }
    }
}

/// Curation status on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightType {
    #[default]
    None,
    Featured,
    EditorPick,
}

impl fmt::Display for HighlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightType::None => write!(f, "none"),
            HighlightType::Featured => write!(f, "featured"),
            HighlightType::EditorPick => write!(f, "editor_pick"),
        }
    }
}

impl FromStr for HighlightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(HighlightType::None),
            "featured" => Ok(HighlightType::Featured),
            "editor_pick" => Ok(HighlightType::EditorPick),
            _ => Err(format!("Unknown highlight type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
        }
    }
}

/// A cultural event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    pub title: String,

    pub category: Category,

    /// One-line teaser
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Start time as HH:MM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    pub venue: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artists: Vec<String>,

    #[serde(default, skip_serializing_if = "Partners::is_empty")]
    pub partners: Partners,

    #[serde(default)]
    pub ticketing: Ticketing,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default)]
    pub highlight_type: HighlightType,

    /// Only meaningful for editor picks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection_reasons: Vec<String>,

    #[serde(default)]
    pub status: EventStatus,

    pub created: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    pub author: String,
}

/// Wizard form shape for an event; unknown form fields are ignored
#[derive(Debug, Deserialize)]
struct EventForm {
    title: String,
    category: Category,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start_date: NaiveDate,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    start_time: Option<String>,
    venue: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    partners: Partners,
    #[serde(default)]
    ticketing: Ticketing,
    #[serde(default)]
    ticket_url: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    highlight_type: HighlightType,
    #[serde(default)]
    selection_reasons: Vec<String>,
}

/// Fields the store manages itself and never round-trip through the form
const RECORD_ONLY_FIELDS: &[&str] = &["id", "status", "created", "updated", "author"];

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Event {
    /// Build a record from completed wizard form data
    ///
    /// Blank optional strings are dropped, and selection reasons are kept
    /// only for editor picks.
    pub fn from_form(
        id: EventId,
        form: &FormData,
        author: &str,
        created: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        // empty strings would fail date parsing for optional fields
        let cleaned: FormData = form
            .iter()
            .filter(|(k, v)| !matches!(v, Value::String(s) if s.trim().is_empty()) || !is_optional(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let f: EventForm = serde_json::from_value(cleaned.to_json())?;

        let selection_reasons = if f.highlight_type == HighlightType::EditorPick {
            f.selection_reasons
        } else {
            Vec::new()
        };
        let (ticket_url, price) = match f.ticketing {
            Ticketing::Paid => (non_blank(f.ticket_url), f.price),
            Ticketing::Free => (None, None),
        };

        Ok(Self {
            id,
            title: f.title.trim().to_string(),
            category: f.category,
            summary: non_blank(f.summary),
            description: non_blank(f.description),
            start_date: f.start_date,
            end_date: f.end_date,
            start_time: non_blank(f.start_time),
            venue: f.venue.trim().to_string(),
            city: non_blank(f.city),
            artists: f.artists,
            partners: f.partners,
            ticketing: f.ticketing,
            ticket_url,
            price,
            highlight_type: f.highlight_type,
            selection_reasons,
            status: EventStatus::Draft,
            created,
            updated: None,
            author: author.to_string(),
        })
    }

    /// Form data that re-opens this record in the wizard (edit mode)
    ///
    /// The publish confirmation is intentionally absent so it must be
    /// given again.
    pub fn to_form(&self) -> FormData {
        let mut form = serde_json::to_value(self)
            .map(FormData::from_json)
            .unwrap_or_default();
        for field in RECORD_ONLY_FIELDS {
            form.unset(field);
        }
        form
    }

    pub fn organizer_names(&self) -> Vec<&str> {
        self.partners.organizers().map(|p| p.name.as_str()).collect()
    }

    /// Date range as shown in listings
    pub fn date_label(&self) -> String {
        match self.end_date {
            Some(end) if end != self.start_date => format!("{} → {}", self.start_date, end),
            _ => self.start_date.to_string(),
        }
    }
}

fn is_optional(field: &str) -> bool {
    !matches!(field, "title" | "category" | "start_date" | "venue")
}
