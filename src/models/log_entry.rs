use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Identifier assigned by the store when a log entry is inserted.
pub type LogId = Uuid;

/// A validated log entry, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub mood: i16,
    pub video_uri: String,
    pub lat: f64,
    pub lng: f64,
}

/// A field of a stored log entry that can be requested in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogField {
    Timestamp,
    Mood,
    VideoUri,
    Lat,
    Lng,
}

impl LogField {
    /// JSON key used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            LogField::Timestamp => "timestamp",
            LogField::Mood => "mood",
            LogField::VideoUri => "videoUri",
            LogField::Lat => "lat",
            LogField::Lng => "lng",
        }
    }

    /// Column in the `logs` table.
    pub fn column(self) -> &'static str {
        match self {
            LogField::Timestamp => "logged_at",
            LogField::Mood => "mood",
            LogField::VideoUri => "video_uri",
            LogField::Lat => "lat",
            LogField::Lng => "lng",
        }
    }
}

/// The set of fields a read should return. Always contains `Timestamp`, so
/// it is never empty. Order follows `LogField`'s declaration order,
/// duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<LogField>,
}

impl Projection {
    pub fn new(fields: &[LogField]) -> Self {
        let mut fields = fields.to_vec();
        fields.push(LogField::Timestamp);
        fields.sort();
        fields.dedup();
        Self { fields }
    }

    pub fn fields(&self) -> &[LogField] {
        &self.fields
    }

    pub fn contains(&self, field: LogField) -> bool {
        self.fields.contains(&field)
    }
}

/// A stored log entry narrowed to a projection. Fields outside the
/// projection are `None`. The store identifier is never carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedLog {
    pub timestamp: Option<DateTime<Utc>>,
    pub mood: Option<i16>,
    pub video_uri: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ProjectedLog {
    pub fn project(entry: &LogEntry, projection: &Projection) -> Self {
        let keep = |field| projection.contains(field);
        Self {
            timestamp: keep(LogField::Timestamp).then_some(entry.timestamp),
            mood: keep(LogField::Mood).then_some(entry.mood),
            video_uri: keep(LogField::VideoUri).then(|| entry.video_uri.clone()),
            lat: keep(LogField::Lat).then_some(entry.lat),
            lng: keep(LogField::Lng).then_some(entry.lng),
        }
    }
}

/// RFC 3339 in UTC with a `Z` suffix and only the fractional digits needed,
/// e.g. `2024-01-01T10:00:00Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(ts))
}
