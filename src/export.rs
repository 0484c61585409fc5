//! Export views over stored log entries.
//!
//! Each view has a fixed projection and a typed row, so a view can only ever
//! emit its own keys. Rows keep the order the store returned them in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::log_entry::serialize_timestamp;
use crate::models::{LogField, ProjectedLog, Projection};
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportView {
    Sentiments,
    Gps,
    Vlogs,
}

impl ExportView {
    pub fn projection(self) -> Projection {
        match self {
            ExportView::Sentiments => Projection::new(&[LogField::Timestamp, LogField::Mood]),
            ExportView::Gps => {
                Projection::new(&[LogField::Timestamp, LogField::Lat, LogField::Lng])
            }
            ExportView::Vlogs => Projection::new(&[LogField::Timestamp, LogField::VideoUri]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentExport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub mood: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsExport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VlogExport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub video_uri: String,
}

fn present<T>(value: Option<T>, field: LogField) -> Result<T, StoreError> {
    value.ok_or_else(|| StoreError::Corrupt(format!("projection is missing {}", field.name())))
}

pub fn sentiments(records: Vec<ProjectedLog>) -> Result<Vec<SentimentExport>, StoreError> {
    records
        .into_iter()
        .map(|r| {
            Ok(SentimentExport {
                timestamp: present(r.timestamp, LogField::Timestamp)?,
                mood: present(r.mood, LogField::Mood)?,
            })
        })
        .collect()
}

pub fn gps(records: Vec<ProjectedLog>) -> Result<Vec<GpsExport>, StoreError> {
    records
        .into_iter()
        .map(|r| {
            Ok(GpsExport {
                timestamp: present(r.timestamp, LogField::Timestamp)?,
                lat: present(r.lat, LogField::Lat)?,
                lng: present(r.lng, LogField::Lng)?,
            })
        })
        .collect()
}

pub fn vlogs(records: Vec<ProjectedLog>) -> Result<Vec<VlogExport>, StoreError> {
    records
        .into_iter()
        .map(|r| {
            Ok(VlogExport {
                timestamp: present(r.timestamp, LogField::Timestamp)?,
                video_uri: present(r.video_uri, LogField::VideoUri)?,
            })
        })
        .collect()
}

/// Static page linking the three export views.
pub const EXPORT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>EmoGo Export</title></head>
  <body>
    <h1>EmoGo Data Export</h1>
    <ul>
      <li><a href="/export/sentiments">Download sentiments (JSON)</a></li>
      <li><a href="/export/gps">Download GPS coordinates (JSON)</a></li>
      <li><a href="/export/vlogs">Download vlogs (JSON, URI list)</a></li>
    </ul>
  </body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogEntry;
    use chrono::TimeZone;

    fn stored() -> LogEntry {
        LogEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            mood: 3,
            video_uri: String::new(),
            lat: 25.03,
            lng: 121.56,
        }
    }

    fn projected(view: ExportView) -> Vec<ProjectedLog> {
        vec![ProjectedLog::project(&stored(), &view.projection())]
    }

    #[test]
    fn test_sentiments_shape() {
        let rows = sentiments(projected(ExportView::Sentiments)).unwrap();
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"timestamp": "2024-01-01T10:00:00Z", "mood": 3}])
        );
    }

    #[test]
    fn test_gps_has_no_mood_or_video() {
        let rows = gps(projected(ExportView::Gps)).unwrap();
        let json = serde_json::to_value(&rows).unwrap();
        let obj = json[0].as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["lat"], 25.03);
        assert!(obj.get("mood").is_none());
        assert!(obj.get("videoUri").is_none());
    }

    #[test]
    fn test_vlogs_uses_camel_case_key() {
        let rows = vlogs(projected(ExportView::Vlogs)).unwrap();
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["videoUri"], "");
        assert!(json[0].get("video_uri").is_none());
    }

    #[test]
    fn test_missing_projected_field_is_corrupt() {
        // A gps projection cannot be formatted as sentiments.
        let result = sentiments(projected(ExportView::Gps));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_index_links_every_view() {
        for path in ["/export/sentiments", "/export/gps", "/export/vlogs"] {
            assert!(EXPORT_INDEX_HTML.contains(path));
        }
    }
}
