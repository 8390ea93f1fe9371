//! Calendar event records and the property contract the evaluator reads.
//!
//! Events reach the evaluator either as a typed [`CalendarEvent`] or as a raw
//! JSON object using the same column names. Both implement
//! [`EventProperties`]; anything else can too.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Read-only, typed access to the properties of one calendar event.
///
/// Every getter returns `None` (or an empty list) for data the event does not
/// carry; the evaluator treats missing data as "does not match".
pub trait EventProperties {
    /// Identifier used in reports. Not consulted by queries.
    fn event_id(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn title(&self) -> Option<&str>;

    fn description(&self) -> Option<&str>;

    /// Attendee e-mail addresses.
    fn attendees(&self) -> Cow<'_, [String]>;

    /// Whether the event belongs to a recurring series.
    ///
    /// `None` means the event reported something that is not a boolean; such
    /// an event matches neither `recurring:yes` nor `recurring:no`.
    fn is_recurring(&self) -> Option<bool>;

    /// The calendar owner's response (`accepted`, `declined`, `needsAction`, ...).
    fn response_status(&self) -> Option<&str>;

    /// Free/busy transparency (`opaque` or `transparent`).
    fn transparency(&self) -> Option<&str>;

    fn visibility(&self) -> Option<&str>;

    /// Provider color identifier.
    fn color(&self) -> Option<Cow<'_, str>>;

    fn recurrence_id(&self) -> Option<&str>;

    /// ISO-8601 start timestamp.
    fn start_time(&self) -> Option<&str>;

    /// ISO-8601 end timestamp.
    fn end_time(&self) -> Option<&str>;
}

/// A calendar event as stored by the timesheet application.
///
/// Field names follow the stored columns, so rows exported as JSON
/// deserialize directly. Decoding is lenient: `attendees` may be a list or a
/// JSON-encoded string, `id` and `event_color` may be numbers, and a field
/// holding the wrong JSON type is kept as unknown instead of failing the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_attendees")]
    pub attendees: Vec<String>,

    /// `Some(false)` when the column is missing or null, `None` when it holds
    /// something other than a boolean (such as the stored `1`/`0`).
    #[serde(
        default = "not_recurring",
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_recurring: Option<bool>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub my_response_status: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub transparency: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub visibility: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_color: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub recurrence_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<String>,
}

fn not_recurring() -> Option<bool> {
    Some(false)
}

impl Default for CalendarEvent {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            description: None,
            attendees: Vec::new(),
            is_recurring: not_recurring(),
            my_response_status: None,
            transparency: None,
            visibility: None,
            event_color: None,
            recurrence_id: None,
            start_time: None,
            end_time: None,
        }
    }
}

impl CalendarEvent {
    /// Creates an event with just a title, mostly for tests and previews.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl EventProperties for CalendarEvent {
    fn event_id(&self) -> Option<Cow<'_, str>> {
        self.id.as_deref().map(Cow::Borrowed)
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn attendees(&self) -> Cow<'_, [String]> {
        Cow::Borrowed(&self.attendees)
    }

    fn is_recurring(&self) -> Option<bool> {
        self.is_recurring
    }

    fn response_status(&self) -> Option<&str> {
        self.my_response_status.as_deref()
    }

    fn transparency(&self) -> Option<&str> {
        self.transparency.as_deref()
    }

    fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }

    fn color(&self) -> Option<Cow<'_, str>> {
        self.event_color.as_deref().map(Cow::Borrowed)
    }

    fn recurrence_id(&self) -> Option<&str> {
        self.recurrence_id.as_deref()
    }

    fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }
}

/// Raw event rows: a JSON object keyed by column name.
///
/// Values of the wrong JSON type are treated as missing, except
/// `is_recurring`, which reports the mismatch as `None`.
impl EventProperties for Map<String, Value> {
    fn event_id(&self) -> Option<Cow<'_, str>> {
        self.get("id").and_then(scalar_to_string)
    }

    fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    fn description(&self) -> Option<&str> {
        self.get("description").and_then(Value::as_str)
    }

    fn attendees(&self) -> Cow<'_, [String]> {
        Cow::Owned(self.get("attendees").map(attendees_from_value).unwrap_or_default())
    }

    fn is_recurring(&self) -> Option<bool> {
        flag_from_value(self.get("is_recurring"))
    }

    fn response_status(&self) -> Option<&str> {
        self.get("my_response_status").and_then(Value::as_str)
    }

    fn transparency(&self) -> Option<&str> {
        self.get("transparency").and_then(Value::as_str)
    }

    fn visibility(&self) -> Option<&str> {
        self.get("visibility").and_then(Value::as_str)
    }

    fn color(&self) -> Option<Cow<'_, str>> {
        self.get("event_color").and_then(scalar_to_string)
    }

    fn recurrence_id(&self) -> Option<&str> {
        self.get("recurrence_id").and_then(Value::as_str)
    }

    fn start_time(&self) -> Option<&str> {
        self.get("start_time").and_then(Value::as_str)
    }

    fn end_time(&self) -> Option<&str> {
        self.get("end_time").and_then(Value::as_str)
    }
}

/// Reads a boolean column: missing or null is `false`, a non-boolean is
/// unknown.
fn flag_from_value(value: Option<&Value>) -> Option<bool> {
    match value {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(flag)) => Some(*flag),
        Some(_) => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Decodes an attendee list from a JSON array or a JSON-encoded string.
///
/// Non-string entries are skipped; anything undecodable yields an empty list.
fn attendees_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded @ Value::Array(_)) => attendees_from_value(&decoded),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn deserialize_attendees<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(attendees_from_value).unwrap_or_default())
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(flag_from_value(value.as_ref()))
}

/// Keeps string values; any other JSON type reads as missing.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(scalar_to_string)
        .map(Cow::into_owned))
}

/// Parses an event timestamp into wall-clock time in its own offset.
///
/// A trailing `Z` is read as `+00:00`. Accepts RFC 3339 style timestamps
/// with or without an offset, with `T` or a space between date and time,
/// optional seconds and fractional seconds, and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(base) => Cow::Owned(format!("{base}+00:00")),
        None => Cow::Borrowed(raw),
    };

    const WITH_OFFSET: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
    ];
    for format in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.naive_local());
        }
    }

    const NAIVE: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_deserialize_attendees_list() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "attendees": ["a@acme.com", "b@other.org"]
        }))
        .unwrap();
        assert_eq!(event.attendees, vec!["a@acme.com", "b@other.org"]);
    }

    #[test]
    fn test_deserialize_attendees_encoded_string() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "attendees": "[\"a@acme.com\"]"
        }))
        .unwrap();
        assert_eq!(event.attendees, vec!["a@acme.com"]);
    }

    #[test]
    fn test_deserialize_attendees_garbage_is_empty() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "attendees": "not json"
        }))
        .unwrap();
        assert!(event.attendees.is_empty());

        let event: CalendarEvent = serde_json::from_value(json!({ "attendees": null })).unwrap();
        assert!(event.attendees.is_empty());
    }

    #[test]
    fn test_deserialize_numeric_id_and_color() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 42,
            "event_color": 5
        }))
        .unwrap();
        assert_eq!(event.id.as_deref(), Some("42"));
        assert_eq!(event.event_color.as_deref(), Some("5"));
    }

    #[test]
    fn test_deserialize_minimal_event() {
        let event: CalendarEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(event, CalendarEvent::default());
        assert_eq!(event.is_recurring, Some(false));
    }

    #[test]
    fn test_deserialize_stored_recurring_flags() {
        let events: Vec<CalendarEvent> = serde_json::from_value(json!([
            { "is_recurring": true },
            { "is_recurring": null },
            { "is_recurring": 1 },
            { "is_recurring": "yes" }
        ]))
        .unwrap();

        let flags: Vec<Option<bool>> = events.iter().map(|e| e.is_recurring).collect();
        assert_eq!(flags, vec![Some(true), Some(false), None, None]);
    }

    #[test]
    fn test_deserialize_mistyped_text_fields_are_missing() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "title": 12,
            "description": ["x"],
            "my_response_status": false,
            "start_time": 1736951400,
            "end_time": "2025-01-15T15:00:00Z"
        }))
        .unwrap();

        assert_eq!(event.title, None);
        assert_eq!(event.description, None);
        assert_eq!(event.my_response_status, None);
        assert_eq!(event.start_time, None);
        assert_eq!(event.end_time.as_deref(), Some("2025-01-15T15:00:00Z"));
    }

    #[test]
    fn test_map_properties() {
        let row = json!({
            "id": 7,
            "title": "Standup",
            "attendees": "[\"a@acme.com\", 3]",
            "is_recurring": true,
            "event_color": "11"
        });
        let map = row.as_object().unwrap();

        assert_eq!(map.event_id().as_deref(), Some("7"));
        assert_eq!(EventProperties::title(map), Some("Standup"));
        assert_eq!(map.attendees().into_owned(), vec!["a@acme.com".to_string()]);
        assert_eq!(EventProperties::is_recurring(map), Some(true));
        assert_eq!(map.color().as_deref(), Some("11"));
        assert_eq!(EventProperties::start_time(map), None);
    }

    #[test]
    fn test_map_is_recurring_type_mismatch() {
        let missing = json!({});
        assert_eq!(
            EventProperties::is_recurring(missing.as_object().unwrap()),
            Some(false)
        );

        let numeric = json!({ "is_recurring": 1 });
        assert_eq!(
            EventProperties::is_recurring(numeric.as_object().unwrap()),
            None
        );
    }

    #[test]
    fn test_parse_timestamp_utc_suffix() {
        let dt = parse_timestamp("2025-01-15T14:30:00Z").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (14, 30));
        assert_eq!(dt.day(), 15);
    }

    #[test]
    fn test_parse_timestamp_keeps_own_offset() {
        let dt = parse_timestamp("2025-01-15T23:30:00-05:00").unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (15, 23, 30));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2025-01-15T14:30:00.250+01:00").is_some());
        assert!(parse_timestamp("2025-01-15 14:30:00").is_some());
        assert!(parse_timestamp("2025-01-15T14:30").is_some());
        assert!(parse_timestamp("2025-01-15T14:30:00+0100").is_some());

        let date_only = parse_timestamp("2025-01-15").unwrap();
        assert_eq!((date_only.hour(), date_only.minute()), (0, 0));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-13-45T10:00:00"), None);
    }
}
