//! The closed set of properties a query can test.

use std::fmt;

use strsim::levenshtein;

/// Maximum Levenshtein distance to consider a property name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// How a property compares its value against an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Case-insensitive substring match on free text.
    Text,
    /// Match against the attendee e-mail list.
    Attendees,
    /// Case-insensitive equality against a small set of states.
    Enum,
    /// `yes`/`no` style flag.
    Boolean,
    /// Weekday or minute-of-day derived from the start time.
    Time,
}

impl PropertyKind {
    /// Short lower-case label, as shown by tooling.
    pub fn name(self) -> &'static str {
        match self {
            PropertyKind::Text => "text",
            PropertyKind::Attendees => "attendees",
            PropertyKind::Enum => "enum",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Time => "time",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A property the evaluator knows how to test.
///
/// Terms naming anything else parse fine but never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Title,
    Description,
    Attendees,
    Domain,
    Email,
    Response,
    Recurring,
    IsAllDay,
    HasAttendees,
    Transparency,
    Visibility,
    DayOfWeek,
    TimeOfDay,
    Color,
    RecurrenceId,
}

impl Property {
    /// Every known property, in catalog order.
    pub const ALL: [Property; 15] = [
        Property::Title,
        Property::Description,
        Property::Attendees,
        Property::Domain,
        Property::Email,
        Property::Response,
        Property::Recurring,
        Property::IsAllDay,
        Property::HasAttendees,
        Property::Transparency,
        Property::Visibility,
        Property::DayOfWeek,
        Property::TimeOfDay,
        Property::Color,
        Property::RecurrenceId,
    ];

    /// Looks up a property by its (lower-case) query name.
    pub fn from_name(name: &str) -> Option<Self> {
        let property = match name {
            "title" => Property::Title,
            "description" => Property::Description,
            "attendees" => Property::Attendees,
            "domain" => Property::Domain,
            "email" => Property::Email,
            "response" => Property::Response,
            "recurring" => Property::Recurring,
            "is-all-day" => Property::IsAllDay,
            "has-attendees" => Property::HasAttendees,
            "transparency" => Property::Transparency,
            "visibility" => Property::Visibility,
            "day-of-week" => Property::DayOfWeek,
            "time-of-day" => Property::TimeOfDay,
            "color" => Property::Color,
            "recurrence-id" => Property::RecurrenceId,
            _ => return None,
        };
        Some(property)
    }

    /// The name used in queries.
    pub fn name(self) -> &'static str {
        match self {
            Property::Title => "title",
            Property::Description => "description",
            Property::Attendees => "attendees",
            Property::Domain => "domain",
            Property::Email => "email",
            Property::Response => "response",
            Property::Recurring => "recurring",
            Property::IsAllDay => "is-all-day",
            Property::HasAttendees => "has-attendees",
            Property::Transparency => "transparency",
            Property::Visibility => "visibility",
            Property::DayOfWeek => "day-of-week",
            Property::TimeOfDay => "time-of-day",
            Property::Color => "color",
            Property::RecurrenceId => "recurrence-id",
        }
    }

    /// How the property compares a query value against an event.
    pub fn kind(self) -> PropertyKind {
        match self {
            Property::Title | Property::Description => PropertyKind::Text,
            Property::Attendees | Property::Domain | Property::Email => PropertyKind::Attendees,
            Property::Response
            | Property::Transparency
            | Property::Visibility
            | Property::Color
            | Property::RecurrenceId => PropertyKind::Enum,
            Property::Recurring | Property::IsAllDay | Property::HasAttendees => {
                PropertyKind::Boolean
            }
            Property::DayOfWeek | Property::TimeOfDay => PropertyKind::Time,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Suggests the known property closest to an unknown name.
///
/// Returns `None` for names that are already known or too far from every
/// known property.
pub fn suggest_property(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();
    let (best, distance) = Property::ALL
        .iter()
        .map(|p| (p.name(), levenshtein(&name, p.name())))
        .min_by_key(|(_, d)| *d)?;

    if distance > 0 && distance <= MAX_SUGGESTION_DISTANCE {
        Some(best)
    } else {
        None
    }
}
