use chrono::{DateTime, Local, Utc};

/// Short "how long ago" label used in lists
pub fn format_relative(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(at);
    let mins = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{} min ago", mins)
    } else if hours < 24 {
        format!("{} h ago", hours)
    } else if days < 7 {
        format!("{} d ago", days)
    } else if days > 365 {
        at.format("%-d %b %Y").to_string()
    } else {
        at.format("%-d %b").to_string()
    }
}

/// Full date and time in the local zone, used under message bubbles
pub fn format_full(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%-d %B %Y, %H:%M").to_string(),
        None => String::new(),
    }
}

/// Clock time in the local zone
pub fn format_clock(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%H:%M").to_string(),
        None => String::new(),
    }
}
