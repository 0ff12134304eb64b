use chrono::{DateTime, Utc};

pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return ago(seconds, "second");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return ago(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return ago(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return ago(days, "day");
    }
    let months = days / 30;
    if months < 12 {
        return ago(months, "month");
    }
    ago(months / 12, "year")
}

fn ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

/// Cuts at `max_chars` characters and appends `...` when anything was cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((idx, _)) => format!("{}...", &text[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn relative_times() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(5), now), "5 seconds ago");
        assert_eq!(time_ago(now - Duration::minutes(3), now), "3 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(26), now), "1 day ago");
        assert_eq!(time_ago(now - Duration::minutes(61), now), "1 hour ago");
        assert_eq!(time_ago(now - Duration::seconds(1), now), "1 second ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 years ago");
        assert_eq!(time_ago(now + Duration::minutes(1), now), "0 seconds ago");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }
}
