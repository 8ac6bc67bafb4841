//! Plain-text views of a scan session.

use chrono::{DateTime, Local, TimeZone, Utc};
use mailroom_core::{PackageRecord, ScanResponse};

use crate::session::ScanLog;

pub const NETWORK_ERROR: &str = "Network error while scanning.";

const MISSING: &str = "-";
const HEADERS: [&str; 6] = ["Recipient", "Email", "Carrier", "Tracking", "Received", "Status"];

pub fn status_line(resp: &ScanResponse) -> String {
    if !resp.success {
        return format!("Scan failed: {}", resp.error.as_deref().unwrap_or("Unknown error from server"));
    }
    if resp.email_sent {
        "Package scanned and email notification sent.".to_string()
    } else {
        "Package scanned (no email found for this recipient).".to_string()
    }
}

pub fn format_time<Tz: TimeZone>(time: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match time {
        Some(t) => t.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => MISSING.to_string(),
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

fn row<Tz: TimeZone>(p: &PackageRecord, tz: &Tz) -> [String; 6]
where
    Tz::Offset: std::fmt::Display,
{
    [
        text(p.recipient_name.as_deref()),
        text(p.recipient_email.as_deref()),
        text(p.carrier.as_deref()),
        text(p.tracking_number.as_deref()),
        format_time(Some(p.time_received), tz),
        p.status.to_string(),
    ]
}

/// Render all records as an aligned table in `tz`.
pub fn table_in<Tz: TimeZone>(records: &[PackageRecord], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let rows: Vec<[String; 6]> = records.iter().map(|p| row(p, tz)).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(&HEADERS.map(String::from))];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.extend(rows.iter().map(|r| line(r)));
    out.join("\n")
}

pub fn table(records: &[PackageRecord]) -> String {
    table_in(records, &Local)
}

pub fn metrics_in<Tz: TimeZone>(log: &ScanLog, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let m = log.metrics();
    format!(
        "Last scan:    {}\nScanned at:   {}\nThis session: {}",
        m.last_name.as_deref().unwrap_or("Unknown"),
        format_time(m.last_time, tz),
        m.count
    )
}

pub fn metrics(log: &ScanLog) -> String {
    metrics_in(log, &Local)
}
