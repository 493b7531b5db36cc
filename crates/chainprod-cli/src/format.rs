//! Output formatting for text and JSON.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;

use chainprod_core::{DerivedView, DeviceStatus, EjectLabel, StatusSnapshot, SwitchLabel};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }
}

/// Everything printed for one status report.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub status: &'a DeviceStatus,
    pub view: &'a DerivedView,
    pub seconds_remaining: u32,
    pub printer_busy: bool,
    pub seq: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub synced_at: Option<OffsetDateTime>,
}

impl<'a> StatusReport<'a> {
    pub fn new(
        snapshot: &'a StatusSnapshot,
        view: &'a DerivedView,
        seconds_remaining: u32,
        printer_busy: bool,
    ) -> Self {
        Self {
            status: &snapshot.status,
            view,
            seconds_remaining,
            printer_busy,
            seq: snapshot.seq,
            synced_at: snapshot.synced_at,
        }
    }
}

fn eject_colored(label: EjectLabel, no_color: bool) -> String {
    if no_color {
        return label.to_string();
    }
    match label {
        EjectLabel::Ejecting => format!("{}", label.yellow().bold()),
        EjectLabel::Idle => format!("{}", label.green()),
        _ => format!("{}", label.dimmed()),
    }
}

fn switch_colored(label: SwitchLabel, no_color: bool) -> String {
    if no_color {
        return label.to_string();
    }
    match label {
        SwitchLabel::On => format!("{}", label.green()),
        SwitchLabel::Off => format!("{}", label.red()),
        _ => format!("{}", label.dimmed()),
    }
}

fn link_colored(status: &DeviceStatus, no_color: bool) -> String {
    let text = match status.error_or_closed {
        Some(false) => "open",
        Some(true) => "closed",
        None => "unknown",
    };
    if no_color {
        text.to_string()
    } else if status.is_connected() {
        format!("{}", text.green())
    } else {
        format!("{}", text.red())
    }
}

/// Format the derived view as a multi-line block.
pub fn format_view_text(status: &DeviceStatus, view: &DerivedView, opts: &FormatOptions) -> String {
    let eject_enabled = match (view.eject_enabled, opts.no_color) {
        (true, true) => "yes".to_string(),
        (false, true) => "no".to_string(),
        (true, false) => format!("{}", "yes".green()),
        (false, false) => format!("{}", "no".dimmed()),
    };

    let mut out = String::new();
    out.push_str(&format!("Serial link:  {}\n", link_colored(status, opts.no_color)));
    out.push_str(&format!("Chain:        {}\n", eject_colored(view.eject, opts.no_color)));
    out.push_str(&format!("Fans:         {}\n", switch_colored(view.fan, opts.no_color)));
    out.push_str(&format!("LEDs:         {}\n", switch_colored(view.led, opts.no_color)));
    out.push_str(&format!("Cooling:      {}\n", view.cooling_time));
    out.push_str(&format!("Can eject:    {}\n", eject_enabled));
    out.push_str(&format!("Action:       {}\n", view.connection));
    out
}

/// Format the derived view as a single line for watch mode.
pub fn format_watch_line(timestamp: &str, view: &DerivedView, opts: &FormatOptions) -> String {
    let ts = if opts.no_color {
        timestamp.to_string()
    } else {
        format!("{}", timestamp.dimmed())
    };
    format!(
        "[{}] chain={} fan={} led={} cooling={} eject={}\n",
        ts,
        eject_colored(view.eject, opts.no_color),
        switch_colored(view.fan, opts.no_color),
        switch_colored(view.led, opts.no_color),
        view.cooling_time,
        if view.eject_enabled { "enabled" } else { "disabled" },
    )
}

/// Serialize any value as pretty JSON with a trailing newline.
pub fn format_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ejecting() -> DeviceStatus {
        DeviceStatus {
            error_or_closed: Some(false),
            ejecting: Some(true),
            fans_on: Some(true),
            leds_on: Some(false),
            cooling_time_left: Some(5),
        }
    }

    #[test]
    fn test_format_view_text_plain() {
        let status = ejecting();
        let view = DerivedView::compute(&status, 5, false);
        let text = format_view_text(&status, &view, &FormatOptions::new(true));

        assert!(text.contains("Serial link:  open"));
        assert!(text.contains("Chain:        EJECTING"));
        assert!(text.contains("Fans:         ON"));
        assert!(text.contains("LEDs:         OFF"));
        assert!(text.contains("Cooling:      5s"));
        assert!(text.contains("Can eject:    no"));
        assert!(text.contains("Action:       Disconnect"));
    }

    #[test]
    fn test_format_view_text_closed() {
        let status = DeviceStatus {
            error_or_closed: Some(true),
            ..ejecting()
        };
        let view = DerivedView::compute(&status, 0, false);
        let text = format_view_text(&status, &view, &FormatOptions::new(true));
        assert!(text.contains("Chain:        -"));
        assert!(text.contains("Fans:         -"));
        assert!(text.contains("Action:       Connect"));
    }

    #[test]
    fn test_colored_output_differs() {
        let status = ejecting();
        let view = DerivedView::compute(&status, 5, false);
        let plain = format_view_text(&status, &view, &FormatOptions::new(true));
        let colored = format_view_text(&status, &view, &FormatOptions::new(false));
        assert_ne!(plain, colored);
        assert!(colored.contains("\x1b["));
    }

    #[test]
    fn test_format_watch_line() {
        let status = ejecting();
        let view = DerivedView::compute(&status, 5, false);
        let line = format_watch_line("12:00:00", &view, &FormatOptions::new(true));
        assert_eq!(
            line,
            "[12:00:00] chain=EJECTING fan=ON led=OFF cooling=5s eject=disabled\n"
        );
    }

    #[test]
    fn test_status_report_json() {
        let snapshot = StatusSnapshot {
            status: ejecting(),
            seq: 3,
            synced_at: None,
            sync_count: 1,
        };
        let view = DerivedView::compute(&snapshot.status, 5, false);
        let report = StatusReport::new(&snapshot, &view, 5, false);
        let json: serde_json::Value = serde_json::from_str(&format_json(&report).unwrap()).unwrap();
        assert_eq!(json["status"]["ejecting"], true);
        assert_eq!(json["status"]["coolingTimeLeft"], 5);
        assert_eq!(json["view"]["eject"], "Ejecting");
        assert_eq!(json["view"]["eject_enabled"], false);
        assert_eq!(json["seconds_remaining"], 5);
        assert_eq!(json["seq"], 3);
        assert!(json["synced_at"].is_null());
    }
}
