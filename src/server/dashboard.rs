//! Status page served at `/`

use crate::climate::gate::GateStatus;
use crate::climate::policy::ThresholdPolicy;
use crate::climate::state::HvacMode;
use chrono::{DateTime, Utc};

pub const STYLE_CSS: &str = r#":root {
    --bg: #101418;
    --panel: #1b2128;
    --text: #e6e9ec;
    --muted: #8a949e;
    --on: #e8833a;
    --cool: #3a9be8;
    --off: #56606a;
}

body {
    margin: 0;
    font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
    background: var(--bg);
    color: var(--text);
}

main {
    max-width: 36rem;
    margin: 2rem auto;
    padding: 0 1rem;
}

.panel {
    background: var(--panel);
    border-radius: 0.5rem;
    padding: 1rem 1.25rem;
    margin-bottom: 1rem;
}

.readings {
    display: grid;
    grid-template-columns: 1fr 1fr;
    gap: 0.5rem 1rem;
}

.label {
    color: var(--muted);
    font-size: 0.85rem;
}

.value {
    font-size: 1.5rem;
}

.relay {
    font-weight: 600;
}

.relay.heating { color: var(--on); }
.relay.cooling { color: var(--cool); }
.relay.off { color: var(--off); }

.actions a {
    display: inline-block;
    margin: 0.25rem 0.5rem 0.25rem 0;
    padding: 0.4rem 0.8rem;
    border-radius: 0.3rem;
    background: var(--off);
    color: var(--text);
    text-decoration: none;
}

.actions a.on { background: var(--on); }
"#;

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "&mdash;".to_string(),
    }
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Render the status page for one status snapshot
pub fn render_index(status: &GateStatus, policy: &ThresholdPolicy) -> String {
    let snapshot = &status.snapshot;

    let (relay_class, relay_text) = match (snapshot.relay_active, snapshot.mode) {
        (false, _) => ("off", "Off"),
        (true, HvacMode::Cooling) => ("cooling", "On (cooling)"),
        (true, HvacMode::Heating) => ("heating", "On (heating)"),
    };

    let lock_text = match status.locked_until {
        Some(until) => format!("Locked until {}", until.format("%H:%M:%S UTC")),
        None => "Automatic".to_string(),
    };

    let mut actions = String::new();
    for minutes in [30u32, 60, 120] {
        actions.push_str(&format!(
            r#"<a class="on" href="/lock/on/{minutes}">On {minutes} min</a>"#
        ));
    }
    for minutes in [30u32, 60, 120] {
        actions.push_str(&format!(
            r#"<a href="/lock/off/{minutes}">Off {minutes} min</a>"#
        ));
    }
    actions.push_str(r#"<a href="/lock/off/0">Resume automatic</a>"#);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="30">
<title>Climate relay</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<main>
<section class="panel readings">
  <div><div class="label">Indoor temperature</div><div class="value">{indoor_t}</div></div>
  <div><div class="label">Indoor humidity</div><div class="value">{indoor_h}</div></div>
  <div><div class="label">Outdoor temperature</div><div class="value">{outdoor_t}</div></div>
  <div><div class="label">Outdoor humidity</div><div class="value">{outdoor_h}</div></div>
</section>
<section class="panel">
  <div class="label">Relay</div>
  <div class="relay {relay_class}">{relay_text}</div>
  <div class="label">{lock_text}</div>
  <div class="label">Target {desired:.1}&deg;C &plusmn; {hysteresis:.1}, last command {last_command}</div>
</section>
<section class="panel actions">
  {actions}
</section>
</main>
</body>
</html>
"#,
        indoor_t = reading(snapshot.indoor_temperature, "&deg;C"),
        indoor_h = reading(snapshot.indoor_humidity, "%"),
        outdoor_t = reading(snapshot.outdoor_temperature, "&deg;C"),
        outdoor_h = reading(snapshot.outdoor_humidity, "%"),
        desired = policy.desired_temperature,
        hysteresis = policy.hysteresis,
        last_command = timestamp(snapshot.last_command_at),
    )
}
