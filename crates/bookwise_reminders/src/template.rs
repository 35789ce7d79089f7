//! Reminder message rendering.
//!
//! Supported placeholders: `{customer_name}`, `{service}`, `{provider}`,
//! `{business}`, `{date}` (`DD.MM.YYYY`) and `{time}` (`HH:MM`). Anything
//! else in braces is left as written.

use bookwise_calendar::{DateKey, TimeOfDay};

/// Values substituted into a reminder template.
#[derive(Debug, Clone, Copy)]
pub struct ReminderContext<'a> {
    pub customer_name: &'a str,
    pub service: &'a str,
    pub provider: &'a str,
    pub business: &'a str,
    pub date: DateKey,
    pub time: TimeOfDay,
}

pub fn render_reminder(template: &str, ctx: &ReminderContext<'_>) -> String {
    let date = ctx.date.naive().format("%d.%m.%Y").to_string();
    let time = ctx.time.to_string();
    let values = [
        ("customer_name", ctx.customer_name),
        ("service", ctx.service),
        ("provider", ctx.provider),
        ("business", ctx.business),
        ("date", date.as_str()),
        ("time", time.as_str()),
    ];

    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
