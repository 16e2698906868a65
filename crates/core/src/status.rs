//! Pure rendering of ledger/roster state into standing-message payloads.

use crate::ledger::Ledger;
use crate::roster::EventRecord;

pub const TOP_DONOR_COUNT: usize = 5;

/// Platform-agnostic display payload; the chat layer decides how a title and
/// body become an embed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusPayload {
    pub title: String,
    pub body: String,
}

/// Format an aUEC amount with thousands separators, e.g. `1,234,567 aUEC`.
pub fn format_auec(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} aUEC")
}

pub fn render_bank_status(ledger: &Ledger) -> StatusPayload {
    let ranking = donor_ranking(ledger, TOP_DONOR_COUNT);
    StatusPayload {
        title: "🏦 Org Bank".to_owned(),
        body: format!(
            "💰 Current total: **{}**\n\n👑 Top donors:\n{ranking}",
            format_auec(ledger.total)
        ),
    }
}

pub fn render_donor_ranking(ledger: &Ledger) -> StatusPayload {
    StatusPayload {
        title: "👑 Donor ranking".to_owned(),
        body: donor_ranking(ledger, usize::MAX),
    }
}

fn donor_ranking(ledger: &Ledger, limit: usize) -> String {
    let lines: Vec<String> = ledger
        .top_donors(limit)
        .enumerate()
        .map(|(index, (user, amount))| {
            format!("{rank}. <@{user}> — {amount}", rank = index + 1, amount = format_auec(amount))
        })
        .collect();
    if lines.is_empty() {
        "No donors yet.".to_owned()
    } else {
        lines.join("\n")
    }
}

pub fn render_events_status(events: &[EventRecord]) -> StatusPayload {
    let title = "📋 Org Events".to_owned();
    if events.is_empty() {
        return StatusPayload { title, body: "No events scheduled yet.".to_owned() };
    }

    let blocks: Vec<String> = events
        .iter()
        .enumerate()
        .map(|(position, event)| {
            format!(
                "📌 [{position}] **{title}** — {date}\n{description}\n👥 Participants: {participants}\n🙅 Declined: {declined}",
                title = event.title,
                date = event.date,
                description = event.description,
                participants = mention_list(&event.participants, "Nobody yet"),
                declined = mention_list(&event.declined, "No refusals"),
            )
        })
        .collect();
    StatusPayload { title, body: blocks.join("\n\n") }
}

fn mention_list(users: &[String], placeholder: &str) -> String {
    if users.is_empty() {
        return placeholder.to_owned();
    }
    users.iter().map(|user| format!("<@{user}>")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::{format_auec, render_bank_status, render_donor_ranking, render_events_status};
    use crate::ledger::Ledger;
    use crate::roster::EventRoster;

    #[test]
    fn amounts_format_with_thousands_separators() {
        assert_eq!(format_auec(0), "0 aUEC");
        assert_eq!(format_auec(999), "999 aUEC");
        assert_eq!(format_auec(5_000), "5,000 aUEC");
        assert_eq!(format_auec(1_234_567), "1,234,567 aUEC");
    }

    #[test]
    fn bank_status_lists_total_and_top_five() {
        let mut ledger = Ledger::default();
        for index in 0..7u64 {
            ledger
                .credit(format!("U{index}"), format!("user-{index}"), (index + 1) * 100, None)
                .expect("credit");
        }

        let payload = render_bank_status(&ledger);

        assert!(payload.body.contains("2,800 aUEC"));
        assert!(payload.body.contains("1. <@U6> — 700 aUEC"));
        assert!(payload.body.contains("5. <@U2> — 300 aUEC"));
        assert!(!payload.body.contains("<@U0>"));
    }

    #[test]
    fn empty_bank_status_uses_placeholder() {
        let payload = render_bank_status(&Ledger::default());

        assert!(payload.body.contains("0 aUEC"));
        assert!(payload.body.contains("No donors yet."));
    }

    #[test]
    fn full_ranking_is_not_truncated() {
        let mut ledger = Ledger::default();
        for index in 0..7u64 {
            ledger.credit(format!("U{index}"), format!("user-{index}"), index + 1, None).expect("credit");
        }

        let payload = render_donor_ranking(&ledger);
        assert_eq!(payload.body.lines().count(), 7);
    }

    #[test]
    fn events_status_renders_one_block_per_event() {
        let mut roster = EventRoster::default();
        roster.create("Mining run", "Friday 20:00", "Meet at the refinery", true).expect("create");
        roster.create("Fleet patrol", "Saturday", "Border sweep", true).expect("create");
        roster.join(0, "U1").expect("join");
        roster.decline(0, "U2").expect("decline");

        let payload = render_events_status(&roster.events);

        assert!(payload.body.contains("[0] **Mining run** — Friday 20:00"));
        assert!(payload.body.contains("Participants: <@U1>"));
        assert!(payload.body.contains("Declined: <@U2>"));
        assert!(payload.body.contains("[1] **Fleet patrol**"));
        assert!(payload.body.contains("Participants: Nobody yet"));
    }

    #[test]
    fn empty_roster_renders_placeholder_body() {
        let payload = render_events_status(&[]);
        assert_eq!(payload.body, "No events scheduled yet.");
    }
}
