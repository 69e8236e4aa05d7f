//! Events, event pages, event matches and event results.

use super::{
    ExtractResult, attr, attr_u64, first, first_text, require, require_attr, selector,
    split_score, text,
};
use crate::error::ExtractError;
use crate::fetch::Document;
use crate::models::{
    EventInfo, EventMatch, EventMvp, EventResult, EventStatus, EventSummary, EventTeam, Placement,
    TBA, TBD,
};
use crate::utils::{from_unix_ms, href_id, normalize_long_date, normalize_short_date};
use chrono::NaiveDateTime;
use scraper::ElementRef;
use tracing::debug;

/// Id from an `/events/{id}/{slug}` href: the second-to-last segment.
fn event_id(href: &str) -> Option<u64> {
    href.trim_end_matches('/').rsplit('/').nth(1)?.parse().ok()
}

fn short_date(el: Option<ElementRef<'_>>) -> String {
    el.map(text)
        .map(|raw| normalize_short_date(&raw).unwrap_or(raw))
        .unwrap_or_else(|| TBA.to_string())
}

/// One `a.ongoing-event` tile from the today/featured tabs.
fn ongoing_tile(a: ElementRef<'_>) -> ExtractResult<EventSummary> {
    let href = require_attr(a, "a.ongoing-event", "href")?;
    let mut dates = a.select(selector!(r#"span[data-time-format="MMM do"]"#));
    let start = dates.next();
    let end = dates.next().or(start);
    Ok(EventSummary {
        id: event_id(href).unwrap_or(0),
        title: first_text(a, selector!("div.text-ellipsis")).unwrap_or_default(),
        start_date: short_date(start),
        end_date: short_date(end),
    })
}

/// Ongoing and upcoming events from `/events`.
///
/// `max` bounds the number of upcoming (big) events; ongoing events are
/// listed in full.
pub fn extract_events(
    doc: &Document,
    ongoing: bool,
    future: bool,
    max: usize,
) -> ExtractResult<Vec<EventSummary>> {
    let root = doc.html().root_element();
    let mut events = Vec::new();

    if ongoing {
        let today = require(root, selector!("div.tab-content#TODAY"), "div.tab-content#TODAY")?;
        for a in today.select(selector!("a.ongoing-event")) {
            events.push(ongoing_tile(a)?);
        }
    }

    if future {
        for a in root.select(selector!("div.big-events a.big-event")).take(max) {
            let href = require_attr(a, "a.big-event", "href")?;
            let mut dates = a.select(selector!("span[data-unix]"));
            let start = dates.next();
            let end = dates.last().or(start);
            events.push(EventSummary {
                id: event_id(href).unwrap_or(0),
                title: first_text(a, selector!("div.big-event-name")).unwrap_or_default(),
                start_date: short_date(start),
                end_date: short_date(end),
            });
        }
    }

    debug!(count = events.len(), "Extracted events");
    Ok(events)
}

/// Featured events from the `FEATURED` tab of `/events`, at most `max`.
pub fn extract_featured_events(doc: &Document, max: usize) -> ExtractResult<Vec<EventSummary>> {
    let root = doc.html().root_element();
    let Some(tab) = first(root, selector!("div.tab-content#FEATURED")) else {
        return Ok(Vec::new());
    };
    tab.select(selector!("a.ongoing-event"))
        .take(max)
        .map(ongoing_tile)
        .collect()
}

fn event_status(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> EventStatus {
    if now < start {
        EventStatus::Upcoming
    } else if now <= end {
        EventStatus::Ongoing
    } else {
        EventStatus::Finished
    }
}

fn text_or_tba(root: ElementRef<'_>, sel: &scraper::Selector) -> String {
    first_text(root, sel)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TBA.to_string())
}

/// Details of `/events/{id}/{slug}`. `now` decides the event status.
pub fn extract_event_info(
    doc: &Document,
    id: u64,
    title: &str,
    now: NaiveDateTime,
) -> ExtractResult<EventInfo> {
    let root = doc.html().root_element();
    let dates_cell = require(root, selector!("td.eventdate"), "td.eventdate")?;
    let stamps: Vec<NaiveDateTime> = dates_cell
        .select(selector!("span[data-unix]"))
        .filter_map(|span| attr(span, "data-unix"))
        .filter_map(|raw| raw.parse::<i64>().ok())
        .filter_map(from_unix_ms)
        .collect();
    let (start, end) = match stamps.as_slice() {
        [] => {
            return Err(ExtractError::MissingAttribute {
                element: "td.eventdate span",
                attr: "data-unix",
            });
        }
        [single] => (*single, *single),
        [opening, .., closing] => (*opening, *closing),
    };
    let status = event_status(start, end, now);

    let location = first(root, selector!("td.location"))
        .map(|el| text(el).replace('\n', ""))
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| TBA.to_string());

    let mut mvp = None;
    let mut placements = Vec::new();
    let mut teams = Vec::new();

    if status == EventStatus::Finished {
        mvp = first(root, selector!("div.player-and-coin a")).map(|a| EventMvp {
            id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
            nickname: text(a).trim_matches('\'').to_string(),
        });
        for (place, div) in root.select(selector!("div.placement")).enumerate() {
            let team = first(div, selector!("div.team"));
            placements.push(Placement {
                place: place as u32 + 1,
                team: team.map(text).unwrap_or_else(|| TBD.to_string()),
                team_id: team
                    .and_then(|t| first(t, selector!("a[href]")))
                    .and_then(|a| attr(a, "href"))
                    .and_then(|h| href_id(h, 2))
                    .unwrap_or(0),
                prize: first_text(div, selector!("div.prize")).unwrap_or_default(),
            });
        }
    } else {
        for div in root.select(selector!("div.team-box")) {
            teams.push(EventTeam {
                id: first(div, selector!("a[href]"))
                    .and_then(|a| attr(a, "href"))
                    .and_then(|h| href_id(h, 2))
                    .unwrap_or(0),
                name: first_text(div, selector!("div.text-container"))
                    .unwrap_or_else(|| "?".to_string()),
            });
        }
    }

    Ok(EventInfo {
        id,
        title: title.to_string(),
        start: start.format("%d-%m-%Y").to_string(),
        end: end.format("%d-%m-%Y").to_string(),
        status,
        prize: text_or_tba(root, selector!("td.prizepool")),
        team_count: text_or_tba(root, selector!("td.teamsNumber")),
        location,
        mvp,
        placements,
        teams,
    })
}

/// Live and upcoming matches from `/events/{id}/matches`.
pub fn extract_event_matches(doc: &Document) -> ExtractResult<Vec<EventMatch>> {
    let root = doc.html().root_element();
    let mut matches = Vec::new();

    for live in root.select(selector!("div.liveMatchesSection div.liveMatch-container")) {
        let mut names = live.select(selector!("div.matchTeamName")).map(text);
        matches.push(EventMatch {
            id: first(live, selector!("a.match"))
                .and_then(|a| attr(a, "href"))
                .and_then(|h| href_id(h, 2))
                .unwrap_or(0),
            date: "LIVE".to_string(),
            time: None,
            team1: names.next().unwrap_or_else(|| TBD.to_string()),
            team2: names.next().unwrap_or_else(|| TBD.to_string()),
            team1_id: attr_u64(live, "team1"),
            team2_id: attr_u64(live, "team2"),
        });
    }

    for section in root.select(selector!("div.upcomingMatchesSection")) {
        let headline = text(require(
            section,
            selector!("span.matchDayHeadline"),
            "span.matchDayHeadline",
        )?);
        let day = headline.split(' ').last().unwrap_or_default().to_string();
        for m in section.select(selector!("div.upcomingMatch")) {
            let mut names = m.select(selector!("div.matchTeamName")).map(text);
            matches.push(EventMatch {
                id: first(m, selector!("a[href]"))
                    .and_then(|a| attr(a, "href"))
                    .and_then(|h| href_id(h, 2))
                    .unwrap_or(0),
                date: day.clone(),
                time: first_text(m, selector!("div.matchTime")),
                team1: names.next().unwrap_or_else(|| TBD.to_string()),
                team2: names.next().unwrap_or_else(|| TBD.to_string()),
                team1_id: attr_u64(m, "team1"),
                team2_id: attr_u64(m, "team2"),
            });
        }
    }

    debug!(count = matches.len(), "Extracted event matches");
    Ok(matches)
}

/// Results from `/results?event={id}`: the first `days` sections, at most `max` rows.
pub fn extract_event_results(
    doc: &Document,
    days: usize,
    max: usize,
) -> ExtractResult<Vec<EventResult>> {
    let root = doc.html().root_element();
    let holder = require(root, selector!("div.results-holder"), "div.results-holder")?;
    let mut results = Vec::new();

    'days: for section in holder.select(selector!("div.results-sublist")).take(days) {
        let date = first_text(section, selector!("span.standard-headline"))
            .and_then(|h| normalize_long_date(&h));
        for a in section.select(selector!("a.a-reset")) {
            if results.len() >= max {
                break 'days;
            }
            let mut teams = a.select(selector!("div.team")).map(text);
            let (score1, score2) = split_score(&text(require(
                a,
                selector!("td.result-score"),
                "td.result-score",
            )?));
            results.push(EventResult {
                id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
                date: date.clone(),
                team1: teams.next().unwrap_or_else(|| TBD.to_string()),
                team2: teams.next().unwrap_or_else(|| TBD.to_string()),
                score1,
                score2,
            });
        }
    }

    debug!(count = results.len(), "Extracted event results");
    Ok(results)
}
