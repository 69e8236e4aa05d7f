//! Team ranking and team pages.

use super::{
    ExtractResult, attr, first, first_numeric_segment, first_text, require, require_attr,
    selector, text,
};
use crate::error::ExtractError;
use crate::fetch::Document;
use crate::models::{RankedTeam, TeamInfo, TeamPlayer};
use crate::utils::href_id;
use tracing::debug;

/// Leading number of a string, ignoring a `#`/`(` prefix: `#3` -> 3, `(912 points)` -> 912.
fn leading_number(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .trim_start_matches(['#', '('])
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// The weekly ranking at `/ranking/teams/{yyyy}/{month}/{dd}`, at most `max` teams.
pub fn extract_top_teams(doc: &Document, max: usize) -> ExtractResult<Vec<RankedTeam>> {
    let root = doc.html().root_element();
    let mut teams = Vec::new();

    for block in root.select(selector!("div.ranked-team")).take(max) {
        let position = text(require(block, selector!("span.position"), "span.position")?);
        let rank = leading_number(&position).ok_or(ExtractError::InvalidValue {
            field: "rank",
            value: position.clone(),
        })?;
        let line = require(block, selector!("div.teamLine"), "div.teamLine")?;
        let title = text(require(line, selector!("span.name"), "span.name")?);
        let points = first_text(line, selector!("span.points"))
            .and_then(|p| leading_number(&p))
            .unwrap_or(0);
        let link = require(block, selector!("a.moreLink"), "a.moreLink")?;
        let href = require_attr(link, "a.moreLink", "href")?;

        teams.push(RankedTeam {
            id: first_numeric_segment(href).unwrap_or(0),
            rank,
            title,
            points,
            change: first_text(block, selector!("div.change")).unwrap_or_default(),
        });
    }

    if teams.is_empty() && max > 0 {
        return Err(ExtractError::MissingElement("div.ranked-team"));
    }
    debug!(count = teams.len(), "Extracted top teams");
    Ok(teams)
}

/// Details of `/team/{id}/{slug}`.
pub fn extract_team_info(doc: &Document, id: u64, title: &str) -> ExtractResult<TeamInfo> {
    let root = doc.html().root_element();
    let roster = require(root, selector!("div.bodyshot-team"), "div.bodyshot-team")?;
    let players = roster
        .select(selector!("a[href]"))
        .map(|a| TeamPlayer {
            id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
            nickname: first_text(a, selector!("span.bold")).unwrap_or_else(|| text(a)),
        })
        .collect();

    let mut team = TeamInfo {
        id,
        title: title.to_string(),
        rank: 0,
        players,
        coach: "?".to_string(),
        average_age: "0".to_string(),
        weeks_in_top30: 0,
        logo: None,
        last_trophy: None,
        total_trophies: 0,
    };

    // Stat boxes come in a fixed order: rank, weeks in top 30, average age, coach.
    for (i, stat) in root.select(selector!("div.profile-team-stat")).enumerate() {
        match i {
            0 => {
                if let Some(rank) = first_text(stat, selector!("a")).and_then(|r| leading_number(&r)) {
                    team.rank = rank;
                }
            }
            1 => {
                if let Some(weeks) = first_text(stat, selector!("span.right")).and_then(|w| w.parse().ok()) {
                    team.weeks_in_top30 = weeks;
                }
            }
            2 => {
                if let Some(age) = first_text(stat, selector!("span.right")) {
                    team.average_age = age;
                }
            }
            3 => {
                if let Some(coach) = first_text(stat, selector!("span.bold")) {
                    team.coach = coach.trim_matches('\'').to_string();
                }
            }
            _ => break,
        }
    }

    team.logo = first(root, selector!("div.profile-team-logo-container"))
        .and_then(|c| c.select(selector!("img[src]")).last())
        .and_then(|img| attr(img, "src"))
        .map(str::to_string);
    team.last_trophy = first(root, selector!("div.trophyHolder span[title]"))
        .and_then(|s| attr(s, "title"))
        .map(str::to_string);
    team.total_trophies = root.select(selector!("div.trophyHolder")).count();

    Ok(team)
}
