//! Player rankings and player pages.

use super::{
    ExtractResult, attr, first, first_numeric_segment, first_text, require, require_attr,
    selector, text,
};
use crate::error::ExtractError;
use crate::fetch::Document;
use crate::models::{PlayerInfo, RankedPlayer};
use crate::utils::href_id;
use tracing::debug;

/// Top players from `/stats/players`, at most `max`, ranked in table order.
pub fn extract_top_players(doc: &Document, max: usize) -> ExtractResult<Vec<RankedPlayer>> {
    let root = doc.html().root_element();
    let body = require(root, selector!("tbody"), "tbody")?;
    let mut players = Vec::new();

    for (i, row) in body.select(selector!("tr")).take(max).enumerate() {
        let link = require(row, selector!("td.playerCol a"), "td.playerCol a")?;
        let href = require_attr(link, "td.playerCol a", "href")?;
        let team = require(row, selector!("td.teamCol"), "td.teamCol")?;
        players.push(RankedPlayer {
            id: href_id(href, 3).unwrap_or(0),
            rank: i as u32 + 1,
            nickname: text(link),
            team: attr(team, "data-sort").unwrap_or_default().to_string(),
            maps: first_text(row, selector!("td.statsDetail"))
                .and_then(|m| m.parse().ok())
                .unwrap_or(0),
            rating: first_text(row, selector!("td.ratingCol")).unwrap_or_default(),
        });
    }

    debug!(count = players.len(), "Extracted top players");
    Ok(players)
}

/// Details of `/player/{id}/{nickname}`.
pub fn extract_player_info(doc: &Document, id: u64, nickname: &str) -> ExtractResult<PlayerInfo> {
    let root = doc.html().root_element();

    let team_link = first(root, selector!("div.playerTeam a[href]"));
    let real_name = require(root, selector!("div.playerRealname"), "div.playerRealname")?;
    let nationality = first(real_name, selector!("img[title]"))
        .and_then(|img| attr(img, "title"))
        .unwrap_or_default()
        .to_string();

    let age = first_text(root, selector!("div.playerAge span.listRight"))
        .and_then(|a| a.split_whitespace().next().and_then(|n| n.parse().ok()))
        .unwrap_or(0);

    let container = require(root, selector!("div.playerpage-container"), "div.playerpage-container")?;
    let values: Vec<String> = container.select(selector!("span.statsVal")).map(text).collect();
    let [rating, kpr, headshots] = match values.as_slice() {
        [r, k, h, ..] => [r.clone(), k.clone(), h.clone()],
        _ => return Err(ExtractError::MissingElement("span.statsVal")),
    };

    let trophies: Vec<_> = first(root, selector!("div.trophyRow"))
        .map(|row| row.select(selector!(".trophy")).collect())
        .unwrap_or_default();
    let last_trophy = trophies
        .iter()
        .find(|t| attr(**t, "href").is_some_and(|h| h.contains("events")))
        .and_then(|t| first(*t, selector!("span.trophyDescription[title]")))
        .and_then(|s| attr(s, "title"))
        .map(str::to_string);
    let total_mvp = trophies
        .first()
        .and_then(|t| first_text(*t, selector!("div.mvp-count")))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    // The second half-width column lists the most recent matches.
    let last_matches = root
        .select(selector!("div.col-6.text-ellipsis"))
        .nth(1)
        .map(|col| {
            col.select(selector!("a[href]"))
                .filter_map(|a| attr(a, "href"))
                .filter_map(first_numeric_segment)
                .collect()
        })
        .unwrap_or_default();

    Ok(PlayerInfo {
        id,
        nickname: nickname.to_string(),
        team: team_link.map(text),
        team_id: team_link
            .and_then(|a| attr(a, "href"))
            .and_then(|h| href_id(h, 2))
            .unwrap_or(0),
        name: text(real_name),
        nationality,
        age,
        rating,
        kpr,
        headshots,
        image: first(root, selector!("img.bodyshot-img"))
            .and_then(|img| attr(img, "src"))
            .map(str::to_string),
        total_trophies: trophies.len(),
        last_trophy,
        total_mvp,
        last_matches,
    })
}
