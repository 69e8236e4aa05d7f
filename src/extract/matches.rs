//! Matches, match pages and results.

use super::{
    ExtractResult, attr, attr_u64, first, first_text, has_class, raw_text, require,
    require_attr, selector, split_score, text,
};
use crate::error::ExtractError;
use crate::fetch::Document;
use crate::models::{MapResult, MatchInfo, MatchResult, MatchStatus, PlayerStat, TBD, UpcomingMatch};
use crate::utils::{countdown_seconds, href_id, normalize_long_date};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

/// `First 'Nick' Last` -> `Nick`
static NICKNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(.*?)'").expect("valid nickname regex"));

fn star_rating(el: ElementRef<'_>) -> u8 {
    attr(el, "stars").and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Team names of a match block, `TBD` for any slot not yet decided.
fn team_names(el: ElementRef<'_>) -> (String, String) {
    let mut names = el.select(selector!("div.matchTeamName")).map(text);
    (
        names.next().unwrap_or_else(|| TBD.to_string()),
        names.next().unwrap_or_else(|| TBD.to_string()),
    )
}

fn event_name(el: ElementRef<'_>) -> String {
    first_text(el, selector!("div.matchEventName"))
        .or_else(|| first_text(el, selector!("span.line-clamp-3")))
        .unwrap_or_default()
}

/// Last character of the `bo3`-style meta.
fn best_of(el: ElementRef<'_>) -> ExtractResult<String> {
    let meta = text(require(el, selector!("div.matchMeta"), "div.matchMeta")?);
    Ok(meta.chars().last().map(String::from).unwrap_or_default())
}

/// Live and upcoming matches from `/matches`.
///
/// Upcoming matches come from the first `days` day sections. Matches rated
/// below `min_rating` stars are skipped.
pub fn extract_matches(
    doc: &Document,
    days: usize,
    min_rating: u8,
    live: bool,
    future: bool,
) -> ExtractResult<Vec<UpcomingMatch>> {
    let root = doc.html().root_element();
    let mut matches = Vec::new();

    if live {
        for div in root.select(selector!("div.liveMatch-container")) {
            let rating = star_rating(div);
            if rating < min_rating {
                continue;
            }
            let (team1, team2) = team_names(div);
            matches.push(UpcomingMatch {
                id: attr_u64(div, "data-scorebot-id"),
                date: "LIVE".to_string(),
                time: "LIVE".to_string(),
                team1,
                team2,
                team1_id: attr_u64(div, "team1"),
                team2_id: attr_u64(div, "team2"),
                maps: best_of(div)?,
                rating,
                event: event_name(div),
            });
        }
    }

    if future {
        for section in root.select(selector!("div.upcomingMatchesSection")).take(days) {
            let headline = text(require(
                section,
                selector!("span.matchDayHeadline"),
                "span.matchDayHeadline",
            )?);
            let day = headline.split_whitespace().last().unwrap_or_default().to_string();

            for m in section.select(selector!("div.upcomingMatch")) {
                let rating = star_rating(m);
                if rating < min_rating {
                    continue;
                }
                let time = text(require(m, selector!("div.matchTime"), "div.matchTime")?);
                let (date, time) =
                    match NaiveDateTime::parse_from_str(&format!("{day}/{time}"), "%Y-%m-%d/%H:%M") {
                        Ok(dt) => (dt.format("%d-%m-%Y").to_string(), dt.format("%H:%M").to_string()),
                        Err(_) => (day.clone(), time),
                    };
                let (team1, team2) = team_names(m);
                matches.push(UpcomingMatch {
                    id: first(m, selector!("a[href]"))
                        .and_then(|a| attr(a, "href"))
                        .and_then(|h| href_id(h, 2))
                        .unwrap_or(0),
                    date,
                    time,
                    team1,
                    team2,
                    team1_id: attr_u64(m, "team1"),
                    team2_id: attr_u64(m, "team2"),
                    maps: best_of(m)?,
                    rating,
                    event: event_name(m),
                });
            }
        }
    }

    debug!(count = matches.len(), "Extracted matches");
    Ok(matches)
}

fn match_status(countdown: &str) -> MatchStatus {
    match countdown {
        "Match over" => MatchStatus::Over,
        "LIVE" => MatchStatus::Live,
        other => MatchStatus::Upcoming {
            starts_in_secs: countdown_seconds(other),
            countdown: other.to_string(),
        },
    }
}

fn map_results(root: ElementRef<'_>, team1: &str, team2: &str) -> ExtractResult<Vec<MapResult>> {
    let mut maps = Vec::new();
    for holder in root.select(selector!("div.mapholder")) {
        let name = text(require(holder, selector!("div.mapname"), "div.mapname")?);
        let mut score1 = "0".to_string();
        let mut score2 = "0".to_string();
        let mut pick = None;
        if name != "TBA" {
            let scores: Vec<String> = holder
                .select(selector!("div.results-team-score"))
                .map(text)
                .collect();
            if let [s1, s2, ..] = scores.as_slice() {
                score1 = s1.clone();
                score2 = s2.clone();
            }
            if first(holder, selector!(".results-left")).is_some_and(|el| has_class(el, "pick")) {
                pick = Some(team1.to_string());
            } else if first(holder, selector!(".results-right")).is_some_and(|el| has_class(el, "pick")) {
                pick = Some(team2.to_string());
            }
        }
        maps.push(MapResult {
            name,
            score1,
            score2,
            pick,
        });
    }
    Ok(maps)
}

/// Series score while live: a map counts once a side passed 12 rounds and
/// leads. A single-map series reports the round score instead.
fn live_series_score(maps: &[MapResult]) -> (u32, u32) {
    let (mut score1, mut score2) = (0, 0);
    for map in maps {
        let (Ok(s1), Ok(s2)) = (map.score1.parse::<u32>(), map.score2.parse::<u32>()) else {
            continue;
        };
        if (s1 > 12 && s1 > s2) || (s2 > 12 && s2 > s1) {
            if maps.len() == 1 {
                return (s1, s2);
            }
            if s1 > s2 {
                score1 += 1;
            } else {
                score2 += 1;
            }
        }
    }
    (score1, score2)
}

fn player_stats(root: ElementRef<'_>) -> ExtractResult<Vec<PlayerStat>> {
    let mut stats = Vec::new();
    for table in root.select(selector!("table.totalstats")).take(2) {
        for row in table.select(selector!("tr")).skip(1) {
            let link = require(row, selector!("a.flagAlign"), "a.flagAlign")?;
            let href = require_attr(link, "a.flagAlign", "href")?;
            let full_name = text(require(row, selector!("div.statsPlayerName"), "div.statsPlayerName")?);
            let nickname = match NICKNAME.captures(&full_name).and_then(|c| c.get(1)) {
                Some(nick) => nick.as_str().to_string(),
                None => full_name.clone(),
            };
            stats.push(PlayerStat {
                id: href_id(href, 2).unwrap_or(0),
                nickname,
                kd: text(require(row, selector!("td.kd"), "td.kd")?),
                adr: text(require(row, selector!("td.adr"), "td.adr")?),
                rating: text(require(row, selector!("td.rating"), "td.rating")?),
            });
        }
    }
    Ok(stats)
}

/// Details of `/matches/{id}/..`.
pub fn extract_match_info(
    doc: &Document,
    id: u64,
    team1: &str,
    team2: &str,
) -> ExtractResult<MatchInfo> {
    let root = doc.html().root_element();
    let status = match_status(&text(require(root, selector!("div.countdown"), "div.countdown")?));
    let maps = map_results(root, team1, team2)?;

    let (score1, score2) = match status {
        MatchStatus::Over => {
            // The final series score is the last character of each team box.
            let digits: Vec<u32> = root
                .select(selector!("div.team"))
                .take(2)
                .map(|el| {
                    raw_text(el)
                        .replace('\n', "")
                        .trim_end()
                        .chars()
                        .last()
                        .and_then(|c| c.to_digit(10))
                        .unwrap_or(0)
                })
                .collect();
            match digits.as_slice() {
                [a, b] => (*a, *b),
                _ => return Err(ExtractError::MissingElement("div.team")),
            }
        }
        MatchStatus::Live => live_series_score(&maps),
        MatchStatus::Upcoming { .. } => (0, 0),
    };

    let stats = if status == MatchStatus::Over {
        player_stats(root)?
    } else {
        Vec::new()
    };

    let predictions: Vec<String> = first(root, selector!("div.pick-a-winner"))
        .map(|panel| panel.select(selector!("div.percentage")).map(text).collect())
        .unwrap_or_default();

    Ok(MatchInfo {
        id,
        team1: team1.to_string(),
        team2: team2.to_string(),
        status,
        score1,
        score2,
        maps,
        stats,
        predict1: predictions.first().cloned(),
        predict2: predictions.get(1).cloned(),
    })
}

fn result_row(a: ElementRef<'_>, date: Option<String>, featured: bool) -> ExtractResult<MatchResult> {
    let mut teams = a.select(selector!("td.team-cell")).map(text);
    let team1 = teams.next().unwrap_or_else(|| TBD.to_string());
    let team2 = teams.next().unwrap_or_else(|| TBD.to_string());
    let (score1, score2) = split_score(&text(require(
        a,
        selector!("td.result-score"),
        "td.result-score",
    )?));
    Ok(MatchResult {
        id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
        date,
        team1,
        team2,
        score1,
        score2,
        rating: a.select(selector!("i.star")).count() as u8,
        event: first_text(a, selector!("span.event-name")).unwrap_or_default(),
        featured,
    })
}

/// Results from `/results`.
///
/// Featured results are listed first. Regular results come from the first
/// `days` dated sections, at most `max` of them, filtered by `min_rating`.
pub fn extract_results(
    doc: &Document,
    days: usize,
    min_rating: u8,
    max: usize,
    featured: bool,
    regular: bool,
) -> ExtractResult<Vec<MatchResult>> {
    let root = doc.html().root_element();
    let mut results = Vec::new();

    if featured {
        if let Some(big) = first(root, selector!("div.big-results")) {
            for a in big.select(selector!("a.a-reset")) {
                results.push(result_row(a, None, true)?);
            }
        }
    }

    if regular {
        let mut n = 0;
        // The first sublist mirrors the featured block.
        'days: for section in root.select(selector!("div.results-sublist")).skip(1).take(days) {
            let date = first_text(section, selector!("span.standard-headline"))
                .and_then(|h| normalize_long_date(&h));
            for a in section.select(selector!("a.a-reset")) {
                if attr(a, "href") == Some("/forums") || n >= max {
                    break 'days;
                }
                if (a.select(selector!("i.star")).count() as u8) < min_rating {
                    continue;
                }
                results.push(result_row(a, date.clone(), false)?);
                n += 1;
            }
        }
    }

    debug!(count = results.len(), "Extracted results");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHES_PAGE: &str = r#"<html><body>
      <div class="liveMatch-container" stars="2" data-scorebot-id="2370001" team1="4608" team2="6667">
        <div class="matchTeamName text-ellipsis">Natus Vincere</div>
        <div class="matchTeamName text-ellipsis">FaZe</div>
        <div class="matchMeta">bo3</div>
        <div class="matchEventName gtSmartphone-only">BLAST Premier</div>
      </div>
      <div class="liveMatch-container" stars="0" data-scorebot-id="2370002" team1="1" team2="2">
        <div class="matchTeamName text-ellipsis">Low</div>
        <div class="matchTeamName text-ellipsis">Rated</div>
        <div class="matchMeta">bo1</div>
      </div>
      <div class="upcomingMatchesSection">
        <span class="matchDayHeadline">Monday - 2024-09-23</span>
        <div class="upcomingMatch" stars="1" team1="5995" team2="9565">
          <a href="/matches/2370100/g2-vs-vitality-blast"><div class="matchTime">18:30</div></a>
          <div class="matchMeta">bo3</div>
          <div class="matchTeamName text-ellipsis">G2</div>
          <div class="matchTeamName text-ellipsis">Vitality</div>
          <span class="line-clamp-3">BLAST Fall</span>
        </div>
        <div class="upcomingMatch" stars="1">
          <a href="/matches/2370101/tbd-vs-tbd"><div class="matchTime">21:00</div></a>
          <div class="matchMeta">bo5</div>
        </div>
      </div>
      <div class="upcomingMatchesSection">
        <span class="matchDayHeadline">Tuesday - 2024-09-24</span>
        <div class="upcomingMatch" stars="3">
          <a href="/matches/2370200/x"><div class="matchTime">10:00</div></a>
          <div class="matchMeta">bo1</div>
        </div>
      </div>
    </body></html>"#;

    #[test]
    fn live_and_upcoming_matches() {
        let doc = Document::parse(MATCHES_PAGE);
        let matches = extract_matches(&doc, 1, 1, true, true).unwrap();
        assert_eq!(matches.len(), 3);

        let live = &matches[0];
        assert_eq!(live.id, 2370001);
        assert_eq!((live.date.as_str(), live.time.as_str()), ("LIVE", "LIVE"));
        assert_eq!((live.team1_id, live.team2_id), (4608, 6667));
        assert_eq!(live.maps, "3");
        assert_eq!(live.event, "BLAST Premier");

        let upcoming = &matches[1];
        assert_eq!(upcoming.id, 2370100);
        assert_eq!(upcoming.date, "23-09-2024");
        assert_eq!(upcoming.time, "18:30");
        assert_eq!(upcoming.team1, "G2");
        assert_eq!(upcoming.event, "BLAST Fall");

        let tbd = &matches[2];
        assert_eq!((tbd.team1.as_str(), tbd.team2.as_str()), ("TBD", "TBD"));
        assert_eq!((tbd.team1_id, tbd.team2_id), (0, 0));
        assert_eq!(tbd.maps, "5");
    }

    #[test]
    fn days_and_flags_limit_sections() {
        let doc = Document::parse(MATCHES_PAGE);
        let future_only = extract_matches(&doc, 2, 0, false, true).unwrap();
        assert_eq!(future_only.len(), 3);
        assert!(future_only.iter().all(|m| m.date != "LIVE"));

        let live_only = extract_matches(&doc, 5, 0, true, false).unwrap();
        assert_eq!(live_only.len(), 2);
    }

    #[test]
    fn missing_meta_is_structural() {
        let doc = Document::parse(
            r#"<div class="liveMatch-container" stars="1"><div class="matchTeamName">A</div></div>"#,
        );
        assert_eq!(
            extract_matches(&doc, 1, 0, true, false).unwrap_err(),
            ExtractError::MissingElement("div.matchMeta")
        );
    }

    const MATCH_OVER: &str = r#"<html><body>
      <div class="team"><div class="team1-gradient">G2
        <div class="won">2</div></div></div>
      <div class="team"><div class="team2-gradient">Vitality
        <div class="lost">1</div></div></div>
      <div class="countdown">Match over</div>
      <div class="mapholder">
        <div class="mapname">Mirage</div>
        <div class="results-left pick"><div class="results-team-score">13</div></div>
        <span class="results-right"><div class="results-team-score">8</div></span>
      </div>
      <div class="mapholder">
        <div class="mapname">Nuke</div>
        <div class="results-left"><div class="results-team-score">10</div></div>
        <span class="results-right pick"><div class="results-team-score">13</div></span>
      </div>
      <div class="mapholder"><div class="mapname">TBA</div></div>
      <table class="table totalstats">
        <tr><th>Player</th></tr>
        <tr>
          <td><a class="flagAlign" href="/player/11893/zywoo"><div class="statsPlayerName">Mathieu 'ZywOo' Herbaut</div></a></td>
          <td class="kd">45-30</td><td class="adr">95.1</td><td class="rating">1.45</td>
        </tr>
      </table>
      <div class="standard-box pick-a-winner">
        <div class="percentage">61%</div><div class="percentage">39%</div>
      </div>
    </body></html>"#;

    #[test]
    fn finished_match_info() {
        let doc = Document::parse(MATCH_OVER);
        let info = extract_match_info(&doc, 2370100, "G2", "Vitality").unwrap();
        assert_eq!(info.status, MatchStatus::Over);
        assert_eq!((info.score1, info.score2), (2, 1));
        assert_eq!(info.maps.len(), 3);
        assert_eq!(info.maps[0].pick.as_deref(), Some("G2"));
        assert_eq!(info.maps[1].pick.as_deref(), Some("Vitality"));
        assert_eq!((info.maps[1].score1.as_str(), info.maps[1].score2.as_str()), ("10", "13"));
        assert_eq!(info.maps[2].score1, "0");
        assert_eq!(info.maps[2].pick, None);
        assert_eq!(info.stats.len(), 1);
        assert_eq!(info.stats[0].id, 11893);
        assert_eq!(info.stats[0].nickname, "ZywOo");
        assert_eq!(info.stats[0].kd, "45-30");
        assert_eq!(info.predict1.as_deref(), Some("61%"));
        assert_eq!(info.predict2.as_deref(), Some("39%"));
    }

    #[test]
    fn live_match_score_counts_decided_maps() {
        let doc = Document::parse(
            r#"<div class="countdown">LIVE</div>
            <div class="mapholder"><div class="mapname">Inferno</div>
              <div class="results-left"><div class="results-team-score">13</div></div>
              <span class="results-right"><div class="results-team-score">5</div></span></div>
            <div class="mapholder"><div class="mapname">Ancient</div>
              <div class="results-left"><div class="results-team-score">7</div></div>
              <span class="results-right"><div class="results-team-score">4</div></span></div>"#,
        );
        let info = extract_match_info(&doc, 1, "A", "B").unwrap();
        assert_eq!(info.status, MatchStatus::Live);
        assert_eq!((info.score1, info.score2), (1, 0));
        assert!(info.stats.is_empty());
    }

    #[test]
    fn upcoming_match_reads_countdown() {
        let doc = Document::parse(r#"<div class="countdown">1h : 30m : 0s</div>"#);
        let info = extract_match_info(&doc, 1, "A", "B").unwrap();
        assert_eq!(
            info.status,
            MatchStatus::Upcoming {
                starts_in_secs: Some(5400),
                countdown: "1h : 30m : 0s".to_string()
            }
        );
        assert!(info.maps.is_empty());
    }

    #[test]
    fn match_page_without_countdown_is_structural() {
        let doc = Document::parse("<html><body><p>nothing</p></body></html>");
        assert!(matches!(
            extract_match_info(&doc, 1, "A", "B"),
            Err(ExtractError::MissingElement("div.countdown"))
        ));
    }

    const RESULTS_PAGE: &str = r#"<html><body>
      <div class="big-results">
        <a class="a-reset" href="/matches/1000/a-vs-b">
          <table><tr><td class="team-cell">Alpha</td><td class="result-score">2 - 0</td><td class="team-cell">Beta</td></tr></table>
          <i class="fa fa-star star"></i><i class="fa fa-star star"></i>
          <span class="event-name">Major</span>
        </a>
      </div>
      <div class="results-sublist"><span class="standard-headline">Featured</span></div>
      <div class="results-sublist">
        <span class="standard-headline">Results for September 22nd 2024</span>
        <a class="a-reset" href="/matches/1001/c-vs-d">
          <table><tr><td class="team-cell">Gamma</td><td class="result-score">16 - 14</td><td class="team-cell">Delta</td></tr></table>
          <span class="event-name">Qualifier</span>
        </a>
        <a class="a-reset" href="/matches/1002/e-vs-f">
          <table><tr><td class="team-cell">Eps</td><td class="result-score">1 - 2</td><td class="team-cell">Zeta</td></tr></table>
          <i class="fa fa-star star"></i>
          <span class="event-name">League</span>
        </a>
        <a class="a-reset" href="/forums">forums</a>
      </div>
      <div class="results-sublist">
        <span class="standard-headline">Results for September 21st 2024</span>
        <a class="a-reset" href="/matches/1003/g-vs-h">
          <table><tr><td class="team-cell">Eta</td><td class="result-score">2 - 1</td><td class="team-cell">Theta</td></tr></table>
        </a>
      </div>
    </body></html>"#;

    #[test]
    fn featured_and_dated_results() {
        let doc = Document::parse(RESULTS_PAGE);
        let results = extract_results(&doc, 2, 0, 30, true, true).unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        // The forums link ends the listing.
        assert_eq!(ids, vec![1000, 1001, 1002]);

        let featured = &results[0];
        assert!(featured.featured);
        assert_eq!(featured.rating, 2);
        assert_eq!((featured.score1.as_str(), featured.score2.as_str()), ("2", "0"));
        assert_eq!(featured.event, "Major");

        let regular = &results[1];
        assert_eq!(regular.date.as_deref(), Some("22-09-2024"));
        assert_eq!((regular.team1.as_str(), regular.team2.as_str()), ("Gamma", "Delta"));
        assert_eq!((regular.score1.as_str(), regular.score2.as_str()), ("16", "14"));
    }

    #[test]
    fn results_respect_rating_and_cap() {
        let doc = Document::parse(RESULTS_PAGE);
        let rated = extract_results(&doc, 2, 1, 30, false, true).unwrap();
        assert_eq!(rated.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1002]);

        let capped = extract_results(&doc, 2, 0, 1, false, true).unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, 1001);
    }

    #[test]
    fn oversized_countdown_keeps_text_without_seconds() {
        assert_eq!(
            match_status("999999999999999999d : 2h"),
            MatchStatus::Upcoming {
                starts_in_secs: None,
                countdown: "999999999999999999d : 2h".to_string(),
            }
        );
        assert_eq!(match_status("LIVE"), MatchStatus::Live);
    }
}
