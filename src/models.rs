//! Records returned by the facade.
//!
//! Every record is plain data and serializes with `serde`. Missing optional
//! values degrade to sentinels instead of failing the record:
//!
//! - team names that are not decided yet are `"TBD"`
//! - unknown ids are `0`
//! - unknown prize pools and team counts are `"TBA"`
//! - an unknown coach is `"?"`

use serde::Serialize;

/// Placeholder for an undecided team.
pub const TBD: &str = "TBD";
/// Placeholder for an unannounced prize pool or team count.
pub const TBA: &str = "TBA";

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// A live or upcoming match from the matches page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingMatch {
    pub id: u64,
    /// `DD-MM-YYYY`, or `LIVE`.
    pub date: String,
    /// `HH:MM`, or `LIVE`.
    pub time: String,
    pub team1: String,
    pub team2: String,
    pub team1_id: u64,
    pub team2_id: u64,
    /// Last character of the match meta, e.g. `3` for `bo3`.
    pub maps: String,
    /// Star rating, 0 to 5.
    pub rating: u8,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchStatus {
    Over,
    Live,
    Upcoming {
        /// Seconds until the countdown reaches zero, when it could be read.
        starts_in_secs: Option<i64>,
        /// Raw countdown text.
        countdown: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapResult {
    pub name: String,
    pub score1: String,
    pub score2: String,
    /// Team that picked the map, if shown.
    pub pick: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStat {
    pub id: u64,
    pub nickname: String,
    pub kd: String,
    pub adr: String,
    pub rating: String,
}

/// Details of one match page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    pub id: u64,
    pub team1: String,
    pub team2: String,
    pub status: MatchStatus,
    /// Series score. Derived from finished maps while live.
    pub score1: u32,
    pub score2: u32,
    pub maps: Vec<MapResult>,
    /// Only filled once the match is over.
    pub stats: Vec<PlayerStat>,
    pub predict1: Option<String>,
    pub predict2: Option<String>,
}

/// A finished match from the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub id: u64,
    /// `DD-MM-YYYY`; featured results carry no date.
    pub date: Option<String>,
    pub team1: String,
    pub team2: String,
    pub score1: String,
    pub score2: String,
    pub rating: u8,
    pub event: String,
    pub featured: bool,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: u64,
    pub title: String,
    /// `D-M`
    pub start_date: String,
    /// `D-M`
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    Finished,
    Ongoing,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMvp {
    pub id: u64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// 1-based position in the placement list.
    pub place: u32,
    pub team: String,
    pub team_id: u64,
    pub prize: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTeam {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    pub id: u64,
    pub title: String,
    /// `DD-MM-YYYY`
    pub start: String,
    /// `DD-MM-YYYY`
    pub end: String,
    pub status: EventStatus,
    pub prize: String,
    pub team_count: String,
    pub location: String,
    /// Finished events only.
    pub mvp: Option<EventMvp>,
    /// Finished events only.
    pub placements: Vec<Placement>,
    /// Attending teams, for events that are not finished.
    pub teams: Vec<EventTeam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventMatch {
    pub id: u64,
    /// Day headline date, or `LIVE`.
    pub date: String,
    pub time: Option<String>,
    pub team1: String,
    pub team2: String,
    pub team1_id: u64,
    pub team2_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventResult {
    pub id: u64,
    pub date: Option<String>,
    pub team1: String,
    pub team2: String,
    pub score1: String,
    pub score2: String,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTeam {
    pub id: u64,
    pub rank: u32,
    pub title: String,
    pub points: u32,
    /// Movement since the last ranking, e.g. `+2`, `-1` or `-`.
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamPlayer {
    pub id: u64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamInfo {
    pub id: u64,
    pub title: String,
    /// 0 when unranked.
    pub rank: u32,
    pub players: Vec<TeamPlayer>,
    pub coach: String,
    pub average_age: String,
    pub weeks_in_top30: u32,
    pub logo: Option<String>,
    pub last_trophy: Option<String>,
    pub total_trophies: usize,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPlayer {
    pub id: u64,
    pub rank: u32,
    pub nickname: String,
    pub team: String,
    pub maps: u32,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub id: u64,
    pub nickname: String,
    pub team: Option<String>,
    pub team_id: u64,
    pub name: String,
    pub nationality: String,
    pub age: u32,
    pub rating: String,
    pub kpr: String,
    pub headshots: String,
    pub image: Option<String>,
    pub total_trophies: usize,
    pub last_trophy: Option<String>,
    pub total_mvp: u32,
    pub last_matches: Vec<u64>,
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturedNews {
    pub id: u64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub id: u64,
    pub title: String,
    /// Relative age as shown, e.g. `2 hours ago`.
    pub posted: String,
}

/// One day block of the front page news list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsDay {
    /// `DD-MM` for today and yesterday, `old` afterwards.
    pub date: String,
    pub featured: Vec<FeaturedNews>,
    pub news: Vec<NewsItem>,
}
