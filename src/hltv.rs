//! The public client.
//!
//! [`Hltv`] builds the URL for each logical request, fetches it through the
//! shared [`FetchEngine`], and runs the matching extractor on the parser's
//! worker pool. Every accessor returns `Result<Option<T>>`:
//!
//! - `Ok(Some(record))`: the page was fetched and extracted (possibly empty);
//! - `Ok(None)`: retries were exhausted, the page is unavailable;
//! - `Err(HltvError::Parsing(_))`: the page arrived but had the wrong shape.

use crate::config::FetchConfig;
use crate::error::{ExtractError, HltvError, Result};
use crate::extract::{events, matches, news, players, teams};
use crate::fetch::{Document, FetchEngine, ReqwestTransport, Transport};
use crate::models::{
    EventInfo, EventMatch, EventResult, EventSummary, MatchInfo, MatchResult, NewsDay,
    PlayerInfo, RankedPlayer, RankedTeam, TeamInfo, UpcomingMatch,
};
use crate::utils::{last_monday, ranking_path, truncate_for_log, url_slug};
use chrono::{Datelike, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Client for the site's match, event, team, player and news pages.
pub struct Hltv<T: Transport = ReqwestTransport> {
    engine: Arc<FetchEngine<T>>,
    base: Url,
}

impl Hltv<ReqwestTransport> {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(cfg)?;
        Self::with_transport(cfg, transport)
    }
}

impl<T: Transport> Clone for Hltv<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            base: self.base.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for Hltv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hltv")
            .field("base", &self.base.as_str())
            .field("engine", &self.engine)
            .finish()
    }
}

impl<T: Transport + 'static> Hltv<T> {
    pub fn with_transport(cfg: &FetchConfig, transport: T) -> Result<Self> {
        let base = Url::parse(&cfg.base_url)?;
        let engine = FetchEngine::with_transport(cfg, transport)?;
        Ok(Self {
            engine: Arc::new(engine),
            base,
        })
    }

    pub fn engine(&self) -> &FetchEngine<T> {
        &self.engine
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Fetch `url` and hand the document to `extract` on a parse worker.
    async fn scrape<R, F>(&self, url: Url, extract: F) -> Result<Option<R>>
    where
        F: FnOnce(&Document) -> std::result::Result<R, ExtractError> + Send + 'static,
        R: Send + 'static,
    {
        let Some(doc) = self.engine.fetch(url.as_str()).await else {
            return Ok(None);
        };
        let extracted = self
            .engine
            .parser()
            .run_blocking(move || {
                extract(&doc).map_err(|e| (e, truncate_for_log(&doc.markup(), 300)))
            })
            .await?;
        match extracted {
            Ok(record) => Ok(Some(record)),
            Err((e, preview)) => {
                error!(
                    %url,
                    error = %e,
                    page_preview = %preview,
                    "Parsing error, page likely incomplete"
                );
                Err(HltvError::Parsing(e))
            }
        }
    }

    /// Live and upcoming matches for the next `days` days.
    #[instrument(level = "info", skip(self))]
    pub async fn get_matches(
        &self,
        days: usize,
        min_rating: u8,
        live: bool,
        future: bool,
    ) -> Result<Option<Vec<UpcomingMatch>>> {
        let url = self.url("/matches")?;
        self.scrape(url, move |doc| {
            matches::extract_matches(doc, days, min_rating, live, future)
        })
        .await
    }

    /// Details of a single match. The team and event names form the URL slug.
    #[instrument(level = "info", skip(self))]
    pub async fn get_match_info(
        &self,
        id: u64,
        team1: &str,
        team2: &str,
        event_title: &str,
    ) -> Result<Option<MatchInfo>> {
        let url = self.url(&format!(
            "/matches/{id}/{}-vs-{}-{}",
            url_slug(team1),
            url_slug(team2),
            url_slug(event_title)
        ))?;
        let (team1, team2) = (team1.to_string(), team2.to_string());
        self.scrape(url, move |doc| {
            matches::extract_match_info(doc, id, &team1, &team2)
        })
        .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_results(
        &self,
        days: usize,
        min_rating: u8,
        max: usize,
        featured: bool,
        regular: bool,
    ) -> Result<Option<Vec<MatchResult>>> {
        let url = self.url("/results")?;
        self.scrape(url, move |doc| {
            matches::extract_results(doc, days, min_rating, max, featured, regular)
        })
        .await
    }

    /// Ongoing events and up to `max` upcoming big events.
    #[instrument(level = "info", skip(self))]
    pub async fn get_events(
        &self,
        ongoing: bool,
        future: bool,
        max: usize,
    ) -> Result<Option<Vec<EventSummary>>> {
        let url = self.url("/events")?;
        self.scrape(url, move |doc| events::extract_events(doc, ongoing, future, max))
            .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_featured_events(&self, max: usize) -> Result<Option<Vec<EventSummary>>> {
        let url = self.url("/events")?;
        self.scrape(url, move |doc| events::extract_featured_events(doc, max))
            .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_event_info(&self, id: u64, title: &str) -> Result<Option<EventInfo>> {
        let url = self.url(&format!("/events/{id}/{}", url_slug(title)))?;
        let title = title.to_string();
        let now = Utc::now().naive_utc();
        self.scrape(url, move |doc| {
            events::extract_event_info(doc, id, &title, now)
        })
        .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_event_matches(&self, id: u64) -> Result<Option<Vec<EventMatch>>> {
        let url = self.url(&format!("/events/{id}/matches"))?;
        self.scrape(url, events::extract_event_matches).await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_event_results(
        &self,
        id: u64,
        days: usize,
        max: usize,
    ) -> Result<Option<Vec<EventResult>>> {
        let url = self.url(&format!("/results?event={id}"))?;
        self.scrape(url, move |doc| events::extract_event_results(doc, days, max))
            .await
    }

    /// Team ranking published on the Monday on or before `day` (today when `None`).
    #[instrument(level = "info", skip(self))]
    pub async fn get_top_teams(
        &self,
        max: usize,
        day: Option<NaiveDate>,
    ) -> Result<Option<Vec<RankedTeam>>> {
        let day = day.unwrap_or_else(|| Utc::now().date_naive());
        let url = self.url(&format!("/ranking/teams/{}", ranking_path(last_monday(day))))?;
        self.scrape(url, move |doc| teams::extract_top_teams(doc, max))
            .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_team_info(&self, id: u64, title: &str) -> Result<Option<TeamInfo>> {
        let url = self.url(&format!("/team/{id}/{}", url_slug(title)))?;
        let title = title.to_string();
        self.scrape(url, move |doc| teams::extract_team_info(doc, id, &title))
            .await
    }

    /// Fetch several team pages concurrently, at most one per parse worker
    /// in flight. Teams that are unavailable or fail to parse are skipped.
    /// Output order is completion order.
    #[instrument(level = "info", skip_all, fields(count = ids.len()))]
    pub async fn get_team_infos(&self, ids: &[(u64, String)]) -> Vec<TeamInfo> {
        let width = self.engine.parser().workers();
        let teams: Vec<TeamInfo> = stream::iter(ids.iter())
            .map(|(id, title)| async move {
                match self.get_team_info(*id, title).await {
                    Ok(Some(team)) => Some(team),
                    Ok(None) => {
                        warn!(id, %title, "Team page unavailable");
                        None
                    }
                    Err(e) => {
                        warn!(id, %title, error = %e, "Team page skipped");
                        None
                    }
                }
            })
            .buffer_unordered(width)
            .filter_map(std::future::ready)
            .collect()
            .await;

        info!(requested = ids.len(), fetched = teams.len(), "Fetched team pages");
        teams
    }

    /// Top players of the Top-20 ranking filter for `year` (current year when `None`).
    #[instrument(level = "info", skip(self))]
    pub async fn get_top_players(
        &self,
        max: usize,
        year: Option<i32>,
    ) -> Result<Option<Vec<RankedPlayer>>> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let url = self.url(&format!(
            "/stats/players?startDate={year}-01-01&endDate={year}-12-31&rankingFilter=Top20"
        ))?;
        self.scrape(url, move |doc| players::extract_top_players(doc, max))
            .await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_player_info(&self, id: u64, nickname: &str) -> Result<Option<PlayerInfo>> {
        let url = self.url(&format!("/player/{id}/{}", url_slug(nickname)))?;
        let nickname = nickname.to_string();
        self.scrape(url, move |doc| {
            players::extract_player_info(doc, id, &nickname)
        })
        .await
    }

    /// Front page news grouped by day.
    #[instrument(level = "info", skip(self))]
    pub async fn get_last_news(
        &self,
        max_regular: usize,
        only_today: bool,
        only_featured: bool,
    ) -> Result<Option<Vec<NewsDay>>> {
        let url = self.url("/")?;
        let today = Utc::now().date_naive();
        self.scrape(url, move |doc| {
            news::extract_news(doc, max_regular, only_today, only_featured, today)
        })
        .await
    }

    /// Release pooled connections. Later calls reopen them.
    pub async fn close(&self) {
        self.engine.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{StubTransport, quiet_config};

    const RANKING: &str = r#"<html><body>
      <div class="ranked-team standard-box">
        <span class="position">#1</span>
        <div class="teamLine"><span class="name">Vitality</span><span class="points">(1000 points)</span></div>
        <a class="details moreLink" href="/team/9565/vitality">Details</a>
      </div></body></html>"#;

    const TEAM_PAGE: &str = r#"<html><body>
      <div class="bodyshot-team g-grid"><a href="/player/11893/zywoo"><span class="bold">ZywOo</span></a></div>
      <div class="profile-team-stat"><a href="/ranking/teams">#1</a></div>
      </body></html>"#;

    const NEWS_PAGE: &str = r#"<html><body><div class="standard-box standard-list">
      <a class="newsline article" href="/news/40002/roster-move">
        <div class="newstext">Roster move</div><div class="newsrecent">2 hours ago</div>
      </a></div></body></html>"#;

    fn client(stub: StubTransport) -> Hltv<StubTransport> {
        Hltv::with_transport(&quiet_config(3), stub).unwrap()
    }

    #[tokio::test]
    async fn top_teams_use_monday_ranking_url() {
        let hltv = client(StubTransport::routes(vec![(
            "/ranking/teams/2024/september/16",
            RANKING.to_string(),
        )]));
        let day = NaiveDate::from_ymd_opt(2024, 9, 19).unwrap();
        let teams = hltv.get_top_teams(30, Some(day)).await.unwrap().unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, 9565);
        assert_eq!(
            hltv.engine().transport().requests()[0].url,
            "https://www.hltv.org/ranking/teams/2024/september/16"
        );
    }

    #[tokio::test]
    async fn match_url_slugs_names() {
        let hltv = client(StubTransport::always(404, ""));
        let info = hltv
            .get_match_info(2375000, "Natus Vincere", "G2", "IEM Cologne 2024")
            .await
            .unwrap();
        assert!(info.is_none());
        assert_eq!(
            hltv.engine().transport().requests()[0].url,
            "https://www.hltv.org/matches/2375000/Natus-Vincere-vs-G2-IEM-Cologne-2024"
        );
    }

    #[tokio::test]
    async fn exhausted_fetch_is_absent_not_error() {
        let hltv = client(StubTransport::always(403, ""));
        assert!(hltv.get_player_info(11893, "ZywOo").await.unwrap().is_none());
        assert_eq!(hltv.engine().transport().calls(), 2);
    }

    #[tokio::test]
    async fn wrong_page_shape_is_parsing_error() {
        let hltv = client(StubTransport::always(200, "<html><body><p>maintenance</p></body></html>"));
        let err = hltv.get_top_teams(30, None).await.unwrap_err();
        assert!(err.is_parsing());
    }

    #[tokio::test]
    async fn empty_page_is_some_empty() {
        let hltv = client(StubTransport::always(200, "<html><body></body></html>"));
        let news = hltv.get_last_news(5, false, false).await.unwrap();
        assert_eq!(news, Some(Vec::new()));
    }

    #[tokio::test]
    async fn news_reads_front_page() {
        let hltv = client(StubTransport::always(200, NEWS_PAGE));
        let news = hltv.get_last_news(5, true, false).await.unwrap().unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].news[0].id, 40002);
        assert_eq!(hltv.engine().transport().requests()[0].url, "https://www.hltv.org/");
    }

    #[tokio::test]
    async fn player_stats_url_spans_year() {
        let hltv = client(StubTransport::always(404, ""));
        assert!(hltv.get_top_players(40, Some(2023)).await.unwrap().is_none());
        assert_eq!(
            hltv.engine().transport().requests()[0].url,
            "https://www.hltv.org/stats/players?startDate=2023-01-01&endDate=2023-12-31&rankingFilter=Top20"
        );
    }

    #[tokio::test]
    async fn team_fan_out_skips_failures() {
        let hltv = client(StubTransport::routes(vec![
            ("/team/9565/", TEAM_PAGE.to_string()),
            ("/team/4608/", "<html><body></body></html>".to_string()),
        ]));
        let ids = vec![
            (9565, "Vitality".to_string()),
            (4608, "Natus Vincere".to_string()),
            (1, "Missing".to_string()),
        ];
        let teams = hltv.get_team_infos(&ids).await;
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].title, "Vitality");
        assert_eq!(teams[0].rank, 1);
    }

    #[tokio::test]
    async fn event_results_url_carries_event_query() {
        let hltv = client(StubTransport::always(404, ""));
        hltv.get_event_results(7148, 1, 10).await.unwrap();
        hltv.get_event_matches(7148).await.unwrap();
        hltv.get_event_info(7148, "BLAST Premier Fall Final").await.unwrap();
        let urls: Vec<String> = hltv
            .engine()
            .transport()
            .requests()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert!(urls.contains(&"https://www.hltv.org/results?event=7148".to_string()));
        assert!(urls.contains(&"https://www.hltv.org/events/7148/matches".to_string()));
        assert!(urls.contains(&"https://www.hltv.org/events/7148/BLAST-Premier-Fall-Final".to_string()));
    }

    #[tokio::test]
    async fn close_reaches_transport() {
        let hltv = client(StubTransport::always(404, ""));
        hltv.close().await;
        assert_eq!(hltv.engine().transport().closes(), 1);
    }
}
