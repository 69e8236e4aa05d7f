//! Front page news list.

use super::{ExtractResult, attr, first_text, has_class, selector};
use crate::fetch::Document;
use crate::models::{FeaturedNews, NewsDay, NewsItem};
use crate::utils::href_id;
use chrono::{Days, NaiveDate};
use tracing::debug;

/// Label of the `index`-th day block: today and yesterday as `DD-MM`, `old` afterwards.
fn day_label(index: usize, today: NaiveDate) -> String {
    match index {
        0 => today.format("%d-%m").to_string(),
        1 => today
            .checked_sub_days(Days::new(1))
            .unwrap_or(today)
            .format("%d-%m")
            .to_string(),
        _ => "old".to_string(),
    }
}

/// News grouped by day block.
///
/// At most `max_regular` non-featured items are returned across all blocks.
/// With `only_today` only the first block is read; with `only_featured` the
/// regular items are skipped.
pub fn extract_news(
    doc: &Document,
    max_regular: usize,
    only_today: bool,
    only_featured: bool,
    today: NaiveDate,
) -> ExtractResult<Vec<NewsDay>> {
    let root = doc.html().root_element();
    let mut days = Vec::new();
    let mut regular = 0usize;

    for (i, block) in root
        .select(selector!("div.standard-box.standard-list"))
        .enumerate()
    {
        let featured = block
            .select(selector!("a.newsline.article.featured"))
            .map(|a| FeaturedNews {
                id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
                title: first_text(a, selector!("div.featured-newstext")).unwrap_or_default(),
                description: first_text(a, selector!("div.featured-small-newstext"))
                    .unwrap_or_default(),
            })
            .collect();

        let mut news = Vec::new();
        if !only_featured {
            for a in block
                .select(selector!("a.newsline.article"))
                .filter(|a| !has_class(*a, "featured"))
            {
                if regular >= max_regular {
                    break;
                }
                news.push(NewsItem {
                    id: attr(a, "href").and_then(|h| href_id(h, 2)).unwrap_or(0),
                    title: first_text(a, selector!("div.newstext")).unwrap_or_default(),
                    posted: first_text(a, selector!("div.newsrecent")).unwrap_or_default(),
                });
                regular += 1;
            }
        }

        days.push(NewsDay {
            date: day_label(i, today),
            featured,
            news,
        });

        if only_today {
            break;
        }
    }

    debug!(days = days.len(), regular, "Extracted news");
    Ok(days)
}
