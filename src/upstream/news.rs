//! Google News RSS adapter.
//!
//! Fetches the Israel (English) edition or a search feed and reduces each
//! entry to title/link/published/source/summary. Google News titles carry
//! the publisher as a `Title - Source` suffix, which is split out; summary
//! HTML is stripped and capped.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::Serialize;

use super::UpstreamClient;
use crate::error::Result;

const MAX_ITEMS: usize = 20;
const SUMMARY_LIMIT: usize = 200;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<String>,
    pub source: Option<String>,
    pub summary: Option<String>,
}

impl UpstreamClient {
    /// Top headlines, or search results when `query` is given.
    pub async fn news_headlines(&self, query: Option<&str>) -> Result<Vec<NewsItem>> {
        let base = self.config().news_base_url.trim_end_matches('/');
        let url = match query {
            Some(q) => format!(
                "{}/rss/search?q={}&hl=en-IL&gl=IL&ceid=IL:en",
                base,
                urlencoding::encode(q)
            ),
            None => format!("{}/rss?hl=en-IL&gl=IL&ceid=IL:en", base),
        };

        let body = self.get_text(&url).await?;
        Ok(parse_feed(&body))
    }
}

/// Pull `<item>` entries out of an RSS document.
fn parse_feed(xml: &str) -> Vec<NewsItem> {
    #[derive(Default)]
    struct RawItem {
        title: String,
        link: String,
        published: String,
        summary: String,
    }

    enum Field {
        Title,
        Link,
        Published,
        Summary,
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => current = Some(RawItem::default()),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" if current.is_some() => field = Some(Field::Link),
                b"pubDate" if current.is_some() => field = Some(Field::Published),
                b"description" if current.is_some() => field = Some(Field::Summary),
                _ => field = None,
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(raw) = current.take() {
                        items.push(finish_item(raw.title, raw.link, raw.published, raw.summary));
                        if items.len() >= MAX_ITEMS {
                            break;
                        }
                    }
                }
                field = None;
            }
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field.as_ref()) {
                    if let Ok(text) = t.unescape() {
                        let target = match field {
                            Field::Title => &mut item.title,
                            Field::Link => &mut item.link,
                            Field::Published => &mut item.published,
                            Field::Summary => &mut item.summary,
                        };
                        target.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field.as_ref()) {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    let target = match field {
                        Field::Title => &mut item.title,
                        Field::Link => &mut item.link,
                        Field::Published => &mut item.published,
                        Field::Summary => &mut item.summary,
                    };
                    target.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    items
}

fn finish_item(title: String, link: String, published: String, summary: String) -> NewsItem {
    // Google News format: "Title - Source"
    let (title, source) = match title.rsplit_once(" - ") {
        Some((t, s)) => (t.to_string(), Some(s.to_string())),
        None => (title, None),
    };

    NewsItem {
        title,
        link: (!link.is_empty()).then_some(link),
        published: (!published.is_empty()).then_some(published),
        source,
        summary: clean_summary(&summary),
    }
}

/// Strip markup and cap the summary; whitespace-only summaries drop out.
fn clean_summary(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let stripped = TAG_RE.replace_all(raw, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > SUMMARY_LIMIT {
        let capped: String = trimmed.chars().take(SUMMARY_LIMIT).collect();
        Some(format!("{}...", capped))
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Google News</title>
  <item>
    <title>Heat wave continues - Example Times</title>
    <link>https://news.example/1</link>
    <pubDate>Tue, 04 Aug 2026 06:00:00 GMT</pubDate>
    <description>&lt;a href="x"&gt;Heat wave&lt;/a&gt; continues across the region</description>
  </item>
  <item>
    <title>Untitled wire item</title>
    <link>https://news.example/2</link>
  </item>
</channel></rss>"#;

    #[test]
    fn parses_items_and_splits_source() {
        let items = parse_feed(FEED);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Heat wave continues");
        assert_eq!(items[0].source.as_deref(), Some("Example Times"));
        assert_eq!(items[0].link.as_deref(), Some("https://news.example/1"));
        assert_eq!(
            items[0].summary.as_deref(),
            Some("Heat wave continues across the region")
        );
        assert_eq!(items[1].source, None);
        assert_eq!(items[1].summary, None);
    }

    #[test]
    fn malformed_feed_yields_empty() {
        assert!(parse_feed("this is not xml").is_empty());
    }

    #[test]
    fn long_summaries_are_capped() {
        let long = "x".repeat(500);
        let summary = clean_summary(&long).unwrap();
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT + 3);
    }
}
