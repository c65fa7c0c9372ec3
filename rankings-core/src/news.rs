//! News Discovery (C3): finds outbound ranking URLs by following the
//! institution's announcements feed.

use scraper::Selector;
use tracing::error;
use url::Url;

use crate::constants::WEB_AVVISI_FUTURI_STUDENTI_URL;
use crate::error::Result;
use crate::fetch::Fetcher;

/// Closed vocabulary of title keywords that mark a news item as
/// ranking-relevant. Matched as a lowercased substring.
const NEWS_KEYWORDS: &[&str] = &[
    "graduatorie",
    "graduatoria",
    "punteggi",
    "tol",
    "immatricolazioni",
    "immatricolazione",
    "punteggio",
    "matricola",
    "nuovi studenti",
];

fn is_rankings_news(title: &str) -> bool {
    let lower = title.to_lowercase();
    NEWS_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// Scrapes the announcements page for ranking-relevant article links, then
/// follows each article for outbound ranking URLs on `ranking_host`.
pub async fn scrape_rankings_links(fetcher: &Fetcher, ranking_host: &str) -> Result<Vec<String>> {
    let card_link_selector =
        Selector::parse(".news .card a.btn").expect("selector literal is valid");

    let page = fetcher.get(WEB_AVVISI_FUTURI_STUDENTI_URL).await?;

    let news_links: Vec<String> = page
        .document
        .select(&card_link_selector)
        .filter_map(|el| {
            let title = el.attr("title").unwrap_or_default();
            let href = el.attr("href")?;
            is_rankings_news(title)
                .then(|| resolve(&page.final_url, href))
                .flatten()
                .map(|u| u.to_string())
        })
        .collect();

    let mut set = tokio::task::JoinSet::new();
    for link in news_links {
        let fetcher = fetcher.clone();
        let ranking_host = ranking_host.to_string();
        set.spawn(async move { scrape_article(&fetcher, &link, &ranking_host).await });
    }

    let mut rankings_links = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(mut links)) => rankings_links.append(&mut links),
            Ok(Err(e)) => error!(error = %e, "error while loading a news page, skipping"),
            Err(e) => error!(error = %e, "news article task panicked"),
        }
    }

    Ok(rankings_links)
}

async fn scrape_article(fetcher: &Fetcher, link: &str, ranking_host: &str) -> Result<Vec<String>> {
    let article_link_selector =
        Selector::parse(".news-text-wrap a").expect("selector literal is valid");

    let page = fetcher.get(link).await?;

    let links = page
        .document
        .select(&article_link_selector)
        .filter_map(|el| {
            let href = el.attr("href")?;
            let resolved = resolve(&page.final_url, href)?;
            (resolved.host_str() == Some(ranking_host)).then_some(resolved.to_string())
        })
        .collect();

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rankings_news_matches_any_keyword_case_insensitive() {
        assert!(is_rankings_news("Pubblicate le GRADUATORIE di ammissione"));
        assert!(is_rankings_news("nuovi Studenti immatricolati"));
        assert!(!is_rankings_news("Orari delle lezioni del primo semestre"));
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://www.polimi.it/futuri-studenti/avvisi").unwrap();
        let resolved = resolve(&base, "/news/foo").unwrap();
        assert_eq!(resolved.as_str(), "https://www.polimi.it/news/foo");
    }
}
