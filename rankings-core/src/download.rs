//! Ranking Downloader (C4): recursively fetches a ranking's index page and
//! its three table families (by-merit, by-id, by-course).

use scraper::Selector;
use tracing::{debug, error};
use url::Url;

use crate::constants::{
    HTML_INDEX_SUFFIX_BY_COURSE, HTML_INDEX_SUFFIX_BY_ID, HTML_INDEX_SUFFIX_BY_MERIT,
};
use crate::fetch::Fetcher;

/// One fetched HTML page, keyed by the href it was found at.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub id: String,
    pub content: Vec<u8>,
}

/// Everything fetched for one ranking start URL.
#[derive(Debug, Clone, Default)]
pub struct HtmlRanking {
    pub id: String,
    pub url: String,
    pub index: Option<HtmlPage>,
    pub by_merit: Vec<HtmlPage>,
    pub by_id: Vec<HtmlPage>,
    pub by_course: Vec<HtmlPage>,
    pub page_count: usize,
}

impl HtmlRanking {
    /// A ranking the institution has since withdrawn: the index loaded but
    /// every sub-index is empty or unrecognized.
    pub fn is_broken(&self) -> bool {
        self.page_count == 0
    }
}

/// Downloads every start URL concurrently.
pub async fn download_rankings(fetcher: &Fetcher, start_urls: &[String]) -> Vec<HtmlRanking> {
    let mut set = tokio::task::JoinSet::new();
    for url in start_urls.iter().cloned() {
        let fetcher = fetcher.clone();
        set.spawn(async move { scrape_recursive_ranking_htmls(&fetcher, &url).await });
    }

    let mut out = Vec::with_capacity(start_urls.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(ranking) => out.push(ranking),
            Err(e) => error!(error = %e, "ranking download task panicked"),
        }
    }
    out
}

async fn scrape_recursive_ranking_htmls(fetcher: &Fetcher, starting_link: &str) -> HtmlRanking {
    let id = Url::parse(starting_link)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next().map(str::to_string)))
        .unwrap_or_default();

    debug!(starting_link, "start recursive download");

    let mut ranking = HtmlRanking {
        id: id.clone(),
        url: starting_link.to_string(),
        ..Default::default()
    };

    let page = match fetcher.get(starting_link).await {
        Ok(p) => p,
        Err(e) => {
            error!(url = starting_link, error = %e, "could not load ranking main page");
            return ranking;
        }
    };

    ranking.index = Some(HtmlPage {
        id: id.clone(),
        content: page.raw.clone(),
    });
    let mut count = 1;

    let titolo_selector = Selector::parse(".titolo a").expect("selector literal is valid");
    let index_hrefs: Vec<String> = page
        .document
        .select(&titolo_selector)
        .filter_map(|el| el.attr("href").map(str::to_string))
        .collect();

    for href in index_hrefs {
        let Some(link) = page.final_url.join(&href).ok().map(|u| u.to_string()) else {
            error!(href, "could not resolve ranking sub-index href");
            continue;
        };

        let sub_page = match fetcher.get(&link).await {
            Ok(p) => p,
            Err(e) => {
                error!(url = link, error = %e, "error while loading ranking sub-index page");
                continue;
            }
        };

        let pages = fetch_table_pages(fetcher, &sub_page.document, &sub_page.final_url).await;
        count += pages.len();

        // ByCourse MUST be tested before ById/ByMerit: ByMerit's suffix is a
        // prefix of ByCourse's.
        if href.ends_with(HTML_INDEX_SUFFIX_BY_COURSE) {
            debug!(href, "pattern matched index href with ByCourse");
            ranking.by_course = pages;
        } else if href.ends_with(HTML_INDEX_SUFFIX_BY_ID) {
            debug!(href, "pattern matched index href with ById");
            ranking.by_id = pages;
        } else if href.ends_with(HTML_INDEX_SUFFIX_BY_MERIT) {
            debug!(href, "pattern matched index href with ByMerit");
            ranking.by_merit = pages;
        } else {
            error!(index_href = href, index_url = link, "index not recognized, please investigate");
            continue;
        }
    }

    ranking.page_count = count;
    ranking
}

async fn fetch_table_pages(fetcher: &Fetcher, sub_index: &scraper::Html, base: &Url) -> Vec<HtmlPage> {
    let table_link_selector = Selector::parse(".TableDati td a").expect("selector literal is valid");
    let hrefs: Vec<String> = sub_index
        .select(&table_link_selector)
        .filter_map(|el| el.attr("href").map(str::to_string))
        .collect();

    let mut set = tokio::task::JoinSet::new();
    for href in hrefs {
        let Some(link) = base.join(&href).ok().map(|u| u.to_string()) else {
            continue;
        };
        let fetcher = fetcher.clone();
        set.spawn(async move {
            let result = fetcher.get(&link).await;
            (href, link, result)
        });
    }

    let mut pages = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((href, _link, Ok(page))) => pages.push(HtmlPage { id: href, content: page.raw }),
            Ok((href, link, Err(e))) => {
                error!(url = link, href, error = %e, "could not load ranking table page")
            }
            Err(e) => error!(error = %e, "table page fetch task panicked"),
        }
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_ranking_is_broken_when_page_count_zero() {
        let ranking = HtmlRanking {
            page_count: 0,
            ..Default::default()
        };
        assert!(ranking.is_broken());
    }

    #[test]
    fn test_html_ranking_not_broken_with_pages() {
        let ranking = HtmlRanking {
            page_count: 3,
            ..Default::default()
        };
        assert!(!ranking.is_broken());
    }
}
