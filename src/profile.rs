// 🖼️ Player Profiles - image and blurb for a notification
// Lookups never fail the run: anything that goes wrong yields an empty profile.

use serde::Serialize;

/// Shown when a player page exists but has no picture of its own
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://liquipedia.net/commons/images/a/a4/PlayerImagePlaceholder.png";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub age: Option<u32>,
}

pub trait ProfileLookup {
    fn lookup(&self, handle: &str) -> Profile;
}

/// Lookup that knows nothing; messages go out without pictures
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProfiles;

impl ProfileLookup for NoProfiles {
    fn lookup(&self, _handle: &str) -> Profile {
        Profile::default()
    }
}

#[cfg(feature = "net")]
pub use liquipedia::{parse_profile_page, LiquipediaProfiles};

#[cfg(feature = "net")]
mod liquipedia {
    use super::{Profile, ProfileLookup, PLACEHOLDER_IMAGE_URL};
    use anyhow::{Context, Result};
    use regex::Regex;
    use scraper::{ElementRef, Html, Selector};
    use std::sync::OnceLock;
    use std::thread;
    use std::time::Duration;
    use tracing::debug;

    const PAGE_URL: &str = "https://liquipedia.net/valorant/";
    const TIMEOUT: Duration = Duration::from_secs(10);
    // Liquipedia asks for at most one page request per second
    const PAUSE: Duration = Duration::from_secs(1);

    pub struct LiquipediaProfiles {
        http: reqwest::blocking::Client,
        pause: Duration,
    }

    impl LiquipediaProfiles {
        pub fn new() -> Result<Self> {
            let http = reqwest::blocking::Client::builder()
                .user_agent(format!("roster-sync/{}", env!("CARGO_PKG_VERSION")))
                .timeout(TIMEOUT)
                .build()
                .context("Failed to create HTTP client")?;
            Ok(LiquipediaProfiles { http, pause: PAUSE })
        }

        fn fetch_page(&self, handle: &str) -> Result<String> {
            let url = format!("{PAGE_URL}{handle}");
            let body = self
                .http
                .get(&url)
                .send()
                .and_then(|r| r.error_for_status())
                .with_context(|| format!("Failed to fetch {url}"))?
                .text()?;
            Ok(body)
        }
    }

    impl ProfileLookup for LiquipediaProfiles {
        fn lookup(&self, handle: &str) -> Profile {
            let page = self.fetch_page(handle);
            thread::sleep(self.pause);

            match page {
                Ok(html) => parse_profile_page(&html),
                Err(err) => {
                    debug!(handle, error = %err, "profile lookup failed");
                    Profile::default()
                }
            }
        }
    }

    fn age_pattern() -> &'static Regex {
        static AGE: OnceLock<Regex> = OnceLock::new();
        AGE.get_or_init(|| Regex::new(r"age.([0-9]+)").expect("valid age pattern"))
    }

    fn meta_content(document: &Html, property: &str) -> Option<String> {
        let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(str::to_string)
    }

    /// Infobox cell following the given label ("Born:" → "May 5, 1995 (age 29)")
    fn infobox_value(document: &Html, label: &str) -> Option<String> {
        let selector = Selector::parse("div.fo-nttax-infobox div").ok()?;
        document.select(&selector).find_map(|line| {
            let mut cells = line.children().filter_map(ElementRef::wrap);
            let name = cells.next()?.text().collect::<String>();
            if name.trim() != label {
                return None;
            }
            cells.next().map(|value| value.text().collect::<String>())
        })
    }

    /// Image, description and age from a player page
    pub fn parse_profile_page(html: &str) -> Profile {
        let document = Html::parse_document(html);

        let image_url = match meta_content(&document, "og:image") {
            Some(url) if !url.contains("facebook-image.png") => url,
            _ => PLACEHOLDER_IMAGE_URL.to_string(),
        };

        let age = infobox_value(&document, "Born:").and_then(|born| {
            age_pattern()
                .captures(&born)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        });

        Profile {
            image_url: Some(image_url),
            description: meta_content(&document, "og:description"),
            age,
        }
    }

}
