use miette::{miette, Result};
use ::rss::{validation::Validate, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::{config::SiteConfig, data::Page};

/// Renders an RSS 2.0 channel for a listing.
///
/// `pages` must already be in publish order. The build date is the date of
/// the newest item so that rebuilding unchanged content gives the same feed.
#[tracing::instrument(level = "trace", skip(config, pages))]
pub fn build_rss(config: &SiteConfig, title: &str, rel_permalink: &str, pages: &[&Page]) -> Result<String> {
    let limit = config.rss_limit.unwrap_or(usize::MAX);
    let items: Vec<Item> = pages
        .iter()
        .take(limit)
        .map(|page| page_to_rss_item(config, page))
        .collect();
    let last_build_date = pages
        .iter()
        .filter_map(|p| p.doc.date)
        .max()
        .map(|d| d.to_rfc2822());

    let channel_title = if title.is_empty() || title == config.title {
        config.title.clone()
    } else {
        format!("{title} on {}", config.title)
    };
    let channel = ChannelBuilder::default()
        .title(channel_title.clone())
        .link(config.absolute_url(rel_permalink))
        .description(format!("Recent content in {channel_title}"))
        .language(config.language_code.clone())
        .copyright(config.copyright.clone())
        .generator(Some("folio".to_owned()))
        .last_build_date(last_build_date)
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| miette!("rss feed of `{rel_permalink}` is invalid: {e}"))?;
    Ok(channel.to_string())
}

fn page_to_rss_item(config: &SiteConfig, page: &Page) -> Item {
    let link = config.absolute_url(&page.doc.route.rel_permalink);

    ItemBuilder::default()
        .title(Some(page.doc.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(Some(page.summary.clone()))
        .pub_date(page.doc.date.map(|d| d.to_rfc2822()))
        .author(config.params.author.clone())
        .build()
}
