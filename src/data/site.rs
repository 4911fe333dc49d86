use std::collections::BTreeMap;

use crate::config::SiteConfig;

use super::{url::urlize, DocumentKind, Page, Route};

/// A top level content directory
#[derive(Clone, Debug)]
pub struct Section {
    pub name: String,
    pub route: Route,
    /// the section's `_index.md`
    pub index: Option<Page>,
    /// indices into [`SiteModel::pages`], in publish order
    pub pages: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct Term {
    /// spelling of the first page using the term
    pub name: String,
    pub slug: String,
    pub route: Route,
    /// indices into [`SiteModel::pages`], in publish order
    pub pages: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct Taxonomy {
    pub singular: String,
    pub plural: String,
    pub route: Route,
    /// sorted by slug
    pub terms: Vec<Term>,
}

/// Everything that gets published, sorted and grouped
#[derive(Clone, Debug)]
pub struct SiteModel {
    /// regular pages, newest first
    pub pages: Vec<Page>,
    /// the root `_index.md`
    pub home: Option<Page>,
    /// sorted by name
    pub sections: Vec<Section>,
    /// sorted by plural name
    pub taxonomies: Vec<Taxonomy>,
    /// pages listed on the home page, the archive and the feeds
    pub main_pages: Vec<usize>,
}

impl SiteModel {
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn assemble(pages: Vec<Page>, config: &SiteConfig) -> Self {
        let (list_pages, mut pages): (Vec<Page>, Vec<Page>) = pages
            .into_iter()
            .partition(|p| p.doc.kind == DocumentKind::List);
        pages.sort_by(Page::publish_order);

        let mut home = None;
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();
        for list_page in list_pages {
            if list_page.doc.section.is_empty() {
                home = Some(list_page);
            } else {
                let name = list_page.doc.section.clone();
                section_entry(&mut sections, &name).index = Some(list_page);
            }
        }
        for (i, page) in pages.iter().enumerate() {
            if !page.doc.section.is_empty() {
                section_entry(&mut sections, &page.doc.section).pages.push(i);
            }
        }

        let main_pages = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| match &config.params.main_sections {
                Some(main) => main.contains(&p.doc.section),
                None => !p.doc.section.is_empty(),
            })
            .map(|(i, _)| i)
            .collect();

        let mut taxonomies: Vec<Taxonomy> = config
            .taxonomies
            .iter()
            .map(|(singular, plural)| collect_taxonomy(singular, plural, &pages))
            .collect();
        taxonomies.sort_by(|a, b| a.plural.cmp(&b.plural));

        Self {
            pages,
            home,
            sections: sections.into_values().collect(),
            taxonomies,
            main_pages,
        }
    }

    pub fn pages_at<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a Page> + 'a {
        indices.iter().map(|&i| &self.pages[i])
    }

    /// section of the page at `index` together with its position in there
    pub fn section_position(&self, index: usize) -> Option<(&Section, usize)> {
        let section_name = &self.pages[index].doc.section;
        let section = self.sections.iter().find(|s| &s.name == section_name)?;
        let position = section.pages.iter().position(|&i| i == index)?;
        Some((section, position))
    }
}

fn section_entry<'a>(sections: &'a mut BTreeMap<String, Section>, name: &str) -> &'a mut Section {
    sections.entry(name.to_owned()).or_insert_with(|| Section {
        name: name.to_owned(),
        route: Route::listing(&[&urlize(name)]),
        index: None,
        pages: Vec::new(),
    })
}

fn collect_taxonomy(singular: &str, plural: &str, pages: &[Page]) -> Taxonomy {
    let plural_slug = urlize(plural);
    let mut terms: BTreeMap<String, Term> = BTreeMap::new();

    for (i, page) in pages.iter().enumerate() {
        for name in page.doc.front_matter.terms(plural) {
            let slug = urlize(&name);
            if slug.is_empty() {
                continue;
            }
            let term = terms.entry(slug.clone()).or_insert_with(|| Term {
                name: name.trim().to_owned(),
                route: Route::listing(&[&plural_slug, &slug]),
                slug,
                pages: Vec::new(),
            });
            if term.pages.last() != Some(&i) {
                term.pages.push(i);
            }
        }
    }

    Taxonomy {
        singular: singular.to_owned(),
        plural: plural.to_owned(),
        route: Route::listing(&[&plural_slug]),
        terms: terms.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::parse_config, data::parse_document, markup::RenderedContent};
    use std::path::Path;

    fn page(rel: &str, front_matter: &str) -> Page {
        let doc = parse_document(
            Path::new("/c").join(rel),
            rel.into(),
            &format!("---\n{front_matter}\n---\n"),
            false,
        )
        .unwrap();
        Page {
            doc,
            content: RenderedContent::default(),
            summary: String::new(),
        }
    }

    fn config(extra: &str) -> SiteConfig {
        parse_config(
            Path::new("hugo.toml"),
            &format!("baseURL = \"https://e.org\"\n{extra}"),
        )
        .unwrap()
    }

    fn titles<'a>(site: &'a SiteModel, indices: &'a [usize]) -> Vec<&'a str> {
        site.pages_at(indices).map(|p| p.doc.title.as_str()).collect()
    }

    #[test]
    fn sorts_newest_first_with_path_tie_breaks() {
        let site = SiteModel::assemble(
            vec![
                page("posts/old.md", "title: old\ndate: 2022-01-01"),
                page("posts/b.md", "title: b\ndate: 2023-01-01"),
                page("posts/undated.md", "title: undated"),
                page("posts/a.md", "title: a\ndate: 2023-01-01"),
            ],
            &config(""),
        );

        let all: Vec<_> = site.pages.iter().map(|p| p.doc.title.as_str()).collect();
        assert_eq!(all, vec!["a", "b", "old", "undated"]);
    }

    #[test]
    fn groups_sections_and_home() {
        let site = SiteModel::assemble(
            vec![
                page("_index.md", "title: Home"),
                page("posts/_index.md", "title: Posts"),
                page("posts/a.md", "title: a\ndate: 2023-01-01"),
                page("notes/n.md", "title: n\ndate: 2021-01-01"),
                page("about.md", "title: About"),
            ],
            &config(""),
        );

        assert_eq!(site.home.as_ref().unwrap().doc.title, "Home");
        let names: Vec<_> = site.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["notes", "posts"]);
        assert_eq!(site.sections[1].index.as_ref().unwrap().doc.title, "Posts");
        assert_eq!(titles(&site, &site.main_pages), vec!["a", "n"]);
    }

    #[test]
    fn main_sections_limit_the_home_list() {
        let site = SiteModel::assemble(
            vec![
                page("posts/a.md", "title: a"),
                page("notes/n.md", "title: n"),
            ],
            &config("[params]\nmainSections = [\"posts\"]"),
        );
        assert_eq!(titles(&site, &site.main_pages), vec!["a"]);
    }

    #[test]
    fn collects_terms_by_slug() {
        let site = SiteModel::assemble(
            vec![
                page("posts/a.md", "title: a\ndate: 2023-01-01\ntags: [Android, Kotlin]"),
                page("posts/b.md", "title: b\ndate: 2022-01-01\ntags: [android, android]\ncategories: [mobile]"),
            ],
            &config(""),
        );

        let plurals: Vec<_> = site.taxonomies.iter().map(|t| t.plural.as_str()).collect();
        assert_eq!(plurals, vec!["categories", "tags"]);

        let tags = &site.taxonomies[1];
        assert_eq!(tags.route.rel_permalink, "/tags/");
        let android = &tags.terms[0];
        assert_eq!(android.name, "Android");
        assert_eq!(android.route.rel_permalink, "/tags/android/");
        assert_eq!(titles(&site, &android.pages), vec!["a", "b"]);
        assert_eq!(tags.terms[1].slug, "kotlin");
    }

    #[test]
    fn section_positions() {
        let site = SiteModel::assemble(
            vec![
                page("posts/a.md", "title: a\ndate: 2023-01-01"),
                page("posts/b.md", "title: b\ndate: 2022-01-01"),
                page("about.md", "title: About"),
            ],
            &config(""),
        );
        let (section, position) = site.section_position(1).unwrap();
        assert_eq!(section.name, "posts");
        assert_eq!(position, 1);
        assert!(site.section_position(2).is_none());
    }
}
