//! HTML for artifacts and the fragments listed on denormalized pages.
//!
//! Every fragment root carries `data-slug`, and every value the content
//! store reads back is wrapped in an element tagged `data-field`.

use crate::folio::config::FolioSiteConfig;
use crate::folio::dates;
use crate::folio::markup::html_escape as esc;
use crate::folio::model::{Project, Tag, TagNames, Writeup};
use crate::folio::paths::{tag_file_name, writeup_file_name};
use crate::folio::sync::Container;
use crate::folio::util::truncate_with_ellipsis;

const EXCERPT_CHARS: usize = 160;

pub const STARTER_BODY: &str = "# Overview

Add your writeup content here using **markdown** syntax!

## Initial Reconnaissance

Describe your initial reconnaissance process...

## Exploitation

Detail your exploitation steps...

## Privilege Escalation

Explain privilege escalation techniques used...

## Conclusion

Summarize your findings and lessons learned...";

/// Where a writeup card is rendered; decides relative links and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    Recent,
    Listing,
    TagPage,
}

impl CardStyle {
    fn column_class(self) -> &'static str {
        match self {
            Self::Recent => "col-12",
            Self::Listing | Self::TagPage => "col-lg-6 col-xl-4",
        }
    }

    fn writeup_href(self, slug: &str) -> String {
        match self {
            Self::Recent | Self::Listing => format!("writeups/{}", writeup_file_name(slug)),
            Self::TagPage => format!("../writeups/{}", writeup_file_name(slug)),
        }
    }

    fn tag_href(self, slug: &str) -> String {
        match self {
            Self::Recent | Self::Listing => format!("tags/{}", tag_file_name(slug)),
            Self::TagPage => tag_file_name(slug),
        }
    }
}

/// First prose line of a markdown body, shortened for cards.
pub fn excerpt(writeup: &Writeup) -> String {
    let prose = writeup.content_body.lines().map(str::trim).find(|line| {
        !line.is_empty()
            && !line.starts_with(['#', '`', '-', '*', '>', '|'])
            && !line.chars().next().is_some_and(|c| c.is_ascii_digit())
    });
    match prose {
        Some(line) => truncate_with_ellipsis(line, EXCERPT_CHARS),
        None => format!(
            "{} This writeup documents the discovery and analysis...",
            writeup.title
        ),
    }
}

pub fn writeup_card(
    writeup: &Writeup,
    style: CardStyle,
    site: &FolioSiteConfig,
    names: &TagNames,
) -> String {
    let tag_links = writeup
        .tags
        .iter()
        .map(|tag| {
            format!(
                "                    <a href=\"{}\" class=\"tag-badge me-1\">{}</a>",
                esc(&style.tag_href(tag)),
                esc(names.name(tag))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let photo = writeup
        .machine_photo_url
        .as_deref()
        .unwrap_or(&site.default_photo);

    format!(
        r#"<div class="{column} mb-4 writeup-card" data-slug="{slug}" data-date="{date}" data-category="{category}">
    <div class="card h-100 border-0 shadow-sm">
        <div class="card-body d-flex align-items-start gap-3">
            <div class="flex-grow-1">
                <h5 class="card-title mb-2 writeup-title">
                    <a href="{href}" class="text-decoration-none">{title}</a>
                </h5>
                <p class="card-text project-excerpt mb-2">{excerpt}</p>
                <small class="project-date mb-2"><i class="fas fa-calendar me-1"></i>{created}</small>
                <div class="tag-container">
{tag_links}
                </div>
            </div>
            <div class="d-none d-md-block">
                <img src="{photo}" alt="Writeup image" class="writeup-thumb" />
            </div>
        </div>
    </div>
</div>"#,
        column = style.column_class(),
        slug = esc(&writeup.slug),
        date = dates::iso(writeup.created_on()),
        category = esc(&writeup.tags.join(" ")),
        href = esc(&style.writeup_href(&writeup.slug)),
        title = esc(&writeup.title),
        excerpt = esc(&excerpt(writeup)),
        created = esc(&writeup.created_date),
        photo = esc(photo),
    )
}

pub fn project_card(project: &Project) -> String {
    format!(
        r#"<div class="col-lg-6 col-xl-4 mb-4 project-card" data-slug="{slug}" data-date="{iso}" data-category="">
    <div class="card h-100 border-0 shadow-sm">
        <div class="card-body">
            <h5 class="card-title mb-2">
                <a href="{url}" target="_blank" class="text-decoration-none" data-field="title">{title}</a>
            </h5>
            <p class="card-text project-excerpt mb-2" data-field="description">{description}</p>
            <small class="project-date"><i class="fas fa-calendar me-1"></i><span data-field="date">{date}</span></small>
        </div>
    </div>
</div>"#,
        slug = esc(&project.slug),
        iso = dates::iso(dates::parse_display_date(&project.date)),
        url = esc(&project.url),
        title = esc(&project.title),
        description = esc(&project.description),
        date = esc(&project.date),
    )
}

pub fn tag_card(tag: &Tag) -> String {
    format!(
        r#"<div class="col-auto mb-2 tag-card" data-slug="{slug}" data-category="">
    <a href="tags/{file}" class="tag-badge">{name}</a>
</div>"#,
        slug = esc(&tag.slug),
        file = esc(&tag_file_name(&tag.slug)),
        name = esc(&tag.display_name),
    )
}

fn container(name: Container, wrapper_id: &str) -> String {
    format!(
        "<div class=\"row\" id=\"{wrapper_id}\">\n{}\n{}\n</div>",
        name.begin_marker(),
        name.end_marker()
    )
}

fn page_shell(site: &FolioSiteConfig, title: &str, root: &str, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {brand}</title>
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">
    <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css" rel="stylesheet">
    <link href="{root}assets/css/style.css" rel="stylesheet">
</head>
<body>
    <nav class="navbar navbar-expand-lg navbar-dark bg-dark">
        <div class="container">
            <a class="navbar-brand" href="{root}index.html"><i class="fas fa-skull me-2"></i>{brand}</a>
            <ul class="navbar-nav ms-auto">
                <li class="nav-item"><a class="nav-link" href="{root}index.html">Home</a></li>
                <li class="nav-item"><a class="nav-link" href="{root}writeups.html">Writeups</a></li>
                <li class="nav-item"><a class="nav-link" href="{root}projects.html">Projects</a></li>
                <li class="nav-item"><a class="nav-link" href="{root}tags.html">Tags</a></li>
            </ul>
        </div>
    </nav>

    <div class="container-fluid">
        <main class="my-4 main-content">
{main}
        </main>
    </div>

    <footer class="bg-dark text-light py-3 mt-5">
        <div class="container"><p class="mb-0">&copy; {brand}</p></div>
    </footer>

    <script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js"></script>
    <script src="{root}assets/js/script.js"></script>
    <script src="{root}assets/js/search.js"></script>
</body>
</html>
"#,
        title = esc(title),
        brand = esc(&site.brand),
    )
}

fn heading(icon: &str, text: &str) -> String {
    format!("<div class=\"mb-4\">\n    <h2><i class=\"fas {icon} me-2\"></i>{text}</h2>\n</div>")
}

pub fn home_page(site: &FolioSiteConfig) -> String {
    let main = format!(
        "{}\n\n{}",
        heading("fa-clock", "Recent Posts"),
        container(Container::Recent, "recentContainer")
    );
    page_shell(site, "Home", "", &main)
}

pub fn listing_page(site: &FolioSiteConfig) -> String {
    let main = format!(
        "{}\n\n<input type=\"search\" class=\"form-control mb-4\" id=\"searchInput\" placeholder=\"Search writeups...\">\n\n{}",
        heading("fa-file-alt", "Writeups"),
        container(Container::Writeups, "writeupsContainer")
    );
    page_shell(site, "Writeups", "", &main)
}

pub fn projects_page(site: &FolioSiteConfig) -> String {
    let main = format!(
        "{}\n\n{}",
        heading("fa-code", "Projects"),
        container(Container::Projects, "projectsContainer")
    );
    page_shell(site, "Projects", "", &main)
}

pub fn tags_page(site: &FolioSiteConfig) -> String {
    let main = format!(
        "{}\n\n{}",
        heading("fa-tags", "Tags"),
        container(Container::Tags, "tagsContainer")
    );
    page_shell(site, "Tags", "", &main)
}

pub fn tag_page(tag: &Tag, site: &FolioSiteConfig) -> String {
    let description = match tag.description.as_deref() {
        Some(text) => format!(
            "\n    <p class=\"text-muted\" data-field=\"description\">{}</p>",
            esc(text)
        ),
        None => String::new(),
    };
    let main = format!(
        r#"<nav aria-label="breadcrumb">
    <ol class="breadcrumb">
        <li class="breadcrumb-item"><a href="../index.html">Home</a></li>
        <li class="breadcrumb-item"><a href="../tags.html">Tags</a></li>
        <li class="breadcrumb-item active" aria-current="page">{name}</li>
    </ol>
</nav>

<div class="mb-4 tag-header" data-folio="tag" data-slug="{slug}">
    <h2><i class="fas fa-tag me-2"></i>Tag: <span data-field="name">{name}</span></h2>{description}
</div>

{container}"#,
        name = esc(&tag.display_name),
        slug = esc(&tag.slug),
        container = container(Container::Writeups, "writeupsContainer"),
    );
    page_shell(site, &format!("Tag: {}", tag.display_name), "../", &main)
}

fn machine_info(writeup: &Writeup) -> String {
    if writeup.machine.is_empty() {
        return String::new();
    }
    let badge = |class: &str, icon: &str, label: &str, field: &str, value: &Option<String>| {
        value.as_deref().map(|v| {
            format!(
                "\n            <span class=\"badge {class} me-2\"><i class=\"fas {icon} me-1\"></i>{label}: <span data-field=\"{field}\">{}</span></span>",
                esc(v)
            )
        })
    };
    let badges: String = [
        badge("bg-primary", "fa-star", "Difficulty", "difficulty", &writeup.machine.difficulty),
        badge("bg-info", "fa-desktop", "OS", "os", &writeup.machine.os),
        badge("bg-secondary", "fa-network-wired", "IP", "ip", &writeup.machine.ip),
    ]
    .into_iter()
    .flatten()
    .collect();
    format!(
        "\n<div class=\"machine-info mb-3\">\n        <h6 class=\"text-muted mb-2\"><i class=\"fas fa-server me-1\"></i>Machine Information:</h6>\n        <div class=\"d-flex flex-wrap\">{badges}\n        </div>\n</div>"
    )
}

pub fn writeup_page(writeup: &Writeup, site: &FolioSiteConfig, names: &TagNames) -> String {
    let tag_links = writeup
        .tags
        .iter()
        .map(|tag| {
            format!(
                "                <a href=\"../tags/{}\" class=\"tag-badge me-1\" data-tag=\"{}\">{}</a>",
                esc(&tag_file_name(tag)),
                esc(tag),
                esc(names.name(tag))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let photo = match writeup.machine_photo_url.as_deref() {
        Some(url) => format!(
            "\n        <div class=\"d-none d-md-block\"><img src=\"{}\" alt=\"Machine Photo\" class=\"img-fluid rounded\" data-field=\"photo\"></div>",
            esc(url)
        ),
        None => String::new(),
    };

    let main = format!(
        r#"<nav aria-label="breadcrumb">
    <ol class="breadcrumb">
        <li class="breadcrumb-item"><a href="../index.html">Home</a></li>
        <li class="breadcrumb-item"><a href="../writeups.html">Writeups</a></li>
        <li class="breadcrumb-item active" aria-current="page">{title}</li>
    </ol>
</nav>

<article class="card border-0 shadow-sm writeup" data-folio="writeup" data-slug="{slug}" data-date="{iso}">
    <div class="card-body d-flex align-items-start gap-4">
        <div class="flex-grow-1">
            <h1 class="card-title mb-3" data-field="title">{title}</h1>
            <div class="mb-3">
                <small class="text-muted">
                    <i class="fas fa-calendar me-1"></i>Created: <span data-field="created">{created}</span>
                    <br><i class="fas fa-edit me-1"></i>Updated: <span data-field="updated">{updated}</span>
                </small>
            </div>
            <div class="tag-container mb-4">
{tag_links}
            </div>{machine}
        </div>{photo}
    </div>
    <div id="markdown-content" class="markdown-content" data-field="body" style="display: none;">
{body}
    </div>
</article>"#,
        title = esc(&writeup.title),
        slug = esc(&writeup.slug),
        iso = dates::iso(writeup.created_on()),
        created = esc(&writeup.created_date),
        updated = esc(&writeup.updated_date),
        machine = machine_info(writeup),
        body = esc(&writeup.content_body),
    );
    page_shell(site, &writeup.title, "../", &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folio::markup::{field_text, parse_start_tag};
    use crate::folio::model::MachineInfo;

    fn sample() -> Writeup {
        Writeup {
            slug: "nocturnal".to_string(),
            title: "Nocturnal <HTB>".to_string(),
            tags: vec!["htb".to_string(), "web".to_string()],
            created_date: "Jan 1, 2025".to_string(),
            updated_date: "Jan 2, 2025".to_string(),
            machine_photo_url: None,
            machine: MachineInfo {
                difficulty: Some("Easy".to_string()),
                os: None,
                ip: None,
            },
            content_body: "# Overview\n\nAn IDOR leaks backups.\n".to_string(),
        }
    }

    #[test]
    fn card_root_carries_key_date_and_category() {
        let card = writeup_card(
            &sample(),
            CardStyle::Listing,
            &FolioSiteConfig::default(),
            &TagNames::default(),
        );
        let root = parse_start_tag(&card, 0).expect("root");
        assert_eq!(root.attr("data-slug"), Some("nocturnal"));
        assert_eq!(root.attr("data-date"), Some("2025-01-01"));
        assert_eq!(root.attr("data-category"), Some("htb web"));
        assert!(card.contains("Nocturnal &lt;HTB&gt;"));
        assert!(card.contains("href=\"tags/tag-htb.html\""));
        assert!(card.contains("An IDOR leaks backups."));
    }

    #[test]
    fn tag_page_cards_link_upwards() {
        let card = writeup_card(
            &sample(),
            CardStyle::TagPage,
            &FolioSiteConfig::default(),
            &TagNames::default(),
        );
        assert!(card.contains("href=\"../writeups/writeup-nocturnal.html\""));
        assert!(card.contains("href=\"tag-web.html\""));
    }

    #[test]
    fn tag_badges_show_display_names() {
        let web = Tag {
            slug: "web".to_string(),
            display_name: "Web & API".to_string(),
            description: None,
        };
        let names: TagNames = [&web].into_iter().collect();
        let site = FolioSiteConfig::default();
        let card = writeup_card(&sample(), CardStyle::Listing, &site, &names);
        assert!(card.contains("class=\"tag-badge me-1\">Web &amp; API</a>"));
        assert!(card.contains("class=\"tag-badge me-1\">htb</a>"));

        let page = writeup_page(&sample(), &site, &names);
        assert!(page.contains("data-tag=\"web\">Web &amp; API</a>"));
    }

    #[test]
    fn excerpt_falls_back_without_prose() {
        let mut w = sample();
        w.content_body = "# Only a heading\n- and a list".to_string();
        assert!(excerpt(&w).ends_with("This writeup documents the discovery and analysis..."));
    }

    #[test]
    fn writeup_page_exposes_fields() {
        let page = writeup_page(&sample(), &FolioSiteConfig::default(), &TagNames::default());
        assert_eq!(field_text(&page, "title").as_deref(), Some("Nocturnal <HTB>"));
        assert_eq!(field_text(&page, "updated").as_deref(), Some("Jan 2, 2025"));
        assert_eq!(field_text(&page, "difficulty").as_deref(), Some("Easy"));
        assert_eq!(field_text(&page, "os"), None);
    }

    #[test]
    fn scaffold_pages_hold_their_container() {
        let site = FolioSiteConfig::default();
        assert!(home_page(&site).contains(&Container::Recent.begin_marker()));
        assert!(listing_page(&site).contains(&Container::Writeups.end_marker()));
        assert!(projects_page(&site).contains(&Container::Projects.begin_marker()));
        assert!(tags_page(&site).contains(&Container::Tags.begin_marker()));
    }
}
