use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use url::Url;

const PATH_BASE: &str = "http://localhost/";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) origin: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(origin: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            origin,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            origin,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            origin,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome.with_title("Page Not Found"), content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// Percent-encoded `/{section}/{value}/` path.
pub fn section_path(section: &str, value: &str) -> String {
    let Ok(mut url) = Url::parse(PATH_BASE) else {
        return format!("/{section}/{value}/");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(section).push(value).push("");
    }
    url.path().to_string()
}

pub fn post_path(slug: &str) -> String {
    section_path("posts", slug)
}

pub fn tag_path(title: &str) -> String {
    section_path("tags", title)
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
}

/// Site-wide page frame: brand, navigation, footer and document title.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn for_site(site_title: &str) -> Self {
        Self {
            brand: BrandView {
                title: site_title.to_string(),
                href: "/".to_string(),
            },
            navigation: NavigationView {
                entries: vec![
                    NavigationLinkView {
                        label: "Home".to_string(),
                        href: "/".to_string(),
                    },
                    NavigationLinkView {
                        label: "Contacts".to_string(),
                        href: "/contacts/".to_string(),
                    },
                ],
            },
            footer: FooterView {
                copy: format!("© {site_title}"),
            },
            meta: PageMetaView {
                title: site_title.to_string(),
            },
        }
    }

    /// Prefix the document title with a page-specific title.
    pub fn with_title(self, page_title: &str) -> Self {
        let title = format!("{page_title} · {}", self.brand.title);
        Self {
            meta: PageMetaView { title },
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLink {
    pub title: String,
    pub href: String,
}

/// Flat projection of a post used by every post list.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: i64,
    pub image_url: Option<String>,
    pub published: String,
    pub iso_date: String,
    pub slug: String,
    pub href: String,
    pub tags: Vec<TagLink>,
    pub first_tag_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub title: String,
    pub posts_with_tag: i64,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub text: String,
    pub author: String,
    pub published: String,
    pub iso_date: String,
}

/// Popularity sidebars shared by the index, detail and tag pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarView {
    pub most_popular_posts: Vec<PostCard>,
    pub popular_tags: Vec<TagSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexView {
    pub page_posts: Vec<PostCard>,
    pub sidebar: SidebarView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDetailView {
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments: Vec<CommentView>,
    pub likes_amount: i64,
    pub image_url: Option<String>,
    pub published: String,
    pub iso_date: String,
    pub slug: String,
    pub tags: Vec<TagLink>,
    pub sidebar: SidebarView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagFilterView {
    pub tag: String,
    pub posts: Vec<PostCard>,
    pub sidebar: SidebarView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactsView;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<IndexView>,
}

#[derive(Template)]
#[template(path = "post-details.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Template)]
#[template(path = "posts-list.html")]
pub struct PostsListTemplate {
    pub view: LayoutContext<TagFilterView>,
}

#[derive(Template)]
#[template(path = "contacts.html")]
pub struct ContactsTemplate {
    pub view: LayoutContext<ContactsView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
