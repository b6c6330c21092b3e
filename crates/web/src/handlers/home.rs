use std::{collections::BTreeMap, time::Duration};

use axum::{
    extract::RawQuery,
    response::{IntoResponse, Response},
};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use ogimg_core::{
    AppError, BaseUrl,
    util::{absolute_url, query_values},
};
use ogimg_images::default_logo_url;
use url::{Url, form_urlencoded};

use crate::handlers::{
    common::{footer, header, theme_toggle},
    csp::Nonce,
};

const INITIAL_TITLE: &str = "Open Graph Img Generator";
const INITIAL_DESCRIPTION: &str = "Create beautiful social media preview Images in seconds";

/// How long the copy button shows its acknowledgment.
pub const COPY_ACK: Duration = Duration::from_millis(2000);

const SCRIPT: &str = r#"
(() => {
  const root = document.documentElement;
  document.getElementById("theme-toggle")?.addEventListener("click", () => {
    const theme = root.getAttribute("data-theme") === "dark" ? "light" : "dark";
    root.setAttribute("data-theme", theme);
    try { localStorage.setItem("theme", theme); } catch (_) {}
  });
  const copy = document.getElementById("copy-url");
  let timer;
  copy?.addEventListener("click", () => {
    navigator.clipboard?.writeText(copy.dataset.url).then(() => {
      copy.classList.add("copied");
      copy.textContent = "Copied";
      clearTimeout(timer);
      timer = setTimeout(() => {
        copy.classList.remove("copied");
        copy.textContent = "Copy";
      }, COPY_ACK_MS);
    });
  });
})();
"#;

fn script() -> String { SCRIPT.replace("COPY_ACK_MS", &COPY_ACK.as_millis().to_string()) }

#[derive(Debug, Default, Clone)]
pub struct PreviewForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub img_url: Option<String>,
}

impl PreviewForm {
    /// Read the form fields from the raw query; the first occurrence of each wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let [title, description, img_url] = query_values(query, [
            Field::Title.name(),
            Field::Description.name(),
            Field::ImageUrl.name(),
        ]);
        Self { title, description, img_url }
    }

    fn is_submitted(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.img_url.is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Title,
    Description,
    ImageUrl,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::ImageUrl => "imgUrl",
        }
    }
}

/// Field-level validation errors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<Field, &'static str>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> { self.0.get(&field).copied() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    fn insert(&mut self, field: Field, message: &'static str) { self.0.insert(field, message); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// `None` when left empty.
    pub img_url: Option<&'a str>,
}

impl ValidForm<'_> {
    /// Root-relative URL of the image, using `default_logo` when no image URL was given.
    pub fn preview_url(&self, default_logo: &str) -> String {
        preview_url(self.title, self.description, self.img_url.unwrap_or(default_logo))
    }
}

pub fn validate_form(form: &PreviewForm) -> Result<ValidForm<'_>, FormErrors> {
    let title = form.title.as_deref().unwrap_or_default().trim();
    let description = form.description.as_deref().unwrap_or_default().trim();
    let img_url = form.img_url.as_deref().unwrap_or_default().trim();
    let mut errors = FormErrors::default();
    if title.is_empty() {
        errors.insert(Field::Title, "Title is required");
    }
    if description.is_empty() {
        errors.insert(Field::Description, "Description is required");
    }
    if !img_url.is_empty() && Url::parse(img_url).is_err() {
        errors.insert(Field::ImageUrl, "Invalid URL");
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ValidForm { title, description, img_url: (!img_url.is_empty()).then_some(img_url) })
}

pub fn preview_url(title: &str, description: &str, img_url: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("title", title)
        .append_pair("description", description)
        .append_pair("imgUrl", img_url)
        .finish();
    format!("/api/og?{query}")
}

fn field_error(errors: &FormErrors, field: Field) -> Markup {
    html! {
        @if let Some(message) = errors.get(field) {
            p .error id=(format!("{}-error", field.name())) { (message) }
        }
    }
}

pub async fn get_home(
    nonce: Nonce,
    BaseUrl(base_url): BaseUrl,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let form = PreviewForm::from_query(query.as_deref());
    let default_logo = default_logo_url(Some(&base_url));
    let initial = || preview_url(INITIAL_TITLE, INITIAL_DESCRIPTION, &default_logo);
    let (errors, preview) = if form.is_submitted() {
        match validate_form(&form) {
            Ok(valid) => (FormErrors::default(), valid.preview_url(&default_logo)),
            Err(errors) => (errors, initial()),
        }
    } else {
        (FormErrors::default(), initial())
    };
    let generated = absolute_url(&base_url, &preview);

    let rendered = html! {
        (DOCTYPE)
        html lang="en" data-theme="dark" {
            head {
                meta charset="utf-8";
                title { "Open Graph Image Generator" }
                meta name="description" content="Generate Open Graph images with ease";
                meta property="og:title" content="Open Graph Image Generator";
                meta property="og:image" content=(generated);
                (header(&nonce))
            }
            body {
                (theme_toggle())
                main {
                    div .hero {
                        h1 { (INITIAL_TITLE) }
                        p { (INITIAL_DESCRIPTION) }
                    }
                    div .grid {
                        section .card {
                            form method="get" action="/" novalidate {
                                div .field {
                                    label for="title" { "Title" }
                                    input #title type="text" name="title" placeholder="Enter title"
                                        value=(form.title.as_deref().unwrap_or_default());
                                    (field_error(&errors, Field::Title))
                                }
                                div .field {
                                    label for="description" { "Description" }
                                    textarea #description name="description" placeholder="Enter description" {
                                        (form.description.as_deref().unwrap_or_default())
                                    }
                                    (field_error(&errors, Field::Description))
                                }
                                div .field {
                                    label for="imgUrl" { "Image URL" }
                                    input #imgUrl type="url" name="imgUrl" placeholder="Enter image URL"
                                        value=(form.img_url.as_deref().unwrap_or_default());
                                    (field_error(&errors, Field::ImageUrl))
                                    p .hint { "Leave empty to use the default logo" }
                                }
                                button type="submit" { "Generate Preview" }
                            }
                        }
                        section .card.preview {
                            img src=(preview) alt="Open Graph Image" width="1200" height="630";
                            div .generated {
                                span { "Generated URL" }
                                div .url-row {
                                    code #generated-url { (generated) }
                                    button #copy-url type="button" title="Copy URL" data-url=(generated) { "Copy" }
                                }
                            }
                        }
                    }
                }
                (footer())
                script nonce=(nonce.0) { (PreEscaped(script())) }
            }
        }
    };
    Ok(rendered.into_response())
}
