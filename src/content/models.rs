use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three CMS collections rendered as article pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Blog,
    Product,
    Usecase,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Blog, ContentKind::Product, ContentKind::Usecase];

    /// Path segment on the content API.
    pub fn api_path(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blogs",
            ContentKind::Product => "product-pages",
            ContentKind::Usecase => "usecases",
        }
    }

    /// Path segment on this site.
    pub fn site_path(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blogs",
            ContentKind::Product => "products",
            ContentKind::Usecase => "usecases",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Blog => "Blog",
            ContentKind::Product => "Products & Services",
            ContentKind::Usecase => "Use Cases",
        }
    }

    pub fn sitemap_priority(&self) -> f32 {
        match self {
            ContentKind::Blog | ContentKind::Product => 0.7,
            ContentKind::Usecase => 0.6,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub intro: String,
    pub excerpt: String,
    pub meta_description: String,
    pub categories: String,
    pub slug_path: String,
    pub page_published_time: String,
    pub updated_at: Option<String>,
    pub author: Option<Author>,
    pub sections: Vec<Section>,
    pub faqs: Vec<Faq>,
}

impl Article {
    pub fn author_name(&self) -> String {
        match &self.author {
            Some(Author::Name(name)) => name.clone(),
            Some(Author::User { username }) => username.clone().unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn summary(&self) -> &str {
        if self.excerpt.is_empty() {
            &self.intro
        } else {
            &self.excerpt
        }
    }

    /// Sections and their subsections in CMS order.
    pub fn ordered_sections(&self) -> Vec<Section> {
        let mut sections = self.sections.clone();
        sections.sort_by_key(|s| s.order);
        for section in &mut sections {
            section.subsections.sort_by_key(|s| s.order);
        }
        sections
    }

    pub fn ordered_faqs(&self) -> Vec<Faq> {
        let mut faqs = self.faqs.clone();
        faqs.sort_by_key(|f| f.order);
        faqs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Name(String),
    User {
        #[serde(default)]
        username: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub order: i64,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subsection {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Faq {
    pub question: String,
    pub answer: String,
    pub order: i64,
}

/// Homepage singleton. The CMS exposes dozens of flat text fields; they are
/// kept as-is and read by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Homepage(pub Map<String, Value>);

impl Homepage {
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct About {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub content: String,
    pub meta_title: String,
    pub meta_description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NavItem {
    pub id: i64,
    pub title: String,
    pub slug_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Navigation {
    pub blogs: Vec<NavItem>,
    pub product_pages: Vec<NavItem>,
    pub usecases: Vec<NavItem>,
}

#[derive(Debug, Clone, Default)]
pub struct Collection<T> {
    pub results: Vec<T>,
    pub count: usize,
}
