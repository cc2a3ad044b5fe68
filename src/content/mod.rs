pub mod client;
pub mod models;

pub use client::{ContentClient, ContentError};
pub use models::{
    About, Article, Author, Collection, ContentKind, Faq, Homepage, NavItem, Navigation, Section,
    Subsection,
};
