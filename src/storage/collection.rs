//! In-memory record store for one site variant
//!
//! A [`CrawlCollection`] holds the targets discovered for the day and the
//! posts extracted from them. It serializes to the document the web
//! front-end reads:
//!
//! ```json
//! { "title": "...", "departments": { "label": "href" }, "blogPosts": [ ... ] }
//! ```
//!
//! where the targets key is `businesses` for the private variant.

use crate::config::SiteVariant;
use crate::storage::traits::{StorageError, StorageResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A discovered link not yet visited for content extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    /// Lowercased, left-trimmed link text; unique within a collection
    pub label: String,
    pub href: String,
}

impl NavigationTarget {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// One extracted vacancy post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub uuid: String,
    pub title: String,
    pub href: String,

    /// Site-provided text, kept verbatim
    #[serde(rename = "postedDate")]
    pub posted_date: String,

    #[serde(rename = "imgSrc", default, skip_serializing_if = "Option::is_none")]
    pub image_src: Option<String>,

    #[serde(default)]
    pub content: Vec<String>,

    /// Embedded document viewer, only recorded when `content` is empty
    #[serde(rename = "iframe", default, skip_serializing_if = "Option::is_none")]
    pub embedded_media_src: Option<String>,
}

/// Targets and posts accumulated by one variant's run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlCollection {
    variant: SiteVariant,
    title: String,
    targets: Vec<NavigationTarget>,
    index: HashMap<String, usize>,
    posts: Vec<PostRecord>,
}

impl CrawlCollection {
    /// Creates an empty collection
    pub fn new(variant: SiteVariant, title: impl Into<String>) -> Self {
        Self {
            variant,
            title: title.into(),
            targets: Vec::new(),
            index: HashMap::new(),
            posts: Vec::new(),
        }
    }

    pub fn variant(&self) -> SiteVariant {
        self.variant
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Inserts a target, overwriting the href of an existing label
    ///
    /// An overwritten label keeps its original position, so iteration order
    /// stays equal to first-discovery order.
    pub fn insert_target(&mut self, target: NavigationTarget) {
        match self.index.get(&target.label) {
            Some(&position) => self.targets[position].href = target.href,
            None => {
                self.index.insert(target.label.clone(), self.targets.len());
                self.targets.push(target);
            }
        }
    }

    /// Targets in discovery order
    pub fn targets(&self) -> &[NavigationTarget] {
        &self.targets
    }

    pub fn target(&self, label: &str) -> Option<&NavigationTarget> {
        self.index.get(label).map(|&i| &self.targets[i])
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Appends a post
    ///
    /// Refuses the append once every target already has a post.
    pub fn append_post(&mut self, post: PostRecord) -> StorageResult<()> {
        if self.posts.len() >= self.targets.len() {
            return Err(StorageError::CollectionFull {
                targets: self.targets.len(),
            });
        }
        self.posts.push(post);
        Ok(())
    }

    /// Returns true when every target has a post
    pub fn is_complete(&self) -> bool {
        !self.targets.is_empty() && self.posts.len() == self.targets.len()
    }

    /// Rebuilds a collection from its serialized document
    pub fn from_document(variant: SiteVariant, document: CollectionDocument) -> Self {
        let mut collection = Self::new(variant, document.title);
        for target in document.targets.0 {
            collection.insert_target(target);
        }
        // Documents written by this crate never hold more posts than targets
        collection.posts = document.posts;
        collection.posts.truncate(collection.targets.len());
        collection
    }
}

impl Serialize for CrawlCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry(self.variant.targets_key(), &TargetsRef(&self.targets))?;
        map.serialize_entry("blogPosts", &self.posts)?;
        map.end()
    }
}

struct TargetsRef<'a>(&'a [NavigationTarget]);

impl Serialize for TargetsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for target in self.0 {
            map.serialize_entry(&target.label, &target.href)?;
        }
        map.end()
    }
}

/// The serialized form of a collection, variant-agnostic
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionDocument {
    #[serde(default)]
    pub title: String,

    #[serde(alias = "departments", alias = "businesses", default)]
    pub targets: OrderedTargets,

    #[serde(rename = "blogPosts", default)]
    pub posts: Vec<PostRecord>,
}

/// Targets deserialized in document order
#[derive(Debug, Clone, Default)]
pub struct OrderedTargets(pub Vec<NavigationTarget>);

impl<'de> Deserialize<'de> for OrderedTargets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TargetsVisitor;

        impl<'de> Visitor<'de> for TargetsVisitor {
            type Value = OrderedTargets;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of target labels to hrefs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut targets = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, href)) = access.next_entry::<String, String>()? {
                    targets.push(NavigationTarget { label, href });
                }
                Ok(OrderedTargets(targets))
            }
        }

        deserializer.deserialize_map(TargetsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(n: usize) -> PostRecord {
        PostRecord {
            uuid: format!("p{}", n),
            title: format!("Post {}", n),
            href: format!("https://www.govpage.co.za/post-{}", n),
            posted_date: "5/4/2024".to_string(),
            image_src: None,
            content: vec![],
            embedded_media_src: None,
        }
    }

    #[test]
    fn test_insert_targets_in_discovery_order() {
        let mut collection = CrawlCollection::new(SiteVariant::Public, "govpage-public-sector");
        collection.insert_target(NavigationTarget::new("health", "https://x/health"));
        collection.insert_target(NavigationTarget::new("saps", "https://x/saps"));

        let labels: Vec<_> = collection.targets().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["health", "saps"]);
    }

    #[test]
    fn test_duplicate_label_last_write_wins() {
        let mut collection = CrawlCollection::new(SiteVariant::Public, "t");
        collection.insert_target(NavigationTarget::new("health", "https://x/old"));
        collection.insert_target(NavigationTarget::new("saps", "https://x/saps"));
        collection.insert_target(NavigationTarget::new("health", "https://x/new"));

        assert_eq!(collection.target_count(), 2);
        assert_eq!(collection.target("health").unwrap().href, "https://x/new");
        // Position of the first insertion is kept
        assert_eq!(collection.targets()[0].label, "health");
    }

    #[test]
    fn test_append_post_bounded_by_targets() {
        let mut collection = CrawlCollection::new(SiteVariant::Public, "t");
        assert!(matches!(
            collection.append_post(post(0)),
            Err(StorageError::CollectionFull { targets: 0 })
        ));

        collection.insert_target(NavigationTarget::new("a", "https://x/a"));
        collection.append_post(post(1)).unwrap();
        assert!(collection.is_complete());
        assert!(collection.append_post(post(2)).is_err());
        assert_eq!(collection.post_count(), 1);
    }

    #[test]
    fn test_empty_collection_is_not_complete() {
        let collection = CrawlCollection::new(SiteVariant::Private, "t");
        assert!(!collection.is_complete());
    }

    #[test]
    fn test_serialize_public_document() {
        let mut collection = CrawlCollection::new(SiteVariant::Public, "govpage-public-sector");
        collection.insert_target(NavigationTarget::new("zeta", "https://x/z"));
        collection.insert_target(NavigationTarget::new("alpha", "https://x/a"));
        collection.append_post(post(1)).unwrap();

        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.starts_with(r#"{"title":"govpage-public-sector","departments":{"zeta""#));
        assert!(json.contains(r#""blogPosts":[{"#));
        assert!(json.contains(r#""postedDate":"5/4/2024""#));
        // Absent optionals are omitted
        assert!(!json.contains("imgSrc"));
        assert!(!json.contains("iframe"));
    }

    #[test]
    fn test_serialize_private_uses_businesses_key() {
        let collection = CrawlCollection::new(SiteVariant::Private, "govpage-private-sector");
        let value = serde_json::to_value(&collection).unwrap();
        assert!(value.get("businesses").is_some());
        assert!(value.get("departments").is_none());
    }

    #[test]
    fn test_document_preserves_target_order() {
        let json = r#"{
            "title": "govpage-private-sector",
            "businesses": { "zulu": "https://x/z", "alpha": "https://x/a", "mike": "https://x/m" },
            "blogPosts": []
        }"#;

        let document: CollectionDocument = serde_json::from_str(json).unwrap();
        let collection = CrawlCollection::from_document(SiteVariant::Private, document);

        let labels: Vec<_> = collection.targets().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["zulu", "alpha", "mike"]);
        assert_eq!(collection.title(), "govpage-private-sector");
    }

    #[test]
    fn test_document_reads_original_post_fields() {
        let json = r#"{
            "title": "t",
            "departments": { "a": "https://x/a" },
            "blogPosts": [{
                "uuid": "p1", "title": "T", "href": "https://x/a", "postedDate": "d",
                "imgSrc": "https://x/pic.png", "content": [], "iframe": "https://drive.google.com/f"
            }]
        }"#;

        let document: CollectionDocument = serde_json::from_str(json).unwrap();
        let collection = CrawlCollection::from_document(SiteVariant::Public, document);
        let post = &collection.posts()[0];

        assert_eq!(post.image_src.as_deref(), Some("https://x/pic.png"));
        assert_eq!(
            post.embedded_media_src.as_deref(),
            Some("https://drive.google.com/f")
        );
    }
}
