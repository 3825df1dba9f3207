//! Category tree construction.
//!
//! Turns the flat category list supplied by the catalog into a forest:
//! - featured categories are always roots, whatever their declared parent
//! - a category whose parent is in the input is nested under it
//! - a category whose parent is missing from the input becomes a root
//! - children are sorted by name (case-insensitive) at every level
//! - roots keep their input order

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Category identifier as delivered by the source: a string or a number.
///
/// Numbers are normalised to their decimal string so `7` and `"7"` name
/// the same category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Wrap an identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for CategoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
            Number(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Integer(n) => Self(n.to_string()),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

/// Declared parent of a raw category record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentRecord {
    /// Parent identifier
    pub id: CategoryId,
    /// Parent name, if supplied
    #[serde(default)]
    pub name: Option<String>,
    /// Parent slug, if supplied
    #[serde(default)]
    pub slug: Option<String>,
}

/// Raw category as delivered by the category source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Identifier
    pub id: CategoryId,
    /// Display name; missing names become empty strings
    #[serde(default)]
    pub name: Option<String>,
    /// URL slug; derived from the name when missing
    #[serde(default)]
    pub slug: Option<String>,
    /// Declared parent
    #[serde(default)]
    pub parent: Option<ParentRecord>,
    /// Featured categories are always shown at the top level
    #[serde(default, alias = "isFeatured")]
    pub is_featured: Option<bool>,
}

impl CategoryRecord {
    /// Record with an id and a name
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(id),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Declare a parent by id
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent = Some(ParentRecord {
            id: CategoryId::new(parent_id),
            ..ParentRecord::default()
        });
        self
    }

    /// Mark as featured
    #[must_use]
    pub const fn featured(mut self) -> Self {
        self.is_featured = Some(true);
        self
    }
}

/// Resolved reference to a parent category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Parent identifier
    pub id: CategoryId,
    /// Parent name
    pub name: String,
    /// Parent slug
    pub slug: String,
}

/// Node of the category forest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Identifier
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Declared parent, kept even when the node was placed at the root
    pub parent: Option<ParentRef>,
    /// Featured flag
    pub is_featured: bool,
    /// Children sorted by name
    pub children: Vec<Category>,
}

impl Category {
    fn from_record(record: CategoryRecord) -> Self {
        let name = record.name.unwrap_or_default();
        let slug = record.slug.unwrap_or_else(|| slugify(&name));
        let parent = record.parent.map(|parent| {
            let name = parent.name.unwrap_or_default();
            ParentRef {
                slug: parent.slug.unwrap_or_else(|| slugify(&name)),
                id: parent.id,
                name,
            }
        });

        Self {
            id: record.id,
            name,
            slug,
            parent,
            is_featured: record.is_featured.unwrap_or(false),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including this one
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Derive a URL slug from a name.
///
/// Lowercases, turns whitespace runs into single hyphens and drops every
/// character other than `a-z`, `0-9` and `-`.
///
/// ```
/// use storefront::category::slugify;
///
/// assert_eq!(slugify("Rock & Roll"), "rock--roll");
/// assert_eq!(slugify("  Jazz Clubs "), "-jazz-clubs-");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        for lower in c.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '-' {
                slug.push(lower);
            }
        }
    }

    slug
}

/// Build the category forest from a flat list.
///
/// Records sharing an id collapse into the last one, placed where the id
/// first appeared. Categories caught in a parent cycle (including their own
/// parent) are unreachable from any root; each such group is attached at the
/// root through its earliest member in input order.
#[must_use]
pub fn build_tree(records: Vec<CategoryRecord>) -> Vec<Category> {
    // Pass 1: materialise nodes
    let mut order: Vec<CategoryId> = Vec::with_capacity(records.len());
    let mut nodes: HashMap<CategoryId, Category> = HashMap::with_capacity(records.len());

    for record in records {
        let node = Category::from_record(record);
        let id = node.id.clone();
        if nodes.insert(id.clone(), node).is_none() {
            order.push(id);
        }
    }

    // Pass 2: place nodes
    let mut roots: HashSet<CategoryId> = HashSet::new();
    let mut children_of: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();

    for id in &order {
        let node = &nodes[id];
        match &node.parent {
            Some(parent)
                if !node.is_featured && &parent.id != id && nodes.contains_key(&parent.id) =>
            {
                children_of.entry(parent.id.clone()).or_default().push(id.clone());
            },
            _ => {
                roots.insert(id.clone());
            },
        }
    }

    let mut reached: HashSet<CategoryId> = HashSet::with_capacity(order.len());
    for id in order.iter().filter(|id| roots.contains(*id)) {
        mark_reachable(id, &children_of, &mut reached);
    }
    for id in &order {
        if !reached.contains(id) {
            tracing::debug!(category = %id.as_str(), "Category parent chain is cyclic, placing at root");
            roots.insert(id.clone());
            mark_reachable(id, &children_of, &mut reached);
        }
    }

    // Assemble, roots in input order
    let mut placed: HashSet<CategoryId> = roots.clone();
    order
        .iter()
        .filter(|id| roots.contains(*id))
        .filter_map(|id| assemble(id, &mut nodes, &children_of, &mut placed))
        .collect()
}

fn mark_reachable(
    start: &CategoryId,
    children_of: &HashMap<CategoryId, Vec<CategoryId>>,
    reached: &mut HashSet<CategoryId>,
) {
    let mut stack = vec![start.clone()];
    while let Some(id) = stack.pop() {
        if !reached.insert(id.clone()) {
            continue;
        }
        if let Some(children) = children_of.get(&id) {
            stack.extend(children.iter().filter(|c| !reached.contains(*c)).cloned());
        }
    }
}

fn assemble(
    id: &CategoryId,
    nodes: &mut HashMap<CategoryId, Category>,
    children_of: &HashMap<CategoryId, Vec<CategoryId>>,
    placed: &mut HashSet<CategoryId>,
) -> Option<Category> {
    let mut node = nodes.remove(id)?;

    if let Some(child_ids) = children_of.get(id) {
        for child_id in child_ids {
            if placed.insert(child_id.clone()) {
                if let Some(child) = assemble(child_id, nodes, children_of, placed) {
                    node.children.push(child);
                }
            }
        }
    }

    // Stable: equal names keep input order
    node.children.sort_by_cached_key(|child| child.name.to_lowercase());
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_nests_under_parent() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Music"),
            CategoryRecord::new("2", "Rock").with_parent("1"),
            CategoryRecord::new("3", "Indie").with_parent("2"),
        ]);

        assert_eq!(names(&tree), vec!["Music"]);
        assert_eq!(names(&tree[0].children), vec!["Rock"]);
        assert_eq!(names(&tree[0].children[0].children), vec!["Indie"]);
        assert_eq!(tree[0].node_count(), 3);
    }

    #[test]
    fn test_featured_child_is_promoted() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Sports"),
            CategoryRecord::new("2", "Football").with_parent("1").featured(),
        ]);

        assert_eq!(names(&tree), vec!["Sports", "Football"]);
        assert!(tree[0].children.is_empty());
        assert!(tree[1].is_featured);
        assert_eq!(tree[1].parent.as_ref().map(|p| p.id.as_str()), Some("1"));
    }

    #[test]
    fn test_orphan_falls_back_to_root() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Theatre"),
            CategoryRecord::new("2", "Opera").with_parent("missing"),
        ]);
        assert_eq!(names(&tree), vec!["Theatre", "Opera"]);
    }

    #[test]
    fn test_children_sorted_case_insensitively() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Music"),
            CategoryRecord::new("2", "jazz").with_parent("1"),
            CategoryRecord::new("3", "Blues").with_parent("1"),
            CategoryRecord::new("4", "country").with_parent("1"),
        ]);
        assert_eq!(names(&tree[0].children), vec!["Blues", "country", "jazz"]);
    }

    #[test]
    fn test_roots_keep_input_order() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Zoo Events"),
            CategoryRecord::new("2", "Arts"),
            CategoryRecord::new("3", "Music"),
        ]);
        assert_eq!(names(&tree), vec!["Zoo Events", "Arts", "Music"]);
    }

    #[test]
    fn test_child_before_parent_in_input() {
        let tree = build_tree(vec![
            CategoryRecord::new("2", "Rock").with_parent("1"),
            CategoryRecord::new("1", "Music"),
        ]);
        assert_eq!(names(&tree), vec!["Music"]);
        assert_eq!(names(&tree[0].children), vec!["Rock"]);
    }

    #[test]
    fn test_missing_name_and_slug() {
        let record = CategoryRecord {
            id: CategoryId::new("9"),
            ..CategoryRecord::default()
        };
        let named = CategoryRecord::new("10", "Live Comedy Shows!");
        let tree = build_tree(vec![record, named]);

        assert_eq!(tree[0].name, "");
        assert_eq!(tree[0].slug, "");
        assert_eq!(tree[1].slug, "live-comedy-shows");
    }

    #[test]
    fn test_explicit_slug_wins() {
        let record = CategoryRecord {
            slug: Some("custom".to_string()),
            ..CategoryRecord::new("1", "Music")
        };
        assert_eq!(build_tree(vec![record])[0].slug, "custom");
    }

    #[test]
    fn test_duplicate_ids_last_write_wins_at_first_position() {
        let tree = build_tree(vec![
            CategoryRecord::new("1", "Old"),
            CategoryRecord::new("2", "Other"),
            CategoryRecord::new("1", "New"),
        ]);
        assert_eq!(names(&tree), vec!["New", "Other"]);
    }

    #[test]
    fn test_cycles_are_promoted_to_root() {
        let tree = build_tree(vec![
            CategoryRecord::new("a", "A").with_parent("b"),
            CategoryRecord::new("b", "B").with_parent("a"),
            CategoryRecord::new("s", "Self").with_parent("s"),
        ]);

        assert_eq!(names(&tree), vec!["A", "Self"]);
        assert_eq!(names(&tree[0].children), vec!["B"]);
        assert!(tree[0].children[0].children.is_empty());
        assert_eq!(tree.iter().map(Category::node_count).sum::<usize>(), 3);
    }

    #[test]
    fn test_numeric_ids_from_json() {
        let records: Vec<CategoryRecord> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Music"},
                {"id": "2", "name": "Rock", "parent": {"id": 1, "name": "Music"}},
                {"id": 3, "name": "Hot", "parent": {"id": "1"}, "is_featured": true}
            ]"#,
        )
        .unwrap();

        let tree = build_tree(records);
        assert_eq!(names(&tree), vec!["Music", "Hot"]);
        assert_eq!(names(&tree[0].children), vec!["Rock"]);
        assert_eq!(
            tree[0].children[0].parent,
            Some(ParentRef {
                id: CategoryId::new("1"),
                name: "Music".to_string(),
                slug: "music".to_string(),
            })
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hip Hop"), "hip-hop");
        assert_eq!(slugify("R&B / Soul"), "rb--soul");
        assert_eq!(slugify("Pre-Sale 2025"), "pre-sale-2025");
        assert_eq!(slugify("Café"), "caf");
    }

    #[test]
    fn test_empty_input() {
        assert!(build_tree(Vec::new()).is_empty());
    }
}
