/// A spending category. `id` is the stable key assignments point at,
/// `name` is the name as entered, `pretty_name` is what gets displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub pretty_name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: &str, pretty_name: &str, color: &str) -> Self {
        let name = name.trim();
        let pretty = pretty_name.trim();
        Self {
            id: Self::derive_id(name),
            name: name.to_string(),
            pretty_name: if pretty.is_empty() { name } else { pretty }.to_string(),
            color: color.to_string(),
        }
    }

    /// Key derivation for user-created categories: lowercased, whitespace
    /// runs collapsed to a single underscore.
    pub fn derive_id(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Find a category by id in a slice.
    pub fn find_by_id<'a>(categories: &'a [Category], id: &str) -> Option<&'a Category> {
        categories.iter().find(|c| c.id == id)
    }

    /// Display name for a category id, falling back to the id itself when
    /// the category is no longer in the active set.
    pub fn pretty_name_for(categories: &[Category], id: &str) -> String {
        Self::find_by_id(categories, id)
            .map(|c| c.pretty_name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_name)
    }
}
