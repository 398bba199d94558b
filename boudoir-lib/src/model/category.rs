//! Article categories

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// A browsing category ("Robes", "Vestes", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Derives a URL slug from a category name.
///
/// Lowercases, folds common French accents, and collapses every run of
/// non-alphanumeric characters into a single `-`.
///
/// # Example
///
/// ```
/// use boudoir_lib::model::slugify;
///
/// assert_eq!(slugify("Chaussures & Bottes"), "chaussures-bottes");
/// assert_eq!(slugify("  Été  "), "ete");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        };
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}
