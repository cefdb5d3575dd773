//! Child model matching the frontend Child interface.

use serde::{Deserialize, Serialize};

/// Allergy note meaning "nothing to report".
pub const NO_ALLERGIES: &str = "None";

/// A registered enrollee, sourced from the Remote Roster Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub name: String,
    pub parent_name: String,
    pub parent_phone: String,
    pub parent_email: String,
    pub allergies_notes: String,
}

impl Child {
    pub fn has_allergies(&self) -> bool {
        let note = self.allergies_notes.trim();
        !note.is_empty() && !note.eq_ignore_ascii_case(NO_ALLERGIES)
    }

    /// Case-insensitive substring match on the child's or guardian's name.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.parent_name.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(name: &str, parent: &str, allergies: &str) -> Child {
        Child {
            id: "1".to_string(),
            name: name.to_string(),
            parent_name: parent.to_string(),
            parent_phone: String::new(),
            parent_email: String::new(),
            allergies_notes: allergies.to_string(),
        }
    }

    #[test]
    fn test_search_matches_child_or_parent() {
        let c = child("Aisha Ahmad", "Fatima Ahmad", NO_ALLERGIES);
        assert!(c.matches_search("ais"));
        assert!(c.matches_search("FATIMA"));
        assert!(c.matches_search("  "));
        assert!(!c.matches_search("omar"));
    }

    #[test]
    fn test_allergy_sentinel() {
        assert!(!child("A", "B", "None").has_allergies());
        assert!(!child("A", "B", "").has_allergies());
        assert!(child("A", "B", "Peanut allergy").has_allergies());
    }
}
