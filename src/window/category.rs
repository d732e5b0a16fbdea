//! Sidebar categories
//!
//! Categories are discovered lazily and keep their discovery order. Windows
//! are referenced by their slot in the [`super::WindowManager`] window list.

/// One sidebar group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub windows: Vec<usize>,
}

/// Aggregate visibility of a category, drawn as a tri-state checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryState {
    Hidden,
    Mixed,
    Visible,
}

impl CategoryState {
    pub fn from_counts(visible: usize, total: usize) -> Self {
        if visible == total {
            CategoryState::Visible
        } else if visible == 0 {
            CategoryState::Hidden
        } else {
            CategoryState::Mixed
        }
    }
}

/// Insertion-ordered list of categories
#[derive(Debug, Default)]
pub struct CategoryIndex {
    categories: Vec<Category>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    fn find_or_create(&mut self, name: &str) -> &mut Category {
        let index = match self.categories.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.categories.push(Category {
                    name: name.to_string(),
                    windows: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        &mut self.categories[index]
    }

    /// Add a window slot to a category, creating the category on first use
    pub fn insert(&mut self, category: &str, window: usize) {
        let category = self.find_or_create(category);
        if !category.windows.contains(&window) {
            category.windows.push(window);
        }
    }

    /// Move a window slot from one category to another
    ///
    /// The old category stays in the list even when it becomes empty so the
    /// sidebar order does not jump around.
    pub fn reassign(&mut self, window: usize, from: &str, to: &str) {
        if from == to {
            return;
        }
        if let Some(old) = self.categories.iter_mut().find(|c| c.name == from) {
            old.windows.retain(|w| *w != window);
        }
        self.insert(to, window);
    }

    /// Number of categories listing a window slot
    pub fn count_memberships(&self, window: usize) -> usize {
        self.categories
            .iter()
            .filter(|c| c.windows.contains(&window))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_keep_discovery_order() {
        let mut index = CategoryIndex::new();
        index.insert("Default", 0);
        index.insert("Plots", 1);
        index.insert("Images", 2);
        index.insert("Plots", 3);

        let names: Vec<_> = index.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Default", "Plots", "Images"]);
        assert_eq!(index.get("Plots").map(|c| c.windows.clone()), Some(vec![1, 3]));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = CategoryIndex::new();
        index.insert("Default", 0);
        index.insert("Default", 0);
        assert_eq!(index.count_memberships(0), 1);
    }

    #[test]
    fn test_reassign_moves_membership() {
        let mut index = CategoryIndex::new();
        index.insert("Default", 0);
        index.insert("Default", 1);
        index.reassign(0, "Default", "Images");

        assert_eq!(index.count_memberships(0), 1);
        assert_eq!(index.get("Default").map(|c| c.windows.clone()), Some(vec![1]));
        assert_eq!(index.get("Images").map(|c| c.windows.clone()), Some(vec![0]));

        // Same category is a no-op
        index.reassign(1, "Default", "Default");
        assert_eq!(index.count_memberships(1), 1);
    }

    #[test]
    fn test_emptied_category_is_kept() {
        let mut index = CategoryIndex::new();
        index.insert("Default", 0);
        index.reassign(0, "Default", "Plots");
        assert_eq!(index.len(), 2);
        assert!(index.get("Default").is_some_and(|c| c.windows.is_empty()));
    }

    #[test]
    fn test_category_state() {
        assert_eq!(CategoryState::from_counts(0, 3), CategoryState::Hidden);
        assert_eq!(CategoryState::from_counts(2, 3), CategoryState::Mixed);
        assert_eq!(CategoryState::from_counts(3, 3), CategoryState::Visible);
        assert_eq!(CategoryState::from_counts(0, 0), CategoryState::Visible);
    }
}
