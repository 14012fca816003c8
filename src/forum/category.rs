//! Category model for Agora.

/// A named grouping of threads.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    /// Unique category name.
    pub name: String,
    pub description: String,
    /// Number of threads in the category, of any status.
    pub thread_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

impl NewCategory {
    /// Create a new category with an empty description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Data for updating an existing category.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
