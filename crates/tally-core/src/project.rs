//! Projects that time can be tracked against.

use serde::Serialize;

use crate::types::{ProjectId, ValidationError, non_empty};

/// A named project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    id: ProjectId,
    name: String,
}

impl Project {
    /// Creates a project from a display name, trimming surrounding whitespace.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: ProjectId::generate(),
            name: non_empty("project name", name)?,
        })
    }

    pub const fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The ordered list of known projects.
///
/// Projects are only ever added; nothing is renamed, merged or removed.
#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a list of names, in order.
    pub fn seeded<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self::new();
        for name in names {
            catalog.add(name.as_ref())?;
        }
        Ok(catalog)
    }

    /// Adds a project and returns it.
    ///
    /// Duplicate names are accepted; each project still gets its own id.
    pub fn add(&mut self, name: &str) -> Result<&Project, ValidationError> {
        let project = Project::new(name)?;
        tracing::debug!(id = %project.id(), name = project.name(), "project added");
        let index = self.projects.len();
        self.projects.push(project);
        Ok(&self.projects[index])
    }

    /// Looks a project up by 1-based position or by name.
    ///
    /// Positions are tried first, so a numeric name is only reached when no
    /// project sits at that position. Exact names win over case-insensitive
    /// matches; among equal names the first added wins.
    pub fn resolve(&self, selector: &str) -> Option<&Project> {
        let selector = selector.trim();
        let by_position = selector
            .parse::<usize>()
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| self.projects.get(index));

        by_position
            .or_else(|| self.projects.iter().find(|p| p.name() == selector))
            .or_else(|| {
                let wanted = selector.to_lowercase();
                self.projects
                    .iter()
                    .find(|p| p.name().to_lowercase() == wanted)
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProjectCatalog {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
