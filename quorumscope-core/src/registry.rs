//! Validated component registry.
//!
//! The registry owns the caller's components in the order they were given
//! and precomputes the dependency chain (parent to children) once. Every
//! structural problem is rejected at construction so that the recursive
//! walks in [`crate::dominance`] always terminate.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Component, CoreError};

/// Walk state used by cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Ordered, acyclic set of pipeline components.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    /// Components in caller order.
    components: Vec<Component>,
    /// Name to position in `components`.
    index: HashMap<String, usize>,
    /// Position of each component's dependency.
    parents: Vec<Option<usize>>,
    /// Positions of the components that depend on each component, in
    /// registry order.
    children: Vec<Vec<usize>>,
}

impl ComponentRegistry {
    /// Build a registry, validating names, metrics and the dependency forest.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateComponent`] if two components share a name.
    /// - [`CoreError::InvalidMetric`] if a metric is negative or not finite.
    /// - [`CoreError::UnknownDependency`] if a dependency is not registered.
    /// - [`CoreError::CyclicDependency`] if the dependencies form a cycle.
    pub fn new(components: Vec<Component>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(components.len());
        for (pos, component) in components.iter().enumerate() {
            for (metric, value) in component.numeric_metrics() {
                if !value.is_finite() || value < 0.0 {
                    return Err(CoreError::InvalidMetric {
                        component: component.name.clone(),
                        metric,
                        value,
                    });
                }
            }
            if index.insert(component.name.clone(), pos).is_some() {
                return Err(CoreError::DuplicateComponent(component.name.clone()));
            }
        }

        let mut parents = Vec::with_capacity(components.len());
        let mut children = vec![Vec::new(); components.len()];
        for (pos, component) in components.iter().enumerate() {
            let parent = match &component.dependency {
                None => None,
                Some(dep) => {
                    let parent =
                        *index
                            .get(dep)
                            .ok_or_else(|| CoreError::UnknownDependency {
                                component: component.name.clone(),
                                dependency: dep.clone(),
                            })?;
                    children[parent].push(pos);
                    Some(parent)
                }
            };
            parents.push(parent);
        }

        let registry = Self {
            components,
            index,
            parents,
            children,
        };
        registry.check_acyclic()?;

        debug!(
            components = registry.len(),
            roots = registry.roots().count(),
            "component registry built"
        );
        Ok(registry)
    }

    /// Follow dependency pointers from every component, failing on the first
    /// pointer that leads back onto the current path.
    fn check_acyclic(&self) -> Result<(), CoreError> {
        let mut marks = vec![Mark::Unvisited; self.components.len()];

        for start in 0..self.components.len() {
            let mut path: Vec<usize> = Vec::new();
            let mut cursor = Some(start);

            while let Some(pos) = cursor {
                match marks[pos] {
                    Mark::Done => break,
                    Mark::OnPath => {
                        let from = path.iter().position(|&p| p == pos).unwrap_or(0);
                        let mut cycle: Vec<String> = path[from..]
                            .iter()
                            .map(|&p| self.components[p].name.clone())
                            .collect();
                        cycle.push(self.components[pos].name.clone());
                        return Err(CoreError::CyclicDependency { cycle });
                    }
                    Mark::Unvisited => {
                        marks[pos] = Mark::OnPath;
                        path.push(pos);
                        cursor = self.parents[pos];
                    }
                }
            }

            for pos in path {
                marks[pos] = Mark::Done;
            }
        }
        Ok(())
    }

    /// Look up a component by name.
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.position(name).map(|pos| &self.components[pos])
    }

    /// Components that declare `name` as their dependency, in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownComponent`] if `name` is not registered.
    pub fn children<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = &'a Component> + 'a, CoreError> {
        let pos = self
            .position(name)
            .ok_or_else(|| CoreError::UnknownComponent(name.to_string()))?;
        Ok(self.children[pos].iter().map(|&c| &self.components[c]))
    }

    /// Components without a dependency, in registry order.
    pub fn roots(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.is_root())
    }

    /// All components in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    /// All components in registry order, as a slice.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the registry holds no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn component_at(&self, pos: usize) -> &Component {
        &self.components[pos]
    }

    pub(crate) fn parent_of(&self, pos: usize) -> Option<usize> {
        self.parents[pos]
    }

    pub(crate) fn children_of(&self, pos: usize) -> &[usize] {
        &self.children[pos]
    }
}
