// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Field catalog
//
// The static, ordered list of fields for one form. Visibility links are
// resolved once at construction; the catalog never changes afterwards.

use crate::field::{FieldDescriptor, VisibilityRule};
use crate::types::CatalogError;
use serde::Deserialize;
use std::collections::HashMap;

/// Ordered, validated collection of field descriptors
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    id: String,
    title: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    /// dependent index -> controller index
    controller_of: HashMap<usize, usize>,
}

#[derive(Deserialize)]
struct CatalogFile {
    title: String,
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    /// Build a catalog, rejecting any misconfiguration
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, CatalogError> {
        let index = index_keys(&fields)?;
        let (controller_of, problems) = resolve_links(&fields, &index);
        if let Some(problem) = problems.into_iter().next() {
            return Err(problem);
        }

        Ok(Self {
            id: id.into(),
            title: title.into(),
            fields,
            index,
            controller_of,
        })
    }

    /// Build a catalog, dropping broken visibility links.
    ///
    /// Dependents of a broken link are always visible. Duplicate keys and
    /// option-less selects are still rejected. Debug builds panic instead.
    pub fn lenient(
        id: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, CatalogError> {
        let id = id.into();
        let index = index_keys(&fields)?;
        let (controller_of, problems) = resolve_links(&fields, &index);

        for problem in &problems {
            tracing::warn!(catalog = %id, "Catalog misconfigured, degrading: {}", problem);
        }
        debug_assert!(
            problems.is_empty(),
            "catalog misconfigured: {:?}",
            problems
        );

        Ok(Self {
            id,
            title: title.into(),
            fields,
            index,
            controller_of,
        })
    }

    /// Load a catalog definition (`{"title": .., "fields": [..]}`)
    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| CatalogError::Definition(e.to_string()))?;
        Self::new(id, file.title, file.fields)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index_of(key).map(|i| &self.fields[i])
    }

    /// The controller gating the field at `index`, with its rule
    pub fn controller_of(&self, index: usize) -> Option<(&FieldDescriptor, &VisibilityRule)> {
        let controller = &self.fields[*self.controller_of.get(&index)?];
        let gate = controller.gate.as_ref()?;
        Some((controller, &gate.visible_when))
    }

    /// True if some controller gates the field at `index`
    pub fn is_conditional(&self, index: usize) -> bool {
        self.controller_of.contains_key(&index)
    }
}

fn index_keys(fields: &[FieldDescriptor]) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if index.insert(field.key.clone(), i).is_some() {
            return Err(CatalogError::DuplicateKey(field.key.clone()));
        }
        if matches!(field.kind.options(), Some(options) if options.is_empty()) {
            return Err(CatalogError::MissingOptions(field.key.clone()));
        }
    }
    Ok(index)
}

/// Resolve gates into dependent -> controller links.
///
/// Returns the links that survived and every problem found. A link that is
/// part of a problem is dropped, so its dependent becomes unconditional.
fn resolve_links(
    fields: &[FieldDescriptor],
    index: &HashMap<String, usize>,
) -> (HashMap<usize, usize>, Vec<CatalogError>) {
    let mut problems = Vec::new();
    let mut candidates: HashMap<usize, Vec<usize>> = HashMap::new();

    for (controller, field) in fields.iter().enumerate() {
        let Some(gate) = &field.gate else { continue };
        for dependent_key in &gate.controls {
            match index.get(dependent_key) {
                None => problems.push(CatalogError::UnknownDependent {
                    controller: field.key.clone(),
                    dependent: dependent_key.clone(),
                }),
                Some(&dependent) if dependent == controller => {
                    problems.push(CatalogError::SelfControl(field.key.clone()))
                }
                Some(&dependent) => candidates.entry(dependent).or_default().push(controller),
            }
        }
        for dependent_key in &gate.conflicting {
            problems.push(CatalogError::ConflictingRule {
                controller: field.key.clone(),
                dependent: dependent_key.clone(),
            });
        }
    }

    let mut links = HashMap::new();
    for (dependent, controllers) in candidates {
        if controllers.len() > 1 {
            problems.push(CatalogError::MultipleControllers {
                dependent: fields[dependent].key.clone(),
            });
        } else {
            links.insert(dependent, controllers[0]);
        }
    }

    // Depth one only: a controller must not be conditional itself
    let nested: Vec<usize> = links
        .values()
        .copied()
        .filter(|controller| links.contains_key(controller))
        .collect();
    for controller in nested {
        let before = links.len();
        links.retain(|_, c| *c != controller);
        if links.len() != before {
            problems.push(CatalogError::NestedCondition {
                controller: fields[controller].key.clone(),
            });
        }
    }

    (links, problems)
}
