// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Visibility resolution

use crate::answers::AnswerStore;
use crate::catalog::FieldCatalog;

/// Decide whether the field at catalog `index` is currently relevant.
///
/// Fields without a controller are always visible. A gated field is visible
/// when its controller's rule holds for the controller's current answer.
pub fn is_visible(catalog: &FieldCatalog, index: usize, answers: &AnswerStore) -> bool {
    match catalog.controller_of(index) {
        None => true,
        Some((controller, rule)) => rule.matches(answers.get(&controller.key)),
    }
}

/// Catalog indices of every visible field, in declared order
pub fn visible_indices(catalog: &FieldCatalog, answers: &AnswerStore) -> Vec<usize> {
    (0..catalog.len())
        .filter(|&i| is_visible(catalog, i, answers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldKind, VisibilityRule};

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(
            "t",
            "T",
            vec![
                FieldDescriptor::new("a", "A", FieldKind::single_select(["OK", "NotOK"]))
                    .controls("b", VisibilityRule::equals("NotOK")),
                FieldDescriptor::new("b", "B", FieldKind::Text),
                FieldDescriptor::new("c", "C", FieldKind::single_select(["X", "Y"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_unconditional_fields_always_visible() {
        let catalog = catalog();
        let answers = AnswerStore::new();
        assert!(is_visible(&catalog, 0, &answers));
        assert!(is_visible(&catalog, 2, &answers));
        assert!(!is_visible(&catalog, 1, &answers));
    }

    #[test]
    fn test_dependent_follows_controller() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers.set("a", "OK");
        assert_eq!(visible_indices(&catalog, &answers), vec![0, 2]);
        answers.set("a", "NotOK");
        assert_eq!(visible_indices(&catalog, &answers), vec![0, 1, 2]);
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let catalog = catalog();
        let mut answers = AnswerStore::new();
        answers.set("a", "NotOK");
        let first: Vec<bool> = (0..3).map(|i| is_visible(&catalog, i, &answers)).collect();
        let second: Vec<bool> = (0..3).map(|i| is_visible(&catalog, i, &answers)).collect();
        assert_eq!(first, second);
    }
}
