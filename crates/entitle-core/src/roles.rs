//! Role sufficiency policy.
//!
//! Role comparison is driven by an equivalence-class table rather than
//! inline conditionals: roles in the same class satisfy each other, and
//! any role outside every class (including `admin`) requires an exact
//! match. New equivalences are configuration, not code changes.

/// Data-driven role equivalence policy.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    classes: Vec<Vec<String>>,
}

impl RolePolicy {
    /// Build a policy from explicit equivalence classes.
    pub fn with_classes<I, C, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes
                .into_iter()
                .map(|class| {
                    class
                        .into_iter()
                        .map(|role| role.into().to_lowercase())
                        .collect()
                })
                .collect(),
        }
    }

    /// True when `effective` is sufficient for a route requiring `required`.
    ///
    /// Exact match always passes. Otherwise the two roles must share an
    /// equivalence class.
    pub fn satisfies(&self, effective: &str, required: &str) -> bool {
        let effective = effective.to_lowercase();
        let required = required.to_lowercase();

        if effective == required {
            return true;
        }

        self.classes
            .iter()
            .any(|class| class.contains(&effective) && class.contains(&required))
    }
}

impl Default for RolePolicy {
    /// The platform default: `operations` and `manager` are mutually
    /// sufficient; everything else is exact-match.
    fn default() -> Self {
        Self::with_classes([["operations", "manager"]])
    }
}
