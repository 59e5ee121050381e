//! Materializer settings

use std::collections::HashSet;

use crate::shape::{OpenCheckExemption, TypeShape};

/// Settings of a [Materializer](crate::Materializer)
///
/// By default only shapes carrying the "all open" marker are exempt from the
/// extensibility check. More types can be exempted by name.
///
/// ```
/// use lazy_proxy::{Materializer, MaterializerConfig};
///
/// let config = MaterializerConfig::default().exempt("Settings");
/// let materializer = Materializer::new(config);
/// ```
#[derive(Clone, Debug)]
pub struct MaterializerConfig {
    exempt_types: HashSet<String>,
    honor_marker: bool,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            exempt_types: HashSet::new(),
            honor_marker: true,
        }
    }
}

impl MaterializerConfig {
    /// Exempt a type from the extensibility check, by name
    pub fn exempt(mut self, type_name: impl Into<String>) -> Self {
        self.exempt_types.insert(type_name.into());
        self
    }

    /// Select if the "all open" marker of a shape exempts it
    pub fn honor_marker(mut self, honor: bool) -> Self {
        self.honor_marker = honor;
        self
    }

    pub fn exempt_types(&self) -> impl Iterator<Item = &str> {
        self.exempt_types.iter().map(String::as_str)
    }
}

impl OpenCheckExemption for MaterializerConfig {
    fn is_exempt_from_open_check(&self, shape: &TypeShape) -> bool {
        (self.honor_marker && shape.is_all_open()) || self.exempt_types.contains(shape.name())
    }
}
