use indexmap::IndexMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Symbol {id} already registered as '{existing}' (attempted '{attempted}')")]
    Duplicate {
        id: String,
        existing: String,
        attempted: String,
    },
}

/// Final emitted name of one symbol and the module declaring it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredName {
    pub name: String,
    /// Rust module path such as `crate::shapes::circle`; empty for members
    pub module: String,
}

/// Run-wide table from symbol identifier to emitted name.
///
/// Written once per symbol while units are declared, read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    names: IndexMap<String, RegisteredName>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member (method, constructor, field) name
    pub fn register(&mut self, id: &str, name: &str) -> Result<(), RegistryError> {
        self.register_in(id, name, "")
    }

    /// Register a top-level item living in `module`
    pub fn register_in(&mut self, id: &str, name: &str, module: &str) -> Result<(), RegistryError> {
        if let Some(existing) = self.names.get(id) {
            return Err(RegistryError::Duplicate {
                id: id.to_string(),
                existing: existing.name.clone(),
                attempted: name.to_string(),
            });
        }
        self.names.insert(
            id.to_string(),
            RegisteredName {
                name: name.to_string(),
                module: module.to_string(),
            },
        );
        Ok(())
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(|n| n.name.as_str())
    }

    pub fn module_of(&self, id: &str) -> Option<&str> {
        self.names
            .get(id)
            .map(|n| n.module.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Type name as seen from `from_module`: bare when local, full path otherwise
    pub fn display_type(&self, id: &str, from_module: &str) -> Option<String> {
        let entry = self.names.get(id)?;
        if entry.module.is_empty() || entry.module == from_module {
            Some(entry.name.clone())
        } else {
            Some(format!("{}::{}", entry.module, entry.name))
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// `m`, `m_1`, `m_2`... for the n-th overload of a name
pub fn overload_name(base: &str, ordinal: usize) -> String {
    if ordinal == 0 {
        base.to_string()
    } else {
        format!("{base}_{ordinal}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = NameRegistry::new();
        registry.register("p.A.m()", "m").unwrap();
        let err = registry.register("p.A.m()", "m_1").unwrap_err();
        assert_eq!(
            err,
            RegistryError::Duplicate {
                id: "p.A.m()".into(),
                existing: "m".into(),
                attempted: "m_1".into(),
            }
        );
        assert_eq!(registry.name_of("p.A.m()"), Some("m"));
    }

    #[test]
    fn display_type_uses_path_outside_own_module() {
        let mut registry = NameRegistry::new();
        registry
            .register_in("p.Shape", "Shape", "crate::p::shape")
            .unwrap();
        assert_eq!(
            registry.display_type("p.Shape", "crate::p::shape").as_deref(),
            Some("Shape")
        );
        assert_eq!(
            registry.display_type("p.Shape", "crate::q::other").as_deref(),
            Some("crate::p::shape::Shape")
        );
        assert_eq!(registry.display_type("p.Missing", "crate"), None);
    }

    #[test]
    fn overload_names_are_numbered() {
        let names: Vec<String> = (0..3).map(|i| overload_name("new", i)).collect();
        assert_eq!(names, vec!["new", "new_1", "new_2"]);
    }
}
