//! Model configuration
//!
//! A [`DatabaseConfiguration`] describes how entities map onto tables. The
//! database builder runs it once through a [`ModelBuilder`] and the resulting
//! [`Model`] travels with every database handle.

use std::collections::HashMap;

/// User-supplied mapping rules
pub trait DatabaseConfiguration: Send + Sync {
    /// Describe the entity mappings
    fn on_model_creating(&self, model: &mut ModelBuilder);
}

/// Mapping of one entity onto its table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapping {
    entity: String,
    table_name: Option<String>,
    primary_key: Option<String>,
    uses_id_generator: bool,
}

impl EntityMapping {
    fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            table_name: None,
            primary_key: None,
            uses_id_generator: false,
        }
    }

    /// Map the entity onto a table; defaults to the entity name
    pub fn has_table_name(&mut self, table_name: impl Into<String>) -> &mut Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Name the primary key column
    pub fn has_primary_key(&mut self, column: impl Into<String>) -> &mut Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Fill the primary key from the ID generator of the entity's table
    pub fn use_id_generator(&mut self) -> &mut Self {
        self.uses_id_generator = true;
        self
    }

    /// Entity name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Table the entity is stored in
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.entity)
    }

    /// Primary key column, if configured
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Whether keys come from the ID generator
    pub fn uses_id_generator(&self) -> bool {
        self.uses_id_generator
    }
}

/// Collects entity mappings while a configuration runs
#[derive(Debug, Default)]
pub struct ModelBuilder {
    entities: HashMap<String, EntityMapping>,
}

impl ModelBuilder {
    /// Create an empty model builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start or continue configuring an entity
    pub fn entity(&mut self, name: &str) -> &mut EntityMapping {
        self.entities
            .entry(name.to_string())
            .or_insert_with(|| EntityMapping::new(name))
    }

    /// Freeze the collected mappings
    pub fn build(self) -> Model {
        Model {
            entities: self.entities,
        }
    }
}

/// Immutable set of entity mappings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    entities: HashMap<String, EntityMapping>,
}

impl Model {
    /// Run a configuration and collect its mappings
    pub fn from_configuration(configuration: &dyn DatabaseConfiguration) -> Self {
        let mut builder = ModelBuilder::new();
        configuration.on_model_creating(&mut builder);
        builder.build()
    }

    /// Mapping for an entity, if configured
    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.get(name)
    }

    /// Table for an entity; unmapped entities use their own name
    pub fn table_name<'a>(&'a self, entity: &'a str) -> &'a str {
        self.entities
            .get(entity)
            .map(EntityMapping::table_name)
            .unwrap_or(entity)
    }

    /// Iterate all mappings
    pub fn entities(&self) -> impl Iterator<Item = &EntityMapping> {
        self.entities.values()
    }

    /// Number of mapped entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if no entity is mapped
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config;

    impl DatabaseConfiguration for Config {
        fn on_model_creating(&self, model: &mut ModelBuilder) {
            model
                .entity("Person")
                .has_table_name("People")
                .has_primary_key("Id")
                .use_id_generator();
            model.entity("Invoice").has_primary_key("InvoiceId");
        }
    }

    #[test]
    fn test_model_from_configuration() {
        let model = Model::from_configuration(&Config);

        assert_eq!(model.len(), 2);
        assert_eq!(model.table_name("Person"), "People");
        assert_eq!(model.table_name("Invoice"), "Invoice");
        assert_eq!(model.table_name("Unmapped"), "Unmapped");

        let person = model.entity("Person").unwrap();
        assert_eq!(person.primary_key(), Some("Id"));
        assert!(person.uses_id_generator());
        assert!(!model.entity("Invoice").unwrap().uses_id_generator());
    }

    #[test]
    fn test_entity_is_reused() {
        let mut builder = ModelBuilder::new();
        builder.entity("Person").has_table_name("People");
        builder.entity("Person").has_primary_key("Id");

        let model = builder.build();
        let person = model.entity("Person").unwrap();
        assert_eq!(person.table_name(), "People");
        assert_eq!(person.primary_key(), Some("Id"));
    }
}
