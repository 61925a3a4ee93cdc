//! Options controlling how NGW layers become Arrow tables.

/// Column naming for converted layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgwFormatOptions {
    /// Name of the geometry column in the output schema.
    pub geometry_column_name: String,
    /// Name of the feature id column in the output schema.
    pub fid_column_name: String,
    /// Prefix of table names when a whole catalog is registered.
    pub table_prefix: String,
}

impl Default for NgwFormatOptions {
    fn default() -> Self {
        Self {
            geometry_column_name: "geometry".to_string(),
            fid_column_name: "fid".to_string(),
            table_prefix: "layer_".to_string(),
        }
    }
}

impl NgwFormatOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_geometry_column_name(mut self, name: impl Into<String>) -> Self {
        self.geometry_column_name = name.into();
        self
    }

    #[must_use]
    pub fn with_fid_column_name(mut self, name: impl Into<String>) -> Self {
        self.fid_column_name = name.into();
        self
    }

    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Table name for the layer called `layer_name`.
    #[must_use]
    pub fn table_name(&self, layer_name: &str) -> String {
        format!("{}{layer_name}", self.table_prefix)
    }
}
