//! Declared storage schemas for every source the lake knows about.
//!
//! The registry is plain data: an ordered list of column declarations per
//! source, built once on first access and never mutated afterwards.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage-level type of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Timestamp,
    Int32,
    Float64,
    Text,
}

impl SemanticType {
    pub fn data_type(&self) -> DataType {
        match self {
            SemanticType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
            SemanticType::Int32 => DataType::Int32,
            SemanticType::Float64 => DataType::Float64,
            SemanticType::Text => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDecl {
    pub name: &'static str,
    pub semantic_type: SemanticType,
}

#[derive(Debug, Clone)]
pub struct SchemaDeclaration {
    pub source_name: &'static str,
    pub columns: Vec<ColumnDecl>,
}

impl SchemaDeclaration {
    fn new(source_name: &'static str, columns: &[(&'static str, SemanticType)]) -> Self {
        Self {
            source_name,
            columns: columns
                .iter()
                .map(|&(name, semantic_type)| ColumnDecl {
                    name,
                    semantic_type,
                })
                .collect(),
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    pub fn data_type_of(&self, column: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.semantic_type.data_type())
    }

    /// Every declared column is nullable: missing values are data, not errors.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name, c.semantic_type.data_type(), true))
            .collect();
        Arc::new(Schema::new(fields))
    }
}

static REGISTRY: Lazy<HashMap<&'static str, SchemaDeclaration>> = Lazy::new(|| {
    use SemanticType::*;

    let declarations = [
        SchemaDeclaration::new(
            "rte",
            &[
                ("event_datetime", Timestamp),
                ("annee", Int32),
                ("mois", Int32),
                ("jour", Int32),
                ("Consommation (MW)", Float64),
                ("Solaire (MW)", Float64),
                ("Eolien (MW)", Float64),
                ("Hydraulique (MW)", Float64),
                ("Bioénergies (MW)", Float64),
            ],
        ),
        SchemaDeclaration::new(
            "world_bank",
            &[
                ("pays", Text),
                ("code_pays", Text),
                ("annee", Int32),
                ("part_renouvelable_hors_hydro_pct", Float64),
            ],
        ),
        SchemaDeclaration::new(
            "stock_prices",
            &[
                ("date", Timestamp),
                ("nom_entreprise", Text),
                ("symbole_action", Text),
                ("ouverture", Float64),
                ("max_jour", Float64),
                ("annee", Int32),
                ("min_jour", Float64),
                ("cloture", Float64),
                ("volume", Float64),
            ],
        ),
    ];

    declarations
        .into_iter()
        .map(|decl| (decl.source_name, decl))
        .collect()
});

/// Looks up the declared schema of a source. `None` means the storage layer
/// does not know the source at all, which is different from "no data yet".
pub fn schema_for(source_name: &str) -> Option<&'static SchemaDeclaration> {
    REGISTRY.get(source_name)
}
