//! Layout reconstruction algorithms.
//!
//! This module provides the per-page analysis stages and the document
//! aggregator that runs them:
//! - Header detection and block typing from font-size statistics
//! - Deterministic column partitioning
//! - Table detection from aligned rows
//! - Pairwise spatial relationships
//! - Reading order determination

pub mod classifier;
pub mod column_detector;
pub mod document_analyzer;
pub mod reading_order;
pub mod spatial;
pub mod table_detector;

// Re-export main types
pub use classifier::{classify_elements, BlockType, Classification, Header, TextBlock};
pub use column_detector::{partition_columns, Column};
pub use document_analyzer::{
    analyze, Diagnostic, DiagnosticKind, DocumentLayout, DocumentType, GlobalStructure,
    LayoutAnalyzer, PageAnalysis, PageLayout,
};
pub use reading_order::{determine_reading_order, ReadingEntry, ReadingMode};
pub use spatial::{build_relationships, classify_pair, Relationship, RelationshipKind};
pub use table_detector::{detect_tables, CandidateRow, Table, TableKind};
