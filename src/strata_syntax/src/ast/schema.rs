use crate::ast::{DataTypeDecl, TypeDecl};
use crate::source::Span;
use serde::Serialize;

/// One parsed schema file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDecl {
    pub name: String,
    pub span: Span,
    pub name_span: Span,
    pub doc: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub data_types: Vec<DataTypeDecl>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
    pub span: Span,
    pub path_span: Span,
    pub alias_span: Option<Span>,
}

impl ImportDecl {
    /// The alias under which the imported schema is visible: the declared
    /// alias, or the last path segment with the extension stripped.
    pub fn effective_alias(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        let tail = self
            .path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str());
        match tail.split_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => tail.to_string(),
        }
    }

    /// The span diagnostics about the alias should point at.
    pub fn alias_anchor(&self) -> &Span {
        self.alias_span.as_ref().unwrap_or(&self.path_span)
    }
}
