use crate::errors::ParseFailure;
use crate::{Input, declarations};
use log::debug;
use nom::Finish;
use strata_syntax::ast::SchemaDecl;
use strata_syntax::source::SourceId;

/// Public parser facade.
#[derive(Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Parser
    }

    /// Parses one schema document. The caller owns registration of the
    /// bytes in the source registry; spans in the returned model carry the
    /// given source id.
    pub fn parse(&self, id: &SourceId, text: &str) -> Result<SchemaDecl, ParseFailure> {
        let input = Input::new_extra(text, id);
        match declarations::schema_file(input).finish() {
            Ok((_, decl)) => {
                debug!(
                    "parsed schema {} from {id}: {} import(s), {} datatype(s), {} type(s)",
                    decl.name,
                    decl.imports.len(),
                    decl.data_types.len(),
                    decl.types.len()
                );
                Ok(decl)
            }
            Err(error) => Err(ParseFailure::from_tree(&error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
/// Library domain.
schema Library

import "common/base" as base
import "tags.strata"

/// Electronic mail address.
datatype Email = Pattern("^[^@]+@[^@]+$")
datatype Age = Integer[0, 150]
datatype Tags = List<String[1, 32]>[, 16]

/// Anything with an identity.
abstract type Resource {
    id: UUID primary
    name: String[1, 200]
    optional note: String
}

type Book : Resource, base.Archivable {
    isbn: Email
    pages: Integer[1,]
    invariant HasPages: pages > 0

    association WrittenBy -> Author * backref wrote ? * {
        royalty: Float[0.0, 1.0]
    }
    composition HasChapter -> Chapter *
}

part type Chapter {
    title: String[1, 100]
    seq: Integer[0,]
}

type Author : Resource {
    email: Email
}
"#;

    #[test]
    fn parses_the_full_surface() {
        let id = SourceId::synthetic("string://sample");
        let decl = Parser::new().parse(&id, SAMPLE).expect("sample parses");
        assert_eq!(decl.name, "Library");
        assert_eq!(decl.imports.len(), 2);
        assert_eq!(decl.imports[0].effective_alias(), "base");
        assert_eq!(decl.imports[1].effective_alias(), "tags");
        assert_eq!(decl.data_types.len(), 3);
        assert_eq!(decl.types.len(), 4);

        let resource = &decl.types[0];
        assert!(resource.is_abstract);
        assert_eq!(resource.doc.as_deref(), Some("Anything with an identity."));
        assert_eq!(resource.properties.len(), 3);
        assert!(resource.properties[0].primary);
        assert!(resource.properties[2].optional);

        let book = &decl.types[1];
        assert_eq!(book.inherits.len(), 2);
        assert_eq!(book.inherits[1].qualifier.as_deref(), Some("base"));
        assert_eq!(book.associations.len(), 1);
        assert_eq!(book.compositions.len(), 1);
        assert_eq!(book.invariants.len(), 1);

        let written_by = &book.associations[0];
        assert!(written_by.forward_many);
        assert!(!written_by.forward_optional);
        assert_eq!(written_by.backref.as_deref(), Some("wrote"));
        assert!(written_by.reverse_optional);
        assert!(written_by.reverse_many);
        assert_eq!(written_by.properties.len(), 1);

        let chapter = &decl.types[2];
        assert!(chapter.is_part);
    }

    #[test]
    fn reports_the_deepest_failure() {
        let id = SourceId::synthetic("string://bad");
        let text = "schema Broken\n\ntype X {\n  name String\n}\n";
        let failure = Parser::new().parse(&id, text).unwrap_err();
        // the parser got past `name` and stalled at the missing colon
        assert!(failure.offset >= text.find("String").unwrap() - 1);
        let rendered = failure.render(text);
        assert!(rendered.contains("expected"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn name_spans_point_at_declared_names() {
        let id = SourceId::synthetic("string://spans");
        let text = "schema S\n\ntype Only {\n  id: UUID primary\n}\n";
        let decl = Parser::new().parse(&id, text).unwrap();
        let only = &decl.types[0];
        let start = only.name_span.start.byte;
        let end = only.name_span.end.byte;
        assert_eq!(&text[start..end], "Only");
        assert_eq!(only.name_span.start.line, 3);
        assert_eq!(only.name_span.start.column, 6);
    }
}
