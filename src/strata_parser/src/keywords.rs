use phf::phf_set;

/// Structural keywords of the language. None of these may be used as an
/// identifier or an import alias.
pub static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "schema",
    "import",
    "as",
    "datatype",
    "type",
    "abstract",
    "part",
    "optional",
    "primary",
    "association",
    "composition",
    "invariant",
    "backref",
    "and",
    "or",
    "not",
    "true",
    "false",
};

/// Builtin constraint heads. Reserved so datatypes cannot shadow them.
pub static BUILTIN_CONSTRAINTS: phf::Set<&'static str> = phf_set! {
    "String",
    "Integer",
    "Float",
    "Boolean",
    "Timestamp",
    "Date",
    "UUID",
    "Enum",
    "Pattern",
    "Vector",
    "List",
};

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

pub fn is_reserved(word: &str) -> bool {
    KEYWORDS.contains(word) || BUILTIN_CONSTRAINTS.contains(word)
}
