//! Closed intermediate representation for RELAX NG patterns.
//!
//! Every consumer pattern-matches exhaustively over these variants instead
//! of probing loosely typed nodes.

/// Name class of an element or attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameClass {
    /// A single declared name.
    Named(String),
    /// `<anyName/>` wildcard.
    Any,
    /// `<choice>` over candidate names. Extraction takes the first name;
    /// this is a documented simplification of grammar alternation.
    Choice(Vec<String>),
}

impl NameClass {
    /// First extractable concrete name, if any.
    pub fn primary(&self) -> Option<&str> {
        match self {
            NameClass::Named(name) => Some(name),
            NameClass::Any => None,
            NameClass::Choice(names) => names.first().map(String::as_str),
        }
    }
}

/// One RELAX NG pattern node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Element { name: NameClass, body: Vec<Pattern> },
    Attribute {
        name: NameClass,
        value: Option<Box<Pattern>>,
    },
    Optional(Vec<Pattern>),
    ZeroOrMore(Vec<Pattern>),
    OneOrMore(Vec<Pattern>),
    Group(Vec<Pattern>),
    Interleave(Vec<Pattern>),
    Choice(Vec<Pattern>),
    Mixed(Vec<Pattern>),
    Ref(String),
    Text,
    Empty,
    Data { datatype: String },
    Value(String),
}
