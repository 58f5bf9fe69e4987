//! Constraint grammar parser.
//!
//! Parses the XML syntax of RELAX NG (the subset TEI customizations use for
//! element/attribute/content checking) into a [`Pattern`] tree, then resolves
//! named defines into the normalized [`ParsedConstraints`] table.
//!
//! Alternation between candidate declarations (`<choice>`) is resolved by
//! taking the first extractable branch. That is a simplification of full
//! RELAX NG choice semantics, kept deliberately; see DESIGN.md.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::constraints::{
    AttributeConstraint, AttributeType, ContentModel, ParsedConstraints, TagConstraint,
};
use crate::error::{Result, SchemaError};
use crate::pattern::{NameClass, Pattern};

/// Parse a grammar document into its normalized rule set.
///
/// Malformed input fails with an error carrying the byte offset; no partial
/// result is ever returned.
pub fn parse_grammar(source: &str) -> Result<ParsedConstraints> {
    let root = parse_xml_tree(source)?;
    let (defines, start) = interpret_root(&root)?;
    if defines.is_empty() && start.is_empty() {
        return Err(SchemaError::NoStart);
    }
    let constraints = extract_constraints(&defines, &start)?;
    tracing::debug!(tags = constraints.len(), "parsed constraint grammar");
    Ok(constraints)
}

// ---------------------------------------------------------------------------
// Stage 1: XML tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct XmlElement {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn parse_xml_tree(source: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(source);
    let config = reader.config_mut();
    config.trim_text_start = true;
    config.trim_text_end = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|source| SchemaError::Xml {
            location: position,
            source,
        })?;
        match event {
            Event::Start(start) => {
                let node = element_from_start(&start, position)?;
                stack.push(node);
            }
            Event::Empty(start) => {
                let node = element_from_start(&start, position)?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    SchemaError::malformed(position, "close tag without matching open tag")
                })?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&unescape(&String::from_utf8_lossy(&text)));
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&unescape(&format!(
                        "&{};",
                        String::from_utf8_lossy(&reference)
                    )));
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(SchemaError::malformed(
            reader.buffer_position(),
            "unclosed element at end of input",
        ));
    }
    root.ok_or_else(|| SchemaError::malformed(0, "empty grammar document"))
}

fn element_from_start(
    start: &quick_xml::events::BytesStart<'_>,
    position: u64,
) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = BTreeMap::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| {
            SchemaError::malformed(position, format!("bad attribute: {error}"))
        })?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = unescape(&String::from_utf8_lossy(&attribute.value));
        attributes.insert(key, value);
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    node: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    position: u64,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(SchemaError::malformed(
            position,
            "multiple root elements in grammar document",
        ));
    }
    *root = Some(node);
    Ok(())
}

/// Resolve the five predefined XML entities. Grammar text content is plain
/// literals, so this is all the unescaping the subset needs.
fn unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ---------------------------------------------------------------------------
// Stage 2: pattern tree
// ---------------------------------------------------------------------------

type Defines = BTreeMap<String, Vec<Pattern>>;

fn interpret_root(root: &XmlElement) -> Result<(Defines, Vec<Pattern>)> {
    match root.name.as_str() {
        "grammar" => {
            let mut defines = Defines::new();
            let mut start = Vec::new();
            for child in &root.children {
                match child.name.as_str() {
                    "define" => {
                        let name = child.attr("name").ok_or_else(|| {
                            SchemaError::malformed(0, "define without a name attribute")
                        })?;
                        let body = build_patterns(&child.children)?;
                        // First definition wins; a tag name maps to exactly
                        // one constraint per parsed grammar.
                        defines.entry(name.to_string()).or_insert(body);
                    }
                    "start" => {
                        start = build_patterns(&child.children)?;
                    }
                    "include" | "div" => {
                        // Flatten: nested defines inside divs are rare in the
                        // supported subset but harmless to pick up.
                        let (nested, nested_start) = interpret_root(&XmlElement {
                            name: "grammar".to_string(),
                            attributes: BTreeMap::new(),
                            children: child.children.clone(),
                            text: String::new(),
                        })?;
                        for (name, body) in nested {
                            defines.entry(name).or_insert(body);
                        }
                        if start.is_empty() {
                            start = nested_start;
                        }
                    }
                    _ => {}
                }
            }
            Ok((defines, start))
        }
        // A bare element is a legal top-level grammar in RELAX NG.
        "element" => Ok((Defines::new(), vec![build_pattern(root)?])),
        other => Err(SchemaError::malformed(
            0,
            format!("unexpected root element <{other}>, expected <grammar>"),
        )),
    }
}

fn build_patterns(nodes: &[XmlElement]) -> Result<Vec<Pattern>> {
    nodes.iter().map(build_pattern).collect()
}

fn build_pattern(node: &XmlElement) -> Result<Pattern> {
    match node.name.as_str() {
        "element" => {
            let (name, body_nodes) = split_name_class(node)?;
            Ok(Pattern::Element {
                name,
                body: build_patterns(&body_nodes)?,
            })
        }
        "attribute" => {
            let (name, body_nodes) = split_name_class(node)?;
            let mut body = build_patterns(&body_nodes)?;
            let value = if body.is_empty() {
                None
            } else {
                Some(Box::new(if body.len() == 1 {
                    body.remove(0)
                } else {
                    Pattern::Group(body)
                }))
            };
            Ok(Pattern::Attribute { name, value })
        }
        "optional" => Ok(Pattern::Optional(build_patterns(&node.children)?)),
        "zeroOrMore" => Ok(Pattern::ZeroOrMore(build_patterns(&node.children)?)),
        "oneOrMore" => Ok(Pattern::OneOrMore(build_patterns(&node.children)?)),
        "group" => Ok(Pattern::Group(build_patterns(&node.children)?)),
        "interleave" => Ok(Pattern::Interleave(build_patterns(&node.children)?)),
        "choice" => Ok(Pattern::Choice(build_patterns(&node.children)?)),
        "mixed" => Ok(Pattern::Mixed(build_patterns(&node.children)?)),
        "ref" => {
            let name = node
                .attr("name")
                .ok_or_else(|| SchemaError::malformed(0, "ref without a name attribute"))?;
            Ok(Pattern::Ref(name.to_string()))
        }
        "text" => Ok(Pattern::Text),
        "empty" => Ok(Pattern::Empty),
        "data" => Ok(Pattern::Data {
            datatype: node.attr("type").unwrap_or_default().to_string(),
        }),
        "value" => Ok(Pattern::Value(node.text.trim().to_string())),
        other => Err(SchemaError::malformed(
            0,
            format!("unsupported grammar pattern <{other}>"),
        )),
    }
}

/// Separate an element/attribute declaration's name class from its body.
///
/// The name comes from a `name` attribute, or from leading `<name>`,
/// `<anyName>`, or name-class `<choice>` children.
fn split_name_class(node: &XmlElement) -> Result<(NameClass, Vec<XmlElement>)> {
    if let Some(name) = node.attr("name") {
        return Ok((NameClass::Named(name.to_string()), node.children.clone()));
    }
    let mut children = node.children.clone();
    if children.is_empty() {
        return Err(SchemaError::malformed(
            0,
            format!("<{}> declaration without a name", node.name),
        ));
    }
    let head = children.remove(0);
    let name = match head.name.as_str() {
        "name" => NameClass::Named(head.text.trim().to_string()),
        "anyName" => NameClass::Any,
        "choice" if is_name_class_choice(&head) => {
            let names = head
                .children
                .iter()
                .filter(|child| child.name == "name")
                .map(|child| child.text.trim().to_string())
                .collect();
            NameClass::Choice(names)
        }
        other => {
            return Err(SchemaError::malformed(
                0,
                format!("<{}> declaration without a name (found <{other}>)", node.name),
            ));
        }
    };
    Ok((name, children))
}

fn is_name_class_choice(node: &XmlElement) -> bool {
    !node.children.is_empty()
        && node
            .children
            .iter()
            .all(|child| matches!(child.name.as_str(), "name" | "anyName"))
}

// ---------------------------------------------------------------------------
// Stage 3: constraint extraction
// ---------------------------------------------------------------------------

fn extract_constraints(defines: &Defines, start: &[Pattern]) -> Result<ParsedConstraints> {
    let mut constraints = ParsedConstraints::default();
    for pattern in start {
        collect_elements(pattern, defines, &mut constraints)?;
    }
    for body in defines.values() {
        for pattern in body {
            collect_elements(pattern, defines, &mut constraints)?;
        }
    }
    Ok(constraints)
}

/// Find every element declaration in a pattern tree and build its constraint.
fn collect_elements(
    pattern: &Pattern,
    defines: &Defines,
    constraints: &mut ParsedConstraints,
) -> Result<()> {
    match pattern {
        Pattern::Element { name, body } => {
            if let Some(tag_name) = name.primary()
                && !constraints.tags.contains_key(tag_name)
            {
                let constraint = build_tag_constraint(body, defines)?;
                constraints.tags.insert(tag_name.to_string(), constraint);
            }
            for child in body {
                collect_elements(child, defines, constraints)?;
            }
        }
        Pattern::Optional(children)
        | Pattern::ZeroOrMore(children)
        | Pattern::OneOrMore(children)
        | Pattern::Group(children)
        | Pattern::Interleave(children)
        | Pattern::Choice(children)
        | Pattern::Mixed(children) => {
            for child in children {
                collect_elements(child, defines, constraints)?;
            }
        }
        Pattern::Ref(name) => {
            // Defines are walked separately; here we only check the target
            // exists so a dangling ref fails the whole parse.
            if !defines.contains_key(name) {
                return Err(SchemaError::UnknownRef { name: name.clone() });
            }
        }
        Pattern::Attribute { .. }
        | Pattern::Text
        | Pattern::Empty
        | Pattern::Data { .. }
        | Pattern::Value(_) => {}
    }
    Ok(())
}

#[derive(Default)]
struct BodyFacts {
    required: Vec<AttributeConstraint>,
    optional: Vec<AttributeConstraint>,
    has_text: bool,
    has_empty: bool,
    child_elements: Vec<String>,
}

impl BodyFacts {
    /// How much this walk has extracted so far; used to decide whether a
    /// choice branch "succeeded".
    fn weight(&self) -> usize {
        self.required.len()
            + self.optional.len()
            + self.child_elements.len()
            + usize::from(self.has_text)
            + usize::from(self.has_empty)
    }

    fn push_attribute(&mut self, constraint: AttributeConstraint, optional: bool) {
        let exists = self
            .required
            .iter()
            .chain(self.optional.iter())
            .any(|existing| existing.name == constraint.name);
        if exists {
            return;
        }
        if optional {
            self.optional.push(constraint);
        } else {
            self.required.push(constraint);
        }
    }

    fn push_child(&mut self, name: &str) {
        if !self.child_elements.iter().any(|child| child == name) {
            self.child_elements.push(name.to_string());
        }
    }

    fn into_constraint(self) -> TagConstraint {
        let content = match (self.has_text, self.child_elements.is_empty()) {
            (true, true) => ContentModel::TextOnly,
            (true, false) => ContentModel::Mixed(self.child_elements),
            (false, false) => ContentModel::ElementsOnly(self.child_elements),
            (false, true) => ContentModel::Empty,
        };
        TagConstraint {
            required: self.required,
            optional: self.optional,
            content,
        }
    }
}

fn build_tag_constraint(body: &[Pattern], defines: &Defines) -> Result<TagConstraint> {
    let mut facts = BodyFacts::default();
    let mut visited = Vec::new();
    walk_body(body, defines, &mut facts, false, &mut visited)?;
    Ok(facts.into_constraint())
}

fn walk_body(
    patterns: &[Pattern],
    defines: &Defines,
    facts: &mut BodyFacts,
    optional: bool,
    visited: &mut Vec<String>,
) -> Result<()> {
    for pattern in patterns {
        walk_one(pattern, defines, facts, optional, visited)?;
    }
    Ok(())
}

fn walk_one(
    pattern: &Pattern,
    defines: &Defines,
    facts: &mut BodyFacts,
    optional: bool,
    visited: &mut Vec<String>,
) -> Result<()> {
    match pattern {
        Pattern::Attribute { name, value } => {
            if let Some(attr_name) = name.primary() {
                let value_type = classify_value(value.as_deref(), defines, visited)?;
                facts.push_attribute(
                    AttributeConstraint {
                        name: attr_name.to_string(),
                        value_type,
                    },
                    optional,
                );
            }
        }
        Pattern::Element { name, .. } => {
            // Nested elements contribute a content-model entry here; their
            // own constraints are built by the outer collection pass.
            if let Some(child_name) = name.primary() {
                facts.push_child(child_name);
            }
        }
        Pattern::Optional(children) | Pattern::ZeroOrMore(children) => {
            walk_body(children, defines, facts, true, visited)?;
        }
        Pattern::OneOrMore(children)
        | Pattern::Group(children)
        | Pattern::Interleave(children) => {
            walk_body(children, defines, facts, optional, visited)?;
        }
        Pattern::Mixed(children) => {
            facts.has_text = true;
            walk_body(children, defines, facts, optional, visited)?;
        }
        Pattern::Choice(branches) => {
            // First extractable branch wins. Documented simplification of
            // grammar alternation; see DESIGN.md.
            for branch in branches {
                let before = facts.weight();
                walk_one(branch, defines, facts, optional, visited)?;
                if facts.weight() > before {
                    break;
                }
            }
        }
        Pattern::Ref(name) => {
            if visited.iter().any(|seen| seen == name) {
                return Ok(());
            }
            let body = defines
                .get(name)
                .ok_or_else(|| SchemaError::UnknownRef { name: name.clone() })?;
            visited.push(name.clone());
            walk_body(body, defines, facts, optional, visited)?;
            visited.pop();
        }
        Pattern::Text | Pattern::Data { .. } | Pattern::Value(_) => {
            facts.has_text = true;
        }
        Pattern::Empty => {
            facts.has_empty = true;
        }
    }
    Ok(())
}

/// Classify an attribute's value pattern into the closed attribute type enum.
fn classify_value(
    value: Option<&Pattern>,
    defines: &Defines,
    visited: &mut Vec<String>,
) -> Result<AttributeType> {
    let Some(value) = value else {
        return Ok(AttributeType::Str);
    };
    match value {
        Pattern::Data { datatype } => Ok(match datatype.to_ascii_lowercase().as_str() {
            "idref" | "idrefs" => AttributeType::IdRef,
            "boolean" => AttributeType::Boolean,
            _ => AttributeType::Str,
        }),
        Pattern::Value(literal) => Ok(AttributeType::Enumeration(vec![literal.clone()])),
        Pattern::Choice(branches) => {
            let values: Vec<String> = branches
                .iter()
                .filter_map(|branch| match branch {
                    Pattern::Value(literal) => Some(literal.clone()),
                    _ => None,
                })
                .collect();
            if !values.is_empty() {
                return Ok(AttributeType::Enumeration(values));
            }
            match branches.first() {
                Some(first) => classify_value(Some(first), defines, visited),
                None => Ok(AttributeType::Str),
            }
        }
        Pattern::Ref(name) => {
            if visited.iter().any(|seen| seen == name) {
                return Ok(AttributeType::Str);
            }
            let body = defines
                .get(name)
                .ok_or_else(|| SchemaError::UnknownRef { name: name.clone() })?;
            visited.push(name.clone());
            let classified = classify_value(body.first(), defines, visited);
            visited.pop();
            classified
        }
        Pattern::Group(children) | Pattern::Optional(children) => {
            classify_value(children.first(), defines, visited)
        }
        Pattern::Text
        | Pattern::Empty
        | Pattern::Element { .. }
        | Pattern::Attribute { .. }
        | Pattern::ZeroOrMore(_)
        | Pattern::OneOrMore(_)
        | Pattern::Interleave(_)
        | Pattern::Mixed(_) => Ok(AttributeType::Str),
    }
}
