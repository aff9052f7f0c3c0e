//! Parsing of the metadata block at the top of a requirement document.
//!
//! The block is a small, fixed subset of YAML framed by `---` lines:
//!
//! ```text
//! ---
//! id: REQ-1
//! version: 2
//! references:
//!   parameters:
//!     - brake_distance
//!   requirements:
//!     - path: reqs/REQ-2.md
//!       version: 1
//! ---
//! ```
//!
//! Parsing is tolerant. Lines that don't fit the schema are skipped, so a
//! malformed block yields partial metadata rather than an error.
//!
//! Each line is first classified on its own, then fed to a builder which
//! tracks the open top-level section and, inside it, the open list and list
//! item. Completed list items, lists and sections are moved into the tree as
//! finished values and never revisited.

use crate::domain::{Config, Map, Scalar, Value};

const DELIMITER: &str = "---";

/// A document split into its parsed metadata block and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// The metadata tree, or `None` if the document has no complete block.
    pub metadata: Option<Map>,
    /// Everything after the closing delimiter, or the whole text if there is
    /// no block.
    pub body: String,
}

/// Splits a document into the lines of its metadata block and its body.
///
/// The block must open on the first line and be closed by a later line
/// consisting solely of `---`. Otherwise there is no block and the whole text
/// is the body.
#[must_use]
pub fn split(text: &str) -> (Option<Vec<&str>>, String) {
    let lines: Vec<&str> = text.lines().collect();

    if lines.first().map(|line| line.trim()) != Some(DELIMITER) {
        return (None, text.to_string());
    }

    let Some(end) = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == DELIMITER)
        .map(|i| i + 1)
    else {
        tracing::debug!("metadata block is never closed, treating the document as body");
        return (None, text.to_string());
    };

    (Some(lines[1..end].to_vec()), lines[end + 1..].join("\n"))
}

/// Parses a document with the default configuration.
#[must_use]
pub fn parse(text: &str) -> Parsed {
    Parser::new(&Config::default()).parse(text)
}

/// A metadata block parser.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    scalar_prefixes: &'a [String],
}

impl<'a> Parser<'a> {
    /// Creates a parser using the conventions in `config`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            scalar_prefixes: config.scalar_prefixes(),
        }
    }

    /// Splits and parses a whole document.
    #[must_use]
    pub fn parse(&self, text: &str) -> Parsed {
        let (block, body) = split(text);
        Parsed {
            metadata: block.map(|lines| self.parse_block(&lines)),
            body,
        }
    }

    /// Parses the lines between the delimiters.
    #[must_use]
    pub fn parse_block(&self, lines: &[&str]) -> Map {
        let lines: Vec<Line> = lines.iter().map(|line| self.classify(line)).collect();
        let mut builder = Builder::default();

        for (i, line) in lines.iter().enumerate() {
            let next = lines[i + 1..]
                .iter()
                .find(|line| !matches!(line, Line::Blank | Line::Other));
            builder.feed(*line, next);
        }

        builder.finish()
    }

    fn classify<'l>(&self, line: &'l str) -> Line<'l> {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            return Line::Blank;
        }
        let indent = line.len() - line.trim_start().len();

        if let Some(rest) = stripped.strip_prefix('-') {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Line::Item {
                    indent,
                    item: self.classify_item(rest.trim()),
                };
            }
        }

        match stripped.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => Line::Key {
                indent,
                key: key.trim(),
                value: value.trim(),
            },
            _ => {
                tracing::debug!("skipping unrecognised metadata line: {stripped}");
                Line::Other
            }
        }
    }

    fn classify_item<'l>(&self, text: &'l str) -> Item<'l> {
        if self
            .scalar_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
        {
            return Item::Scalar(text);
        }
        match text.split_once(':') {
            Some((key, value)) if is_identifier(key.trim()) => Item::MapStart {
                key: key.trim(),
                value: value.trim(),
            },
            _ => Item::Scalar(text),
        }
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Parses an inline value: either a flow list (`[a, b]`) or a scalar.
fn parse_value(value: &str) -> Value {
    match value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(items) => Value::List(
            items
                .split(',')
                .filter(|item| !item.trim().is_empty())
                .map(Scalar::new)
                .collect(),
        ),
        None => Value::Scalar(Scalar::new(value)),
    }
}

/// A single line of a metadata block, classified in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    /// Empty or a `#` comment.
    Blank,
    /// `key: value`, where the value may be empty.
    Key {
        indent: usize,
        key: &'a str,
        value: &'a str,
    },
    /// `- ...`
    Item { indent: usize, item: Item<'a> },
    /// Anything else.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item<'a> {
    /// `- value`
    Scalar(&'a str),
    /// `- key: value`, the first entry of a map in a list.
    MapStart { key: &'a str, value: &'a str },
}

#[derive(Debug, Default)]
struct Builder {
    root: Map,
    base_indent: Option<usize>,
    open: Option<Section>,
}

impl Builder {
    fn feed(&mut self, line: Line, next: Option<&Line>) {
        match line {
            Line::Blank | Line::Other => {}
            Line::Key { indent, key, value } => {
                let base = *self.base_indent.get_or_insert(indent);
                if indent <= base {
                    self.close_section();
                    self.top_level_key(indent, key, value, next);
                } else {
                    self.nested_key(indent, key, value, next);
                }
            }
            Line::Item { indent, item } => self.list_item(indent, item),
        }
    }

    fn top_level_key(&mut self, indent: usize, key: &str, value: &str, next: Option<&Line>) {
        if !value.is_empty() {
            self.root.insert(key, parse_value(value));
            return;
        }

        let body = if opens_list(indent, next) {
            SectionBody::List(ListCursor::new(key, indent))
        } else {
            SectionBody::Map {
                map: Map::new(),
                child_indent: None,
                list: None,
            }
        };
        self.open = Some(Section {
            key: key.to_string(),
            body,
        });
    }

    fn nested_key(&mut self, indent: usize, key: &str, value: &str, next: Option<&Line>) {
        let Some(section) = self.open.as_mut() else {
            tracing::debug!("skipping indented key '{key}' outside of a section");
            return;
        };

        match &mut section.body {
            SectionBody::List(cursor) => {
                if !cursor.continue_item(indent, key, value) {
                    tracing::debug!("skipping key '{key}' inside list '{}'", cursor.key);
                }
            }
            SectionBody::Map {
                map,
                child_indent,
                list,
            } => {
                if let Some(cursor) = list {
                    if cursor.continue_item(indent, key, value) {
                        return;
                    }
                }

                let child_indent = *child_indent.get_or_insert(indent);
                if indent > child_indent {
                    tracing::debug!("skipping key '{key}' nested deeper than supported");
                    return;
                }

                if let Some(cursor) = list.take() {
                    let (list_key, list_value) = cursor.finish();
                    map.insert(list_key, list_value);
                }

                if !value.is_empty() {
                    map.insert(key, parse_value(value));
                } else if opens_list(indent, next) {
                    *list = Some(ListCursor::new(key, indent));
                } else {
                    map.insert(key, Value::Map(Map::new()));
                }
            }
        }
    }

    fn list_item(&mut self, indent: usize, item: Item) {
        match self.open.as_mut().map(|section| &mut section.body) {
            Some(SectionBody::List(cursor) | SectionBody::Map { list: Some(cursor), .. }) => {
                cursor.push(indent, item);
            }
            _ => tracing::debug!("skipping list item outside of a list: {item:?}"),
        }
    }

    fn close_section(&mut self) {
        if let Some(section) = self.open.take() {
            let (key, value) = section.finish();
            self.root.insert(key, value);
        }
    }

    fn finish(mut self) -> Map {
        self.close_section();
        self.root
    }
}

/// Decides whether a key with an empty value opens a list.
///
/// List items may sit at the same indentation as their key, as well as
/// deeper.
fn opens_list(indent: usize, next: Option<&Line>) -> bool {
    matches!(next, Some(Line::Item { indent: item_indent, .. }) if *item_indent >= indent)
}

/// An open top-level key whose value spans the following lines.
#[derive(Debug)]
struct Section {
    key: String,
    body: SectionBody,
}

#[derive(Debug)]
enum SectionBody {
    Map {
        map: Map,
        /// Indentation of the first nested key; deeper keys are not
        /// supported.
        child_indent: Option<usize>,
        list: Option<ListCursor>,
    },
    List(ListCursor),
}

impl Section {
    fn finish(self) -> (String, Value) {
        let value = match self.body {
            SectionBody::List(cursor) => cursor.finish().1,
            SectionBody::Map { mut map, list, .. } => {
                if let Some(cursor) = list {
                    let (key, value) = cursor.finish();
                    map.insert(key, value);
                }
                Value::Map(map)
            }
        };
        (self.key, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Scalar,
    Map,
}

/// An open list and the map item currently being filled in, if any.
#[derive(Debug)]
struct ListCursor {
    key: String,
    scalars: Vec<Scalar>,
    maps: Vec<Map>,
    first: Option<ItemKind>,
    current: Option<MapItem>,
}

#[derive(Debug)]
struct MapItem {
    marker_indent: usize,
    map: Map,
}

impl ListCursor {
    fn new(key: &str, indent: usize) -> Self {
        tracing::trace!("opening list '{key}' at indent {indent}");
        Self {
            key: key.to_string(),
            scalars: Vec::new(),
            maps: Vec::new(),
            first: None,
            current: None,
        }
    }

    fn push(&mut self, indent: usize, item: Item) {
        self.close_item();
        match item {
            Item::Scalar(text) => {
                self.first.get_or_insert(ItemKind::Scalar);
                self.scalars.push(Scalar::new(text));
            }
            Item::MapStart { key, value } => {
                self.first.get_or_insert(ItemKind::Map);
                let mut map = Map::new();
                map.insert(key, parse_value(value));
                self.current = Some(MapItem {
                    marker_indent: indent,
                    map,
                });
            }
        }
    }

    /// Adds a key to the current map item if the line is indented beneath
    /// its list marker.
    fn continue_item(&mut self, indent: usize, key: &str, value: &str) -> bool {
        match &mut self.current {
            Some(item) if indent > item.marker_indent => {
                item.map.insert(key, parse_value(value));
                true
            }
            _ => false,
        }
    }

    fn close_item(&mut self) {
        if let Some(item) = self.current.take() {
            self.maps.push(item.map);
        }
    }

    fn finish(mut self) -> (String, Value) {
        self.close_item();
        let value = match self.first {
            Some(ItemKind::Map) => {
                if !self.scalars.is_empty() {
                    tracing::debug!(
                        "list '{}' mixes maps and plain values, dropping the plain values",
                        self.key
                    );
                }
                Value::MapList(self.maps)
            }
            Some(ItemKind::Scalar) | None => {
                if !self.maps.is_empty() {
                    tracing::debug!(
                        "list '{}' mixes plain values and maps, dropping the maps",
                        self.key
                    );
                }
                Value::List(self.scalars)
            }
        };
        (self.key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "---
id: REQ-1
title: Braking distance
version: 2
status: approved
references:
  parameters:
    - brake_distance
    - max_speed
  requirements:
    - path: reqs/REQ-2.md
      version: 1
    - path: reqs/REQ-3.md
      version: 4
  tests:
    - //vehicle:brake_test
  standards:
    - ISO 26262-6:2018
---
# Braking distance

The vehicle shall stop within [@brake_distance](/params/brake.bzl#brake_distance).
";

    fn scalars(value: Option<&Value>) -> Vec<&str> {
        match value {
            Some(Value::List(items)) => items.iter().map(Scalar::as_str).collect(),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    fn references(map: &Map) -> &Map {
        map.get("references").and_then(Value::as_map).unwrap()
    }

    #[test]
    fn full_document() {
        let parsed = parse(DOCUMENT);
        let metadata = parsed.metadata.unwrap();

        assert_eq!(metadata.scalar("id").unwrap().as_str(), "REQ-1");
        assert_eq!(metadata.scalar("version").unwrap().as_int(), Some(2));
        assert_eq!(metadata.scalar("status").unwrap().as_str(), "approved");

        let references = references(&metadata);
        assert_eq!(
            scalars(references.get("parameters")),
            ["brake_distance", "max_speed"]
        );
        assert_eq!(scalars(references.get("tests")), ["//vehicle:brake_test"]);
        assert_eq!(scalars(references.get("standards")), ["ISO 26262-6:2018"]);

        let Some(Value::MapList(requirements)) = references.get("requirements") else {
            panic!("requirements should be a list of maps");
        };
        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements[0].scalar("path").unwrap().as_str(), "reqs/REQ-2.md");
        assert_eq!(requirements[0].scalar("version").unwrap().as_int(), Some(1));
        assert_eq!(requirements[1].scalar("path").unwrap().as_str(), "reqs/REQ-3.md");
        assert_eq!(requirements[1].scalar("version").unwrap().as_int(), Some(4));

        assert_eq!(
            parsed.body,
            "# Braking distance\n\nThe vehicle shall stop within \
             [@brake_distance](/params/brake.bzl#brake_distance)."
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse(DOCUMENT), parse(DOCUMENT));
    }

    #[test]
    fn missing_opening_delimiter() {
        let text = "# Title\n\n[@a](/p.bzl#a)\n";
        let parsed = parse(text);
        assert!(parsed.metadata.is_none());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn missing_closing_delimiter() {
        let text = "---\nid: REQ-1\n# Title\n";
        let parsed = parse(text);
        assert!(parsed.metadata.is_none());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn empty_block() {
        let parsed = parse("---\n---\nbody");
        assert_eq!(parsed.metadata, Some(Map::new()));
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn list_items_at_key_indentation() {
        let parsed = parse(
            "---
id: REQ-1
references:
  tests:
  - test_b
  - test_a
  requirements:
  - path: REQ-2.md
    version: 3
---
",
        );
        let metadata = parsed.metadata.unwrap();
        let references = references(&metadata);
        assert_eq!(scalars(references.get("tests")), ["test_b", "test_a"]);
        let Some(Value::MapList(requirements)) = references.get("requirements") else {
            panic!("requirements should be a list of maps");
        };
        assert_eq!(requirements[0].scalar("version").unwrap().as_int(), Some(3));
    }

    #[test]
    fn single_line_map_items() {
        let parsed = parse(
            "---
references:
  requirements:
    - path: REQ-2.md
    - path: REQ-3.md
---
",
        );
        let metadata = parsed.metadata.unwrap();
        let Some(Value::MapList(requirements)) = references(&metadata).get("requirements") else {
            panic!("requirements should be a list of maps");
        };
        assert_eq!(requirements.len(), 2);
        assert!(!requirements[0].contains_key("version"));
    }

    #[test]
    fn top_level_list() {
        let parsed = parse("---\ntags:\n- safety\n- braking\nid: REQ-1\n---\n");
        let metadata = parsed.metadata.unwrap();
        assert_eq!(scalars(metadata.get("tags")), ["safety", "braking"]);
        assert_eq!(metadata.scalar("id").unwrap().as_str(), "REQ-1");
    }

    #[test]
    fn inline_lists() {
        let parsed = parse("---\nreferences:\n  parameters: [b, 'a']\n---\n");
        let metadata = parsed.metadata.unwrap();
        assert_eq!(scalars(references(&metadata).get("parameters")), ["b", "a"]);
    }

    #[test]
    fn labels_with_colons_stay_plain_values() {
        let parsed = parse(
            "---
references:
  tests:
    - //a/b:c
    - label: value
---
",
        );
        let metadata = parsed.metadata.unwrap();
        // The first item decides the list shape; the stray map is dropped.
        assert_eq!(scalars(references(&metadata).get("tests")), ["//a/b:c"]);
    }

    #[test]
    fn custom_scalar_prefixes() {
        let config: Config = toml::from_str(
            r#"_version = "1"
scalar_prefixes = ["SAE"]"#,
        )
        .unwrap();
        let parsed = Parser::new(&config).parse(
            "---
references:
  standards:
    - SAE:J3016
---
",
        );
        let metadata = parsed.metadata.unwrap();
        assert_eq!(
            scalars(references(&metadata).get("standards")),
            ["SAE:J3016"]
        );
    }

    #[test]
    fn unrecognised_lines_are_skipped() {
        let parsed = parse(
            "---
id: REQ-1
this line is not yaml
# a comment
title: 'Quoted: title'

version: 7
---
",
        );
        let metadata = parsed.metadata.unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.scalar("title").unwrap().as_str(), "Quoted: title");
        assert_eq!(metadata.scalar("version").unwrap().as_int(), Some(7));
    }

    #[test]
    fn empty_section_is_an_empty_map() {
        let parsed = parse("---\nreferences:\nid: REQ-1\n---\n");
        let metadata = parsed.metadata.unwrap();
        assert_eq!(metadata.get("references"), Some(&Value::Map(Map::new())));
    }

    #[test]
    fn deeper_nesting_is_skipped() {
        let parsed = parse(
            "---
references:
  extra:
    deeper: 1
  parameters:
    - a
---
",
        );
        let metadata = parsed.metadata.unwrap();
        let references = references(&metadata);
        assert_eq!(references.get("extra"), Some(&Value::Map(Map::new())));
        assert!(!references.contains_key("deeper"));
        assert_eq!(scalars(references.get("parameters")), ["a"]);
    }

    #[test]
    fn missing_path_is_kept_as_partial_entry() {
        let parsed = parse(
            "---
references:
  requirements:
    - version: 2
---
",
        );
        let metadata = parsed.metadata.unwrap();
        let Some(Value::MapList(requirements)) = references(&metadata).get("requirements") else {
            panic!("requirements should be a list of maps");
        };
        assert!(!requirements[0].contains_key("path"));
        assert_eq!(requirements[0].scalar("version").unwrap().as_int(), Some(2));
    }
}
