/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Structured-query addresses over nested JSON data.
//!
//! Two syntaxes are accepted:
//!
//! - JSONPath: `$`, `.name`, `.*`, `..name`, `..*`, `['name']`, `[0]`, `[-1]`,
//!   `[*]`, unions `[0,'a']` and slices `[start:end:step]`.
//! - JSON Pointer: `/a/0/b` with `~0`/`~1` escapes.
//!
//! A bare `*` selects the whole value, same as `$`.

use crate::error::QueryParseError;
use serde_json::Value;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Segment {
    descendant: bool,
    selectors: Vec<Selector>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Address {
    Path(Vec<Segment>),
    Pointer,
}

/// A parsed structured query, evaluated against published data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    source: String,
    address: Address,
}

impl Query {
    pub fn parse(source: &str) -> Result<Self, QueryParseError> {
        let address = match source.chars().next() {
            None => return Err(QueryParseError::Empty),
            Some('*') if source == "*" => Address::Path(Vec::new()),
            Some('$') => Address::Path(PathParser::new(source).parse()?),
            Some('/') => Address::Pointer,
            Some(_) => return Err(QueryParseError::MissingRoot),
        };

        Ok(Self {
            source: source.to_string(),
            address,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns every sub-value of `data` the query selects, in document order.
    pub fn select<'a>(&self, data: &'a Value) -> Vec<&'a Value> {
        match &self.address {
            Address::Pointer => data.pointer(&self.source).into_iter().collect(),
            Address::Path(segments) => {
                let mut nodes = vec![data];
                for segment in segments {
                    let mut next = Vec::new();
                    for node in nodes {
                        if segment.descendant {
                            let mut subtree = Vec::new();
                            collect_descendants(node, &mut subtree);
                            for descendant in subtree {
                                apply_selectors(descendant, &segment.selectors, &mut next);
                            }
                        } else {
                            apply_selectors(node, &segment.selectors, &mut next);
                        }
                    }
                    nodes = next;
                }
                nodes
            }
        }
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|child| collect_descendants(child, out)),
        Value::Array(items) => items.iter().for_each(|child| collect_descendants(child, out)),
        _ => {}
    }
}

fn apply_selectors<'a>(node: &'a Value, selectors: &[Selector], out: &mut Vec<&'a Value>) {
    for selector in selectors {
        match (selector, node) {
            (Selector::Name(name), Value::Object(map)) => out.extend(map.get(name)),
            (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
            (Selector::Wildcard, Value::Array(items)) => out.extend(items.iter()),
            (Selector::Index(index), Value::Array(items)) => {
                out.extend(normalize_index(*index, items.len()).and_then(|i| items.get(i)))
            }
            (Selector::Slice { start, end, step }, Value::Array(items)) => {
                out.extend(slice_indices(*start, *end, *step, items.len()).map(|i| &items[i]))
            }
            _ => {}
        }
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let normalized = if index < 0 { len + index } else { index };
    (0..len).contains(&normalized).then_some(normalized as usize)
}

fn slice_indices(
    start: Option<i64>,
    end: Option<i64>,
    step: i64,
    len: usize,
) -> impl Iterator<Item = usize> {
    let len = len as i64;
    let normalize = |bound: i64| if bound < 0 { len + bound } else { bound };
    let mut indices = Vec::new();

    if step > 0 {
        let lower = normalize(start.unwrap_or(0)).clamp(0, len);
        let upper = normalize(end.unwrap_or(len)).clamp(0, len);
        let mut i = lower;
        while i < upper {
            indices.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    } else {
        let upper = normalize(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lower = normalize(end.unwrap_or(-len - 1)).clamp(-1, len - 1);
        let mut i = upper;
        while lower < i {
            indices.push(i as usize);
            i = match i.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }

    indices.into_iter()
}

struct PathParser {
    chars: Vec<char>,
    offset: usize,
}

impl PathParser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            offset: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek();
        self.offset += 1;
        next
    }

    fn unexpected(&self) -> QueryParseError {
        match self.peek() {
            Some(found) => QueryParseError::UnexpectedChar {
                found,
                offset: self.offset,
            },
            None => QueryParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), QueryParseError> {
        if self.peek() == Some(expected) {
            self.offset += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.offset += 1;
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, QueryParseError> {
        self.expect('$')?;
        let mut segments = Vec::new();

        while let Some(c) = self.peek() {
            let segment = match c {
                '.' => {
                    self.offset += 1;
                    let descendant = self.peek() == Some('.');
                    if descendant {
                        self.offset += 1;
                    }
                    let selectors = match self.peek() {
                        Some('[') if descendant => self.parse_bracket()?,
                        Some('*') => {
                            self.offset += 1;
                            vec![Selector::Wildcard]
                        }
                        _ => vec![Selector::Name(self.parse_member_name()?)],
                    };
                    Segment {
                        descendant,
                        selectors,
                    }
                }
                '[' => Segment {
                    descendant: false,
                    selectors: self.parse_bracket()?,
                },
                _ => return Err(self.unexpected()),
            };
            segments.push(segment);
        }

        Ok(segments)
    }

    fn parse_member_name(&mut self) -> Result<String, QueryParseError> {
        let start = self.offset;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii())
        {
            self.offset += 1;
        }
        if start == self.offset {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.offset].iter().collect())
    }

    fn parse_bracket(&mut self) -> Result<Vec<Selector>, QueryParseError> {
        self.expect('[')?;
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(found) => {
                    return Err(QueryParseError::UnexpectedChar {
                        found,
                        offset: self.offset - 1,
                    })
                }
                None => return Err(QueryParseError::UnexpectedEnd),
            }
        }

        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector, QueryParseError> {
        match self.peek() {
            Some('*') => {
                self.offset += 1;
                Ok(Selector::Wildcard)
            }
            Some(quote @ ('\'' | '"')) => {
                self.offset += 1;
                Ok(Selector::Name(self.parse_quoted(quote)?))
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.parse_index_or_slice(),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, QueryParseError> {
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(QueryParseError::UnexpectedEnd),
                },
                Some(c) if c == quote => return Ok(name),
                Some(c) => name.push(c),
                None => return Err(QueryParseError::UnexpectedEnd),
            }
        }
    }

    fn parse_integer(&mut self) -> Result<Option<i64>, QueryParseError> {
        self.skip_whitespace();
        let start = self.offset;
        if self.peek() == Some('-') {
            self.offset += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.offset += 1;
        }
        if start == self.offset {
            return Ok(None);
        }

        let literal: String = self.chars[start..self.offset].iter().collect();
        literal
            .parse::<i64>()
            .map(Some)
            .map_err(|_| QueryParseError::InvalidIndex(literal))
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, QueryParseError> {
        let start = self.parse_integer()?;
        self.skip_whitespace();
        if self.peek() != Some(':') {
            return start.map(Selector::Index).ok_or_else(|| self.unexpected());
        }

        self.offset += 1;
        let end = self.parse_integer()?;
        self.skip_whitespace();
        let step = if self.peek() == Some(':') {
            self.offset += 1;
            self.parse_integer()?.unwrap_or(1)
        } else {
            1
        };
        if step == 0 {
            return Err(QueryParseError::ZeroStep);
        }

        Ok(Selector::Slice { start, end, step })
    }
}
