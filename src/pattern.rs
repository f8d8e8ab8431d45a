//! Compiled motif patterns.
//!
//! Motif patterns use a small subset of the usual regular-expression notation:
//! literal bytes, `.`, bracketed byte lists such as `[ACGT]`, capturing and
//! `(?:...)` groups, alternation tried left to right, the greedy quantifiers
//! `*`, `+`, `?`, `{m}`, `{m,}` and `{m,n}`, and back-references `\1`..`\9`
//! that require the exact bytes captured earlier by that group. Anything else
//! is rejected when the pattern is compiled.
//!
//! Patterns without back-references are handed to the `regex` crate, whose
//! leftmost-first matching reports the same spans a backtracking engine would.
//! Patterns with back-references run on the small backtracking interpreter in
//! this module.

use crate::error::ScanError;
use regex::bytes::Regex;

const MAX_REPEAT: usize = 1000;

#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct ByteSet([u64; 4]);

impl ByteSet {
    fn single(b: u8) -> Self {
        let mut ret = Self::default();
        ret.insert(b);
        ret
    }

    /// `.`: every byte except newline.
    fn dot() -> Self {
        Self::single(b'\n').negated()
    }

    fn insert(&mut self, b: u8) {
        self.0[(b >> 6) as usize] |= 1u64 << (b & 63);
    }

    #[inline(always)]
    fn contains(&self, b: u8) -> bool {
        self.0[(b >> 6) as usize] & (1u64 << (b & 63)) != 0
    }

    fn negated(self) -> Self {
        Self(self.0.map(|w| !w))
    }
}

impl std::fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: String = (0..=255u8)
            .filter(|b| self.contains(*b))
            .map(|b| b as char)
            .collect();
        write!(f, "ByteSet({members:?})")
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Repeat {
    node: Box<Node>,
    min: usize,
    max: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Empty,
    /// Exactly one byte out of the set.
    Class(ByteSet),
    Group {
        index: Option<usize>,
        node: Box<Node>,
    },
    Concat(Vec<Node>),
    Alternate(Vec<Node>),
    Repeat(Repeat),
    Backref(usize),
}

impl Node {
    fn min_len(&self) -> usize {
        match self {
            Node::Empty | Node::Backref(_) => 0,
            Node::Class(_) => 1,
            Node::Group { node, .. } => node.min_len(),
            Node::Concat(nodes) => nodes.iter().map(Node::min_len).sum(),
            Node::Alternate(nodes) => nodes.iter().map(Node::min_len).min().unwrap_or(0),
            Node::Repeat(rep) => rep.min.saturating_mul(rep.node.min_len()),
        }
    }

    fn has_backrefs(&self) -> bool {
        match self {
            Node::Empty | Node::Class(_) => false,
            Node::Backref(_) => true,
            Node::Group { node, .. } => node.has_backrefs(),
            Node::Concat(nodes) | Node::Alternate(nodes) => nodes.iter().any(Node::has_backrefs),
            Node::Repeat(rep) => rep.node.has_backrefs(),
        }
    }
}

struct Parser<'p> {
    src: &'p [u8],
    pos: usize,
    group_count: usize,
    closed_groups: Vec<bool>,
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str) -> Self {
        Self {
            src: pattern.as_bytes(),
            pos: 0,
            group_count: 0,
            closed_groups: vec![],
        }
    }

    fn error(&self, msg: &str) -> ScanError {
        ScanError::invalid_pattern(format!(
            "{msg} at offset {} in pattern '{}'",
            self.pos,
            String::from_utf8_lossy(self.src)
        ))
    }

    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ret = self.peek();
        if ret.is_some() {
            self.pos += 1;
        }
        ret
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> Result<(Node, usize), ScanError> {
        let node = self.parse_alternation()?;
        if self.pos < self.src.len() {
            return Err(self.error("unbalanced ')'"));
        }
        Ok((node, self.group_count))
    }

    fn parse_alternation(&mut self) -> Result<Node, ScanError> {
        let mut alternatives = vec![self.parse_concat()?];
        while self.eat(b'|') {
            alternatives.push(self.parse_concat()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Node::Alternate(alternatives)
        })
    }

    fn parse_concat(&mut self) -> Result<Node, ScanError> {
        let mut items = vec![];
        while let Some(b) = self.peek() {
            if b == b'|' || b == b')' {
                break;
            }
            let atom = self.parse_atom()?;
            items.push(self.parse_quantifier(atom)?);
        }
        Ok(match items.len() {
            0 => Node::Empty,
            1 => items.remove(0),
            _ => Node::Concat(items),
        })
    }

    fn parse_atom(&mut self) -> Result<Node, ScanError> {
        let Some(b) = self.bump() else {
            return Err(self.error("unexpected end of pattern"));
        };
        match b {
            b'(' => self.parse_group(),
            b'[' => Ok(Node::Class(self.parse_class()?)),
            b'.' => Ok(Node::Class(ByteSet::dot())),
            b'\\' => self.parse_escape(),
            b'*' | b'+' | b'?' | b'{' => Err(self.error("nothing to repeat")),
            b'^' | b'$' => Err(self.error("anchors are not supported")),
            _ => Ok(Node::Class(ByteSet::single(b))),
        }
    }

    fn parse_group(&mut self) -> Result<Node, ScanError> {
        let index = if self.src[self.pos..].starts_with(b"?:") {
            self.pos += 2;
            None
        } else if self.peek() == Some(b'?') {
            return Err(self.error("unsupported group flag"));
        } else {
            self.group_count += 1;
            self.closed_groups.push(false);
            Some(self.group_count)
        };
        let inner = self.parse_alternation()?;
        if !self.eat(b')') {
            return Err(self.error("missing ')'"));
        }
        if let Some(index) = index {
            self.closed_groups[index - 1] = true;
        }
        Ok(Node::Group {
            index,
            node: Box::new(inner),
        })
    }

    /// Only punctuation may be escaped.
    fn literal_escape(&self, b: u8) -> Result<u8, ScanError> {
        if b.is_ascii_punctuation() {
            Ok(b)
        } else {
            Err(self.error(&format!("unknown escape '\\{}'", b as char)))
        }
    }

    fn parse_escape(&mut self) -> Result<Node, ScanError> {
        let Some(b) = self.bump() else {
            return Err(self.error("trailing backslash"));
        };
        if let b'1'..=b'9' = b {
            let n = (b - b'0') as usize;
            if n > self.group_count || !self.closed_groups[n - 1] {
                return Err(self.error(&format!("invalid group reference {n}")));
            }
            return Ok(Node::Backref(n));
        }
        Ok(Node::Class(ByteSet::single(self.literal_escape(b)?)))
    }

    /// A bracketed list of literal bytes. Every listed byte is a member,
    /// so `[A|T]` also accepts `|`.
    fn parse_class(&mut self) -> Result<ByteSet, ScanError> {
        let mut set = ByteSet::default();
        loop {
            let b = match self.bump() {
                None => return Err(self.error("unterminated character class")),
                Some(b']') if set == ByteSet::default() => {
                    return Err(self.error("empty character class"));
                }
                Some(b']') => break,
                Some(b'^') if set == ByteSet::default() => {
                    return Err(self.error("negated classes are not supported"));
                }
                Some(b'-') => return Err(self.error("character ranges are not supported")),
                Some(b'\\') => match self.bump() {
                    Some(e) => self.literal_escape(e)?,
                    None => return Err(self.error("trailing backslash")),
                },
                Some(b) => b,
            };
            set.insert(b);
        }
        Ok(set)
    }

    fn parse_number(&mut self) -> Result<usize, ScanError> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n <= MAX_REPEAT)
            .ok_or_else(|| self.error("malformed counted repetition"))
    }

    fn parse_counted(&mut self) -> Result<(usize, Option<usize>), ScanError> {
        self.pos += 1; // '{'
        let min = self.parse_number()?;
        let max = if self.eat(b',') {
            if self.peek() == Some(b'}') {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        if !self.eat(b'}') {
            return Err(self.error("malformed counted repetition"));
        }
        if max.is_some_and(|max| max < min) {
            return Err(self.error("min repeat greater than max repeat"));
        }
        Ok((min, max))
    }

    fn parse_quantifier(&mut self, atom: Node) -> Result<Node, ScanError> {
        let (min, max) = match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                (0, None)
            }
            Some(b'+') => {
                self.pos += 1;
                (1, None)
            }
            Some(b'?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some(b'{') => self.parse_counted()?,
            _ => return Ok(atom),
        };
        if self.peek() == Some(b'?') {
            return Err(self.error("lazy quantifiers are not supported"));
        }
        if matches!(self.peek(), Some(b'*' | b'+' | b'?' | b'{')) {
            return Err(self.error("multiple repeat"));
        }
        Ok(Node::Repeat(Repeat {
            node: Box::new(atom),
            min,
            max,
        }))
    }
}

struct State<'h> {
    haystack: &'h [u8],
    captures: Vec<Option<(usize, usize)>>,
}

type Cont<'c, 'h> = &'c mut dyn FnMut(&mut State<'h>, usize) -> bool;

fn match_node<'h>(node: &Node, st: &mut State<'h>, pos: usize, k: Cont<'_, 'h>) -> bool {
    match node {
        Node::Empty => k(st, pos),
        Node::Class(set) => match st.haystack.get(pos) {
            Some(b) if set.contains(*b) => k(st, pos + 1),
            _ => false,
        },
        Node::Group { index: None, node } => match_node(node, st, pos, k),
        Node::Group {
            index: Some(index),
            node,
        } => {
            let index = *index;
            match_node(node, st, pos, &mut |st: &mut State<'h>, end: usize| {
                let previous = st.captures[index];
                st.captures[index] = Some((pos, end));
                if k(st, end) {
                    return true;
                }
                st.captures[index] = previous;
                false
            })
        }
        Node::Concat(nodes) => match_concat(nodes, st, pos, k),
        Node::Alternate(nodes) => {
            for alternative in nodes {
                if match_node(alternative, st, pos, &mut *k) {
                    return true;
                }
            }
            false
        }
        Node::Repeat(rep) => match rep.node.as_ref() {
            Node::Class(set) => match_class_run(rep, *set, st, pos, k),
            Node::Backref(index) => match_backref_run(rep, *index, st, pos, k),
            _ => match_repeat(rep, 0, st, pos, k),
        },
        Node::Backref(index) => {
            let Some((from, to)) = st.captures[*index] else {
                return false;
            };
            let len = to - from;
            let haystack = st.haystack;
            if haystack.len() - pos >= len && haystack[pos..pos + len] == haystack[from..to] {
                k(st, pos + len)
            } else {
                false
            }
        }
    }
}

fn match_concat<'h>(nodes: &[Node], st: &mut State<'h>, pos: usize, k: Cont<'_, 'h>) -> bool {
    match nodes.split_first() {
        None => k(st, pos),
        Some((first, rest)) => match_node(first, st, pos, &mut |st: &mut State<'h>, p: usize| {
            match_concat(rest, st, p, &mut *k)
        }),
    }
}

/// Tries the continuation at every admissible repetition count, longest
/// first.
fn try_counts<'h>(
    rep: &Repeat,
    available: usize,
    width: usize,
    st: &mut State<'h>,
    pos: usize,
    k: Cont<'_, 'h>,
) -> bool {
    if available < rep.min {
        return false;
    }
    (rep.min..=available).rev().any(|n| k(st, pos + n * width))
}

fn match_class_run<'h>(
    rep: &Repeat,
    set: ByteSet,
    st: &mut State<'h>,
    pos: usize,
    k: Cont<'_, 'h>,
) -> bool {
    let limit = rep.max.unwrap_or(usize::MAX);
    let run = st.haystack[pos.min(st.haystack.len())..]
        .iter()
        .take(limit)
        .take_while(|b| set.contains(**b))
        .count();
    try_counts(rep, run, 1, st, pos, k)
}

fn match_backref_run<'h>(
    rep: &Repeat,
    index: usize,
    st: &mut State<'h>,
    pos: usize,
    k: Cont<'_, 'h>,
) -> bool {
    let Some((from, to)) = st.captures[index] else {
        return rep.min == 0 && k(st, pos);
    };
    let width = to - from;
    if width == 0 {
        return k(st, pos);
    }
    let haystack = st.haystack;
    let unit = &haystack[from..to];
    let limit = rep.max.unwrap_or(usize::MAX);
    let mut copies = 0;
    while copies < limit {
        let at = pos + copies * width;
        if haystack.len() < at + width || &haystack[at..at + width] != unit {
            break;
        }
        copies += 1;
    }
    try_counts(rep, copies, width, st, pos, k)
}

fn match_repeat<'h>(
    rep: &Repeat,
    count: usize,
    st: &mut State<'h>,
    pos: usize,
    k: Cont<'_, 'h>,
) -> bool {
    let can_grow = rep.max.is_none_or(|max| count < max);
    if can_grow && repeat_once(rep, count, st, pos, &mut *k) {
        return true;
    }
    count >= rep.min && k(st, pos)
}

fn repeat_once<'h>(
    rep: &Repeat,
    count: usize,
    st: &mut State<'h>,
    pos: usize,
    k: Cont<'_, 'h>,
) -> bool {
    match_node(&rep.node, st, pos, &mut |st: &mut State<'h>, p: usize| {
        // An empty iteration past the minimum can never make progress.
        if p == pos && count >= rep.min {
            return false;
        }
        match_repeat(rep, count + 1, st, p, &mut *k)
    })
}

/// A parsed pattern executed by the backtracking interpreter.
#[derive(Clone, Debug)]
pub struct Program {
    source: String,
    root: Node,
    group_count: usize,
    min_len: usize,
}

impl Program {
    pub fn compile(pattern: &str) -> Result<Self, ScanError> {
        let (root, group_count) = Parser::new(pattern).parse()?;
        Ok(Self {
            source: pattern.to_string(),
            min_len: root.min_len(),
            root,
            group_count,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn has_backrefs(&self) -> bool {
        self.root.has_backrefs()
    }

    /// End of the highest-priority match anchored at `start`, if any.
    pub fn match_at<'h>(&self, haystack: &'h [u8], start: usize) -> Option<usize> {
        if start > haystack.len() || haystack.len() - start < self.min_len {
            return None;
        }
        let mut st = State {
            haystack,
            captures: vec![None; self.group_count + 1],
        };
        let mut found = None;
        match_node(&self.root, &mut st, start, &mut |_: &mut State<'h>, end: usize| {
            found = Some(end);
            true
        });
        found
    }

    /// Leftmost match starting at or after `from`, as a half-open span.
    pub fn find_at(&self, haystack: &[u8], from: usize) -> Option<(usize, usize)> {
        let last = haystack.len().checked_sub(self.min_len)?;
        (from..=last).find_map(|start| self.match_at(haystack, start).map(|end| (start, end)))
    }
}

/// Compiled matcher used by the scanner.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Back-reference free patterns, run on the `regex` crate.
    Linear { source: String, regex: Regex },
    Backtracking(Program),
}

impl Matcher {
    /// Compiles `pattern`, choosing the `regex` crate whenever the pattern has
    /// no back-references.
    pub fn new(pattern: &str) -> Result<Self, ScanError> {
        let program = Program::compile(pattern)?;
        if program.has_backrefs() {
            return Ok(Matcher::Backtracking(program));
        }
        let regex = Regex::new(&format!("(?-u){pattern}")).map_err(|e| {
            ScanError::invalid_pattern(format!("Could not compile pattern '{pattern}': {e}"))
        })?;
        Ok(Matcher::Linear {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Always uses the backtracking interpreter.
    pub fn backtracking(pattern: &str) -> Result<Self, ScanError> {
        Ok(Matcher::Backtracking(Program::compile(pattern)?))
    }

    pub fn source(&self) -> &str {
        match self {
            Matcher::Linear { source, .. } => source,
            Matcher::Backtracking(program) => program.source(),
        }
    }

    pub fn is_backtracking(&self) -> bool {
        matches!(self, Matcher::Backtracking(_))
    }

    /// Leftmost match starting at or after `from`, as a 0-based half-open span.
    pub fn find_at(&self, haystack: &[u8], from: usize) -> Option<(usize, usize)> {
        if from > haystack.len() {
            return None;
        }
        match self {
            Matcher::Linear { regex, .. } => {
                regex.find_at(haystack, from).map(|m| (m.start(), m.end()))
            }
            Matcher::Backtracking(program) => program.find_at(haystack, from),
        }
    }
}
