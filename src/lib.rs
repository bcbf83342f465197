//! Counting and enumeration of the strings matched by a regular expression.
//!
//! Given a pattern tree and a whitelist of permitted characters (the
//! *charset*), this crate answers two questions:
//!
//! * [`count`]: how many strings does the pattern match when every
//!   character class is restricted to the charset?
//! * [`generate`]: enumerate those strings lazily, one at a time.
//!
//! Unbounded repetitions (`*`, `+`, `{n,}`) are made finite with a
//! caller-supplied `infinite_cap`: an unbounded upper limit becomes
//! `min + infinite_cap`.
//!
//! # Architecture
//!
//! ```text
//! &str ──regex-syntax──> Hir ──Node::from_hir──> Node ──count──────> f64
//!                                                  └──generate───> Generator ──next()──> String
//! ```
//!
//! Parsing is delegated to `regex-syntax`; its HIR is lowered into the
//! small [`Node`] tree that both algorithms walk.
//!
//! ## Counting
//!
//! [`count`] is a closed-form recursion: concatenation multiplies,
//! alternation adds, and `body{min,max}` sums the geometric series
//! `value^min + … + value^max` where `value` is the count of `body`.
//! Every subtree counts as at least one match.
//!
//! ## Enumeration
//!
//! [`generate`] builds a tree of cursors isomorphic to the pattern tree.
//! A cursor is a position over an ordered list of strings:
//!
//! * a **set** walks a fixed list (a literal, or the characters a class
//!   shares with the charset);
//! * a **sequence** is an odometer over its parts, the last part varying
//!   fastest, so it visits their full cartesian product;
//! * an **alternation** walks its branches one after another.
//!
//! * a **repetition** keeps a flat stack of independent body copies and
//!   visits the strings of the expansion
//!
//! ```text
//! body₁ · body₂ · … · body_min · ( "" | body{1,max-min} )
//! ```
//!
//! The empty branch comes first, so shorter strings are produced before
//! longer ones.  The copies sit side by side in one `Vec`, so neither a
//! large `infinite_cap` nor a long unbounded run deepens the stack.
//!
//! ## Unbounded generation
//!
//! With `infinite_cap == None` a repetition such as `a*` has no upper
//! limit: [`count`] returns `f64::INFINITY` and the [`Generator`] never
//! ends.  Copies are added one at a time as the enumeration reaches them,
//! so a call to [`Iterator::next`] costs time proportional to the string it
//! returns and the caller can stop at any point.  [`generate_each`] on such
//! a pattern never returns.
//!
//! ## Known inconsistencies
//!
//! * A class sharing no character with the charset counts as 1 but
//!   generates nothing (so does an alternation with no branches).  [`count`]
//!   is an upper bound on the number of generated strings.
//! * Identical strings produced by different alternation branches are
//!   counted and generated once per branch.

use std::iter::FusedIterator;
use std::sync::Arc;

use indexmap::IndexMap;
use regex_syntax::hir::{self, Dot, HirKind};

/// Re-export so users do not need a direct `regex-syntax` dependency.
pub use regex_syntax::hir::Hir;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error returned when a pattern or charset string cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `regex-syntax` rejected the input.
    #[error("failed to parse pattern: {0}")]
    Parse(#[from] regex_syntax::Error),
}

// ---------------------------------------------------------------------------
// Pattern tree
// ---------------------------------------------------------------------------

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_END: u32 = 0xDFFF;

/// An inclusive range of characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassRange {
    start: char,
    end: char,
}

impl ClassRange {
    pub fn new(start: char, end: char) -> Self {
        Self { start, end }
    }

    pub fn start(self) -> char {
        self.start
    }

    pub fn end(self) -> char {
        self.end
    }

    fn intersect(self, other: Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    /// Number of characters in the range.  No `char` lives in the
    /// surrogate block, so a range spanning it is shorter than its width
    /// in code points.
    fn len(self) -> u32 {
        let (lo, hi) = (u32::from(self.start), u32::from(self.end));
        let surrogates = hi
            .min(SURROGATE_END)
            .checked_sub(lo.max(SURROGATE_START))
            .map_or(0, |width| width + 1);
        hi - lo + 1 - surrogates
    }

    fn chars(self) -> impl Iterator<Item = char> {
        self.start..=self.end
    }
}

/// A node of a pattern tree.
///
/// Trees are usually lowered from `regex-syntax` with [`Node::from_hir`],
/// but can be built by hand.  They are assumed well-formed: class ranges
/// sorted, `min <= max`.  Nothing in this crate validates or mutates them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Matches exactly this text.
    Literal(String),
    /// One character out of these ranges.
    CharClass(Vec<ClassRange>),
    /// Any character, newline included.
    AnyChar,
    /// Any character except newline.
    AnyCharNoNewline,
    /// `sub*`
    Star(Box<Node>),
    /// `sub+`
    Plus(Box<Node>),
    /// `sub?`
    Quest(Box<Node>),
    /// `sub{min,max}`; `max == None` is unbounded.
    Repeat {
        sub: Box<Node>,
        min: u32,
        max: Option<u32>,
    },
    Concat(Vec<Node>),
    Capture(Box<Node>),
    Alternate(Vec<Node>),
    /// Anchors, word boundaries and the empty regex.  Matches exactly the
    /// empty string.
    Other,
}

impl Node {
    /// Lower a `regex-syntax` HIR into a pattern tree.
    ///
    /// * Look-around assertions and `Empty` become [`Node::Other`].
    /// * Literals are decoded as UTF-8; invalid UTF-8 (byte-oriented
    ///   patterns) maps each byte to the character of the same value, as
    ///   byte classes do.
    /// * `regex-syntax` has no dedicated node for `.`, it emits the class
    ///   built by [`Hir::dot`].  Those classes are recognised and become
    ///   [`Node::AnyChar`] or [`Node::AnyCharNoNewline`].
    /// * Repetitions become `Star`, `Plus` or `Quest` when their bounds
    ///   match, `Repeat` otherwise.  Greediness is irrelevant here.
    pub fn from_hir(hir: &Hir) -> Node {
        match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => Node::Other,
            HirKind::Literal(hir::Literal(bytes)) => Node::Literal(match std::str::from_utf8(bytes) {
                Ok(text) => text.to_owned(),
                Err(_) => bytes.iter().copied().map(char::from).collect(),
            }),
            HirKind::Class(class) => lower_dot(hir).unwrap_or_else(|| lower_class(class)),
            HirKind::Repetition(rep) => {
                let sub = Box::new(Node::from_hir(&rep.sub));
                match (rep.min, rep.max) {
                    (0, None) => Node::Star(sub),
                    (1, None) => Node::Plus(sub),
                    (0, Some(1)) => Node::Quest(sub),
                    (min, max) => Node::Repeat { sub, min, max },
                }
            }
            HirKind::Capture(cap) => Node::Capture(Box::new(Node::from_hir(&cap.sub))),
            HirKind::Concat(subs) => Node::Concat(subs.iter().map(Node::from_hir).collect()),
            HirKind::Alternation(subs) => {
                Node::Alternate(subs.iter().map(Node::from_hir).collect())
            }
        }
    }

    /// Normalized bounds of a repetition node, `None` for anything else.
    fn as_repetition(&self) -> Option<Repetition<'_>> {
        let (body, min, max) = match self {
            Node::Star(sub) => (sub, 0, None),
            Node::Plus(sub) => (sub, 1, None),
            Node::Quest(sub) => (sub, 0, Some(1)),
            Node::Repeat { sub, min, max } => (sub, *min, *max),
            _ => return None,
        };
        Some(Repetition { body, min, max })
    }
}

impl From<&Hir> for Node {
    fn from(hir: &Hir) -> Self {
        Node::from_hir(hir)
    }
}

fn lower_dot(hir: &Hir) -> Option<Node> {
    const ANY: [Dot; 2] = [Dot::AnyChar, Dot::AnyByte];
    const NO_NEWLINE: [Dot; 4] = [
        Dot::AnyCharExceptLF,
        Dot::AnyCharExceptCRLF,
        Dot::AnyByteExceptLF,
        Dot::AnyByteExceptCRLF,
    ];

    if ANY.into_iter().any(|dot| *hir == Hir::dot(dot)) {
        Some(Node::AnyChar)
    } else if NO_NEWLINE.into_iter().any(|dot| *hir == Hir::dot(dot)) {
        Some(Node::AnyCharNoNewline)
    } else {
        None
    }
}

fn lower_class(class: &hir::Class) -> Node {
    let ranges = match class {
        hir::Class::Unicode(class) => class
            .ranges()
            .iter()
            .map(|range| ClassRange::new(range.start(), range.end()))
            .collect(),
        hir::Class::Bytes(class) => class
            .ranges()
            .iter()
            .map(|range| ClassRange::new(char::from(range.start()), char::from(range.end())))
            .collect(),
    };
    Node::CharClass(ranges)
}

/// A repetition node with its bounds normalized into locals.
#[derive(Clone, Copy, Debug)]
struct Repetition<'a> {
    body: &'a Node,
    min: u32,
    max: Option<u32>,
}

impl Repetition<'_> {
    /// Upper bound after substituting `infinite_cap` for an unbounded
    /// maximum.  Still `None` when there is no cap.
    fn capped_max(self, infinite_cap: Option<u32>) -> Option<u32> {
        self.max
            .or_else(|| infinite_cap.map(|cap| self.min.saturating_add(cap)))
    }
}

// ---------------------------------------------------------------------------
// Charset
// ---------------------------------------------------------------------------

/// The whitelist of characters that character classes are restricted to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Charset {
    ranges: Vec<ClassRange>,
}

impl Charset {
    /// A charset made of `ranges`, which should be sorted and disjoint.
    pub fn new(ranges: impl IntoIterator<Item = ClassRange>) -> Self {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }

    /// Printable ASCII, `[[:print:]]`.  Used whenever a charset is not a
    /// character class.
    pub fn printable() -> Self {
        Self::new([ClassRange::new(' ', '~')])
    }

    /// The ranges of `node` if it is a [`Node::CharClass`], the
    /// [printable](Self::printable) default otherwise.
    pub fn from_node(node: &Node) -> Self {
        match node {
            Node::CharClass(ranges) => Self::new(ranges.iter().copied()),
            _ => {
                tracing::debug!(?node, "charset is not a character class, using printable ASCII");
                Self::printable()
            }
        }
    }

    /// Parse a class such as `[0-9a-z_]` with `regex-syntax`.
    ///
    /// Anything that does not lower to a plain class (including `.`) falls
    /// back to the printable default, as [`from_node`](Self::from_node)
    /// does.
    pub fn parse(class: &str) -> Result<Self, Error> {
        let hir = regex_syntax::parse(class)?;
        Ok(Self::from_node(&Node::from_hir(&hir)))
    }

    pub fn ranges(&self) -> &[ClassRange] {
        &self.ranges
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::printable()
    }
}

// ---------------------------------------------------------------------------
// Charset bounding
// ---------------------------------------------------------------------------

/// Every non-empty overlap between one of `ranges` and one of the charset's
/// ranges.  The outer loop walks `ranges`, the inner one the charset, both
/// in their given order.
fn overlaps<'a>(
    ranges: &'a [ClassRange],
    charset: &'a Charset,
) -> impl Iterator<Item = ClassRange> + 'a {
    ranges.iter().flat_map(move |&range| {
        charset
            .ranges
            .iter()
            .filter_map(move |&allowed| range.intersect(allowed))
    })
}

fn overlap_len(ranges: &[ClassRange], charset: &Charset) -> f64 {
    overlaps(ranges, charset)
        .map(|range| f64::from(range.len()))
        .sum()
}

/// The characters of every overlap, ascending within each overlap, as
/// one-character strings.
fn expand(ranges: &[ClassRange], charset: &Charset) -> Vec<String> {
    overlaps(ranges, charset)
        .flat_map(ClassRange::chars)
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// Count the strings `node` matches with its classes restricted to
/// `charset`.
///
/// `infinite_cap` bounds unbounded repetitions (`max := min + cap`).  With
/// `None`, an unbounded repetition counts as `f64::INFINITY`.
///
/// The result is always at least 1, even for a class that shares no
/// character with the charset.  Degenerate arithmetic (`0 × ∞`) yields
/// `f64::INFINITY`.
///
/// A class range counts the characters it holds, not its code point width:
/// the surrogate block U+D800..=U+DFFF has no `char`, so `[\u{D7FF}-\u{E000}]`
/// counts 2, the same number of strings [`generate`] produces for it.
pub fn count(node: &Node, charset: &Charset, infinite_cap: Option<u32>) -> f64 {
    let result = match node.as_repetition() {
        Some(rep) => count_repetition(rep, charset, infinite_cap),
        None => match node {
            Node::CharClass(ranges) => overlap_len(ranges, charset),
            // The charset stands in for the class.
            Node::AnyChar | Node::AnyCharNoNewline => overlap_len(charset.ranges(), charset),
            Node::Concat(subs) => subs
                .iter()
                .map(|sub| count(sub, charset, infinite_cap))
                .product::<f64>(),
            Node::Capture(sub) => count(sub, charset, infinite_cap),
            Node::Alternate(subs) => subs
                .iter()
                .map(|sub| count(sub, charset, infinite_cap))
                .sum::<f64>(),
            _ => 1.0,
        },
    };

    let result = if result.is_nan() {
        f64::INFINITY
    } else {
        result
    };
    result.max(1.0)
}

fn count_repetition(rep: Repetition<'_>, charset: &Charset, infinite_cap: Option<u32>) -> f64 {
    let value = count(rep.body, charset, infinite_cap);
    let Some(max) = rep.capped_max(infinite_cap) else {
        return f64::INFINITY;
    };
    let min = rep.min;

    if value > 1.0 {
        if min == max {
            return value.powf(f64::from(min));
        }
        // value^min + … + value^max
        let mut result = (value.powf(f64::from(max) + 1.0) - 1.0) / (value - 1.0);
        if min > 0 {
            result -= (value.powf(f64::from(min)) - 1.0) / (value - 1.0);
        }
        result
    } else {
        // One string per repetition count.
        f64::from(max.saturating_sub(min)) + 1.0
    }
}

// ---------------------------------------------------------------------------
// Cursors
// ---------------------------------------------------------------------------

/// A position over an ordered list of strings.
///
/// Every constructor returns a cursor at its first position.  Once
/// [`valid`](Self::valid) turns false the cursor stays exhausted until
/// [`rewind`](Self::rewind).
#[derive(Debug)]
enum Cursor {
    Set(Set),
    Sequence(Sequence),
    Alternation(Alternation),
    Repeat(Repeat),
}

impl Cursor {
    /// A cursor over the single string `""`.
    fn empty() -> Self {
        Cursor::Set(Set::new(Arc::from(vec![String::new()])))
    }

    fn rewind(&mut self) {
        match self {
            Cursor::Set(c) => c.rewind(),
            Cursor::Sequence(c) => c.rewind(),
            Cursor::Alternation(c) => c.rewind(),
            Cursor::Repeat(c) => c.rewind(),
        }
    }

    fn valid(&self) -> bool {
        match self {
            Cursor::Set(c) => c.valid(),
            Cursor::Sequence(c) => c.valid(),
            Cursor::Alternation(c) => c.valid(),
            Cursor::Repeat(c) => c.valid(),
        }
    }

    fn advance(&mut self) {
        match self {
            Cursor::Set(c) => c.advance(),
            Cursor::Sequence(c) => c.advance(),
            Cursor::Alternation(c) => c.advance(),
            Cursor::Repeat(c) => c.advance(),
        }
    }

    /// Append the current string to `out`.  Appends nothing when
    /// exhausted.
    fn write_current(&self, out: &mut String) {
        match self {
            Cursor::Set(c) => c.write_current(out),
            Cursor::Sequence(c) => c.write_current(out),
            Cursor::Alternation(c) => c.write_current(out),
            Cursor::Repeat(c) => c.write_current(out),
        }
    }

    /// An independent copy at its first position.  Only the immutable
    /// string tables are shared with `self`.
    fn fresh(&self) -> Cursor {
        match self {
            Cursor::Set(c) => Cursor::Set(c.fresh()),
            Cursor::Sequence(c) => Cursor::Sequence(c.fresh()),
            Cursor::Alternation(c) => Cursor::Alternation(c.fresh()),
            Cursor::Repeat(c) => Cursor::Repeat(c.fresh()),
        }
    }
}

#[derive(Debug)]
struct Set {
    items: Arc<[String]>,
    pos: usize,
}

impl Set {
    fn new(items: Arc<[String]>) -> Self {
        Self { items, pos: 0 }
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }

    fn valid(&self) -> bool {
        self.pos < self.items.len()
    }

    fn advance(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    fn write_current(&self, out: &mut String) {
        if let Some(item) = self.items.get(self.pos) {
            out.push_str(item);
        }
    }

    fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.items))
    }
}

/// Cartesian product of `parts`, enumerated like an odometer: the last
/// part turns fastest and carries ripple leftward.
///
/// Exhausted as soon as any part is empty.  With no parts at all it
/// yields the empty string once.
#[derive(Debug)]
struct Sequence {
    parts: Vec<Cursor>,
    exhausted: bool,
}

impl Sequence {
    /// `parts` must be at their first position.
    fn new(parts: Vec<Cursor>) -> Self {
        let exhausted = !parts.iter().all(Cursor::valid);
        Self { parts, exhausted }
    }

    fn rewind(&mut self) {
        for part in &mut self.parts {
            part.rewind();
        }
        self.exhausted = !self.parts.iter().all(Cursor::valid);
    }

    fn valid(&self) -> bool {
        !self.exhausted
    }

    fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        for part in self.parts.iter_mut().rev() {
            part.advance();
            if part.valid() {
                return;
            }
            part.rewind();
        }
        // The carry ran off the first part.
        self.exhausted = true;
    }

    fn write_current(&self, out: &mut String) {
        if self.exhausted {
            return;
        }
        for part in &self.parts {
            part.write_current(out);
        }
    }

    fn fresh(&self) -> Self {
        Self::new(self.parts.iter().map(Cursor::fresh).collect())
    }
}

/// Every branch in full, one after another.  Branches that start out
/// exhausted are skipped.
#[derive(Debug)]
struct Alternation {
    branches: Vec<Cursor>,
    active: usize,
}

impl Alternation {
    /// `branches` must be at their first position.
    fn new(branches: Vec<Cursor>) -> Self {
        let mut alt = Self {
            branches,
            active: 0,
        };
        alt.skip_exhausted();
        alt
    }

    fn skip_exhausted(&mut self) {
        while self
            .branches
            .get(self.active)
            .is_some_and(|branch| !branch.valid())
        {
            self.active += 1;
        }
    }

    fn rewind(&mut self) {
        for branch in &mut self.branches {
            branch.rewind();
        }
        self.active = 0;
        self.skip_exhausted();
    }

    fn valid(&self) -> bool {
        self.active < self.branches.len()
    }

    fn advance(&mut self) {
        if let Some(branch) = self.branches.get_mut(self.active) {
            branch.advance();
            self.skip_exhausted();
        }
    }

    fn write_current(&self, out: &mut String) {
        if let Some(branch) = self.branches.get(self.active) {
            branch.write_current(out);
        }
    }

    fn fresh(&self) -> Self {
        Self::new(self.branches.iter().map(Cursor::fresh).collect())
    }
}

/// `body{min,max}` as a stack of independent body copies, between `min`
/// and `max` of them.  The current string is the copies concatenated.
///
/// Visits strings in the order of the expansion
/// `body₁ · … · body_min · ("" | body{1,max-min})`: grow by one copy while
/// below `max`, otherwise advance the last copy, dropping exhausted copies
/// down to `min`.  The first `min` copies then turn like a [`Sequence`].
///
/// The copies live side by side, so stack depth never depends on `max` or
/// on how far an unbounded repetition has grown.
#[derive(Debug)]
struct Repeat {
    /// Template, never advanced itself.
    body: Box<Cursor>,
    copies: Vec<Cursor>,
    min: usize,
    /// `None` grows without end.
    max: Option<usize>,
    exhausted: bool,
}

impl Repeat {
    fn new(body: Cursor, min: u32, max: Option<u32>) -> Self {
        let min = min as usize;
        let copies: Vec<Cursor> = (0..min).map(|_| body.fresh()).collect();
        let exhausted = !copies.iter().all(Cursor::valid);
        Self {
            body: Box::new(body),
            copies,
            min,
            max: max.map(|max| max as usize),
            exhausted,
        }
    }

    fn can_grow(&self) -> bool {
        self.max.is_none_or(|max| self.copies.len() < max) && self.body.valid()
    }

    fn rewind(&mut self) {
        self.copies.truncate(self.min);
        for copy in &mut self.copies {
            copy.rewind();
        }
        self.exhausted = !self.copies.iter().all(Cursor::valid);
    }

    fn valid(&self) -> bool {
        !self.exhausted
    }

    fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        if self.can_grow() {
            self.copies.push(self.body.fresh());
            return;
        }
        while self.copies.len() > self.min {
            if let Some(last) = self.copies.last_mut() {
                last.advance();
                if last.valid() {
                    return;
                }
            }
            self.copies.pop();
        }
        for copy in self.copies.iter_mut().rev() {
            copy.advance();
            if copy.valid() {
                return;
            }
            copy.rewind();
        }
        self.exhausted = true;
    }

    fn write_current(&self, out: &mut String) {
        if self.exhausted {
            return;
        }
        for copy in &self.copies {
            copy.write_current(out);
        }
    }

    fn fresh(&self) -> Self {
        let max = self.max.map(|max| max as u32);
        Self::new(self.body.fresh(), self.min as u32, max)
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Builds a cursor tree isomorphic to a pattern tree.
struct CursorBuilder<'a> {
    charset: &'a Charset,
    infinite_cap: Option<u32>,
    /// Expanded class tables.  Identical classes (`\d\d\d`, the copies of
    /// a repeated body) share a single table.
    classes: IndexMap<Vec<ClassRange>, Arc<[String]>>,
    /// Set when a repetition stays unbounded.
    unbounded: bool,
}

impl<'a> CursorBuilder<'a> {
    fn new(charset: &'a Charset, infinite_cap: Option<u32>) -> Self {
        Self {
            charset,
            infinite_cap,
            classes: IndexMap::new(),
            unbounded: false,
        }
    }

    /// Return the expansion of `ranges` against the charset, computing it
    /// only the first time these ranges are seen.
    fn intern_class(&mut self, ranges: &[ClassRange]) -> Arc<[String]> {
        if let Some(items) = self.classes.get(ranges) {
            return Arc::clone(items);
        }
        let items: Arc<[String]> = expand(ranges, self.charset).into();
        self.classes.insert(ranges.to_vec(), Arc::clone(&items));
        items
    }

    fn build(&mut self, node: &Node) -> Cursor {
        if let Some(rep) = node.as_repetition() {
            let body = self.build(rep.body);
            let max = rep.capped_max(self.infinite_cap);
            self.unbounded |= max.is_none();
            return Cursor::Repeat(Repeat::new(body, rep.min, max));
        }

        match node {
            Node::Literal(text) => Cursor::Set(Set::new(vec![text.clone()].into())),
            Node::CharClass(ranges) => Cursor::Set(Set::new(self.intern_class(ranges))),
            Node::AnyChar | Node::AnyCharNoNewline => {
                let charset = self.charset;
                Cursor::Set(Set::new(self.intern_class(charset.ranges())))
            }
            Node::Concat(subs) => {
                Cursor::Sequence(Sequence::new(subs.iter().map(|sub| self.build(sub)).collect()))
            }
            Node::Capture(sub) => self.build(sub),
            Node::Alternate(subs) => Cursor::Alternation(Alternation::new(
                subs.iter().map(|sub| self.build(sub)).collect(),
            )),
            _ => Cursor::empty(),
        }
    }
}

/// A lazy enumeration of the strings a pattern matches.
///
/// Created by [`generate`] or [`Genex::generate`].  Strings come in a
/// fixed order: alternation branches in order, repetitions shortest first,
/// concatenations varying their last element fastest, class characters
/// ascending.
///
/// Dropping the generator stops the enumeration; [`rewind`](Self::rewind)
/// restarts it.
#[derive(Debug)]
pub struct Generator {
    root: Cursor,
}

impl Generator {
    /// Restart from the first string.
    pub fn rewind(&mut self) {
        self.root.rewind();
    }
}

impl Iterator for Generator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.root.valid() {
            return None;
        }
        let mut value = String::new();
        self.root.write_current(&mut value);
        self.root.advance();
        Some(value)
    }

    /// Skips without building the skipped strings.
    fn nth(&mut self, n: usize) -> Option<String> {
        for _ in 0..n {
            if !self.root.valid() {
                return None;
            }
            self.root.advance();
        }
        self.next()
    }
}

impl FusedIterator for Generator {}

/// Enumerate the strings `node` matches with its classes restricted to
/// `charset`.
///
/// `infinite_cap` bounds unbounded repetitions exactly as in [`count`].
///
/// # Non-termination
///
/// With `infinite_cap == None`, a reachable unbounded repetition makes the
/// generator infinite.  Each [`next`](Iterator::next) call still returns,
/// so use [`Iterator::take`] or stop consuming; collecting it will not end.
pub fn generate(node: &Node, charset: &Charset, infinite_cap: Option<u32>) -> Generator {
    let mut builder = CursorBuilder::new(charset, infinite_cap);
    let root = Cursor::Sequence(Sequence::new(vec![builder.build(node)]));
    if builder.unbounded {
        tracing::warn!("pattern repeats without an upper bound and no infinite cap is set; generation may never end");
    }
    tracing::trace!(class_tables = builder.classes.len(), "built cursor tree");
    Generator { root }
}

/// Push every string of [`generate`] into `consumer`.
///
/// Never returns if `infinite_cap` is `None` and the pattern has a
/// reachable unbounded repetition.
pub fn generate_each(
    node: &Node,
    charset: &Charset,
    infinite_cap: Option<u32>,
    consumer: impl FnMut(String),
) {
    generate(node, charset, infinite_cap).for_each(consumer);
}

// ---------------------------------------------------------------------------
// Front end
// ---------------------------------------------------------------------------

/// The `infinite_cap` a [`GenexBuilder`] starts with.
pub const DEFAULT_INFINITE_CAP: u32 = 3;

/// Configures how patterns are parsed and what they are counted against.
///
/// ```
/// use genex::{Charset, GenexBuilder};
///
/// let genex = GenexBuilder::new()
///     .charset(Charset::parse(r"[0-9]")?)
///     .infinite_cap(Some(2))
///     .build(r"\d+")?;
/// assert_eq!(genex.count(), 1110.0);
/// # Ok::<(), genex::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct GenexBuilder {
    charset: Charset,
    infinite_cap: Option<u32>,
    parser: regex_syntax::ParserBuilder,
}

impl Default for GenexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GenexBuilder {
    /// Printable ASCII charset, [`DEFAULT_INFINITE_CAP`], and the default
    /// `regex-syntax` flags.
    pub fn new() -> Self {
        Self {
            charset: Charset::printable(),
            infinite_cap: Some(DEFAULT_INFINITE_CAP),
            parser: regex_syntax::ParserBuilder::new(),
        }
    }

    pub fn charset(&mut self, charset: Charset) -> &mut Self {
        self.charset = charset;
        self
    }

    /// `None` leaves unbounded repetitions unbounded; see [`generate`]
    /// before doing so.
    pub fn infinite_cap(&mut self, infinite_cap: Option<u32>) -> &mut Self {
        self.infinite_cap = infinite_cap;
        self
    }

    /// The `i` flag.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.parser.case_insensitive(yes);
        self
    }

    /// The `m` flag.
    pub fn multi_line(&mut self, yes: bool) -> &mut Self {
        self.parser.multi_line(yes);
        self
    }

    /// The `s` flag.  Turns `.` into [`Node::AnyChar`].
    pub fn dot_matches_new_line(&mut self, yes: bool) -> &mut Self {
        self.parser.dot_matches_new_line(yes);
        self
    }

    /// The `u` flag.
    pub fn unicode(&mut self, yes: bool) -> &mut Self {
        self.parser.unicode(yes);
        self
    }

    /// The `x` flag.
    pub fn ignore_whitespace(&mut self, yes: bool) -> &mut Self {
        self.parser.ignore_whitespace(yes);
        self
    }

    /// Parse `pattern` and bind it to this configuration.
    pub fn build(&self, pattern: &str) -> Result<Genex, Error> {
        let hir = self.parser.build().parse(pattern)?;
        tracing::trace!(pattern, "parsed pattern");
        Ok(self.build_node(Node::from_hir(&hir)))
    }

    /// Bind an existing pattern tree to this configuration.
    pub fn build_node(&self, pattern: Node) -> Genex {
        Genex {
            pattern,
            charset: self.charset.clone(),
            infinite_cap: self.infinite_cap,
        }
    }
}

/// A pattern bound to a charset and an infinite cap.
#[derive(Clone, Debug)]
pub struct Genex {
    pattern: Node,
    charset: Charset,
    infinite_cap: Option<u32>,
}

impl Genex {
    /// Parse `pattern` with the [`GenexBuilder`] defaults.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        GenexBuilder::new().build(pattern)
    }

    pub fn pattern(&self) -> &Node {
        &self.pattern
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn infinite_cap(&self) -> Option<u32> {
        self.infinite_cap
    }

    /// See [`count`].
    pub fn count(&self) -> f64 {
        count(&self.pattern, &self.charset, self.infinite_cap)
    }

    /// See [`generate`].
    pub fn generate(&self) -> Generator {
        generate(&self.pattern, &self.charset, self.infinite_cap)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
