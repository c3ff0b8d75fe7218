//! Parser combinators: the building blocks the grammar parsers are composed
//! from. Each combinator is a small struct implementing [`Parser`]; the
//! [`prelude`](super::prelude) exposes constructor functions for all of them.
//!
//! * Basic: `Equal`, `Satisfy`, `Fail`
//! * Sequential: `Preceded`, `Delimited`, `Tuple2`..`Tuple5`
//! * Alternative: `Choice`
//! * Repetition: `Many`, `Many1`, `SeparatedList`
//! * Transformation: `Map`, `TryMap`, `AsUnit`, `Optional`
//! * Structure: `Lazy` (recursion), `WithContext` (error labeling)

use std::fmt;
use std::marker::PhantomData;

use super::core::{ParseError, ParseResult, Parser};

/// Matches one input item equal to a given value and consumes it.
#[derive(Clone)]
pub struct Equal<I> {
    value: I,
}

impl<I> Equal<I> {
    pub fn new(value: I) -> Self {
        Self { value }
    }
}

impl<I: Clone + PartialEq + fmt::Display> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            Some(found) => Err(ParseError::Unexpected {
                expected: self.value.to_string(),
                found: found.to_string(),
                position: pos,
                context: None,
            }),
            None => Err(ParseError::UnexpectedEof { context: None }),
        }
    }
}

/// Matches one input item the projection accepts, yielding the projected
/// value. `expected` labels the rejection error.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    f: F,
    expected: String,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O, F> Satisfy<I, O, F> {
    pub fn new(f: F, expected: &str) -> Self {
        Self {
            f,
            expected: expected.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    I: fmt::Display,
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        match input.get(pos) {
            Some(item) => match (self.f)(item) {
                Some(result) => Ok((pos + 1, result)),
                None => Err(ParseError::Unexpected {
                    expected: self.expected.clone(),
                    found: item.to_string(),
                    position: pos,
                    context: None,
                }),
            },
            None => Err(ParseError::UnexpectedEof { context: None }),
        }
    }
}

/// Always fails with a message.
#[derive(Clone)]
pub struct Fail<I, O> {
    message: String,
    _phantom: PhantomData<(I, O)>,
}

impl<I, O> Fail<I, O> {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl<I, O> Parser<I, O> for Fail<I, O> {
    fn parse(&self, _input: &[I], pos: usize) -> ParseResult<O> {
        Err(ParseError::Failure {
            message: self.message.clone(),
            position: pos,
            context: None,
        })
    }
}

/// Tries each parser in order, succeeding with the first that succeeds.
pub struct Choice<I, O> {
    parsers: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Choice<I, O> {
    pub fn new(parsers: Vec<Box<dyn Parser<I, O>>>) -> Self {
        Self { parsers }
    }
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        for parser in &self.parsers {
            match parser.parse(input, pos) {
                Ok(result) => return Ok(result),
                // a Failure is a committed error, not a reason to try the
                // next alternative
                Err(e @ ParseError::Failure { .. }) => return Err(e),
                Err(_) => continue,
            }
        }
        Err(ParseError::NoAlternative {
            position: pos,
            context: None,
        })
    }
}

/// Transforms the output of a parser with a function.
#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        self.parser
            .parse(input, pos)
            .map(|(pos, value)| (pos, (self.f)(value)))
    }
}

/// Like [`Map`] but the function can reject the parsed value; a rejection is
/// a committed [`ParseError::Failure`] at the construct's start position.
#[derive(Clone)]
pub struct TryMap<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> TryMap<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<I, A, B, P, F> Parser<I, B> for TryMap<P, F, A, B>
where
    P: Parser<I, A>,
    F: Fn(A) -> Result<B, String>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        let (new_pos, value) = self.parser.parse(input, pos)?;
        match (self.f)(value) {
            Ok(result) => Ok((new_pos, result)),
            Err(message) => Err(ParseError::Failure {
                message,
                position: pos,
                context: None,
            }),
        }
    }
}

/// Discards a parser's output, yielding `()`.
#[derive(Clone)]
pub struct AsUnit<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> AsUnit<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, P, O> Parser<I, ()> for AsUnit<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        self.parser.parse(input, pos).map(|(pos, _)| (pos, ()))
    }
}

/// Applies a parser zero or more times, collecting the results.
#[derive(Clone)]
pub struct Many<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        loop {
            match self.parser.parse(input, current_pos) {
                Ok((new_pos, value)) => {
                    results.push(value);
                    current_pos = new_pos;
                }
                Err(e @ ParseError::Failure { .. }) => return Err(e),
                Err(_) => break,
            }
        }

        Ok((current_pos, results))
    }
}

/// Applies a parser one or more times.
#[derive(Clone)]
pub struct Many1<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Many1<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Vec<O>> for Many1<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let (pos, first) = self.parser.parse(input, pos)?;
        let mut results = vec![first];
        let mut current_pos = pos;

        loop {
            match self.parser.parse(input, current_pos) {
                Ok((new_pos, value)) => {
                    results.push(value);
                    current_pos = new_pos;
                }
                Err(e @ ParseError::Failure { .. }) => return Err(e),
                Err(_) => break,
            }
        }

        Ok((current_pos, results))
    }
}

/// Parses items separated by a separator; handles the empty list and a
/// trailing separator.
pub struct SeparatedList<P, S, I, O> {
    item_parser: P,
    separator_parser: S,
    _phantom: PhantomData<(I, O)>,
}

impl<P, S, I, O> SeparatedList<P, S, I, O> {
    pub fn new(item_parser: P, separator_parser: S) -> Self {
        Self {
            item_parser,
            separator_parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, I, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut results = Vec::new();
        let mut current_pos = pos;

        if let Ok((new_pos, value)) = self.item_parser.parse(input, current_pos) {
            results.push(value);
            current_pos = new_pos;

            while let Ok((sep_pos, _)) = self.separator_parser.parse(input, current_pos) {
                match self.item_parser.parse(input, sep_pos) {
                    Ok((new_pos, value)) => {
                        results.push(value);
                        current_pos = new_pos;
                    }
                    Err(_) => break,
                }
            }
        }

        Ok((current_pos, results))
    }
}

/// Wraps a parser so failure yields `None` instead of an error.
#[derive(Clone)]
pub struct Optional<P, I, O> {
    parser: P,
    _phantom: PhantomData<(I, O)>,
}

impl<P, I, O> Optional<P, I, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, I, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Option<O>> {
        match self.parser.parse(input, pos) {
            Ok((new_pos, value)) => Ok((new_pos, Some(value))),
            Err(e @ ParseError::Failure { .. }) => Err(e),
            Err(_) => Ok((pos, None)),
        }
    }
}

/// Runs two parsers in sequence, keeping only the second result.
#[derive(Clone)]
pub struct Preceded<P1, P2, I, O> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O)>,
}

impl<P1, P2, I, O> Preceded<P1, P2, I, O> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O> Parser<I, O> for Preceded<P1, P2, I, O>
where
    P1: Parser<I, ()>,
    P2: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.parser1.parse(input, pos)?;
        self.parser2.parse(input, pos)
    }
}

/// Parses content between two delimiters, keeping only the content.
#[derive(Clone)]
pub struct Delimited<L, P, R, I, O> {
    left: L,
    parser: P,
    right: R,
    _phantom: PhantomData<(I, O)>,
}

impl<L, P, R, I, O> Delimited<L, P, R, I, O> {
    pub fn new(left: L, parser: P, right: R) -> Self {
        Self {
            left,
            parser,
            right,
            _phantom: PhantomData,
        }
    }
}

impl<I, O, L, P, R> Parser<I, O> for Delimited<L, P, R, I, O>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, value) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, value))
    }
}

#[derive(Clone)]
pub struct Tuple2<P1, P2, I, O1, O2> {
    parser1: P1,
    parser2: P2,
    _phantom: PhantomData<(I, O1, O2)>,
}

impl<P1, P2, I, O1, O2> Tuple2<P1, P2, I, O1, O2> {
    pub fn new(parser1: P1, parser2: P2) -> Self {
        Self {
            parser1,
            parser2,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, I, O1, O2> Parser<I, (O1, O2)> for Tuple2<P1, P2, I, O1, O2>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        Ok((pos, (result1, result2)))
    }
}

#[derive(Clone)]
pub struct Tuple3<P1, P2, P3, I, O1, O2, O3> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    _phantom: PhantomData<(I, O1, O2, O3)>,
}

impl<P1, P2, P3, I, O1, O2, O3> Tuple3<P1, P2, P3, I, O1, O2, O3> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, I, O1, O2, O3> Parser<I, (O1, O2, O3)> for Tuple3<P1, P2, P3, I, O1, O2, O3>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        let (pos, result3) = self.parser3.parse(input, pos)?;
        Ok((pos, (result1, result2, result3)))
    }
}

#[derive(Clone)]
pub struct Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    parser4: P4,
    _phantom: PhantomData<(I, O1, O2, O3, O4)>,
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3, parser4: P4) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            parser4,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, P4, I, O1, O2, O3, O4> Parser<I, (O1, O2, O3, O4)>
    for Tuple4<P1, P2, P3, P4, I, O1, O2, O3, O4>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3, O4)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        let (pos, result3) = self.parser3.parse(input, pos)?;
        let (pos, result4) = self.parser4.parse(input, pos)?;
        Ok((pos, (result1, result2, result3, result4)))
    }
}

#[derive(Clone)]
pub struct Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> {
    parser1: P1,
    parser2: P2,
    parser3: P3,
    parser4: P4,
    parser5: P5,
    _phantom: PhantomData<(I, O1, O2, O3, O4, O5)>,
}

impl<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> {
    pub fn new(parser1: P1, parser2: P2, parser3: P3, parser4: P4, parser5: P5) -> Self {
        Self {
            parser1,
            parser2,
            parser3,
            parser4,
            parser5,
            _phantom: PhantomData,
        }
    }
}

impl<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5> Parser<I, (O1, O2, O3, O4, O5)>
    for Tuple5<P1, P2, P3, P4, P5, I, O1, O2, O3, O4, O5>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
    P4: Parser<I, O4>,
    P5: Parser<I, O5>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3, O4, O5)> {
        let (pos, result1) = self.parser1.parse(input, pos)?;
        let (pos, result2) = self.parser2.parse(input, pos)?;
        let (pos, result3) = self.parser3.parse(input, pos)?;
        let (pos, result4) = self.parser4.parse(input, pos)?;
        let (pos, result5) = self.parser5.parse(input, pos)?;
        Ok((pos, (result1, result2, result3, result4, result5)))
    }
}

/// Defers construction of a parser, enabling recursive grammars.
#[derive(Clone)]
pub struct Lazy<F> {
    f: F,
}

impl<F> Lazy<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.f)().parse(input, pos)
    }
}

/// Labels errors from the inner parser with a grammar-level context.
#[derive(Clone)]
pub struct WithContext<P, C> {
    parser: P,
    context: C,
}

impl<P, C> WithContext<P, C> {
    pub fn new(parser: P, context: C) -> Self {
        Self { parser, context }
    }
}

impl<I, O, P, C: ToString> Parser<I, O> for WithContext<P, C>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|e| e.with_context(&self.context.to_string()))
    }
}
