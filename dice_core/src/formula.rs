//! Dice formula terms, parsing and structural rewriting
//!
//! A formula is a flat sequence of operands separated by operators. Operands are
//! dice (`2d6kh`), integer constants, `@path` variables, parenthesised groups and
//! single-argument math functions (`floor(@prof / 2)`).

use crate::bindings::Bindings;
use crate::FormulaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Arithmetic operator between two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// The character this operator is written with
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// Modifier applied to the dice of a single dice term, in written order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieModifier {
    /// `r<N`: reroll once every die showing less than N
    RerollBelow(u32),
    /// `khN`: keep the N highest dice
    KeepHighest(u32),
    /// `klN`: keep the N lowest dice
    KeepLowest(u32),
    /// `minN`: every die counts as at least N
    Minimum(u32),
}

impl fmt::Display for DieModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DieModifier::RerollBelow(n) => write!(f, "r<{}", n),
            DieModifier::KeepHighest(1) => write!(f, "kh"),
            DieModifier::KeepHighest(n) => write!(f, "kh{}", n),
            DieModifier::KeepLowest(1) => write!(f, "kl"),
            DieModifier::KeepLowest(n) => write!(f, "kl{}", n),
            DieModifier::Minimum(n) => write!(f, "min{}", n),
        }
    }
}

/// Most dice a single term may roll
pub const MAX_DICE: u32 = 1000;

/// A group of identical dice, e.g. `2d6` or `1d20r<2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceTerm {
    pub number: u32,
    pub faces: u32,
    #[serde(default)]
    pub modifiers: Vec<DieModifier>,
}

impl DiceTerm {
    pub fn new(number: u32, faces: u32) -> Self {
        DiceTerm {
            number,
            faces,
            modifiers: Vec::new(),
        }
    }

    /// Two terms are the same kind when only their dice count differs
    pub fn same_kind(&self, other: &DiceTerm) -> bool {
        self.faces == other.faces && self.modifiers == other.modifiers
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.number, self.faces)?;
        for modifier in &self.modifiers {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}

/// Single-argument math functions usable inside formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathFunction {
    Floor,
    Ceil,
    Round,
    Abs,
}

impl MathFunction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "floor" => Some(MathFunction::Floor),
            "ceil" => Some(MathFunction::Ceil),
            "round" => Some(MathFunction::Round),
            "abs" => Some(MathFunction::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Floor => "floor",
            MathFunction::Ceil => "ceil",
            MathFunction::Round => "round",
            MathFunction::Abs => "abs",
        }
    }

    pub(crate) fn apply(self, value: f64) -> f64 {
        match self {
            MathFunction::Floor => value.floor(),
            MathFunction::Ceil => value.ceil(),
            MathFunction::Round => value.round(),
            MathFunction::Abs => value.abs(),
        }
    }
}

/// One element of a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Dice(DiceTerm),
    Number(i64),
    Variable(String),
    Group(Formula),
    Function {
        function: MathFunction,
        argument: Formula,
    },
    Operator(Operator),
}

impl Term {
    fn has_dice(&self) -> bool {
        match self {
            Term::Dice(_) => true,
            Term::Group(inner) => inner.has_dice(),
            Term::Function { argument, .. } => argument.has_dice(),
            _ => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Dice(dice) => write!(f, "{}", dice),
            Term::Number(n) => write!(f, "{}", n),
            Term::Variable(path) => write!(f, "@{}", path),
            Term::Group(inner) => write!(f, "({})", inner),
            Term::Function { function, argument } => write!(f, "{}({})", function.name(), argument),
            Term::Operator(op) => write!(f, "{}", op.symbol()),
        }
    }
}

/// A parsed dice formula
///
/// Terms always alternate operand, operator, operand. A leading sign is folded
/// into the first operand while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    terms: Vec<Term>,
}

impl Formula {
    /// Parse a formula string
    pub fn parse(input: &str) -> Result<Self, FormulaError> {
        let mut parser = Parser::new(input);
        parser.skip_ws();
        if parser.at_end() {
            return Err(FormulaError::Empty);
        }
        let formula = parser.formula()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(formula),
            Some(found) => Err(FormulaError::UnexpectedChar {
                position: parser.pos,
                found,
            }),
        }
    }

    /// Join formula fragments with `+`, skipping blank fragments
    pub fn compose<S: AsRef<str>>(parts: &[S]) -> String {
        parts
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub(crate) fn terms_mut(&mut self) -> &mut Vec<Term> {
        &mut self.terms
    }

    /// True if any term (including nested groups) rolls dice
    pub fn has_dice(&self) -> bool {
        self.terms.iter().any(Term::has_dice)
    }

    /// Face count of the first dice term, searching groups depth-first
    pub fn first_die_faces(&self) -> Option<u32> {
        self.terms.iter().find_map(|term| match term {
            Term::Dice(dice) => Some(dice.faces),
            Term::Group(inner) => inner.first_die_faces(),
            Term::Function { argument, .. } => argument.first_die_faces(),
            _ => None,
        })
    }

    /// Total number of dice rolled by this formula
    pub fn dice_count(&self) -> u64 {
        self.terms
            .iter()
            .map(|term| match term {
                Term::Dice(dice) => dice.number as u64,
                Term::Group(inner) => inner.dice_count(),
                Term::Function { argument, .. } => argument.dice_count(),
                _ => 0,
            })
            .sum()
    }

    /// Multiply every dice count by `multiply` and then add `add` dice to each
    /// dice term. Constants are multiplied too when `multiply_numeric` is set.
    pub fn alter(&mut self, multiply: u32, add: u32, multiply_numeric: bool) {
        for term in &mut self.terms {
            match term {
                Term::Dice(dice) => {
                    dice.number = dice.number.saturating_mul(multiply).saturating_add(add);
                }
                Term::Number(n) if multiply_numeric => {
                    *n = n.saturating_mul(multiply as i64);
                }
                Term::Group(inner) => inner.alter(multiply, add, multiply_numeric),
                _ => {}
            }
        }
    }

    /// The formula with every added or subtracted constant and variable removed
    ///
    /// `2d6 + 3 + @mod` becomes `2d6`. An operand that is not introduced by `+`
    /// or `-` is kept, so a leading constant survives.
    pub fn dice_only(&self) -> Formula {
        let mut terms = Vec::with_capacity(self.terms.len());
        let mut i = 0;
        while i < self.terms.len() {
            let additive = matches!(
                self.terms[i],
                Term::Operator(Operator::Add) | Term::Operator(Operator::Subtract)
            );
            let constant_next = matches!(
                self.terms.get(i + 1),
                Some(Term::Number(_)) | Some(Term::Variable(_))
            );
            if additive && constant_next {
                i += 2;
                continue;
            }
            terms.push(self.terms[i].clone());
            i += 1;
        }
        Formula { terms }
    }

    /// Replace every `@path` with its bound value
    ///
    /// Integer values become constants, anything else is parsed as a formula and
    /// grouped. Unbound paths evaluate as `0`.
    pub fn substitute(&self, bindings: &Bindings) -> Result<Formula, FormulaError> {
        let terms = self
            .terms
            .iter()
            .map(|term| match term {
                Term::Variable(path) => match bindings.get(path) {
                    Some(value) => bound_term(value),
                    None => {
                        warn!(path = %path, "unbound formula variable, using 0");
                        Ok(Term::Number(0))
                    }
                },
                Term::Group(inner) => Ok(Term::Group(inner.substitute(bindings)?)),
                Term::Function { function, argument } => Ok(Term::Function {
                    function: *function,
                    argument: argument.substitute(bindings)?,
                }),
                other => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Formula { terms })
    }
}

fn bound_term(value: &str) -> Result<Term, FormulaError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Term::Number(0));
    }
    if let Ok(n) = value.parse::<i64>() {
        return Ok(Term::Number(n));
    }
    let mut parsed = Formula::parse(value)?;
    if parsed.terms.len() == 1 {
        Ok(parsed.terms.remove(0))
    } else {
        Ok(Term::Group(parsed))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            match term {
                Term::Operator(op) => write!(f, " {} ", op.symbol())?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        let matches = token
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += token.chars().count();
        }
        matches
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn unexpected(&self) -> FormulaError {
        match self.peek() {
            Some(found) => FormulaError::UnexpectedChar {
                position: self.pos,
                found,
            },
            None => FormulaError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, c: char) -> Result<(), FormulaError> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn formula(&mut self) -> Result<Formula, FormulaError> {
        let mut terms = vec![self.operand()?];
        loop {
            self.skip_ws();
            let op = match self.peek().and_then(Operator::from_char) {
                Some(op) => op,
                None => break,
            };
            self.pos += 1;
            terms.push(Term::Operator(op));
            terms.push(self.operand()?);
        }
        Ok(Formula { terms })
    }

    fn operand(&mut self) -> Result<Term, FormulaError> {
        self.skip_ws();
        let mut negative = false;
        while let Some(c @ ('+' | '-')) = self.peek() {
            if c == '-' {
                negative = !negative;
            }
            self.pos += 1;
            self.skip_ws();
        }

        let term = self.primary()?;
        if !negative {
            return Ok(term);
        }
        Ok(match term {
            Term::Number(n) => Term::Number(-n),
            other => Term::Group(Formula {
                terms: vec![Term::Number(0), Term::Operator(Operator::Subtract), other],
            }),
        })
    }

    fn primary(&mut self) -> Result<Term, FormulaError> {
        match self.peek() {
            None => Err(FormulaError::UnexpectedEnd),
            Some(c) if c.is_ascii_digit() => self.number_or_dice(),
            Some('d') | Some('D') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.pos += 1;
                self.dice(1)
            }
            Some('@') => {
                self.pos += 1;
                let path = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                if path.is_empty() {
                    return Err(self.unexpected());
                }
                Ok(Term::Variable(path))
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.formula()?;
                self.expect(')')?;
                Ok(Term::Group(inner))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.take_while(|c| c.is_ascii_alphabetic());
                let function = MathFunction::from_name(&name.to_ascii_lowercase())
                    .ok_or(FormulaError::UnknownFunction(name))?;
                self.expect('(')?;
                let argument = self.formula()?;
                self.expect(')')?;
                Ok(Term::Function { function, argument })
            }
            Some(_) => Err(self.unexpected()),
        }
    }

    fn number_or_dice(&mut self) -> Result<Term, FormulaError> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        let is_dice = matches!(self.peek(), Some('d') | Some('D'))
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit());
        if is_dice {
            self.pos += 1;
            let number = digits
                .parse::<u32>()
                .ok()
                .filter(|n| *n <= MAX_DICE)
                .ok_or_else(|| FormulaError::InvalidDice(format!("{}d", digits)))?;
            self.dice(number)
        } else {
            digits
                .parse::<i64>()
                .map(Term::Number)
                .map_err(|_| FormulaError::InvalidDice(digits))
        }
    }

    /// Parse the faces and modifiers of a dice term; the `d` is already consumed
    fn dice(&mut self, number: u32) -> Result<Term, FormulaError> {
        let faces_text = self.take_while(|c| c.is_ascii_digit());
        let faces = faces_text
            .parse::<u32>()
            .ok()
            .filter(|f| *f > 0)
            .ok_or_else(|| FormulaError::InvalidDice(format!("{}d{}", number, faces_text)))?;

        let mut modifiers = Vec::new();
        loop {
            if self.eat("r<") {
                modifiers.push(DieModifier::RerollBelow(self.required_count()?));
            } else if self.eat("kh") {
                modifiers.push(DieModifier::KeepHighest(self.optional_count()));
            } else if self.eat("kl") {
                modifiers.push(DieModifier::KeepLowest(self.optional_count()));
            } else if self.eat("min") {
                modifiers.push(DieModifier::Minimum(self.required_count()?));
            } else if self.eat("k") {
                modifiers.push(DieModifier::KeepHighest(self.optional_count()));
            } else {
                break;
            }
        }

        Ok(Term::Dice(DiceTerm {
            number,
            faces,
            modifiers,
        }))
    }

    fn required_count(&mut self) -> Result<u32, FormulaError> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.unexpected());
        }
        digits
            .parse::<u32>()
            .map_err(|_| FormulaError::InvalidDice(digits))
    }

    fn optional_count(&mut self) -> u32 {
        let digits = self.take_while(|c| c.is_ascii_digit());
        digits.parse::<u32>().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_dice() {
        let formula = Formula::parse("2d6 + 3").unwrap();
        assert_eq!(
            formula.terms(),
            &[
                Term::Dice(DiceTerm::new(2, 6)),
                Term::Operator(Operator::Add),
                Term::Number(3),
            ]
        );
        assert_eq!(formula.to_string(), "2d6 + 3");
    }

    #[test]
    fn test_parse_normalizes_spacing() {
        let formula = Formula::parse("1d20+@abl+@prof").unwrap();
        assert_eq!(formula.to_string(), "1d20 + @abl + @prof");
    }

    #[test]
    fn test_parse_modifiers() {
        let formula = Formula::parse("1d20r<2").unwrap();
        match &formula.terms()[0] {
            Term::Dice(dice) => {
                assert_eq!(dice.faces, 20);
                assert_eq!(dice.modifiers, vec![DieModifier::RerollBelow(2)]);
            }
            other => panic!("Expected dice, got {:?}", other),
        }

        let formula = Formula::parse("4d6kh3").unwrap();
        assert_eq!(formula.to_string(), "4d6kh3");

        let formula = Formula::parse("2d20kl").unwrap();
        assert_eq!(formula.to_string(), "2d20kl");

        let formula = Formula::parse("1d20min10").unwrap();
        assert_eq!(formula.to_string(), "1d20min10");
    }

    #[test]
    fn test_parse_implicit_single_die() {
        let formula = Formula::parse("d8").unwrap();
        assert_eq!(formula.to_string(), "1d8");
    }

    #[test]
    fn test_parse_function_and_group() {
        let formula = Formula::parse("floor(@prof / 2) + (1d4 + 1)").unwrap();
        assert_eq!(formula.to_string(), "floor(@prof / 2) + (1d4 + 1)");
    }

    #[test]
    fn test_parse_negative_constant() {
        let formula = Formula::parse("1d20 + -1").unwrap();
        assert_eq!(formula.terms()[2], Term::Number(-1));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Formula::parse("   "), Err(FormulaError::Empty));
        assert_eq!(Formula::parse("1d6 +"), Err(FormulaError::UnexpectedEnd));
        assert!(matches!(
            Formula::parse("1d6 $ 2"),
            Err(FormulaError::UnexpectedChar { found: '$', .. })
        ));
        assert!(matches!(
            Formula::parse("sqrt(4)"),
            Err(FormulaError::UnknownFunction(_))
        ));
        assert!(matches!(Formula::parse("2d0"), Err(FormulaError::InvalidDice(_))));
        assert!(matches!(
            Formula::parse("4000000000d6"),
            Err(FormulaError::InvalidDice(_))
        ));
        assert!(Formula::parse("1000d6").is_ok());
    }

    #[test]
    fn test_alter_multiplies_dice() {
        let mut formula = Formula::parse("1d8 + 2d6 + 3").unwrap();
        formula.alter(2, 0, false);
        assert_eq!(formula.to_string(), "2d8 + 4d6 + 3");

        formula.alter(1, 1, false);
        assert_eq!(formula.to_string(), "3d8 + 5d6 + 3");

        formula.alter(2, 0, true);
        assert_eq!(formula.to_string(), "6d8 + 10d6 + 6");
    }

    #[test]
    fn test_dice_only_strips_constants() {
        let formula = Formula::parse("2d6 + 3 + @mod - 1 + 1d4").unwrap();
        assert_eq!(formula.dice_only().to_string(), "2d6 + 1d4");

        let constant = Formula::parse("5").unwrap();
        assert!(!constant.dice_only().has_dice());
    }

    #[test]
    fn test_substitute_bindings() {
        let bindings = Bindings::new().with("mod", 3).with("bonus", "1d4 + 1");
        let formula = Formula::parse("1d8 + @mod + @bonus + @missing").unwrap();
        let resolved = formula.substitute(&bindings).unwrap();
        assert_eq!(resolved.to_string(), "1d8 + 3 + (1d4 + 1) + 0");
    }

    #[test]
    fn test_dice_queries() {
        let formula = Formula::parse("3 + (2d10 + 1d6)").unwrap();
        assert!(formula.has_dice());
        assert_eq!(formula.first_die_faces(), Some(10));
        assert_eq!(formula.dice_count(), 3);
    }

    #[test]
    fn test_compose_skips_blank_parts() {
        assert_eq!(Formula::compose(&["1d20", "", "@abl"]), "1d20 + @abl");
    }
}
