//! Dice formula parsing.
//!
//! A formula is `<count> d <size>` followed by any number of `+N` / `-N`
//! terms, with whitespace (any Unicode space) allowed anywhere between
//! tokens. The `d` is lowercase only:
//!
//! ```text
//! 2d6        1d8 + 2        2 d 6 + 3 - 1
//! ```
//!
//! Count and size must be at least 1. The trailing terms are summed into a
//! single flat offset.

use std::fmt;

use logos::Logos;
use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum FormulaToken {
    #[regex(r"[0-9]+")]
    Number,

    #[token("d")]
    Die,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,
}

/// A parsed `XdY+Z` formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFormula {
    /// Number of dice.
    pub count: u32,
    /// Faces per die.
    pub die_size: u32,
    /// Signed sum of every trailing term.
    pub flat_offset: i64,
}

impl ParsedFormula {
    /// The `XdY` part without the offset.
    pub fn dice_term(&self) -> String {
        format!("{}d{}", self.count, self.die_size)
    }

    /// The lowest total the dice can show.
    pub fn min_dice(&self) -> i64 {
        i64::from(self.count)
    }

    /// The highest total the dice can show.
    pub fn max_dice(&self) -> i64 {
        i64::from(self.count) * i64::from(self.die_size)
    }
}

impl fmt::Display for ParsedFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dice_term())?;
        match self.flat_offset {
            0 => Ok(()),
            n if n > 0 => write!(f, "+{n}"),
            n => write!(f, "{n}"),
        }
    }
}

impl std::str::FromStr for ParsedFormula {
    type Err = MechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}

/// Parse a formula string.
///
/// Fails with [`MechError::MalformedFormula`] carrying the input when it
/// does not match the grammar. Nothing is returned for a partial match.
pub fn parse_formula(input: &str) -> MechResult<ParsedFormula> {
    let malformed = || MechError::MalformedFormula(input.to_string());

    let mut tokens = Vec::new();
    for (result, span) in FormulaToken::lexer(input).spanned() {
        let token = result.map_err(|()| malformed())?;
        tokens.push((token, &input[span]));
    }
    let mut tokens = tokens.into_iter();

    let count = positive(tokens.next()).ok_or_else(malformed)?;
    if !matches!(tokens.next(), Some((FormulaToken::Die, _))) {
        return Err(malformed());
    }
    let die_size = positive(tokens.next()).ok_or_else(malformed)?;

    let mut flat_offset: i64 = 0;
    while let Some((sign, _)) = tokens.next() {
        let sign: i64 = match sign {
            FormulaToken::Plus => 1,
            FormulaToken::Minus => -1,
            _ => return Err(malformed()),
        };
        let value = match tokens.next() {
            Some((FormulaToken::Number, text)) => text.parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(malformed)?;
        flat_offset = flat_offset
            .checked_add(sign * value)
            .ok_or_else(malformed)?;
    }

    Ok(ParsedFormula {
        count,
        die_size,
        flat_offset,
    })
}

fn positive(token: Option<(FormulaToken, &str)>) -> Option<u32> {
    match token {
        Some((FormulaToken::Number, text)) => text.parse::<u32>().ok().filter(|&n| n >= 1),
        _ => None,
    }
}

/// Append a signed term to a formula string. A zero term leaves it as is.
///
/// Used for modifiers that apply to the whole formula rather than to each
/// die, such as the speed modifier on initiative.
pub fn append_term(formula: &str, term: i64) -> String {
    let formula = formula.trim();
    match term {
        0 => formula.to_string(),
        n if n > 0 => format!("{formula} + {n}"),
        n => format!("{formula} - {}", n.unsigned_abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_plain_dice() {
        let f = parse_formula("2d6").unwrap();
        assert_eq!(f.count, 2);
        assert_eq!(f.die_size, 6);
        assert_eq!(f.flat_offset, 0);
    }

    #[test]
    fn sums_trailing_terms() {
        let f = parse_formula("2d6+3-1").unwrap();
        assert_eq!(
            f,
            ParsedFormula {
                count: 2,
                die_size: 6,
                flat_offset: 2
            }
        );
    }

    #[test]
    fn tolerates_whitespace_everywhere() {
        let f = parse_formula("  2 d 6 +  3 -\t1 ").unwrap();
        assert_eq!(f.flat_offset, 2);
        assert_eq!(parse_formula("2d6\x0b+3").unwrap().flat_offset, 3);
        assert_eq!(parse_formula("2d6+\u{a0}3").unwrap().flat_offset, 3);
        assert_eq!(parse_formula("\u{2003}1d8\u{3000}").unwrap().die_size, 8);
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "", "d6", "2d", "2d6+", "2d6++1", "+1", "2d6+1d4", "2x6", "0d6", "2d0", "2d6 3",
            "abc", "-2d6", "1D6", "2D8+1",
        ] {
            match parse_formula(bad) {
                Err(MechError::MalformedFormula(s)) => assert_eq!(s, bad),
                other => panic!("expected MalformedFormula for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(parse_formula("2 d 6 + 3 - 1").unwrap().to_string(), "2d6+2");
        assert_eq!(parse_formula("1d4-3").unwrap().to_string(), "1d4-3");
        assert_eq!(parse_formula("3d8+0").unwrap().to_string(), "3d8");
    }

    #[test]
    fn from_str_delegates() {
        let f: ParsedFormula = "1d20+5".parse().unwrap();
        assert_eq!(f.flat_offset, 5);
    }

    #[test]
    fn dice_bounds() {
        let f = parse_formula("3d6").unwrap();
        assert_eq!(f.min_dice(), 3);
        assert_eq!(f.max_dice(), 18);
    }

    #[test]
    fn append_term_signs() {
        assert_eq!(append_term("1d6", 2), "1d6 + 2");
        assert_eq!(append_term("1d6", -3), "1d6 - 3");
        assert_eq!(append_term(" 1d6 ", 0), "1d6");
        assert_eq!(parse_formula(&append_term("1d6+1", -3)).unwrap().flat_offset, -2);
    }

    fn ws() -> impl Strategy<Value = String> {
        "[ \t]{0,3}"
    }

    proptest! {
        #[test]
        fn whitespace_does_not_change_the_parse(
            count in 1u32..50,
            size in 1u32..100,
            terms in prop::collection::vec((any::<bool>(), 0i64..1000), 0..5),
            pads in prop::collection::vec(ws(), 16),
        ) {
            let mut compact = format!("{count}d{size}");
            let mut spaced = format!("{}{count}{}d{}{size}", pads[0], pads[1], pads[2]);
            let mut expected = 0i64;
            for (i, (plus, value)) in terms.iter().enumerate() {
                let sign = if *plus { '+' } else { '-' };
                compact.push_str(&format!("{sign}{value}"));
                spaced.push_str(&format!("{}{sign}{}{value}", pads[3 + i * 2], pads[4 + i * 2]));
                expected += if *plus { *value } else { -*value };
            }
            spaced.push_str(&pads[15]);

            let a = parse_formula(&compact).unwrap();
            let b = parse_formula(&spaced).unwrap();
            prop_assert_eq!(a, b);
            prop_assert_eq!(a.count, count);
            prop_assert_eq!(a.die_size, size);
            prop_assert_eq!(a.flat_offset, expected);
        }

        #[test]
        fn strings_with_foreign_characters_are_rejected(
            prefix in "[0-9]{1,2}d[0-9]{1,2}",
            junk in "[a-ce-zA-Z*/()=%]{1,3}",
        ) {
            let input = format!("{prefix}{junk}");
            prop_assert!(matches!(
                parse_formula(&input),
                Err(MechError::MalformedFormula(_))
            ));
        }
    }
}
