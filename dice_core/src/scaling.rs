//! Scaling - growing a damage formula with caster level or slot level

use crate::bindings::Bindings;
use crate::formula::{Formula, Term};
use crate::FormulaError;
use tracing::debug;

/// Scaling steps for a cantrip cast by a caster of `level`
pub fn cantrip_steps(level: u32) -> u32 {
    (level + 1) / 6
}

/// Scaling steps for a leveled effect cast at `used` with base level `base`
pub fn slot_steps(used: u8, base: u8) -> u32 {
    u32::from(used.saturating_sub(base))
}

/// Scale `base` by `steps` applications of `scaling`
///
/// A blank `scaling` formula scales by the base formula itself. The scaling
/// formula is resolved against `bindings` and multiplied by `steps` (dice and
/// constants). When the result is a single dice term of the same kind as the
/// base's first term the two counts combine; otherwise the scaled formula is
/// appended. Zero steps return `base` unchanged.
pub fn scale(
    base: &str,
    scaling: &str,
    steps: u32,
    bindings: &Bindings,
) -> Result<String, FormulaError> {
    if steps == 0 {
        return Ok(base.to_string());
    }

    let source = if scaling.trim().is_empty() { base } else { scaling };
    let mut scaled = Formula::parse(source)?.substitute(bindings)?;
    scaled.alter(steps, 0, true);

    let mut base_formula = Formula::parse(base)?;
    if let [Term::Dice(extra)] = scaled.terms() {
        if let Some(Term::Dice(first)) = base_formula.terms_mut().first_mut() {
            if first.same_kind(extra) {
                first.number = first.number.saturating_add(extra.number);
                let combined = base_formula.to_string();
                debug!(base, steps, formula = %combined, "scaled formula (combined)");
                return Ok(combined);
            }
        }
    }

    let appended = Formula::compose(&[base.to_string(), scaled.to_string()]);
    debug!(base, steps, formula = %appended, "scaled formula (appended)");
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_steps() {
        assert_eq!(cantrip_steps(1), 0);
        assert_eq!(cantrip_steps(4), 0);
        assert_eq!(cantrip_steps(5), 1);
        assert_eq!(cantrip_steps(11), 2);
        assert_eq!(cantrip_steps(17), 3);
        assert_eq!(slot_steps(3, 1), 2);
        assert_eq!(slot_steps(1, 3), 0);
    }

    #[test]
    fn test_zero_steps_returns_base() {
        let out = scale("1d10 + @mod", "1d10", 0, &Bindings::new()).unwrap();
        assert_eq!(out, "1d10 + @mod");
    }

    #[test]
    fn test_same_kind_dice_combine() {
        let out = scale("1d10", "1d10", 2, &Bindings::new()).unwrap();
        assert_eq!(out, "3d10");

        let out = scale("8d6", "", 1, &Bindings::new()).unwrap();
        assert_eq!(out, "16d6");
    }

    #[test]
    fn test_other_dice_appended() {
        let out = scale("1d8 + @mod", "1d6", 2, &Bindings::new()).unwrap();
        assert_eq!(out, "1d8 + @mod + 2d6");
    }

    #[test]
    fn test_scaling_constants_multiplied() {
        let bindings = Bindings::new().with("mod", 3);
        let out = scale("1d4", "1d4 + @mod", 2, &bindings).unwrap();
        assert_eq!(out, "1d4 + 2d4 + 6");
    }

    #[test]
    fn test_invalid_scaling_formula() {
        assert!(scale("1d4", "1d", 1, &Bindings::new()).is_err());
    }

    proptest! {
        #[test]
        fn prop_dice_count_non_decreasing(number in 1u32..5, faces in 2u32..13, steps in 0u32..6) {
            let base = format!("{}d{}", number, faces);
            let bindings = Bindings::new();
            let fewer = Formula::parse(&scale(&base, "1d6", steps, &bindings).unwrap()).unwrap();
            let more = Formula::parse(&scale(&base, "1d6", steps + 1, &bindings).unwrap()).unwrap();
            prop_assert!(more.dice_count() >= fewer.dice_count());
        }

        #[test]
        fn prop_scale_is_idempotent(steps in 0u32..6) {
            let bindings = Bindings::new().with("mod", 2);
            let a = scale("2d8 + @mod", "1d8", steps, &bindings).unwrap();
            let b = scale("2d8 + @mod", "1d8", steps, &bindings).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
