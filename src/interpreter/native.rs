use super::{
    error::RuntimeErrorKind,
    value::{LoxValue, NativeFunction},
};
use compact_str::CompactString;
use std::time::{SystemTime, UNIX_EPOCH};

/// The values produced by `rand`, in order. The sequence repeats once exhausted.
pub const RAND_CYCLE: [f64; 12] = [
    57.0, 97.0, 28.0, 7.0, 71.0, 1.0, 79.0, 83.0, 64.0, 82.0, 89.0, 24.0,
];

/// Cursor into [`RAND_CYCLE`]. Each interpreter owns one so runs are reproducible.
#[derive(Debug, Default)]
pub struct PredefinedNumbers {
    index: usize,
}

impl PredefinedNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_number(&mut self) -> f64 {
        let value = RAND_CYCLE[self.index];
        self.index = (self.index + 1) % RAND_CYCLE.len();
        value
    }
}

#[derive(Debug)]
pub struct NativeClock;

impl NativeFunction for NativeClock {
    fn get_name(&self) -> &'static str {
        "clock"
    }

    fn arity(&self) -> usize {
        0
    }

    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind> {
        let _ = arguments;
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Ok(LoxValue::Number(since_epoch.as_secs_f64()))
    }
}

/// Rounds towards negative infinity.
#[derive(Debug)]
pub struct NativeFloor;

impl NativeFunction for NativeFloor {
    fn get_name(&self) -> &'static str {
        "floor"
    }

    fn arity(&self) -> usize {
        1
    }

    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind> {
        match arguments {
            [LoxValue::Number(v)] => Ok(LoxValue::Number(v.floor())),
            [other] => Err(RuntimeErrorKind::NonNumericArgument(other.clone())),
            _ => Err(RuntimeErrorKind::InvalidArgumentCount {
                actual: arguments.len(),
                expected: self.arity(),
            }),
        }
    }
}

/// Characters `[start, end)` of a string. Indices are floored and count characters.
#[derive(Debug)]
pub struct NativeSubstring;

impl NativeFunction for NativeSubstring {
    fn get_name(&self) -> &'static str {
        "substring"
    }

    fn arity(&self) -> usize {
        3
    }

    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind> {
        let [LoxValue::String(text), LoxValue::Number(start), LoxValue::Number(end)] = arguments
        else {
            return Err(RuntimeErrorKind::InvalidSubstringArguments);
        };
        let (start, end) = (start.floor(), end.floor());
        let length = text.chars().count();

        // Written as negated comparisons so NaN indices are rejected too.
        let in_range = !(start < 0.0 || start > length as f64 || end < 0.0 || end > length as f64)
            && !start.is_nan()
            && !end.is_nan();
        if !in_range {
            return Err(RuntimeErrorKind::SubstringOutOfRange { start, end, length });
        }
        if end <= start {
            return Ok(LoxValue::String(CompactString::default()));
        }

        let (start, end) = (start as usize, end as usize);
        Ok(LoxValue::String(
            text.chars().skip(start).take(end - start).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substring(text: &str, start: f64, end: f64) -> Result<LoxValue, RuntimeErrorKind> {
        NativeSubstring.call(&[
            LoxValue::String(text.into()),
            LoxValue::Number(start),
            LoxValue::Number(end),
        ])
    }

    #[test]
    fn rand_cycles_through_fixed_sequence() {
        let mut numbers = PredefinedNumbers::new();
        let first: Vec<f64> = (0..RAND_CYCLE.len()).map(|_| numbers.next_number()).collect();
        assert_eq!(first, RAND_CYCLE);
        assert_eq!(numbers.next_number(), 57.0);
    }

    #[test]
    fn floor_rounds_towards_negative_infinity() {
        let floor = |v| NativeFloor.call(&[LoxValue::Number(v)]).map(|v| v.to_string());
        assert_eq!(floor(3.7).ok().as_deref(), Some("3"));
        assert_eq!(floor(-3.5).ok().as_deref(), Some("-4"));
        assert_eq!(floor(2.0).ok().as_deref(), Some("2"));
    }

    #[test]
    fn floor_rejects_non_numbers() {
        let result = NativeFloor.call(&[LoxValue::String("1".into())]);
        assert!(matches!(result, Err(RuntimeErrorKind::NonNumericArgument(_))));
    }

    #[test]
    fn substring_takes_half_open_range() {
        let result = substring("hello", 1.0, 3.0).map(|v| v.to_string());
        assert_eq!(result.ok().as_deref(), Some("el"));
        let result = substring("hello", 0.0, 5.0).map(|v| v.to_string());
        assert_eq!(result.ok().as_deref(), Some("hello"));
    }

    #[test]
    fn substring_with_empty_range_is_empty() {
        let result = substring("hello", 3.0, 3.0).map(|v| v.to_string());
        assert_eq!(result.ok().as_deref(), Some(""));
        let result = substring("hello", 4.0, 2.0).map(|v| v.to_string());
        assert_eq!(result.ok().as_deref(), Some(""));
    }

    #[test]
    fn substring_counts_characters_not_bytes() {
        let result = substring("héllo", 1.0, 2.0).map(|v| v.to_string());
        assert_eq!(result.ok().as_deref(), Some("é"));
    }

    #[test]
    fn substring_rejects_out_of_range_indices() {
        assert!(matches!(
            substring("hello", 0.0, 6.0),
            Err(RuntimeErrorKind::SubstringOutOfRange { length: 5, .. })
        ));
        assert!(matches!(
            substring("hello", -1.0, 2.0),
            Err(RuntimeErrorKind::SubstringOutOfRange { .. })
        ));
        assert!(matches!(
            substring("hello", f64::NAN, 2.0),
            Err(RuntimeErrorKind::SubstringOutOfRange { .. })
        ));
    }

    #[test]
    fn substring_rejects_wrong_types() {
        let result = NativeSubstring.call(&[
            LoxValue::Number(1.0),
            LoxValue::Number(0.0),
            LoxValue::Number(1.0),
        ]);
        assert!(matches!(result, Err(RuntimeErrorKind::InvalidSubstringArguments)));
    }
}
