//! Raw field value to typed cell value conversion.

use finmerge_sheet::{CellValue, NumberFormat};

use crate::dataset::RawValue;

/// A typed cell value and the number format it should be shown with.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: CellValue,
    pub number_format: Option<NumberFormat>,
}

impl Coerced {
    fn plain(value: CellValue) -> Self {
        Coerced {
            value,
            number_format: None,
        }
    }

    fn numeric(value: CellValue) -> Self {
        Coerced {
            value,
            number_format: Some(NumberFormat::Fixed2),
        }
    }
}

/// Convert one raw field into a cell value.
///
/// Rules, in order: empty/NaN gives an empty cell; accounting negatives such
/// as `(1,234.5)` and other numeric text (thousands separators stripped)
/// become numbers with a two-decimal format; native numbers keep their value
/// with the same format; dates get an ISO date format; anything else is
/// stored verbatim as text.
pub fn coerce(raw: &RawValue) -> Coerced {
    if raw.is_empty() {
        return Coerced::plain(CellValue::Null);
    }

    match raw {
        RawValue::Text(text) => match parse_numeric_text(text) {
            Some(number) => Coerced::numeric(number),
            None => Coerced::plain(CellValue::String(text.clone())),
        },
        RawValue::Number(n) if n.is_finite() => Coerced::numeric(CellValue::Float(*n)),
        RawValue::Number(n) => Coerced::plain(CellValue::String(n.to_string())),
        RawValue::Date(d) => Coerced {
            value: CellValue::Date(*d),
            number_format: Some(NumberFormat::IsoDate),
        },
        RawValue::Empty => Coerced::plain(CellValue::Null),
    }
}

/// Parse text such as `1,234`, `-5.5` or `(1,234.50)`.
///
/// Text containing a decimal point is read as a float, otherwise as an
/// integer; integers too large for `i64` fall back to a float.
fn parse_numeric_text(text: &str) -> Option<CellValue> {
    let cleaned = text.replace(',', "");
    let mut digits = cleaned.trim();

    let negative = digits.len() >= 2 && digits.starts_with('(') && digits.ends_with(')');
    if negative {
        digits = digits[1..digits.len() - 1].trim();
    }

    if digits.contains('.') {
        let value: f64 = digits.parse().ok().filter(|f: &f64| f.is_finite())?;
        return Some(CellValue::Float(if negative { -value } else { value }));
    }

    match digits.parse::<i64>() {
        Ok(value) if negative => Some(
            value
                .checked_neg()
                .map_or(CellValue::Float(-(value as f64)), CellValue::Int),
        ),
        Ok(value) => Some(CellValue::Int(value)),
        Err(_) => {
            let unsigned = digits.strip_prefix(['+', '-']).unwrap_or(digits);
            if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let value: f64 = digits.parse().ok()?;
            Some(CellValue::Float(if negative { -value } else { value }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_accounting_negative() {
        let coerced = coerce(&text("(1,234.50)"));
        assert_eq!(coerced.value, CellValue::Float(-1234.5));
        assert_eq!(coerced.number_format, Some(NumberFormat::Fixed2));

        assert_eq!(coerce(&text("(300)")).value, CellValue::Int(-300));
        assert_eq!(coerce(&text(" ( 42 ) ")).value, CellValue::Int(-42));
    }

    #[test]
    fn test_blank_inputs() {
        for raw in [text(""), text("   \t"), RawValue::Empty, RawValue::Number(f64::NAN)] {
            let coerced = coerce(&raw);
            assert_eq!(coerced.value, CellValue::Null);
            assert_eq!(coerced.number_format, None);
        }
    }

    #[test]
    fn test_numeric_text() {
        assert_eq!(coerce(&text("1,200")).value, CellValue::Int(1200));
        assert_eq!(coerce(&text(" 3.25 ")).value, CellValue::Float(3.25));
        assert_eq!(coerce(&text("-7")).value, CellValue::Int(-7));
        let big = "123456789012345678901";
        assert_eq!(
            coerce(&text(big)).value,
            CellValue::Float(big.parse::<f64>().unwrap())
        );
    }

    #[test]
    fn test_text_kept_verbatim() {
        for s in ["N/A", " Revenue ", "(", "1e5", "inf", "12 34", "-"] {
            let coerced = coerce(&text(s));
            assert_eq!(coerced.value, CellValue::String(s.to_string()), "input {s:?}");
            assert_eq!(coerced.number_format, None);
        }
    }

    #[test]
    fn test_native_values() {
        let coerced = coerce(&RawValue::Number(12.5));
        assert_eq!(coerced.value, CellValue::Float(12.5));
        assert_eq!(coerced.number_format, Some(NumberFormat::Fixed2));

        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let coerced = coerce(&RawValue::Date(date));
        assert_eq!(coerced.value, CellValue::Date(date));
        assert_eq!(coerced.number_format, Some(NumberFormat::IsoDate));

        let coerced = coerce(&RawValue::Number(f64::INFINITY));
        assert_eq!(coerced.value, CellValue::String("inf".to_string()));
    }
}
