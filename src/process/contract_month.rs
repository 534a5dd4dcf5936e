use chrono::NaiveDate;

/// Day of month used to approximate a contract's maturity date.
pub const MATURITY_DAY: u32 = 15;

/// Decoded contract month code such as `F25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractMonth {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl ContractMonth {
    const UNKNOWN: ContractMonth = ContractMonth {
        month: None,
        year: None,
    };

    /// Approximate maturity: the 15th of the decoded month.
    pub fn maturity_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, MATURITY_DAY)
    }

    /// Calendar days from `as_of` to maturity, negative once expired.
    pub fn days_to_maturity(&self, as_of: NaiveDate) -> Option<i64> {
        self.maturity_date()
            .map(|maturity| maturity.signed_duration_since(as_of).num_days())
    }
}

/// Exchange month letter → calendar month.
pub fn month_from_letter(letter: char) -> Option<u32> {
    let month = match letter {
        'F' => 1,
        'G' => 2,
        'H' => 3,
        'J' => 4,
        'K' => 5,
        'M' => 6,
        'N' => 7,
        'Q' => 8,
        'U' => 9,
        'V' => 10,
        'X' => 11,
        'Z' => 12,
        _ => return None,
    };
    Some(month)
}

/// Decode `<letter><2-digit year>`.
///
/// Years are always `2000 + yy`, so `Z99` is December 2099. A code of any other
/// shape decodes to neither month nor year; a well-shaped code with an unknown
/// letter still yields its year.
pub fn decode(code: &str) -> ContractMonth {
    let mut chars = code.trim().chars();
    let (Some(letter), Some(d1), Some(d2), None) =
        (chars.next(), chars.next(), chars.next(), chars.next())
    else {
        return ContractMonth::UNKNOWN;
    };
    if !letter.is_ascii_alphabetic() {
        return ContractMonth::UNKNOWN;
    }
    let (Some(tens), Some(ones)) = (d1.to_digit(10), d2.to_digit(10)) else {
        return ContractMonth::UNKNOWN;
    };

    ContractMonth {
        month: month_from_letter(letter),
        year: Some(2000 + (tens * 10 + ones) as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(code: &str) -> (Option<u32>, Option<i32>) {
        let cm = decode(code);
        (cm.month, cm.year)
    }

    #[test]
    fn decodes_known_codes() {
        assert_eq!(pair("F25"), (Some(1), Some(2025)));
        assert_eq!(pair("Z99"), (Some(12), Some(2099)));
        assert_eq!(pair("N00"), (Some(7), Some(2000)));
        assert_eq!(pair(" J27 "), (Some(4), Some(2027)));
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!(pair("AB"), (None, None));
        assert_eq!(pair(""), (None, None));
        assert_eq!(pair("F2025"), (None, None));
        assert_eq!(pair("F2"), (None, None));
        assert_eq!(pair("1F5"), (None, None));
        assert_eq!(pair("F٣5"), (None, None));
    }

    #[test]
    fn unknown_letter_keeps_year() {
        assert_eq!(pair("A25"), (None, Some(2025)));
        assert_eq!(decode("A25").maturity_date(), None);
    }

    #[test]
    fn decode_is_pure() {
        for code in ["F25", "Z99", "AB", "", "Q3x"] {
            assert_eq!(decode(code), decode(code));
        }
    }

    #[test]
    fn maturity_on_the_fifteenth() {
        let cm = decode("H26");
        assert_eq!(cm.maturity_date(), NaiveDate::from_ymd_opt(2026, 3, 15));
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(cm.days_to_maturity(as_of), Some(14));
        let after = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        assert_eq!(cm.days_to_maturity(after), Some(-5));
    }
}
