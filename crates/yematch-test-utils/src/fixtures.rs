//! Legacy report text builders
//!
//! Each builder renders rows at the exact columns the legacy writer uses and
//! prints a trailer consistent with the rows, unless told to corrupt it.

/// Fixed-width line assembled by column
#[derive(Debug, Clone)]
pub struct Line(Vec<u8>);

impl Line {
    pub fn new(len: usize) -> Self {
        Self(vec![b' '; len])
    }

    /// Write `text` left-aligned at `start`, cut to `width`
    pub fn left(mut self, start: usize, width: usize, text: &str) -> Self {
        for (i, b) in text.bytes().take(width).enumerate() {
            self.put(start + i, b);
        }
        self
    }

    /// Write `text` right-aligned inside `start..start + width`
    pub fn right(mut self, start: usize, width: usize, text: &str) -> Self {
        let bytes = text.as_bytes();
        let skip = bytes.len().saturating_sub(width);
        let offset = start + width - (bytes.len() - skip);
        for (i, b) in bytes[skip..].iter().enumerate() {
            self.put(offset + i, *b);
        }
        self
    }

    fn put(&mut self, at: usize, b: u8) {
        if at >= self.0.len() {
            self.0.resize(at + 1, b' ');
        }
        self.0[at] = b;
    }

    pub fn render(&self) -> String {
        String::from_utf8_lossy(&self.0).trim_end().to_string()
    }
}

/// `12,345.67`, with a trailing `-` when negative
pub fn money(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{grouped}.{:02}{sign}", abs % 100)
}

/// `1040.75` from hundredths
pub fn hours(hundredths: i64) -> String {
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

fn ssn_digits(badge: i64) -> String {
    format!("{:04}", badge.rem_euclid(10_000))
}

// ---------------------------------------------------------------------------
// PAY426
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Pay426Row {
    badge: i64,
    name: String,
    store: i64,
    wages: i64,
    hours: i64,
    points: i64,
    age: i64,
    inactive: bool,
    new_hire: bool,
    under_21: bool,
}

impl Pay426Row {
    pub fn new(badge: i64, name: &str, store: i64) -> Self {
        Self {
            badge,
            name: name.to_string(),
            store,
            wages: 0,
            hours: 0,
            points: 0,
            age: 45,
            inactive: false,
            new_hire: false,
            under_21: false,
        }
    }

    pub fn wages(mut self, cents: i64) -> Self {
        self.wages = cents;
        self
    }

    pub fn hours(mut self, hundredths: i64) -> Self {
        self.hours = hundredths;
        self
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = age;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.inactive = true;
        self
    }

    pub fn new_hire(mut self) -> Self {
        self.new_hire = true;
        self
    }

    pub fn under_21(mut self) -> Self {
        self.under_21 = true;
        self
    }

    fn marker(&self) -> &'static str {
        if self.new_hire {
            "(NEW)"
        } else if self.under_21 {
            "(<21)"
        } else {
            ""
        }
    }

    pub fn render(&self) -> String {
        Line::new(120)
            .left(0, 3, if self.inactive { "I" } else { "" })
            .right(3, 7, &self.badge.to_string())
            .left(13, 28, &self.name)
            .right(41, 6, &self.store.to_string())
            .left(47, 1, "H")
            .left(52, 8, "03/15/79")
            .right(60, 7, &self.age.to_string())
            .left(67, 12, &format!("000 00 {}", ssn_digits(self.badge)))
            .right(80, 14, &money(self.wages))
            .right(101, 8, &hours(self.hours))
            .right(111, 4, &self.points.to_string())
            .left(115, 5, self.marker())
            .render()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pay426Fixture {
    rows: Vec<Pay426Row>,
    wage_adjustment: i64,
    headcounts: Option<[usize; 4]>,
}

impl Pay426Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Pay426Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Add `cents` to the printed wage total only
    pub fn wage_total_adjustment(mut self, cents: i64) -> Self {
        self.wage_adjustment = cents;
        self
    }

    /// Override the printed all/new/under-21/in-plan counts
    pub fn headcounts(mut self, counts: [usize; 4]) -> Self {
        self.headcounts = Some(counts);
        self
    }

    pub fn render(&self) -> String {
        let counted: Vec<&Pay426Row> = self.rows.iter().filter(|r| !r.under_21).collect();
        let wages: i64 = counted.iter().map(|r| r.wages).sum::<i64>() + self.wage_adjustment;
        let hours: i64 = counted.iter().map(|r| r.hours / 100).sum();
        let points: i64 = counted.iter().map(|r| r.points).sum();
        let counts = self.headcounts.unwrap_or_else(|| {
            [
                self.rows.len(),
                self.rows.iter().filter(|r| r.new_hire).count(),
                self.rows.iter().filter(|r| r.under_21).count(),
                self.rows.iter().filter(|r| !r.new_hire && !r.under_21).count(),
            ]
        });

        let mut out = String::from("DJDE JDE=PAY426,JDL=PAYROL\n");
        out.push_str("REPORT PAY426            PROFIT SHARING YEAR END REPORT          PAGE    1\n");
        out.push_str("   BADGE   EMPLOYEE NAME                  STORE TYPE DOB       AGE  SSN             WAGES              HOURS  PTS\n\n");
        for row in &self.rows {
            out.push_str(&row.render());
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format!("                    -SECTION TOTAL-  {} {} {}\n", money(wages), hours, points));
        out.push('\n');
        out.push_str("EMPLOYEE TOTALS          ALL-EMP   NEW-EMP   EMP<21   IN-PLAN\n");
        out.push_str(&format!(
            "                         {:>7}   {:>7}   {:>6}   {:>7}\n",
            counts[0], counts[1], counts[2], counts[3]
        ));
        out
    }
}

// ---------------------------------------------------------------------------
// PAY426N
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Pay426NRow {
    badge: i64,
    name: String,
    store: i64,
    status: char,
    wages: i64,
    hours: i64,
    points: i64,
    balance: i64,
    years: Option<i64>,
    term_date: Option<String>,
    dob: String,
    age: i64,
    new_hire: bool,
    under_21: bool,
}

impl Pay426NRow {
    pub fn new(badge: i64, name: &str, store: i64) -> Self {
        Self {
            badge,
            name: name.to_string(),
            store,
            status: ' ',
            wages: 0,
            hours: 0,
            points: 0,
            balance: 0,
            years: None,
            term_date: None,
            dob: "03/15/79".to_string(),
            age: 45,
            new_hire: false,
            under_21: false,
        }
    }

    pub fn wages(mut self, cents: i64) -> Self {
        self.wages = cents;
        self
    }

    pub fn hours(mut self, hundredths: i64) -> Self {
        self.hours = hundredths;
        self
    }

    pub fn points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn balance(mut self, cents: i64) -> Self {
        self.balance = cents;
        self
    }

    pub fn years(mut self, years: i64) -> Self {
        self.years = Some(years);
        self
    }

    pub fn term_date(mut self, mm_dd_yy: &str) -> Self {
        self.term_date = Some(mm_dd_yy.to_string());
        self
    }

    pub fn dob(mut self, mm_dd_yy: &str) -> Self {
        self.dob = mm_dd_yy.to_string();
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = age;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.status = 'I';
        self
    }

    pub fn new_hire(mut self) -> Self {
        self.new_hire = true;
        self
    }

    pub fn under_21(mut self) -> Self {
        self.under_21 = true;
        self
    }

    fn marker(&self) -> &'static str {
        if self.new_hire {
            "(NEW)"
        } else if self.under_21 {
            "(<21)"
        } else {
            "(   )"
        }
    }

    pub fn render(&self) -> String {
        Line::new(135)
            .left(0, 1, &self.status.to_string())
            .right(3, 7, &self.badge.to_string())
            .left(11, 25, &self.name)
            .right(36, 4, &self.store.to_string())
            .left(40, 1, "H")
            .left(42, 9, &self.dob)
            .left(51, 5, &format!("({})", self.age))
            .left(56, 12, &format!("000-00-{}", ssn_digits(self.badge)))
            .right(72, 12, &money(self.wages))
            .right(84, 7, &hours(self.hours))
            .right(92, 6, &self.points.to_string())
            .left(98, 6, self.marker())
            .left(104, 8, self.term_date.as_deref().unwrap_or(""))
            .right(118, 14, &money(self.balance))
            .right(132, 3, &self.years.map(|y| y.to_string()).unwrap_or_default())
            .render()
    }
}

#[derive(Debug, Clone)]
pub struct Pay426NFixture {
    trailer: &'static str,
    rows: Vec<Pay426NRow>,
    wage_adjustment: i64,
}

impl Pay426NFixture {
    pub fn employees() -> Self {
        Self {
            trailer: "TOTAL EMPS:",
            rows: Vec::new(),
            wage_adjustment: 0,
        }
    }

    pub fn beneficiaries() -> Self {
        Self {
            trailer: "TOTAL NON-EMP BENEFICIAIRIES:",
            rows: Vec::new(),
            wage_adjustment: 0,
        }
    }

    pub fn row(mut self, row: Pay426NRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Add `cents` to the printed wage total only
    pub fn wage_total_adjustment(mut self, cents: i64) -> Self {
        self.wage_adjustment = cents;
        self
    }

    pub fn render(&self) -> String {
        let wages: i64 = self.rows.iter().map(|r| r.wages).sum::<i64>() + self.wage_adjustment;
        let balance: i64 = self.rows.iter().map(|r| r.balance).sum();

        let mut out = String::from("PAY426N              PROFIT SHARING REPORT BY CRITERIA           PAGE    1\n");
        out.push_str("S  BADGE NAME                     STR T DOB      AGE  SSN                 WAGES      HOURS  POINTS\n\n");
        for row in &self.rows {
            out.push_str(&row.render());
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format!(
            "{}     {}     {}     {}\n",
            self.trailer,
            self.rows.len(),
            money(wages),
            money(balance)
        ));
        out
    }
}

// ---------------------------------------------------------------------------
// QPAY066
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QPay066Row {
    badge_or_psn: String,
    name: String,
    beginning: i64,
    beneficiary: i64,
    distribution: i64,
    forfeit: i64,
    ending: i64,
    vested: i64,
    term: String,
    hours: i64,
    percent: i64,
    age: i64,
}

impl QPay066Row {
    pub fn new(badge_or_psn: &str, name: &str) -> Self {
        Self {
            badge_or_psn: badge_or_psn.to_string(),
            name: name.to_string(),
            beginning: 0,
            beneficiary: 0,
            distribution: 0,
            forfeit: 0,
            ending: 0,
            vested: 0,
            term: String::new(),
            hours: 0,
            percent: 100,
            age: 45,
        }
    }

    pub fn beginning(mut self, cents: i64) -> Self {
        self.beginning = cents;
        self
    }

    pub fn beneficiary(mut self, cents: i64) -> Self {
        self.beneficiary = cents;
        self
    }

    pub fn distribution(mut self, cents: i64) -> Self {
        self.distribution = cents;
        self
    }

    pub fn forfeit(mut self, cents: i64) -> Self {
        self.forfeit = cents;
        self
    }

    pub fn ending(mut self, cents: i64) -> Self {
        self.ending = cents;
        self
    }

    pub fn vested(mut self, cents: i64) -> Self {
        self.vested = cents;
        self
    }

    /// Termination date as `YYMMDD`
    pub fn term(mut self, yymmdd: &str) -> Self {
        self.term = yymmdd.to_string();
        self
    }

    pub fn hours(mut self, hundredths: i64) -> Self {
        self.hours = hundredths;
        self
    }

    pub fn percent(mut self, percent: i64) -> Self {
        self.percent = percent;
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = age;
        self
    }

    pub fn render(&self) -> String {
        Line::new(134)
            .right(0, 11, &self.badge_or_psn)
            .left(12, 19, &self.name)
            .right(31, 12, &money(self.beginning))
            .right(44, 12, &money(self.beneficiary))
            .right(58, 11, &money(self.distribution))
            .right(70, 12, &money(self.forfeit))
            .right(83, 12, &money(self.ending))
            .right(96, 12, &money(self.vested))
            .left(110, 6, &self.term)
            .right(118, 6, &hours(self.hours))
            .left(125, 9, &format!("{} {} 4", self.percent, self.age))
            .render()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QPay066Fixture {
    rows: Vec<QPay066Row>,
    forfeit_adjustment: i64,
}

impl QPay066Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: QPay066Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Add `cents` to the printed forfeiture total only
    pub fn forfeit_total_adjustment(mut self, cents: i64) -> Self {
        self.forfeit_adjustment = cents;
        self
    }

    pub fn render(&self) -> String {
        let sum = |f: fn(&QPay066Row) -> i64| self.rows.iter().map(f).sum::<i64>();

        let mut out = String::from("QPAY066          TERMINATED EMPLOYEE PROFIT SHARING BREAKDOWN          PAGE    1\n");
        out.push_str("BADGE/PSN   NAME                 BEGINNING     BENEFICIARY   DISTRIBUTION   FORFEIT       ENDING       VESTED    TERM\n\n");
        for row in &self.rows {
            out.push_str(&row.render());
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format!("   AMOUNT IN PROFIT SHARING      {}\n", money(sum(|r| r.ending))));
        out.push_str(&format!("   VESTED AMOUNT                 {}\n", money(sum(|r| r.vested))));
        out.push_str(&format!(
            "   TOTAL FORFEITURES             {}\n",
            money(sum(|r| r.forfeit) + self.forfeit_adjustment)
        ));
        out.push_str(&format!("   TOTAL BENEFICIARY ALLOCTIONS  {}\n", money(sum(|r| r.beneficiary))));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_and_signs() {
        assert_eq!(money(0), "0.00");
        assert_eq!(money(1_234_56), "1,234.56");
        assert_eq!(money(-6_376_74), "6,376.74-");
        assert_eq!(money(1_000_000_00), "1,000,000.00");
    }

    #[test]
    fn line_places_columns() {
        let line = Line::new(10).right(0, 4, "12").left(5, 3, "abcdef").render();
        assert_eq!(line, "  12 abc");
    }
}
