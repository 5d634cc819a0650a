use rand::Rng;

/// Numeric token shapes used by numbers mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Plain,
    Large,
    Decimal,
    Percentage,
    Date,
    ClockTime,
    Currency,
    Grouped,
}

impl NumberFormat {
    pub const ALL: [NumberFormat; 8] = [
        NumberFormat::Plain,
        NumberFormat::Large,
        NumberFormat::Decimal,
        NumberFormat::Percentage,
        NumberFormat::Date,
        NumberFormat::ClockTime,
        NumberFormat::Currency,
        NumberFormat::Grouped,
    ];

    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Instantiate this format with fresh random values
    pub fn render<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        match self {
            NumberFormat::Plain => rng.gen_range(0..100u32).to_string(),
            NumberFormat::Large => rng.gen_range(100..100_000u32).to_string(),
            NumberFormat::Decimal => {
                format!("{}.{:02}", rng.gen_range(0..1000u32), rng.gen_range(0..100u32))
            }
            NumberFormat::Percentage => format!("{}%", rng.gen_range(0..=100u32)),
            NumberFormat::Date => format!(
                "{:02}/{:02}/{}",
                rng.gen_range(1..=12u32),
                rng.gen_range(1..=28u32),
                rng.gen_range(1950..=2030u32)
            ),
            NumberFormat::ClockTime => {
                format!("{}:{:02}", rng.gen_range(1..=12u32), rng.gen_range(0..60u32))
            }
            NumberFormat::Currency => {
                format!("${}.{:02}", rng.gen_range(1..1000u32), rng.gen_range(0..100u32))
            }
            NumberFormat::Grouped => group_thousands(rng.gen_range(1_000..10_000_000u32)),
        }
    }
}

fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn random_number_tokens<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count).map(|_| NumberFormat::pick(rng).render(rng)).collect()
}
