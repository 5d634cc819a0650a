use serde::{Deserialize, Serialize};

/// One WPM sample, taken once per elapsed second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpmSample {
    pub elapsed_secs: u32,
    pub wpm: u32,
}

impl WpmSample {
    pub fn new(elapsed_secs: u32, wpm: u32) -> Self {
        Self { elapsed_secs, wpm }
    }
}

/// Highest WPM in a series, 0 when empty
pub fn peak_wpm(series: &[WpmSample]) -> u32 {
    series.iter().map(|p| p.wpm).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_of_empty_series_is_zero() {
        assert_eq!(peak_wpm(&[]), 0);
    }

    #[test]
    fn peak_picks_the_fastest_second() {
        let series = [WpmSample::new(1, 30), WpmSample::new(2, 48), WpmSample::new(3, 41)];
        assert_eq!(peak_wpm(&series), 48);
    }
}
