/// Within ±20% of the global average.
pub const TYPICAL: u8 = 50;
/// More than 20% below the global average.
pub const CHEAP: u8 = 100;
/// More than 20% above the global average, or unknown.
pub const EXPENSIVE: u8 = 0;

const BAND: f64 = 0.2;

/// Scores a bucket's average price against the global average.
///
/// Above-average buckets outside the band score 0 while below-average ones
/// score 100; the two sides are deliberately not mirrored.
pub fn score(local_avg: Option<f64>, global_avg: Option<f64>) -> u8 {
    let (Some(local), Some(global)) = (local_avg, global_avg) else {
        return EXPENSIVE;
    };
    if global * (1.0 - BAND) <= local && local <= global * (1.0 + BAND) {
        TYPICAL
    } else if local > global {
        EXPENSIVE
    } else {
        CHEAP
    }
}
