//! Within-compartment selection recurrences.
//!
//! Two formulations are provided. The logistic form is the classic two-compartment
//! recurrence with a single selection coefficient against the resistant strain. The
//! fitness-ratio form reweights the resistant fraction by per-strain fitnesses and then
//! mixes in bacteria from the other compartment.

/// Logistic-selection update of a resistant fraction.
///
/// `x` is the current fraction, `y` the fraction of the bacteria mixed in at rate `m`,
/// and `s` the selection coefficient against the resistant strain.
/// Callers must ensure `s * x < 1`.
pub fn logistic_update(x: f64, y: f64, m: f64, s: f64) -> f64 {
    x + m * (y - x) - s * x * (1.0 - x) / (1.0 - s * x)
}

/// New fraction of strain A when strain A has fitness `wa` and strain B has fitness `wb`.
///
/// If neither strain survives the fraction is returned unchanged.
pub fn select_fraction(x: f64, wa: f64, wb: f64) -> f64 {
    let a = wa * x;
    let total = a + wb * (1.0 - x);
    if total == 0.0 {
        return x;
    }
    a / total
}

/// Fitness-ratio update: local selection followed by mixing in `y` at rate `m`.
pub fn ratio_update(x: f64, y: f64, m: f64, wa: f64, wb: f64) -> f64 {
    m * y + (1.0 - m) * select_fraction(x, wa, wb)
}
