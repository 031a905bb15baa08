//! BOPP tape pricing engine
//!
//! Pure computation: physical tape parameters plus a rate snapshot in,
//! the full manufacturing cost sheet out. No I/O, no shared state;
//! identical input always yields bit-identical output.
//!
//! Validation runs before any arithmetic and reports every failing
//! field at once, so the operator sees one combined message instead of
//! fixing problems one at a time. The formula chain itself never
//! rounds; presentation formats to two decimals.

use plastopack_common::db::models::RateSnapshot;
use serde::{Deserialize, Serialize};

/// Standard jumbo roll width in mm.
const JUMBO_WIDTH_MM: f64 = 1315.0;
/// Wide jumbo roll width in mm.
const WIDE_JUMBO_WIDTH_MM: f64 = 1610.0;
/// Rolls of 48 mm tape packed per box.
const PIECES_PER_BOX: f64 = 72.0;
/// Roll length (meters) the base cost is normalized against.
const STANDARD_ROLL_LENGTH_M: f64 = 65.0;

/// Rate keys the engine always needs, independent of the print/paste
/// selection.
const REQUIRED_RATE_KEYS: [&str; 6] = [
    "ADHESIVE_RATE",
    "BOPP_FILM_RATE",
    "PACKING_COST",
    "COATING_EXP",
    "PROFIT",
    "ADHESIVE_LESS_RATE",
];

/// Physical and commercial parameters for one costing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcInput {
    /// BOPP film thickness in microns
    pub film_micron: f64,
    /// Adhesive coat thickness in microns
    pub adhesive_micron: f64,
    /// Tape length per roll in meters
    pub tape_length_m: f64,
    /// Reference length for the coreless price table
    #[serde(default = "default_coreless_length")]
    pub coreless_length_m: f64,
    /// Print-type rate key (e.g. SINGLE_COLOUR_PRINTED)
    pub print_type: String,
    /// Paste-type rate key (e.g. MILKY_WHITE)
    pub paste_type: String,
}

fn default_coreless_length() -> f64 {
    1000.0
}

/// One cell of the cost sheet. Cells the sheet reserves but the
/// formula set never fills stay `NotApplicable`, so a consumer can
/// render the fixed table layout without mistaking an empty cell for a
/// computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Figure {
    Computed(f64),
    NotApplicable,
}

impl Figure {
    pub fn value(self) -> Option<f64> {
        match self {
            Figure::Computed(v) => Some(v),
            Figure::NotApplicable => None,
        }
    }

    /// Display form: two decimals, or "-" for an empty cell.
    pub fn display(self) -> String {
        match self {
            Figure::Computed(v) if v.is_finite() => format!("{v:.2}"),
            _ => "-".to_string(),
        }
    }
}

/// The complete manufacturing cost sheet for one costing run.
///
/// Field order follows the derivation chain; later figures depend on
/// earlier ones (the per-width rates all scale off `box_rate`, the
/// coreless table off `coreless_rate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSheet {
    /// Finished tape thickness in microns
    pub microns: Figure,
    /// Rate for a 72-roll box of 48 mm tape at the requested length
    pub box_rate: Figure,
    /// Standard jumbo width (mm)
    pub jumbo_width_mm: Figure,
    /// Per-kg jumbo rate (base cost with 5% margin)
    pub jumbo_rate: Figure,
    /// 288 mm slit base column (reserved, never computed)
    pub rate_288mm_base: Figure,
    /// 288 mm slit rate
    pub rate_288mm: Figure,
    /// Weight of a standard-width jumbo roll
    pub jumbo_weight_1315: Figure,
    /// Weight of a wide jumbo roll
    pub jumbo_weight_1610: Figure,
    /// Short-coil weight figure for the standard width
    pub coil_weight: Figure,
    /// Wide-width coil column (reserved, never computed)
    pub coil_weight_1610: Figure,
    /// Weight of one roll at the requested length
    pub scale_weight: Figure,
    /// Weight of a packed 12-roll carton
    pub box_weight: Figure,
    /// Rate per square meter of coated film
    pub sq_meter_rate: Figure,
    /// Per-piece weight of a 48 mm roll
    pub piece_weight_48mm: Figure,
    /// Per-piece rates by slit width
    pub rate_12mm: Figure,
    pub rate_24mm: Figure,
    pub rate_36mm: Figure,
    pub rate_48mm: Figure,
    pub rate_60mm: Figure,
    pub rate_72mm: Figure,
    pub rate_96mm: Figure,
    /// Coreless price table (per `coreless_length_m` meters)
    pub coreless_144mm: Figure,
    pub coreless_48mm: Figure,
    pub coreless_72mm: Figure,
    pub coreless_36mm: Figure,
    pub coreless_60mm: Figure,
    pub coreless_18mm: Figure,
    pub coreless_20mm: Figure,
    /// Width rows the sheet reserves for sizes without a formula
    pub coreless_spare_widths: [Figure; 5],
    /// Rolls of 48 mm tape per box
    pub pieces_per_box: Figure,
    /// Echo of the requested tape length
    pub tape_length_m: Figure,
    /// Echo of the coreless reference length
    pub coreless_length_m: Figure,
    /// Coreless reference length in standard-roll units
    pub coreless_length_units: Figure,
    /// Fixed length adjustment for the coreless conversion
    pub coreless_offset: Figure,
    /// Length units net of the fixed adjustment
    pub coreless_net_units: Figure,
    /// Credit for the omitted core
    pub core_credit: Figure,
    /// Adjustment cells the sheet reserves without a formula
    pub coreless_spare_adjustments: [Figure; 4],
    /// Rate for a 72-roll box at the standard 65 m length
    pub standard_box_rate: Figure,
    /// Coreless gross price before deductions
    pub coreless_gross: Figure,
    /// Net deduction applied to the coreless gross price
    pub coreless_deduction: Figure,
    /// Coreless per-piece rate (48 mm base)
    pub coreless_rate: Figure,
    /// Duplicate 144 mm row printed at the foot of the sheet
    pub coreless_144mm_alt: Figure,
}

/// All the ways one costing run can be invalid, gathered up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub problems: Vec<String>,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Missing or invalid inputs/rates: {}.",
            self.problems.join(", ")
        )
    }
}

impl std::error::Error for ValidationFailure {}

/// Compute the full cost sheet, or report every validation problem.
pub fn compute(input: &CalcInput, rates: &RateSnapshot) -> Result<CostSheet, ValidationFailure> {
    let problems = validate(input, rates);
    if !problems.is_empty() {
        return Err(ValidationFailure { problems });
    }

    let film = input.film_micron;
    let adhesive = input.adhesive_micron;
    let length = input.tape_length_m;
    let coreless_len = input.coreless_length_m;

    let print_rate = rates[&input.print_type];
    let paste_rate = rates[&input.paste_type];
    let adhesive_rate = rates["ADHESIVE_RATE"];
    let raw_film_rate = rates["BOPP_FILM_RATE"];
    let packing_cost = rates["PACKING_COST"];
    let coating_exp = rates["COATING_EXP"];
    let profit_fraction = rates["PROFIT"] / 100.0;
    let adhesive_less_rate = rates["ADHESIVE_LESS_RATE"];

    // Per-unit material weights. The release coat adds one micron on
    // top of film + adhesive; the adhesive dry weight falls out of the
    // coated-film weight at 94% solids over a 225 mm reference width.
    let y = adhesive + 1.0;
    let x = film + y;
    let film_wt = 0.20925 * film;
    let adhesive_wt = (((x * 0.94 * 225.0) / 1000.0) - film_wt) / 53.5 * 100.0;
    let paste_wt = adhesive_wt * 0.06;

    // Base cost per standard roll unit: film + adhesive + print +
    // coating + paste, net of the adhesive-less credit.
    let base_cost = (film_wt * raw_film_rate)
        + (adhesive_wt * adhesive_rate)
        + print_rate
        + coating_exp
        - (adhesive_wt * 0.06 * adhesive_less_rate)
        + (paste_wt * paste_rate);

    let box_rate = ((((base_cost / STANDARD_ROLL_LENGTH_M) * length + packing_cost)
        / PIECES_PER_BOX)
        * (1.0 + profit_fraction)
        * PIECES_PER_BOX)
        + 20.0;
    let standard_box_rate = ((((base_cost / STANDARD_ROLL_LENGTH_M) * STANDARD_ROLL_LENGTH_M
        + packing_cost)
        / PIECES_PER_BOX)
        * (1.0 + profit_fraction)
        * PIECES_PER_BOX)
        + 20.0;

    let microns = x - 1.0;
    let jumbo_rate = (base_cost / ((adhesive_wt * 0.54) + film_wt)) * 1.05;
    let rate_288mm = jumbo_rate + 5.0;

    // Jumbo-roll weight figures from fixed physical constants; no
    // rates involved.
    let jumbo_weight_1315 = x * 4.873;
    let jumbo_weight_1610 = jumbo_weight_1315 / JUMBO_WIDTH_MM * WIDE_JUMBO_WIDTH_MM;
    let coil_weight = x * 0.2668;

    let scale_weight = (x * 0.00027115 * length) + (length / 6500.0) + 0.16;
    let box_weight = scale_weight * 12.0 + 0.75;
    let sq_meter_rate = (jumbo_weight_1315 * jumbo_rate) / 5260.0;
    let piece_weight_48mm = scale_weight / 6.0;

    // Per-width rates are all scaled off the single 72-roll box rate,
    // not recomputed per width.
    let rate_24mm = box_rate / 144.0;
    let rate_12mm = rate_24mm / 2.0;
    let rate_36mm = box_rate / 96.0;
    let rate_48mm = box_rate / PIECES_PER_BOX;
    let rate_72mm = rate_48mm * 1.5;
    let rate_60mm = box_rate / 72.0 / 48.0 * 60.0;
    let rate_96mm = rate_48mm * 2.0;

    // Coreless table: the standard-length box rate rescaled to the
    // reference length, less a length-unit deduction and core credit.
    let coreless_length_units = coreless_len / STANDARD_ROLL_LENGTH_M;
    let coreless_offset = -2.38;
    let coreless_net_units = coreless_length_units + coreless_offset;
    let core_credit = 20.0 / 10.5;

    let coreless_gross =
        standard_box_rate / PIECES_PER_BOX / STANDARD_ROLL_LENGTH_M * coreless_len;
    let coreless_deduction = coreless_net_units - core_credit;
    let coreless_rate = coreless_gross - coreless_deduction;

    let coreless_144mm = coreless_rate * 3.0;
    let coreless_48mm = coreless_rate;
    let coreless_18mm = coreless_rate * 0.375;
    let coreless_36mm = coreless_18mm * 2.0;
    let coreless_72mm = coreless_48mm * 1.5;
    let coreless_20mm = coreless_rate / 48.0 * 20.0;
    let coreless_60mm = coreless_20mm * 3.0;
    let coreless_144mm_alt = coreless_rate * 3.0;

    Ok(CostSheet {
        microns: Figure::Computed(microns),
        box_rate: Figure::Computed(box_rate),
        jumbo_width_mm: Figure::Computed(JUMBO_WIDTH_MM),
        jumbo_rate: Figure::Computed(jumbo_rate),
        rate_288mm_base: Figure::NotApplicable,
        rate_288mm: Figure::Computed(rate_288mm),
        jumbo_weight_1315: Figure::Computed(jumbo_weight_1315),
        jumbo_weight_1610: Figure::Computed(jumbo_weight_1610),
        coil_weight: Figure::Computed(coil_weight),
        coil_weight_1610: Figure::NotApplicable,
        scale_weight: Figure::Computed(scale_weight),
        box_weight: Figure::Computed(box_weight),
        sq_meter_rate: Figure::Computed(sq_meter_rate),
        piece_weight_48mm: Figure::Computed(piece_weight_48mm),
        rate_12mm: Figure::Computed(rate_12mm),
        rate_24mm: Figure::Computed(rate_24mm),
        rate_36mm: Figure::Computed(rate_36mm),
        rate_48mm: Figure::Computed(rate_48mm),
        rate_60mm: Figure::Computed(rate_60mm),
        rate_72mm: Figure::Computed(rate_72mm),
        rate_96mm: Figure::Computed(rate_96mm),
        coreless_144mm: Figure::Computed(coreless_144mm),
        coreless_48mm: Figure::Computed(coreless_48mm),
        coreless_72mm: Figure::Computed(coreless_72mm),
        coreless_36mm: Figure::Computed(coreless_36mm),
        coreless_60mm: Figure::Computed(coreless_60mm),
        coreless_18mm: Figure::Computed(coreless_18mm),
        coreless_20mm: Figure::Computed(coreless_20mm),
        coreless_spare_widths: [Figure::NotApplicable; 5],
        pieces_per_box: Figure::Computed(PIECES_PER_BOX),
        tape_length_m: Figure::Computed(length),
        coreless_length_m: Figure::Computed(coreless_len),
        coreless_length_units: Figure::Computed(coreless_length_units),
        coreless_offset: Figure::Computed(coreless_offset),
        coreless_net_units: Figure::Computed(coreless_net_units),
        core_credit: Figure::Computed(core_credit),
        coreless_spare_adjustments: [Figure::NotApplicable; 4],
        standard_box_rate: Figure::Computed(standard_box_rate),
        coreless_gross: Figure::Computed(coreless_gross),
        coreless_deduction: Figure::Computed(coreless_deduction),
        coreless_rate: Figure::Computed(coreless_rate),
        coreless_144mm_alt: Figure::Computed(coreless_144mm_alt),
    })
}

/// Collect every validation problem; an empty list means the run is
/// admissible.
fn validate(input: &CalcInput, rates: &RateSnapshot) -> Vec<String> {
    let mut problems = Vec::new();

    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(input.film_micron) {
        problems.push("BOPP film thickness (must be > 0)".to_string());
    }
    if !positive(input.adhesive_micron) {
        problems.push("Adhesive thickness (must be > 0)".to_string());
    }
    if !positive(input.tape_length_m) {
        problems.push("Tape length (must be > 0)".to_string());
    }
    if !positive(input.coreless_length_m) {
        problems.push("Coreless reference meters (must be > 0)".to_string());
    }

    if input.print_type.is_empty() {
        problems.push("Print type".to_string());
    } else if !rates.contains_key(&input.print_type) {
        problems.push(format!("Stored rate for print type: {}", input.print_type));
    }
    if input.paste_type.is_empty() {
        problems.push("Paste type".to_string());
    } else if !rates.contains_key(&input.paste_type) {
        problems.push(format!("Stored rate for paste type: {}", input.paste_type));
    }

    for key in REQUIRED_RATE_KEYS {
        match rates.get(key) {
            None => problems.push(format!("Stored rate: {key}")),
            Some(value) if !value.is_finite() || *value < 0.0 => {
                problems.push(format!("Stored rate: {key} (must be >= 0)"));
            }
            Some(_) => {}
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn reference_rates() -> RateSnapshot {
        let mut rates = BTreeMap::new();
        rates.insert("SINGLE_COLOUR_PRINTED".to_string(), 150.0);
        rates.insert("MILKY_WHITE".to_string(), 160.0);
        rates.insert("ADHESIVE_RATE".to_string(), 11.0);
        rates.insert("BOPP_FILM_RATE".to_string(), 118.0);
        rates.insert("PACKING_COST".to_string(), 220.0);
        rates.insert("COATING_EXP".to_string(), 12.0);
        rates.insert("PROFIT".to_string(), 12.0);
        rates.insert("ADHESIVE_LESS_RATE".to_string(), 0.0);
        rates
    }

    fn reference_input() -> CalcInput {
        CalcInput {
            film_micron: 30.0,
            adhesive_micron: 20.0,
            tape_length_m: 4000.0,
            coreless_length_m: 1000.0,
            print_type: "SINGLE_COLOUR_PRINTED".to_string(),
            paste_type: "MILKY_WHITE".to_string(),
        }
    }

    fn assert_computed(figure: Figure, expected: f64) {
        let actual = figure.value().expect("figure should be computed");
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn golden_cost_sheet() {
        let sheet = compute(&reference_input(), &reference_rates()).unwrap();

        assert_computed(sheet.microns, 50.0);
        assert_computed(sheet.box_rate, 74452.6202156722);
        assert_computed(sheet.jumbo_width_mm, 1315.0);
        assert_computed(sheet.jumbo_rate, 104.3695864937607);
        assert_computed(sheet.rate_288mm, 109.3695864937607);
        assert_computed(sheet.jumbo_weight_1315, 248.523);
        assert_computed(sheet.jumbo_weight_1610, 304.2753079847909);
        assert_computed(sheet.coil_weight, 13.6068);
        assert_computed(sheet.scale_weight, 56.08998461538461);
        assert_computed(sheet.box_weight, 673.8298153846154);
        assert_computed(sheet.sq_meter_rate, 4.931224856309676);
        assert_computed(sheet.piece_weight_48mm, 9.348330769230769);
        assert_computed(sheet.rate_12mm, 258.5160424155285);
        assert_computed(sheet.rate_24mm, 517.032084831057);
        assert_computed(sheet.rate_36mm, 775.5481272465854);
        assert_computed(sheet.rate_48mm, 1034.064169662114);
        assert_computed(sheet.rate_60mm, 1292.5802120776425);
        assert_computed(sheet.rate_72mm, 1551.0962544931708);
        assert_computed(sheet.rate_96mm, 2068.128339324228);
        assert_computed(sheet.coreless_144mm, 910.2427975762558);
        assert_computed(sheet.coreless_48mm, 303.41426585875195);
        assert_computed(sheet.coreless_72mm, 455.1213987881279);
        assert_computed(sheet.coreless_36mm, 227.56069939406396);
        assert_computed(sheet.coreless_60mm, 379.26783232343996);
        assert_computed(sheet.coreless_18mm, 113.78034969703198);
        assert_computed(sheet.coreless_20mm, 126.42261077447998);
        assert_computed(sheet.pieces_per_box, 72.0);
        assert_computed(sheet.tape_length_m, 4000.0);
        assert_computed(sheet.coreless_length_m, 1000.0);
        assert_computed(sheet.coreless_length_units, 15.384615384615385);
        assert_computed(sheet.coreless_offset, -2.38);
        assert_computed(sheet.coreless_net_units, 13.004615384615384);
        assert_computed(sheet.core_credit, 1.9047619047619047);
        assert_computed(sheet.standard_box_rate, 1471.9260785046733);
        assert_computed(sheet.coreless_gross, 314.51411933860544);
        assert_computed(sheet.coreless_deduction, 11.09985347985348);
        assert_computed(sheet.coreless_rate, 303.41426585875195);
        assert_computed(sheet.coreless_144mm_alt, 910.2427975762558);
    }

    #[test]
    fn reserved_cells_stay_not_applicable() {
        let sheet = compute(&reference_input(), &reference_rates()).unwrap();

        assert_eq!(sheet.rate_288mm_base, Figure::NotApplicable);
        assert_eq!(sheet.coil_weight_1610, Figure::NotApplicable);
        assert_eq!(sheet.coreless_spare_widths, [Figure::NotApplicable; 5]);
        assert_eq!(sheet.coreless_spare_adjustments, [Figure::NotApplicable; 4]);
        assert_eq!(sheet.rate_288mm_base.display(), "-");
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let first = compute(&reference_input(), &reference_rates()).unwrap();
        let second = compute(&reference_input(), &reference_rates()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn every_invalid_field_is_reported_together() {
        let mut input = reference_input();
        input.film_micron = -1.0;
        input.tape_length_m = 0.0;

        let failure = compute(&input, &reference_rates()).unwrap_err();

        assert_eq!(failure.problems.len(), 2);
        let message = failure.to_string();
        assert!(message.contains("BOPP film thickness"));
        assert!(message.contains("Tape length"));
    }

    #[test]
    fn missing_rates_are_enumerated() {
        let mut rates = reference_rates();
        rates.remove("PACKING_COST");
        rates.remove("PROFIT");

        let failure = compute(&reference_input(), &rates).unwrap_err();

        assert_eq!(failure.problems.len(), 2);
        assert!(failure.problems.iter().any(|p| p.contains("PACKING_COST")));
        assert!(failure.problems.iter().any(|p| p.contains("PROFIT")));
    }

    #[test]
    fn unknown_print_and_paste_selections_are_rejected() {
        let mut input = reference_input();
        input.print_type = "GOLD_FOIL".to_string();
        input.paste_type = String::new();

        let failure = compute(&input, &reference_rates()).unwrap_err();

        assert!(failure
            .problems
            .iter()
            .any(|p| p.contains("print type: GOLD_FOIL")));
        assert!(failure.problems.iter().any(|p| p == "Paste type"));
    }

    #[test]
    fn non_finite_inputs_are_invalid() {
        let mut input = reference_input();
        input.adhesive_micron = f64::NAN;
        input.coreless_length_m = f64::INFINITY;

        let failure = compute(&input, &reference_rates()).unwrap_err();
        assert_eq!(failure.problems.len(), 2);
    }

    #[test]
    fn zero_rates_are_admissible() {
        // TRANSPARENT paste and ADHESIVE_LESS_RATE both default to zero;
        // a zero rate is a valid price, not a missing one.
        let mut rates = reference_rates();
        rates.insert("TRANSPARENT".to_string(), 0.0);
        let mut input = reference_input();
        input.paste_type = "TRANSPARENT".to_string();

        let sheet = compute(&input, &rates).unwrap();
        assert!(sheet.box_rate.value().unwrap() > 0.0);
    }

    #[test]
    fn figure_display_rounds_to_two_decimals() {
        assert_eq!(Figure::Computed(1034.064169662114).display(), "1034.06");
        assert_eq!(Figure::Computed(50.0).display(), "50.00");
        assert_eq!(Figure::NotApplicable.display(), "-");
    }
}
