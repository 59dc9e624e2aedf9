//! # Report Composition
//!
//! Builds the report document for a finished calculation as a tree of
//! layout-neutral blocks. The composer owns the report template: fixed
//! section order, the parameter grid, the formula walk-through, and the
//! concluding narrative. Rendering to an output format lives in [`typst`].

pub mod typst;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dispatch::{CalculationResult, CraneEvaluation, Formula, SlopeResult};
use crate::errors::{CalcError, CalcResult};
use crate::params::{CalculationParams, ParameterModel, SlopeModel, TruckCraneModel, VerificationProject};

pub use typst::{write_report, ReportRenderer, TypstRenderer};

/// A merged cell region in a table, 1-based and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMerge {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

/// One block of report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block")]
pub enum DocBlock {
    /// Section heading; level 1 is the document title
    Title { level: u8, text: String },
    Paragraph { text: String },
    /// Rectangular cell grid. The first row is the header when
    /// `header` is set.
    Table {
        header: bool,
        rows: Vec<Vec<String>>,
        merges: Vec<CellMerge>,
    },
    /// Formula with substitution and result line
    Formula { formula: Formula },
    /// Schematic figure; skipped by renderers when the file is missing
    Image { path: PathBuf },
}

/// A composed report document, renderer-independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDoc {
    pub title: String,
    pub blocks: Vec<DocBlock>,
}

/// Cells per row in the parameter grid.
const PARAM_COLUMNS: usize = 4;

/// Compose the report for a calculated model.
pub fn compose(model: &ParameterModel, result: &CalculationResult) -> CalcResult<ReportDoc> {
    match (&model.params, result) {
        (CalculationParams::Slope(params), CalculationResult::Slope(slope)) => {
            Ok(compose_slope(&model.display_name, params, slope))
        }
        (CalculationParams::TruckCrane(params), CalculationResult::Crane(eval)) => {
            Ok(compose_crane(&model.display_name, params, eval))
        }
        _ => Err(CalcError::internal(
            "calculation result does not match the parameter model",
        )),
    }
}

fn compose_slope(display_name: &str, params: &SlopeModel, result: &SlopeResult) -> ReportDoc {
    let (title, schematic) = match params.verification {
        VerificationProject::VerticalWallDepth => (
            "Vertical Excavation Wall Stability",
            "assets/schematics/vertical_wall.png",
        ),
        VerificationProject::SafeSlope => (
            "Excavation Slope Stability",
            "assets/schematics/safe_slope.png",
        ),
    };

    let mut blocks = vec![
        DocBlock::Title {
            level: 1,
            text: format!("{title} — {display_name}"),
        },
        DocBlock::Paragraph {
            text: "Reference: Building Construction Handbook, earthworks and excavation \
                   support chapter."
                .to_string(),
        },
        DocBlock::Title {
            level: 2,
            text: "Parameter information".to_string(),
        },
        parameter_table(vec![
            ("Soil type".to_string(), params.soil_type.display_name().to_string()),
            ("Unit weight γ".to_string(), format!("{:.2} kN/m³", params.unit_weight)),
            ("Friction angle φ".to_string(), format!("{:.2}°", params.friction_angle_deg)),
            ("Cohesion c".to_string(), format!("{:.2} kPa", params.cohesion)),
            ("Top surcharge q".to_string(), format!("{:.2} kPa", params.top_load_q)),
            ("Slope angle θ".to_string(), format!("{:.2}°", params.slope_angle_deg)),
        ]),
        DocBlock::Image {
            path: PathBuf::from(schematic),
        },
        DocBlock::Title {
            level: 2,
            text: "Calculation".to_string(),
        },
    ];

    match result {
        SlopeResult::VerticalWall { formula, narrative, .. } => {
            blocks.push(DocBlock::Formula {
                formula: formula.clone(),
            });
            blocks.push(DocBlock::Paragraph {
                text: narrative.clone(),
            });
        }
        SlopeResult::SafeSlope { formula, narrative, .. } => {
            if let Some(formula) = formula {
                blocks.push(DocBlock::Formula {
                    formula: formula.clone(),
                });
            }
            blocks.push(DocBlock::Paragraph {
                text: narrative.clone(),
            });
        }
    }

    ReportDoc {
        title: title.to_string(),
        blocks,
    }
}

fn compose_crane(
    display_name: &str,
    params: &TruckCraneModel,
    eval: &CraneEvaluation,
) -> ReportDoc {
    let title = "Hydraulic Truck-Crane Selection";

    let mut blocks = vec![
        DocBlock::Title {
            level: 1,
            text: format!("{title} — {display_name}"),
        },
        DocBlock::Paragraph {
            text: "Reference: Building Construction Handbook, lifting and hoisting \
                   equipment chapter."
                .to_string(),
        },
        DocBlock::Title {
            level: 2,
            text: "Parameter information".to_string(),
        },
        parameter_table(vec![
            ("Hook load Gw".to_string(), format!("{:.2} t", params.load_gw_t)),
            ("Dynamic factor k₁".to_string(), format!("{:.2}", params.dynamic_factor_k1)),
            ("Lift height h₁".to_string(), format!("{:.2} m", params.max_lift_height_h1_m)),
            ("Clearance h₂".to_string(), format!("{:.2} m", params.min_clearance_h2_m)),
            ("Manufacturer".to_string(), params.manufacturer.clone()),
            ("Soil bearing".to_string(), format!("{:.0} kPa", params.soil_bearing_kpa)),
            ("Counterweight".to_string(), format!("{:.2} t", params.counterweight_t)),
        ]),
        DocBlock::Image {
            path: PathBuf::from("assets/schematics/truck_crane.png"),
        },
        DocBlock::Title {
            level: 2,
            text: "Calculation".to_string(),
        },
        DocBlock::Formula {
            formula: Formula {
                expression: "Q = Gw · k₁".to_string(),
                substitution: format!(
                    "Q = {:.2} × {:.2}",
                    params.load_gw_t, params.dynamic_factor_k1
                ),
                value: eval.effective_load_t,
                unit: "t".to_string(),
            },
        },
        candidate_table(eval),
        DocBlock::Paragraph {
            text: crane_conclusion(eval),
        },
    ];

    if eval.candidates.is_empty() {
        blocks.retain(|b| !matches!(b, DocBlock::Table { header: true, .. }));
    }

    ReportDoc {
        title: title.to_string(),
        blocks,
    }
}

/// Lay label/value pairs out as a fixed-width grid, padding the last row
/// and merging a run of two or more trailing blanks into one cell.
fn parameter_table(pairs: Vec<(String, String)>) -> DocBlock {
    let mut cells = Vec::with_capacity(pairs.len() * 2);
    for (label, value) in pairs {
        cells.push(label);
        cells.push(value);
    }

    let mut rows: Vec<Vec<String>> = cells
        .chunks(PARAM_COLUMNS)
        .map(|chunk| chunk.to_vec())
        .collect();

    let mut merges = Vec::new();
    if let Some(last) = rows.last_mut() {
        let filled = last.len();
        if filled < PARAM_COLUMNS {
            last.resize(PARAM_COLUMNS, String::new());
            let blanks = PARAM_COLUMNS - filled;
            if blanks >= 2 {
                merges.push(CellMerge {
                    first_row: rows.len(),
                    last_row: rows.len(),
                    first_col: filled + 1,
                    last_col: PARAM_COLUMNS,
                });
            }
        }
    }

    DocBlock::Table {
        header: false,
        rows,
        merges,
    }
}

fn candidate_table(eval: &CraneEvaluation) -> DocBlock {
    let mut rows = vec![vec![
        "Crane".to_string(),
        "Condition".to_string(),
        "Radius (m)".to_string(),
        "Boom (m)".to_string(),
        "Rated (t)".to_string(),
        "Utilisation".to_string(),
        "Verdict".to_string(),
    ]];
    for candidate in &eval.candidates {
        rows.push(vec![
            candidate.crane.clone(),
            candidate.condition.clone(),
            format!("{:.2}", candidate.working_radius_m),
            format!("{:.2}", candidate.boom_length_m),
            candidate
                .rated_capacity_t
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| "—".to_string()),
            candidate
                .utilisation
                .map(|u| format!("{u:.3}"))
                .unwrap_or_else(|| "—".to_string()),
            if candidate.passes() { "OK" } else { "FAIL" }.to_string(),
        ]);
    }
    DocBlock::Table {
        header: true,
        rows,
        merges: Vec::new(),
    }
}

fn crane_conclusion(eval: &CraneEvaluation) -> String {
    match eval.selected_result() {
        Some(selected) => format!(
            "The effective hook load is Q = {:.2} t. The recommended configuration is \
             {} {} ({}) at a working radius of {:.2} m with a {:.2} m boom; \
             all capacity, clearance, bearing, and overturning checks pass.",
            eval.effective_load_t,
            selected.manufacturer,
            selected.crane,
            selected.condition,
            selected.working_radius_m,
            selected.boom_length_m,
        ),
        None => format!(
            "The effective hook load is Q = {:.2} t. None of the {} evaluated \
             configurations passes every check; the lift must be re-planned.",
            eval.effective_load_t,
            eval.candidates.len(),
        ),
    }
}
