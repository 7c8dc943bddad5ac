use crate::domain::model::{Interaction, PregnancyProfile, Severity};
use std::collections::BTreeMap;

use Severity::{Mild, Moderate, Severe};

type InteractionRow = (&'static str, &'static [(&'static str, Severity, &'static str)]);

const HYPERKALEMIA: &str = "Increased risk of hyperkalemia. Monitor potassium levels.";
const SEROTONIN: &str = "Increased risk of serotonin syndrome. Monitor for symptoms.";
const INR: &str = "May increase anticoagulant effect. Monitor INR.";
const LEVO_ABSORPTION: &str = "May decrease levothyroxine absorption. Take at least 4 hours apart.";
const BLEEDING: &str = "Increased risk of bleeding. Avoid combination if possible.";
const DIGOXIN_HYPOKALEMIA: &str =
    "May increase digoxin toxicity due to hypokalemia. Monitor potassium and digoxin levels.";
const LITHIUM: &str = "May increase lithium levels. Monitor lithium concentration.";
const CNS: &str = "Increased CNS depression. Avoid alcohol.";

const INTERACTIONS: &[InteractionRow] = &[
    (
        "metformin",
        &[
            ("lisinopril", Mild, "May cause hypoglycemia. Monitor blood glucose levels."),
            ("insulin", Moderate, "Increased risk of hypoglycemia. Dose adjustments may be needed."),
            ("alcohol", Severe, "May cause lactic acidosis. Avoid alcohol while taking metformin."),
        ],
    ),
    (
        "aspirin",
        &[
            ("warfarin", Severe, BLEEDING),
            ("ibuprofen", Moderate, "May decrease cardioprotective effects of aspirin."),
            ("clopidogrel", Mild, "Increased antiplatelet effect. Monitor for bleeding."),
        ],
    ),
    (
        "lisinopril",
        &[
            ("potassium", Moderate, "May cause hyperkalemia. Monitor potassium levels."),
            ("spironolactone", Moderate, HYPERKALEMIA),
            ("nsaids", Moderate, "May reduce antihypertensive effect. Monitor blood pressure."),
        ],
    ),
    (
        "atorvastatin",
        &[
            ("grapefruit", Moderate, "May increase atorvastatin levels. Avoid grapefruit juice."),
            ("clarithromycin", Severe, "May increase risk of myopathy. Consider alternative antibiotic."),
            ("cyclosporine", Severe, "Increased risk of myopathy and rhabdomyolysis. Avoid combination."),
        ],
    ),
    (
        "warfarin",
        &[
            ("vitamin_k", Moderate, "May decrease warfarin effectiveness. Maintain consistent vitamin K intake."),
            ("amiodarone", Severe, "Increases warfarin effect. Monitor INR closely and adjust warfarin dose."),
            ("nsaids", Severe, BLEEDING),
        ],
    ),
    (
        "levothyroxine",
        &[
            ("calcium", Moderate, LEVO_ABSORPTION),
            ("iron", Moderate, LEVO_ABSORPTION),
            ("antacids", Moderate, LEVO_ABSORPTION),
        ],
    ),
    (
        "ozempic",
        &[
            ("insulin", Moderate, "Increased risk of hypoglycemia. Monitor blood glucose levels."),
            ("oral_diabetes_medications", Moderate, "May enhance hypoglycemic effect. Dose adjustments may be needed."),
        ],
    ),
    (
        "simvastatin",
        &[
            ("grapefruit", Severe, "Significantly increases simvastatin levels. Avoid grapefruit juice."),
            ("warfarin", Moderate, INR),
        ],
    ),
    (
        "prednisone",
        &[
            ("nsaids", Moderate, "Increased risk of GI bleeding. Use with caution."),
            ("warfarin", Moderate, INR),
        ],
    ),
    (
        "furosemide",
        &[
            ("digoxin", Moderate, DIGOXIN_HYPOKALEMIA),
            ("lithium", Moderate, LITHIUM),
        ],
    ),
    (
        "tramadol",
        &[("sertraline", Moderate, SEROTONIN), ("warfarin", Moderate, INR)],
    ),
    (
        "sertraline",
        &[("tramadol", Moderate, SEROTONIN), ("warfarin", Moderate, INR)],
    ),
    (
        "pantoprazole",
        &[
            ("clopidogrel", Moderate, "May reduce clopidogrel effectiveness. Consider alternative PPI."),
            ("warfarin", Mild, "May slightly increase anticoagulant effect. Monitor INR."),
        ],
    ),
    (
        "montelukast",
        &[("phenobarbital", Mild, "May decrease montelukast effectiveness. Monitor asthma control.")],
    ),
    (
        "fluticasone",
        &[("ritonavir", Severe, "Significantly increases fluticasone levels. Avoid combination.")],
    ),
    (
        "carvedilol",
        &[
            ("insulin", Moderate, "May mask hypoglycemia symptoms. Monitor blood glucose closely."),
            ("verapamil", Moderate, "Increased risk of heart block. Monitor cardiac function."),
        ],
    ),
    (
        "spironolactone",
        &[
            ("lisinopril", Moderate, HYPERKALEMIA),
            ("trimethoprim", Moderate, HYPERKALEMIA),
        ],
    ),
    (
        "digoxin",
        &[
            ("furosemide", Moderate, DIGOXIN_HYPOKALEMIA),
            ("amiodarone", Severe, "Significantly increases digoxin levels. Reduce digoxin dose."),
        ],
    ),
    (
        "diltiazem",
        &[
            ("simvastatin", Moderate, "May increase simvastatin levels. Consider dose reduction."),
            ("digoxin", Moderate, "May increase digoxin levels. Monitor digoxin concentration."),
        ],
    ),
    (
        "valsartan",
        &[
            ("potassium", Moderate, "May cause hyperkalemia. Monitor potassium levels."),
            ("lithium", Moderate, LITHIUM),
        ],
    ),
    (
        "rosuvastatin",
        &[
            ("cyclosporine", Severe, "Significantly increases rosuvastatin levels. Avoid combination."),
            ("warfarin", Moderate, INR),
        ],
    ),
    (
        "escitalopram",
        &[("tramadol", Moderate, SEROTONIN), ("warfarin", Moderate, INR)],
    ),
    (
        "duloxetine",
        &[
            ("tramadol", Moderate, SEROTONIN),
            ("warfarin", Moderate, "May increase bleeding risk. Monitor INR."),
        ],
    ),
    (
        "pregabalin",
        &[
            ("alcohol", Moderate, CNS),
            ("opioids", Moderate, "Increased risk of respiratory depression. Use with caution."),
        ],
    ),
    (
        "gabapentin",
        &[
            ("alcohol", Moderate, CNS),
            ("morphine", Moderate, "Increased gabapentin levels. Monitor for side effects."),
        ],
    ),
];

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn interaction(severity: Severity, description: &str) -> Interaction {
    Interaction {
        severity,
        description: description.to_string(),
    }
}

/// Interactions grouped by drug, as returned for a single-drug query.
pub type InteractionMap = BTreeMap<String, BTreeMap<String, Interaction>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionTable;

impl InteractionTable {
    /// Every interaction touching the drug, in both directions. Listed
    /// drugs that overlap the name contribute their full row; drugs listed
    /// as the interacting side are grouped under their own name.
    pub fn interactions_for(&self, drug: &str) -> InteractionMap {
        let needle = drug.trim().to_lowercase();
        let mut found = InteractionMap::new();
        if needle.is_empty() {
            return found;
        }

        for (listed, row) in INTERACTIONS {
            if overlaps(listed, &needle) {
                let group = found.entry(listed.to_string()).or_default();
                for (other, severity, description) in row.iter() {
                    group.insert(other.to_string(), interaction(*severity, description));
                }
            }
        }

        for (listed, row) in INTERACTIONS {
            for (other, severity, description) in row.iter() {
                if overlaps(other, &needle) {
                    found
                        .entry(other.to_string())
                        .or_default()
                        .insert(listed.to_string(), interaction(*severity, description));
                }
            }
        }

        found
    }

    /// The interaction between two drugs: direct entry, then the reverse
    /// entry, then the first partial match on both names.
    pub fn between(&self, first: &str, second: &str) -> Option<Interaction> {
        let first = first.trim().to_lowercase();
        let second = second.trim().to_lowercase();
        if first.is_empty() || second.is_empty() {
            return None;
        }

        let exact = |a: &str, b: &str| {
            INTERACTIONS
                .iter()
                .find(|(listed, _)| *listed == a)
                .and_then(|(_, row)| row.iter().find(|(other, _, _)| *other == b))
        };

        exact(&first, &second)
            .or_else(|| exact(&second, &first))
            .or_else(|| {
                INTERACTIONS
                    .iter()
                    .filter(|(listed, _)| overlaps(listed, &first))
                    .find_map(|(_, row)| row.iter().find(|(other, _, _)| overlaps(other, &second)))
            })
            .map(|(_, severity, description)| interaction(*severity, description))
    }
}

const PREGNANCY: &[(&str, &str, &str, &str)] = &[
    (
        "metformin",
        "B",
        "Animal studies have not shown risk to the fetus, but there are no adequate studies in pregnant women.",
        "Generally considered safe during pregnancy, especially for gestational diabetes.",
    ),
    (
        "lisinopril",
        "D",
        "There is positive evidence of human fetal risk, but the benefits may outweigh the risks in certain situations.",
        "Should be avoided during pregnancy, especially in the second and third trimesters.",
    ),
    (
        "aspirin",
        "C/D",
        "Category C in first and second trimesters, Category D in third trimester.",
        "Low-dose aspirin may be used in certain high-risk pregnancies under medical supervision. Avoid in third trimester.",
    ),
    (
        "atorvastatin",
        "X",
        "Studies in animals or humans have demonstrated fetal abnormalities or there is evidence of fetal risk.",
        "Contraindicated during pregnancy.",
    ),
    (
        "levothyroxine",
        "A",
        "Adequate studies in pregnant women have not shown risk to the fetus.",
        "Safe to use during pregnancy. Dosage may need adjustment.",
    ),
    (
        "amlodipine",
        "C",
        "Animal studies have shown adverse effects on the fetus, but there are no adequate studies in humans.",
        "Use only if potential benefit justifies the potential risk to the fetus.",
    ),
    (
        "omeprazole",
        "C",
        "Animal studies have shown adverse effects on the fetus, but there are no adequate studies in humans.",
        "Use only if potential benefit justifies the potential risk to the fetus.",
    ),
    (
        "albuterol",
        "C",
        "Animal studies have shown adverse effects on the fetus, but there are no adequate studies in humans.",
        "Generally considered acceptable for use during pregnancy when needed for asthma control.",
    ),
    (
        "insulin",
        "B",
        "Animal studies have not shown risk to the fetus, but there are no adequate studies in pregnant women.",
        "Safe to use during pregnancy. Often the preferred treatment for diabetes in pregnancy.",
    ),
    (
        "ozempic",
        "C",
        "Animal studies have shown adverse effects on the fetus, but there are no adequate studies in humans.",
        "Not recommended during pregnancy. Alternative treatments should be considered.",
    ),
];

/// FDA pregnancy category letters and their meaning.
pub const CATEGORY_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "A",
        "Adequate and well-controlled studies have failed to demonstrate a risk to the fetus in the first trimester of pregnancy (and there is no evidence of risk in later trimesters).",
    ),
    (
        "B",
        "Animal reproduction studies have failed to demonstrate a risk to the fetus and there are no adequate and well-controlled studies in pregnant women.",
    ),
    (
        "C",
        "Animal reproduction studies have shown an adverse effect on the fetus and there are no adequate and well-controlled studies in humans, but potential benefits may warrant use of the drug in pregnant women despite potential risks.",
    ),
    (
        "D",
        "There is positive evidence of human fetal risk based on adverse reaction data from investigational or marketing experience or studies in humans, but potential benefits may warrant use of the drug in pregnant women despite potential risks.",
    ),
    (
        "X",
        "Studies in animals or humans have demonstrated fetal abnormalities and/or there is positive evidence of human fetal risk based on adverse reaction data from investigational or marketing experience, and the risks involved in use of the drug in pregnant women clearly outweigh potential benefits.",
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PregnancyTable;

impl PregnancyTable {
    /// Exact drug name first, then the first listed drug overlapping it.
    pub fn lookup(&self, drug: &str) -> Option<PregnancyProfile> {
        let needle = drug.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        PREGNANCY
            .iter()
            .find(|(name, ..)| *name == needle)
            .or_else(|| PREGNANCY.iter().find(|(name, ..)| overlaps(name, &needle)))
            .map(|(name, category, description, recommendation)| PregnancyProfile {
                drug: name.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                recommendation: recommendation.to_string(),
                category_description: category_description(category).map(str::to_string),
            })
    }

    pub fn categories(&self) -> BTreeMap<&'static str, &'static str> {
        CATEGORY_DESCRIPTIONS.iter().copied().collect()
    }
}

/// Description for the leading letter of a category such as "C/D".
pub fn category_description(category: &str) -> Option<&'static str> {
    let letter = category.get(..1)?;
    CATEGORY_DESCRIPTIONS
        .iter()
        .find(|(key, _)| *key == letter)
        .map(|(_, description)| *description)
}
