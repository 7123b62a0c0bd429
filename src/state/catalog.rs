//! The fixed sections of a BRSR report
//!
//! Section A and B are written out field by field. The nine principles of
//! Section C share one shape and are generated from their indicator lists.

use super::forms::FieldKind::{self, Flag, Multiline, Number, Text};
use super::forms::{FieldCheck, FieldDescriptor, PersistedField, SectionSpec};
use std::sync::Arc;

const GENERAL: &str = "general_disclosures";
const MANAGEMENT: &str = "management_disclosures";
const ESSENTIAL: &str = "essential_indicators";
const LEADERSHIP: &str = "leadership_indicators";

/// Which indicator group of a principle an indicator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Essential,
    Leadership,
}

impl Tier {
    fn group(self) -> &'static str {
        match self {
            Tier::Essential => ESSENTIAL,
            Tier::Leadership => LEADERSHIP,
        }
    }
}

struct Indicator {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    tier: Tier,
    required: bool,
}

const fn essential(key: &'static str, label: &'static str, kind: FieldKind) -> Indicator {
    Indicator {
        key,
        label,
        kind,
        tier: Tier::Essential,
        required: false,
    }
}

const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Indicator {
    Indicator {
        key,
        label,
        kind,
        tier: Tier::Essential,
        required: true,
    }
}

const fn leadership(key: &'static str, label: &'static str, kind: FieldKind) -> Indicator {
    Indicator {
        key,
        label,
        kind,
        tier: Tier::Leadership,
        required: false,
    }
}

struct Principle {
    number: u8,
    title: &'static str,
    indicators: &'static [Indicator],
}

const PRINCIPLES: &[Principle] = &[
    Principle {
        number: 1,
        title: "Ethics, transparency and accountability",
        indicators: &[
            essential("awareness_coverage", "Board/KMP covered by awareness programmes (%)", Number),
            essential("fines_paid", "Monetary fines and penalties paid (INR)", Number),
            essential("anti_corruption_policy", "Anti-corruption policy in place", Flag),
            essential("conflict_complaints", "Conflict of interest complaints", Number),
            leadership("value_chain_awareness", "Value chain awareness programmes", Multiline),
        ],
    },
    Principle {
        number: 2,
        title: "Safe and sustainable goods and services",
        indicators: &[
            essential("rd_sustainable_share", "R&D spent on sustainable technologies (%)", Number),
            essential("sustainable_sourcing", "Procedures for sustainable sourcing", Flag),
            essential("reclaim_process", "Process to reclaim products at end of life", Multiline),
            leadership("lca_conducted", "Life cycle assessments conducted", Flag),
        ],
    },
    Principle {
        number: 3,
        title: "Employee well-being",
        indicators: &[
            essential("wellbeing_spend_share", "Spend on well-being measures (% of revenue)", Number),
            essential("retirement_coverage", "Employees covered by retirement benefits (%)", Number),
            essential("accessible_workplaces", "Premises accessible to differently abled", Flag),
            essential("safety_incidents", "Safety related incidents", Number),
            leadership("life_insurance", "Life insurance extended to employees", Flag),
        ],
    },
    Principle {
        number: 4,
        title: "Responsiveness to stakeholders",
        indicators: &[
            required("stakeholder_groups", "Key stakeholder groups", Multiline),
            essential("engagement_frequency", "Frequency of engagement", Text),
            leadership("board_consultation", "Consultation between stakeholders and the Board", Multiline),
        ],
    },
    Principle {
        number: 5,
        title: "Human rights",
        indicators: &[
            essential("human_rights_training", "Employees trained on human rights (%)", Number),
            essential("minimum_wage_compliance", "Minimum wages paid to all workers", Flag),
            essential("complaints_filed", "Human rights complaints filed", Number),
            leadership("due_diligence_scope", "Scope of human rights due diligence", Multiline),
        ],
    },
    Principle {
        number: 6,
        title: "Protection of the environment",
        indicators: &[
            essential("energy_consumption", "Total energy consumption (GJ)", Number),
            essential("water_withdrawal", "Total water withdrawal (kL)", Number),
            essential("scope1_emissions", "Scope 1 emissions (tCO2e)", Number),
            essential("scope2_emissions", "Scope 2 emissions (tCO2e)", Number),
            essential("waste_generated", "Total waste generated (t)", Number),
            leadership("renewable_share", "Energy from renewable sources (%)", Number),
        ],
    },
    Principle {
        number: 7,
        title: "Responsible public policy advocacy",
        indicators: &[
            essential("trade_associations", "Affiliations with trade associations", Number),
            essential("anti_competitive_issues", "Corrective action on anti-competitive conduct", Multiline),
            leadership("policy_positions", "Public policy positions advocated", Multiline),
        ],
    },
    Principle {
        number: 8,
        title: "Inclusive growth and equitable development",
        indicators: &[
            essential("sia_projects", "Social impact assessments undertaken", Number),
            essential("csr_beneficiaries", "Beneficiaries of CSR projects", Number),
            essential("rehabilitation_cases", "Ongoing rehabilitation and resettlement cases", Number),
            leadership("local_sourcing_share", "Inputs sourced from MSMEs and small producers (%)", Number),
        ],
    },
    Principle {
        number: 9,
        title: "Responsible consumer engagement",
        indicators: &[
            essential("consumer_complaints", "Consumer complaints received", Number),
            essential("product_recalls", "Product recalls", Number),
            essential("data_breaches", "Instances of data breaches", Number),
            essential("feedback_mechanism", "Mechanisms to receive consumer feedback", Multiline),
            leadership("information_channels", "Channels for product and service information", Multiline),
        ],
    },
];

/// Number indicators are reported for the current and the previous year;
/// everything else holds a single `value`.
fn indicator_fields(ind: &Indicator) -> Vec<FieldDescriptor> {
    let base = format!("{}.{}", ind.tier.group(), ind.key);
    match ind.kind {
        Number => vec![
            FieldDescriptor::number(&format!("{base}.current_fy"), &format!("{}, current FY", ind.label)),
            FieldDescriptor::number(&format!("{base}.previous_fy"), &format!("{}, previous FY", ind.label)),
        ],
        Text => vec![FieldDescriptor::text(&format!("{base}.value"), ind.label)],
        Multiline => vec![FieldDescriptor::multiline(&format!("{base}.value"), ind.label)],
        Flag => vec![FieldDescriptor::flag(&format!("{base}.value"), ind.label)],
    }
}

fn principle_section(principle: &Principle) -> SectionSpec {
    let n = principle.number;
    let fields = principle.indicators.iter().flat_map(indicator_fields).collect();
    let checks = principle
        .indicators
        .iter()
        .filter(|ind| ind.required)
        .flat_map(indicator_fields)
        .map(|field| FieldCheck::required(&field.path))
        .collect();

    SectionSpec {
        key: format!("p{n}"),
        title: format!("Principle {n}: {}", principle.title),
        persisted: vec![
            PersistedField::new(&format!("sc_p{n}_essential_indicators"), ESSENTIAL),
            PersistedField::new(&format!("sc_p{n}_leadership_indicators"), LEADERSHIP),
        ],
        fields,
        checks,
    }
}

fn general_disclosures() -> SectionSpec {
    let path = |leaf: &str| format!("{GENERAL}.{leaf}");
    SectionSpec {
        key: "a".to_string(),
        title: "Section A: General disclosures".to_string(),
        persisted: vec![PersistedField::new("sa_general_disclosures", GENERAL)],
        fields: vec![
            FieldDescriptor::text(&path("cin"), "Corporate Identity Number (CIN)"),
            FieldDescriptor::text(&path("entity_name"), "Name of the listed entity"),
            FieldDescriptor::number(&path("incorporation_year"), "Year of incorporation"),
            FieldDescriptor::multiline(&path("registered_office"), "Registered office address"),
            FieldDescriptor::text(&path("email"), "E-mail"),
            FieldDescriptor::text(&path("telephone"), "Telephone"),
            FieldDescriptor::text(&path("website"), "Website"),
            FieldDescriptor::number(&path("paid_up_capital"), "Paid-up capital (INR)"),
            FieldDescriptor::text(&path("stock_exchanges"), "Stock exchanges where listed"),
            FieldDescriptor::text(&path("reporting_boundary"), "Reporting boundary"),
            FieldDescriptor::number(&path("employees.permanent_male"), "Permanent employees, male"),
            FieldDescriptor::number(&path("employees.permanent_female"), "Permanent employees, female"),
        ],
        checks: vec![
            FieldCheck::required(&path("cin")),
            FieldCheck::required(&path("entity_name")),
        ],
    }
}

fn management_disclosures() -> SectionSpec {
    let path = |leaf: &str| format!("{MANAGEMENT}.{leaf}");
    SectionSpec {
        key: "b".to_string(),
        title: "Section B: Management and process disclosures".to_string(),
        persisted: vec![PersistedField::new("sb_management_disclosures", MANAGEMENT)],
        fields: vec![
            FieldDescriptor::flag(&path("policy_covers_principles"), "Policies cover all principles"),
            FieldDescriptor::flag(&path("policy_board_approved"), "Policies approved by the Board"),
            FieldDescriptor::text(&path("policy_web_link"), "Web link of the policies"),
            FieldDescriptor::multiline(&path("director_statement"), "Statement by the director responsible"),
            FieldDescriptor::text(&path("responsible_authority"), "Authority responsible for implementation"),
            FieldDescriptor::flag(&path("sustainability_committee"), "Board committee for sustainability"),
        ],
        checks: vec![FieldCheck::required(&path("responsible_authority"))],
    }
}

/// Every section in wizard order
pub fn brsr_sections() -> Vec<Arc<SectionSpec>> {
    let mut sections = vec![
        Arc::new(general_disclosures()),
        Arc::new(management_disclosures()),
    ];
    sections.extend(PRINCIPLES.iter().map(|p| Arc::new(principle_section(p))));
    sections
}
