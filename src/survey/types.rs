//! Core types for synthetic survey generation.
//!
//! A persona is a tagged variant per stakeholder type with named, typed
//! demographic fields, plus the shared response-tendency structure (anchors,
//! category probabilities, response variance). Records are what the sink
//! receives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────
// Stakeholder Type
// ─────────────────────────────────────────────────────────────────

/// The three surveyed populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeholderType {
    Student,
    Faculty,
    Practitioner,
}

impl StakeholderType {
    /// Slug used in records, CLI args and table values.
    pub fn slug(&self) -> &'static str {
        match self {
            StakeholderType::Student => "student",
            StakeholderType::Faculty => "faculty",
            StakeholderType::Practitioner => "practitioner",
        }
    }

    /// Fixed survey access code attached to every respondent of this type.
    pub fn access_code(&self) -> &'static str {
        match self {
            StakeholderType::Student => "STUDENT2025",
            StakeholderType::Faculty => "FACULTY7389",
            StakeholderType::Practitioner => "PRACTITIONER1023",
        }
    }

    /// All stakeholder types in population build order.
    pub fn all() -> &'static [StakeholderType] {
        &[
            StakeholderType::Student,
            StakeholderType::Faculty,
            StakeholderType::Practitioner,
        ]
    }
}

impl fmt::Display for StakeholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for StakeholderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" | "students" => Ok(StakeholderType::Student),
            "faculty" => Ok(StakeholderType::Faculty),
            "practitioner" | "practitioners" => Ok(StakeholderType::Practitioner),
            _ => Err(format!(
                "Unknown stakeholder type '{}'. Valid: student, faculty, practitioner",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Survey Structure
// ─────────────────────────────────────────────────────────────────

/// Rating sections of the attitude survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    A,
    B,
    C,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[Section::A, Section::B, Section::C]
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Section::A => "A",
            Section::B => "B",
            Section::C => "C",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The nine technology-usage categories of the tool inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "ML")]
    MachineLearning,
    #[serde(rename = "DL")]
    DeepLearning,
    #[serde(rename = "NLP")]
    LanguageProcessing,
    #[serde(rename = "CV")]
    ComputerVision,
    #[serde(rename = "GenAI")]
    Generative,
    Recommender,
    EngDesign,
    Robotics,
    Expert,
}

impl Category {
    /// Categories in inventory order; tool draws follow this order.
    pub const ALL: [Category; 9] = [
        Category::MachineLearning,
        Category::DeepLearning,
        Category::LanguageProcessing,
        Category::ComputerVision,
        Category::Generative,
        Category::Recommender,
        Category::EngDesign,
        Category::Robotics,
        Category::Expert,
    ];

    /// Short id stored in tool response rows.
    pub fn id(&self) -> &'static str {
        match self {
            Category::MachineLearning => "ML",
            Category::DeepLearning => "DL",
            Category::LanguageProcessing => "NLP",
            Category::ComputerVision => "CV",
            Category::Generative => "GenAI",
            Category::Recommender => "Recommender",
            Category::EngDesign => "EngDesign",
            Category::Robotics => "Robotics",
            Category::Expert => "Expert",
        }
    }

    /// Position in [`Category::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

// ─────────────────────────────────────────────────────────────────
// Ordinal Attributes
// ─────────────────────────────────────────────────────────────────

/// Prior experience with AI tools. Dominant driver of anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    None,
    Limited,
    Moderate,
    Extensive,
}

impl ExperienceLevel {
    pub fn ordinal(&self) -> f64 {
        match self {
            ExperienceLevel::None => 0.0,
            ExperienceLevel::Limited => 1.0,
            ExperienceLevel::Moderate => 2.0,
            ExperienceLevel::Extensive => 3.0,
        }
    }
}

/// Student year in program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentYear {
    Freshman,
    Sophomore,
    Junior,
    Senior,
    Graduate,
}

impl StudentYear {
    pub fn ordinal(&self) -> f64 {
        match self {
            StudentYear::Freshman => 0.0,
            StudentYear::Sophomore => 1.0,
            StudentYear::Junior => 2.0,
            StudentYear::Senior => 3.0,
            StudentYear::Graduate => 4.0,
        }
    }
}

/// Years in academia or in professional practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenureBand {
    #[serde(rename = "0–5")]
    UpToFive,
    #[serde(rename = "6–10")]
    SixToTen,
    #[serde(rename = "11–20")]
    ElevenToTwenty,
    #[serde(rename = "21+")]
    TwentyOnePlus,
}

impl TenureBand {
    pub fn ordinal(&self) -> f64 {
        match self {
            TenureBand::UpToFive => 0.0,
            TenureBand::SixToTen => 1.0,
            TenureBand::ElevenToTwenty => 2.0,
            TenureBand::TwentyOnePlus => 3.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenureBand::UpToFive => "0–5",
            TenureBand::SixToTen => "6–10",
            TenureBand::ElevenToTwenty => "11–20",
            TenureBand::TwentyOnePlus => "21+",
        }
    }
}

/// Primary faculty role; steers the AI-use context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacultyRole {
    Teaching,
    Research,
    Combination,
    Administration,
}

/// Practitioner organization size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgSize {
    #[serde(rename = "<100")]
    Small,
    #[serde(rename = "100–999")]
    Medium,
    #[serde(rename = "1,000–9,999")]
    Large,
    #[serde(rename = "10,000+")]
    Enterprise,
}

impl OrgSize {
    /// 1,000 employees or more.
    pub fn is_large(&self) -> bool {
        matches!(self, OrgSize::Large | OrgSize::Enterprise)
    }
}

// ─────────────────────────────────────────────────────────────────
// Demographics (tagged per stakeholder)
// ─────────────────────────────────────────────────────────────────

/// Student demographic fields. Serialized names match the data service columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    #[serde(rename = "institution_or_company")]
    pub institution: String,
    #[serde(rename = "major_program")]
    pub major: String,
    #[serde(rename = "year_in_program")]
    pub year: StudentYear,
    #[serde(rename = "prior_ai_experience")]
    pub experience: ExperienceLevel,
    #[serde(rename = "primary_ai_context")]
    pub ai_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultyProfile {
    #[serde(rename = "institution_or_company")]
    pub institution: String,
    #[serde(rename = "engineering_discipline")]
    pub discipline: String,
    #[serde(rename = "years_in_academia")]
    pub years: TenureBand,
    #[serde(rename = "primary_role")]
    pub role: FacultyRole,
    pub institution_type: String,
    #[serde(rename = "prior_ai_experience")]
    pub experience: ExperienceLevel,
    #[serde(rename = "primary_ai_context")]
    pub ai_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PractitionerProfile {
    #[serde(rename = "institution_or_company")]
    pub company: String,
    #[serde(rename = "engineering_discipline")]
    pub discipline: String,
    #[serde(rename = "years_professional_experience")]
    pub years: TenureBand,
    #[serde(rename = "practitioner_role")]
    pub role: String,
    #[serde(rename = "industry_sector")]
    pub industry: String,
    #[serde(rename = "organization_size")]
    pub org_size: OrgSize,
    #[serde(rename = "prior_ai_experience")]
    pub experience: ExperienceLevel,
    #[serde(rename = "primary_ai_context")]
    pub ai_context: String,
}

/// Demographics of one persona; the variant fixes the stakeholder type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Demographics {
    Student(StudentProfile),
    Faculty(FacultyProfile),
    Practitioner(PractitionerProfile),
}

impl Demographics {
    pub fn stakeholder(&self) -> StakeholderType {
        match self {
            Demographics::Student(_) => StakeholderType::Student,
            Demographics::Faculty(_) => StakeholderType::Faculty,
            Demographics::Practitioner(_) => StakeholderType::Practitioner,
        }
    }

    pub fn experience(&self) -> ExperienceLevel {
        match self {
            Demographics::Student(p) => p.experience,
            Demographics::Faculty(p) => p.experience,
            Demographics::Practitioner(p) => p.experience,
        }
    }

    /// One-line description for progress logging.
    pub fn summary(&self) -> String {
        match self {
            Demographics::Student(p) => format!(
                "{:?} {}, {:?} AI exp",
                p.year, p.major, p.experience
            ),
            Demographics::Faculty(p) => format!(
                "{}yr {:?}, {}",
                p.years.label(),
                p.role,
                p.discipline
            ),
            Demographics::Practitioner(p) => format!(
                "{} @ {}, {}yr",
                p.role,
                p.industry,
                p.years.label()
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Response Tendencies
// ─────────────────────────────────────────────────────────────────

/// Which anchor an item's rating is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    /// Section A.
    A,
    /// Section B.
    B,
    /// Section C "readiness" items (AR prefix).
    Readiness,
    /// Section C "career readiness" items (CR prefix).
    Career,
}

impl AnchorKind {
    /// Anchor used for an item. Section C splits on the item-code prefix.
    pub fn for_item(section: Section, item_code: &str) -> Self {
        match section {
            Section::A => AnchorKind::A,
            Section::B => AnchorKind::B,
            Section::C if item_code.starts_with("AR") => AnchorKind::Readiness,
            Section::C => AnchorKind::Career,
        }
    }
}

/// Central tendencies for the four response dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub a: f64,
    pub b: f64,
    pub c_ar: f64,
    pub c_cr: f64,
}

impl Anchors {
    pub fn get(&self, kind: AnchorKind) -> f64 {
        match kind {
            AnchorKind::A => self.a,
            AnchorKind::B => self.b,
            AnchorKind::Readiness => self.c_ar,
            AnchorKind::Career => self.c_cr,
        }
    }
}

/// Lowest usage probability a category can carry.
pub const PROBABILITY_FLOOR: f64 = 0.02;
/// Highest usage probability a category can carry.
pub const PROBABILITY_CEILING: f64 = 0.95;

/// Clamp a raw usage probability into `[PROBABILITY_FLOOR, PROBABILITY_CEILING]`.
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
}

/// Per-category usage probabilities, always within the clamp bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProbabilities([f64; 9]);

impl CategoryProbabilities {
    /// Build from raw values in [`Category::ALL`] order, clamping each.
    pub fn from_raw(raw: [f64; 9]) -> Self {
        Self(raw.map(clamp_probability))
    }

    pub fn get(&self, category: Category) -> f64 {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// One synthetic respondent profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub demographics: Demographics,
    pub anchors: Anchors,
    pub category_probability: CategoryProbabilities,
    /// Dispersion of sampled ratings around the anchors.
    pub response_variance: f64,
}

impl Persona {
    pub fn stakeholder(&self) -> StakeholderType {
        self.demographics.stakeholder()
    }
}

// ─────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────

/// Respondent row. Demographic columns are flattened next to the identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentRecord {
    pub id: Uuid,
    pub stakeholder_type: StakeholderType,
    pub access_code: String,
    #[serde(flatten)]
    pub demographics: Demographics,
}

/// One bounded rating for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingResponse {
    pub section: Section,
    pub item_code: String,
    pub value: u8,
}

/// Usage answer for one tool category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResponse {
    pub category: Category,
    pub uses_category: bool,
    pub selected_tools: Vec<String>,
    pub other_tool: Option<String>,
}

/// A respondent with all of its child rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBundle {
    pub respondent: RespondentRecord,
    pub ratings: Vec<RatingResponse>,
    pub tools: Vec<ToolResponse>,
}

impl ResponseBundle {
    pub fn respondent_id(&self) -> Uuid {
        self.respondent.id
    }

    pub fn stakeholder(&self) -> StakeholderType {
        self.respondent.stakeholder_type
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
