//! Item catalog: which rating items and tool lists apply to each stakeholder.
//!
//! Items are grouped into constructs; a construct id is also the item-code
//! prefix (`PU-L1` belongs to `PU-L`). Section A is identical for every
//! stakeholder type, sections B and C differ:
//!
//! | Stakeholder  | A  | B  | C  |
//! |--------------|----|----|----|
//! | student      | 15 | 21 | 9  |
//! | faculty      | 15 | 22 | 13 |
//! | practitioner | 15 | 21 | 13 |

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::types::{Category, Section, StakeholderType};

// ─────────────────────────────────────────────────────────────────
// Static Item Definitions
// ─────────────────────────────────────────────────────────────────

type ConstructDef = (&'static str, &'static [&'static str]);

const SECTION_A: &[ConstructDef] = &[
    ("PU-L", &["PU-L1", "PU-L2", "PU-L3", "PU-L4"]),
    ("PU-E", &["PU-E1", "PU-E2"]),
    ("PEU", &["PEU1", "PEU2", "PEU3"]),
    ("EJ", &["EJ1", "EJ2", "EJ3"]),
    ("BI", &["BI1", "BI2", "BI3"]),
];

const SECTION_B_FACULTY: &[ConstructDef] = &[
    ("MU", &["MU1", "MU2", "MU3", "MU4"]),
    ("LP", &["LP1", "LP2", "LP3"]),
    ("GB", &["GB1", "GB2", "GB3", "GB4"]),
    ("OA", &["OA1", "OA2", "OA3", "OA4"]),
    ("EV", &["EV1", "EV2", "EV3"]),
    ("ET", &["ET1", "ET2", "ET3", "ET4"]),
];

// Students and practitioners answer three guardrail items, not four.
const SECTION_B_SHORT: &[ConstructDef] = &[
    ("MU", &["MU1", "MU2", "MU3", "MU4"]),
    ("LP", &["LP1", "LP2", "LP3"]),
    ("GB", &["GB1", "GB2", "GB3"]),
    ("OA", &["OA1", "OA2", "OA3", "OA4"]),
    ("EV", &["EV1", "EV2", "EV3"]),
    ("ET", &["ET1", "ET2", "ET3", "ET4"]),
];

const SECTION_C_STUDENT: &[ConstructDef] = &[
    ("AR", &["AR1", "AR2", "AR3", "AR4"]),
    ("CR", &["CR1", "CR2", "CR3", "CR4", "CR5"]),
];

const SECTION_C_FULL: &[ConstructDef] = &[
    ("AR", &["AR1", "AR2", "AR3", "AR4", "AR5", "AR6", "AR7", "AR8"]),
    ("CR", &["CR1", "CR2", "CR3", "CR4", "CR5"]),
];

/// Display names for construct ids.
const CONSTRUCT_NAMES: &[(&str, &str)] = &[
    ("PU-L", "Perceived Usefulness—Learning"),
    ("PU-E", "Perceived Usefulness—Efficiency"),
    ("PEU", "Perceived Ease of Use/Integration"),
    ("EJ", "Epistemic Judgment"),
    ("BI", "Behavioral Intention"),
    ("MU", "Modes of AI Use"),
    ("LP", "Learning/Workflow Placement"),
    ("GB", "Guardrails & Boundaries"),
    ("OA", "Ownership & Accountability"),
    ("EV", "Evaluation & Verification"),
    ("ET", "Ethics & Responsible Use"),
    ("AR", "AI Readiness"),
    ("CR", "Career/Workforce Readiness"),
];

// ─────────────────────────────────────────────────────────────────
// Static Tool Definitions
// ─────────────────────────────────────────────────────────────────

fn standard_tools(stakeholder: StakeholderType, category: Category) -> &'static [&'static str] {
    use Category::*;
    use StakeholderType::*;

    match (stakeholder, category) {
        (Faculty, MachineLearning) => &[
            "Scikit-learn",
            "TensorFlow / PyTorch",
            "MATLAB Machine Learning Toolbox",
            "R (caret / tidymodels)",
            "Google Colab / Jupyter (for ML)",
            "Azure Machine Learning",
            "Orange Data Mining",
        ],
        (Faculty, DeepLearning) => &["TensorFlow / Keras", "PyTorch", "ONNX", "MATLAB Deep Learning Toolbox"],
        (Faculty, LanguageProcessing) => &[
            "ChatGPT",
            "Claude",
            "Google Gemini",
            "Google Vertex AI (LLMs)",
            "Azure OpenAI Service",
            "spaCy / NLTK",
            "BERT-based tools",
            "Grammarly",
        ],
        (Faculty, Recommender) => &[
            "IBM Watson",
            "Azure AI Services",
            "Google Recommendation AI",
            "Learning analytics platforms (e.g., LMS-embedded)",
            "Adaptive learning systems",
        ],
        (Faculty, Robotics) | (Student, Robotics) => &[
            "ROS / ROS2",
            "Gazebo",
            "NVIDIA Isaac",
            "TurtleBot",
            "PX4 Autopilot",
            "Educational platforms (e.g., LEGO, VEX, Arduino AI kits)",
        ],
        (Faculty, Expert) => &["Drools", "CLIPS", "Prolog-based systems", "Rules engines used in coursework"],

        (Student, MachineLearning) => &[
            "Scikit-learn",
            "TensorFlow / PyTorch",
            "MATLAB Machine Learning Toolbox",
            "Google Colab / Jupyter (for ML)",
            "Orange Data Mining",
            "Weka / RapidMiner",
        ],
        (Student, DeepLearning) => &[
            "TensorFlow / Keras",
            "PyTorch",
            "MATLAB Deep Learning Toolbox",
            "Google Colab / Jupyter (for DL)",
        ],
        (Student, LanguageProcessing) => &[
            "ChatGPT",
            "Claude",
            "Google Gemini",
            "Google Vertex AI (LLMs)",
            "Grammarly",
            "spaCy / NLTK",
            "BERT-based tools",
        ],
        (Student, Recommender) => &["IBM Watson", "Azure AI Services", "Google Recommendation AI"],
        (Student, Expert) => &["CLIPS", "Prolog-based systems", "Rules engines used in coursework"],

        (Student, ComputerVision) | (Faculty, ComputerVision) => &[
            "OpenCV",
            "YOLO",
            "TensorFlow Vision Models",
            "MATLAB Computer Vision Toolbox",
            "ImageJ / Fiji",
        ],
        (Student, Generative) | (Faculty, Generative) => &[
            "ChatGPT",
            "Claude",
            "Google Gemini",
            "GitHub Copilot",
            "DALL·E / Stable Diffusion / Midjourney",
        ],
        (Student, EngDesign) | (Faculty, EngDesign) => &[
            "ANSYS (AI/ML features)",
            "Autodesk Fusion (AI features)",
            "Siemens NX (AI features)",
            "MATLAB/Simulink AI tools",
            "Digital twin platforms",
        ],

        (Practitioner, MachineLearning) => &[
            "Scikit-learn",
            "TensorFlow / PyTorch",
            "MATLAB Machine Learning Toolbox",
            "SAS",
            "Azure Machine Learning",
            "DataRobot / H2O.ai",
        ],
        (Practitioner, DeepLearning) => &["TensorFlow / Keras", "PyTorch", "ONNX", "MATLAB Deep Learning Toolbox"],
        (Practitioner, LanguageProcessing) => &[
            "ChatGPT (Enterprise)",
            "Claude (Enterprise)",
            "Google Gemini (Enterprise)",
            "Azure OpenAI Service",
            "Amazon Bedrock",
            "Google Vertex AI (LLMs)",
            "spaCy",
            "BERT-based systems",
        ],
        (Practitioner, ComputerVision) => &[
            "OpenCV",
            "YOLO",
            "TensorFlow Vision Models",
            "MATLAB Computer Vision Toolbox",
            "ImageJ / Fiji",
            "Cognex Vision",
            "NVIDIA Metropolis",
        ],
        (Practitioner, Generative) => &[
            "ChatGPT (Enterprise)",
            "Claude (Enterprise)",
            "Google Gemini (Enterprise)",
            "GitHub Copilot (Enterprise)",
            "DALL·E / Stable Diffusion / Midjourney (Enterprise)",
        ],
        (Practitioner, Recommender) => &[
            "IBM Watson",
            "Azure AI Services",
            "Salesforce Einstein",
            "SAP AI",
            "ServiceNow AI",
        ],
        (Practitioner, EngDesign) => &[
            "ANSYS (AI/ML features)",
            "Autodesk Fusion (AI features)",
            "Siemens NX / Teamcenter (AI features)",
            "Dassault Systèmes (AI features)",
            "MATLAB/Simulink AI tools",
            "Digital twin platforms (e.g., Azure Digital Twins)",
        ],
        (Practitioner, Robotics) => &[
            "ROS / ROS2",
            "Gazebo",
            "NVIDIA Isaac",
            "PX4 Autopilot",
            "Industrial robot AI controllers",
            "Autonomous inspection platforms",
        ],
        (Practitioner, Expert) => &[
            "Drools",
            "CLIPS",
            "Prolog-based systems",
            "Rules engines embedded in PLM/ERP",
        ],
    }
}

// ─────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────

/// A named group of items sharing an item-code prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construct {
    pub id: String,
    pub items: Vec<String>,
}

impl Construct {
    fn from_def((id, items): &ConstructDef) -> Self {
        Self {
            id: id.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Rating items per (stakeholder, section) and tools per (stakeholder, category).
#[derive(Debug, Clone)]
pub struct SurveyCatalog {
    sections: HashMap<(StakeholderType, Section), Vec<Construct>>,
    tools: HashMap<(StakeholderType, Category), Vec<String>>,
}

impl SurveyCatalog {
    /// The survey as fielded.
    pub fn standard() -> Self {
        let mut sections = HashMap::new();
        let mut tools = HashMap::new();

        for &stakeholder in StakeholderType::all() {
            let (b, c) = match stakeholder {
                StakeholderType::Student => (SECTION_B_SHORT, SECTION_C_STUDENT),
                StakeholderType::Faculty => (SECTION_B_FACULTY, SECTION_C_FULL),
                StakeholderType::Practitioner => (SECTION_B_SHORT, SECTION_C_FULL),
            };
            for (section, defs) in [(Section::A, SECTION_A), (Section::B, b), (Section::C, c)] {
                sections.insert(
                    (stakeholder, section),
                    defs.iter().map(Construct::from_def).collect(),
                );
            }
            for category in Category::ALL {
                tools.insert(
                    (stakeholder, category),
                    standard_tools(stakeholder, category)
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                );
            }
        }

        Self { sections, tools }
    }

    /// Replace the constructs of one section.
    pub fn with_section(
        mut self,
        stakeholder: StakeholderType,
        section: Section,
        constructs: Vec<Construct>,
    ) -> Self {
        self.sections.insert((stakeholder, section), constructs);
        self
    }

    /// Replace the tool list of one category.
    pub fn with_tools(
        mut self,
        stakeholder: StakeholderType,
        category: Category,
        tools: Vec<String>,
    ) -> Self {
        self.tools.insert((stakeholder, category), tools);
        self
    }

    pub fn constructs(&self, stakeholder: StakeholderType, section: Section) -> &[Construct] {
        self.sections
            .get(&(stakeholder, section))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Item codes of a section in catalog order.
    pub fn items(&self, stakeholder: StakeholderType, section: Section) -> Vec<&str> {
        self.constructs(stakeholder, section)
            .iter()
            .flat_map(|c| c.items.iter().map(String::as_str))
            .collect()
    }

    pub fn item_count(&self, stakeholder: StakeholderType, section: Section) -> usize {
        self.constructs(stakeholder, section)
            .iter()
            .map(|c| c.items.len())
            .sum()
    }

    /// Total rating items a respondent of this type answers.
    pub fn total_items(&self, stakeholder: StakeholderType) -> usize {
        Section::all()
            .iter()
            .map(|s| self.item_count(stakeholder, *s))
            .sum()
    }

    /// Tool list for a category. Empty when none is configured.
    pub fn tools(&self, stakeholder: StakeholderType, category: Category) -> &[String] {
        self.tools
            .get(&(stakeholder, category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Construct ids across all stakeholders, first-seen order.
    pub fn construct_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for &stakeholder in StakeholderType::all() {
            for &section in Section::all() {
                for construct in self.constructs(stakeholder, section) {
                    if !ids.contains(&construct.id.as_str()) {
                        ids.push(&construct.id);
                    }
                }
            }
        }
        ids
    }

    /// Check that every section has items and no section repeats a code.
    ///
    /// Empty tool lists are allowed; the category is then reported unused.
    pub fn validate(&self) -> Result<()> {
        for &stakeholder in StakeholderType::all() {
            for &section in Section::all() {
                let items = self.items(stakeholder, section);
                if items.is_empty() {
                    return Err(Error::EmptyItemCatalog {
                        stakeholder: stakeholder.to_string(),
                        section: section.to_string(),
                    });
                }
                let mut seen = std::collections::HashSet::new();
                for code in &items {
                    if !seen.insert(*code) {
                        return Err(Error::InvalidPlan(format!(
                            "item {} appears twice in section {} for {}",
                            code, section, stakeholder
                        )));
                    }
                }
            }
            for category in Category::ALL {
                let tools = self.tools(stakeholder, category);
                let unique: std::collections::HashSet<&String> = tools.iter().collect();
                if unique.len() != tools.len() {
                    return Err(Error::InvalidPlan(format!(
                        "duplicate tool in {} catalog for {}",
                        category, stakeholder
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SurveyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Display name of a construct id, if known.
pub fn construct_name(id: &str) -> Option<&'static str> {
    CONSTRUCT_NAMES
        .iter()
        .find(|(cid, _)| *cid == id)
        .map(|(_, name)| *name)
}

/// Construct id an item code belongs to: the code with trailing digits removed.
pub fn construct_of(item_code: &str) -> &str {
    item_code.trim_end_matches(|c: char| c.is_ascii_digit())
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_cardinality() {
        let catalog = SurveyCatalog::standard();
        let expected = [
            (StakeholderType::Student, [15, 21, 9]),
            (StakeholderType::Faculty, [15, 22, 13]),
            (StakeholderType::Practitioner, [15, 21, 13]),
        ];
        for (stakeholder, counts) in expected {
            for (section, count) in Section::all().iter().zip(counts) {
                assert_eq!(
                    catalog.item_count(stakeholder, *section),
                    count,
                    "{} section {}",
                    stakeholder,
                    section
                );
            }
        }
        assert_eq!(catalog.total_items(StakeholderType::Student), 45);
        assert_eq!(catalog.total_items(StakeholderType::Faculty), 50);
        assert_eq!(catalog.total_items(StakeholderType::Practitioner), 49);
    }

    #[test]
    fn test_section_a_shared() {
        let catalog = SurveyCatalog::standard();
        let student = catalog.items(StakeholderType::Student, Section::A);
        assert_eq!(student, catalog.items(StakeholderType::Faculty, Section::A));
        assert_eq!(student, catalog.items(StakeholderType::Practitioner, Section::A));
        assert_eq!(student[0], "PU-L1");
    }

    #[test]
    fn test_faculty_has_fourth_guardrail_item() {
        let catalog = SurveyCatalog::standard();
        assert!(catalog.items(StakeholderType::Faculty, Section::B).contains(&"GB4"));
        assert!(!catalog.items(StakeholderType::Student, Section::B).contains(&"GB4"));
        assert!(!catalog.items(StakeholderType::Practitioner, Section::B).contains(&"GB4"));
    }

    #[test]
    fn test_tool_catalog_sizes() {
        let catalog = SurveyCatalog::standard();
        assert_eq!(catalog.tools(StakeholderType::Faculty, Category::MachineLearning).len(), 7);
        assert_eq!(catalog.tools(StakeholderType::Student, Category::Recommender).len(), 3);
        assert_eq!(catalog.tools(StakeholderType::Practitioner, Category::LanguageProcessing).len(), 8);
        for &s in StakeholderType::all() {
            for c in Category::ALL {
                assert!(!catalog.tools(s, c).is_empty(), "{} {}", s, c);
            }
        }
    }

    #[test]
    fn test_standard_catalog_validates() {
        assert!(SurveyCatalog::standard().validate().is_ok());
    }

    #[test]
    fn test_empty_section_rejected() {
        let catalog = SurveyCatalog::standard().with_section(
            StakeholderType::Faculty,
            Section::C,
            vec![],
        );
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, Error::EmptyItemCatalog { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_tool_list_allowed() {
        let catalog = SurveyCatalog::standard().with_tools(
            StakeholderType::Student,
            Category::Expert,
            vec![],
        );
        assert!(catalog.validate().is_ok());
        assert!(catalog.tools(StakeholderType::Student, Category::Expert).is_empty());
    }

    #[test]
    fn test_construct_helpers() {
        assert_eq!(construct_of("PU-L3"), "PU-L");
        assert_eq!(construct_of("CR5"), "CR");
        assert_eq!(construct_name("EJ"), Some("Epistemic Judgment"));
        assert_eq!(construct_name("XX"), None);

        let catalog = SurveyCatalog::standard();
        let ids = catalog.construct_ids();
        assert_eq!(ids.len(), 13);
        assert_eq!(ids[0], "PU-L");
        assert_eq!(ids[12], "CR");
    }
}
