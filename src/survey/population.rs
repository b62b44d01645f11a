//! Persona factory.
//!
//! Each stakeholder plan lists finite attribute pools whose counts sum to the
//! population size. Pools are expanded, shuffled and dealt out index by index,
//! so the realised mix of every attribute matches the target exactly.
//! Anchors and category probabilities are then derived from the dealt
//! attributes plus small per-persona noise.
//!
//! Draw order inside one stakeholder build:
//! 1. shuffle each pool in plan field order
//! 2. per persona: AI context, anchor noise (A, B, C_AR, C_CR), response variance

use tracing::debug;

use crate::error::{Error, Result};

use super::catalog::SurveyCatalog;
use super::rng::SurveyRng;
use super::types::{
    Anchors, CategoryProbabilities, Demographics, ExperienceLevel, FacultyProfile, FacultyRole,
    OrgSize, Persona, PractitionerProfile, StakeholderType, StudentProfile, StudentYear,
    TenureBand,
};

// ─────────────────────────────────────────────────────────────────
// Attribute Pools
// ─────────────────────────────────────────────────────────────────

/// A target mix: each value with the number of personas that receive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool<T> {
    entries: Vec<(T, usize)>,
}

impl<T: Clone> Pool<T> {
    pub fn new(entries: Vec<(T, usize)>) -> Self {
        Self { entries }
    }

    /// Number of values the pool deals out.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn entries(&self) -> &[(T, usize)] {
        &self.entries
    }

    /// Expand in declaration order and shuffle.
    pub fn deal(&self, rng: &mut SurveyRng) -> Vec<T> {
        let mut values: Vec<T> = self
            .entries
            .iter()
            .flat_map(|(v, n)| std::iter::repeat(v.clone()).take(*n))
            .collect();
        rng.shuffle(&mut values);
        values
    }
}

impl Pool<String> {
    fn labels(entries: &[(&str, usize)]) -> Self {
        Self::new(entries.iter().map(|(s, n)| (s.to_string(), *n)).collect())
    }
}

fn check_pool<T: Clone>(
    stakeholder: StakeholderType,
    field: &str,
    pool: &Pool<T>,
    size: usize,
) -> Result<()> {
    let total = pool.total();
    if total != size {
        return Err(Error::pool_mismatch(stakeholder, field, size, total));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Anchor Model
// ─────────────────────────────────────────────────────────────────

/// `base + experience·exp_ordinal + seniority·seniority_ordinal + N(0, noise_sd)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorWeights {
    pub base: f64,
    pub experience: f64,
    pub seniority: f64,
    pub noise_sd: f64,
}

impl AnchorWeights {
    pub const fn new(base: f64, experience: f64, seniority: f64, noise_sd: f64) -> Self {
        Self {
            base,
            experience,
            seniority,
            noise_sd,
        }
    }

    fn sample(&self, experience: f64, seniority: f64, rng: &mut SurveyRng) -> f64 {
        self.base
            + self.experience * experience
            + self.seniority * seniority
            + rng.gaussian(0.0, self.noise_sd)
    }
}

/// Weights for the four anchors of one stakeholder type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorModel {
    pub a: AnchorWeights,
    pub b: AnchorWeights,
    pub c_ar: AnchorWeights,
    pub c_cr: AnchorWeights,
}

impl AnchorModel {
    /// Draws noise for A, B, C_AR, C_CR in that order.
    pub fn sample(&self, experience: f64, seniority: f64, rng: &mut SurveyRng) -> Anchors {
        let a = self.a.sample(experience, seniority, rng);
        let b = self.b.sample(experience, seniority, rng);
        let c_ar = self.c_ar.sample(experience, seniority, rng);
        let c_cr = self.c_cr.sample(experience, seniority, rng);
        Anchors { a, b, c_ar, c_cr }
    }
}

/// Response variance: `base + U(low, high)`, drawn once per persona.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceModel {
    pub base: f64,
    pub low: f64,
    pub high: f64,
}

impl VarianceModel {
    fn sample(&self, rng: &mut SurveyRng) -> f64 {
        self.base + rng.uniform(self.low, self.high)
    }
}

fn bonus(applies: bool, amount: f64) -> f64 {
    if applies {
        amount
    } else {
        0.0
    }
}

fn pick_context(options: &[&'static str], rng: &mut SurveyRng) -> String {
    rng.choose(options).map(|s| s.to_string()).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────
// Students
// ─────────────────────────────────────────────────────────────────

const STUDENT_CONTEXTS: &[&str] = &["Coursework", "Labs", "Projects", "Internships", "Personal learning"];
const STUDENT_CONTEXTS_EARLY: &[&str] = &["Coursework", "Labs", "Personal learning"];
const STUDENT_CONTEXTS_GRADUATE: &[&str] = &["Projects", "Internships", "Personal learning"];

#[derive(Debug, Clone)]
pub struct StudentPlan {
    pub size: usize,
    pub majors: Pool<String>,
    pub years: Pool<StudentYear>,
    pub institutions: Pool<String>,
    pub experience: Pool<ExperienceLevel>,
    pub anchors: AnchorModel,
    pub variance: VarianceModel,
}

impl StudentPlan {
    /// 40 students calibrated on Midwest engineering enrollment.
    pub fn standard() -> Self {
        Self {
            size: 40,
            majors: Pool::labels(&[
                ("Mechanical Engineering", 12),
                ("Electrical & Computer Engineering", 8),
                ("Aerospace Engineering", 4),
                ("Civil Engineering", 3),
                ("Industrial Engineering", 3),
                ("Chemical Engineering", 2),
                ("Biomedical Engineering", 3),
                ("Materials Science & Engineering", 2),
                ("Environmental Engineering", 1),
                ("Computer Science (Engineering track)", 2),
            ]),
            years: Pool::new(vec![
                (StudentYear::Freshman, 4),
                (StudentYear::Sophomore, 8),
                (StudentYear::Junior, 12),
                (StudentYear::Senior, 12),
                (StudentYear::Graduate, 4),
            ]),
            institutions: Pool::labels(&[
                ("Purdue University", 8),
                ("Ohio State University", 6),
                ("University of Michigan", 4),
                ("University of Illinois", 4),
                ("Iowa State University", 3),
                ("University of Minnesota", 2),
                ("University of Wisconsin-Madison", 2),
                ("Missouri S&T", 2),
                ("Rose-Hulman Institute", 2),
                ("Milwaukee School of Engineering", 2),
                ("University of Cincinnati", 2),
                ("University of Iowa", 1),
                ("Michigan State University", 2),
            ]),
            experience: Pool::new(vec![
                (ExperienceLevel::None, 6),
                (ExperienceLevel::Limited, 14),
                (ExperienceLevel::Moderate, 14),
                (ExperienceLevel::Extensive, 6),
            ]),
            anchors: AnchorModel {
                a: AnchorWeights::new(4.2, 0.4, 0.15, 0.3),
                b: AnchorWeights::new(4.0, 0.3, 0.1, 0.3),
                c_ar: AnchorWeights::new(3.8, 0.5, 0.15, 0.4),
                c_cr: AnchorWeights::new(4.5, 0.3, 0.1, 0.3),
            },
            variance: VarianceModel {
                base: 0.9,
                low: -0.2,
                high: 0.2,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let st = StakeholderType::Student;
        check_pool(st, "majors", &self.majors, self.size)?;
        check_pool(st, "years", &self.years, self.size)?;
        check_pool(st, "institutions", &self.institutions, self.size)?;
        check_pool(st, "experience", &self.experience, self.size)
    }

    pub fn build(&self, rng: &mut SurveyRng) -> Vec<Persona> {
        let majors = self.majors.deal(rng);
        let years = self.years.deal(rng);
        let institutions = self.institutions.deal(rng);
        let experience = self.experience.deal(rng);

        let mut personas = Vec::with_capacity(self.size);
        for i in 0..self.size {
            let year = years[i];
            let context_options = match year {
                StudentYear::Freshman | StudentYear::Sophomore => STUDENT_CONTEXTS_EARLY,
                StudentYear::Graduate => STUDENT_CONTEXTS_GRADUATE,
                _ => STUDENT_CONTEXTS,
            };
            let ai_context = pick_context(context_options, rng);

            let profile = StudentProfile {
                institution: institutions[i].clone(),
                major: majors[i].clone(),
                year,
                experience: experience[i],
                ai_context,
            };
            let exp = profile.experience.ordinal();
            let anchors = self.anchors.sample(exp, year.ordinal(), rng);
            let category_probability = student_probabilities(&profile);
            let response_variance = self.variance.sample(rng);

            personas.push(Persona {
                demographics: Demographics::Student(profile),
                anchors,
                category_probability,
                response_variance,
            });
        }
        personas
    }
}

/// Computing majors lean toward ML/DL/CV; mechanical and aerospace toward
/// design and robotics tooling.
pub fn student_probabilities(profile: &StudentProfile) -> CategoryProbabilities {
    let e = profile.experience.ordinal();
    let cs_ee = profile.major.contains("Computer") || profile.major.contains("Electrical");
    let me_aero = profile.major.contains("Mechanical") || profile.major.contains("Aerospace");

    CategoryProbabilities::from_raw([
        0.15 + 0.2 * e + bonus(cs_ee, 0.2),
        0.05 + 0.15 * e + bonus(cs_ee, 0.2),
        0.3 + 0.15 * e,
        0.05 + 0.1 * e + bonus(cs_ee, 0.15),
        0.5 + 0.12 * e,
        0.02 + 0.05 * e,
        0.1 + 0.1 * e + bonus(me_aero, 0.25),
        0.05 + 0.08 * e + bonus(me_aero, 0.15),
        0.02 + 0.03 * e,
    ])
}

// ─────────────────────────────────────────────────────────────────
// Faculty
// ─────────────────────────────────────────────────────────────────

const FACULTY_CONTEXTS: &[&str] = &[
    "Teaching",
    "Research",
    "Assessment",
    "Administration",
    "Personal productivity",
];
const FACULTY_CONTEXTS_RESEARCH: &[&str] = &["Research", "Personal productivity"];
const FACULTY_CONTEXTS_TEACHING: &[&str] = &["Teaching", "Assessment"];

#[derive(Debug, Clone)]
pub struct FacultyPlan {
    pub size: usize,
    pub disciplines: Pool<String>,
    pub years: Pool<TenureBand>,
    pub roles: Pool<FacultyRole>,
    pub institution_types: Pool<String>,
    pub institutions: Pool<String>,
    pub experience: Pool<ExperienceLevel>,
    pub anchors: AnchorModel,
    pub variance: VarianceModel,
}

impl FacultyPlan {
    /// 30 faculty across research-intensive and teaching-focused schools.
    pub fn standard() -> Self {
        Self {
            size: 30,
            disciplines: Pool::labels(&[
                ("Mechanical Engineering", 7),
                ("Electrical & Computer Engineering", 6),
                ("Civil Engineering", 4),
                ("Industrial Engineering", 4),
                ("Chemical Engineering", 3),
                ("Biomedical Engineering", 3),
                ("General Engineering / Engineering Education", 3),
            ]),
            years: standard_tenure(),
            roles: Pool::new(vec![
                (FacultyRole::Teaching, 10),
                (FacultyRole::Research, 8),
                (FacultyRole::Combination, 10),
                (FacultyRole::Administration, 2),
            ]),
            institution_types: Pool::labels(&[("R1", 15), ("R2", 8), ("Teaching-focused", 7)]),
            institutions: Pool::labels(&[
                ("Purdue University", 6),
                ("Ohio State University", 4),
                ("University of Michigan", 3),
                ("University of Illinois", 3),
                ("Iowa State University", 3),
                ("University of Minnesota", 2),
                ("University of Wisconsin-Madison", 2),
                ("Rose-Hulman Institute", 2),
                ("Missouri S&T", 2),
                ("Milwaukee School of Engineering", 1),
                ("University of Cincinnati", 1),
                ("Michigan State University", 1),
            ]),
            experience: Pool::new(vec![
                (ExperienceLevel::None, 3),
                (ExperienceLevel::Limited, 9),
                (ExperienceLevel::Moderate, 12),
                (ExperienceLevel::Extensive, 6),
            ]),
            anchors: AnchorModel {
                a: AnchorWeights::new(4.8, 0.3, 0.1, 0.3),
                b: AnchorWeights::new(4.5, 0.2, 0.15, 0.3),
                c_ar: AnchorWeights::new(4.0, 0.4, 0.1, 0.4),
                c_cr: AnchorWeights::new(4.3, 0.3, 0.05, 0.35),
            },
            variance: VarianceModel {
                base: 0.85,
                low: -0.15,
                high: 0.2,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let st = StakeholderType::Faculty;
        check_pool(st, "disciplines", &self.disciplines, self.size)?;
        check_pool(st, "years", &self.years, self.size)?;
        check_pool(st, "roles", &self.roles, self.size)?;
        check_pool(st, "institution_types", &self.institution_types, self.size)?;
        check_pool(st, "institutions", &self.institutions, self.size)?;
        check_pool(st, "experience", &self.experience, self.size)
    }

    pub fn build(&self, rng: &mut SurveyRng) -> Vec<Persona> {
        let disciplines = self.disciplines.deal(rng);
        let years = self.years.deal(rng);
        let roles = self.roles.deal(rng);
        let institution_types = self.institution_types.deal(rng);
        let institutions = self.institutions.deal(rng);
        let experience = self.experience.deal(rng);

        let mut personas = Vec::with_capacity(self.size);
        for i in 0..self.size {
            let role = roles[i];
            let context_options = match role {
                FacultyRole::Research => FACULTY_CONTEXTS_RESEARCH,
                FacultyRole::Teaching => FACULTY_CONTEXTS_TEACHING,
                _ => FACULTY_CONTEXTS,
            };
            let ai_context = pick_context(context_options, rng);

            let profile = FacultyProfile {
                institution: institutions[i].clone(),
                discipline: disciplines[i].clone(),
                years: years[i],
                role,
                institution_type: institution_types[i].clone(),
                experience: experience[i],
                ai_context,
            };
            let exp = profile.experience.ordinal();
            let anchors = self.anchors.sample(exp, profile.years.ordinal(), rng);
            let category_probability = faculty_probabilities(&profile);
            let response_variance = self.variance.sample(rng);

            personas.push(Persona {
                demographics: Demographics::Faculty(profile),
                anchors,
                category_probability,
                response_variance,
            });
        }
        personas
    }
}

pub fn faculty_probabilities(profile: &FacultyProfile) -> CategoryProbabilities {
    let e = profile.experience.ordinal();
    let cs_ee = profile.discipline.contains("Computer") || profile.discipline.contains("Electrical");
    let eng_ed = profile.discipline.contains("General") || profile.discipline.contains("Education");

    CategoryProbabilities::from_raw([
        0.2 + 0.2 * e + bonus(cs_ee, 0.2),
        0.1 + 0.15 * e + bonus(cs_ee, 0.2),
        0.4 + 0.15 * e,
        0.1 + 0.1 * e + bonus(cs_ee, 0.2),
        0.6 + 0.1 * e,
        0.05 + 0.08 * e + bonus(eng_ed, 0.15),
        0.15 + 0.12 * e,
        0.08 + 0.1 * e,
        0.05 + 0.05 * e,
    ])
}

// ─────────────────────────────────────────────────────────────────
// Practitioners
// ─────────────────────────────────────────────────────────────────

const PRACTITIONER_CONTEXTS: &[&str] = &[
    "Engineering design",
    "Analysis/simulation",
    "Project management",
    "Decision support",
];

#[derive(Debug, Clone)]
pub struct PractitionerPlan {
    pub size: usize,
    pub disciplines: Pool<String>,
    pub years: Pool<TenureBand>,
    pub roles: Pool<String>,
    pub industries: Pool<String>,
    pub org_sizes: Pool<OrgSize>,
    pub companies: Pool<String>,
    pub experience: Pool<ExperienceLevel>,
    pub anchors: AnchorModel,
    pub variance: VarianceModel,
}

impl PractitionerPlan {
    /// 30 practitioners from employers that hire the surveyed graduates.
    pub fn standard() -> Self {
        Self {
            size: 30,
            disciplines: Pool::labels(&[
                ("Mechanical Engineering", 7),
                ("Electrical & Computer Engineering", 6),
                ("Civil Engineering", 5),
                ("Industrial & Systems Engineering", 4),
                ("Chemical Engineering", 3),
                ("Software / Systems Engineering", 3),
                ("Aerospace Engineering", 2),
            ]),
            years: standard_tenure(),
            roles: Pool::labels(&[
                ("Engineer", 12),
                ("Technical Lead", 7),
                ("Manager", 6),
                ("Hiring Manager", 5),
            ]),
            industries: Pool::labels(&[
                ("Automotive", 4),
                ("Aerospace & Defense", 3),
                ("Manufacturing", 4),
                ("Energy & Utilities", 2),
                ("Technology / Software", 3),
                ("Construction & Infrastructure", 2),
                ("Biotechnology / Medical Devices", 2),
                ("Engineering Consulting", 2),
                ("Semiconductor / Electronics", 2),
                ("Consumer Products", 2),
                ("Telecommunications", 1),
                ("Oil & Gas", 1),
                ("Robotics / Automation", 1),
                ("Chemical Processing", 1),
            ]),
            org_sizes: Pool::new(vec![
                (OrgSize::Small, 5),
                (OrgSize::Medium, 8),
                (OrgSize::Large, 9),
                (OrgSize::Enterprise, 8),
            ]),
            companies: Pool::labels(&[
                ("Caterpillar", 3),
                ("John Deere", 3),
                ("Raytheon", 2),
                ("Lockheed Martin", 2),
                ("General Motors", 2),
                ("Ford Motor Company", 2),
                ("Tesla", 2),
                ("Intel", 2),
                ("Texas Instruments", 1),
                ("Procter & Gamble", 1),
                ("Dow Chemical", 1),
                ("Rolls-Royce", 1),
                ("Honeywell", 2),
                ("Cummins", 2),
                ("Amazon Robotics", 1),
                ("Boston Scientific", 1),
                ("Medtronic", 1),
                ("AECOM", 1),
            ]),
            experience: Pool::new(vec![
                (ExperienceLevel::None, 2),
                (ExperienceLevel::Limited, 7),
                (ExperienceLevel::Moderate, 13),
                (ExperienceLevel::Extensive, 8),
            ]),
            // Practitioners judge graduates' readiness (C_AR) below how
            // students rate themselves.
            anchors: AnchorModel {
                a: AnchorWeights::new(5.0, 0.25, 0.1, 0.3),
                b: AnchorWeights::new(4.3, 0.2, 0.1, 0.35),
                c_ar: AnchorWeights::new(3.5, 0.15, 0.05, 0.4),
                c_cr: AnchorWeights::new(3.8, 0.2, 0.1, 0.35),
            },
            variance: VarianceModel {
                base: 0.9,
                low: -0.15,
                high: 0.2,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let st = StakeholderType::Practitioner;
        check_pool(st, "disciplines", &self.disciplines, self.size)?;
        check_pool(st, "years", &self.years, self.size)?;
        check_pool(st, "roles", &self.roles, self.size)?;
        check_pool(st, "industries", &self.industries, self.size)?;
        check_pool(st, "org_sizes", &self.org_sizes, self.size)?;
        check_pool(st, "companies", &self.companies, self.size)?;
        check_pool(st, "experience", &self.experience, self.size)
    }

    pub fn build(&self, rng: &mut SurveyRng) -> Vec<Persona> {
        let disciplines = self.disciplines.deal(rng);
        let years = self.years.deal(rng);
        let roles = self.roles.deal(rng);
        let industries = self.industries.deal(rng);
        let org_sizes = self.org_sizes.deal(rng);
        let companies = self.companies.deal(rng);
        let experience = self.experience.deal(rng);

        let mut personas = Vec::with_capacity(self.size);
        for i in 0..self.size {
            let ai_context = pick_context(PRACTITIONER_CONTEXTS, rng);

            let profile = PractitionerProfile {
                company: companies[i].clone(),
                discipline: disciplines[i].clone(),
                years: years[i],
                role: roles[i].clone(),
                industry: industries[i].clone(),
                org_size: org_sizes[i],
                experience: experience[i],
                ai_context,
            };
            let exp = profile.experience.ordinal();
            let anchors = self.anchors.sample(exp, profile.years.ordinal(), rng);
            let category_probability = practitioner_probabilities(&profile);
            let response_variance = self.variance.sample(rng);

            personas.push(Persona {
                demographics: Demographics::Practitioner(profile),
                anchors,
                category_probability,
                response_variance,
            });
        }
        personas
    }
}

/// Software-heavy disciplines and tech-sector employers lean toward ML/DL;
/// organizations of 1,000+ toward recommender and expert systems.
pub fn practitioner_probabilities(profile: &PractitionerProfile) -> CategoryProbabilities {
    let e = profile.experience.ordinal();
    let tech = profile.discipline.contains("Software")
        || profile.discipline.contains("Computer")
        || profile.industry.contains("Technology");
    let large = profile.org_size.is_large();

    CategoryProbabilities::from_raw([
        0.3 + 0.15 * e + bonus(tech, 0.15),
        0.15 + 0.15 * e + bonus(tech, 0.2),
        0.5 + 0.12 * e,
        0.15 + 0.1 * e,
        0.7 + 0.08 * e,
        0.15 + 0.1 * e + bonus(large, 0.1),
        0.35 + 0.12 * e,
        0.1 + 0.1 * e,
        0.1 + 0.08 * e + bonus(large, 0.1),
    ])
}

fn standard_tenure() -> Pool<TenureBand> {
    Pool::new(vec![
        (TenureBand::UpToFive, 8),
        (TenureBand::SixToTen, 8),
        (TenureBand::ElevenToTwenty, 8),
        (TenureBand::TwentyOnePlus, 6),
    ])
}

// ─────────────────────────────────────────────────────────────────
// Generation Plan
// ─────────────────────────────────────────────────────────────────

/// Everything the factory needs for one run.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub students: StudentPlan,
    pub faculty: FacultyPlan,
    pub practitioners: PractitionerPlan,
}

impl GenerationPlan {
    pub fn standard() -> Self {
        Self {
            students: StudentPlan::standard(),
            faculty: FacultyPlan::standard(),
            practitioners: PractitionerPlan::standard(),
        }
    }

    pub fn size_of(&self, stakeholder: StakeholderType) -> usize {
        match stakeholder {
            StakeholderType::Student => self.students.size,
            StakeholderType::Faculty => self.faculty.size,
            StakeholderType::Practitioner => self.practitioners.size,
        }
    }

    pub fn total_size(&self) -> usize {
        StakeholderType::all().iter().map(|s| self.size_of(*s)).sum()
    }

    /// Check every precondition of a run. Makes no random draws.
    pub fn validate(&self, catalog: &SurveyCatalog) -> Result<()> {
        if self.total_size() == 0 {
            return Err(Error::InvalidPlan("population is empty".into()));
        }
        self.students.validate()?;
        self.faculty.validate()?;
        self.practitioners.validate()?;
        catalog.validate()
    }

    /// Build one stakeholder population.
    pub fn build(&self, stakeholder: StakeholderType, rng: &mut SurveyRng) -> Vec<Persona> {
        let personas = match stakeholder {
            StakeholderType::Student => self.students.build(rng),
            StakeholderType::Faculty => self.faculty.build(rng),
            StakeholderType::Practitioner => self.practitioners.build(rng),
        };
        debug!(stakeholder = %stakeholder, count = personas.len(), "Built personas");
        personas
    }

    /// Build all populations: students, then faculty, then practitioners.
    pub fn build_all(&self, rng: &mut SurveyRng) -> Vec<Persona> {
        let mut all = Vec::with_capacity(self.total_size());
        for &stakeholder in StakeholderType::all() {
            all.extend(self.build(stakeholder, rng));
        }
        all
    }
}

impl Default for GenerationPlan {
    fn default() -> Self {
        Self::standard()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
