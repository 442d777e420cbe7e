//! Occupational taxonomy: ISCO-style skill tiers and the specialisations
//! that map onto them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse skill tier. Ordering follows the tier number, so
/// `Skill::Managers > Skill::ElementaryOccupations`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    ElementaryOccupations = 1,
    PlantAndMachineOperatorsAndAssemblers = 2,
    CraftAndRelatedTradesWorkers = 3,
    SkilledAgriculturalForestryAndFisheryWorkers = 4,
    ServiceAndSalesWorkers = 5,
    ClericalSupportWorkers = 6,
    TechniciansAndAssociateProfessionals = 7,
    Professionals = 8,
    Managers = 9,
}

impl Skill {
    pub const ALL: [Skill; 9] = [
        Skill::ElementaryOccupations,
        Skill::PlantAndMachineOperatorsAndAssemblers,
        Skill::CraftAndRelatedTradesWorkers,
        Skill::SkilledAgriculturalForestryAndFisheryWorkers,
        Skill::ServiceAndSalesWorkers,
        Skill::ClericalSupportWorkers,
        Skill::TechniciansAndAssociateProfessionals,
        Skill::Professionals,
        Skill::Managers,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Skill> {
        Skill::ALL.iter().copied().find(|s| s.level() == level)
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Skill {
    type Err = String;

    /// Accepts either the variant name or the tier number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(level) = s.parse::<u8>() {
            return Skill::from_level(level).ok_or_else(|| format!("no skill tier {level}"));
        }
        Skill::ALL
            .iter()
            .copied()
            .find(|skill| skill.to_string() == s)
            .ok_or_else(|| format!("unknown skill '{s}'"))
    }
}

/// Fine-grained occupational tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Specialisation {
    ChiefExecutive,
    AdministrativeManager,
    SpecialisedManager,

    EngineeringProfessional,
    HealthProfessional,
    TeachingProfessional,
    BusinessProfessional,
    IctProfessional,
    LegalProfessional,

    EngineeringAssociate,
    HealthAssociate,
    BusinessAssociate,
    LegalAssociate,
    IctTechnician,

    GeneralClerk,
    CustomerServicesClerk,
    RecordingClerk,
    OtherClericalWorker,

    PersonalServiceWorker,
    SalesWorker,
    CareWorker,
    ProtectiveServicesWorker,

    AgriculturalWorker,
    ForestryFisheryHuntingWorker,
    SubsistenceWorker,

    BuildingWorker,
    MetalWorker,
    HandicraftWorker,
    ElectricalWorker,
    CraftWorker,

    MachineOperator,
    Assembler,
    Driver,

    Cleaner,
    AgriculturalLabourer,
    ManufacturingLabourer,
    FoodPreparationAssistant,
    StreetSalesWorker,
    RefuseWorker,
}

impl Specialisation {
    pub const ALL: [Specialisation; 39] = [
        Specialisation::ChiefExecutive,
        Specialisation::AdministrativeManager,
        Specialisation::SpecialisedManager,
        Specialisation::EngineeringProfessional,
        Specialisation::HealthProfessional,
        Specialisation::TeachingProfessional,
        Specialisation::BusinessProfessional,
        Specialisation::IctProfessional,
        Specialisation::LegalProfessional,
        Specialisation::EngineeringAssociate,
        Specialisation::HealthAssociate,
        Specialisation::BusinessAssociate,
        Specialisation::LegalAssociate,
        Specialisation::IctTechnician,
        Specialisation::GeneralClerk,
        Specialisation::CustomerServicesClerk,
        Specialisation::RecordingClerk,
        Specialisation::OtherClericalWorker,
        Specialisation::PersonalServiceWorker,
        Specialisation::SalesWorker,
        Specialisation::CareWorker,
        Specialisation::ProtectiveServicesWorker,
        Specialisation::AgriculturalWorker,
        Specialisation::ForestryFisheryHuntingWorker,
        Specialisation::SubsistenceWorker,
        Specialisation::BuildingWorker,
        Specialisation::MetalWorker,
        Specialisation::HandicraftWorker,
        Specialisation::ElectricalWorker,
        Specialisation::CraftWorker,
        Specialisation::MachineOperator,
        Specialisation::Assembler,
        Specialisation::Driver,
        Specialisation::Cleaner,
        Specialisation::AgriculturalLabourer,
        Specialisation::ManufacturingLabourer,
        Specialisation::FoodPreparationAssistant,
        Specialisation::StreetSalesWorker,
        Specialisation::RefuseWorker,
    ];

    /// The skill tier a specialisation belongs to.
    pub fn skill(self) -> Skill {
        use Specialisation::*;
        match self {
            ChiefExecutive | AdministrativeManager | SpecialisedManager => Skill::Managers,
            EngineeringProfessional | HealthProfessional | TeachingProfessional
            | BusinessProfessional | IctProfessional | LegalProfessional => Skill::Professionals,
            EngineeringAssociate | HealthAssociate | BusinessAssociate | LegalAssociate
            | IctTechnician => Skill::TechniciansAndAssociateProfessionals,
            GeneralClerk | CustomerServicesClerk | RecordingClerk | OtherClericalWorker => {
                Skill::ClericalSupportWorkers
            }
            PersonalServiceWorker | SalesWorker | CareWorker | ProtectiveServicesWorker => {
                Skill::ServiceAndSalesWorkers
            }
            AgriculturalWorker | ForestryFisheryHuntingWorker | SubsistenceWorker => {
                Skill::SkilledAgriculturalForestryAndFisheryWorkers
            }
            BuildingWorker | MetalWorker | HandicraftWorker | ElectricalWorker | CraftWorker => {
                Skill::CraftAndRelatedTradesWorkers
            }
            MachineOperator | Assembler | Driver => Skill::PlantAndMachineOperatorsAndAssemblers,
            Cleaner | AgriculturalLabourer | ManufacturingLabourer | FoodPreparationAssistant
            | StreetSalesWorker | RefuseWorker => Skill::ElementaryOccupations,
        }
    }

    /// Years of training needed to acquire the specialisation.
    pub fn years_to_specialise(self) -> u32 {
        use Specialisation::*;
        match self {
            HealthProfessional => 5,
            _ => match self.skill() {
                Skill::Managers
                | Skill::Professionals
                | Skill::TechniciansAndAssociateProfessionals => 4,
                Skill::ElementaryOccupations => 0,
                _ => 3,
            },
        }
    }

    /// Training duration in simulated days.
    pub fn days_to_specialise(self) -> u32 {
        self.years_to_specialise() * 365
    }
}

impl fmt::Display for Specialisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Specialisation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specialisation::ALL
            .iter()
            .copied()
            .find(|spec| spec.to_string() == s)
            .ok_or_else(|| format!("unknown specialisation '{s}'"))
    }
}
